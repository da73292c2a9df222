// Integration tests for matcher groups over realistic documents
use obex::observables::{ContentScanner, MatcherGroup, MetadataPolicy, ObservableKind};
use obex::patterns::{ExtractionError, Extractor, MatchersConfig, PatternMatcher};
use obex::ObexError;
use regex::Regex;
use std::sync::Arc;
use std::thread;

const EMAIL: &str = r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}";
const HTTP_URL: &str = r#"https?://[^\s"<>]+"#;
const DEFANGED_URL: &str = r#"h(?:xx|XX)ps?://[^\s"<>]+"#;
const IPV4: &str = r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b";

const PHISH_EMAIL: &str = "From: a@x.com To: b@y.com
Subject: invoice overdue

Please review the invoice at hxxp://bad.example/path or the mirror
hXXps://bad.example before Friday. Our portal http://example.com is also
reachable from 10.1.2.3.
";

fn conversation_matcher() -> PatternMatcher {
    PatternMatcher::builder(
        format!(r"From:\s*({})\s+To:\s*({})", EMAIL, EMAIL),
        ObservableKind::EmailConversation,
    )
    .capture_groups([1, 2])
    .delimiter("_")
    .build()
    .unwrap()
}

fn phish_group() -> MatcherGroup {
    let mut group = MatcherGroup::new();
    group.add(
        PatternMatcher::find_all(HTTP_URL, ObservableKind::Url)
            .unwrap()
            .with_tags(["web"]),
    );
    group.add(
        PatternMatcher::find_all(DEFANGED_URL, ObservableKind::Url)
            .unwrap()
            .with_tags(["defanged"])
            .with_directives(["crawl"]),
    );
    group.add(PatternMatcher::find_all(IPV4, ObservableKind::Ipv4).unwrap());
    group.add(conversation_matcher());
    group
}

#[test]
fn test_full_document_extraction() {
    let result = phish_group().extract(PHISH_EMAIL);

    let urls: Vec<&str> = result
        .values(&ObservableKind::Url)
        .unwrap()
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(
        urls,
        vec![
            "http://bad.example/path",
            "http://example.com",
            "https://bad.example"
        ]
    );

    assert!(result
        .values(&ObservableKind::Ipv4)
        .unwrap()
        .contains("10.1.2.3"));
    assert!(result
        .values(&ObservableKind::EmailConversation)
        .unwrap()
        .contains("a@x.com_b@y.com"));

    let defanged = result
        .observables()
        .iter()
        .find(|r| r.value == "https://bad.example")
        .unwrap();
    assert_eq!(defanged.tags, vec!["defanged"]);
    assert_eq!(defanged.directives, vec!["crawl"]);
}

#[test]
fn test_capture_join_conversation() {
    let mut group = MatcherGroup::new();
    group.add(conversation_matcher());

    let result = group.extract("From: a@x.com To: b@y.com");
    let records = result.observables();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ObservableKind::EmailConversation);
    assert_eq!(records[0].value, "a@x.com_b@y.com");
}

#[test]
fn test_capture_join_without_match_leaves_empty_kind() {
    let mut group = MatcherGroup::new();
    group.add(conversation_matcher());

    let result = group.extract("no headers in this body");
    assert!(result
        .observables_by_kind()
        .get(&ObservableKind::EmailConversation)
        .unwrap()
        .is_empty());
    assert!(result.observables().is_empty());
}

#[test]
fn test_idempotent_extraction() {
    let group = phish_group();
    let first = group.extract(PHISH_EMAIL);
    let second = group.extract(PHISH_EMAIL);

    assert_eq!(first.observables(), second.observables());
    assert_eq!(first.observables_by_kind(), second.observables_by_kind());
}

#[test]
fn test_registration_order_of_distinct_kinds_does_not_matter() {
    let mut forward = MatcherGroup::new();
    forward.add(PatternMatcher::find_all(HTTP_URL, ObservableKind::Url).unwrap());
    forward.add(PatternMatcher::find_all(IPV4, ObservableKind::Ipv4).unwrap());

    let mut reverse = MatcherGroup::new();
    reverse.add(PatternMatcher::find_all(IPV4, ObservableKind::Ipv4).unwrap());
    reverse.add(PatternMatcher::find_all(HTTP_URL, ObservableKind::Url).unwrap());

    assert_eq!(
        forward.extract(PHISH_EMAIL).observables_by_kind(),
        reverse.extract(PHISH_EMAIL).observables_by_kind()
    );
}

#[test]
fn test_overlapping_matchers_dedup_to_one_record() {
    let mut group = MatcherGroup::new();
    group.add(PatternMatcher::find_all(HTTP_URL, ObservableKind::Url).unwrap());
    group.add(PatternMatcher::find_all(r"http://example\.com", ObservableKind::Url).unwrap());

    let result = group.extract("go to http://example.com now, http://example.com!");
    let matching: Vec<_> = result
        .observables()
        .iter()
        .filter(|r| r.value.starts_with("http://example.com"))
        .collect();

    // HTTP_URL also captures the trailing comma/bang variants
    assert_eq!(
        matching
            .iter()
            .filter(|r| r.value == "http://example.com")
            .count(),
        1
    );
}

#[test]
fn test_last_wins_is_the_default_policy() {
    let mut group = MatcherGroup::new();
    assert_eq!(group.policy(), MetadataPolicy::LastWins);

    group.add(
        PatternMatcher::find_all(HTTP_URL, ObservableKind::Url)
            .unwrap()
            .with_tags(["first"])
            .with_directives(["crawl"]),
    );
    group.add(
        PatternMatcher::find_all(r"http://example\.com", ObservableKind::Url)
            .unwrap()
            .with_tags(["second"]),
    );

    let result = group.extract("http://example.com");
    assert_eq!(result.tags_for("http://example.com").unwrap(), ["second"]);
    assert!(result.directives_for("http://example.com").unwrap().is_empty());
}

#[test]
fn test_metadata_is_keyed_by_value_across_kinds() {
    let mut group = MatcherGroup::new();
    group.add(
        PatternMatcher::find_all(r"\bbad\.example\b", ObservableKind::Fqdn)
            .unwrap()
            .with_tags(["domain"]),
    );
    group.add(
        PatternMatcher::find_all(r"\bbad\.example\b", ObservableKind::Hostname)
            .unwrap()
            .with_tags(["host"]),
    );

    let result = group.extract("resolve bad.example");
    assert_eq!(result.observables().len(), 2);
    assert!(result.observables().iter().all(|r| r.tags == vec!["host"]));
}

#[test]
fn test_scanner_state_error_before_extract() {
    let scanner = ContentScanner::new(phish_group());
    match scanner.observables() {
        Err(ObexError::NotExtracted) => {}
        other => panic!("expected NotExtracted, got {:?}", other),
    }
}

#[test]
fn test_scanner_reads_latest_document() {
    let mut scanner = ContentScanner::new(phish_group());
    scanner.extract(PHISH_EMAIL);
    assert!(!scanner.observables().unwrap().is_empty());

    scanner.extract("nothing here");
    assert!(scanner.observables().unwrap().is_empty());
    assert_eq!(scanner.observables_by_kind().unwrap().len(), 3);
}

/// Joins sender and recipient with a delimiter that depends on which headers matched
#[derive(Debug)]
struct ConversationExtractor {
    regex: Regex,
}

impl Extractor for ConversationExtractor {
    fn extract(&self, text: &str) -> Result<Vec<String>, ExtractionError> {
        let Some(caps) = self.regex.captures(text) else {
            return Ok(Vec::new());
        };
        let from = caps
            .name("from")
            .ok_or_else(|| ExtractionError::Custom("missing sender".to_string()))?;

        let value = match (caps.name("to"), caps.name("cc")) {
            (Some(to), _) => format!("{}|{}", from.as_str(), to.as_str()),
            (None, Some(cc)) => format!("{}~{}", from.as_str(), cc.as_str()),
            (None, None) => return Err(ExtractionError::Custom("no recipient".to_string())),
        };
        Ok(vec![value])
    }
}

#[test]
fn test_custom_extractor_registration() {
    let regex = Regex::new(&format!(
        r"From: (?P<from>{e})(?: To: (?P<to>{e})| Cc: (?P<cc>{e}))?",
        e = EMAIL
    ))
    .unwrap();

    let mut group = MatcherGroup::with_tags(["mail"]);
    group.add(PatternMatcher::custom(
        ObservableKind::EmailConversation,
        ConversationExtractor { regex },
    ));
    group.add(PatternMatcher::find_all(EMAIL, ObservableKind::EmailAddress).unwrap());

    let to = group.extract("From: a@x.com To: b@y.com");
    assert!(to
        .values(&ObservableKind::EmailConversation)
        .unwrap()
        .contains("a@x.com|b@y.com"));

    let cc = group.extract("From: a@x.com Cc: c@z.com");
    assert!(cc
        .values(&ObservableKind::EmailConversation)
        .unwrap()
        .contains("a@x.com~c@z.com"));

    // A failing custom extractor does not stop the other matchers
    let lonely = group.extract("From: a@x.com");
    assert!(lonely
        .values(&ObservableKind::EmailConversation)
        .unwrap()
        .is_empty());
    assert_eq!(lonely.values(&ObservableKind::EmailAddress).unwrap().len(), 1);
    assert_eq!(lonely.tags_for("a@x.com").unwrap(), ["mail"]);
}

#[test]
fn test_group_shared_across_threads() {
    let group = Arc::new(phish_group());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let group = Arc::clone(&group);
            thread::spawn(move || {
                let text = format!("{}\nworker 10.0.0.{}", PHISH_EMAIL, i);
                group.extract(&text).len()
            })
        })
        .collect();

    for handle in handles {
        // 3 URLs, 2 IPs, 1 conversation
        assert_eq!(handle.join().unwrap(), 6);
    }
}

#[test]
fn test_bundled_template_compiles_and_extracts() {
    let template = include_str!("../config-templates/matchers.toml");
    let config = MatchersConfig::from_toml(template).unwrap();
    let group = MatcherGroup::from_config(&config).unwrap();

    let text = "From: Alice <alice@corp.example>\n\
                To: bob@corp.example\n\
                Subject: hi\n\
                \n\
                payload at hxxp://evil.example/a.exe from 203.0.113.7\n\
                sha256 9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08\n";

    let result = group.extract(text);
    assert!(result
        .values(&ObservableKind::Url)
        .unwrap()
        .contains("http://evil.example/a.exe"));
    assert!(result
        .values(&ObservableKind::Ipv4)
        .unwrap()
        .contains("203.0.113.7"));
    assert!(result
        .values(&ObservableKind::EmailConversation)
        .unwrap()
        .contains("alice@corp.example|bob@corp.example"));
    assert!(result
        .values(&ObservableKind::Sha256)
        .unwrap()
        .contains("9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"));
    assert!(result.values(&ObservableKind::Md5).unwrap().is_empty());
}

#[test]
fn test_observables_serialize_to_submission_format() {
    let mut group = MatcherGroup::new();
    group.add(
        PatternMatcher::find_all(IPV4, ObservableKind::Ipv4)
            .unwrap()
            .with_directives(["no_scan"]),
    );

    let result = group.extract("1.2.3.4");
    let json = serde_json::to_value(result.observables()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "type": "ipv4",
            "value": "1.2.3.4",
            "tags": [],
            "directives": ["no_scan"],
        }])
    );
}
