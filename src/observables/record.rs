use crate::observables::ObservableKind;
use serde::{Deserialize, Serialize};

/// Observable ready for submission to the analysis pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservableRecord {
    /// Observable kind, serialized as `type`
    #[serde(rename = "type")]
    pub kind: ObservableKind,
    /// Normalized value
    pub value: String,
    /// Labels attached by the producing matcher(s)
    pub tags: Vec<String>,
    /// Processing hints attached by the producing matcher(s)
    pub directives: Vec<String>,
}

impl ObservableRecord {
    /// Convert to JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Create from JSON string
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn has_directive(&self, directive: &str) -> bool {
        self.directives.iter().any(|d| d == directive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let record = ObservableRecord {
            kind: ObservableKind::Ipv4,
            value: "1.2.3.4".to_string(),
            tags: vec!["scan".to_string()],
            directives: vec!["no_scan".to_string()],
        };

        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "ipv4",
                "value": "1.2.3.4",
                "tags": ["scan"],
                "directives": ["no_scan"],
            })
        );
    }

    #[test]
    fn test_from_json_custom_kind() {
        let record = ObservableRecord::from_json(
            r#"{"type":"ticket_id","value":"T-1","tags":[],"directives":[]}"#,
        )
        .unwrap();
        assert_eq!(record.kind, ObservableKind::Other("ticket_id".to_string()));
        assert!(!record.has_tag("anything"));
    }
}
