use crate::error::{ObexError, Result};
use crate::observables::{ExtractionResult, MatcherGroup, ObservableKind, ObservableRecord};
use std::collections::{BTreeMap, BTreeSet};

/// Extract-then-read wrapper holding the result of the latest document
///
/// Each `extract` replaces the previous result. Reading before the first
/// `extract` is a usage error.
#[derive(Debug, Clone)]
pub struct ContentScanner {
    group: MatcherGroup,
    last: Option<ExtractionResult>,
}

impl ContentScanner {
    pub fn new(group: MatcherGroup) -> Self {
        Self { group, last: None }
    }

    pub fn group(&self) -> &MatcherGroup {
        &self.group
    }

    /// Scan a document, discarding results from any previous one
    pub fn extract(&mut self, text: &str) -> &ExtractionResult {
        self.last.insert(self.group.extract(text))
    }

    pub fn result(&self) -> Result<&ExtractionResult> {
        self.last.as_ref().ok_or(ObexError::NotExtracted)
    }

    pub fn observables(&self) -> Result<&[ObservableRecord]> {
        Ok(self.result()?.observables())
    }

    pub fn observables_by_kind(&self) -> Result<&BTreeMap<ObservableKind, BTreeSet<String>>> {
        Ok(self.result()?.observables_by_kind())
    }
}
