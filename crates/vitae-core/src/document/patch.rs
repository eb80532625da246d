//! Partial-update payload sent to the remote store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::section::SectionKey;

/// A set of section key/value pairs (plus an optional title) destined for a
/// single `PATCH` request.
///
/// Later values for the same key replace earlier ones, so a patch built from
/// a burst of edits carries only the final state of each touched section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub sections: BTreeMap<SectionKey, Value>,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_section(&mut self, key: SectionKey, value: Value) {
        self.sections.insert(key, value);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Folds `other` into `self`; values from `other` win.
    pub fn merge(&mut self, other: DocumentPatch) {
        if other.title.is_some() {
            self.title = other.title;
        }
        self.sections.extend(other.sections);
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.sections.is_empty()
    }

    /// Number of fields the patch will write.
    pub fn len(&self) -> usize {
        self.sections.len() + usize::from(self.title.is_some())
    }

    pub fn section(&self, key: SectionKey) -> Option<&Value> {
        self.sections.get(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_value_wins_per_key() {
        let mut patch = DocumentPatch::new();
        patch.set_section(SectionKey::Basics, json!({ "name": "Ada" }));
        patch.set_section(SectionKey::Skills, json!([]));
        patch.set_section(SectionKey::Basics, json!({ "name": "Ada Lovelace" }));

        assert_eq!(patch.len(), 2);
        assert_eq!(patch.section(SectionKey::Basics).unwrap()["name"], "Ada Lovelace");
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let mut patch = DocumentPatch::new();
        patch.set_title("Resume 2");
        patch.set_section(SectionKey::Metadata, json!({ "template": "modern" }));

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            json!({ "title": "Resume 2", "resume_metadata": { "template": "modern" } })
        );
    }

    #[test]
    fn test_merge_prefers_newer_values() {
        let mut older = DocumentPatch::new();
        older.set_title("A");
        older.set_section(SectionKey::Work, json!([{ "company": "X" }]));

        let mut newer = DocumentPatch::new();
        newer.set_section(SectionKey::Work, json!([]));

        older.merge(newer);
        assert_eq!(older.title.as_deref(), Some("A"));
        assert_eq!(older.section(SectionKey::Work), Some(&json!([])));
    }

    #[test]
    fn test_empty_patch() {
        let patch = DocumentPatch::new();
        assert!(patch.is_empty());
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({}));
    }
}
