use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{
    Basics, Document, EducationEntry, ProjectEntry, SectionValue, SkillEntry, WorkEntry,
};
use crate::error::Result;

/// The content sections of a résumé rewritten for a job description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailoredResume {
    pub basics: Basics,
    #[serde(default)]
    pub work: Vec<WorkEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Vec<SkillEntry>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
}

impl TailoredResume {
    /// Section values to apply to an open document, in display order.
    ///
    /// Rendering metadata is not part of a tailored résumé and is left alone.
    pub fn into_sections(self) -> Vec<SectionValue> {
        vec![
            SectionValue::Basics(self.basics),
            SectionValue::Work(self.work),
            SectionValue::Education(self.education),
            SectionValue::Skills(self.skills),
            SectionValue::Projects(self.projects),
        ]
    }
}

/// Rewrites a résumé's content for a specific job description.
#[async_trait]
pub trait TailorService: Send + Sync {
    async fn tailor(&self, document: &Document, job_description: &str) -> Result<TailoredResume>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SectionKey;

    #[test]
    fn test_parse_tailored_response() {
        let tailored: TailoredResume = serde_json::from_str(
            r#"{
                "basics": {"name": "Ada", "email": "ada@example.com"},
                "skills": [{"name": "Rust", "keywords": ["tokio"]}],
                "job_description": "Systems engineer"
            }"#,
        )
        .unwrap();

        assert_eq!(tailored.skills.len(), 1);
        assert!(tailored.work.is_empty());
        assert_eq!(tailored.job_description.as_deref(), Some("Systems engineer"));
    }

    #[test]
    fn test_into_sections_skips_metadata() {
        let tailored = TailoredResume {
            basics: Basics::placeholder(),
            work: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
            projects: Vec::new(),
            job_description: None,
        };
        let keys: Vec<SectionKey> = tailored.into_sections().iter().map(|s| s.key()).collect();
        assert_eq!(
            keys,
            vec![
                SectionKey::Basics,
                SectionKey::Work,
                SectionKey::Education,
                SectionKey::Skills,
                SectionKey::Projects
            ]
        );
    }
}
