//! Section keys and section values.
//!
//! The set of section keys is closed; both the document store and any front
//! end address sections through [`SectionKey`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::{
    Basics, Document, EducationEntry, ProjectEntry, RenderMetadata, SkillEntry, WorkEntry,
};
use crate::error::{Result, VitaeError};

/// Closed set of addressable document sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Basics,
    Work,
    Education,
    Skills,
    Projects,
    #[serde(rename = "resume_metadata")]
    Metadata,
}

impl SectionKey {
    pub const ALL: [SectionKey; 6] = [
        SectionKey::Basics,
        SectionKey::Work,
        SectionKey::Education,
        SectionKey::Skills,
        SectionKey::Projects,
        SectionKey::Metadata,
    ];

    /// Wire name of the section.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::Basics => "basics",
            SectionKey::Work => "work",
            SectionKey::Education => "education",
            SectionKey::Skills => "skills",
            SectionKey::Projects => "projects",
            SectionKey::Metadata => "resume_metadata",
        }
    }

    /// Sequence sections are replaced wholesale; record sections are not.
    pub fn is_sequence(&self) -> bool {
        matches!(
            self,
            SectionKey::Work | SectionKey::Education | SectionKey::Skills | SectionKey::Projects
        )
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKey {
    type Err = VitaeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basics" => Ok(SectionKey::Basics),
            "work" => Ok(SectionKey::Work),
            "education" => Ok(SectionKey::Education),
            "skills" => Ok(SectionKey::Skills),
            "projects" => Ok(SectionKey::Projects),
            "resume_metadata" | "metadata" => Ok(SectionKey::Metadata),
            other => Err(VitaeError::invalid_input(format!(
                "unknown section '{}'",
                other
            ))),
        }
    }
}

/// The typed value held by one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionValue {
    Basics(Basics),
    Work(Vec<WorkEntry>),
    Education(Vec<EducationEntry>),
    Skills(Vec<SkillEntry>),
    Projects(Vec<ProjectEntry>),
    Metadata(RenderMetadata),
}

impl SectionValue {
    pub fn key(&self) -> SectionKey {
        match self {
            SectionValue::Basics(_) => SectionKey::Basics,
            SectionValue::Work(_) => SectionKey::Work,
            SectionValue::Education(_) => SectionKey::Education,
            SectionValue::Skills(_) => SectionKey::Skills,
            SectionValue::Projects(_) => SectionKey::Projects,
            SectionValue::Metadata(_) => SectionKey::Metadata,
        }
    }

    /// Parses raw JSON into the section's schema.
    ///
    /// Any mismatch is reported as `InvalidInput` so callers can reject it
    /// before touching state or the network.
    pub fn from_json(key: SectionKey, value: Value) -> Result<Self> {
        let invalid = |e: serde_json::Error| {
            VitaeError::invalid_input(format!("section '{}' does not match its schema: {}", key, e))
        };
        Ok(match key {
            SectionKey::Basics => SectionValue::Basics(serde_json::from_value(value).map_err(invalid)?),
            SectionKey::Work => SectionValue::Work(serde_json::from_value(value).map_err(invalid)?),
            SectionKey::Education => {
                SectionValue::Education(serde_json::from_value(value).map_err(invalid)?)
            }
            SectionKey::Skills => SectionValue::Skills(serde_json::from_value(value).map_err(invalid)?),
            SectionKey::Projects => {
                SectionValue::Projects(serde_json::from_value(value).map_err(invalid)?)
            }
            SectionKey::Metadata => {
                SectionValue::Metadata(serde_json::from_value(value).map_err(invalid)?)
            }
        })
    }

    /// Serializes the section value as it appears on the wire.
    pub fn to_json(&self) -> Result<Value> {
        let value = match self {
            SectionValue::Basics(v) => serde_json::to_value(v)?,
            SectionValue::Work(v) => serde_json::to_value(v)?,
            SectionValue::Education(v) => serde_json::to_value(v)?,
            SectionValue::Skills(v) => serde_json::to_value(v)?,
            SectionValue::Projects(v) => serde_json::to_value(v)?,
            SectionValue::Metadata(v) => serde_json::to_value(v)?,
        };
        Ok(value)
    }
}

impl Document {
    /// Returns a copy of the named section.
    pub fn section(&self, key: SectionKey) -> SectionValue {
        match key {
            SectionKey::Basics => SectionValue::Basics(self.basics.clone()),
            SectionKey::Work => SectionValue::Work(self.work.clone()),
            SectionKey::Education => SectionValue::Education(self.education.clone()),
            SectionKey::Skills => SectionValue::Skills(self.skills.clone()),
            SectionKey::Projects => SectionValue::Projects(self.projects.clone()),
            SectionKey::Metadata => SectionValue::Metadata(self.resume_metadata.clone()),
        }
    }

    /// Replaces the section addressed by the value's key.
    pub fn set_section(&mut self, value: SectionValue) {
        match value {
            SectionValue::Basics(v) => self.basics = v,
            SectionValue::Work(v) => self.work = v,
            SectionValue::Education(v) => self.education = v,
            SectionValue::Skills(v) => self.skills = v,
            SectionValue::Projects(v) => self.projects = v,
            SectionValue::Metadata(v) => self.resume_metadata = v,
        }
    }

    /// Resolves a raw section update against this document.
    ///
    /// Basics is shallow-merged: top-level fields present in `value` replace
    /// the existing ones and absent fields are kept. Every other section is
    /// replaced by `value` as a whole. The document itself is not modified.
    pub fn resolve_section(&self, key: SectionKey, value: Value) -> Result<SectionValue> {
        match key {
            SectionKey::Basics => {
                let Value::Object(partial) = value else {
                    return Err(VitaeError::invalid_input(
                        "basics update must be a JSON object",
                    ));
                };
                let mut merged: Map<String, Value> = match serde_json::to_value(&self.basics)? {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                merged.extend(partial);
                SectionValue::from_json(key, Value::Object(merged))
            }
            _ => SectionValue::from_json(key, value),
        }
    }
}
