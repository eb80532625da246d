use std::fmt;

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Result;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A rendered preview of a document snapshot.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl Artifact {
    pub fn pdf(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: PDF_CONTENT_TYPE.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Turns a full document snapshot into a rendered artifact.
#[async_trait]
pub trait RenderService: Send + Sync {
    async fn render(&self, document: &Document) -> Result<Artifact>;
}
