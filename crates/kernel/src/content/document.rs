//! Persistent home of the content document.

use std::sync::Arc;

use tracing::debug;

use super::model::Document;
use crate::error::StoreError;
use crate::store::{self, KeyValueStore, keys};

/// Reads and writes the whole [`Document`] under the `document` key.
///
/// Each read returns a fresh copy; each write replaces the stored value in
/// one operation.
#[derive(Clone)]
pub struct DocumentStore {
    store: Arc<dyn KeyValueStore>,
}

impl DocumentStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current document. Missing or corrupt state reads as an empty document.
    pub fn read(&self) -> Document {
        store::load_or_default(self.store.as_ref(), keys::DOCUMENT)
    }

    /// Replace the stored document.
    pub fn write(&self, doc: &Document) -> Result<(), StoreError> {
        store::save(self.store.as_ref(), keys::DOCUMENT, doc)?;
        debug!(
            blog_posts = doc.blog_posts.len(),
            projects = doc.projects.len(),
            certificates = doc.certificates.len(),
            skill_categories = doc.skills.len(),
            "document persisted"
        );
        Ok(())
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore").finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn empty_store_reads_default_document() {
        let docs = DocumentStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(docs.read(), Document::default());
    }

    #[test]
    fn corrupt_document_reads_as_empty() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(keys::DOCUMENT, "[[[".to_string()).unwrap();
        let docs = DocumentStore::new(kv);
        assert_eq!(docs.read(), Document::default());
    }

    #[test]
    fn write_then_read() {
        let docs = DocumentStore::new(Arc::new(MemoryStore::new()));
        let mut doc = Document::default();
        doc.skills
            .insert("Languages".to_string(), vec!["Rust".to_string()]);

        docs.write(&doc).unwrap();
        assert_eq!(docs.read(), doc);
    }
}
