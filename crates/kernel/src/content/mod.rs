//! Content document and its merge semantics.
//!
//! This module provides:
//! - Document model: blog posts, projects, certificates, skills
//! - DocumentStore: persistence of the whole document under one key
//! - merge: pure reducers applying domain events to the document
//! - ContentService: the process-wide entry point tying bus, queue and
//!   observers together

mod document;
pub mod merge;
mod model;
mod service;

pub use document::DocumentStore;
pub use model::{
    BlogFields, BlogPatch, BlogPost, Certificate, CertificateFields, CertificatePatch, Document,
    Patch, Project, ProjectFields, ProjectPatch, Record, Skills,
};
pub use service::ContentService;
