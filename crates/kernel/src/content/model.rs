//! Content records and the root document.
//!
//! Records are serialized with camelCase keys. Fields the kernel does not
//! know about are kept in each record's `extra` map, so callers can attach
//! arbitrary domain data and have it survive a round trip.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored entity: id and timestamps around a collection-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<F> {
    /// Unique within its collection, assigned at creation.
    pub id: u64,

    /// Set once at creation.
    pub created_at: DateTime<Utc>,

    /// Refreshed on every update; never earlier than `created_at`.
    pub updated_at: DateTime<Utc>,

    /// Collection-specific fields.
    #[serde(flatten)]
    pub fields: F,
}

/// Blog post fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogFields {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    /// Visibility flag: unpublished posts are drafts.
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Estimated reading time in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_time: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Project fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectFields {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub featured: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Certificate fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateFields {
    pub title: String,
    pub issuer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type BlogPost = Record<BlogFields>;
pub type Project = Record<ProjectFields>;
pub type Certificate = Record<CertificateFields>;

/// Skill lists keyed by category. Each list is ordered and duplicate-free.
pub type Skills = BTreeMap<String, Vec<String>>;

/// The root content document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub blog_posts: Vec<BlogPost>,
    pub projects: Vec<Project>,
    pub certificates: Vec<Certificate>,
    pub skills: Skills,
}

impl Document {
    /// Find a blog post by id.
    pub fn blog_post(&self, id: u64) -> Option<&BlogPost> {
        self.blog_posts.iter().find(|p| p.id == id)
    }

    /// Find a project by id.
    pub fn project(&self, id: u64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Find a certificate by id.
    pub fn certificate(&self, id: u64) -> Option<&Certificate> {
        self.certificates.iter().find(|c| c.id == id)
    }

    /// Published blog posts, newest first.
    pub fn published_posts(&self) -> Vec<&BlogPost> {
        let mut posts: Vec<_> = self.blog_posts.iter().filter(|p| p.fields.published).collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    /// Featured projects in stored order.
    pub fn featured_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| p.fields.featured)
    }
}

/// Partial update applied by shallow merge: `Some` fields replace the
/// stored value, `None` fields leave it alone, `extra` keys are inserted or
/// overwritten one by one.
pub trait Patch<F> {
    fn apply_to(self, fields: &mut F);
}

fn merge_extra(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

/// Partial blog post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
    pub cover_image: Option<String>,
    pub read_time: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Patch<BlogFields> for BlogPatch {
    fn apply_to(self, fields: &mut BlogFields) {
        if let Some(title) = self.title {
            fields.title = title;
        }
        if let Some(content) = self.content {
            fields.content = content;
        }
        if let Some(excerpt) = self.excerpt {
            fields.excerpt = excerpt;
        }
        if let Some(tags) = self.tags {
            fields.tags = tags;
        }
        if let Some(published) = self.published {
            fields.published = published;
        }
        if self.cover_image.is_some() {
            fields.cover_image = self.cover_image;
        }
        if self.read_time.is_some() {
            fields.read_time = self.read_time;
        }
        merge_extra(&mut fields.extra, self.extra);
    }
}

/// Partial project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub image: Option<String>,
    pub featured: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Patch<ProjectFields> for ProjectPatch {
    fn apply_to(self, fields: &mut ProjectFields) {
        if let Some(title) = self.title {
            fields.title = title;
        }
        if let Some(description) = self.description {
            fields.description = description;
        }
        if let Some(technologies) = self.technologies {
            fields.technologies = technologies;
        }
        if self.github_url.is_some() {
            fields.github_url = self.github_url;
        }
        if self.live_url.is_some() {
            fields.live_url = self.live_url;
        }
        if self.image.is_some() {
            fields.image = self.image;
        }
        if let Some(featured) = self.featured {
            fields.featured = featured;
        }
        merge_extra(&mut fields.extra, self.extra);
    }
}

/// Partial certificate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificatePatch {
    pub title: Option<String>,
    pub issuer: Option<String>,
    pub issue_date: Option<String>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Patch<CertificateFields> for CertificatePatch {
    fn apply_to(self, fields: &mut CertificateFields) {
        if let Some(title) = self.title {
            fields.title = title;
        }
        if let Some(issuer) = self.issuer {
            fields.issuer = issuer;
        }
        if self.issue_date.is_some() {
            fields.issue_date = self.issue_date;
        }
        if self.credential_id.is_some() {
            fields.credential_id = self.credential_id;
        }
        if self.credential_url.is_some() {
            fields.credential_url = self.credential_url;
        }
        if self.image.is_some() {
            fields.image = self.image;
        }
        merge_extra(&mut fields.extra, self.extra);
    }
}
