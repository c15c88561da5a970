//! Folio test utilities.
//!
//! Helpers for integration testing: wire-form event fixtures, content
//! builders, temp store paths, and JSON assertion helpers.

use std::path::PathBuf;

use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

/// A unique, not-yet-existing path for a file-backed store.
pub fn temp_store_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("folio-test-{}", Uuid::now_v7()))
        .join("store.json")
}

/// Wrap `data` in a wire envelope for `event`.
pub fn envelope(event: &str, data: JsonValue) -> JsonValue {
    json!({ "event": event, "data": data })
}

/// Create a test blog post with default values.
pub fn test_post(title: &str) -> TestPost {
    TestPost {
        fields: json!({
            "title": title,
            "content": format!("Body of {title}"),
            "excerpt": "",
            "tags": [],
            "published": false,
        }),
    }
}

/// A blog post builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestPost {
    pub fields: JsonValue,
}

impl TestPost {
    /// Set as published.
    pub fn published(self) -> Self {
        self.with_field("published", json!(true))
    }

    /// Set the tags.
    pub fn with_tags(self, tags: &[&str]) -> Self {
        self.with_field("tags", json!(tags))
    }

    /// Add a single field.
    pub fn with_field(mut self, name: &str, value: JsonValue) -> Self {
        set(&mut self.fields, name, value);
        self
    }

    /// Wire envelope creating this post.
    pub fn create_event(&self) -> JsonValue {
        envelope(
            "blog_updated",
            json!({ "action": "create", "post": self.fields }),
        )
    }
}

/// Create a test project with default values.
pub fn test_project(title: &str) -> TestProject {
    TestProject {
        fields: json!({
            "title": title,
            "description": format!("About {title}"),
            "technologies": [],
            "featured": false,
        }),
    }
}

/// A project builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestProject {
    pub fields: JsonValue,
}

impl TestProject {
    /// Set as featured.
    pub fn featured(self) -> Self {
        self.with_field("featured", json!(true))
    }

    /// Set the technologies.
    pub fn with_technologies(self, technologies: &[&str]) -> Self {
        self.with_field("technologies", json!(technologies))
    }

    /// Add a single field.
    pub fn with_field(mut self, name: &str, value: JsonValue) -> Self {
        set(&mut self.fields, name, value);
        self
    }

    /// Wire envelope creating this project.
    pub fn create_event(&self) -> JsonValue {
        envelope(
            "project_updated",
            json!({ "action": "create", "project": self.fields }),
        )
    }
}

/// Create a test certificate with default values.
pub fn test_certificate(title: &str, issuer: &str) -> TestCertificate {
    TestCertificate {
        fields: json!({ "title": title, "issuer": issuer }),
    }
}

/// A certificate builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestCertificate {
    pub fields: JsonValue,
}

impl TestCertificate {
    /// Add a single field.
    pub fn with_field(mut self, name: &str, value: JsonValue) -> Self {
        set(&mut self.fields, name, value);
        self
    }

    /// Wire envelope creating this certificate.
    pub fn create_event(&self) -> JsonValue {
        envelope(
            "certificate_updated",
            json!({ "action": "create", "certificate": self.fields }),
        )
    }
}

/// Wire envelope patching entity `id`. `payload_key` is `post`, `project`
/// or `certificate`.
pub fn update_event(event: &str, payload_key: &str, id: u64, patch: JsonValue) -> JsonValue {
    envelope(
        event,
        json!({ "action": "update", "id": id, payload_key: patch }),
    )
}

/// Wire envelope deleting entity `id`.
pub fn delete_event(event: &str, id: u64) -> JsonValue {
    envelope(event, json!({ "action": "delete", "id": id }))
}

/// Wire envelope for a skills `add` or `remove`.
pub fn skill_event(action: &str, category: &str, skill: &str) -> JsonValue {
    envelope(
        "skills_updated",
        json!({ "action": action, "category": category, "skill": skill }),
    )
}

/// Wire envelope replacing a whole skill category.
pub fn skill_category_event(category: &str, skills: &[&str]) -> JsonValue {
    envelope(
        "skills_updated",
        json!({ "action": "update_category", "category": category, "skills": skills }),
    )
}

fn set(fields: &mut JsonValue, name: &str, value: JsonValue) {
    if let Some(obj) = fields.as_object_mut() {
        obj.insert(name.to_string(), value);
    }
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value does not have a specific key.
    pub fn lacks_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_none(),
            "Expected JSON to lack key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_post_builder() {
        let event = test_post("Hello").published().with_tags(&["rust"]).create_event();

        assert_eq!(event["event"], "blog_updated");
        assert_eq!(event["data"]["action"], "create");
        assert_eq!(event["data"]["post"]["title"], "Hello");
        assert_eq!(event["data"]["post"]["published"], true);
        assert_eq!(event["data"]["post"]["tags"][0], "rust");
    }

    #[test]
    fn test_project_builder() {
        let event = test_project("Folio").featured().create_event();
        assert_eq!(event["event"], "project_updated");
        assert_eq!(event["data"]["project"]["featured"], true);
    }

    #[test]
    fn update_and_delete_events() {
        let update = update_event("blog_updated", "post", 7, json!({"title": "B"}));
        assert_eq!(update["data"]["id"], 7);
        assert_eq!(update["data"]["post"]["title"], "B");

        let delete = delete_event("certificate_updated", 9);
        assert_eq!(delete["data"]["action"], "delete");
        assert::lacks_key(&delete["data"], "certificate");
    }

    #[test]
    fn skill_events() {
        let add = skill_event("add", "Languages", "Rust");
        assert_eq!(add["data"]["skill"], "Rust");

        let replace = skill_category_event("Tools", &["git", "cargo"]);
        assert_eq!(replace["data"]["skills"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn temp_paths_are_unique() {
        assert_ne!(temp_store_path(), temp_store_path());
        assert!(!temp_store_path().exists());
    }

    #[test]
    fn test_assertions() {
        let json = json!({"name": "test", "value": 42});
        assert::has_key(&json, "name");
        assert::lacks_key(&json, "missing");
        assert::contains("hello world", "world");
        assert::not_contains("hello world", "foo");
    }
}
