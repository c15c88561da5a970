//! CRUD merge engine.
//!
//! Pure reducers from `(document, event)` to the next document. The update
//! queue owns persistence; nothing here touches the store.
//!
//! Id rule: a new record gets `max(now_ms, highest_existing_id + 1)`, which
//! keeps ids time-ordered while making them unique within the collection even
//! when several records are created in the same millisecond.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::model::{Document, Patch, Record, Skills};
use crate::error::MergeError;
use crate::events::DomainEvent;

/// Apply one domain event to `doc`.
///
/// Updates and deletes that name an unknown id leave the document unchanged.
/// Skill events with blank names are rejected with [`MergeError`].
pub fn apply(
    mut doc: Document,
    event: DomainEvent,
    now: DateTime<Utc>,
) -> Result<Document, MergeError> {
    match event {
        DomainEvent::BlogCreated { post } => {
            let id = create(&mut doc.blog_posts, post, now);
            debug!(id, "blog post created");
        }
        DomainEvent::BlogUpdated { id, patch } => {
            if !update(&mut doc.blog_posts, id, patch, now) {
                debug!(id, "blog post update ignored, no such id");
            }
        }
        DomainEvent::BlogDeleted { id } => {
            delete(&mut doc.blog_posts, id);
        }
        DomainEvent::ProjectCreated { project } => {
            let id = create(&mut doc.projects, project, now);
            debug!(id, "project created");
        }
        DomainEvent::ProjectUpdated { id, patch } => {
            if !update(&mut doc.projects, id, patch, now) {
                debug!(id, "project update ignored, no such id");
            }
        }
        DomainEvent::ProjectDeleted { id } => {
            delete(&mut doc.projects, id);
        }
        DomainEvent::CertificateCreated { certificate } => {
            let id = create(&mut doc.certificates, certificate, now);
            debug!(id, "certificate created");
        }
        DomainEvent::CertificateUpdated { id, patch } => {
            if !update(&mut doc.certificates, id, patch, now) {
                debug!(id, "certificate update ignored, no such id");
            }
        }
        DomainEvent::CertificateDeleted { id } => {
            delete(&mut doc.certificates, id);
        }
        DomainEvent::SkillAdded { category, skill } => {
            add_skill(&mut doc.skills, &category, &skill)?;
        }
        DomainEvent::SkillRemoved { category, skill } => {
            remove_skill(&mut doc.skills, &category, &skill)?;
        }
        DomainEvent::SkillCategoryReplaced { category, skills } => {
            replace_category(&mut doc.skills, &category, skills)?;
        }
    }

    Ok(doc)
}

fn next_id<F>(records: &[Record<F>], now: DateTime<Utc>) -> u64 {
    let floor = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    records
        .iter()
        .map(|r| r.id.saturating_add(1))
        .fold(floor, u64::max)
}

fn create<F>(records: &mut Vec<Record<F>>, fields: F, now: DateTime<Utc>) -> u64 {
    let id = next_id(records, now);
    records.push(Record {
        id,
        created_at: now,
        updated_at: now,
        fields,
    });
    id
}

fn update<F, P: Patch<F>>(
    records: &mut [Record<F>],
    id: u64,
    patch: P,
    now: DateTime<Utc>,
) -> bool {
    let Some(record) = records.iter_mut().find(|r| r.id == id) else {
        return false;
    };

    patch.apply_to(&mut record.fields);
    // Strictly later than the previous stamp, even on a coarse clock.
    record.updated_at = if now > record.updated_at {
        now
    } else {
        record.updated_at + Duration::milliseconds(1)
    };
    true
}

fn delete<F>(records: &mut Vec<Record<F>>, id: u64) -> bool {
    let before = records.len();
    records.retain(|r| r.id != id);
    records.len() != before
}

fn category_name(category: &str) -> Result<String, MergeError> {
    let name = category.trim();
    if name.is_empty() {
        return Err(MergeError::EmptyCategory);
    }
    Ok(name.to_string())
}

fn skill_name(category: &str, skill: &str) -> Result<String, MergeError> {
    let name = skill.trim();
    if name.is_empty() {
        return Err(MergeError::EmptySkill {
            category: category.to_string(),
        });
    }
    Ok(name.to_string())
}

fn add_skill(skills: &mut Skills, category: &str, skill: &str) -> Result<(), MergeError> {
    let category = category_name(category)?;
    let skill = skill_name(&category, skill)?;

    let list = skills.entry(category).or_default();
    if !list.contains(&skill) {
        list.push(skill);
    }
    Ok(())
}

fn remove_skill(skills: &mut Skills, category: &str, skill: &str) -> Result<(), MergeError> {
    let category = category_name(category)?;
    let skill = skill.trim();

    if let Some(list) = skills.get_mut(&category) {
        list.retain(|s| s != skill);
    }
    Ok(())
}

fn replace_category(
    skills: &mut Skills,
    category: &str,
    replacement: Vec<String>,
) -> Result<(), MergeError> {
    let category = category_name(category)?;

    let mut list: Vec<String> = Vec::with_capacity(replacement.len());
    for skill in replacement {
        let skill = skill_name(&category, &skill)?;
        if !list.contains(&skill) {
            list.push(skill);
        }
    }

    skills.insert(category, list);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::content::model::{BlogFields, BlogPatch, CertificateFields, ProjectFields};

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn post(title: &str) -> BlogFields {
        BlogFields {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn create_assigns_id_and_timestamps() {
        let doc = apply(
            Document::default(),
            DomainEvent::BlogCreated { post: post("A") },
            at(1_000),
        )
        .unwrap();

        assert_eq!(doc.blog_posts.len(), 1);
        let created = &doc.blog_posts[0];
        assert_eq!(created.id, 1_000);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.fields.title, "A");
    }

    #[test]
    fn same_millisecond_creates_get_distinct_ids() {
        let mut doc = Document::default();
        for title in ["A", "B", "C"] {
            doc = apply(doc, DomainEvent::BlogCreated { post: post(title) }, at(5)).unwrap();
        }

        let ids: Vec<u64> = doc.blog_posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![5, 6, 7]);
    }

    #[test]
    fn update_merges_and_keeps_immutables() {
        let doc = apply(
            Document::default(),
            DomainEvent::BlogCreated { post: post("A") },
            at(1_000),
        )
        .unwrap();
        let id = doc.blog_posts[0].id;
        let created_at = doc.blog_posts[0].created_at;

        let doc = apply(
            doc,
            DomainEvent::BlogUpdated {
                id,
                patch: BlogPatch {
                    content: Some("body".to_string()),
                    ..Default::default()
                },
            },
            at(1_000),
        )
        .unwrap();

        let updated = doc.blog_post(id).unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.created_at, created_at);
        assert!(updated.updated_at > created_at);
        assert_eq!(updated.fields.title, "A");
        assert_eq!(updated.fields.content, "body");
    }

    #[test]
    fn update_unknown_id_is_silently_dropped() {
        let doc = apply(
            Document::default(),
            DomainEvent::ProjectCreated {
                project: ProjectFields::default(),
            },
            at(10),
        )
        .unwrap();
        let before = doc.clone();

        let after = apply(
            doc,
            DomainEvent::ProjectUpdated {
                id: 999,
                patch: Default::default(),
            },
            at(20),
        )
        .unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn delete_removes_only_the_matching_record() {
        let mut doc = Document::default();
        for _ in 0..2 {
            doc = apply(
                doc,
                DomainEvent::CertificateCreated {
                    certificate: CertificateFields::default(),
                },
                at(100),
            )
            .unwrap();
        }

        let doc = apply(doc, DomainEvent::CertificateDeleted { id: 100 }, at(200)).unwrap();
        assert_eq!(doc.certificates.len(), 1);
        assert_eq!(doc.certificates[0].id, 101);

        let doc = apply(doc, DomainEvent::CertificateDeleted { id: 42 }, at(300)).unwrap();
        assert_eq!(doc.certificates.len(), 1);
    }

    #[test]
    fn skill_add_is_idempotent() {
        let event = || DomainEvent::SkillAdded {
            category: "Languages".to_string(),
            skill: "Rust".to_string(),
        };
        let doc = apply(Document::default(), event(), at(0)).unwrap();
        let doc = apply(doc, event(), at(1)).unwrap();

        assert_eq!(doc.skills["Languages"], vec!["Rust".to_string()]);
    }

    #[test]
    fn skill_remove_filters_and_keeps_category() {
        let mut doc = Document::default();
        doc.skills.insert(
            "Languages".to_string(),
            vec!["Rust".to_string(), "Go".to_string()],
        );

        let doc = apply(
            doc,
            DomainEvent::SkillRemoved {
                category: "Languages".to_string(),
                skill: "Rust".to_string(),
            },
            at(0),
        )
        .unwrap();
        assert_eq!(doc.skills["Languages"], vec!["Go".to_string()]);

        let doc = apply(
            doc,
            DomainEvent::SkillRemoved {
                category: "Languages".to_string(),
                skill: "Go".to_string(),
            },
            at(0),
        )
        .unwrap();
        assert!(doc.skills["Languages"].is_empty());
    }

    #[test]
    fn replace_category_dedups_in_order() {
        let doc = apply(
            Document::default(),
            DomainEvent::SkillCategoryReplaced {
                category: "Tools".to_string(),
                skills: vec![
                    "git".to_string(),
                    "cargo".to_string(),
                    "git".to_string(),
                ],
            },
            at(0),
        )
        .unwrap();

        assert_eq!(
            doc.skills["Tools"],
            vec!["git".to_string(), "cargo".to_string()]
        );
    }

    #[test]
    fn blank_names_are_rejected() {
        let err = apply(
            Document::default(),
            DomainEvent::SkillAdded {
                category: "  ".to_string(),
                skill: "Rust".to_string(),
            },
            at(0),
        )
        .unwrap_err();
        assert_eq!(err, MergeError::EmptyCategory);

        let err = apply(
            Document::default(),
            DomainEvent::SkillAdded {
                category: "Languages".to_string(),
                skill: String::new(),
            },
            at(0),
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::EmptySkill { .. }));
    }
}
