//! Wire form of domain events.
//!
//! External callers describe a change as `{event, data}` where `data`
//! carries an `action` plus an action-specific payload:
//!
//! ```json
//! {"event": "blog_updated", "data": {"action": "create", "post": {"title": "A"}}}
//! {"event": "blog_updated", "data": {"action": "update", "id": 7, "post": {"title": "B"}}}
//! {"event": "skills_updated", "data": {"action": "add", "category": "Languages", "skill": "Rust"}}
//! ```
//!
//! For update and delete the id may also sit inside the payload object.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{DomainEvent, EventKind};
use crate::error::WireError;

/// Keys a caller may send inside a patch that must never be merged.
const IMMUTABLE_KEYS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// Envelope as received from a caller.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Decode the envelope into a typed event.
    pub fn into_event(self) -> Result<DomainEvent, WireError> {
        parse(&self.event, self.data)
    }
}

/// Decode `data` for the event named `event`.
pub fn parse(event: &str, data: Value) -> Result<DomainEvent, WireError> {
    let kind: EventKind = event.parse()?;
    let Value::Object(mut data) = data else {
        return Err(WireError::MissingField("action"));
    };

    let action = match data.remove("action") {
        Some(Value::String(action)) => action,
        _ => return Err(WireError::MissingField("action")),
    };
    let unknown = || WireError::UnknownAction {
        event: event.to_string(),
        action: action.clone(),
    };

    let parsed = match kind {
        EventKind::BlogUpdated => match entity(&action, data, "post")? {
            Some(Entity::Create(post)) => DomainEvent::BlogCreated { post },
            Some(Entity::Update(id, patch)) => DomainEvent::BlogUpdated { id, patch },
            Some(Entity::Delete(id)) => DomainEvent::BlogDeleted { id },
            None => return Err(unknown()),
        },
        EventKind::ProjectUpdated => match entity(&action, data, "project")? {
            Some(Entity::Create(project)) => DomainEvent::ProjectCreated { project },
            Some(Entity::Update(id, patch)) => DomainEvent::ProjectUpdated { id, patch },
            Some(Entity::Delete(id)) => DomainEvent::ProjectDeleted { id },
            None => return Err(unknown()),
        },
        EventKind::CertificateUpdated => match entity(&action, data, "certificate")? {
            Some(Entity::Create(certificate)) => DomainEvent::CertificateCreated { certificate },
            Some(Entity::Update(id, patch)) => DomainEvent::CertificateUpdated { id, patch },
            Some(Entity::Delete(id)) => DomainEvent::CertificateDeleted { id },
            None => return Err(unknown()),
        },
        EventKind::SkillsUpdated => {
            let category = string_field(&data, "category")?;
            match action.as_str() {
                "add" => DomainEvent::SkillAdded {
                    category,
                    skill: string_field(&data, "skill")?,
                },
                "remove" => DomainEvent::SkillRemoved {
                    category,
                    skill: string_field(&data, "skill")?,
                },
                "update_category" => {
                    let skills = data
                        .remove("skills")
                        .ok_or(WireError::MissingField("skills"))?;
                    DomainEvent::SkillCategoryReplaced {
                        category,
                        skills: serde_json::from_value(skills)?,
                    }
                }
                _ => return Err(unknown()),
            }
        }
    };

    Ok(parsed)
}

enum Entity<F, P> {
    Create(F),
    Update(u64, P),
    Delete(u64),
}

fn entity<F, P>(
    action: &str,
    mut data: Map<String, Value>,
    payload_key: &'static str,
) -> Result<Option<Entity<F, P>>, WireError>
where
    F: DeserializeOwned,
    P: DeserializeOwned,
{
    let payload = data.remove(payload_key);
    let outer_id = data.get("id").and_then(Value::as_u64);

    let entity = match action {
        "create" => {
            let mut payload = object(payload, payload_key)?;
            strip_immutable(&mut payload);
            Entity::Create(serde_json::from_value(Value::Object(payload))?)
        }
        "update" => {
            let mut payload = object(payload, payload_key)?;
            let id = outer_id
                .or_else(|| payload.get("id").and_then(Value::as_u64))
                .ok_or(WireError::MissingField("id"))?;
            strip_immutable(&mut payload);
            Entity::Update(id, serde_json::from_value(Value::Object(payload))?)
        }
        "delete" => {
            let id = outer_id
                .or_else(|| payload.as_ref()?.get("id")?.as_u64())
                .ok_or(WireError::MissingField("id"))?;
            Entity::Delete(id)
        }
        _ => return Ok(None),
    };

    Ok(Some(entity))
}

fn object(
    payload: Option<Value>,
    payload_key: &'static str,
) -> Result<Map<String, Value>, WireError> {
    match payload {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(WireError::MissingField(payload_key)),
    }
}

fn strip_immutable(payload: &mut Map<String, Value>) {
    for key in IMMUTABLE_KEYS {
        payload.remove(key);
    }
}

fn string_field(data: &Map<String, Value>, key: &'static str) -> Result<String, WireError> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(WireError::MissingField(key))
}
