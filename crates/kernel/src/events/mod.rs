//! Domain events, the event bus, and the update queue.
//!
//! A caller proposes a change by emitting a [`DomainEvent`]. The
//! [`EventBus`] hands it to that event kind's direct listeners right away,
//! then queues it. The [`UpdateQueue`] applies queued events to the document
//! one at a time, in arrival order, and after each one tells every
//! document observer to re-read.

mod bus;
mod listeners;
mod queue;
pub mod wire;

use std::fmt;
use std::str::FromStr;

pub use bus::EventBus;
pub use listeners::{ListenerList, Subscription};
pub use queue::{DocumentChanged, QueuedUpdate, UpdateQueue};

use crate::content::{
    BlogFields, BlogPatch, CertificateFields, CertificatePatch, ProjectFields, ProjectPatch,
};
use crate::error::WireError;

/// Listener channel an event is delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BlogUpdated,
    ProjectUpdated,
    CertificateUpdated,
    SkillsUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::BlogUpdated,
        EventKind::ProjectUpdated,
        EventKind::CertificateUpdated,
        EventKind::SkillsUpdated,
    ];

    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BlogUpdated => "blog_updated",
            EventKind::ProjectUpdated => "project_updated",
            EventKind::CertificateUpdated => "certificate_updated",
            EventKind::SkillsUpdated => "skills_updated",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| WireError::UnknownEvent(s.to_string()))
    }
}

/// A proposed change to the content document.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    BlogCreated { post: BlogFields },
    BlogUpdated { id: u64, patch: BlogPatch },
    BlogDeleted { id: u64 },
    ProjectCreated { project: ProjectFields },
    ProjectUpdated { id: u64, patch: ProjectPatch },
    ProjectDeleted { id: u64 },
    CertificateCreated { certificate: CertificateFields },
    CertificateUpdated { id: u64, patch: CertificatePatch },
    CertificateDeleted { id: u64 },
    SkillAdded { category: String, skill: String },
    SkillRemoved { category: String, skill: String },
    SkillCategoryReplaced { category: String, skills: Vec<String> },
}

impl DomainEvent {
    /// Which listener channel the event belongs to.
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::BlogCreated { .. }
            | DomainEvent::BlogUpdated { .. }
            | DomainEvent::BlogDeleted { .. } => EventKind::BlogUpdated,
            DomainEvent::ProjectCreated { .. }
            | DomainEvent::ProjectUpdated { .. }
            | DomainEvent::ProjectDeleted { .. } => EventKind::ProjectUpdated,
            DomainEvent::CertificateCreated { .. }
            | DomainEvent::CertificateUpdated { .. }
            | DomainEvent::CertificateDeleted { .. } => EventKind::CertificateUpdated,
            DomainEvent::SkillAdded { .. }
            | DomainEvent::SkillRemoved { .. }
            | DomainEvent::SkillCategoryReplaced { .. } => EventKind::SkillsUpdated,
        }
    }

    /// Wire name of the action carried by the event.
    pub fn action(&self) -> &'static str {
        match self {
            DomainEvent::BlogCreated { .. }
            | DomainEvent::ProjectCreated { .. }
            | DomainEvent::CertificateCreated { .. } => "create",
            DomainEvent::BlogUpdated { .. }
            | DomainEvent::ProjectUpdated { .. }
            | DomainEvent::CertificateUpdated { .. } => "update",
            DomainEvent::BlogDeleted { .. }
            | DomainEvent::ProjectDeleted { .. }
            | DomainEvent::CertificateDeleted { .. } => "delete",
            DomainEvent::SkillAdded { .. } => "add",
            DomainEvent::SkillRemoved { .. } => "remove",
            DomainEvent::SkillCategoryReplaced { .. } => "update_category",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert!("blog_deleted".parse::<EventKind>().is_err());
    }

    #[test]
    fn events_map_to_their_channel() {
        let event = DomainEvent::SkillRemoved {
            category: "Languages".to_string(),
            skill: "Rust".to_string(),
        };
        assert_eq!(event.kind(), EventKind::SkillsUpdated);
        assert_eq!(event.action(), "remove");

        let event = DomainEvent::CertificateDeleted { id: 3 };
        assert_eq!(event.kind(), EventKind::CertificateUpdated);
        assert_eq!(event.action(), "delete");
    }
}
