//! Checklist Entity
//!
//! One packing checklist per tracked member, stored in the `checklist` table.
//! The section/option structure lives in the JSON `data` column.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::{null_as_default, optional_id, Entity};
use super::template::{default_sections, DEFAULT_MEMBER_NAME};

/// A single packing item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistOption {
    pub title: String,
    #[serde(default)]
    pub checked: bool,
}

impl ChecklistOption {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            checked: false,
        }
    }
}

/// A titled group of packing items ("Gear", "Clothing", ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub options: Vec<ChecklistOption>,
}

impl Section {
    pub fn new(title: impl Into<String>, options: Vec<ChecklistOption>) -> Self {
        Self {
            title: title.into(),
            options,
        }
    }

    /// True when the section has no unchecked option
    pub fn all_checked(&self) -> bool {
        self.options.iter().all(|o| o.checked)
    }
}

/// A member's checklist for one trip, managed by an owner account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistDocument {
    /// Assigned by the backend on first insert
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Account that manages this checklist
    #[serde(rename = "user_id")]
    pub owner_id: String,
    pub trip_id: String,
    /// Stable member key, generated on creation
    #[serde(default, deserialize_with = "null_as_default")]
    pub member_id: String,
    pub member_name: String,
    #[serde(rename = "data", default, deserialize_with = "null_as_default")]
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ChecklistDocument {
    /// Create an unsaved checklist from the default template
    pub fn new(owner_id: impl Into<String>, trip_id: impl Into<String>, member_name: impl Into<String>) -> Self {
        Self::with_sections(owner_id, trip_id, member_name, default_sections())
    }

    /// Create an unsaved checklist with a custom structure
    pub fn with_sections(
        owner_id: impl Into<String>,
        trip_id: impl Into<String>,
        member_name: impl Into<String>,
        sections: Vec<Section>,
    ) -> Self {
        Self {
            id: None,
            owner_id: owner_id.into(),
            trip_id: trip_id.into(),
            member_id: Uuid::new_v4().to_string(),
            member_name: member_name.into(),
            sections,
            created_at: None,
            updated_at: None,
        }
    }

    /// The owner's own checklist, synthesized when a trip has none yet
    pub fn new_self(owner_id: impl Into<String>, trip_id: impl Into<String>) -> Self {
        Self::new(owner_id, trip_id, DEFAULT_MEMBER_NAME)
    }

    pub fn is_persisted(&self) -> bool {
        Entity::id(self).is_some()
    }

    pub fn is_ready(&self) -> bool {
        is_ready(self)
    }

    /// Option at the given position, if any
    pub fn option(&self, section_index: usize, option_index: usize) -> Option<&ChecklistOption> {
        self.sections
            .get(section_index)
            .and_then(|s| s.options.get(option_index))
    }

    /// (checked, total) item counts across all sections
    pub fn progress(&self) -> (usize, usize) {
        self.sections
            .iter()
            .flat_map(|s| s.options.iter())
            .fold((0, 0), |(done, total), o| (done + usize::from(o.checked), total + 1))
    }
}

impl Entity for ChecklistDocument {
    const TABLE: &'static str = "checklist";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn after_load(&mut self) {
        // Older rows were keyed by name only; their row id becomes the member key.
        if self.member_id.is_empty() {
            if let Some(id) = &self.id {
                self.member_id = id.clone();
            }
        }
    }
}

/// A checklist is ready when it has at least one section and every option
/// in every section is checked. An empty checklist is never ready.
pub fn is_ready(document: &ChecklistDocument) -> bool {
    !document.sections.is_empty() && document.sections.iter().all(Section::all_checked)
}

/// A trip participant is ready when they keep at least one checklist for the
/// trip and every one of them is ready.
pub fn all_ready(checklists: &[ChecklistDocument]) -> bool {
    !checklists.is_empty() && checklists.iter().all(is_ready)
}

/// Readiness of one member, for status indicators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberReadiness {
    pub member_id: String,
    pub member_name: String,
    pub ready: bool,
}

impl From<&ChecklistDocument> for MemberReadiness {
    fn from(document: &ChecklistDocument) -> Self {
        Self {
            member_id: document.member_id.clone(),
            member_name: document.member_name.clone(),
            ready: document.is_ready(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(sections: Vec<Section>) -> ChecklistDocument {
        ChecklistDocument::with_sections("U1", "T1", "Me", sections)
    }

    fn checked(title: &str) -> ChecklistOption {
        ChecklistOption {
            title: title.to_string(),
            checked: true,
        }
    }

    #[test]
    fn test_new_self_checklist() {
        let d = ChecklistDocument::new_self("U1", "T1");
        assert_eq!(d.member_name, DEFAULT_MEMBER_NAME);
        assert!(d.id.is_none());
        assert!(!d.member_id.is_empty());
        assert_eq!(d.sections.len(), 3);
        assert!(!d.is_ready());
    }

    #[test]
    fn test_member_ids_are_unique() {
        let a = ChecklistDocument::new("U1", "T1", "A");
        let b = ChecklistDocument::new("U1", "T1", "B");
        assert_ne!(a.member_id, b.member_id);
    }

    #[test]
    fn test_empty_checklist_is_not_ready() {
        assert!(!is_ready(&doc(vec![])));
    }

    #[test]
    fn test_section_without_options_counts_as_checked() {
        let d = doc(vec![Section::new("Gear", vec![])]);
        assert!(is_ready(&d));
    }

    #[test]
    fn test_ready_requires_every_option() {
        let mut d = doc(vec![
            Section::new("Gear", vec![checked("Gloves")]),
            Section::new("Other", vec![checked("Lift pass"), ChecklistOption::new("Hotel")]),
        ]);
        assert!(!is_ready(&d));

        d.sections[1].options[1].checked = true;
        assert!(is_ready(&d));
        assert_eq!(d.progress(), (3, 3));
    }

    #[test]
    fn test_row_column_names() {
        let mut d = doc(vec![Section::new("Gear", vec![ChecklistOption::new("Gloves")])]);
        d.member_id = "m-1".to_string();
        let value = serde_json::to_value(&d).unwrap();

        assert_eq!(
            value,
            json!({
                "user_id": "U1",
                "trip_id": "T1",
                "member_id": "m-1",
                "member_name": "Me",
                "data": [{ "title": "Gear", "options": [{ "title": "Gloves", "checked": false }] }]
            })
        );
    }

    #[test]
    fn test_decode_server_row() {
        let mut d: ChecklistDocument = serde_json::from_value(json!({
            "id": 7,
            "user_id": "U1",
            "trip_id": "T1",
            "member_id": null,
            "member_name": "Bob",
            "data": null,
            "created_at": "2025-09-20T10:00:00Z",
            "updated_at": null
        }))
        .unwrap();
        d.after_load();

        assert_eq!(d.id.as_deref(), Some("7"));
        assert_eq!(d.member_id, "7");
        assert!(d.sections.is_empty());
        assert!(d.updated_at.is_none());
    }

    #[test]
    fn test_readiness_summary() {
        let d = doc(vec![Section::new("Gear", vec![checked("Gloves")])]);
        let r = MemberReadiness::from(&d);
        assert_eq!(r.member_name, "Me");
        assert!(r.ready);
    }

    #[test]
    fn test_all_ready_needs_a_checklist() {
        assert!(!all_ready(&[]));

        let ready = doc(vec![Section::new("Gear", vec![checked("Gloves")])]);
        let pending = doc(vec![Section::new("Gear", vec![ChecklistOption::new("Gloves")])]);
        assert!(all_ready(&[ready.clone()]));
        assert!(!all_ready(&[ready.clone(), pending]));
        assert!(!all_ready(&[ready, doc(vec![])]));
    }
}
