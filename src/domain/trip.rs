//! Trip Entities
//!
//! A trip and the participant rows linking accounts to it.

use serde::{Deserialize, Serialize};

use super::entity::{null_as_default, optional_id, Entity};

/// A planned group trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Account that created the trip
    pub user_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub accommodation: String,
    /// Free-form date range, e.g. "9/27-29"
    #[serde(default, deserialize_with = "null_as_default")]
    pub dates: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transport: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gear_renting: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Trip {
    pub fn from_draft(user_id: impl Into<String>, draft: &TripDraft) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            title: draft.title.trim().to_string(),
            location: draft.location.clone(),
            accommodation: draft.accommodation.clone(),
            dates: draft.dates.clone(),
            transport: draft.transport.clone(),
            gear_renting: draft.gear_renting.clone(),
            notes: draft.notes.clone(),
            created_at: None,
        }
    }
}

impl Entity for Trip {
    const TABLE: &'static str = "trips";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Editable trip fields, as submitted by the trip form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripDraft {
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub accommodation: String,
    #[serde(default)]
    pub dates: String,
    #[serde(default)]
    pub transport: String,
    #[serde(default)]
    pub gear_renting: String,
    #[serde(default)]
    pub notes: String,
}

/// Links an account to a trip it takes part in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripParticipant {
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "required_id")]
    pub trip_id: String,
    pub profile_id: String,
}

impl TripParticipant {
    pub fn new(trip_id: impl Into<String>, profile_id: impl Into<String>) -> Self {
        Self {
            id: None,
            trip_id: trip_id.into(),
            profile_id: profile_id.into(),
        }
    }
}

impl Entity for TripParticipant {
    const TABLE: &'static str = "trip_participants";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Whether one participant has finished packing for a trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantReadiness {
    pub profile_id: String,
    pub ready: bool,
}

/// A trip with its participants, as shown on the trip list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub trip: Trip,
    pub participants: Vec<ParticipantReadiness>,
}

fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    optional_id(deserializer)?.ok_or_else(|| serde::de::Error::custom("trip_id is null"))
}
