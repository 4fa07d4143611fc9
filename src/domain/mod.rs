//! Domain Layer
//!
//! Entities, the default checklist template and readiness rules.
//! No I/O happens here.

mod checklist;
mod entity;
mod template;
mod trip;

pub use checklist::{all_ready, is_ready, ChecklistDocument, ChecklistOption, MemberReadiness, Section};
pub use entity::Entity;
pub use template::{default_sections, DEFAULT_MEMBER_NAME};
pub use trip::{ParticipantReadiness, Trip, TripDraft, TripParticipant, TripSummary};
