//! Trip Directory
//!
//! Trip records and the participant links that decide which trips an
//! account sees.

use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::domain::{
    all_ready, ChecklistDocument, ParticipantReadiness, Trip, TripDraft, TripParticipant, TripSummary,
};
use crate::error::{PersistenceError, TripError, TripResult};
use crate::repository::{to_row, Filter, Order, PersistenceService, Repository};

pub struct TripDirectory {
    trips: Repository<Trip>,
    participants: Repository<TripParticipant>,
    checklists: Repository<ChecklistDocument>,
}

impl TripDirectory {
    pub fn new(service: Arc<dyn PersistenceService>) -> Self {
        Self {
            trips: Repository::new(service.clone()),
            participants: Repository::new(service.clone()),
            checklists: Repository::new(service),
        }
    }

    /// Create a trip and register its creator as the first participant
    pub async fn create_trip(&self, owner_id: &str, draft: &TripDraft) -> TripResult<Trip> {
        validate(draft)?;

        let trip = self.trips.create(&Trip::from_draft(owner_id, draft)).await.map_err(|e| {
            warn!("Creating trip failed: {}", e);
            TripError::from(e)
        })?;
        let trip_id = trip
            .id
            .clone()
            .ok_or_else(|| PersistenceError::InvalidRow("trip stored without id".to_string()))?;

        self.participants
            .create(&TripParticipant::new(trip_id.as_str(), owner_id))
            .await
            .map_err(|e| {
                warn!("Adding creator to trip {} failed: {}", trip_id, e);
                TripError::from(e)
            })?;

        info!("Created trip {} ({})", trip.title, trip_id);
        Ok(trip)
    }

    /// Overwrite the editable fields of a trip
    pub async fn update_trip(&self, trip_id: &str, draft: &TripDraft) -> TripResult<Trip> {
        validate(draft)?;

        let mut patch = to_row(draft)?;
        patch.insert("title".to_string(), draft.title.trim().into());
        let trip = self.trips.update(trip_id, patch).await.map_err(|e| {
            warn!("Updating trip {} failed: {}", trip_id, e);
            TripError::from(e)
        })?;
        Ok(trip)
    }

    pub async fn get_trip(&self, trip_id: &str) -> TripResult<Option<Trip>> {
        Ok(self.trips.find_by_id(trip_id).await?)
    }

    /// Trips the account takes part in, latest dates first
    pub async fn trips_for_participant(&self, profile_id: &str) -> TripResult<Vec<Trip>> {
        let links = self
            .participants
            .list(&Filter::new().eq("profile_id", profile_id), None)
            .await?;

        let trip_ids: BTreeSet<String> = links.into_iter().map(|p| p.trip_id).collect();
        if trip_ids.is_empty() {
            info!("Account {} is not on any trip", profile_id);
            return Ok(Vec::new());
        }

        let trips = self
            .trips
            .list(&Filter::new().is_in("id", trip_ids), Some(&Order::desc("dates")))
            .await?;
        Ok(trips)
    }

    /// Every trip, earliest dates first, with each participant's readiness
    pub async fn trips_with_participants(&self) -> TripResult<Vec<TripSummary>> {
        let trips = self.trips.list(&Filter::new(), Some(&Order::asc("dates"))).await?;

        let mut summaries = Vec::with_capacity(trips.len());
        for trip in trips {
            let participants = match trip.id.as_deref() {
                Some(trip_id) => self.participant_readiness(trip_id).await?,
                None => Vec::new(),
            };
            summaries.push(TripSummary { trip, participants });
        }
        Ok(summaries)
    }

    async fn participant_readiness(&self, trip_id: &str) -> TripResult<Vec<ParticipantReadiness>> {
        let links = self
            .participants
            .list(&Filter::new().eq("trip_id", trip_id), None)
            .await?;

        let mut seen = BTreeSet::new();
        let profile_ids: Vec<String> = links
            .into_iter()
            .map(|p| p.profile_id)
            .filter(|id| seen.insert(id.clone()))
            .collect();
        if profile_ids.is_empty() {
            return Ok(Vec::new());
        }

        let checklists = self
            .checklists
            .list(
                &Filter::new().eq("trip_id", trip_id).is_in("user_id", profile_ids.clone()),
                None,
            )
            .await?;
        let mut by_owner: HashMap<String, Vec<ChecklistDocument>> = HashMap::new();
        for checklist in checklists {
            by_owner.entry(checklist.owner_id.clone()).or_default().push(checklist);
        }
        debug!("Trip {}: {} participants", trip_id, profile_ids.len());

        Ok(profile_ids
            .into_iter()
            .map(|profile_id| {
                let ready = by_owner.get(&profile_id).is_some_and(|c| all_ready(c));
                ParticipantReadiness { profile_id, ready }
            })
            .collect())
    }

    /// Add another account to a trip
    pub async fn add_participant(&self, trip_id: &str, profile_id: &str) -> TripResult<TripParticipant> {
        let existing = self
            .participants
            .list(
                &Filter::new().eq("trip_id", trip_id).eq("profile_id", profile_id),
                None,
            )
            .await?;
        if let Some(link) = existing.into_iter().next() {
            return Ok(link);
        }
        Ok(self
            .participants
            .create(&TripParticipant::new(trip_id, profile_id))
            .await?)
    }
}

fn validate(draft: &TripDraft) -> TripResult<()> {
    if draft.title.trim().is_empty() {
        return Err(TripError::EmptyTitle);
    }
    Ok(())
}
