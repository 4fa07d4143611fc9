//! Trip Commands

use crate::domain::{Trip, TripDraft, TripParticipant, TripSummary};
use crate::AppState;

pub async fn create_trip(state: &AppState, owner_id: String, draft: TripDraft) -> Result<Trip, String> {
    state
        .trips
        .create_trip(&owner_id, &draft)
        .await
        .map_err(|e| e.to_string())
}

pub async fn update_trip(state: &AppState, trip_id: String, draft: TripDraft) -> Result<Trip, String> {
    state
        .trips
        .update_trip(&trip_id, &draft)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_trip(state: &AppState, trip_id: String) -> Result<Option<Trip>, String> {
    state.trips.get_trip(&trip_id).await.map_err(|e| e.to_string())
}

/// Trips shown in the trip picker, most recent first
pub async fn list_trips(state: &AppState, profile_id: String) -> Result<Vec<Trip>, String> {
    state
        .trips
        .trips_for_participant(&profile_id)
        .await
        .map_err(|e| e.to_string())
}

/// Trip list screen: every trip with its participants' packing status
pub async fn list_all_trips(state: &AppState) -> Result<Vec<TripSummary>, String> {
    state
        .trips
        .trips_with_participants()
        .await
        .map_err(|e| e.to_string())
}

pub async fn join_trip(state: &AppState, trip_id: String, profile_id: String) -> Result<TripParticipant, String> {
    if trip_id.trim().is_empty() {
        return Err("trip id must not be empty".to_string());
    }
    state
        .trips
        .add_participant(&trip_id, &profile_id)
        .await
        .map_err(|e| e.to_string())
}
