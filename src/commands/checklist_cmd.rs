//! Checklist Commands
//!
//! UI-facing wrappers around the checklist store.

use crate::domain::{ChecklistDocument, MemberReadiness};
use crate::AppState;

/// Load checklists when the checklist screen gains focus
pub async fn load_checklists(
    state: &AppState,
    trip_id: String,
    owner_id: String,
) -> Result<Vec<ChecklistDocument>, String> {
    let mut store = state.checklists.lock().await;
    store
        .load(&trip_id, &owner_id)
        .await
        .map(|checklists| checklists.to_vec())
        .map_err(|e| e.to_string())
}

pub async fn select_member(state: &AppState, member_id: String) -> Result<ChecklistDocument, String> {
    let mut store = state.checklists.lock().await;
    store
        .select_member(&member_id)
        .map(Clone::clone)
        .map_err(|e| e.to_string())
}

pub async fn add_member(
    state: &AppState,
    owner_id: String,
    name: String,
) -> Result<ChecklistDocument, String> {
    let mut store = state.checklists.lock().await;
    store.add_member(&owner_id, &name).await.map_err(|e| e.to_string())
}

pub async fn rename_member(
    state: &AppState,
    owner_id: String,
    member_id: String,
    name: String,
) -> Result<ChecklistDocument, String> {
    let mut store = state.checklists.lock().await;
    store
        .rename_member(&owner_id, &member_id, &name)
        .await
        .map_err(|e| e.to_string())
}

/// Toggle an option of the checklist on screen
pub async fn toggle_option(
    state: &AppState,
    section_index: usize,
    option_index: usize,
) -> Result<ChecklistDocument, String> {
    let mut store = state.checklists.lock().await;
    store
        .toggle_option(section_index, option_index)
        .await
        .map_err(|e| e.to_string())
}

/// Save the checklist on screen if it was never stored
pub async fn persist_checklist(state: &AppState, owner_id: String) -> Result<ChecklistDocument, String> {
    let mut store = state.checklists.lock().await;
    store.persist_selected(&owner_id).await.map_err(|e| e.to_string())
}

pub async fn checklist_readiness(state: &AppState) -> Result<Vec<MemberReadiness>, String> {
    let store = state.checklists.lock().await;
    Ok(store.readiness())
}
