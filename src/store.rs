//! Checklist Store
//!
//! Holds the checklists of one trip for one owner account, the member whose
//! checklist is on screen, and mirrors every change through the backend.
//!
//! Every write takes the backend's returned row as the new local value.
//! A failed call leaves the local state exactly as it was.

use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

use crate::domain::{is_ready, ChecklistDocument, MemberReadiness};
use crate::error::{ChecklistError, ChecklistResult, PersistenceError};
use crate::repository::{Filter, Order, PersistenceService, Repository, Row};

/// The (trip, owner) pair a store was loaded for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistScope {
    pub trip_id: String,
    pub owner_id: String,
}

pub struct ChecklistStore {
    repo: Repository<ChecklistDocument>,
    checklists: Vec<ChecklistDocument>,
    selected_member_id: Option<String>,
    scope: Option<ChecklistScope>,
}

impl ChecklistStore {
    pub fn new(service: Arc<dyn PersistenceService>) -> Self {
        Self {
            repo: Repository::new(service),
            checklists: Vec::new(),
            selected_member_id: None,
            scope: None,
        }
    }

    pub fn checklists(&self) -> &[ChecklistDocument] {
        &self.checklists
    }

    pub fn selected_member_id(&self) -> Option<&str> {
        self.selected_member_id.as_deref()
    }

    /// Checklist currently on screen
    pub fn selected(&self) -> Option<&ChecklistDocument> {
        let member_id = self.selected_member_id.as_deref()?;
        self.checklists.iter().find(|c| c.member_id == member_id)
    }

    pub fn scope(&self) -> Option<&ChecklistScope> {
        self.scope.as_ref()
    }

    /// Fetch all checklists the owner keeps for the trip, oldest first.
    ///
    /// With no stored checklists the owner's own checklist is synthesized
    /// from the default template; it is not saved until
    /// [`persist_selected`](Self::persist_selected) is called.
    pub async fn load(&mut self, trip_id: &str, owner_id: &str) -> ChecklistResult<&[ChecklistDocument]> {
        let filter = Filter::new().eq("trip_id", trip_id).eq("user_id", owner_id);
        let mut checklists = self
            .repo
            .list(&filter, Some(&Order::asc("created_at")))
            .await
            .map_err(|e| {
                warn!("Loading checklists for trip {} failed: {}", trip_id, e);
                ChecklistError::Load(e)
            })?;

        if checklists.is_empty() {
            info!("No checklists for trip {}, starting from template", trip_id);
            checklists.push(ChecklistDocument::new_self(owner_id, trip_id));
        } else {
            info!("Loaded {} checklists for trip {}", checklists.len(), trip_id);
        }

        self.selected_member_id = checklists.first().map(|c| c.member_id.clone());
        self.checklists = checklists;
        self.scope = Some(ChecklistScope {
            trip_id: trip_id.to_string(),
            owner_id: owner_id.to_string(),
        });
        Ok(self.checklists.as_slice())
    }

    /// Show the checklist of another member
    pub fn select_member(&mut self, member_id: &str) -> ChecklistResult<&ChecklistDocument> {
        let index = self.position_of(member_id)?;
        debug!("Selected member {}", member_id);
        self.selected_member_id = Some(member_id.to_string());
        Ok(&self.checklists[index])
    }

    /// Start tracking a new member with a fresh default checklist
    pub async fn add_member(&mut self, owner_id: &str, name: &str) -> ChecklistResult<ChecklistDocument> {
        let scope = self.scope_for(owner_id)?;
        let name = valid_name(name)?;
        self.ensure_unique_name(name, None)?;

        let draft = ChecklistDocument::new(scope.owner_id, scope.trip_id, name);
        let saved = self.repo.create(&draft).await.map_err(|e| persistence_failed("add member", e))?;

        info!("Added member {} ({})", saved.member_name, saved.member_id);
        self.selected_member_id = Some(saved.member_id.clone());
        self.checklists.push(saved.clone());
        Ok(saved)
    }

    /// Change a member's display name
    pub async fn rename_member(
        &mut self,
        owner_id: &str,
        member_id: &str,
        new_name: &str,
    ) -> ChecklistResult<ChecklistDocument> {
        self.scope_for(owner_id)?;
        let name = valid_name(new_name)?;
        let index = self.position_of(member_id)?;

        if self.checklists[index].member_name == name {
            return Ok(self.checklists[index].clone());
        }
        self.ensure_unique_name(name, Some(member_id))?;
        let id = self.persisted_id(index)?;

        let mut patch = Row::new();
        patch.insert("member_name".to_string(), Value::String(name.to_string()));
        let saved = self
            .repo
            .update(&id, patch)
            .await
            .map_err(|e| persistence_failed("rename member", e))?;

        info!("Renamed member {} to {}", member_id, saved.member_name);
        self.replace(index, saved.clone());
        Ok(saved)
    }

    /// Flip one option of the selected checklist.
    ///
    /// The whole section list is written back and the stored copy returned
    /// by the backend replaces the local one.
    pub async fn toggle_option(
        &mut self,
        section_index: usize,
        option_index: usize,
    ) -> ChecklistResult<ChecklistDocument> {
        let member_id = self.selected_member_id.clone().ok_or(ChecklistError::NoSelection)?;
        let index = self.position_of(&member_id)?;
        let id = self.persisted_id(index)?;

        let mut sections = self.checklists[index].sections.clone();
        let option = sections
            .get_mut(section_index)
            .and_then(|s| s.options.get_mut(option_index))
            .ok_or(ChecklistError::IndexOutOfRange {
                section: section_index,
                option: option_index,
            })?;
        option.checked = !option.checked;
        debug!(
            "Toggling {}/{} for member {} to {}",
            section_index, option_index, member_id, option.checked
        );

        let mut patch = Row::new();
        patch.insert(
            "data".to_string(),
            serde_json::to_value(&sections).map_err(PersistenceError::from)?,
        );
        let saved = self
            .repo
            .update(&id, patch)
            .await
            .map_err(|e| persistence_failed("toggle option", e))?;

        self.replace(index, saved.clone());
        Ok(saved)
    }

    /// Save the selected checklist if it only exists locally
    pub async fn persist_selected(&mut self, owner_id: &str) -> ChecklistResult<ChecklistDocument> {
        self.scope_for(owner_id)?;
        let member_id = self.selected_member_id.clone().ok_or(ChecklistError::NoSelection)?;
        let index = self.position_of(&member_id)?;
        if self.checklists[index].is_persisted() {
            return Ok(self.checklists[index].clone());
        }

        let saved = self
            .repo
            .create(&self.checklists[index])
            .await
            .map_err(|e| persistence_failed("save checklist", e))?;

        info!("Saved checklist for member {}", saved.member_name);
        self.replace(index, saved.clone());
        Ok(saved)
    }

    /// Readiness of every loaded member, in list order
    pub fn readiness(&self) -> Vec<MemberReadiness> {
        self.checklists.iter().map(MemberReadiness::from).collect()
    }

    pub fn is_ready(document: &ChecklistDocument) -> bool {
        is_ready(document)
    }

    fn scope_for(&self, owner_id: &str) -> ChecklistResult<ChecklistScope> {
        match &self.scope {
            None => Err(ChecklistError::NotLoaded),
            Some(scope) if scope.owner_id != owner_id => Err(ChecklistError::OwnerMismatch {
                expected: scope.owner_id.clone(),
                actual: owner_id.to_string(),
            }),
            Some(scope) => Ok(scope.clone()),
        }
    }

    fn position_of(&self, member_id: &str) -> ChecklistResult<usize> {
        self.checklists
            .iter()
            .position(|c| c.member_id == member_id)
            .ok_or_else(|| ChecklistError::NotFound(member_id.to_string()))
    }

    fn persisted_id(&self, index: usize) -> ChecklistResult<String> {
        let checklist = &self.checklists[index];
        checklist
            .id
            .clone()
            .ok_or_else(|| ChecklistError::NotPersisted(checklist.member_id.clone()))
    }

    /// Names are compared exactly; `except` skips the member being renamed.
    fn ensure_unique_name(&self, name: &str, except: Option<&str>) -> ChecklistResult<()> {
        let taken = self
            .checklists
            .iter()
            .filter(|c| Some(c.member_id.as_str()) != except)
            .any(|c| c.member_name == name);
        if taken {
            return Err(ChecklistError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Swap in a stored copy, keeping the selection on the same member
    fn replace(&mut self, index: usize, saved: ChecklistDocument) {
        let previous = std::mem::replace(&mut self.checklists[index], saved);
        if self.selected_member_id.as_deref() == Some(previous.member_id.as_str()) {
            self.selected_member_id = Some(self.checklists[index].member_id.clone());
        }
    }
}

fn valid_name(name: &str) -> ChecklistResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ChecklistError::EmptyName);
    }
    Ok(name)
}

fn persistence_failed(action: &str, e: PersistenceError) -> ChecklistError {
    warn!("Failed to {}: {}", action, e);
    ChecklistError::Persistence(e)
}

#[cfg(test)]
mod tests;
