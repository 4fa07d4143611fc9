//! Trip Checklist Core
//!
//! Layered architecture:
//! - domain: Checklist and trip entities, template, readiness rules
//! - repository: Row-store abstraction with remote and SQLite backends
//! - store: Per-member checklist state for one trip
//! - trips: Trip records and participants
//! - commands: Handlers called by the UI shell

use std::sync::Arc;
use tokio::sync::Mutex;

pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod store;
pub mod trips;

pub use config::{AppConfig, BackendConfig, RemoteConfig};
pub use domain::{
    is_ready, ChecklistDocument, ChecklistOption, MemberReadiness, ParticipantReadiness, Section, Trip, TripDraft,
    TripSummary,
};
pub use error::{ChecklistError, PersistenceError, TripError};
pub use repository::PersistenceService;
pub use store::{ChecklistScope, ChecklistStore};
pub use trips::TripDirectory;

/// Name used for log files
pub const APP_NAME: &str = "TripChecklist";

/// Application state shared across commands
pub struct AppState {
    pub checklists: Mutex<ChecklistStore>,
    pub trips: TripDirectory,
    service: Arc<dyn PersistenceService>,
}

impl AppState {
    pub fn new(service: Arc<dyn PersistenceService>) -> Self {
        Self {
            checklists: Mutex::new(ChecklistStore::new(service.clone())),
            trips: TripDirectory::new(service.clone()),
            service,
        }
    }

    /// Backend shared by the store and the trip directory
    pub fn service(&self) -> &Arc<dyn PersistenceService> {
        &self.service
    }

    /// Start logging (when configured) and open the backend
    pub async fn init(config: &AppConfig) -> Result<Self, String> {
        if let Some(log_dir) = &config.log_dir {
            if let Err(e) = rolling_logger::init_logger(log_dir.clone(), APP_NAME) {
                eprintln!("Failed to init rolling logger: {}", e);
            }
        }

        let service = repository::connect(&config.backend)
            .await
            .map_err(|e| format!("Failed to open backend: {}", e))?;
        let _ = rolling_logger::info("Backend connected");
        Ok(Self::new(service))
    }
}
