//! Repository Layer
//!
//! Row-store abstraction, typed repositories and the two backends.

mod db;
mod query;
mod rest;
mod traits;


use std::sync::Arc;

pub use db::{init_db, SqlitePersistence};
pub use query::{value_text, Clause, Filter, Order, Row};
pub use rest::{query_params, RestPersistence};
pub use traits::{from_row, to_row, PersistenceService, Repository};

use crate::config::BackendConfig;
use crate::error::PersistenceResult;

/// Open the backend described by `config`
pub async fn connect(config: &BackendConfig) -> PersistenceResult<Arc<dyn PersistenceService>> {
    match config {
        BackendConfig::Remote(remote) => {
            log::info!("Using remote backend at {}", remote.url);
            Ok(Arc::new(RestPersistence::new(remote)?))
        }
        BackendConfig::Local { path } => Ok(Arc::new(init_db(path).await?)),
    }
}
