//! Commands Layer
//!
//! Handlers that bridge the UI shell to the store and trip directory.
//! Errors cross this boundary as display strings.

mod checklist_cmd;
mod session_cmd;
mod trip_cmd;


pub use checklist_cmd::*;
pub use session_cmd::*;
pub use trip_cmd::*;
