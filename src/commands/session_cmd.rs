//! Session Commands

use crate::AppState;

/// Hand the signed-in user's token to the backend; `None` signs out
pub async fn set_access_token(state: &AppState, token: Option<String>) -> Result<(), String> {
    let token = token.filter(|t| !t.trim().is_empty());
    log::info!(
        "Backend access switched to {}",
        if token.is_some() { "user session" } else { "anonymous" }
    );
    state.service().set_access_token(token);
    Ok(())
}
