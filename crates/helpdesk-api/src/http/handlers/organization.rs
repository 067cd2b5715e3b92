//! Organization directory handler.
//!
//! - GET /api/v1/orgs - Organizations a chat can be started for

use axum::extract::State;

use helpdesk_types::organization::Organization;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

pub async fn list_organizations(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Organization>>, AppError> {
    let clock = RequestClock::start();
    let organizations = state.chat_service.organizations().await?;
    Ok(clock.respond(organizations))
}
