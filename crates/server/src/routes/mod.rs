//! API route handlers for the pageshot server.

pub mod health;
pub mod screenshot;
pub mod system;
pub mod tasks;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET    /api/health - Health check
/// - POST   /api/screenshot/submit - Queue a screenshot job
/// - POST   /api/screenshot/sync - Capture inline and stream the PNG
/// - GET    /api/task/{id}/status - Poll a job's lifecycle state
/// - GET    /api/task/{id}/result - Fetch the PNG once the job completed
/// - DELETE /api/task/{id} - Remove a job, cancelling it if running
/// - GET    /api/system/stats - Host usage plus job manager counters
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", screenshot::router())
        .nest("/api", tasks::router())
        .nest("/api", system::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state, InstantEngine};

    #[tokio::test]
    async fn test_api_routes_creation() {
        let state = test_state(Arc::new(InstantEngine));
        let _router = api_routes(state);
    }
}
