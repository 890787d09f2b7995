mod admins;
mod audit_logs;
mod auth;
mod categories;
mod dashboard;
mod stream_stats;
mod users;

use axum::{middleware::from_fn_with_state, Router};

use crate::middleware::require_auth;
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth::session_routes())
        .nest("/admins", admins::routes())
        .nest("/users", users::routes())
        .nest("/categories", categories::routes())
        .nest("/stream-stats", stream_stats::routes())
        .nest("/dashboard", dashboard::routes())
        .nest("/audit-logs", audit_logs::routes())
        .route_layer(from_fn_with_state(state, require_auth));

    Router::new().merge(auth::routes()).merge(protected)
}
