//! API module

pub mod middleware;
pub mod routes;

use sqlx::PgPool;

pub use routes::create_router;

/// Shared router state
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub allow_seed: bool,
}
