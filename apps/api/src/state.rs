use sea_orm::DatabaseConnection;

use crate::config::Config;

/// Shared application state: configuration plus the database connection pool.
///
/// Cloning is cheap; the pool is reference-counted internally.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DatabaseConnection,
}
