//! Stuff tracker: ownership-scoped inventory REST backend.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use error::{AppError, ConfigError};
pub use model::{Item, ItemFields, SessionGrant, SessionUser, User};
pub use response::{error_body, success_created, success_ok};
pub use routes::{account_routes, build_router, common_routes_with_ready, stuff_routes};
pub use service::{AccountService, InventoryService, RequestValidator};
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgStore, Store};
