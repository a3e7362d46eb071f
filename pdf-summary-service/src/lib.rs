pub mod models;
pub mod providers;
pub mod service;

pub use service::{build_router, create_app, AppState};
