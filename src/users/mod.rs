use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod update;
pub mod validate;

pub fn router() -> Router<AppState> {
    handlers::router()
}
