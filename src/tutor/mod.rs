use crate::state::AppState;
use axum::Router;

pub mod generator;
pub mod handlers;

pub use generator::{HttpTextGenerator, TextGenerator};

pub fn router() -> Router<AppState> {
    handlers::tutor_routes()
}
