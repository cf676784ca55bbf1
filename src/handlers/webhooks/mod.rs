pub mod lemonsqueezy;

pub use lemonsqueezy::handle_lemonsqueezy_webhook;

use axum::{Router, routing::post};

use crate::store::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook/lemonsqueezy", post(handle_lemonsqueezy_webhook))
}
