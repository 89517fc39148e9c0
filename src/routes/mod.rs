use axum::Router;

use crate::{store::Store, Config};

mod fallback;
mod health;
mod seo_highlights;
mod sessions;

// ---

pub fn router(store: Store, config: Config) -> Router {
    // ---
    Router::new()
        .merge(sessions::router())
        .merge(seo_highlights::router())
        .merge(health::router())
        .fallback(fallback::handler)
        .with_state((store, config))
}
