// Route exports
pub mod events;
pub mod telegram;

use actix_web::web;
use std::sync::Arc;

use crate::core::Dispatcher;
use crate::services::{ProfileStore, TelegramClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub store: Arc<dyn ProfileStore>,
    pub telegram: Option<Arc<TelegramClient>>,
    pub webhook_secret: Option<String>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(events::configure)
            .service(web::scope("/telegram").configure(telegram::configure)),
    );
}
