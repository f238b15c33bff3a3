use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use nearby_match::config::Settings;
use nearby_match::core::{ConversationStateMachine, Dispatcher, LocationUpdater, ProximityMatcher};
use nearby_match::routes::{self, AppState};
use nearby_match::services::{
    InMemoryProfileStore, PostgresProfileStore, ProfileStore, TelegramClient,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration before logging so the level can come from it
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Nearby Match bot...");

    // Profile store: PostgreSQL when configured, otherwise in memory
    let store: Arc<dyn ProfileStore> = match &settings.database.url {
        Some(url) => {
            let store = PostgresProfileStore::from_settings(
                url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            info!("PostgreSQL profile store initialized");
            Arc::new(store)
        }
        None => {
            warn!("No database URL configured, profiles are kept in memory only");
            Arc::new(InMemoryProfileStore::new())
        }
    };

    // Core components
    let idle_timeout = settings.session.idle_timeout_secs.map(Duration::from_secs);
    let conversation = Arc::new(ConversationStateMachine::new(store.clone(), idle_timeout));
    let matcher = ProximityMatcher::new(store.clone(), settings.matching.radius_km);
    let locations = LocationUpdater::new(store.clone());
    let dispatcher = Dispatcher::new(conversation, matcher, locations);

    info!(
        radius_km = settings.matching.radius_km,
        idle_timeout_secs = ?settings.session.idle_timeout_secs,
        "Core initialized"
    );

    // Telegram adapter (optional)
    let telegram = match &settings.telegram.bot_token {
        Some(token) => {
            let client = TelegramClient::new(settings.telegram.api_base_url.clone(), token.clone())
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            info!("Telegram webhook enabled");
            Some(Arc::new(client))
        }
        None => {
            info!("No Telegram bot token configured, webhook disabled");
            None
        }
    };

    let app_state = AppState {
        dispatcher,
        store,
        telegram,
        webhook_secret: settings.telegram.webhook_secret.clone(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
