use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{ErrorResponse, EventRequest, EventResponse, HealthResponse};
use crate::routes::AppState;

/// Configure the event API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/events", web::post().to(handle_event));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = match state.store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Profile store health check failed: {}", e);
            false
        }
    };

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Deliver one inbound event
///
/// POST /api/v1/events
///
/// Request body:
/// ```json
/// {
///   "userId": 123,
///   "type": "start|register|text|location|find_matches|share_location",
///   "text": "string",
///   "latitude": 48.85,
///   "longitude": 2.35
/// }
/// ```
async fn handle_event(
    state: web::Data<AppState>,
    req: web::Json<EventRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for event request: {}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let event = match req.into_inner().into_event() {
        Ok(event) => event,
        Err(message) => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Incomplete event".to_string(),
                message,
                status_code: 400,
            });
        }
    };

    let replies = state.dispatcher.dispatch(event).await;

    HttpResponse::Ok().json(EventResponse::from_messages(&replies))
}
