use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::models::ErrorResponse;
use crate::routes::AppState;
use crate::services::Update;

/// Header Telegram sets when the webhook was registered with a secret token
const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/webhook", web::post().to(webhook));
}

/// Telegram webhook endpoint
///
/// POST /telegram/webhook
///
/// Replies are sent through the Bot API. Every call that passes the secret
/// check is acknowledged with 200, including bodies that do not parse as an
/// update, so Telegram never redelivers them.
async fn webhook(
    state: web::Data<AppState>,
    body: web::Bytes,
    http_req: HttpRequest,
) -> impl Responder {
    if let Some(expected) = &state.webhook_secret {
        let provided = http_req
            .headers()
            .get(SECRET_HEADER)
            .map(|v| v.as_bytes())
            .unwrap_or_default();
        if !secret_matches(provided, expected.as_bytes()) {
            tracing::warn!("Rejected webhook call with missing or wrong secret token");
            return HttpResponse::Unauthorized().json(ErrorResponse {
                error: "Unauthorized".to_string(),
                message: "invalid secret token".to_string(),
                status_code: 401,
            });
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(bytes = body.len(), "Dropping malformed Telegram update: {}", e);
            return HttpResponse::Ok().finish();
        }
    };

    let Some(telegram) = state.telegram.clone() else {
        return HttpResponse::ServiceUnavailable().json(ErrorResponse {
            error: "Telegram disabled".to_string(),
            message: "no bot token configured".to_string(),
            status_code: 503,
        });
    };

    let update_id = update.update_id;
    let Some((chat_id, event)) = update.into_event() else {
        tracing::debug!(update_id, "Ignoring update");
        return HttpResponse::Ok().finish();
    };

    let replies = state.dispatcher.dispatch(event).await;

    if let Err(e) = telegram.deliver(chat_id, &replies).await {
        tracing::error!(update_id, chat_id, "Failed to deliver Telegram replies: {}", e);
    }

    HttpResponse::Ok().finish()
}

/// Compare the secret token without stopping at the first differing byte
fn secret_matches(provided: &[u8], expected: &[u8]) -> bool {
    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
