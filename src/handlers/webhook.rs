use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;

use crate::db::queries;
use crate::services::conversation;
use crate::state::AppState;

#[derive(Deserialize)]
#[allow(dead_code)]
pub struct WhatsAppWebhookForm {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To")]
    pub to: Option<String>,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "MessageSid")]
    pub message_sid: Option<String>,
}

pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    Form(form): Form<WhatsAppWebhookForm>,
) -> Response {
    let from = form
        .from
        .trim()
        .strip_prefix("whatsapp:")
        .unwrap_or(form.from.trim())
        .to_string();
    let body = form.body.trim().to_string();

    tracing::info!(from = %from, "incoming WhatsApp message");

    // Customers write to the shared number; the conversation starts against
    // the first active business and may be re-routed by the location flow.
    let business = {
        let db = state.db.lock().unwrap();
        match queries::find_active_businesses(&db) {
            Ok(businesses) => businesses.into_iter().next(),
            Err(e) => {
                tracing::error!(error = %e, "failed to load businesses");
                None
            }
        }
    };
    let Some(business) = business else {
        tracing::error!("no active business configured, dropping message");
        return twiml_response();
    };

    match conversation::handle_incoming(&state, &from, business.id, &body).await {
        Ok(result) => {
            if !result.reply.is_empty() {
                send_reply(&state, &from, &result.reply).await;
            }
        }
        Err(e) => {
            tracing::error!(error = %e, from = %from, "conversation processing failed");
            let fallback = "Üzgünüm, şu anda bir teknik sorun yaşıyorum. Lütfen daha sonra tekrar deneyin.";
            send_reply(&state, &from, fallback).await;
        }
    }

    twiml_response()
}

async fn send_reply(state: &Arc<AppState>, to: &str, body: &str) {
    let to = if to.starts_with('+') {
        to.to_string()
    } else {
        format!("+{to}")
    };

    if let Err(e) = state.messaging.send_message(&to, body).await {
        tracing::error!(error = %e, to = %to, "failed to send reply");
    }
}

fn twiml_response() -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        "<Response></Response>",
    )
        .into_response()
}
