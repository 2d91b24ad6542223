//! Chat platform webhook.
//!
//! ```text
//! POST /webhook   X-Telegram-Bot-Api-Secret-Token: <secret>   {"update_id":1,"message":{...}}
//! ```
//!
//! Every authenticated, decodable update is answered with `200 OK`, even when
//! processing fails. A non-2xx answer makes the platform redeliver the update,
//! which would count the same message twice once the store recovers.

use actix_web::{HttpRequest, HttpResponse, post, web};
use tracing::{Instrument, debug, info_span, warn};

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::update::{Dispatch, UpdateDto};

/// Header carrying the secret configured with `setWebhook`.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Receive one update from the chat platform.
#[post("/webhook")]
pub async fn receive_update(
    state: web::Data<HttpState>,
    request: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    authorise(&state, &request)?;
    let update: UpdateDto = serde_json::from_slice(&body)
        .map_err(|err| Error::invalid_request(format!("invalid update payload: {err}")))?;

    let span = info_span!("update", update_id = update.update_id);
    dispatch(&state, update).instrument(span).await;
    Ok(HttpResponse::Ok().finish())
}

fn authorise(state: &HttpState, request: &HttpRequest) -> ApiResult<()> {
    let Some(secret) = state.secret.as_ref() else {
        return Ok(());
    };
    let presented = request
        .headers()
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    match presented {
        Some(token) if secret.matches(token) => Ok(()),
        _ => {
            warn!(
                header_present = presented.is_some(),
                "rejected webhook request with invalid secret"
            );
            Err(Error::unauthorized("invalid webhook secret"))
        }
    }
}

async fn dispatch(state: &HttpState, update: UpdateDto) {
    let result = match update.into_dispatch() {
        Err(reason) => {
            debug!(%reason, "skipping update");
            return;
        }
        Ok(Dispatch::Ignored) => {
            debug!("ignoring unsupported command");
            return;
        }
        Ok(Dispatch::Text(message)) => state.chat.handle_text(&message).await,
        Ok(Dispatch::Leaderboard(message, kind)) => {
            state.chat.show_leaderboard(&message, kind).await
        }
    };

    match result {
        Ok(outcome) => debug!(?outcome, "update processed"),
        Err(error) => warn!(%error, "update processing failed"),
    }
}
