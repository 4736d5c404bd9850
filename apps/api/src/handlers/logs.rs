use std::str::FromStr;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use resoluty_application::HeaderSetupReport;
use resoluty_core::AppError;
use resoluty_domain::{LogDelivery, LogKind};
use serde_json::Value;

use crate::dto::{DataResponse, LogRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn log_handler(
    State(state): State<AppState>,
    payload: Result<Json<LogRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<LogDelivery>>> {
    let Json(payload) = payload?;
    let (Some(kind), Some(data)) = (
        payload.kind.filter(|kind| !kind.trim().is_empty()),
        payload.data.filter(|data| !data.is_null()),
    ) else {
        return Err(AppError::Validation("Type e data são obrigatórios".to_owned()).into());
    };

    let kind = LogKind::from_str(kind.trim())
        .map_err(|_| AppError::Validation("Tipo de log não suportado".to_owned()))?;
    let details = data.get("details").cloned().unwrap_or(Value::Null);

    let delivery = match kind {
        LogKind::UserAction => {
            let action = required_field(&data, "action")?;
            let user_id = data
                .get("userId")
                .and_then(Value::as_str)
                .map(str::to_owned);
            state
                .log_recorder
                .log_user_action(action, details, user_id)
                .await
        }
        LogKind::FrontendEvent => {
            let event = required_field(&data, "event")?;
            state.log_recorder.log_frontend_event(event, details).await
        }
    };

    Ok(Json(DataResponse::new(delivery)))
}

pub async fn create_headers_handler(
    State(state): State<AppState>,
) -> Json<DataResponse<HeaderSetupReport>> {
    Json(DataResponse::new(state.log_recorder.create_headers().await))
}

fn required_field<'a>(data: &'a Value, field: &str) -> Result<&'a str, AppError> {
    data.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("data.{field} é obrigatório")))
}
