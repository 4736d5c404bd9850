use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use resoluty_core::AppError;
use resoluty_domain::{ConnectionReport, RangeAddress, Table, WriteOutcome};

use crate::dto::{DataResponse, SheetValuesRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn test_connection_handler(
    State(state): State<AppState>,
) -> Json<DataResponse<ConnectionReport>> {
    Json(DataResponse::new(state.gateway.test_connection().await))
}

pub async fn write_values_handler(
    State(state): State<AppState>,
    payload: Result<Json<SheetValuesRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<WriteOutcome>>> {
    let (range, values) = required_values(payload)?;
    let outcome = state.gateway.write(&range, &values).await?;

    Ok(Json(DataResponse::new(outcome)))
}

pub async fn append_values_handler(
    State(state): State<AppState>,
    payload: Result<Json<SheetValuesRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<WriteOutcome>>> {
    let (range, values) = required_values(payload)?;
    let outcome = state.gateway.append(&range, &values).await?;

    Ok(Json(DataResponse::new(outcome)))
}

pub async fn read_values_handler(
    State(state): State<AppState>,
    Path(range): Path<String>,
) -> ApiResult<Json<DataResponse<Table>>> {
    let range = RangeAddress::new(range)?;
    let table = state.gateway.read(&range).await?;

    Ok(Json(DataResponse::new(table)))
}

fn required_values(
    payload: Result<Json<SheetValuesRequest>, JsonRejection>,
) -> ApiResult<(RangeAddress, Table)> {
    let Json(payload) = payload?;
    let range = payload.range.filter(|range| !range.trim().is_empty());

    match (range, payload.values) {
        (Some(range), Some(values)) => Ok((RangeAddress::new(range)?, values)),
        _ => Err(AppError::Validation("Range e values são obrigatórios".to_owned()).into()),
    }
}
