use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use cookie::Cookie;
use resoluty_domain::{AUTH_MARKER_COOKIE, GateDecision};

use crate::dto::{DataResponse, SessionGateQuery};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn session_gate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<SessionGateQuery>, QueryRejection>,
) -> ApiResult<Json<DataResponse<GateDecision>>> {
    let Query(query) = query?;
    let decision = state
        .session_gate
        .evaluate(&query.path, auth_marker_present(&headers));

    Ok(Json(DataResponse::new(decision)))
}

fn auth_marker_present(headers: &HeaderMap) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .any(|cookie| cookie.name() == AUTH_MARKER_COOKIE && !cookie.value().is_empty())
}
