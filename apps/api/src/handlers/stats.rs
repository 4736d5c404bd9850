use axum::Json;
use axum::extract::State;
use resoluty_application::StatsReport;

use crate::dto::DataResponse;
use crate::state::AppState;

pub async fn stats_handler(State(state): State<AppState>) -> Json<DataResponse<StatsReport>> {
    Json(DataResponse::new(state.stats_service.snapshot().await))
}
