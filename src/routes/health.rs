use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::{AppState, config::RunMode, utils::success_to_api_response};

/// Ping响应
#[derive(Serialize)]
pub struct PingResponse {
    pub app_name: String,
    pub version: String,
    pub run_mode: RunMode,
    /// 服务器时间
    pub timestamp: i64,
}

/// 健康检查接口
pub async fn ping(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    (
        StatusCode::OK,
        success_to_api_response(PingResponse {
            app_name: state.config.app_name.clone(),
            version: state.config.app_version.clone(),
            run_mode: state.config.run_mode,
            timestamp: now.timestamp(),
        }),
    )
}
