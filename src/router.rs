use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::{
    AppState,
    config::{Config, RunMode},
    middleware::{SESSION_HEADER, auth_middleware, request_log},
    routes,
};

/// 创建主路由
pub fn create_router(state: AppState) -> Router {
    // 公开路由
    let public_routes = Router::new()
        .route("/ping", get(routes::health::ping))
        .route("/user/register", post(routes::user::register))
        .route("/user/login", post(routes::user::login));

    // 需要会话令牌的路由
    let protected_routes = Router::new()
        .route("/user/logout", post(routes::user::logout))
        .route("/user/logoff", post(routes::user::logoff))
        .route("/user/get_user_info", get(routes::user::get_user_info))
        .route("/user/update_nick_name", post(routes::user::update_nick_name))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_log))
                .layer(cors_layer(&state.config)),
        )
        .with_state(state)
}

/// 调试模式允许所有来源，其他模式只允许配置的来源
fn cors_layer(config: &Config) -> CorsLayer {
    if config.run_mode == RunMode::Debug {
        tracing::debug!("Adding permissive CORS layer for debug mode");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(SESSION_HEADER)])
        .allow_credentials(true)
}
