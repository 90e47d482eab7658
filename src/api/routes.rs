//! # 路由配置
//!
//! 服务商相关路径按配置中的服务商短名称生成，例如 `/api/discord/login`。

use axum::Router;
use axum::routing::get;

use super::handlers;
use super::server::AppState;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    let primary = state.primary.kind().slug();
    let secondary = state.secondary_name();

    let mut router = Router::new()
        .nest(&format!("/api/{primary}"), primary_routes())
        .route(
            &format!("/api/{secondary}/connect"),
            get(handlers::link::connect),
        )
        .route(
            "/api/profile",
            get(handlers::profile::get_profile)
                .post(handlers::profile::update_profile)
                .put(handlers::profile::update_profile),
        )
        .route("/health", get(handlers::health::health_check));

    // 次服务商未配置时不注册回调
    if state.secondary.is_some() {
        router = router.route(
            &format!("/api/{secondary}/callback"),
            get(handlers::link::callback),
        );
    }

    router.with_state(state)
}

/// 主服务商登录路由
fn primary_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(handlers::auth::login))
        .route("/callback", get(handlers::auth::callback))
        .route("/me", get(handlers::auth::me))
        .route("/logout", axum::routing::post(handlers::auth::logout))
}
