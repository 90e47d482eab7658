//! # API 服务器
//!
//! Axum HTTP服务器，承载登录、账号关联与资料接口

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{HttpProviderClient, ProviderClient, SessionCarrier};
use crate::auth::oauth::ProviderConfig;
use crate::config::{AppConfig, LinkingCapability};
use crate::error::{Context, PortfolioError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::storage::{JsonFileProfileStore, ProfileStore};
use crate::{linfo, lwarn};

/// API服务器应用状态
///
/// 进程启动时构建一次，所有请求共享。
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// 主服务商（登录）
    pub primary: Arc<dyn ProviderClient>,
    /// 次服务商（账号关联），未配置时为 None
    pub secondary: Option<Arc<dyn ProviderClient>>,
    pub store: Arc<dyn ProfileStore>,
    pub sessions: SessionCarrier,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        primary: Arc<dyn ProviderClient>,
        secondary: Option<Arc<dyn ProviderClient>>,
        store: Arc<dyn ProfileStore>,
    ) -> Self {
        let sessions = SessionCarrier::new(&config.session);
        Self {
            config,
            primary,
            secondary,
            store,
            sessions,
        }
    }

    /// 按配置构建 HTTP 客户端与文件存储
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self> {
        let primary: Arc<dyn ProviderClient> = Arc::new(HttpProviderClient::new(
            ProviderConfig::from_settings(&config.primary).context("主服务商配置无效")?,
        ));

        let secondary: Option<Arc<dyn ProviderClient>> = match config.linking_capability() {
            LinkingCapability::Enabled => Some(Arc::new(HttpProviderClient::new(
                ProviderConfig::from_settings(&config.secondary).context("次服务商配置无效")?,
            ))),
            LinkingCapability::Disabled { .. } => None,
        };

        let store = JsonFileProfileStore::new(&config.storage.profiles_path);
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ProfileStore,
            "store_ready",
            &format!("Profiles stored in {}", store.path().display())
        );

        Ok(Self::new(config, primary, secondary, Arc::new(store)))
    }

    /// 次服务商的短名称，未启用时取配置中的种类
    #[must_use]
    pub fn secondary_name(&self) -> &'static str {
        self.config.secondary.kind.slug()
    }
}

/// 构建完整路由（含 CORS 与访问日志）
pub fn build_router(state: AppState) -> Result<Router> {
    let origin = state
        .config
        .frontend
        .origin
        .trim_end_matches('/')
        .parse::<HeaderValue>()
        .map_err(|e| {
            PortfolioError::config_with_source(
                format!("Invalid frontend origin: {}", state.config.frontend.origin),
                e,
            )
        })?;

    let cors_layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]);

    let app = super::routes::create_routes(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer),
    );

    Ok(app)
}

/// API服务器
pub struct ApiServer {
    addr: SocketAddr,
    router: Router,
}

impl ApiServer {
    /// 创建新的API服务器
    pub fn new(state: AppState) -> Result<Self> {
        let server = &state.config.server;
        let ip = server.host.parse::<std::net::IpAddr>().map_err(|e| {
            PortfolioError::config_with_source(format!("Invalid bind address '{}'", server.host), e)
        })?;
        let addr = SocketAddr::new(ip, server.port);

        if state.secondary.is_none() {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "linking_routes_disabled",
                &format!(
                    "{} callback route not registered",
                    state.config.secondary.kind.display_name()
                )
            );
        }

        let router = build_router(state)?;
        Ok(Self { addr, router })
    }

    #[must_use]
    pub const fn bind_address(&self) -> SocketAddr {
        self.addr
    }

    /// 启动服务器，收到 Ctrl+C 后优雅退出
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| {
            PortfolioError::server_start_with_source(format!("Failed to bind {}", self.addr), e)
        })?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("Portfolio API listening on http://{}", self.addr)
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| PortfolioError::server_start_with_source("API server error", e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stopped",
            "Portfolio API stopped"
        );
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lwarn!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "signal_listen_failed",
            &format!("Failed to listen for shutdown signal: {e}")
        );
        std::future::pending::<()>().await;
    }
    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::ServerSetup,
        "shutdown_signal",
        "Received Ctrl+C, shutting down"
    );
}
