//! # Portfolio API 主程序
//!
//! 加载配置、构建应用状态并启动 HTTP 服务

use std::sync::Arc;

use portfolio_api::{
    Result,
    api::{ApiServer, AppState},
    config::ConfigManager,
    ldebug, lerror, linfo,
    logging::{self, LogComponent, LogStage},
};

#[tokio::main]
async fn main() {
    // 先读取 .env，再按其中的日志级别初始化日志系统
    let dotenv = ConfigManager::load_dotenv();
    let log_level = std::env::var("LOG_LEVEL").ok();
    logging::init_optimized_logging(log_level.as_ref());

    if let Some(path) = dotenv {
        ldebug!(
            "system",
            LogStage::Configuration,
            LogComponent::Config,
            "dotenv_loaded",
            &format!("Loaded environment from {}", path.display())
        );
    }

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        "服务启动"
    );

    if let Err(e) = run().await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:?}")
        );
        std::process::exit(1);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
}

async fn run() -> Result<()> {
    let config_manager = ConfigManager::load()?;
    let state = AppState::from_config(config_manager.config())?;

    let primary = Arc::clone(&state.primary);
    let server = ApiServer::new(state)?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "login_url",
        &format!(
            "Login URL: http://{}/api/{}/login",
            server.bind_address(),
            primary.kind().slug()
        )
    );

    server.serve().await
}
