//! # 配置管理器
//!
//! 统一的配置加载入口：TOML 文件 + 环境变量覆盖 + 启动校验

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::AppConfig;
use super::app_config::{LinkingCapability, ProviderSettings};
use crate::error::{PortfolioError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo, lwarn};

/// 配置管理器
///
/// 进程启动时构建一次，之后只读共享。
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 当前配置
    config: Arc<AppConfig>,
    /// 配置文件来源（未找到文件时为 None）
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 加载配置
    ///
    /// 优先使用 `PORTFOLIO_CONFIG_PATH` 指定的文件，否则按 `RUST_ENV` 选择
    /// `config/config.{env}.toml`；文件不存在时使用默认值。
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::load_dotenv() {
            ldebug!(
                "system",
                LogStage::Configuration,
                LogComponent::Config,
                "dotenv_loaded",
                &format!("Loaded environment from {}", path.display())
            );
        }

        let config_file = env::var("PORTFOLIO_CONFIG_PATH").unwrap_or_else(|_| {
            let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
            format!("config/config.{env}.toml")
        });

        Self::from_sources(Some(Path::new(&config_file)), |key| env::var(key).ok())
    }

    /// 读取当前目录（或上级目录）中的 `.env`，已存在的环境变量不会被覆盖
    ///
    /// 需要在初始化日志之前调用，`.env` 中的 `LOG_LEVEL` / `RUST_LOG` 才会生效。
    pub fn load_dotenv() -> Option<PathBuf> {
        dotenvy::dotenv().ok()
    }

    /// 读取指定的 env 文件
    pub fn load_dotenv_from(path: &Path) -> Result<()> {
        dotenvy::from_path(path).map_err(|e| {
            PortfolioError::config_with_source(format!("无法读取 {}", path.display()), e)
        })
    }

    /// 从指定文件和环境变量查找函数构建配置
    pub fn from_sources<F>(config_path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (mut config, source) = match config_path {
            Some(path) if path.exists() => (Self::load_config_file(path)?, Some(path.to_path_buf())),
            Some(path) => {
                ldebug!(
                    "system",
                    LogStage::Configuration,
                    LogComponent::Config,
                    "config_file_absent",
                    &format!("Config file {} not found, using defaults", path.display())
                );
                (AppConfig::default(), None)
            }
            None => (AppConfig::default(), None),
        };

        let applied = Self::apply_env_overrides(&mut config, &lookup)?;

        config.validate().map_err(PortfolioError::config)?;

        match config.linking_capability() {
            LinkingCapability::Enabled => linfo!(
                "system",
                LogStage::Configuration,
                LogComponent::Config,
                "linking_enabled",
                &format!(
                    "{} account linking enabled",
                    config.secondary.kind.display_name()
                )
            ),
            LinkingCapability::Disabled { missing } => lwarn!(
                "system",
                LogStage::Configuration,
                LogComponent::Config,
                "linking_disabled",
                &format!(
                    "{} OAuth not configured (missing {}). Users won't be able to verify {} accounts.",
                    config.secondary.kind.display_name(),
                    missing.join(", "),
                    config.secondary.kind.display_name()
                )
            ),
        }

        linfo!(
            "system",
            LogStage::Configuration,
            LogComponent::Config,
            "config_loaded",
            "Configuration loaded",
            source = source
                .as_ref()
                .map_or_else(|| "defaults".to_string(), |p| p.display().to_string()),
            env_overrides = applied
        );

        Ok(Self {
            config: Arc::new(config),
            source,
        })
    }

    /// 获取当前配置
    #[must_use]
    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    /// 配置文件路径
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        let config_content = std::fs::read_to_string(path).map_err(|e| {
            PortfolioError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        toml::from_str(&config_content).map_err(|e| {
            PortfolioError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}, 详细错误: {e}", path.display()),
                e,
            )
        })
    }

    /// 应用环境变量覆盖，返回生效的变量个数
    fn apply_env_overrides<F>(config: &mut AppConfig, lookup: &F) -> Result<usize>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = 0;

        if let Some(port) = lookup("PORT") {
            config.server.port = port.trim().parse().map_err(|e| {
                PortfolioError::config_with_source(format!("无效的端口号: {port}"), e)
            })?;
            applied += 1;
        }
        if let Some(host) = lookup("HOST") {
            config.server.host = host;
            applied += 1;
        }
        if let Some(origin) = lookup("FRONTEND_URL") {
            config.frontend.origin = origin;
            applied += 1;
        }
        if let Some(secure) = lookup("COOKIE_SECURE") {
            config.session.cookie_secure = secure == "true";
            applied += 1;
        }
        if let Some(path) = lookup("PROFILES_FILE") {
            config.storage.profiles_path = path;
            applied += 1;
        }

        applied += Self::apply_provider_overrides(&mut config.primary, lookup);
        applied += Self::apply_provider_overrides(&mut config.secondary, lookup);

        Ok(applied)
    }

    /// 按服务商前缀覆盖凭据，例如 `DISCORD_CLIENT_ID`
    fn apply_provider_overrides<F>(settings: &mut ProviderSettings, lookup: &F) -> usize
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = settings.kind.env_prefix();
        let mut applied = 0;

        for (suffix, slot) in [
            ("CLIENT_ID", &mut settings.client_id),
            ("CLIENT_SECRET", &mut settings.client_secret),
            ("REDIRECT_URI", &mut settings.redirect_uri),
        ] {
            if let Some(value) = lookup(&format!("{prefix}_{suffix}")) {
                *slot = Some(value);
                applied += 1;
            }
        }

        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth::ProviderKind;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const PRIMARY_ENV: [(&str, &str); 3] = [
        ("DISCORD_CLIENT_ID", "discord-id"),
        ("DISCORD_CLIENT_SECRET", "discord-secret"),
        ("DISCORD_REDIRECT_URI", "http://localhost:3001/api/discord/callback"),
    ];

    #[test]
    fn test_env_only_configuration() {
        let mut vars = PRIMARY_ENV.to_vec();
        vars.extend([
            ("PORT", "4100"),
            ("FRONTEND_URL", "https://folio.example"),
            ("COOKIE_SECURE", "true"),
            ("PROFILES_FILE", "/var/lib/folio/profiles.json"),
        ]);

        let manager = ConfigManager::from_sources(None, env_of(&vars)).unwrap();
        let config = manager.config();

        assert_eq!(config.server.port, 4100);
        assert_eq!(config.frontend.origin, "https://folio.example");
        assert!(config.session.cookie_secure);
        assert_eq!(config.storage.profiles_path, "/var/lib/folio/profiles.json");
        assert_eq!(config.primary.client_id.as_deref(), Some("discord-id"));
        assert!(!config.linking_capability().is_enabled());
        assert!(manager.source().is_none());
    }

    #[test]
    fn test_cookie_secure_requires_literal_true() {
        let mut vars = PRIMARY_ENV.to_vec();
        vars.push(("COOKIE_SECURE", "yes"));

        let manager = ConfigManager::from_sources(None, env_of(&vars)).unwrap();
        assert!(!manager.config().session.cookie_secure);
    }

    #[test]
    fn test_missing_primary_is_fatal() {
        let err = ConfigManager::from_sources(None, env_of(&[("GITHUB_CLIENT_ID", "x")]))
            .unwrap_err();
        assert!(matches!(err, PortfolioError::Config { .. }));
        assert!(err.to_string().contains("DISCORD_CLIENT_ID"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut vars = PRIMARY_ENV.to_vec();
        vars.push(("PORT", "not-a-port"));
        assert!(ConfigManager::from_sources(None, env_of(&vars)).is_err());
    }

    #[test]
    fn test_file_then_env_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [frontend]
            origin = "https://from-file.example"

            [primary]
            kind = "discord"
            client_id = "file-id"
            client_secret = "file-secret"
            redirect_uri = "http://localhost/cb"

            [secondary]
            kind = "github"
            client_id = "gh-id"
            client_secret = "gh-secret"
            "#
        )
        .unwrap();

        let vars = [
            ("DISCORD_CLIENT_ID", "env-id"),
            ("GITHUB_REDIRECT_URI", "http://localhost/api/github/callback"),
        ];
        let manager = ConfigManager::from_sources(Some(file.path()), env_of(&vars)).unwrap();
        let config = manager.config();

        assert_eq!(config.frontend.origin, "https://from-file.example");
        assert_eq!(config.primary.client_id.as_deref(), Some("env-id"));
        assert_eq!(config.primary.client_secret.as_deref(), Some("file-secret"));
        assert_eq!(config.secondary.kind, ProviderKind::GitHub);
        assert!(config.linking_capability().is_enabled());
        assert_eq!(manager.source(), Some(file.path()));
    }

    #[test]
    fn test_dotenv_file_populates_process_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "PORTFOLIO_DOTENV_LOG_LEVEL=debug").unwrap();

        ConfigManager::load_dotenv_from(file.path()).unwrap();
        assert_eq!(
            env::var("PORTFOLIO_DOTENV_LOG_LEVEL").as_deref(),
            Ok("debug")
        );

        let missing = file.path().with_extension("absent");
        assert!(matches!(
            ConfigManager::load_dotenv_from(&missing),
            Err(PortfolioError::Config { .. })
        ));
    }
}
