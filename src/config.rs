/*
 * Responsibility
 * - 環境変数の読み込み (PORT, passphrase 保存先, 未初期化時ポリシー, HTTP limits)
 * - 設定値のバリデーション (不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::middleware::{auth::UninitializedPolicy, http::HttpLimits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // None: the passphrase store is never initialized.
    pub passphrase_dir: Option<PathBuf>,
    pub permit_unauthenticated: bool,
    pub extra_exempt_paths: Vec<String>,

    pub request_timeout_seconds: u64,
    pub body_limit_bytes: usize,
}

impl Config {
    pub const DEFAULT_PORT: u16 = 56001;

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = parse_or(var("PORT"), Self::DEFAULT_PORT, "PORT")?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV").as_deref());

        let passphrase_dir = var("AUTH_PASSPHRASE_DIR")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let permit_unauthenticated = match var("AUTH_PERMIT_UNAUTHENTICATED") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid("AUTH_PERMIT_UNAUTHENTICATED"))?,
            None => false,
        };

        let extra_exempt_paths = var("AUTH_EXEMPT_PATHS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let limits = HttpLimits::default();
        let request_timeout_seconds = parse_or(
            var("HTTP_REQUEST_TIMEOUT_SECONDS"),
            limits.request_timeout.as_secs(),
            "HTTP_REQUEST_TIMEOUT_SECONDS",
        )?;
        let body_limit_bytes = parse_or(
            var("HTTP_BODY_LIMIT_BYTES"),
            limits.body_limit_bytes,
            "HTTP_BODY_LIMIT_BYTES",
        )?;

        Ok(Self {
            addr,
            app_env,
            passphrase_dir,
            permit_unauthenticated,
            extra_exempt_paths,
            request_timeout_seconds,
            body_limit_bytes,
        })
    }

    pub fn uninitialized_policy(&self) -> UninitializedPolicy {
        if self.permit_unauthenticated {
            UninitializedPolicy::PermitUnauthenticated
        } else {
            UninitializedPolicy::Deny
        }
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    default: T,
    key: &'static str,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
