use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// 配置加载错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required config key {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for config key {key}")]
    Invalid { key: &'static str, value: String },
}

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Debug,
    Release,
    Test,
}

impl FromStr for RunMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(RunMode::Debug),
            "release" => Ok(RunMode::Release),
            "test" => Ok(RunMode::Test),
            _ => Err(()),
        }
    }
}

/// 会话令牌的生成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// 由用户名和固定盐值摘要得出，同一用户每次登录得到相同令牌
    Deterministic,
    /// 每次登录随机生成
    Random,
}

impl FromStr for TokenMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deterministic" => Ok(TokenMode::Deterministic),
            "random" => Ok(TokenMode::Random),
            _ => Err(()),
        }
    }
}

/// 登录时的密码校验方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    /// 与数据库中保存的密码比较
    Strict,
    /// 兼容旧服务：不做比较，总是通过
    Legacy,
}

impl FromStr for PasswordCheck {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(PasswordCheck::Strict),
            "legacy" => Ok(PasswordCheck::Legacy),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// 日志输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// 按天滚动的日志文件，保留 `LOG_SAVE_DAYS` 个
    File,
}

impl FromStr for LogOutput {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,
    pub run_mode: RunMode,
    pub server_host: String,
    pub server_port: u16,

    pub database_url: String,
    pub db_max_open_conn: u32,
    pub db_max_idle_conn: u32,
    pub db_max_idle_time_secs: u64,
    pub db_conn_max_lifetime_secs: u64,
    pub run_migrations: bool,

    pub redis_url: String,

    pub session_expired_secs: u64,
    pub user_expired_secs: u64,
    pub session_cookie_name: String,
    pub cookie_expire_secs: i64,
    pub token_mode: TokenMode,
    pub token_salt: String,
    pub password_check: PasswordCheck,

    pub cors_origins: Vec<String>,

    pub log_level: String,
    pub log_format: LogFormat,
    pub log_output: LogOutput,
    pub log_path: String,
    pub log_save_days: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app_name: "gous".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            run_mode: RunMode::Debug,
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            database_url: "postgres://localhost/gous".to_string(),
            db_max_open_conn: 10,
            db_max_idle_conn: 2,
            db_max_idle_time_secs: 600,
            db_conn_max_lifetime_secs: 1800,
            run_migrations: true,
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
            session_expired_secs: 3600,
            user_expired_secs: 3600,
            session_cookie_name: "user_session".to_string(),
            cookie_expire_secs: 3600,
            token_mode: TokenMode::Deterministic,
            token_salt: "session".to_string(),
            password_check: PasswordCheck::Strict,
            cors_origins: Vec::new(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            log_output: LogOutput::Stdout,
            log_path: "logs/gous.log".to_string(),
            log_save_days: 7,
        }
    }
}

impl Config {
    /// 从 `.env` 和进程环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 通过任意键值查找函数构建配置，未设置的可选项取默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        Ok(Config {
            app_name: lookup("APP_NAME").unwrap_or(defaults.app_name),
            app_version: lookup("APP_VERSION").unwrap_or(defaults.app_version),
            run_mode: parse_or(&lookup, "RUN_MODE", defaults.run_mode)?,
            server_host: lookup("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port)?,

            database_url: required("DATABASE_URL")?,
            db_max_open_conn: parse_or(&lookup, "DB_MAX_OPEN_CONN", defaults.db_max_open_conn)?,
            db_max_idle_conn: parse_or(&lookup, "DB_MAX_IDLE_CONN", defaults.db_max_idle_conn)?,
            db_max_idle_time_secs: parse_or(
                &lookup,
                "DB_MAX_IDLE_TIME",
                defaults.db_max_idle_time_secs,
            )?,
            db_conn_max_lifetime_secs: parse_or(
                &lookup,
                "DB_CONN_MAX_LIFETIME",
                defaults.db_conn_max_lifetime_secs,
            )?,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", defaults.run_migrations)?,

            redis_url: required("REDIS_URL")?,

            session_expired_secs: parse_or(
                &lookup,
                "SESSION_EXPIRED",
                defaults.session_expired_secs,
            )?,
            user_expired_secs: parse_or(&lookup, "USER_EXPIRED", defaults.user_expired_secs)?,
            session_cookie_name: lookup("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session_cookie_name),
            cookie_expire_secs: parse_or(&lookup, "COOKIE_EXPIRE", defaults.cookie_expire_secs)?,
            token_mode: parse_or(&lookup, "SESSION_TOKEN_MODE", defaults.token_mode)?,
            token_salt: lookup("SESSION_TOKEN_SALT").unwrap_or(defaults.token_salt),
            password_check: parse_or(&lookup, "PASSWORD_CHECK", defaults.password_check)?,

            cors_origins: lookup("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),

            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_or(&lookup, "LOG_FORMAT", defaults.log_format)?,
            log_output: parse_or(&lookup, "LOG_OUTPUT", defaults.log_output)?,
            log_path: lookup("LOG_PATH")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_path),
            log_save_days: parse_or(&lookup, "LOG_SAVE_DAYS", defaults.log_save_days)?,
        })
    }

    pub fn session_expiration(&self) -> Duration {
        Duration::from_secs(self.session_expired_secs)
    }

    pub fn user_expiration(&self) -> Duration {
        Duration::from_secs(self.user_expired_secs)
    }

    pub fn db_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.db_max_idle_time_secs)
    }

    pub fn db_max_lifetime(&self) -> Duration {
        Duration::from_secs(self.db_conn_max_lifetime_secs)
    }

    /// 拆分 `LOG_PATH` 为目录和文件名前缀，滚动文件名为 `前缀.YYYY-MM-DD`
    pub fn log_file_parts(&self) -> (PathBuf, String) {
        let path = Path::new(&self.log_path);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.log", self.app_name));
        (dir, prefix)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_keys_set() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/gous"),
            ("REDIS_URL", "redis://cache:6379/1"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://db/gous");
        assert_eq!(config.redis_url, "redis://cache:6379/1");
        assert_eq!(config.session_cookie_name, "user_session");
        assert_eq!(config.session_expiration(), Duration::from_secs(3600));
        assert_eq!(config.token_mode, TokenMode::Deterministic);
        assert_eq!(config.password_check, PasswordCheck::Strict);
        assert_eq!(config.run_mode, RunMode::Debug);
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/gous"),
            ("REDIS_URL", "redis://cache"),
            ("SERVER_PORT", "9000"),
            ("SESSION_EXPIRED", "120"),
            ("USER_EXPIRED", "60"),
            ("SESSION_TOKEN_MODE", "random"),
            ("PASSWORD_CHECK", "legacy"),
            ("RUN_MODE", "release"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 9000);
        assert_eq!(config.session_expiration(), Duration::from_secs(120));
        assert_eq!(config.user_expiration(), Duration::from_secs(60));
        assert_eq!(config.token_mode, TokenMode::Random);
        assert_eq!(config.password_check, PasswordCheck::Legacy);
        assert_eq!(config.run_mode, RunMode::Release);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn missing_required_key_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("REDIS_URL", "redis://cache")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn malformed_value_is_reported() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/gous"),
            ("REDIS_URL", "redis://cache"),
            ("PASSWORD_CHECK", "sometimes"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PASSWORD_CHECK", .. }));
    }

    #[test]
    fn file_log_output_is_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/gous"),
            ("REDIS_URL", "redis://cache"),
            ("LOG_OUTPUT", "file"),
            ("LOG_PATH", "/var/log/gous/app.log"),
            ("LOG_SAVE_DAYS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.log_output, LogOutput::File);
        assert_eq!(config.log_path, "/var/log/gous/app.log");
        assert_eq!(config.log_save_days, 30);
        assert_eq!(
            config.log_file_parts(),
            (PathBuf::from("/var/log/gous"), "app.log".to_string())
        );

        let defaults = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/gous"),
            ("REDIS_URL", "redis://cache"),
        ]))
        .unwrap();
        assert_eq!(defaults.log_output, LogOutput::Stdout);
        assert_eq!(defaults.log_path, "logs/gous.log");
        assert_eq!(defaults.log_save_days, 7);

        let bare = Config {
            log_path: "gous.log".to_string(),
            ..Config::default()
        };
        assert_eq!(bare.log_file_parts(), (PathBuf::from("."), "gous.log".to_string()));

        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/gous"),
            ("REDIS_URL", "redis://cache"),
            ("LOG_SAVE_DAYS", "a week"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "LOG_SAVE_DAYS", .. }));
    }
}
