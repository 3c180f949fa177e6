//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::Secret;
use serde::Deserialize;
use std::path::PathBuf;

use crate::ssh::target::{default_connect_timeout, default_ssh_port, Credential, SshTarget};

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty, compact
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SshSettings {
    /// 目标主机
    #[serde(default)]
    pub host: Option<String>,
    /// 端口
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// 用户名
    #[serde(default)]
    pub username: Option<String>,
    /// 密码（使用 Secret 包装，防止日志泄露）
    #[serde(default)]
    pub password: Option<Secret<String>>,
    /// 私钥文件路径
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    /// 私钥密码（可选，使用 Secret 包装）
    #[serde(default)]
    pub key_passphrase: Option<Secret<String>>,
    /// 连接超时（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl SshSettings {
    /// 转换为连接目标；同时配置了私钥和密码时优先使用私钥
    pub fn to_target(&self) -> Result<SshTarget, ConfigError> {
        let host = self
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| ConfigError::Message("ssh.host is required".to_string()))?;

        let username = self
            .username
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ConfigError::Message("ssh.username is required".to_string()))?;

        let credential = match (&self.key_file, &self.password) {
            (Some(path), _) => Credential::KeyFile {
                path: path.clone(),
                passphrase: self.key_passphrase.clone(),
            },
            (None, Some(password)) => Credential::Password(password.clone()),
            (None, None) => {
                return Err(ConfigError::Message(
                    "either ssh.password or ssh.key_file is required".to_string(),
                ))
            }
        };

        Ok(SshTarget {
            host,
            port: self.port,
            username,
            credential,
            connect_timeout_secs: self.connect_timeout_secs,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub ssh: SshSettings,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 从环境变量加载配置（前缀为 OPS_EXEC_，层级分隔符为 __）
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("ssh.port", 22)?
            .set_default("ssh.connect_timeout_secs", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(
                Environment::with_prefix("OPS_EXEC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ssh.port == 0 {
            return Err(ConfigError::Message("ssh.port must not be 0".to_string()));
        }

        if self.ssh.connect_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "ssh.connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty, compact",
                    self.logging.format
                )))
            }
        }

        Ok(())
    }
}
