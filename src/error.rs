//! 统一错误模型
//!
//! 传输层错误一律作为 `AppError` 返回给调用方；
//! 命令自身的非零退出码不是错误，而是 `CommandResult` 中的数据。

use thiserror::Error;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 应用错误类型
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("SSH connection error: {0}")]
    SshConnectionError(String),

    #[error("SSH authentication failed: {0}")]
    SshAuthenticationError(String),

    #[error("SSH execution error: {0}")]
    SshExecutionError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl AppError {
    /// 是否为会话/传输层失败（连接、认证、通道）
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            AppError::SshConnectionError(_)
                | AppError::SshAuthenticationError(_)
                | AppError::SshExecutionError(_)
        )
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(msg) => format!("Configuration error: {}", msg),
            AppError::SshConnectionError(_) => "SSH connection failed".to_string(),
            AppError::SshAuthenticationError(_) => "SSH authentication failed".to_string(),
            AppError::SshExecutionError(_) => "SSH command execution failed".to_string(),
            AppError::IoError(msg) => format!("IO error: {}", msg),
        }
    }

}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

/// 从 std::io::Error 转换
impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::IoError(e.to_string())
    }
}
