//! SSH 连接目标
//!
//! 一次连接所需的全部参数：主机、端口、用户名和凭据

use secrecy::Secret;
use std::path::PathBuf;

/// SSH 凭据
///
/// 凭据只在建立连接时读取一次，不会被记录到日志。
#[derive(Debug, Clone)]
pub enum Credential {
    /// 密码认证
    Password(Secret<String>),
    /// 私钥文件认证
    KeyFile {
        /// 私钥文件路径（.pem 等）
        path: PathBuf,
        /// 私钥密码（如果有）
        passphrase: Option<Secret<String>>,
    },
}

/// SSH 连接目标
#[derive(Debug, Clone)]
pub struct SshTarget {
    /// 主机地址（DNS 名称或 IP）
    pub host: String,
    /// 端口
    pub port: u16,
    /// 用户名
    pub username: String,
    /// 认证凭据
    pub credential: Credential,
    /// 连接超时（秒），包含 TCP 连接与握手
    pub connect_timeout_secs: u64,
}

pub(crate) fn default_ssh_port() -> u16 {
    22
}

pub(crate) fn default_connect_timeout() -> u64 {
    10
}

impl SshTarget {
    /// 创建新的连接目标
    pub fn new(host: impl Into<String>, username: impl Into<String>, credential: Credential) -> Self {
        Self {
            host: host.into(),
            port: default_ssh_port(),
            username: username.into(),
            credential,
            connect_timeout_secs: default_connect_timeout(),
        }
    }

    /// 创建使用密码认证的目标
    pub fn with_password(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, username, Credential::Password(Secret::new(password.into())))
    }

    /// 创建使用私钥文件认证的目标
    pub fn with_key_file(
        host: impl Into<String>,
        username: impl Into<String>,
        path: impl Into<PathBuf>,
        passphrase: Option<String>,
    ) -> Self {
        Self::new(
            host,
            username,
            Credential::KeyFile {
                path: path.into(),
                passphrase: passphrase.map(Secret::new),
            },
        )
    }

    /// 设置端口
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// 设置连接超时
    pub fn with_connect_timeout(mut self, timeout_secs: u64) -> Self {
        self.connect_timeout_secs = timeout_secs;
        self
    }

    /// 获取目标地址字符串
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}
