//! 基于 russh 的会话提供者
//!
//! 负责 TCP 连接、握手、密码/私钥认证，并把 russh 的通道消息
//! 转换为 [`ChannelEvent`]。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Config, Handle};
use russh::{Channel, ChannelMsg, Disconnect, Sig};
use russh_keys::key::PublicKey;
use russh_keys::load_secret_key;
use russh_keys::PublicKeyBase64;
use secrecy::ExposeSecret;
use sha2::Digest;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::error::{AppError, Result};
use crate::ssh::session::{ChannelEvent, ExecChannel, Session, SessionProvider};
use crate::ssh::target::{Credential, SshTarget};

/// SSH_EXTENDED_DATA_STDERR
const EXTENDED_DATA_STDERR: u32 = 1;

/// 使用 russh 建立真实 SSH 连接的提供者
#[derive(Clone)]
pub struct RusshProvider {
    client_config: Arc<Config>,
}

impl RusshProvider {
    pub fn new() -> Self {
        Self {
            client_config: Arc::new(Config {
                preferred: russh::Preferred::default(),
                ..Default::default()
            }),
        }
    }
}

impl Default for RusshProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionProvider for RusshProvider {
    type Session = RusshSession;

    async fn connect(&self, target: &SshTarget) -> Result<RusshSession> {
        debug!(
            host = %target.host,
            port = %target.port,
            user = %target.username,
            "Opening SSH session"
        );

        let handler = ClientHandler {
            host: target.host.clone(),
            port: target.port,
        };

        let mut handle = timeout(
            Duration::from_secs(target.connect_timeout_secs),
            client::connect(
                self.client_config.clone(),
                (target.host.clone(), target.port),
                handler,
            ),
        )
        .await
        .map_err(|_| {
            AppError::SshConnectionError(format!("connect timed out: {}", target.target()))
        })?
        .map_err(|e| {
            error!(error = %e, target = %target.target(), "SSH connect failed");
            AppError::SshConnectionError(format!("{}: {}", target.target(), e))
        })?;

        let authenticated = match &target.credential {
            Credential::Password(password) => handle
                .authenticate_password(target.username.clone(), password.expose_secret())
                .await,
            Credential::KeyFile { path, passphrase } => {
                let passphrase = passphrase.as_ref().map(|p| p.expose_secret().as_str());
                let key = load_secret_key(path, passphrase).map_err(|e| {
                    error!(error = %e, path = %path.display(), "Failed to load SSH private key");
                    AppError::SshAuthenticationError(format!(
                        "cannot load key {}: {}",
                        path.display(),
                        e
                    ))
                })?;

                handle
                    .authenticate_publickey(target.username.clone(), Arc::new(key))
                    .await
            }
        }
        .map_err(|e| AppError::SshConnectionError(format!("{}: {}", target.target(), e)))?;

        if !authenticated {
            error!(target = %target.target(), "SSH authentication rejected");
            return Err(AppError::SshAuthenticationError(format!(
                "credentials rejected for {}",
                target.target()
            )));
        }

        info!(target = %target.target(), "SSH session established");

        Ok(RusshSession {
            handle,
            target: target.target(),
        })
    }
}

/// 已认证的 russh 会话
pub struct RusshSession {
    handle: Handle<ClientHandler>,
    target: String,
}

#[async_trait]
impl Session for RusshSession {
    type Channel = RusshChannel;

    async fn open_exec(&mut self, command: &str) -> Result<RusshChannel> {
        let mut channel = self.handle.channel_open_session().await.map_err(|e| {
            error!(error = %e, target = %self.target, "Failed to open SSH channel");
            AppError::SshConnectionError(format!("cannot open channel: {}", e))
        })?;

        channel.exec(true, command).await.map_err(|e| {
            error!(error = %e, command = %command, "Failed to send exec request");
            AppError::SshExecutionError(format!("exec request failed: {}", e))
        })?;

        Ok(RusshChannel {
            channel,
            closed: false,
            finished: false,
        })
    }

    async fn close(&mut self) -> Result<()> {
        debug!(target = %self.target, "Closing SSH session");
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| AppError::SshConnectionError(format!("disconnect failed: {}", e)))
    }
}

/// 单条命令的 russh 通道
///
/// russh 在收到 CHANNEL_CLOSE 时直接丢弃通道的发送端，
/// 因此 `wait()` 返回 None 即为通道正常结束。
pub struct RusshChannel {
    channel: Channel<client::Msg>,
    closed: bool,
    /// 已收到 EOF、退出状态、退出信号或请求被拒
    finished: bool,
}

#[async_trait]
impl ExecChannel for RusshChannel {
    async fn next_event(&mut self) -> Result<Option<ChannelEvent>> {
        if self.closed {
            return Ok(None);
        }

        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    return Ok(Some(ChannelEvent::Stdout(data.to_vec())));
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == EXTENDED_DATA_STDERR {
                        return Ok(Some(ChannelEvent::Stderr(data.to_vec())));
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    self.finished = true;
                    return Ok(Some(ChannelEvent::ExitStatus(exit_status)));
                }
                Some(ChannelMsg::ExitSignal { signal_name, .. }) => {
                    self.finished = true;
                    return Ok(Some(ChannelEvent::ExitSignal(signal_label(signal_name))));
                }
                Some(ChannelMsg::Failure) => {
                    self.finished = true;
                    return Ok(Some(ChannelEvent::Rejected));
                }
                Some(ChannelMsg::Eof) => {
                    self.finished = true;
                }
                Some(ChannelMsg::Close) => {
                    self.closed = true;
                    return Ok(None);
                }
                // Success, WindowAdjusted ...
                Some(_) => {}
                None => {
                    self.closed = true;
                    if self.finished {
                        return Ok(None);
                    }
                    // 远端既未结束输出也未上报状态：会话已断开
                    return Err(AppError::SshConnectionError(
                        "transport closed before the channel completed".to_string(),
                    ));
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.channel
            .close()
            .await
            .map_err(|e| AppError::SshConnectionError(format!("cannot close channel: {}", e)))
    }
}

/// `exit-signal` 中的信号名称（不带 SIG 前缀）
fn signal_label(signal: Sig) -> String {
    match signal {
        Sig::Custom(name) => name,
        other => format!("{:?}", other),
    }
}

/// russh 客户端回调处理器
///
/// 主机密钥校验策略不在本 crate 范围内：一律接受，仅记录指纹。
pub struct ClientHandler {
    host: String,
    port: u16,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let key_data = server_public_key.public_key_base64();
        let mut hasher = sha2::Sha256::new();
        hasher.update(key_data.as_bytes());
        let fingerprint = hex::encode(hasher.finalize());

        debug!(
            host = %self.host,
            port = self.port,
            fingerprint = %fingerprint,
            "Accepting server host key"
        );
        Ok(true)
    }
}
