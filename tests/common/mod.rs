//! 测试公共模块
//! 提供脚本化的会话提供者，代替真实 SSH 服务器

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ops_exec::error::{AppError, Result};
use ops_exec::ssh::{ChannelEvent, ExecChannel, Session, SessionProvider, SshTarget};

/// 测试连接参数（显式传入，不使用全局常量）
#[derive(Debug, Clone)]
pub struct TestSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2222,
            user: "nane".to_string(),
            password: "secret".to_string(),
        }
    }
}

impl TestSettings {
    pub fn target(&self) -> SshTarget {
        SshTarget::with_password(&self.host, &self.user, &self.password).with_port(self.port)
    }
}

/// 通道脚本的最后一步
#[derive(Debug, Clone)]
pub enum Ending {
    /// 正常关闭通道
    Close,
    /// 传输层中断
    TransportLoss,
}

#[derive(Debug, Clone)]
pub struct Script {
    pub events: Vec<ChannelEvent>,
    pub ending: Ending,
}

impl Script {
    pub fn new(events: Vec<ChannelEvent>) -> Self {
        Self {
            events,
            ending: Ending::Close,
        }
    }

    pub fn transport_loss(events: Vec<ChannelEvent>) -> Self {
        Self {
            events,
            ending: Ending::TransportLoss,
        }
    }
}

/// 提供者记录的调用情况
#[derive(Debug, Default)]
pub struct CallLog {
    pub connects: usize,
    pub executed: Vec<String>,
    pub channel_closes: usize,
    pub session_closes: usize,
}

/// 模拟一个极简 shell：`echo '...'` 成功输出，未登记的命令返回 127
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    scripts: HashMap<String, Script>,
    refuse_connect: bool,
    pub log: Arc<Mutex<CallLog>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记命令的事件脚本
    pub fn script(mut self, command: &str, script: Script) -> Self {
        self.scripts.insert(command.to_string(), script);
        self
    }

    /// 连接时返回认证失败
    pub fn refusing() -> Self {
        Self {
            refuse_connect: true,
            ..Self::default()
        }
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, CallLog> {
        self.log.lock().unwrap()
    }

    fn script_for(&self, command: &str) -> Script {
        if let Some(script) = self.scripts.get(command) {
            return script.clone();
        }

        if let Some(text) = command
            .strip_prefix("echo '")
            .and_then(|rest| rest.strip_suffix('\''))
        {
            return Script::new(vec![
                ChannelEvent::Stdout(format!("{}\n", text).into_bytes()),
                ChannelEvent::ExitStatus(0),
            ]);
        }

        let program = command.split_whitespace().next().unwrap_or_default();
        Script::new(vec![
            ChannelEvent::Stderr(format!("bash: {}: command not found\n", program).into_bytes()),
            ChannelEvent::ExitStatus(127),
        ])
    }
}

#[async_trait]
impl SessionProvider for ScriptedProvider {
    type Session = ScriptedSession;

    async fn connect(&self, target: &SshTarget) -> Result<ScriptedSession> {
        self.log().connects += 1;
        if self.refuse_connect {
            return Err(AppError::SshAuthenticationError(format!(
                "credentials rejected for {}",
                target.target()
            )));
        }
        Ok(ScriptedSession {
            provider: self.clone(),
        })
    }
}

pub struct ScriptedSession {
    provider: ScriptedProvider,
}

#[async_trait]
impl Session for ScriptedSession {
    type Channel = ScriptedChannel;

    async fn open_exec(&mut self, command: &str) -> Result<ScriptedChannel> {
        self.provider.log().executed.push(command.to_string());
        let script = self.provider.script_for(command);
        Ok(ScriptedChannel {
            events: script.events.into(),
            ending: script.ending,
            log: self.provider.log.clone(),
        })
    }

    async fn close(&mut self) -> Result<()> {
        self.provider.log().session_closes += 1;
        Ok(())
    }
}

pub struct ScriptedChannel {
    events: VecDeque<ChannelEvent>,
    ending: Ending,
    log: Arc<Mutex<CallLog>>,
}

#[async_trait]
impl ExecChannel for ScriptedChannel {
    async fn next_event(&mut self) -> Result<Option<ChannelEvent>> {
        match self.events.pop_front() {
            Some(event) => Ok(Some(event)),
            None => match self.ending {
                Ending::Close => Ok(None),
                Ending::TransportLoss => Err(AppError::SshConnectionError(
                    "transport closed before the channel completed".to_string(),
                )),
            },
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.log.lock().unwrap().channel_closes += 1;
        Ok(())
    }
}
