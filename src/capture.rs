//! 面向调用方的接口
//!
//! 每次调用建立一个会话，执行后无论成功、提前终止还是出错都关闭会话。

use tracing::warn;

use crate::error::Result;
use crate::execution::ResultSequence;
use crate::ssh::runner;
use crate::ssh::session::{Session, SessionProvider};
use crate::ssh::target::SshTarget;

pub use crate::execution::{all_succeeded, collect_console, collect_stderr, collect_stdout};

/// 连接目标主机并顺序执行命令列表
pub async fn run_sequence<P, C>(
    provider: &P,
    target: &SshTarget,
    commands: &[C],
    verbose: bool,
) -> Result<ResultSequence>
where
    P: SessionProvider + ?Sized,
    C: AsRef<str> + Sync,
{
    let mut session = provider.connect(target).await?;
    let outcome = runner::run(&mut session, commands, verbose).await;
    close_session(&mut session, target).await;
    outcome
}

/// 连接目标主机执行一条命令，返回合并的控制台输出
pub async fn exec_single<P>(provider: &P, target: &SshTarget, command: &str) -> Result<String>
where
    P: SessionProvider + ?Sized,
{
    let mut session = provider.connect(target).await?;
    let outcome = runner::exec(&mut session, command).await;
    close_session(&mut session, target).await;
    outcome
}

/// 连接目标主机执行一条命令，返回 (退出码, 标准输出, 标准错误)
pub async fn exec_single_status<P>(
    provider: &P,
    target: &SshTarget,
    command: &str,
    verbose: bool,
) -> Result<(Option<u32>, String, String)>
where
    P: SessionProvider + ?Sized,
{
    let mut session = provider.connect(target).await?;
    let outcome = runner::exec_status(&mut session, command, verbose).await;
    close_session(&mut session, target).await;
    outcome
}

/// 关闭失败只记录日志，不覆盖执行结果
async fn close_session<S: Session>(session: &mut S, target: &SshTarget) {
    if let Err(e) = session.close().await {
        warn!(error = %e, target = %target.target(), "Failed to close SSH session");
    }
}

/// 绑定了会话提供者与连接目标的便捷客户端
pub struct RemoteExec<P> {
    provider: P,
    target: SshTarget,
    verbose: bool,
}

impl<P: SessionProvider> RemoteExec<P> {
    pub fn new(provider: P, target: SshTarget) -> Self {
        Self {
            provider,
            target,
            verbose: false,
        }
    }

    /// 设置是否实时回显输出
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// 获取连接目标的引用
    pub fn target(&self) -> &SshTarget {
        &self.target
    }

    pub async fn run<C: AsRef<str> + Sync>(&self, commands: &[C]) -> Result<ResultSequence> {
        run_sequence(&self.provider, &self.target, commands, self.verbose).await
    }

    pub async fn capture(&self, command: &str) -> Result<String> {
        exec_single(&self.provider, &self.target, command).await
    }

    pub async fn capture_status(&self, command: &str) -> Result<(Option<u32>, String, String)> {
        exec_single_status(&self.provider, &self.target, command, self.verbose).await
    }
}
