//! 会话与执行通道抽象
//!
//! 传输层（握手、认证、加密、流控）由外部 SSH 库负责，
//! 这里只定义执行器依赖的最小能力：建立会话、按命令打开通道、读取通道事件。

use async_trait::async_trait;

use crate::error::Result;
use crate::ssh::target::SshTarget;

/// 执行通道上送达的单个事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// 标准输出数据块
    Stdout(Vec<u8>),
    /// 标准错误数据块（SSH extended data, type 1）
    Stderr(Vec<u8>),
    /// 远端进程退出码
    ExitStatus(u32),
    /// 远端进程被信号终止（不会再有退出码）
    ExitSignal(String),
    /// 远端拒绝了 exec 请求
    Rejected,
}

/// 单条命令的执行通道
///
/// `next_event` 返回 `Ok(None)` 表示通道已关闭、全部事件已送达。
/// 事件顺序由传输层决定，退出码可能早于最后的数据块到达。
#[async_trait]
pub trait ExecChannel: Send {
    async fn next_event(&mut self) -> Result<Option<ChannelEvent>>;

    /// 请求关闭通道；之后仍需读到 `None` 为止
    async fn close(&mut self) -> Result<()>;
}

/// 一个已认证的 SSH 会话
///
/// 方法均以 `&mut self` 调用，同一会话上的命令只能串行执行。
#[async_trait]
pub trait Session: Send {
    type Channel: ExecChannel;

    /// 打开新通道并在其上执行命令（每条命令一个通道，不复用）
    async fn open_exec(&mut self, command: &str) -> Result<Self::Channel>;

    /// 关闭会话
    async fn close(&mut self) -> Result<()>;
}

/// 会话提供者：根据连接目标建立会话
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: Session;

    async fn connect(&self, target: &SshTarget) -> Result<Self::Session>;
}
