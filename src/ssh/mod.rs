//! SSH执行模块
//! 会话抽象、russh 实现与顺序命令执行器

pub mod client;
pub mod runner;
pub mod session;
pub mod target;

pub use client::RusshProvider;
pub use runner::{Console, ConsoleEcho, Silent};
pub use session::{ChannelEvent, ExecChannel, Session, SessionProvider};
pub use target::{Credential, SshTarget};
