//! 远程命令执行库
//! 通过一个 SSH 会话顺序执行一组 shell 命令，并汇总退出码、标准输出与标准错误

pub mod capture;
pub mod config;
pub mod error;
pub mod execution;
pub mod ssh;
pub mod telemetry;

pub use capture::{exec_single, exec_single_status, run_sequence, RemoteExec};
pub use error::{AppError, Result};
pub use execution::{
    all_succeeded, collect_console, collect_stderr, collect_stdout, CommandResult, ResultSequence,
};
