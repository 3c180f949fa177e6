//! 顺序命令执行器
//!
//! 在同一个会话上逐条执行命令：每条命令独占一个新通道，
//! 在第一条退出码不为 0（或没有退出码）的命令处停止。
//! 执行器不负责关闭会话，会话由其所有者关闭。

use std::io::Write;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::execution::{CommandResult, ResultSequence};
use crate::ssh::session::{ChannelEvent, ExecChannel, Session};

/// 实时回显输出的目标
pub trait ConsoleEcho: Send {
    fn stdout(&mut self, chunk: &[u8]) -> std::io::Result<()>;
    fn stderr(&mut self, chunk: &[u8]) -> std::io::Result<()>;
}

/// 回显到本地进程的标准输出/标准错误
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

impl ConsoleEcho for Console {
    fn stdout(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(chunk)?;
        out.flush()
    }

    fn stderr(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        let mut err = std::io::stderr().lock();
        err.write_all(chunk)?;
        err.flush()
    }
}

/// 不回显
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ConsoleEcho for Silent {
    fn stdout(&mut self, _chunk: &[u8]) -> std::io::Result<()> {
        Ok(())
    }

    fn stderr(&mut self, _chunk: &[u8]) -> std::io::Result<()> {
        Ok(())
    }
}

/// 顺序执行命令列表
///
/// `verbose` 为 true 时，输出在到达时即回显到本地控制台。
pub async fn run<S, C>(session: &mut S, commands: &[C], verbose: bool) -> Result<ResultSequence>
where
    S: Session + ?Sized,
    C: AsRef<str> + Sync,
{
    if verbose {
        run_with_echo(session, commands, &mut Console).await
    } else {
        run_with_echo(session, commands, &mut Silent).await
    }
}

/// 顺序执行命令列表，输出回显到指定目标
pub async fn run_with_echo<S, C>(
    session: &mut S,
    commands: &[C],
    echo: &mut dyn ConsoleEcho,
) -> Result<ResultSequence>
where
    S: Session + ?Sized,
    C: AsRef<str> + Sync,
{
    let mut results = ResultSequence::new();

    for command in commands {
        let command = command.as_ref();
        let result = execute_one(session, command, echo).await?;
        let succeeded = result.is_success();
        results.push(result);

        if !succeeded {
            warn!(
                command = %command,
                executed = results.len(),
                skipped = commands.len() - results.len(),
                "Command failed, stopping sequence"
            );
            return Ok(results);
        }
    }

    Ok(results)
}

/// 执行单条命令，返回合并后的原始输出（stdout 与 stderr 按到达顺序交织）
///
/// 不区分输出流，也不报告退出码。
pub async fn exec<S>(session: &mut S, command: &str) -> Result<String>
where
    S: Session + ?Sized,
{
    let mut channel = session.open_exec(command).await?;
    let mut merged = Vec::new();

    while let Some(event) = channel.next_event().await? {
        match event {
            ChannelEvent::Stdout(data) | ChannelEvent::Stderr(data) => {
                merged.extend_from_slice(&data)
            }
            ChannelEvent::Rejected => channel.close().await?,
            ChannelEvent::ExitStatus(_) | ChannelEvent::ExitSignal(_) => {}
        }
    }

    Ok(String::from_utf8_lossy(&merged).into_owned())
}

/// 执行单条命令，返回 (退出码, 标准输出, 标准错误)
pub async fn exec_status<S>(
    session: &mut S,
    command: &str,
    verbose: bool,
) -> Result<(Option<u32>, String, String)>
where
    S: Session + ?Sized,
{
    let results = run(session, &[command], verbose).await?;
    match results.into_inner().pop() {
        Some(result) => Ok((result.exit_code, result.stdout, result.stderr)),
        None => Ok((None, String::new(), String::new())),
    }
}

/// 在新通道上执行一条命令并收集其全部事件
async fn execute_one<S>(
    session: &mut S,
    command: &str,
    echo: &mut dyn ConsoleEcho,
) -> Result<CommandResult>
where
    S: Session + ?Sized,
{
    let start_time = Instant::now();
    debug!(command = %command, "Executing command");

    let mut channel = session.open_exec(command).await?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut exit_code = None;
    let mut exit_signal = None;

    // 读到通道关闭为止：退出码之后仍可能有数据到达
    while let Some(event) = channel.next_event().await? {
        match event {
            ChannelEvent::Stdout(data) => {
                echo.stdout(&data)?;
                stdout.extend_from_slice(&data);
            }
            ChannelEvent::Stderr(data) => {
                echo.stderr(&data)?;
                stderr.extend_from_slice(&data);
            }
            ChannelEvent::ExitStatus(code) => exit_code = Some(code),
            ChannelEvent::ExitSignal(signal) => exit_signal = Some(signal),
            ChannelEvent::Rejected => {
                warn!(command = %command, "Exec request rejected by remote host");
                channel.close().await?;
            }
        }
    }

    let duration_secs = start_time.elapsed().as_secs_f64();

    info!(
        command = %command,
        exit_code = ?exit_code,
        exit_signal = ?exit_signal,
        duration_secs = duration_secs,
        stdout_len = stdout.len(),
        stderr_len = stderr.len(),
        "Command executed"
    );

    Ok(CommandResult {
        command: command.to_string(),
        exit_code,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_signal,
        duration_secs,
    })
}
