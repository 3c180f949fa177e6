//! 执行结果模型与汇总
//!
//! `CommandResult` 记录单条命令的退出码、标准输出和标准错误；
//! `ResultSequence` 是一次执行按提交顺序得到的结果列表。
//! 汇总函数均为纯函数，不修改输入。

use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// 单条命令的执行结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// 提交的原始命令字符串
    pub command: String,

    /// 退出码；远端从未上报退出状态时为 None（视为失败）
    pub exit_code: Option<u32>,

    /// 标准输出（按到达顺序）
    pub stdout: String,

    /// 标准错误（按到达顺序）
    pub stderr: String,

    /// 终止进程的信号名称（如果有）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_signal: Option<String>,

    /// 执行时长（秒）
    #[serde(default)]
    pub duration_secs: f64,
}

impl CommandResult {
    /// 创建结果（时长为 0，无信号）
    pub fn new(
        command: impl Into<String>,
        exit_code: Option<u32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_signal: None,
            duration_secs: 0.0,
        }
    }

    /// 退出码严格等于 0
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// 标准输出紧接标准错误
    pub fn console(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// 一次执行的有序结果列表
///
/// 要么包含全部命令的结果，要么在第一条失败命令处截止（包含该条）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSequence(Vec<CommandResult>);

impl ResultSequence {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn push(&mut self, result: CommandResult) {
        self.0.push(result);
    }

    /// 第一条失败的结果（截止时即为最后一条）
    pub fn first_failure(&self) -> Option<&CommandResult> {
        self.0.iter().find(|r| r.is_failure())
    }

    pub fn all_succeeded(&self) -> bool {
        all_succeeded(&self.0)
    }

    pub fn collect_stdout(&self) -> String {
        collect_stdout(&self.0)
    }

    pub fn collect_stderr(&self) -> String {
        collect_stderr(&self.0)
    }

    pub fn collect_console(&self) -> String {
        collect_console(&self.0)
    }

    pub fn into_inner(self) -> Vec<CommandResult> {
        self.0
    }
}

impl Deref for ResultSequence {
    type Target = [CommandResult];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<CommandResult>> for ResultSequence {
    fn from(results: Vec<CommandResult>) -> Self {
        Self(results)
    }
}

impl IntoIterator for ResultSequence {
    type Item = CommandResult;
    type IntoIter = std::vec::IntoIter<CommandResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSequence {
    type Item = &'a CommandResult;
    type IntoIter = std::slice::Iter<'a, CommandResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// 所有退出码都为 0；空列表返回 true
pub fn all_succeeded(results: &[CommandResult]) -> bool {
    results.iter().all(CommandResult::is_success)
}

/// 拼接所有标准输出，跳过空白片段，不插入分隔符
pub fn collect_stdout(results: &[CommandResult]) -> String {
    concat_meaningful(results.iter().map(|r| r.stdout.as_str()))
}

/// 拼接所有标准错误，规则同 [`collect_stdout`]
pub fn collect_stderr(results: &[CommandResult]) -> String {
    concat_meaningful(results.iter().map(|r| r.stderr.as_str()))
}

/// 逐条拼接 stdout + stderr，跳过两者合并后仍为空白的条目
pub fn collect_console(results: &[CommandResult]) -> String {
    concat_meaningful(results.iter().map(CommandResult::console))
}

fn concat_meaningful<S: AsRef<str>>(fragments: impl Iterator<Item = S>) -> String {
    fragments
        .filter(|f| !f.as_ref().trim().is_empty())
        .fold(String::new(), |mut joined, f| {
            joined.push_str(f.as_ref());
            joined
        })
}
