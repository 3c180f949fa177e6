//! ops-exec 命令行入口
//! 在远程主机上顺序执行命令，退出码与第一条失败命令一致

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ops_exec::{
    config::AppConfig,
    exec_single, exec_single_status, run_sequence,
    ssh::{RusshProvider, SshTarget},
    telemetry, AppError,
};
use secrecy::Secret;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// 顺序执行全部命令，遇到第一条失败即停止
    Sequence,
    /// 执行一条命令，输出合并的控制台内容
    Capture,
    /// 执行一条命令，分别输出 stdout/stderr 并返回其退出码
    Status,
}

#[derive(Debug, Parser)]
#[command(name = "ops-exec", version, about = "Run shell commands on a remote host over SSH")]
struct Cli {
    /// 远程主机（覆盖 OPS_EXEC_SSH__HOST）
    #[arg(long)]
    host: Option<String>,

    /// 端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 用户名
    #[arg(short, long)]
    user: Option<String>,

    /// 密码
    #[arg(long, conflicts_with = "key")]
    password: Option<String>,

    /// 私钥文件
    #[arg(short = 'i', long)]
    key: Option<PathBuf>,

    /// 私钥密码
    #[arg(long, requires = "key")]
    passphrase: Option<String>,

    /// 连接超时（秒）
    #[arg(long)]
    connect_timeout: Option<u64>,

    /// 实时回显远端输出
    #[arg(short, long)]
    verbose: bool,

    /// 以 JSON 输出结果列表（仅 sequence 模式）
    #[arg(long)]
    json: bool,

    #[arg(long, value_enum, default_value_t = Mode::Sequence)]
    mode: Mode,

    /// 要执行的命令
    #[arg(required = true)]
    commands: Vec<String>,
}

impl Cli {
    /// 命令行参数覆盖环境配置
    fn target(&self, config: &AppConfig) -> anyhow::Result<SshTarget> {
        let mut ssh = config.ssh.clone();

        if let Some(host) = &self.host {
            ssh.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            ssh.port = port;
        }
        if let Some(user) = &self.user {
            ssh.username = Some(user.clone());
        }
        if let Some(password) = &self.password {
            ssh.password = Some(Secret::new(password.clone()));
            ssh.key_file = None;
        }
        if let Some(key) = &self.key {
            ssh.key_file = Some(key.clone());
        }
        if let Some(passphrase) = &self.passphrase {
            ssh.key_passphrase = Some(Secret::new(passphrase.clone()));
        }
        if let Some(timeout) = self.connect_timeout {
            ssh.connect_timeout_secs = timeout;
        }

        Ok(ssh.to_target()?)
    }
}

/// 进程退出码只保留低 8 位，超出范围的远端退出码一律映射为 255
fn exit_code_of(code: Option<u32>) -> i32 {
    match code {
        Some(0) => 0,
        Some(code) => code.min(255) as i32,
        None => 1,
    }
}

/// 运行失败时输出不含敏感信息的提示，详细原因写入日志
fn report_failure(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<AppError>() {
        Some(app_error) => {
            tracing::error!(error = %app_error, "ops-exec failed");
            eprintln!("error: {}", app_error.user_message());
        }
        None => eprintln!("error: {:#}", error),
    }
    1
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载 .env 文件（开发环境）
    if let Ok(path) = std::env::var("OPS_EXEC_ENV") {
        dotenv::from_filename(format!(".env.{}", path)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    telemetry::init_telemetry(&config.logging);

    let code = match execute(&cli, &config).await {
        Ok(code) => code,
        Err(e) => report_failure(&e),
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}

/// 按所选模式执行，返回进程退出码
async fn execute(cli: &Cli, config: &AppConfig) -> anyhow::Result<i32> {
    let target = cli.target(config)?;
    let provider = RusshProvider::new();

    let code = match cli.mode {
        Mode::Sequence => {
            let results = run_sequence(&provider, &target, &cli.commands, cli.verbose).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if !cli.verbose {
                print!("{}", results.collect_console());
            }

            match results.first_failure() {
                Some(failed) => {
                    tracing::error!(
                        command = %failed.command,
                        exit_code = ?failed.exit_code,
                        "Sequence stopped at failing command"
                    );
                    exit_code_of(failed.exit_code)
                }
                None => 0,
            }
        }
        Mode::Capture => {
            let command = cli.commands.join(" ");
            let output = exec_single(&provider, &target, &command).await?;
            print!("{}", output);
            0
        }
        Mode::Status => {
            let command = cli.commands.join(" ");
            let (exit_code, stdout, stderr) =
                exec_single_status(&provider, &target, &command, cli.verbose).await?;
            if !cli.verbose {
                print!("{}", stdout);
                eprint!("{}", stderr);
            }
            exit_code_of(exit_code)
        }
    };

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code_of(Some(0)), 0);
        assert_eq!(exit_code_of(Some(127)), 127);
        assert_eq!(exit_code_of(None), 1);
    }

    #[test]
    fn test_exit_code_never_wraps_to_success() {
        assert_eq!(exit_code_of(Some(255)), 255);
        assert_eq!(exit_code_of(Some(256)), 255);
        assert_eq!(exit_code_of(Some(u32::MAX)), 255);
    }

    #[test]
    fn test_report_failure_hides_error_details() {
        let error = anyhow::Error::new(AppError::SshAuthenticationError(
            "nane@localhost:2222 rejected".to_string(),
        ));
        assert_eq!(report_failure(&error), 1);

        let error = anyhow::anyhow!("Configuration error: ssh.host is not set");
        assert_eq!(report_failure(&error), 1);
    }

    #[test]
    fn test_cli_parses_command_list() {
        let cli = Cli::parse_from([
            "ops-exec",
            "--host",
            "localhost",
            "-p",
            "2222",
            "-u",
            "nane",
            "--password",
            "secret",
            "echo 'hello world'",
            "this shall fail",
        ]);

        assert_eq!(cli.mode, Mode::Sequence);
        assert_eq!(cli.commands, vec!["echo 'hello world'", "this shall fail"]);
        assert_eq!(cli.port, Some(2222));
    }

    #[test]
    fn test_cli_rejects_password_with_key() {
        let result = Cli::try_parse_from([
            "ops-exec",
            "--password",
            "secret",
            "-i",
            "/tmp/id_rsa",
            "true",
        ]);
        assert!(result.is_err());
    }
}
