//! 真实 SSH 服务器测试
//!
//! 需要一个可访问的 SSH 服务器，例如：
//! `docker run -d -p 2222:22 -e SSH_USERNAME=nane -e SSH_PASSWORD=secret --name ssh keto/ssh`
//! 连接参数通过环境变量 OPS_EXEC_TEST_HOST / _PORT / _USER / _PASSWORD 传入。
//! 运行：`cargo test --test live_ssh_tests -- --ignored`

use ops_exec::ssh::{RusshProvider, SshTarget};
use ops_exec::{exec_single, exec_single_status, run_sequence, AppError};

fn live_target() -> SshTarget {
    let var = |name: &str, default: &str| {
        std::env::var(format!("OPS_EXEC_TEST_{}", name)).unwrap_or_else(|_| default.to_string())
    };

    SshTarget::with_password(var("HOST", "localhost"), var("USER", "nane"), var("PASSWORD", "secret"))
        .with_port(var("PORT", "2222").parse().expect("OPS_EXEC_TEST_PORT must be a port number"))
}

#[tokio::test]
#[ignore = "requires a running SSH server"]
async fn test_live_capture() {
    let out = exec_single(&RusshProvider::new(), &live_target(), "echo 'hello world'")
        .await
        .unwrap();
    assert_eq!(out, "hello world\n");
}

#[tokio::test]
#[ignore = "requires a running SSH server"]
async fn test_live_capture_status_fail() {
    let (code, stdout, stderr) =
        exec_single_status(&RusshProvider::new(), &live_target(), "this shall fail", false)
            .await
            .unwrap();

    assert_eq!(code, Some(127));
    assert!(stdout.is_empty());
    assert!(!stderr.is_empty());
}

#[tokio::test]
#[ignore = "requires a running SSH server"]
async fn test_live_sequence_stops_at_failure() {
    let results = run_sequence(
        &RusshProvider::new(),
        &live_target(),
        &["echo 'hello world'", "this shall fail", "echo 'super test'"],
        false,
    )
    .await
    .unwrap();

    assert_eq!(results.len(), 2);
    assert!(!results.all_succeeded());
    assert_eq!(results[0].stdout, "hello world\n");
    assert!(results[1].exit_code.is_some_and(|code| code != 0));
}

#[tokio::test]
#[ignore = "requires a running SSH server"]
async fn test_live_wrong_password() {
    let target = SshTarget {
        credential: ops_exec::ssh::Credential::Password(secrecy::Secret::new(
            "definitely-wrong".to_string(),
        )),
        ..live_target()
    };

    let err = run_sequence(&RusshProvider::new(), &target, &["true"], false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SshAuthenticationError(_)));
}
