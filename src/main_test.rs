use std::net::{IpAddr, Ipv4Addr};

use super::*;

fn loopback_config(port: u16) -> Config {
    Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port,
        ping_interval: None,
        ..Config::default()
    }
}

#[tokio::test]
async fn run_reports_bind_failure_when_port_is_taken() {
    let held = TcpListener::bind("127.0.0.1:0").await.expect("bind should succeed");
    let port = held.local_addr().expect("local addr").port();

    let result = tokio::time::timeout(std::time::Duration::from_secs(2), run(loopback_config(port)))
        .await
        .expect("run should fail fast instead of serving");

    match result {
        Err(ServerError::Bind { addr, .. }) => assert_eq!(addr.port(), port),
        other => panic!("expected bind error, got {other:?}"),
    }
}

#[tokio::test]
async fn bind_failure_maps_to_nonzero_exit() {
    let held = TcpListener::bind("127.0.0.1:0").await.expect("bind should succeed");
    let port = held.local_addr().expect("local addr").port();

    let result = run(loopback_config(port)).await;

    assert_eq!(exit_status(&result), 1);
}

#[test]
fn clean_run_maps_to_zero_exit() {
    assert_eq!(exit_status(&Ok(())), 0);
}

#[test]
fn config_error_maps_to_nonzero_exit() {
    let err = ConfigError::Invalid { var: "PORT", value: "nope".into() };
    assert_eq!(exit_status(&Err(err.into())), 1);
}

#[tokio::test]
async fn join_hub_surfaces_cancelled_task() {
    let task = tokio::spawn(std::future::pending::<()>());
    task.abort();

    let result = join_hub(task).await;

    assert!(matches!(result, Err(ServerError::HubTask(ref e)) if e.is_cancelled()));
    assert_eq!(exit_status(&result), 1);
}

#[tokio::test]
async fn join_hub_accepts_stopped_hub() {
    let (hub, task) = HubHandle::spawn(4);
    hub.shutdown().await;

    assert!(join_hub(task).await.is_ok());
}
