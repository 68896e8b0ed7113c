//! Command output and request failures must reach the log.
#![cfg(unix)]

use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use gitlab_webhook::handlers::app;
use gitlab_webhook::runner::ProcessRunner;
use gitlab_webhook::{AppState, load_config};
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

/// Collects everything the fmt layer writes.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn write_script(path: &Path, body: &str) {
    std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn command_output_and_parse_failures_are_logged() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _default = tracing::subscriber::set_default(subscriber);

    let dir = tempfile::tempdir().unwrap();
    let echo_hi = dir.path().join("echo-hi.sh");
    write_script(&echo_hi, "echo hi");
    let fail = dir.path().join("fail.sh");
    write_script(&fail, "echo broken\nexit 1");
    let succeed = dir.path().join("succeed.sh");
    write_script(&succeed, "echo deployed");

    let config_path = dir.path().join("config.json");
    std::fs::write(
        &config_path,
        format!(
            r#"{{"Address":"127.0.0.1","Port":9000,"Repositories":[{{"Name":"demo","Commands":["{}"]}},{{"Name":"pipeline","Commands":["{}","{}"]}}]}}"#,
            echo_hi.display(),
            fail.display(),
            succeed.display()
        ),
    )
    .unwrap();
    let config = load_config(&config_path).await.unwrap();
    let router = app(Arc::new(AppState::new(
        config,
        config_path,
        Arc::new(ProcessRunner),
    )));

    let response = router
        .clone()
        .oneshot(post(r#"{"repository":{"name":"demo"}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let logged = logs.contents();
    assert!(logged.contains(&format!("Executed: {}", echo_hi.display())), "{logged}");
    assert!(logged.contains("Output: hi"), "{logged}");

    let response = router
        .clone()
        .oneshot(post(r#"{"repository":{"name":"pipeline"}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let logged = logs.contents();
    assert!(logged.contains("exited unsuccessfully (exit code 1)"), "{logged}");
    assert!(logged.contains("Output: broken"), "{logged}");
    assert!(logged.contains("Output: deployed"), "{logged}");
    assert!(logged.contains("2 command(s) for repository 'pipeline', 1 failed"), "{logged}");

    let response = router.clone().oneshot(post("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(logs.contents().contains("Failed to parse request"));
}
