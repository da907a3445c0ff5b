//! Unit tests for server launch preflight and exit code handling.

#![allow(clippy::expect_used)]

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use berth_cli::application::services::launch_service::{self, LaunchOptions, SIGNALLED_EXIT_CODE};
use berth_cli::domain::{EntryStyle, LaunchError, RuntimeConfig, RuntimeOverrides};

use crate::mocks::{FixedProbe, RecordingRunner, SilentReporter, err_output, ok_output};

fn config(pairs: &[(&str, &str)]) -> RuntimeConfig {
    let env = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()));
    RuntimeConfig::resolve(env, &RuntimeOverrides::default()).expect("config")
}

#[tokio::test]
async fn unresolvable_app_fails_before_spawn() {
    let runner = RecordingRunner::with(
        err_output(b"Traceback...\ncannot import module yield_agent.server: No module named 'yield_agent'\n"),
        ExitStatus::from_raw(0),
    );
    let cfg = config(&[("APP_SOURCE_ROOT", "/srv/src")]);

    let err = launch_service::launch(
        &runner,
        &FixedProbe(true),
        &SilentReporter,
        &cfg,
        &LaunchOptions::default(),
    )
    .await
    .expect_err("resolution failed");

    match err.downcast_ref::<LaunchError>() {
        Some(LaunchError::AppResolution { app, detail }) => {
            assert_eq!(app, "yield_agent.server:app");
            assert!(detail.starts_with("cannot import module"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let calls = runner.calls();
    assert_eq!(calls.len(), 1, "server must not be spawned");
    assert_eq!(calls[0].args[0], "-c");
    assert_eq!(
        calls[0].env,
        vec![("PYTHONPATH".to_string(), "/srv/src".to_string())]
    );
}

#[tokio::test]
async fn occupied_port_fails_before_spawn() {
    let runner = RecordingRunner::succeeding();
    let cfg = config(&[("PORT", "9100")]);

    let err = launch_service::launch(
        &runner,
        &FixedProbe(false),
        &SilentReporter,
        &cfg,
        &LaunchOptions::default(),
    )
    .await
    .expect_err("port taken");

    assert!(matches!(
        err.downcast_ref::<LaunchError>(),
        Some(LaunchError::PortInUse { port: 9100, .. })
    ));
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn server_exit_code_is_propagated() {
    let runner = RecordingRunner::with(ok_output(b""), ExitStatus::from_raw(3 << 8));
    let cfg = config(&[("PORT", "9200"), ("PYTHONPATH", "/opt/lib")]);

    let code = launch_service::launch(
        &runner,
        &FixedProbe(true),
        &SilentReporter,
        &cfg,
        &LaunchOptions::default(),
    )
    .await
    .expect("launched");
    assert_eq!(code, 3);

    let calls = runner.calls();
    let server = calls.last().expect("server call");
    assert_eq!(server.program, "python");
    assert_eq!(
        server.args,
        [
            "-m",
            "uvicorn",
            "yield_agent.server:app",
            "--host",
            "0.0.0.0",
            "--port",
            "9200"
        ]
    );
    assert_eq!(
        server.env,
        vec![("PYTHONPATH".to_string(), "/app/src:/opt/lib".to_string())]
    );
}

#[tokio::test]
async fn signalled_server_maps_to_failure() {
    // Raw status 9: terminated by SIGKILL, no exit code.
    let runner = RecordingRunner::with(ok_output(b""), ExitStatus::from_raw(9));
    let code = launch_service::launch(
        &runner,
        &FixedProbe(true),
        &SilentReporter,
        &config(&[]),
        &LaunchOptions::default(),
    )
    .await
    .expect("launched");
    assert_eq!(code, SIGNALLED_EXIT_CODE);
}

#[tokio::test]
async fn skipping_preflight_spawns_binary_directly() {
    let runner = RecordingRunner::succeeding();
    let options = LaunchOptions {
        style: EntryStyle::Binary,
        preflight: false,
        ..LaunchOptions::default()
    };

    let code = launch_service::launch(
        &runner,
        &FixedProbe(false),
        &SilentReporter,
        &config(&[]),
        &options,
    )
    .await
    .expect("launched");
    assert_eq!(code, 0);

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "uvicorn");
}
