//! Operation dispatch, exclusivity and lifecycle tests

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use terrace_backend::{
    Backend, BackendError, CancelSource, CancelToken, ConfigError, Enhanced, ErrorKind, InMemoryBackend, Local,
    LocalConfig, Operation, OperationType, ResourceConfig, BACKUP_DISABLED,
};
use terrace_state::{SharedStateHandle, StateError};
use terrace_test_utils::{
    create_mixed_diff, create_refreshed_state, create_test_state, write_state_file, Call, MockEngineFactory,
    ProbeState,
};

/// Delegate whose state handle records when it is being read
#[derive(Debug)]
struct ProbeBackend {
    probe: Arc<ProbeState>,
}

#[async_trait]
impl Backend for ProbeBackend {
    fn validate(&self, _config: &ResourceConfig) -> (Vec<String>, Vec<ConfigError>) {
        (Vec::new(), Vec::new())
    }

    fn configure(&self, _config: &ResourceConfig) -> Result<(), ConfigError> {
        Ok(())
    }

    async fn state(&self) -> Result<SharedStateHandle, StateError> {
        let handle: SharedStateHandle = self.probe.clone();
        Ok(handle)
    }
}

fn block(value: serde_json::Value) -> ResourceConfig {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_unsupported_type_rejected_before_starting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terrace.tfstate");
    let engine = Arc::new(MockEngineFactory::new());
    let backend = Local::builder(engine.clone())
        .config(LocalConfig::new().with_state_path(&path))
        .build();

    let err = backend
        .operation(CancelToken::none(), Operation::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::UnsupportedOperation(OperationType::Invalid)));
    assert_eq!(err.to_string(), "unsupported operation type: invalid");

    let op = Operation::sequence([OperationType::Refresh, OperationType::Invalid]);
    let err = backend.operation(CancelToken::none(), op).await.unwrap_err();
    assert!(matches!(err, BackendError::UnsupportedOperation(OperationType::Invalid)));
    assert!(engine.calls().is_empty());

    // The rejection left nothing held
    let running = tokio::time::timeout(
        Duration::from_secs(5),
        backend.operation(CancelToken::none(), Operation::new(OperationType::Plan)),
    )
    .await
    .unwrap()
    .unwrap();
    running.finish().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_operations_never_interleave() {
    let probe = Arc::new(ProbeState::new(create_test_state(), Duration::from_millis(50)));
    let engine = Arc::new(MockEngineFactory::new().plan_diff(create_mixed_diff()));
    let backend = Local::builder(engine.clone())
        .delegate(Arc::new(ProbeBackend { probe: probe.clone() }))
        .build();

    let mut tasks = Vec::new();
    for _ in 0..3 {
        let backend = backend.clone();
        tasks.push(tokio::spawn(async move {
            let running = backend
                .operation(CancelToken::none(), Operation::new(OperationType::Plan))
                .await
                .unwrap();
            running.finish().await.map(|_| ())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(probe.spans().len(), 3);
    assert!(!probe.overlapping(), "state loads overlapped: {:?}", probe.spans());
    assert_eq!(engine.count(&Call::Plan), 3);
}

#[tokio::test]
async fn test_cancel_stops_between_steps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terrace.tfstate");
    write_state_file(&path, &create_test_state()).await;
    let before = tokio::fs::read(&path).await.unwrap();

    let engine = Arc::new(
        MockEngineFactory::new()
            .refresh_to(create_refreshed_state())
            .delay(Duration::from_millis(100)),
    );
    let backend = Local::builder(engine.clone())
        .config(LocalConfig::new().with_state_path(&path))
        .build();

    let source = CancelSource::new();
    let mut op = Operation::new(OperationType::Plan);
    op.plan_refresh = true;
    let running = backend.operation(source.token(), op).await.unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    source.cancel();
    // Cancelling does not end the operation by itself
    assert!(!running.is_done());

    let err = running.finish().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(engine.count(&Call::Refresh), 1);
    assert_eq!(engine.count(&Call::Plan), 0);
    assert!(running.plan_id().is_none());
    assert_eq!(tokio::fs::read(&path).await.unwrap(), before);

    // The slot is free again
    engine.script(|s| s.delay = None);
    let next = backend
        .operation(CancelToken::none(), Operation::new(OperationType::Plan))
        .await
        .unwrap();
    next.finish().await.unwrap();
}

#[tokio::test]
async fn test_panic_is_reported_and_slot_released() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terrace.tfstate");
    let engine = Arc::new(MockEngineFactory::new());
    engine.script(|s| s.panic_on_plan = true);
    let backend = Local::builder(engine.clone())
        .config(LocalConfig::new().with_state_path(&path))
        .build();

    let running = backend
        .operation(CancelToken::none(), Operation::new(OperationType::Plan))
        .await
        .unwrap();
    let err = running.finish().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Panicked);
    assert!(err.to_string().contains("mock engine plan panic"));
    assert!(backend.context_opts().hooks.is_empty());

    engine.script(|s| s.panic_on_plan = false);
    let next = backend
        .operation(CancelToken::none(), Operation::new(OperationType::Plan))
        .await
        .unwrap();
    next.finish().await.unwrap();
    assert!(next.plan_id().is_some());
}

#[tokio::test]
async fn test_sequence_runs_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terrace.tfstate");
    write_state_file(&path, &create_test_state()).await;

    let engine = Arc::new(MockEngineFactory::new().refresh_to(create_refreshed_state()));
    let backend = Local::builder(engine.clone())
        .config(LocalConfig::new().with_state_path(&path))
        .build();

    let op = Operation::sequence([OperationType::Refresh, OperationType::Plan]);
    let running = backend.operation(CancelToken::none(), op).await.unwrap();
    running.finish().await.unwrap();

    assert_eq!(
        engine.calls(),
        vec![
            Call::NewContext,
            Call::Validate,
            Call::Refresh,
            Call::NewContext,
            Call::Validate,
            Call::Plan,
        ]
    );
    // The plan step loaded what the refresh step persisted
    let contexts = engine.contexts();
    assert_eq!(contexts[1].state.as_ref().unwrap().resources["test_instance.foo"].id(), "yes");
    assert!(running.plan_id().is_some());
}

#[test]
fn test_local_schema_validation() {
    let backend = Local::builder(Arc::new(MockEngineFactory::new())).build();

    let (warnings, errors) = backend.validate(&block(json!({ "path": 3, "colour": "blue" })));
    assert!(warnings.is_empty());
    assert_eq!(errors.len(), 2);
    assert!(errors.contains(&ConfigError::UnknownKey("colour".into())));
    assert!(errors.contains(&ConfigError::WrongType {
        key: "path".into(),
        expected: "string",
    }));

    backend
        .configure(&block(json!({ "path": "custom.tfstate", "backup_path": "-" })))
        .unwrap();
    let paths = backend.config().paths();
    assert_eq!(paths.state, std::path::PathBuf::from("custom.tfstate"));
    assert!(paths.backup.is_none());
}

#[test]
fn test_delegated_schema_validation() {
    let backend = Local::builder(Arc::new(MockEngineFactory::new()))
        .delegate(Arc::new(InMemoryBackend::new()))
        .build();

    let (_, errors) = backend.validate(&block(json!({ "path": "terrace.tfstate" })));
    assert_eq!(errors, vec![ConfigError::UnknownKey("path".into())]);
    assert!(backend.configure(&block(json!({ "path": "x" }))).is_err());
    // Local settings were not touched
    assert_eq!(backend.config(), LocalConfig::default());
}

#[tokio::test]
async fn test_state_handle_honours_backup_setting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terrace.tfstate");
    let engine = Arc::new(MockEngineFactory::new());

    let with_backup = Local::builder(engine.clone())
        .config(LocalConfig::new().with_state_path(&path))
        .build();
    let handle = with_backup.state().await.unwrap();
    assert!(format!("{handle:?}").starts_with("BackupState"));

    let without_backup = Local::builder(engine)
        .config(LocalConfig::new().with_state_path(&path).with_backup_path(BACKUP_DISABLED))
        .build();
    let handle = without_backup.state().await.unwrap();
    assert!(format!("{handle:?}").starts_with("LocalState"));
    assert!(handle.read().is_none());
}
