/// Concurrent dispatch tests
///
/// Races between callers, per-VNF ordering, and rollback after failed
/// lifecycle callbacks.
/// Run with: cargo test --test concurrent_dispatch_tests

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;
use vnfmgr::{
    CallbackResult, VnfError, VnfLifecycle, VnfMgr, VnfMgrConfig, VnfOp, VnfSnapshot, VnfState,
};

/// Lifecycle that records update arguments and fails on request.
#[derive(Default)]
struct Recorder {
    updates: Mutex<Vec<String>>,
    fail_create_attr: Option<String>,
    fail_delete_args: Option<String>,
    non_admin_barrier: Option<Arc<Barrier>>,
    update_delay: Duration,
    non_admin_delay: Duration,
}

#[async_trait]
impl VnfLifecycle for Recorder {
    async fn init(&self, _vnf: &VnfSnapshot) -> CallbackResult {
        Ok(())
    }

    async fn create(&self, _vnf: &VnfSnapshot, attr: &str) -> CallbackResult {
        if self.fail_create_attr.as_deref() == Some(attr) {
            return Err("create refused".into());
        }
        Ok(())
    }

    async fn update(&self, _vnf: &VnfSnapshot, args: &str) -> CallbackResult {
        tokio::time::sleep(self.update_delay).await;
        self.updates.lock().unwrap().push(args.to_string());
        Ok(())
    }

    async fn delete(&self, _vnf: &VnfSnapshot, args: &str) -> CallbackResult {
        if self.fail_delete_args.as_deref() == Some(args) {
            return Err("delete refused".into());
        }
        Ok(())
    }

    async fn non_admin(&self, _vnf: &VnfSnapshot, _op: VnfOp, _args: &str) -> CallbackResult {
        if let Some(barrier) = &self.non_admin_barrier {
            barrier.wait().await;
        }
        tokio::time::sleep(self.non_admin_delay).await;
        Ok(())
    }
}

fn manager(recorder: Arc<Recorder>) -> VnfMgr {
    VnfMgr::with_lifecycle(VnfMgrConfig::new().inlet_capacity(64), recorder).unwrap()
}

/// One pending slot per VNF and a single inflight permit.
fn saturated_manager(recorder: Arc<Recorder>) -> VnfMgr {
    let config = VnfMgrConfig::new()
        .inlet_capacity(1)
        .max_inflight_dispatches(1);
    VnfMgr::with_lifecycle(config, recorder).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_same_name() {
    let mgr = Arc::new(VnfMgr::new().unwrap());
    let num_tasks = 8;

    let mut handles = vec![];
    for task_id in 0..num_tasks {
        let mgr = Arc::clone(&mgr);
        handles.push(tokio::spawn(async move {
            mgr.dispatch_op("vnf_0", VnfOp::Create, format!("task_{}", task_id))
                .await
        }));
    }

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => created += 1,
            Err(VnfError::AlreadyExists { name }) => {
                assert_eq!(name, "vnf_0");
                rejected += 1;
            }
            Err(err) => panic!("unexpected error: {:?}", err),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(rejected, num_tasks - 1);
    assert_eq!(mgr.len().unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_distinct_names() {
    let mgr = Arc::new(VnfMgr::new().unwrap());

    let mut handles = vec![];
    for i in 0..50 {
        let mgr = Arc::clone(&mgr);
        handles.push(tokio::spawn(async move {
            let name = format!("vnf_{}", i);
            mgr.dispatch_op(&name, VnfOp::Create, name.as_str()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(mgr.len().unwrap(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_updates_apply_in_dispatch_order() {
    let recorder = Arc::new(Recorder::default());
    let mgr = manager(recorder.clone());

    let mut futures = vec![mgr.dispatch_op("vnf_0", VnfOp::Create, "a")];
    for i in 0..20 {
        futures.push(mgr.dispatch_op("vnf_0", VnfOp::Update, format!("u{}", i)));
    }
    for future in futures {
        future.get().await.unwrap();
    }

    let expected: Vec<String> = (0..20).map(|i| format!("u{}", i)).collect();
    assert_eq!(*recorder.updates.lock().unwrap(), expected);
}

#[tokio::test]
async fn test_update_dispatched_before_create_completes() {
    let mgr = VnfMgr::new().unwrap();

    let create = mgr.dispatch_op("vnf_3", VnfOp::Create, "a");
    let update = mgr.dispatch_op("vnf_3", VnfOp::Update, "b");

    update.get().await.unwrap();
    create.get().await.unwrap();
    assert_eq!(mgr.get("vnf_3").unwrap().unwrap().state, VnfState::Update);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_saturated_inlet_keeps_dispatch_order() {
    let recorder = Arc::new(Recorder {
        update_delay: Duration::from_millis(1),
        ..Default::default()
    });
    let mgr = saturated_manager(recorder.clone());

    let mut futures = vec![mgr.dispatch_op("vnf_0", VnfOp::Create, "a")];
    for i in 0..20 {
        futures.push(mgr.dispatch_op("vnf_0", VnfOp::Update, format!("u{}", i)));
    }
    futures.push(mgr.dispatch_op("vnf_0", VnfOp::Delete, "bye"));
    for future in futures {
        future.get().await.unwrap();
    }

    let expected: Vec<String> = (0..20).map(|i| format!("u{}", i)).collect();
    assert_eq!(*recorder.updates.lock().unwrap(), expected);
    assert!(mgr.is_empty().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parked_update_not_overtaken_while_permit_busy() {
    let recorder = Arc::new(Recorder {
        update_delay: Duration::from_millis(50),
        non_admin_delay: Duration::from_millis(500),
        ..Default::default()
    });
    let mgr = saturated_manager(recorder.clone());
    mgr.dispatch_op("vnf_0", VnfOp::Create, "a").await.unwrap();

    // Holds the only inflight permit for the whole round.
    let busy = mgr.dispatch_op("vnf_0", VnfOp::NonAdmin, "busy");

    let mut futures = Vec::new();
    for i in 1..=3 {
        futures.push(mgr.dispatch_op("vnf_0", VnfOp::Update, i.to_string()));
    }
    tokio::time::sleep(Duration::from_millis(150)).await;
    futures.push(mgr.dispatch_op("vnf_0", VnfOp::Update, "4"));

    for future in futures {
        future.get().await.unwrap();
    }
    busy.get().await.unwrap();

    assert_eq!(*recorder.updates.lock().unwrap(), vec!["1", "2", "3", "4"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete_behind_full_inlet_completes() {
    let recorder = Arc::new(Recorder {
        update_delay: Duration::from_millis(200),
        ..Default::default()
    });
    let mgr = Arc::new(saturated_manager(recorder));
    mgr.dispatch_op("vnf_0", VnfOp::Create, "a").await.unwrap();

    let round = tokio::spawn({
        let mgr = Arc::clone(&mgr);
        async move {
            let first = mgr.dispatch_op("vnf_0", VnfOp::Update, "1");
            tokio::time::sleep(Duration::from_millis(20)).await;
            let second = mgr.dispatch_op("vnf_0", VnfOp::Update, "2");
            let delete = mgr.dispatch_op("vnf_0", VnfOp::Delete, "bye");
            first.get().await.and(second.get().await).and(delete.get().await)
        }
    });

    let finished = tokio::time::timeout(Duration::from_secs(3), round).await;
    assert!(finished.is_ok(), "delete stalled behind a full inlet");
    finished.unwrap().unwrap().unwrap();
    assert!(mgr.is_empty().unwrap());
}

#[tokio::test]
async fn test_operations_after_delete() {
    let mgr = VnfMgr::new().unwrap();
    mgr.dispatch_op("vnf_5", VnfOp::Create, "a").await.unwrap();

    let update = mgr.dispatch_op("vnf_5", VnfOp::Update, "b");
    let delete = mgr.dispatch_op("vnf_5", VnfOp::Delete, "c");
    let late_update = mgr.dispatch_op("vnf_5", VnfOp::Update, "d");
    let late_delete = mgr.dispatch_op("vnf_5", VnfOp::Delete, "e");

    update.get().await.unwrap();
    delete.get().await.unwrap();
    assert!(matches!(
        late_update.get().await,
        Err(VnfError::NotFound { .. })
    ));
    assert!(matches!(
        late_delete.get().await,
        Err(VnfError::NotFound { .. })
    ));
    assert!(mgr.get("vnf_5").unwrap().is_none());
}

#[tokio::test]
async fn test_failed_create_frees_the_name() {
    let recorder = Arc::new(Recorder {
        fail_create_attr: Some("bad".to_string()),
        ..Default::default()
    });
    let mgr = manager(recorder);

    let err = mgr
        .dispatch_op("vnf_0", VnfOp::Create, "bad")
        .await
        .unwrap_err();
    match err {
        VnfError::CallbackFailed { name, state, .. } => {
            assert_eq!(name, "vnf_0");
            assert_eq!(state, VnfState::Create);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(mgr.get("vnf_0").unwrap().is_none());

    mgr.dispatch_op("vnf_0", VnfOp::Create, "good").await.unwrap();
    assert_eq!(mgr.get("vnf_0").unwrap().unwrap().attr, "good");
}

#[tokio::test]
async fn test_failed_delete_restores_the_vnf() {
    let recorder = Arc::new(Recorder {
        fail_delete_args: Some("fail".to_string()),
        ..Default::default()
    });
    let mgr = manager(recorder);
    mgr.dispatch_op("vnf_0", VnfOp::Create, "a").await.unwrap();

    let err = mgr
        .dispatch_op("vnf_0", VnfOp::Delete, "fail")
        .await
        .unwrap_err();
    assert!(matches!(err, VnfError::CallbackFailed { .. }));

    let snapshot = mgr.get("vnf_0").unwrap().unwrap();
    assert_eq!(snapshot.state, VnfState::Create);

    mgr.dispatch_op("vnf_0", VnfOp::Update, "b").await.unwrap();
    mgr.dispatch_op("vnf_0", VnfOp::Delete, "ok").await.unwrap();
    assert!(mgr.is_empty().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_right_after_failed_create_keeps_name_free() {
    let recorder = Arc::new(Recorder {
        fail_create_attr: Some("bad".to_string()),
        ..Default::default()
    });
    let mgr = manager(recorder);

    let create = mgr.dispatch_op("vnf_0", VnfOp::Create, "bad");
    let delete = mgr.dispatch_op("vnf_0", VnfOp::Delete, "bye");

    assert!(matches!(
        create.get().await,
        Err(VnfError::CallbackFailed { .. })
    ));
    let err = delete.get().await.unwrap_err();
    assert!(
        matches!(
            err,
            VnfError::InvalidTransition { .. } | VnfError::NotFound { .. }
        ),
        "got {:?}",
        err
    );

    assert!(mgr.get("vnf_0").unwrap().is_none());
    mgr.dispatch_op("vnf_0", VnfOp::Create, "good").await.unwrap();
    assert_eq!(mgr.get("vnf_0").unwrap().unwrap().state, VnfState::Create);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_create_races_update_and_delete_on_fresh_name() {
    let mgr = Arc::new(VnfMgr::new().unwrap());

    for round in 0..50 {
        let name = format!("vnf_{}", round);
        let barrier = Arc::new(Barrier::new(4));

        let mut handles = vec![];
        for op in [VnfOp::Create, VnfOp::Create, VnfOp::Update, VnfOp::Delete] {
            let mgr = Arc::clone(&mgr);
            let barrier = Arc::clone(&barrier);
            let name = name.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                (op, mgr.dispatch_op(&name, op, "x").await)
            }));
        }

        let mut creates_ok = 0;
        let mut deletes_ok = 0;
        for handle in handles {
            let (op, outcome) = handle.await.unwrap();
            match (op, outcome) {
                (VnfOp::Create, Ok(())) => creates_ok += 1,
                (VnfOp::Delete, Ok(())) => deletes_ok += 1,
                (VnfOp::Update, Ok(())) => {}
                (VnfOp::Create, Err(VnfError::AlreadyExists { .. })) => {}
                (VnfOp::Delete, Err(VnfError::NotFound { .. })) => {}
                (
                    VnfOp::Update,
                    Err(
                        VnfError::NotFound { .. }
                        | VnfError::InvalidTransition { .. }
                        | VnfError::EntityClosed { .. },
                    ),
                ) => {}
                (op, outcome) => panic!("{} on {} gave {:?}", op, name, outcome),
            }
        }

        assert!(creates_ok >= 1, "no create won on {}", name);
        let live = creates_ok - deletes_ok;
        assert!(live == 0 || live == 1, "{} creates, {} deletes", creates_ok, deletes_ok);
        match mgr.get(&name).unwrap() {
            Some(snapshot) => {
                assert_eq!(live, 1);
                assert!(matches!(snapshot.state, VnfState::Create | VnfState::Update));
            }
            None => assert_eq!(live, 0),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_non_admin_runs_concurrently() {
    let recorder = Arc::new(Recorder {
        non_admin_barrier: Some(Arc::new(Barrier::new(2))),
        ..Default::default()
    });
    let mgr = manager(recorder);
    mgr.dispatch_op("vnf_0", VnfOp::Create, "a").await.unwrap();

    let first = mgr.dispatch_op("vnf_0", VnfOp::NonAdmin, "x");
    let second = mgr.dispatch_op("vnf_0", VnfOp::NonAdmin, "y");

    // Each call waits for the other, so serial execution would hang.
    let joined = tokio::time::timeout(Duration::from_secs(5), async {
        first.get().await.and(second.get().await)
    })
    .await;
    assert!(joined.is_ok(), "non-admin operations were serialized");
    joined.unwrap().unwrap();
}

#[tokio::test]
async fn test_single_inflight_permit_completes_all() {
    let mgr = VnfMgr::with_config(VnfMgrConfig::new().max_inflight_dispatches(1)).unwrap();
    mgr.dispatch_op("vnf_0", VnfOp::Create, "a").await.unwrap();

    let futures: Vec<_> = (0..25)
        .map(|i| mgr.dispatch_op("vnf_0", VnfOp::NonAdmin, format!("n{}", i)))
        .collect();
    for future in futures {
        future.get().await.unwrap();
    }
}
