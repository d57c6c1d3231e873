//! Integration tests for the generation queue's scheduling guarantees.
//!
//! This test validates:
//! 1. Submissions are idempotent per target
//! 2. Jobs complete strictly in acceptance order, one at a time
//! 3. Category aborts only touch their own category
//! 4. Rejected payloads never reach the network
//! 5. Progress counters track every accepted job
//! 6. Failures are reported and never stall the queue

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sdf_generation_queue::core::{
    BoneInfluence, BoneRef, CancelHandle, GenerationQueue, InMemoryEventSink, JobCategory,
    JobError, JobState, LicenseGate, MeshGeometry, MeshResult, MeshTarget, PayloadLimits,
    PollStatus, ProgressReporter, ProgressSnapshot, QueueEventKind, RequestPolicy,
    SkinnedGeometry, SkinnedResult, SkinnedTarget, TargetId, ValidationError,
};
use sdf_generation_queue::infra::{MockNetworkClient, RecordingSink, StaticLicenseGate};
use serde_json::json;

const URL: &str = "http://localhost:8080/compute";

struct Harness {
    queue: GenerationQueue<MockNetworkClient, StaticLicenseGate>,
    client: MockNetworkClient,
    meshes: RecordingSink<MeshResult>,
    skinned: RecordingSink<SkinnedResult>,
    events: InMemoryEventSink,
}

fn harness() -> Harness {
    harness_with(PayloadLimits::default(), RequestPolicy::default())
}

fn harness_with(limits: PayloadLimits, policy: RequestPolicy) -> Harness {
    let client = MockNetworkClient::default();
    let meshes = RecordingSink::default();
    let skinned = RecordingSink::default();
    let events = InMemoryEventSink::new(256);
    let queue = GenerationQueue::new(
        client.clone(),
        StaticLicenseGate::available(URL),
        meshes.clone(),
        skinned.clone(),
    )
    .with_limits(limits)
    .with_policy(policy)
    .with_events(events.clone());
    Harness {
        queue,
        client,
        meshes,
        skinned,
        events,
    }
}

fn geometry(triangles: usize) -> MeshGeometry {
    MeshGeometry::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        [0, 1, 2].repeat(triangles),
    )
}

fn mesh_target(triangles: usize) -> MeshTarget {
    MeshTarget::new(TargetId::new(), geometry(triangles))
}

fn skinned_target(bones: usize) -> SkinnedTarget {
    SkinnedTarget::new(
        TargetId::new(),
        SkinnedGeometry {
            mesh: geometry(1),
            influences: vec![
                BoneInfluence::single(0),
                BoneInfluence::new([0, 1, 0, 0], [0.5, 0.5, 0.0, 0.0]),
                BoneInfluence::single(0),
            ],
            bones: (0..bones).map(|i| BoneRef::new(i, format!("bone{i}"))).collect(),
        },
    )
}

fn response(entries: &[(&str, &str)]) -> PollStatus {
    let meshes: Vec<_> = entries
        .iter()
        .map(|(embeds, grid)| json!({ "embeds": embeds, "sd_grid": grid }))
        .collect();
    PollStatus::Done(serde_json::to_vec(&json!({ "meshes_data": meshes })).unwrap())
}

fn success() -> PollStatus {
    response(&[("ZW1iZWRz", "Z3JpZA==")])
}

fn in_flight(h: &Harness) -> usize {
    h.queue
        .pending_targets()
        .into_iter()
        .filter(|id| h.queue.job_state(*id).is_some_and(JobState::is_in_flight))
        .count()
}

#[test]
fn test_enqueue_is_idempotent() {
    let mut h = harness();
    let target = mesh_target(4);
    h.queue.enqueue(&target).unwrap();
    h.queue.enqueue(&target).unwrap();

    assert_eq!(h.queue.len(), 1);
    assert!(h.queue.contains(target.id));
    assert_eq!(h.client.submission_count(), 1);
    assert_eq!(h.queue.progress(JobCategory::Mesh).remaining, 1);
}

#[test]
fn test_fifo_order_and_single_flight() {
    let mut h = harness();
    let targets = [mesh_target(2), mesh_target(3), mesh_target(4)];
    for target in &targets {
        h.queue.enqueue(target).unwrap();
        assert!(in_flight(&h) <= 1);
    }
    assert_eq!(h.client.submission_count(), 1);

    for expected in &targets {
        assert_eq!(h.queue.running(), Some((expected.id, JobCategory::Mesh)));
        assert!(h.queue.tick().is_none());
        assert_eq!(in_flight(&h), 1);

        h.client.respond_last(success());
        let outcome = h.queue.tick().unwrap();
        assert_eq!(outcome.target, expected.id);
        assert_eq!(outcome.state, JobState::Completed);
        assert!(in_flight(&h) <= 1);
    }

    let order: Vec<_> = targets.iter().map(|t| t.id).collect();
    assert_eq!(h.meshes.targets(), order);
    assert_eq!(h.client.submission_count(), 3);
    assert!(!h.queue.is_active());
}

#[test]
fn test_abort_category_keeps_other_categories() {
    let mut h = harness();
    let (mesh1, skin1, mesh2) = (mesh_target(2), skinned_target(2), mesh_target(2));
    h.queue.enqueue(&mesh1).unwrap();
    h.queue.enqueue(&skin1).unwrap();
    h.queue.enqueue(&mesh2).unwrap();

    assert_eq!(h.queue.abort_category(JobCategory::Mesh), 2);

    assert_eq!(h.queue.pending_targets(), vec![skin1.id]);
    assert_eq!(h.queue.running(), Some((skin1.id, JobCategory::Skinned)));
    assert_eq!(h.queue.progress(JobCategory::Mesh).remaining, 0);
    assert_eq!(h.queue.progress(JobCategory::Skinned).remaining, 1);
    assert!(h.client.was_cancelled(0));
    assert_eq!(h.client.submission_count(), 2);
}

#[test]
fn test_abort_other_category_leaves_running_job() {
    let mut h = harness();
    let (mesh1, skin1) = (mesh_target(2), skinned_target(2));
    h.queue.enqueue(&mesh1).unwrap();
    h.queue.enqueue(&skin1).unwrap();

    assert_eq!(h.queue.abort_category(JobCategory::Skinned), 1);
    assert_eq!(h.queue.running(), Some((mesh1.id, JobCategory::Mesh)));
    assert!(!h.client.was_cancelled(0));
    assert_eq!(h.client.submission_count(), 1);
}

#[test]
fn test_late_response_after_abort_is_dropped() {
    let mut h = harness();
    let target = mesh_target(2);
    h.queue.enqueue(&target).unwrap();
    h.queue.abort_category(JobCategory::Mesh);

    h.client.respond(0, success());
    assert!(h.queue.tick().is_none());
    assert!(h.meshes.is_empty());
}

#[test]
fn test_oversized_mesh_never_reaches_network() {
    let limits = PayloadLimits {
        max_triangles: 100,
        ..PayloadLimits::default()
    };
    let mut h = harness_with(limits, RequestPolicy::default());

    let err = h.queue.enqueue(&mesh_target(101)).unwrap_err();
    assert_eq!(err, ValidationError::TooManyTriangles { count: 101, limit: 100 });
    assert_eq!(h.client.submission_count(), 0);
    assert_eq!(h.queue.len(), 0);

    h.queue.enqueue(&mesh_target(100)).unwrap();
    assert!(h.queue.enqueue(&mesh_target(150)).is_err());
    assert_eq!(h.queue.len(), 1);
    assert_eq!(h.client.submission_count(), 1);
}

#[test]
fn test_oversized_body_rejected_at_enqueue() {
    let limits = PayloadLimits {
        max_request_bytes: 64,
        ..PayloadLimits::default()
    };
    let mut h = harness_with(limits, RequestPolicy::default());
    let err = h.queue.enqueue(&mesh_target(10)).unwrap_err();
    assert!(matches!(err, ValidationError::PayloadTooLarge { limit: 64, .. }));
    assert_eq!(h.client.submission_count(), 0);
    assert!(matches!(
        h.events.events()[0].kind,
        QueueEventKind::Rejected(_)
    ));
}

#[test]
fn test_progress_counts_every_accepted_job() {
    let mut h = harness();
    for _ in 0..3 {
        h.queue.enqueue(&mesh_target(1)).unwrap();
    }
    h.client.respond_last(success());
    h.queue.tick().unwrap();

    let snap = h.queue.progress(JobCategory::Mesh);
    assert_eq!((snap.completed, snap.remaining), (1, 2));

    h.queue.enqueue(&mesh_target(1)).unwrap();
    assert_eq!(h.queue.progress(JobCategory::Mesh).total(), 4);

    while h.queue.is_active() {
        h.client.respond_last(success());
        h.queue.tick();
    }
    assert_eq!(h.queue.progress(JobCategory::Mesh), ProgressSnapshot::idle(JobCategory::Mesh));

    h.queue.enqueue(&mesh_target(1)).unwrap();
    let fresh = h.queue.progress(JobCategory::Mesh);
    assert_eq!((fresh.completed, fresh.remaining), (0, 1));
}

#[test]
fn test_mesh_end_to_end() {
    let mut h = harness();
    let target = mesh_target(10);
    h.queue.enqueue(&target).unwrap();

    h.client.respond(0, success());
    let outcome = h.queue.tick().unwrap();
    assert_eq!(outcome.state, JobState::Completed);
    assert!(outcome.error.is_none());

    let applied = h.meshes.applied();
    assert_eq!(applied.len(), 1);
    let (id, result) = &applied[0];
    assert_eq!(*id, target.id);
    assert_eq!(result.representation.embeds, "ZW1iZWRz");
    assert_eq!(result.representation.sd_grid, "Z3JpZA==");
    assert_eq!(result.bounds.size, [1.0, 1.0, 0.0]);
    assert!(h.queue.is_empty());
    assert_eq!(h.client.submissions()[0].url, format!("{URL}?hardware_id=&api_key=local"));
}

#[test]
fn test_skinned_partial_failure_drops_empty_bone() {
    let mut h = harness();
    let target = skinned_target(3);
    h.queue.enqueue(&target).unwrap();

    h.client.respond(0, response(&[("e0", "g0"), ("", ""), ("e2", "g2")]));
    let outcome = h.queue.tick().unwrap();
    assert_eq!(outcome.state, JobState::Completed);
    assert!(outcome.error.is_none());

    let applied = h.skinned.applied();
    assert_eq!(applied.len(), 1);
    let result = &applied[0].1;
    assert_eq!(result.bones.len(), 2);
    assert_eq!(result.bones[0].bone.name, "bone0");
    assert_eq!(result.bones[1].bone.name, "bone2");
    assert_eq!(result.discarded, vec![BoneRef::new(1, "bone1")]);
    assert!(h.events.failures().is_empty());
}

#[test]
fn test_empty_mesh_result_is_reported_distinctly() {
    let mut h = harness();
    let target = mesh_target(1);
    h.queue.enqueue(&target).unwrap();
    h.client.respond(0, response(&[("", "grid")]));

    let outcome = h.queue.tick().unwrap();
    assert_eq!(outcome.state, JobState::Failed);
    assert_eq!(outcome.error, Some(JobError::EmptyResult));
    assert!(h.meshes.is_empty());
    assert_eq!(h.events.failures(), vec![(target.id, JobError::EmptyResult)]);
}

#[test]
fn test_transport_failure_advances_queue() {
    let mut h = harness();
    let (a, b) = (mesh_target(1), mesh_target(1));
    h.queue.enqueue(&a).unwrap();
    h.queue.enqueue(&b).unwrap();

    h.client.respond(0, PollStatus::Failed("HTTP 500".into()));
    let outcome = h.queue.tick().unwrap();
    assert_eq!(outcome.error, Some(JobError::Transport("HTTP 500".into())));
    assert_eq!(h.queue.running(), Some((b.id, JobCategory::Mesh)));
    assert_eq!(h.events.failures(), vec![(a.id, JobError::Transport("HTTP 500".into()))]);

    h.client.respond(1, success());
    assert_eq!(h.queue.tick().unwrap().state, JobState::Completed);
    assert_eq!(h.meshes.targets(), vec![b.id]);
}

#[test]
fn test_license_refusal_at_enqueue() {
    let client = MockNetworkClient::default();
    let mut queue = GenerationQueue::new(
        client.clone(),
        StaticLicenseGate::unavailable(),
        RecordingSink::<MeshResult>::default(),
        RecordingSink::<SkinnedResult>::default(),
    );
    let err = queue.enqueue(&mesh_target(1)).unwrap_err();
    assert_eq!(
        err,
        ValidationError::LicenseUnavailable("generation endpoint is not configured".into())
    );
    assert!(queue.is_empty());
    assert_eq!(client.submission_count(), 0);
    assert!(queue.cancel_handle(JobCategory::Mesh).is_none());
}

#[derive(Clone)]
struct ToggleGate(Arc<AtomicBool>);

impl LicenseGate for ToggleGate {
    fn is_generation_available(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn error_message(&self) -> String {
        "license expired".into()
    }

    fn generation_url(&self) -> Option<String> {
        self.is_generation_available().then(|| URL.to_string())
    }
}

#[test]
fn test_license_lost_before_start_fails_job() {
    let open = Arc::new(AtomicBool::new(true));
    let client = MockNetworkClient::default();
    let events = InMemoryEventSink::new(64);
    let mut queue = GenerationQueue::new(
        client.clone(),
        ToggleGate(Arc::clone(&open)),
        RecordingSink::<MeshResult>::default(),
        RecordingSink::<SkinnedResult>::default(),
    )
    .with_events(events.clone());

    let (a, b) = (mesh_target(1), mesh_target(1));
    queue.enqueue(&a).unwrap();
    queue.enqueue(&b).unwrap();
    open.store(false, Ordering::SeqCst);

    client.respond(0, success());
    assert_eq!(queue.tick().unwrap().state, JobState::Completed);

    assert!(queue.is_empty());
    assert_eq!(client.submission_count(), 1);
    assert_eq!(
        events.failures(),
        vec![(
            b.id,
            JobError::Validation(ValidationError::LicenseUnavailable("license expired".into()))
        )]
    );
    assert_eq!(queue.progress(JobCategory::Mesh), ProgressSnapshot::idle(JobCategory::Mesh));
}

#[test]
fn test_timeout_fails_stalled_request() {
    let policy = RequestPolicy {
        request_timeout: Some(Duration::from_millis(10)),
        max_retries: 0,
    };
    let mut h = harness_with(PayloadLimits::default(), policy);
    let (a, b) = (mesh_target(1), mesh_target(1));
    h.queue.enqueue(&a).unwrap();
    h.queue.enqueue(&b).unwrap();

    std::thread::sleep(Duration::from_millis(30));
    let outcome = h.queue.tick().unwrap();
    assert_eq!(outcome.error, Some(JobError::TimedOut(Duration::from_millis(10))));
    assert!(h.client.was_cancelled(0));
    assert_eq!(h.queue.running(), Some((b.id, JobCategory::Mesh)));
}

#[test]
fn test_retry_resubmits_transport_failures() {
    let policy = RequestPolicy {
        request_timeout: None,
        max_retries: 1,
    };
    let mut h = harness_with(PayloadLimits::default(), policy);
    let target = mesh_target(1);
    h.queue.enqueue(&target).unwrap();

    h.client.respond(0, PollStatus::Failed("reset".into()));
    assert!(h.queue.tick().is_none());
    assert_eq!(h.client.submission_count(), 2);
    assert_eq!(h.client.submissions()[0].body, h.client.submissions()[1].body);

    h.client.respond(1, success());
    assert_eq!(h.queue.tick().unwrap().state, JobState::Completed);
}

#[test]
fn test_contract_errors_are_not_retried() {
    let policy = RequestPolicy {
        request_timeout: None,
        max_retries: 3,
    };
    let mut h = harness_with(PayloadLimits::default(), policy);
    h.queue.enqueue(&mesh_target(1)).unwrap();
    h.client.respond(0, response(&[]));
    assert_eq!(h.queue.tick().unwrap().error, Some(JobError::EmptyResult));
    assert_eq!(h.client.submission_count(), 1);
}

#[test]
fn test_abort_all_clears_everything() {
    let mut h = harness();
    h.queue.enqueue(&mesh_target(1)).unwrap();
    h.queue.enqueue(&skinned_target(2)).unwrap();

    h.queue.abort_all();
    assert!(h.queue.is_empty());
    assert!(!h.queue.is_active());
    assert!(h.client.was_cancelled(0));
    assert!(h.queue.tick().is_none());
    for category in JobCategory::ALL {
        assert_eq!(h.queue.progress(category), ProgressSnapshot::idle(category));
    }
    let aborted = h
        .events
        .events()
        .into_iter()
        .filter(|e| e.kind == QueueEventKind::Aborted)
        .count();
    assert_eq!(aborted, 2);
}

#[test]
fn test_cancel_handle_aborts_category_on_next_tick() {
    let mut h = harness();
    let (mesh, skin) = (mesh_target(1), skinned_target(2));
    h.queue.enqueue(&skin).unwrap();
    h.queue.enqueue(&mesh).unwrap();

    let cancel = h.queue.cancel_handle(JobCategory::Skinned).unwrap();
    assert_eq!(cancel.category(), JobCategory::Skinned);
    cancel.cancel();
    assert_eq!(h.queue.len(), 2);

    assert!(h.queue.tick().is_none());
    assert_eq!(h.queue.pending_targets(), vec![mesh.id]);
    assert_eq!(h.queue.running(), Some((mesh.id, JobCategory::Mesh)));
    assert!(h.queue.cancel_handle(JobCategory::Skinned).is_none());
}

#[derive(Clone, Default)]
struct Panel {
    log: Arc<Mutex<Vec<String>>>,
}

impl ProgressReporter for Panel {
    fn started(&mut self, category: JobCategory, label: &str, _cancel: CancelHandle) {
        self.log.lock().push(format!("start {category}: {label}"));
    }

    fn report(&mut self, snapshot: ProgressSnapshot) {
        self.log
            .lock()
            .push(format!("{} {}/{}", snapshot.category, snapshot.completed, snapshot.total()));
    }

    fn finished(&mut self, category: JobCategory) {
        self.log.lock().push(format!("finish {category}"));
    }
}

#[test]
fn test_progress_reporter_follows_tracker_lifecycle() {
    let display = Panel::default();
    let h = harness();
    let mut queue = h.queue.with_progress_reporter(display.clone());

    queue.enqueue(&mesh_target(1)).unwrap();
    queue.tick();
    h.client.respond(0, success());
    queue.tick();

    assert_eq!(
        *display.log.lock(),
        vec![
            "start mesh: Generating mesh SDFs".to_string(),
            "mesh 0/1".to_string(),
            "mesh 0/1".to_string(),
            "mesh 1/1".to_string(),
            "finish mesh".to_string(),
        ]
    );
}
