use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::{tempdir, TempDir};

use wsl_reclaim::compact::{CompactionTier, Engine, TierOutcome};
use wsl_reclaim::error::Error;
use wsl_reclaim::guest::GuestControl;
use wsl_reclaim::model::CompactionMethod;
use wsl_reclaim::orchestrator::{Orchestrator, OrchestratorConfig};

/// Guest double recording which operations were invoked.
struct FakeGuest {
    status_ok: bool,
    shutdown_ok: bool,
    calls: Rc<RefCell<Vec<&'static str>>>,
}

impl FakeGuest {
    fn new(status_ok: bool, shutdown_ok: bool) -> (Box<Self>, Rc<RefCell<Vec<&'static str>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let guest = Box::new(Self {
            status_ok,
            shutdown_ok,
            calls: Rc::clone(&calls),
        });
        (guest, calls)
    }
}

impl GuestControl for FakeGuest {
    fn query_status(&self) -> Result<(), Error> {
        self.calls.borrow_mut().push("query_status");
        if self.status_ok {
            Ok(())
        } else {
            Err(Error::GuestUnreachable("wsl.exe --list exited with 1".to_string()))
        }
    }

    fn shutdown_all(&self) -> Result<(), Error> {
        self.calls.borrow_mut().push("shutdown_all");
        if self.shutdown_ok {
            Ok(())
        } else {
            Err(Error::ShutdownFailed("wsl.exe --shutdown exited with 1".to_string()))
        }
    }
}

struct ClosureTier {
    method: CompactionMethod,
    behavior: Box<dyn Fn(&Path) -> TierOutcome>,
}

impl ClosureTier {
    fn boxed(
        method: CompactionMethod,
        behavior: impl Fn(&Path) -> TierOutcome + 'static,
    ) -> Box<Self> {
        Box::new(Self {
            method,
            behavior: Box::new(behavior),
        })
    }
}

impl CompactionTier for ClosureTier {
    fn method(&self) -> CompactionMethod {
        self.method
    }

    fn run(&self, image_path: &Path) -> TierOutcome {
        (self.behavior)(image_path)
    }
}

fn succeed_shrinking_to(size: usize) -> impl Fn(&Path) -> TierOutcome {
    move |path: &Path| {
        fs::write(path, vec![0u8; size]).unwrap();
        TierOutcome::Succeeded
    }
}

/// Root with a single image file, as discovery would find it.
fn root_with_image(size: usize) -> (TempDir, PathBuf) {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("ext4.vhdx");
    fs::write(&path, vec![0u8; size]).unwrap();
    (tmp, path)
}

fn config_for(roots: Vec<PathBuf>, force: bool) -> OrchestratorConfig {
    OrchestratorConfig {
        search_roots: roots,
        image_file_name: "ext4.vhdx".to_string(),
        force,
    }
}

fn succeeding_engine() -> Engine {
    Engine::new(
        ClosureTier::boxed(CompactionMethod::Native, |_: &Path| TierOutcome::Succeeded),
        ClosureTier::boxed(CompactionMethod::Diskpart, |_: &Path| {
            TierOutcome::Succeeded
        }),
    )
}

#[test]
fn test_missing_privilege_aborts_before_consent() {
    let consent_asked = Rc::new(Cell::new(false));
    let asked = Rc::clone(&consent_asked);
    let (guest, guest_calls) = FakeGuest::new(true, true);

    let orchestrator = Orchestrator::new(
        config_for(vec![], false),
        Box::new(|| false),
        Box::new(move || {
            asked.set(true);
            true
        }),
        guest,
        succeeding_engine(),
    );

    let err = orchestrator.run().unwrap_err();
    assert!(matches!(err, Error::NotElevated));
    assert!(!consent_asked.get());
    assert!(guest_calls.borrow().is_empty());
}

#[test]
fn test_declined_consent_aborts_before_guest_shutdown() {
    let (guest, guest_calls) = FakeGuest::new(true, true);

    let orchestrator = Orchestrator::new(
        config_for(vec![], false),
        Box::new(|| true),
        Box::new(|| false),
        guest,
        succeeding_engine(),
    );

    let err = orchestrator.run().unwrap_err();
    assert!(matches!(err, Error::ConsentDeclined));
    assert!(guest_calls.borrow().is_empty());
}

#[test]
fn test_force_skips_the_consent_gate() {
    let consent_asked = Rc::new(Cell::new(false));
    let asked = Rc::clone(&consent_asked);
    let (root, _) = root_with_image(1024);
    let (guest, _) = FakeGuest::new(true, true);

    let orchestrator = Orchestrator::new(
        config_for(vec![root.path().to_path_buf()], true),
        Box::new(|| true),
        Box::new(move || {
            asked.set(true);
            false
        }),
        guest,
        succeeding_engine(),
    );

    let report = orchestrator.run().unwrap();
    assert!(!consent_asked.get());
    assert_eq!(report.summary.succeeded, 1);
}

#[test]
fn test_unreachable_guest_aborts_before_discovery() {
    // The search root holds a real image; a failed status query must stop
    // the run before shutdown or discovery happen.
    let (root, _) = root_with_image(1024);
    let (guest, guest_calls) = FakeGuest::new(false, true);

    let orchestrator = Orchestrator::new(
        config_for(vec![root.path().to_path_buf()], true),
        Box::new(|| true),
        Box::new(|| true),
        guest,
        succeeding_engine(),
    );

    let err = orchestrator.run().unwrap_err();
    assert!(matches!(err, Error::GuestUnreachable(_)));
    assert_eq!(*guest_calls.borrow(), vec!["query_status"]);
}

#[test]
fn test_failed_shutdown_is_fatal() {
    let (root, _) = root_with_image(1024);
    let (guest, guest_calls) = FakeGuest::new(true, false);

    let orchestrator = Orchestrator::new(
        config_for(vec![root.path().to_path_buf()], true),
        Box::new(|| true),
        Box::new(|| true),
        guest,
        succeeding_engine(),
    );

    let err = orchestrator.run().unwrap_err();
    assert!(matches!(err, Error::ShutdownFailed(_)));
    assert_eq!(*guest_calls.borrow(), vec!["query_status", "shutdown_all"]);
}

#[test]
fn test_zero_images_found_is_a_fatal_abort() {
    let empty_root = tempdir().unwrap();
    let (guest, guest_calls) = FakeGuest::new(true, true);

    let orchestrator = Orchestrator::new(
        config_for(vec![empty_root.path().to_path_buf()], true),
        Box::new(|| true),
        Box::new(|| true),
        guest,
        succeeding_engine(),
    );

    let err = orchestrator.run().unwrap_err();
    assert!(matches!(err, Error::NoImagesFound));
    // Quiescence already happened; only the compaction phase was skipped.
    assert_eq!(*guest_calls.borrow(), vec!["query_status", "shutdown_all"]);
}

#[test]
fn test_mixed_tier_run_accounts_all_recovered_bytes() {
    // Image A: native shrinks 5000 -> 2000. Image B: native fails, diskpart
    // shrinks 1000 -> 800. Expect 2 successes and 3200 bytes recovered.
    let (root_a, path_a) = root_with_image(5000);
    let (root_b, path_b) = root_with_image(1000);

    let native_target = path_a.clone();
    let native = ClosureTier::boxed(CompactionMethod::Native, move |path: &Path| {
        if path == native_target {
            fs::write(path, vec![0u8; 2000]).unwrap();
            TierOutcome::Succeeded
        } else {
            TierOutcome::Failed("Optimize-VHD exited with 1".to_string())
        }
    });
    let fallback = ClosureTier::boxed(CompactionMethod::Diskpart, succeed_shrinking_to(800));

    let (guest, _) = FakeGuest::new(true, true);
    let orchestrator = Orchestrator::new(
        config_for(
            vec![root_a.path().to_path_buf(), root_b.path().to_path_buf()],
            true,
        ),
        Box::new(|| true),
        Box::new(|| true),
        guest,
        Engine::new(native, fallback),
    );

    let report = orchestrator.run().unwrap();
    assert_eq!(report.summary.images_found, 2);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.bytes_recovered, 3200);

    let outcome_a = report
        .outcomes
        .iter()
        .find(|o| o.image.path == path_a)
        .unwrap();
    let outcome_b = report
        .outcomes
        .iter()
        .find(|o| o.image.path == path_b)
        .unwrap();
    assert_eq!(outcome_a.method, CompactionMethod::Native);
    assert_eq!(outcome_b.method, CompactionMethod::Diskpart);
}

#[test]
fn test_per_image_failure_does_not_abort_the_run() {
    let (root_a, path_a) = root_with_image(4096);
    let (root_b, _) = root_with_image(4096);

    let broken = path_a.clone();
    let native = ClosureTier::boxed(CompactionMethod::Native, move |path: &Path| {
        if path == broken {
            TierOutcome::Failed("Optimize-VHD exited with 1".to_string())
        } else {
            fs::write(path, vec![0u8; 1024]).unwrap();
            TierOutcome::Succeeded
        }
    });
    let fallback = ClosureTier::boxed(CompactionMethod::Diskpart, move |_: &Path| {
        TierOutcome::Failed("diskpart exited with 1: access denied".to_string())
    });

    let (guest, _) = FakeGuest::new(true, true);
    let orchestrator = Orchestrator::new(
        config_for(
            vec![root_a.path().to_path_buf(), root_b.path().to_path_buf()],
            true,
        ),
        Box::new(|| true),
        Box::new(|| true),
        guest,
        Engine::new(native, fallback),
    );

    let report = orchestrator.run().unwrap();
    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.failed, 1);

    let failed = report.outcomes.iter().find(|o| !o.succeeded).unwrap();
    assert_eq!(failed.image.path, path_a);
    assert!(failed
        .failure_detail
        .as_deref()
        .unwrap()
        .contains("diskpart"));
}
