//! Shared fakes for the integration tests.

use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use sitepipe::actions::ReloadAction;
use sitepipe::notifier::Notifier;
use sitepipe::orchestrator::{Leaf, PipelineLeaves};
use sitepipe::task::{BoxFuture, LeafAction, TaskContext};
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Ordered, shared record of what happened during a test.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.count(entry) > 0
    }

    /// Position of the first occurrence of `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

/// A leaf that records `<name>` when it starts and `<name>:done` when it
/// succeeds. It can sleep first and can be told to fail.
#[derive(Debug, Clone)]
pub struct FakeAction {
    name: String,
    log: EventLog,
    delay: Duration,
    fail: bool,
}

impl FakeAction {
    pub fn new(name: impl Into<String>, log: &EventLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn arc(self) -> Arc<dyn LeafAction> {
        Arc::new(self)
    }
}

impl LeafAction for FakeAction {
    fn run(&self, _ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.log.push(self.name.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                self.log.push(format!("{}:failed", self.name));
                anyhow::bail!("{} exploded", self.name);
            }
            self.log.push(format!("{}:done", self.name));
            Ok(())
        })
    }
}

/// Notifier that writes `notify:<message>` and `reload` into an [`EventLog`],
/// so notifications can be ordered against task runs.
#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    log: EventLog,
}

impl RecordingNotifier {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }

    pub fn arc(self) -> Arc<dyn Notifier> {
        Arc::new(self)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.log.push(format!("notify:{message}"));
    }

    fn reload(&self) {
        self.log.push("reload");
    }
}

/// Pipeline leaves backed by [`FakeAction`]s named after their tasks.
///
/// `reload` is the real [`ReloadAction`], so with a [`RecordingNotifier`]
/// it shows up in the log as `notify:Reloading...` followed by `reload`.
pub fn fake_leaves(log: &EventLog) -> PipelineLeaves {
    fake_leaves_with(log, |_, action| action)
}

/// Like [`fake_leaves`], but lets the caller adjust each fake by task name.
pub fn fake_leaves_with(
    log: &EventLog,
    adjust: impl Fn(&str, FakeAction) -> FakeAction,
) -> PipelineLeaves {
    let leaf = |name: &str| Leaf::new(adjust(name, FakeAction::new(name, log)).arc());

    PipelineLeaves {
        main_assets: leaf("mainAssets"),
        preview_assets: leaf("previewAssets"),
        images: leaf("images"),
        config: leaf("config"),
        generate_site: leaf("generateSite"),
        reload: Leaf::new(Arc::new(ReloadAction)).with_message("Reloading..."),
        start_server: leaf("startServer"),
    }
}
