//! Scan job lifecycle: start, stop, status, retention.
//!
//! Every job gets its own [`JobContext`] with a private cancellation token,
//! state channel and counters, stored in a registry keyed by [`JobId`].
//! Stopping one job never affects another.

use crate::crawler::{CrawlCounters, Crawler};
use crate::error::{Result, ScanError};
use crate::fetcher::Fetcher;
use crate::pipeline::ArtifactPipeline;
use chrono::{DateTime, Utc};
use metaprobe_core::{AppConfig, Classifier, JobId, ScanTarget};
use metaprobe_db::Database;
use metaprobe_discovery::SensitiveDetector;
use metaprobe_extract::ExtractorRegistry;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Lifecycle state of a scan job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Accepted, worker not yet running
    Pending,
    /// Worker is crawling
    Running,
    /// Worker finished, either exhausted or cancelled
    Done,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
        })
    }
}

/// Point-in-time view of a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    /// Job handle
    pub id: JobId,
    /// Start URL
    pub target: String,
    /// Domain label records are filed under
    pub domain: String,
    /// Depth bound
    pub max_depth: u32,
    /// Lifecycle state
    pub state: JobState,
    /// Whether a stop was requested
    pub cancelled: bool,
    /// Pages requested so far
    pub pages_visited: u64,
    /// Artifacts stored so far
    pub artifacts_recorded: u64,
    /// File links skipped as already stored
    pub duplicates_skipped: u64,
    /// Failed fetches and dropped artifacts
    pub errors: u64,
    /// When the job was accepted
    pub created_at: DateTime<Utc>,
    /// When the worker started
    pub started_at: Option<DateTime<Utc>>,
    /// When the worker finished
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Timeline {
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

struct JobContext {
    id: JobId,
    target: ScanTarget,
    max_depth: u32,
    cancel: CancellationToken,
    state: watch::Sender<JobState>,
    counters: CrawlCounters,
    created_at: DateTime<Utc>,
    timeline: Mutex<Timeline>,
}

impl JobContext {
    fn transition(&self, state: JobState) {
        {
            let mut timeline = self.timeline.lock().unwrap_or_else(PoisonError::into_inner);
            match state {
                JobState::Running => timeline.started_at = Some(Utc::now()),
                JobState::Done => timeline.finished_at = Some(Utc::now()),
                JobState::Pending => {}
            }
        }
        self.state.send_replace(state);
        tracing::info!("Scan job {} ({}) is {}", self.id, self.target, state);
    }

    fn snapshot(&self) -> JobStatus {
        let timeline = *self.timeline.lock().unwrap_or_else(PoisonError::into_inner);
        JobStatus {
            id: self.id.clone(),
            target: self.target.to_string(),
            domain: self.target.domain().to_string(),
            max_depth: self.max_depth,
            state: *self.state.borrow(),
            cancelled: self.cancel.is_cancelled(),
            pages_visited: self.counters.pages_visited.load(Ordering::Relaxed),
            artifacts_recorded: self.counters.artifacts_recorded.load(Ordering::Relaxed),
            duplicates_skipped: self.counters.duplicates_skipped.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            created_at: self.created_at,
            started_at: timeline.started_at,
            finished_at: timeline.finished_at,
        }
    }
}

/// Owns the job registry and the components shared by all workers.
pub struct ScanController {
    jobs: RwLock<HashMap<JobId, Arc<JobContext>>>,
    fetcher: Fetcher,
    classifier: Arc<Classifier>,
    pipeline: ArtifactPipeline,
    default_scheme: String,
}

impl ScanController {
    /// Build a controller from application settings and an opened store.
    pub fn new(config: &AppConfig, db: Database) -> Result<Self> {
        let pipeline = ArtifactPipeline::new(
            db,
            ExtractorRegistry::with_defaults(),
            SensitiveDetector::new(&config.detection.keywords),
            config.downloads_dir()?,
        );
        Ok(Self::from_parts(
            Fetcher::new(&config.crawler)?,
            Classifier::new(&config.classifier.allowed_extensions),
            pipeline,
            config.crawler.default_scheme.clone(),
        ))
    }

    /// Assemble a controller from prebuilt components.
    #[must_use]
    pub fn from_parts(
        fetcher: Fetcher,
        classifier: Classifier,
        pipeline: ArtifactPipeline,
        default_scheme: impl Into<String>,
    ) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            fetcher,
            classifier: Arc::new(classifier),
            pipeline,
            default_scheme: default_scheme.into(),
        }
    }

    /// Pipeline used by every job; also serves direct uploads.
    #[must_use]
    pub fn pipeline(&self) -> &ArtifactPipeline {
        &self.pipeline
    }

    /// Start crawling `target` in a background task and return its handle
    /// immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, target: &str, max_depth: u32) -> Result<JobId> {
        let target = ScanTarget::parse(target, &self.default_scheme)?;
        let (state, _) = watch::channel(JobState::Pending);
        let job = Arc::new(JobContext {
            id: JobId::generate(),
            target,
            max_depth,
            cancel: CancellationToken::new(),
            state,
            counters: CrawlCounters::default(),
            created_at: Utc::now(),
            timeline: Mutex::new(Timeline::default()),
        });
        let id = job.id.clone();

        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::clone(&job));
        tracing::info!("Scan job {} accepted for {} (max depth {})", id, job.target, max_depth);

        let fetcher = self.fetcher.clone();
        let classifier = Arc::clone(&self.classifier);
        let pipeline = self.pipeline.clone();
        tokio::spawn(async move {
            job.transition(JobState::Running);
            let mut crawler =
                Crawler::new(&job.target, job.max_depth, &fetcher, &classifier, &pipeline);
            crawler.run(&job.cancel, &job.counters).await;
            job.transition(JobState::Done);
        });

        Ok(id)
    }

    /// Request cancellation. The worker stops before its next pop or file
    /// fetch; a request already in flight is allowed to complete.
    pub fn stop(&self, id: &JobId) -> Result<()> {
        let job = self.get(id).ok_or_else(|| ScanError::JobNotFound(id.clone()))?;
        job.cancel.cancel();
        tracing::info!("Stop requested for scan job {}", id);
        Ok(())
    }

    /// Current state and counters of a job, or `None` for an unknown handle.
    #[must_use]
    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.get(id).map(|job| job.snapshot())
    }

    /// Wait until a job reaches `done` and return its final status.
    pub async fn wait(&self, id: &JobId) -> Result<JobStatus> {
        let job = self.get(id).ok_or_else(|| ScanError::JobNotFound(id.clone()))?;
        let mut rx = job.state.subscribe();
        // The sender lives in `job`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|state| *state == JobState::Done).await;
        Ok(job.snapshot())
    }

    /// Snapshots of every tracked job, oldest first.
    #[must_use]
    pub fn list_jobs(&self) -> Vec<JobStatus> {
        let mut jobs: Vec<JobStatus> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|job| job.snapshot())
            .collect();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }

    /// Forget a finished job. Jobs that are still pending or running stay
    /// tracked and yield [`ScanError::JobActive`].
    pub fn discard(&self, id: &JobId) -> Result<JobStatus> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let job = jobs
            .get(id)
            .ok_or_else(|| ScanError::JobNotFound(id.clone()))?;
        if *job.state.borrow() != JobState::Done {
            return Err(ScanError::JobActive(id.clone()));
        }
        let status = job.snapshot();
        jobs.remove(id);
        Ok(status)
    }

    fn get(&self, id: &JobId) -> Option<Arc<JobContext>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}
