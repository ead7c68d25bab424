//! Queue hand-off for background mail delivery.
//!
//! Only the producer side lives here: turning a job into a serialized entry
//! and inserting it onto a named queue. Polling, retries, and expiry belong
//! to the host application's worker pool, which can consume any
//! [`QueueProvider`] backend (Postgres, Redis, in-memory, ...).
//!
//! ```ignore
//! let job = SendEmailJob::<AppState>::new(email).on_mailer("mailgun");
//! let id = enqueue(&queue, job).await?;
//! ```

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Queue used when none is named explicitly.
pub const DEFAULT_QUEUE: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// A unit of deferrable work: data plus the logic a worker runs on it.
///
/// The implementing type's fields are what gets serialized onto the queue, so
/// keep them self-contained; anything environmental comes back through
/// `Context` at execution time.
#[async_trait]
pub trait Job: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable identifier workers use to route entries back to this type,
    /// e.g. `"mail::send_email"`.
    const JOB_TYPE: &'static str;

    /// State handed to `perform` when a worker runs the entry.
    type Context: Send + Sync + 'static;

    /// Options applied when the job is enqueued without explicit ones.
    fn default_opts() -> JobOpts {
        JobOpts::default()
    }

    /// Run the job. `Ok(Some(value))` records a result for observability;
    /// `Ok(None)` records nothing.
    async fn perform(self, ctx: &Self::Context) -> JobResult;
}

/// Alias for what [`Job::perform`] returns.
pub type JobResult = Result<Option<serde_json::Value>, Box<dyn std::error::Error + Send + Sync>>;

/// Where an entry is in its lifecycle. Producers only ever create `Pending`;
/// the remaining states are driven by whoever works the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Enqueue-time options.
#[derive(Debug, Clone)]
pub struct JobOpts {
    /// Maximum number of attempts (including the first) a worker should make.
    pub max_attempts: i32,
    /// Hold the entry back for this long before it becomes claimable.
    pub delay: Option<std::time::Duration>,
    /// Named queue the entry lands on; [`DEFAULT_QUEUE`] when unset.
    pub queue: Option<String>,
}

impl Default for JobOpts {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: None,
            queue: None,
        }
    }
}

/// Serialized form of one queued job, as handed to a backend.
///
/// Persistent backends typically map these fields onto a row and add their
/// own bookkeeping (locks, error text, timestamps) around them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEntry {
    pub id: Uuid,
    pub job_type: String,
    pub queue: String,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub run_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

/// Backend-agnostic queue storage.
///
/// Each method is one storage operation; for SQL backends `claim_next` is the
/// `SELECT ... FOR UPDATE SKIP LOCKED` pattern.
#[async_trait]
pub trait QueueProvider: Send + Sync + Clone + 'static {
    /// Insert a new entry onto its queue.
    async fn insert(&self, entry: &JobEntry) -> Result<(), JobError>;

    /// Atomically take the next claimable entry on `queue` (pending and due),
    /// marking it running and counting the attempt.
    async fn claim_next(&self, queue: &str) -> Result<Option<JobEntry>, JobError>;

    /// Write an updated entry back by id.
    async fn update(&self, entry: &JobEntry) -> Result<(), JobError>;
}

/// In-memory [`QueueProvider`] for development and testing.
///
/// Entries live in a `Vec` behind a mutex and vanish when the queue drops.
#[derive(Clone, Default)]
pub struct MemoryQueue {
    entries: Arc<Mutex<Vec<JobEntry>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending entries on `queue`.
    pub async fn pending(&self, queue: &str) -> usize {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .filter(|e| e.queue == queue && e.status == JobStatus::Pending)
            .count()
    }
}

#[async_trait]
impl QueueProvider for MemoryQueue {
    async fn insert(&self, entry: &JobEntry) -> Result<(), JobError> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }

    async fn claim_next(&self, queue: &str) -> Result<Option<JobEntry>, JobError> {
        let mut entries = self.entries.lock().await;
        let now = OffsetDateTime::now_utc();

        let claimable = entries
            .iter_mut()
            .find(|e| e.queue == queue && e.status == JobStatus::Pending && e.run_at <= now);

        Ok(claimable.map(|entry| {
            entry.status = JobStatus::Running;
            entry.attempts += 1;
            entry.clone()
        }))
    }

    async fn update(&self, entry: &JobEntry) -> Result<(), JobError> {
        let mut entries = self.entries.lock().await;
        if let Some(existing) = entries.iter_mut().find(|e| e.id == entry.id) {
            *existing = entry.clone();
        }
        Ok(())
    }
}

/// Serialize a [`Job`] into a [`JobEntry`] with explicit options.
pub fn into_entry<J: Job>(job: &J, opts: JobOpts) -> Result<JobEntry, JobError> {
    let now = OffsetDateTime::now_utc();
    Ok(JobEntry {
        id: Uuid::new_v4(),
        job_type: J::JOB_TYPE.to_string(),
        queue: opts.queue.unwrap_or_else(|| DEFAULT_QUEUE.to_string()),
        payload: serde_json::to_value(job)?,
        status: JobStatus::Pending,
        attempts: 0,
        max_attempts: opts.max_attempts,
        run_at: opts.delay.map(|d| now + d).unwrap_or(now),
        created_at: now,
    })
}

/// Serialize a job with its default options and insert it in one call.
pub async fn enqueue<J: Job>(queue: &impl QueueProvider, job: J) -> Result<Uuid, JobError> {
    enqueue_with(queue, job, J::default_opts()).await
}

/// Serialize a job with explicit options and insert it in one call.
pub async fn enqueue_with<J: Job>(
    queue: &impl QueueProvider,
    job: J,
    opts: JobOpts,
) -> Result<Uuid, JobError> {
    let entry = into_entry(&job, opts)?;
    let id = entry.id;
    queue.insert(&entry).await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct NoopJob {
        marker: u32,
    }

    #[async_trait]
    impl Job for NoopJob {
        const JOB_TYPE: &'static str = "test::noop";
        type Context = ();

        async fn perform(self, _ctx: &()) -> JobResult {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn enqueue_lands_on_default_queue() {
        let queue = MemoryQueue::new();
        enqueue(&queue, NoopJob { marker: 1 }).await.unwrap();

        assert_eq!(queue.pending(DEFAULT_QUEUE).await, 1);
        let claimed = queue.claim_next(DEFAULT_QUEUE).await.unwrap();
        assert_eq!(claimed.unwrap().job_type, "test::noop");
    }

    #[tokio::test]
    async fn named_queue_is_isolated() {
        let queue = MemoryQueue::new();
        let opts = JobOpts {
            queue: Some("emails".to_string()),
            ..JobOpts::default()
        };
        enqueue_with(&queue, NoopJob { marker: 2 }, opts).await.unwrap();

        assert!(queue.claim_next(DEFAULT_QUEUE).await.unwrap().is_none());

        let claimed = queue.claim_next("emails").await.unwrap().unwrap();
        assert_eq!(claimed.queue, "emails");
        assert_eq!(claimed.status, JobStatus::Running);
        assert_eq!(claimed.attempts, 1);
    }

    #[tokio::test]
    async fn delayed_jobs_are_not_claimable() {
        let queue = MemoryQueue::new();
        let opts = JobOpts {
            delay: Some(std::time::Duration::from_secs(60)),
            ..JobOpts::default()
        };
        enqueue_with(&queue, NoopJob { marker: 3 }, opts).await.unwrap();

        assert!(queue.claim_next(DEFAULT_QUEUE).await.unwrap().is_none());
    }
}
