use std::collections::HashMap;
use std::time::Duration;
use chrono::Utc;
use tokio::sync::RwLock;
use crate::job::{JobStatus, PreviewJob};

#[derive(Default)]
struct Tables {
    jobs: HashMap<String, PreviewJob>,
    /// idempotency key -> request id
    keys: HashMap<String, String>,
    /// request id -> PNG bytes
    previews: HashMap<String, Vec<u8>>,
}

/// In-memory job table. Jobs live until [`clear_completed`](Self::clear_completed)
/// sweeps them.
#[derive(Default)]
pub struct JobStore {
    tables: RwLock<Tables>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `job` unless `idempotency_key` already names one. The lookup and
    /// the insert happen under one write lock. Returns the stored job and
    /// whether it is the one just passed in.
    pub async fn insert_or_get(&self, job: PreviewJob, idempotency_key: Option<String>) -> (PreviewJob, bool) {
        let mut tables = self.tables.write().await;
        if let Some(key) = &idempotency_key {
            let existing = tables.keys.get(key).and_then(|id| tables.jobs.get(id));
            if let Some(existing) = existing {
                return (existing.clone(), false);
            }
        }

        if let Some(key) = idempotency_key {
            tables.keys.insert(key, job.request_id.clone());
        }
        tables.jobs.insert(job.request_id.clone(), job.clone());
        (job, true)
    }

    pub async fn get_job(&self, request_id: &str) -> Option<PreviewJob> {
        self.tables.read().await.jobs.get(request_id).cloned()
    }

    /// Count one status read and move a queued job to processing.
    pub async fn record_poll(&self, request_id: &str) -> Option<PreviewJob> {
        let mut tables = self.tables.write().await;
        let job = tables.jobs.get_mut(request_id)?;
        job.polls += 1;
        if job.status == JobStatus::Queued {
            job.status = JobStatus::Processing;
        }
        job.updated_at = Utc::now();
        Some(job.clone())
    }

    pub async fn complete_job(&self, request_id: &str, preview_url: String) -> Option<PreviewJob> {
        self.finish(request_id, |job| {
            job.status = JobStatus::Succeeded;
            job.preview_url = Some(preview_url);
        })
        .await
    }

    pub async fn fail_job(&self, request_id: &str, error: String) -> Option<PreviewJob> {
        self.finish(request_id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(error);
        })
        .await
    }

    async fn finish(&self, request_id: &str, apply: impl FnOnce(&mut PreviewJob)) -> Option<PreviewJob> {
        let mut tables = self.tables.write().await;
        let job = tables.jobs.get_mut(request_id)?;
        if !job.status.is_complete() {
            apply(job);
            let now = Utc::now();
            job.updated_at = now;
            job.completed_at = Some(now);
        }
        Some(job.clone())
    }

    pub async fn store_preview(&self, request_id: &str, png: Vec<u8>) {
        self.tables.write().await.previews.insert(request_id.to_string(), png);
    }

    pub async fn get_preview(&self, request_id: &str) -> Option<Vec<u8>> {
        self.tables.read().await.previews.get(request_id).cloned()
    }

    pub async fn get_active_jobs(&self) -> Vec<PreviewJob> {
        self.tables
            .read()
            .await
            .jobs
            .values()
            .filter(|job| job.status.is_active())
            .cloned()
            .collect()
    }

    /// Drop finished jobs (and their images) completed more than `older_than` ago.
    pub async fn clear_completed(&self, older_than: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(older_than)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return 0;
        };
        let mut tables = self.tables.write().await;

        let expired: Vec<String> = tables
            .jobs
            .values()
            .filter(|job| job.completed_at.is_some_and(|at| at <= cutoff))
            .map(|job| job.request_id.clone())
            .collect();

        for request_id in &expired {
            tables.jobs.remove(request_id);
            tables.previews.remove(request_id);
        }
        tables.keys.retain(|_, request_id| !expired.contains(request_id));

        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_core::{ArtStyle, AspectRatio};
    use crate::job::JobInputs;

    fn job(id: &str) -> PreviewJob {
        PreviewJob::new(id.into(), JobInputs {
            style: ArtStyle::ArtisanCharcoal,
            prompt: String::new(),
            image_url: "https://x/p.jpg".into(),
            aspect_ratio: AspectRatio::Square,
            watermark: false,
            is_authenticated: true,
        })
    }

    #[tokio::test]
    async fn test_insert_or_get_keeps_first_job() {
        let store = std::sync::Arc::new(JobStore::new());

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.insert_or_get(job(&format!("r{}", i)), Some("same".into())).await })
            })
            .collect();

        let mut winners = Vec::new();
        let mut ids = Vec::new();
        for task in tasks {
            let (stored, inserted) = task.await.unwrap();
            if inserted {
                winners.push(stored.request_id.clone());
            }
            ids.push(stored.request_id);
        }

        assert_eq!(winners.len(), 1);
        assert!(ids.iter().all(|id| *id == winners[0]));
        assert_eq!(store.get_active_jobs().await.len(), 1);

        let (unkeyed, inserted) = store.insert_or_get(job("free"), None).await;
        assert!(inserted);
        assert_eq!(unkeyed.request_id, "free");
    }

    #[tokio::test]
    async fn test_poll_then_complete() {
        let store = JobStore::new();
        store.insert_or_get(job("r1"), None).await;

        let polled = store.record_poll("r1").await.unwrap();
        assert_eq!(polled.polls, 1);
        assert_eq!(polled.status, JobStatus::Processing);

        store.complete_job("r1", "http://x/r1.png".into()).await;
        let failed = store.fail_job("r1", "late failure".into()).await.unwrap();
        assert_eq!(failed.status, JobStatus::Succeeded);
        assert!(failed.error.is_none());
        assert!(store.get_active_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let store = JobStore::new();
        assert!(store.record_poll("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_clear_completed() {
        let store = JobStore::new();
        store.insert_or_get(job("done"), Some("k".into())).await;
        store.insert_or_get(job("running"), None).await;
        store.complete_job("done", "http://x/done.png".into()).await;
        store.store_preview("done", vec![1, 2, 3]).await;

        assert_eq!(store.clear_completed(Duration::ZERO).await, 1);
        assert!(store.get_job("done").await.is_none());
        assert!(store.get_preview("done").await.is_none());
        assert!(store.insert_or_get(job("again"), Some("k".into())).await.1);
        assert!(store.get_job("running").await.is_some());
    }
}
