use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use log::debug;
use tokio::sync::Mutex;
use tokio::time::Instant;
use wt_core::ArtStyle;

struct CachedPrompt {
    prompt: String,
    fetched_at: Instant,
}

/// `style id -> prompt` lookups with a time-to-live.
///
/// Expired entries are reloaded on the next read; nothing is evicted in the
/// background.
pub struct PromptCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedPrompt>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PromptCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Prompt for a catalog style.
    pub async fn prompt_for(&self, style: ArtStyle) -> String {
        self.get_or_load(style.id(), || style.prompt().to_string()).await
    }

    pub async fn get_or_load(&self, key: &str, load: impl FnOnce() -> String) -> String {
        let mut entries = self.entries.lock().await;

        if let Some(cached) = entries.get(key) {
            if cached.fetched_at.elapsed() < self.ttl {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return cached.prompt.clone();
            }
            debug!("prompt for '{}' expired", key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let prompt = load();
        entries.insert(key.to_string(), CachedPrompt {
            prompt: prompt.clone(),
            fetched_at: Instant::now(),
        });
        prompt
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
