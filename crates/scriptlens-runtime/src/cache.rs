//! Verdict cache.
//!
//! Re-running the same script against the same criteria sends identical
//! prompts. When enabled, successful responses are kept in memory and
//! reused; failures are never cached.

use moka::future::Cache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::log::RequestStage;

/// Cache key for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    stage: RequestStage,
    model: String,
    prompt_hash: u64,
}

impl CacheKey {
    /// The prompt embeds the criterion and the part text, so hashing it
    /// covers both.
    pub fn new(stage: RequestStage, model: &str, prompt: &str) -> Self {
        Self {
            stage,
            model: model.to_string(),
            prompt_hash: hash_prompt(prompt),
        }
    }
}

/// In-memory cache of successful verdict texts.
pub struct VerdictCache {
    cache: Cache<CacheKey, String>,
}

impl VerdictCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, verdict: String) {
        self.cache.insert(key, verdict).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for VerdictCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(3600))
    }
}

fn hash_prompt(prompt: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    prompt.hash(&mut hasher);
    hasher.finish()
}
