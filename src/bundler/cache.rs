//! Compiled module caches with in-flight coalescing.
//!
//! Every key maps to a shared slot. Concurrent requests for one key await
//! the same compile, so at most one compile per key runs at a time. A
//! failed compile leaves the slot empty and the next request retries.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use super::compiler::CompileError;
use crate::debug;

type Slot = Arc<OnceCell<Arc<str>>>;

#[derive(Debug)]
pub struct ModuleCache {
    name: &'static str,
    slots: DashMap<String, Slot>,
    /// Entry point behind each key, for invalidation by path.
    sources: DashMap<String, PathBuf>,
}

impl ModuleCache {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: DashMap::new(),
            sources: DashMap::new(),
        }
    }

    /// Cached body for `key`, compiling it on first use.
    pub async fn get_or_compile<F, Fut>(
        &self,
        key: &str,
        source: &Path,
        compile: F,
    ) -> Result<Arc<str>, CompileError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, CompileError>>,
    {
        let slot = self.slot(key);
        self.sources.insert(key.to_string(), source.to_path_buf());

        if slot.initialized() {
            debug!("bundle"; "{} cache hit: {}", self.name, key);
        }
        let body = slot
            .get_or_try_init(|| async { compile().await.map(Arc::from) })
            .await?;
        Ok(Arc::clone(body))
    }

    /// Share one compile between concurrent callers without keeping the
    /// result. The next call after completion compiles again.
    pub async fn coalesce<F, Fut>(&self, key: &str, compile: F) -> Result<Arc<str>, CompileError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, CompileError>>,
    {
        let slot = self.slot(key);
        let result = slot
            .get_or_try_init(|| async { compile().await.map(Arc::from) })
            .await
            .map(Arc::clone);
        self.slots.remove_if(key, |_, current| Arc::ptr_eq(current, &slot));
        result
    }

    fn slot(&self, key: &str) -> Slot {
        Arc::clone(self.slots.entry(key.to_string()).or_default().value())
    }

    /// Drop every entry compiled from `source`. Returns how many were dropped.
    pub fn invalidate(&self, source: &Path) -> usize {
        let keys: Vec<String> = self
            .sources
            .iter()
            .filter(|e| e.value() == source)
            .map(|e| e.key().clone())
            .collect();
        for key in &keys {
            self.sources.remove(key);
            self.slots.remove(key);
        }
        keys.len()
    }

    pub fn invalidate_all(&self) {
        self.slots.clear();
        self.sources.clear();
    }

    /// Number of compiled bodies held.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|e| e.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting(calls: &AtomicUsize, body: &'static str) -> impl Future<Output = Result<String, CompileError>> {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(body.to_string())
        }
    }

    #[tokio::test]
    async fn test_cached_after_first_compile() {
        let cache = ModuleCache::new("component");
        let calls = AtomicUsize::new(0);
        let source = Path::new("/app/components/button.js");

        let a = cache
            .get_or_compile("button", source, || counting(&calls, "a"))
            .await
            .unwrap();
        let b = cache
            .get_or_compile("button", source, || counting(&calls, "b"))
            .await
            .unwrap();

        assert_eq!(&*a, "a");
        assert_eq!(&*b, "a");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_compile() {
        let cache = ModuleCache::new("module");
        let calls = AtomicUsize::new(0);
        let source = Path::new("/app/node_modules/lit/index.js");

        let (a, b, c) = tokio::join!(
            cache.get_or_compile("lit", source, || counting(&calls, "lit")),
            cache.get_or_compile("lit", source, || counting(&calls, "lit")),
            cache.get_or_compile("lit", source, || counting(&calls, "lit")),
        );

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = ModuleCache::new("component");
        let source = Path::new("/app/components/card.js");

        let err = cache
            .get_or_compile("card", source, || async {
                Err(CompileError::InvalidOutput("boom".into()))
            })
            .await;
        assert!(err.is_err());
        assert!(cache.is_empty());

        let ok = cache
            .get_or_compile("card", source, || async { Ok("card".to_string()) })
            .await
            .unwrap();
        assert_eq!(&*ok, "card");
    }

    #[tokio::test]
    async fn test_invalidate_by_source() {
        let cache = ModuleCache::new("component");
        let button = Path::new("/app/components/button.js");
        let card = Path::new("/app/components/card.js");
        for (key, source) in [("button", button), ("card", card)] {
            cache
                .get_or_compile(key, source, || async { Ok(key.to_string()) })
                .await
                .unwrap();
        }

        assert_eq!(cache.invalidate(button), 1);
        assert_eq!(cache.invalidate(button), 0);
        assert_eq!(cache.len(), 1);

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_coalesce_does_not_keep_result() {
        let cache = ModuleCache::new("page");
        let calls = AtomicUsize::new(0);

        let (a, b) = tokio::join!(
            cache.coalesce("abcd@1", || counting(&calls, "page")),
            cache.coalesce("abcd@1", || counting(&calls, "page")),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_empty());

        cache
            .coalesce("abcd@1", || counting(&calls, "page"))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
