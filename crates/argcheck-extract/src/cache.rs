//! Request-scoped artifact cache using moka
//!
//! Holds the structures parsed during one verification call, keyed by
//! `"<artifact-type>:<candidate-id>"`, so every rule reuses one parse.

use argcheck_artifact::{Artifact, ArtifactCandidate, ArtifactType};
use moka::sync::Cache;
use std::any::Any;
use std::sync::Arc;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Parsed artifact cache
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    inner: Cache<String, Arc<dyn Any + Send + Sync>>,
}

impl ArtifactCache {
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Insert artifact under its candidate's key
    pub fn insert<T: ArtifactType>(&self, candidate: &ArtifactCandidate, artifact: Artifact<T>) {
        self.inner
            .insert(Artifact::<T>::cache_key(candidate), Arc::new(artifact));
    }

    /// Get artifact parsed from a candidate
    #[must_use]
    pub fn get<T: ArtifactType>(&self, candidate: &ArtifactCandidate) -> Option<Artifact<T>> {
        self.inner
            .get(&Artifact::<T>::cache_key(candidate))
            .and_then(|arc| arc.downcast_ref::<Artifact<T>>().cloned())
    }

    /// Get or compute artifact for a candidate
    ///
    /// # Errors
    /// Returns the error of `f`; nothing is cached in that case
    pub fn try_get_or_insert_with<T, E, F>(
        &self,
        candidate: &ArtifactCandidate,
        f: F,
    ) -> Result<Artifact<T>, E>
    where
        T: ArtifactType,
        F: FnOnce() -> Result<T::Content, E>,
    {
        if let Some(cached) = self.get::<T>(candidate) {
            return Ok(cached);
        }
        let artifact = Artifact::<T>::from_candidate(candidate, f()?);
        self.insert(candidate, artifact.clone());
        Ok(artifact)
    }

    /// Check if a candidate has a cached artifact of type `T`
    #[inline]
    #[must_use]
    pub fn contains<T: ArtifactType>(&self, candidate: &ArtifactCandidate) -> bool {
        self.inner.contains_key(&Artifact::<T>::cache_key(candidate))
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for ArtifactCache {
    /// Create cache with default capacity (64 entries)
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argcheck_artifact::{
        AnnotationDocument, ArgdownGraph, DataType, Metadata, ParsedGraph, XmlDocument,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn argdown() -> ArtifactCandidate {
        ArtifactCandidate::new(0, DataType::Argdown, "[A]: a.", Metadata::new())
    }

    #[test]
    fn cache_insert_and_get() {
        let cache = ArtifactCache::default();
        let cand = argdown();
        cache.insert(&cand, Artifact::<ArgdownGraph>::from_candidate(&cand, ParsedGraph::new()));
        assert!(cache.get::<ArgdownGraph>(&cand).is_some());
        assert!(cache.contains::<ArgdownGraph>(&cand));
    }

    #[test]
    fn cache_is_type_aware() {
        let cache = ArtifactCache::default();
        let cand = argdown();
        cache.insert(&cand, Artifact::<ArgdownGraph>::from_candidate(&cand, ParsedGraph::new()));
        assert!(cache.get::<XmlDocument>(&cand).is_none());
    }

    #[test]
    fn cache_computes_once() {
        let cache = ArtifactCache::default();
        let cand = argdown();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let artifact = cache
                .try_get_or_insert_with::<ArgdownGraph, (), _>(&cand, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(ParsedGraph::new())
                })
                .unwrap();
            assert_eq!(artifact.source_id(), cand.id());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = ArtifactCache::default();
        let cand = ArtifactCandidate::new(1, DataType::Xml, "<", Metadata::new());
        let first = cache.try_get_or_insert_with::<XmlDocument, &str, _>(&cand, || Err("broken"));
        assert_eq!(first.unwrap_err(), "broken");
        let second = cache
            .try_get_or_insert_with::<XmlDocument, &str, _>(&cand, || Ok(AnnotationDocument::default()));
        assert!(second.is_ok());
    }

    #[test]
    fn cache_stats() {
        let cache = ArtifactCache::default();
        for i in 0..3 {
            let cand = ArtifactCandidate::new(i, DataType::Argdown, "x", Metadata::new());
            cache.insert(&cand, Artifact::<ArgdownGraph>::from_candidate(&cand, ParsedGraph::new()));
        }
        assert_eq!(cache.stats().entry_count, 3);
        cache.invalidate_all();
        let cand = ArtifactCandidate::new(0, DataType::Argdown, "x", Metadata::new());
        assert!(cache.get::<ArgdownGraph>(&cand).is_none());
    }
}
