use crate::error::KeyError;
use crate::types::{CacheConfig, ResolvedKey};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex as AsyncMutex;

/// Conditional-revalidation headers carried forward from a previous
/// fetch, handed to the fetch closure so it can send `If-None-Match`
/// and `If-Modified-Since` (`spec.md` §4.7).
#[derive(Clone, Debug, Default)]
pub struct ConditionalInfo {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// A freshly fetched key set, as the fetch closure returns it: the
/// parsed keys plus everything the cache needs to revalidate and
/// digest it.
pub struct FetchedKeySet {
    pub keys: Vec<ResolvedKey>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub raw_body: Vec<u8>,
}

/// What the fetch closure observed: a changed key set, or a `304` that
/// only refreshes the cache's freshness timer.
pub enum FetchOutcome {
    Modified(FetchedKeySet),
    NotModified,
}

/// A resolved key, plus the raw-body digest when (and only when) this
/// call triggered a genuine fetch rather than serving a cache hit or a
/// `304` revalidation.
pub struct Resolved {
    pub key: ResolvedKey,
    pub jwks_digest: Option<String>,
}

struct PositiveEntry {
    keys: Vec<ResolvedKey>,
    thumbprints: HashSet<String>,
    etag: Option<String>,
    last_modified: Option<String>,
    expires_at: DateTime<Utc>,
}

struct NegativeEntry {
    expires_at: DateTime<Utc>,
}

/// TTL-bounded, LRU-evicted positive/negative key-set cache with
/// per-origin singleflight, matching the `Arc<Inner>` + `RwLock<HashMap<_>>`
/// shape used elsewhere in this codebase for shared mutable lookup
/// tables. Cached per `jwks_uri` (one entry holds a whole key set, not
/// one key per `kid`), so the TOFU rotation invariant can compare
/// complete thumbprint sets across fetches.
pub struct KeyCache {
    inner: Arc<KeyCacheInner>,
    config: CacheConfig,
}

struct KeyCacheInner {
    positive: RwLock<HashMap<String, PositiveEntry>>,
    positive_order: RwLock<VecDeque<String>>,
    negative: RwLock<HashMap<String, NegativeEntry>>,
    negative_order: RwLock<VecDeque<String>>,
    inflight: RwLock<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Clone for KeyCache {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config,
        }
    }
}

impl KeyCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(KeyCacheInner {
                positive: RwLock::new(HashMap::new()),
                positive_order: RwLock::new(VecDeque::new()),
                negative: RwLock::new(HashMap::new()),
                negative_order: RwLock::new(VecDeque::new()),
                inflight: RwLock::new(HashMap::new()),
            }),
            config,
        }
    }

    fn get_positive(&self, jwks_uri: &str) -> Option<(Vec<ResolvedKey>, HashSet<String>)> {
        let guard = self.inner.positive.read().ok()?;
        let entry = guard.get(jwks_uri)?;
        if entry.expires_at > Utc::now() {
            Some((entry.keys.clone(), entry.thumbprints.clone()))
        } else {
            None
        }
    }

    /// The key set currently cached for `jwks_uri`, regardless of TTL
    /// freshness -- used both for conditional-request headers and for
    /// the rotation invariant, which must compare against the last
    /// trusted set even if its freshness timer has lapsed.
    fn stale_entry(&self, jwks_uri: &str) -> Option<(ConditionalInfo, HashSet<String>)> {
        let guard = self.inner.positive.read().ok()?;
        let entry = guard.get(jwks_uri)?;
        Some((
            ConditionalInfo {
                etag: entry.etag.clone(),
                last_modified: entry.last_modified.clone(),
            },
            entry.thumbprints.clone(),
        ))
    }

    fn is_negative_cached(&self, jwks_uri: &str) -> bool {
        let Ok(guard) = self.inner.negative.read() else {
            return false;
        };
        guard.get(jwks_uri).map(|entry| entry.expires_at > Utc::now()).unwrap_or(false)
    }

    fn touch_order(order: &RwLock<VecDeque<String>>, key: &str) {
        if let Ok(mut guard) = order.write() {
            guard.retain(|k| k != key);
            guard.push_back(key.to_string());
        }
    }

    fn evict_oldest<V>(map: &RwLock<HashMap<String, V>>, order: &RwLock<VecDeque<String>>, max_entries: usize) {
        loop {
            let over = map.read().map(|g| g.len() > max_entries).unwrap_or(false);
            if !over {
                break;
            }
            let oldest = order.write().ok().and_then(|mut o| o.pop_front());
            match oldest {
                Some(key) => {
                    if let Ok(mut m) = map.write() {
                        m.remove(&key);
                    }
                }
                None => break,
            }
        }
    }

    fn put_positive(
        &self,
        jwks_uri: &str,
        keys: Vec<ResolvedKey>,
        thumbprints: HashSet<String>,
        etag: Option<String>,
        last_modified: Option<String>,
    ) {
        if let Ok(mut guard) = self.inner.positive.write() {
            guard.insert(
                jwks_uri.to_string(),
                PositiveEntry {
                    keys,
                    thumbprints,
                    etag,
                    last_modified,
                    expires_at: Utc::now() + Duration::seconds(self.config.positive_ttl_secs as i64),
                },
            );
        }
        Self::touch_order(&self.inner.positive_order, jwks_uri);
        Self::evict_oldest(&self.inner.positive, &self.inner.positive_order, self.config.max_entries);
    }

    fn refresh_positive_ttl(&self, jwks_uri: &str) {
        if let Ok(mut guard) = self.inner.positive.write() {
            if let Some(entry) = guard.get_mut(jwks_uri) {
                entry.expires_at = Utc::now() + Duration::seconds(self.config.positive_ttl_secs as i64);
            }
        }
        Self::touch_order(&self.inner.positive_order, jwks_uri);
    }

    fn put_negative(&self, jwks_uri: &str) {
        let jitter = rand::thread_rng().gen_range(0..=self.config.negative_ttl_jitter_secs.max(1));
        let ttl = self.config.negative_ttl_secs + jitter;
        if let Ok(mut guard) = self.inner.negative.write() {
            guard.insert(
                jwks_uri.to_string(),
                NegativeEntry {
                    expires_at: Utc::now() + Duration::seconds(ttl as i64),
                },
            );
        }
        Self::touch_order(&self.inner.negative_order, jwks_uri);
        Self::evict_oldest(&self.inner.negative, &self.inner.negative_order, self.config.max_entries);
    }

    fn singleflight_lock(&self, jwks_uri: &str) -> Arc<AsyncMutex<()>> {
        let mut guard = self.inner.inflight.write().expect("inflight lock poisoned");
        guard
            .entry(jwks_uri.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Resolve `kid` from the key set at `jwks_uri`, consulting the
    /// positive and negative caches first and otherwise running `fetch`
    /// behind a per-origin singleflight lock so concurrent callers for
    /// the same origin share one network round trip. `fetch` receives
    /// conditional-revalidation headers from any stale cached entry and
    /// returns [`FetchOutcome::NotModified`] on a `304`.
    ///
    /// A freshly fetched set whose thumbprints are entirely disjoint
    /// from the previously cached set fails closed with
    /// [`KeyError::KeysetJump`] -- trust-on-first-use pinning only ever
    /// narrows, never silently replaces, a trusted key set.
    pub async fn resolve<F, Fut>(&self, jwks_uri: &str, kid: &str, fetch: F) -> Result<Resolved, KeyError>
    where
        F: FnOnce(Option<ConditionalInfo>) -> Fut,
        Fut: std::future::Future<Output = Result<FetchOutcome, KeyError>>,
    {
        if let Some((keys, _)) = self.get_positive(jwks_uri) {
            return select_kid(keys, kid, None);
        }
        if self.is_negative_cached(jwks_uri) {
            return Err(KeyError::NegativeCached);
        }

        let lock = self.singleflight_lock(jwks_uri);
        let _permit = lock.lock().await;

        // Re-check: another caller may have populated the cache while we
        // waited for the singleflight permit.
        if let Some((keys, _)) = self.get_positive(jwks_uri) {
            return select_kid(keys, kid, None);
        }
        if self.is_negative_cached(jwks_uri) {
            return Err(KeyError::NegativeCached);
        }

        let stale = self.stale_entry(jwks_uri);
        let conditional = stale.as_ref().map(|(c, _)| c.clone());
        let previous_thumbprints = stale.map(|(_, t)| t);

        match fetch(conditional).await {
            Ok(FetchOutcome::NotModified) => {
                self.refresh_positive_ttl(jwks_uri);
                let Some((keys, _)) = self.get_positive_ignoring_ttl(jwks_uri) else {
                    return Err(KeyError::NegativeCached);
                };
                select_kid(keys, kid, None)
            }
            Ok(FetchOutcome::Modified(fetched)) => {
                let new_thumbprints: HashSet<String> = fetched.keys.iter().map(|k| k.thumbprint.clone()).collect();
                if let Some(previous) = previous_thumbprints {
                    if !previous.is_empty() && new_thumbprints.is_disjoint(&previous) {
                        return Err(KeyError::KeysetJump);
                    }
                }
                let digest = digest_body(&fetched.raw_body);
                self.put_positive(
                    jwks_uri,
                    fetched.keys.clone(),
                    new_thumbprints,
                    fetched.etag,
                    fetched.last_modified,
                );
                select_kid(fetched.keys, kid, Some(digest))
            }
            Err(err) => {
                self.put_negative(jwks_uri);
                Err(err)
            }
        }
    }

    fn get_positive_ignoring_ttl(&self, jwks_uri: &str) -> Option<(Vec<ResolvedKey>, HashSet<String>)> {
        let guard = self.inner.positive.read().ok()?;
        let entry = guard.get(jwks_uri)?;
        Some((entry.keys.clone(), entry.thumbprints.clone()))
    }
}

fn select_kid(keys: Vec<ResolvedKey>, kid: &str, jwks_digest: Option<String>) -> Result<Resolved, KeyError> {
    keys.into_iter()
        .find(|k| k.kid == kid)
        .map(|key| Resolved { key, jwks_digest })
        .ok_or_else(|| KeyError::KidNotFound(kid.to_string()))
}

fn digest_body(body: &[u8]) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(body);
    format!("sha256:{}", URL_SAFE_NO_PAD.encode(hasher.finalize()))
}
