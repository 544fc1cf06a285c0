use crate::cache::{ConditionalInfo, FetchOutcome, FetchedKeySet, KeyCache};
use crate::error::KeyError;
use crate::types::{CacheConfig, JwkSet, KeyPin, KeySource, ResolvedKey};
use peac_crypto::PublicKey;
use peac_fetch::{Conditional, SafeFetcher};

/// The outcome of a key resolution: the key itself, where it came from,
/// and -- only on a genuine fresh fetch, never a cache hit or a `304`
/// revalidation -- a digest of the raw key-set bytes (`spec.md` §4.10's
/// `issuer_jwks_digest`).
pub struct Resolution {
    pub key: ResolvedKey,
    pub source: KeySource,
    pub jwks_digest: Option<String>,
}

/// Resolves a `kid` to a verified public key against an issuer's JWKS
/// endpoint, honoring a pinned raw key or thumbprint (`spec.md` §4.7
/// TOFU override) and caching fetched key sets.
pub struct KeyResolver {
    fetcher: SafeFetcher,
    cache: KeyCache,
    max_keys: usize,
}

impl KeyResolver {
    pub fn new(fetcher: SafeFetcher, cache_config: CacheConfig, max_keys: usize) -> Self {
        Self {
            fetcher,
            cache: KeyCache::new(cache_config),
            max_keys,
        }
    }

    /// Resolve `kid` against `jwks_uri`, following the three-step order
    /// of `spec.md` §4.7:
    ///
    /// 1. A raw pinned JWK resolves directly, with no network access.
    /// 2. A thumbprint-only pin still requires a fetch (gated on
    ///    `network_allowed`); the resolved key's thumbprint must match
    ///    it exactly or resolution fails closed with
    ///    [`KeyError::PinMismatch`] -- a pin can only narrow trust,
    ///    never substitute for a fetch.
    /// 3. With no pin at all, a fetch proceeds if `network_allowed`.
    pub async fn resolve(
        &self,
        jwks_uri: &str,
        kid: &str,
        pin: Option<&KeyPin>,
        network_allowed: bool,
    ) -> Result<Resolution, KeyError> {
        if let Some(KeyPin::Raw(jwk)) = pin {
            let public_key = PublicKey::from_jwk(jwk)?;
            return Ok(Resolution {
                key: ResolvedKey {
                    kid: kid.to_string(),
                    thumbprint: public_key.thumbprint(),
                    public_key,
                },
                source: KeySource::Pinned,
                jwks_digest: None,
            });
        }

        if !network_allowed {
            return Err(KeyError::NetworkNotPermitted);
        }

        let pinned_thumbprint = match pin {
            Some(KeyPin::Thumbprint(tp)) => Some(tp.as_str()),
            _ => None,
        };

        let fetcher = &self.fetcher;
        let max_keys = self.max_keys;
        let jwks_uri_owned = jwks_uri.to_string();

        let resolved = self
            .cache
            .resolve(jwks_uri, kid, move |conditional| {
                let jwks_uri_owned = jwks_uri_owned.clone();
                async move { fetch_and_parse(fetcher, &jwks_uri_owned, max_keys, conditional).await }
            })
            .await?;

        if let Some(expected) = pinned_thumbprint {
            if resolved.key.thumbprint != expected {
                return Err(KeyError::PinMismatch(kid.to_string()));
            }
        }

        Ok(Resolution {
            key: resolved.key,
            source: KeySource::JwksFetch,
            jwks_digest: resolved.jwks_digest,
        })
    }
}

async fn fetch_and_parse(
    fetcher: &SafeFetcher,
    jwks_uri: &str,
    max_keys: usize,
    conditional: Option<ConditionalInfo>,
) -> Result<FetchOutcome, KeyError> {
    let cond = conditional.as_ref().map(|c| Conditional {
        if_none_match: c.etag.as_deref(),
        if_modified_since: c.last_modified.as_deref(),
    });
    let response = fetcher.fetch(jwks_uri, cond).await?;

    if response.status == 304 {
        return Ok(FetchOutcome::NotModified);
    }
    if response.status == 404 || response.status >= 500 {
        return Err(KeyError::HttpStatus(response.status));
    }

    let set: JwkSet =
        serde_json::from_slice(&response.body).map_err(|e| KeyError::InvalidKeySet(e.to_string()))?;
    if set.keys.len() > max_keys {
        return Err(KeyError::TooManyKeys(max_keys));
    }

    let keys = set
        .keys
        .iter()
        .filter(|jwk| jwk.kid.is_some())
        .map(|jwk| {
            let public_key = PublicKey::from_jwk(jwk)?;
            Ok(ResolvedKey {
                kid: jwk.kid.clone().expect("filtered to Some above"),
                thumbprint: public_key.thumbprint(),
                public_key,
            })
        })
        .collect::<Result<Vec<_>, KeyError>>()?;

    Ok(FetchOutcome::Modified(FetchedKeySet {
        keys,
        etag: response.headers.etag,
        last_modified: response.headers.last_modified,
        raw_body: response.body,
    }))
}
