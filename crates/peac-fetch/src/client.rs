use crate::capability::RuntimeCapability;
use crate::error::FetchError;
use crate::ip_guard;
use crate::limits::{DnsFailureBehavior, FetchLimits};
use futures::StreamExt;
use std::time::Duration;
use url::Url;

/// Response headers the core is allowed to consume (`spec.md` §6.2).
#[derive(Clone, Debug, Default)]
pub struct FetchHeaders {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// A successfully fetched, size- and scheme-checked response.
#[derive(Clone, Debug)]
pub struct FetchedResponse {
    pub final_url: String,
    pub status: u16,
    pub headers: FetchHeaders,
    pub body: Vec<u8>,
}

/// SSRF-hardened fetcher for discovery documents and JSON key sets.
pub struct SafeFetcher {
    capability: RuntimeCapability,
    limits: FetchLimits,
    client: reqwest::Client,
}

impl SafeFetcher {
    /// Build a fetcher, probing the runtime's DNS capability.
    pub fn new(limits: FetchLimits) -> Result<Self, FetchError> {
        Self::with_capability(RuntimeCapability::probe(), limits)
    }

    /// Build a fetcher with an explicit capability override, for runtimes
    /// where the probe is unreliable.
    pub fn with_capability(
        capability: RuntimeCapability,
        limits: FetchLimits,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_millis(limits.fetch_timeout_ms))
            .build()
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;
        Ok(Self {
            capability,
            limits,
            client,
        })
    }

    pub fn capability(&self) -> RuntimeCapability {
        self.capability
    }

    /// Fetch `url`, enforcing every invariant in `spec.md` §4.6: HTTPS
    /// only, no user-info, allow-listed port, manually policed redirects,
    /// scheme-downgrade and cross-origin-redirect rejection, a byte-capped
    /// streamed read, and (where the runtime permits) pre-resolved IP
    /// filtering.
    pub async fn fetch(
        &self,
        url: &str,
        conditional: Option<Conditional<'_>>,
    ) -> Result<FetchedResponse, FetchError> {
        let mut current = self.validate_url(url)?;
        let origin = (current.scheme().to_string(), current.host_str().map(str::to_string));

        for redirect_count in 0..=self.limits.max_redirects {
            self.check_address_space(&current).await?;

            let mut request = self.client.get(current.clone());
            if let Some(cond) = &conditional {
                if let Some(etag) = cond.if_none_match {
                    request = request.header("If-None-Match", etag);
                }
                if let Some(modified) = cond.if_modified_since {
                    request = request.header("If-Modified-Since", modified);
                }
            }

            let response = request.send().await.map_err(map_reqwest_error)?;
            let status = response.status();

            if status.is_redirection() {
                if redirect_count >= self.limits.max_redirects {
                    return Err(FetchError::TooManyRedirects(self.limits.max_redirects));
                }
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| FetchError::InvalidUrl("redirect missing Location".into()))?;
                let next = current
                    .join(location)
                    .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
                if next.scheme() != "https" {
                    return Err(FetchError::SchemeDowngrade(next.to_string()));
                }
                let same_origin = next.scheme() == origin.0 && next.host_str().map(str::to_string) == origin.1;
                if !same_origin && !self.limits.allow_cross_origin_redirects {
                    return Err(FetchError::CrossOriginRedirect(next.to_string()));
                }
                current = self.validate_url(next.as_str())?;
                continue;
            }

            return self.read_body(current.as_str(), status.as_u16(), response).await;
        }

        Err(FetchError::TooManyRedirects(self.limits.max_redirects))
    }

    /// Parse and check the universal, always-enforced invariants: valid
    /// https URL, no user-info, allow-listed port.
    fn validate_url(&self, url: &str) -> Result<Url, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if parsed.scheme() != "https" {
            return Err(FetchError::NotHttps(parsed.scheme().to_string()));
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(FetchError::UserInfoPresent);
        }
        let port = parsed.port_or_known_default().unwrap_or(443);
        if !self.limits.allowed_ports.contains(&port) {
            return Err(FetchError::PortNotAllowed(port));
        }
        Ok(parsed)
    }

    /// Pre-resolve and filter reserved address space when the runtime
    /// supports it; otherwise rely on URL-level checks alone.
    async fn check_address_space(&self, url: &Url) -> Result<(), FetchError> {
        if self.capability != RuntimeCapability::FullDnsPreresolution {
            return Ok(());
        }
        let host = url
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl("missing host".into()))?;
        let port = url.port_or_known_default().unwrap_or(443);

        match tokio::net::lookup_host((host, port)).await {
            Ok(addrs) => {
                for addr in addrs {
                    ip_guard::check_address(addr.ip())?;
                }
                Ok(())
            }
            Err(e) => match self.limits.dns_failure_behavior {
                DnsFailureBehavior::Block => Err(FetchError::DnsFailure(host.to_string())),
                DnsFailureBehavior::Fail => Err(FetchError::NetworkError(e.to_string())),
            },
        }
    }

    async fn read_body(
        &self,
        final_url: &str,
        status: u16,
        response: reqwest::Response,
    ) -> Result<FetchedResponse, FetchError> {
        let headers = FetchHeaders {
            etag: header_str(&response, reqwest::header::ETAG),
            last_modified: header_str(&response, reqwest::header::LAST_MODIFIED),
            content_type: header_str(&response, reqwest::header::CONTENT_TYPE),
            content_length: response
                .headers()
                .get(reqwest::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok()),
        };

        let max_bytes = self.limits.max_bytes;
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            body.extend_from_slice(&chunk);
            if body.len() > max_bytes {
                return Err(FetchError::ResponseTooLarge(max_bytes));
            }
        }

        Ok(FetchedResponse {
            final_url: final_url.to_string(),
            status,
            headers,
            body,
        })
    }
}

/// Conditional-request headers for cache revalidation (`spec.md` §4.7).
pub struct Conditional<'a> {
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
}

fn header_str(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::NetworkError(e.to_string())
    }
}
