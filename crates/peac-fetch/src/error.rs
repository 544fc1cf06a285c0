use thiserror::Error;

/// SSRF/fetch failure taxonomy (`spec.md` §4.6). Returned as a sum type,
/// never raised across the API boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL scheme must be https, got '{0}'")]
    NotHttps(String),

    #[error("URL must not carry user-info")]
    UserInfoPresent,

    #[error("port {0} is not in the allow-list")]
    PortNotAllowed(u16),

    #[error("resolved address is in private address space: {0}")]
    PrivateIp(String),

    #[error("resolved address is a loopback address: {0}")]
    Loopback(String),

    #[error("resolved address is link-local: {0}")]
    LinkLocal(String),

    #[error("DNS resolution failed for '{0}'")]
    DnsFailure(String),

    #[error("exceeded max_redirects ({0})")]
    TooManyRedirects(u32),

    #[error("redirect downgraded scheme to non-https: {0}")]
    SchemeDowngrade(String),

    #[error("cross-origin redirect to '{0}' is not permitted")]
    CrossOriginRedirect(String),

    #[error("fetch timed out")]
    Timeout,

    #[error("response exceeded max_bytes ({0})")]
    ResponseTooLarge(usize),

    #[error("network error: {0}")]
    NetworkError(String),
}
