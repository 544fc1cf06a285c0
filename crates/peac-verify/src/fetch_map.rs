use peac_fetch::FetchError;
use peac_report::Reason;

/// Which check a fetch failure is being mapped into, since the same
/// [`FetchError`] taxonomy backs both discovery/key-set fetches and
/// receipt-pointer fetches but surfaces under a different reason prefix
/// for each (`spec.md` §C6 → C9).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchContext {
    Key,
    Pointer,
}

/// The single documented mapping from SSRF/fetch failures to verification
/// reason codes.
pub fn map_fetch_error(context: FetchContext, err: &FetchError) -> Reason {
    use FetchContext::*;
    use FetchError::*;
    match (context, err) {
        (Key, NotHttps(_))
        | (Key, UserInfoPresent)
        | (Key, PortNotAllowed(_))
        | (Key, PrivateIp(_))
        | (Key, Loopback(_))
        | (Key, LinkLocal(_))
        | (Key, DnsFailure(_))
        | (Key, SchemeDowngrade(_))
        | (Key, CrossOriginRedirect(_)) => Reason::KeyFetchBlocked,
        (Key, Timeout) => Reason::KeyFetchTimeout,
        (Key, ResponseTooLarge(_)) => Reason::JwksTooLarge,
        (Key, InvalidUrl(_)) | (Key, TooManyRedirects(_)) | (Key, NetworkError(_)) => Reason::KeyFetchFailed,

        (Pointer, NotHttps(_))
        | (Pointer, UserInfoPresent)
        | (Pointer, PortNotAllowed(_))
        | (Pointer, PrivateIp(_))
        | (Pointer, Loopback(_))
        | (Pointer, LinkLocal(_))
        | (Pointer, DnsFailure(_))
        | (Pointer, SchemeDowngrade(_))
        | (Pointer, CrossOriginRedirect(_)) => Reason::PointerFetchBlocked,
        (Pointer, Timeout) => Reason::PointerFetchTimeout,
        (Pointer, ResponseTooLarge(_)) => Reason::PointerFetchTooLarge,
        (Pointer, InvalidUrl(_)) | (Pointer, TooManyRedirects(_)) | (Pointer, NetworkError(_)) => {
            Reason::PointerFetchFailed
        }
    }
}
