use crate::error::FetchError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Classify a resolved address against the reserved ranges from
/// `spec.md` §4.6: RFC 1918 private space, loopback, link-local, shared
/// CGNAT (`100.64.0.0/10`), and IPv6 unique-local (`fc00::/7`) all map to
/// the `private_ip` reason, except loopback and link-local, which get
/// their own distinct reasons.
pub fn check_address(addr: IpAddr) -> Result<(), FetchError> {
    match addr {
        IpAddr::V4(v4) => check_v4(v4),
        IpAddr::V6(v6) => check_v6(v6),
    }
}

fn check_v4(addr: Ipv4Addr) -> Result<(), FetchError> {
    if addr.is_loopback() {
        return Err(FetchError::Loopback(addr.to_string()));
    }
    if addr.is_link_local() {
        return Err(FetchError::LinkLocal(addr.to_string()));
    }
    if is_rfc1918(addr) || is_cgnat(addr) || addr.is_unspecified() {
        return Err(FetchError::PrivateIp(addr.to_string()));
    }
    Ok(())
}

fn check_v6(addr: Ipv6Addr) -> Result<(), FetchError> {
    if addr.is_loopback() {
        return Err(FetchError::Loopback(addr.to_string()));
    }
    if is_v6_link_local(addr) {
        return Err(FetchError::LinkLocal(addr.to_string()));
    }
    if is_unique_local(addr) || addr.is_unspecified() {
        return Err(FetchError::PrivateIp(addr.to_string()));
    }
    if let Some(mapped) = addr.to_ipv4_mapped() {
        return check_v4(mapped);
    }
    Ok(())
}

/// RFC 1918: 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16.
fn is_rfc1918(addr: Ipv4Addr) -> bool {
    let o = addr.octets();
    o[0] == 10 || (o[0] == 172 && (16..=31).contains(&o[1])) || (o[0] == 192 && o[1] == 168)
}

/// Shared/CGNAT space: 100.64.0.0/10.
fn is_cgnat(addr: Ipv4Addr) -> bool {
    let o = addr.octets();
    o[0] == 100 && (64..=127).contains(&o[1])
}

/// IPv6 link-local: fe80::/10.
fn is_v6_link_local(addr: Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}

/// IPv6 unique-local: fc00::/7.
fn is_unique_local(addr: Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xfe00) == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_rfc1918_private_space() {
        let addr: IpAddr = "10.0.0.7".parse().unwrap();
        assert_eq!(
            check_address(addr).unwrap_err(),
            FetchError::PrivateIp("10.0.0.7".to_string())
        );
        let addr: IpAddr = "192.168.1.1".parse().unwrap();
        assert!(check_address(addr).is_err());
        let addr: IpAddr = "172.20.0.1".parse().unwrap();
        assert!(check_address(addr).is_err());
    }

    #[test]
    fn rejects_loopback() {
        let addr: IpAddr = "127.0.0.1".parse().unwrap();
        assert_eq!(
            check_address(addr).unwrap_err(),
            FetchError::Loopback("127.0.0.1".to_string())
        );
        let addr: IpAddr = "::1".parse().unwrap();
        assert!(matches!(check_address(addr), Err(FetchError::Loopback(_))));
    }

    #[test]
    fn rejects_link_local() {
        let addr: IpAddr = "169.254.1.1".parse().unwrap();
        assert!(matches!(check_address(addr), Err(FetchError::LinkLocal(_))));
        let addr: IpAddr = "fe80::1".parse().unwrap();
        assert!(matches!(check_address(addr), Err(FetchError::LinkLocal(_))));
    }

    #[test]
    fn rejects_cgnat_and_unique_local() {
        let addr: IpAddr = "100.64.0.1".parse().unwrap();
        assert!(matches!(check_address(addr), Err(FetchError::PrivateIp(_))));
        let addr: IpAddr = "fc00::1".parse().unwrap();
        assert!(matches!(check_address(addr), Err(FetchError::PrivateIp(_))));
    }

    #[test]
    fn accepts_public_addresses() {
        let addr: IpAddr = "93.184.216.34".parse().unwrap();
        assert!(check_address(addr).is_ok());
        let addr: IpAddr = "2606:2800:220:1:248:1893:25c8:1946".parse().unwrap();
        assert!(check_address(addr).is_ok());
    }
}
