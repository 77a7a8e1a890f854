//! Client IP extraction for scan events
//!
//! Proxy headers are only believed as far as the trust configuration
//! allows; otherwise the socket address wins. Chains are walked right to
//! left, skipping hops that are known proxies.

use axum::http::HeaderMap;
use ipnet::IpNet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::warn;

use crate::config::{AnalyticsConfig, TrustedProxyMode};

pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: IpAddr,
    config: &AnalyticsConfig,
) -> IpAddr {
    match config.trusted_proxy_mode {
        TrustedProxyMode::Cloudflare => extract_cloudflare_ip(headers).unwrap_or_else(|| {
            warn!("CF-Connecting-IP header missing in Cloudflare mode, using socket address");
            socket_addr
        }),
        TrustedProxyMode::Standard => forwarded_chain(headers)
            .or_else(|| x_forwarded_for_chain(headers))
            .and_then(|chain| pick_from_chain(&chain, config))
            .unwrap_or(socket_addr),
        TrustedProxyMode::None => socket_addr,
    }
}

fn extract_cloudflare_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("cf-connecting-ip")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// `for=` values of an RFC 7239 Forwarded header, in hop order.
fn forwarded_chain(headers: &HeaderMap) -> Option<Vec<IpAddr>> {
    let forwarded = headers.get("forwarded")?.to_str().ok()?;
    let chain: Vec<IpAddr> = forwarded
        .split(',')
        .flat_map(|element| element.split(';'))
        .filter_map(|param| {
            let param = param.trim();
            let (key, value) = param.split_once('=')?;
            if !key.eq_ignore_ascii_case("for") {
                return None;
            }
            parse_node(value.trim().trim_matches('"'))
        })
        .collect();
    (!chain.is_empty()).then_some(chain)
}

/// Node forms: `1.2.3.4`, `1.2.3.4:80`, `[2001:db8::1]`, `[2001:db8::1]:80`.
fn parse_node(node: &str) -> Option<IpAddr> {
    if let Some(rest) = node.strip_prefix('[') {
        let (addr, _) = rest.split_once(']')?;
        return addr.parse().ok();
    }
    if let Ok(ip) = node.parse() {
        return Some(ip);
    }
    let (addr, _port) = node.rsplit_once(':')?;
    addr.parse().ok()
}

fn x_forwarded_for_chain(headers: &HeaderMap) -> Option<Vec<IpAddr>> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;
    let chain: Vec<IpAddr> = xff
        .split(',')
        .filter_map(|s| s.trim().parse::<IpAddr>().ok())
        .collect();
    (!chain.is_empty()).then_some(chain)
}

fn is_trusted(ip: &IpAddr, proxies: &[IpNet]) -> bool {
    proxies.iter().any(|net| net.contains(ip))
}

fn pick_from_chain(chain: &[IpAddr], config: &AnalyticsConfig) -> Option<IpAddr> {
    if let Some(hops) = config.num_trusted_proxies {
        return if chain.len() > hops {
            Some(chain[chain.len() - hops - 1])
        } else {
            chain.first().copied()
        };
    }

    if !config.trusted_proxies.is_empty() {
        // rightmost hop that is not one of ours; all trusted means the leftmost is the client
        return chain
            .iter()
            .rev()
            .find(|ip| !is_trusted(ip, &config.trusted_proxies))
            .or_else(|| chain.first())
            .copied();
    }

    chain.last().copied()
}

/// Truncate to /24 (IPv4) or /48 (IPv6).
pub fn anonymize_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(addr) => {
            let [a, b, c, _] = addr.octets();
            IpAddr::V4(Ipv4Addr::new(a, b, c, 0))
        }
        IpAddr::V6(addr) => {
            let s = addr.segments();
            IpAddr::V6(Ipv6Addr::new(s[0], s[1], s[2], 0, 0, 0, 0, 0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn create_config(mode: TrustedProxyMode) -> AnalyticsConfig {
        AnalyticsConfig {
            trusted_proxy_mode: mode,
            ..AnalyticsConfig::default()
        }
    }

    fn socket() -> IpAddr {
        "192.168.1.1".parse().unwrap()
    }

    #[test]
    fn test_none_mode_ignores_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.1"));
        let config = create_config(TrustedProxyMode::None);
        assert_eq!(extract_client_ip(&headers, socket(), &config), socket());
    }

    #[test]
    fn test_cloudflare_header() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.1"));
        let config = create_config(TrustedProxyMode::Cloudflare);
        assert_eq!(
            extract_client_ip(&headers, socket(), &config),
            "203.0.113.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_x_forwarded_for_without_trust_list_takes_rightmost() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 198.51.100.1"),
        );
        let config = create_config(TrustedProxyMode::Standard);
        assert_eq!(
            extract_client_ip(&headers, socket(), &config),
            "198.51.100.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_trusted_cidrs_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.1.2.3, 10.9.9.9"),
        );
        let mut config = create_config(TrustedProxyMode::Standard);
        config.trusted_proxies = vec!["10.0.0.0/8".parse().unwrap()];
        assert_eq!(
            extract_client_ip(&headers, socket(), &config),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_hop_count() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 198.51.100.1, 10.0.0.1"),
        );
        let mut config = create_config(TrustedProxyMode::Standard);
        config.num_trusted_proxies = Some(1);
        assert_eq!(
            extract_client_ip(&headers, socket(), &config),
            "198.51.100.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_forwarded_header_forms() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "forwarded",
            HeaderValue::from_static(r#"for="[2001:db8::1]:4711";proto=https, for=10.0.0.1"#),
        );
        let mut config = create_config(TrustedProxyMode::Standard);
        config.trusted_proxies = vec!["10.0.0.0/8".parse().unwrap()];
        assert_eq!(
            extract_client_ip(&headers, socket(), &config),
            "2001:db8::1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(parse_node("192.0.2.60:8080"), "192.0.2.60".parse().ok());
    }

    #[test]
    fn test_anonymize() {
        assert_eq!(
            anonymize_ip("192.168.1.100".parse().unwrap()),
            "192.168.1.0".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            anonymize_ip("2001:db8::1234:5678".parse().unwrap()),
            "2001:db8::".parse::<IpAddr>().unwrap()
        );
    }
}
