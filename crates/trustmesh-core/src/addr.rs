//! Endpoint addresses.
//!
//! [`AddrPort`] is an IPv4 or IPv6 address plus a port. IPv6 addresses may
//! carry a zone (`[fe80::1%eth0]:8443`). The default value is the empty
//! address: it prints as `""`, serializes as `""` in JSON and YAML, and an
//! empty string parses back into it.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV6};
use std::ops::Deref;
use std::str::FromStr;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AddrParseError;

/// An `ip:port` endpoint, or the empty address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AddrPort {
    ip: Option<IpAddr>,
    port: u16,
    /// Only ever set for IPv6 addresses.
    zone: Option<String>,
}

impl AddrPort {
    /// Create an endpoint from an address and port, without a zone.
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self {
            ip: Some(ip),
            port,
            zone: None,
        }
    }

    /// Parse `a.b.c.d:port` or `[ipv6%zone]:port`.
    ///
    /// The port is any run of decimal digits whose value fits in 16 bits, so
    /// `1.2.3.4:000080` is port 80. The empty string parses to the empty
    /// address.
    pub fn parse(s: &str) -> Result<Self, AddrParseError> {
        if s.is_empty() {
            return Ok(Self::default());
        }

        let err = |reason| AddrParseError::new(s, reason);

        if let Some(rest) = s.strip_prefix('[') {
            let (host, port) = rest
                .split_once("]:")
                .ok_or_else(|| err("expected ']:' after IPv6 address"))?;
            let port = parse_port(port).ok_or_else(|| err("invalid port"))?;

            let (host, zone) = match host.split_once('%') {
                Some((_, "")) => return Err(err("empty zone")),
                Some((host, zone)) => (host, Some(zone.to_string())),
                None => (host, None),
            };
            let ip: Ipv6Addr = host.parse().map_err(|_| err("invalid IPv6 address"))?;

            return Ok(Self {
                ip: Some(IpAddr::V6(ip)),
                port,
                zone,
            });
        }

        let (host, port) = s.rsplit_once(':').ok_or_else(|| err("missing port"))?;
        if host.contains(':') {
            return Err(err("IPv6 address must be enclosed in brackets"));
        }
        if host.contains('%') {
            return Err(err("IPv4 address cannot have a zone"));
        }
        let port = parse_port(port).ok_or_else(|| err("invalid port"))?;
        let ip: Ipv4Addr = host.parse().map_err(|_| err("invalid IPv4 address"))?;

        Ok(Self::new(IpAddr::V4(ip), port))
    }

    /// Whether this is the empty address.
    pub fn is_empty(&self) -> bool {
        self.ip.is_none()
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// Return a copy with the IPv6 zone replaced. An empty zone removes it.
    ///
    /// IPv4 and empty addresses are returned unchanged.
    pub fn with_zone(&self, zone: &str) -> Self {
        match self.ip {
            Some(IpAddr::V6(_)) => Self {
                zone: (!zone.is_empty()).then(|| zone.to_string()),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// Convert to a socket address for connecting.
    ///
    /// A numeric zone becomes the IPv6 scope id. `None` for the empty
    /// address and for a zone naming an interface, which has no scope id
    /// until resolved.
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        let addr = match self.ip? {
            IpAddr::V4(ip) => SocketAddr::new(IpAddr::V4(ip), self.port),
            IpAddr::V6(ip) => {
                let scope_id = match self.zone.as_deref() {
                    Some(zone) => zone.parse().ok()?,
                    None => 0,
                };
                SocketAddr::V6(SocketAddrV6::new(ip, self.port, 0, scope_id))
            }
        };
        Some(addr)
    }
}

/// Port numbers are one or more ASCII digits with a value below 65536.
fn parse_port(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for AddrPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ip, &self.zone) {
            (None, _) => Ok(()),
            (Some(IpAddr::V4(ip)), _) => write!(f, "{ip}:{}", self.port),
            (Some(IpAddr::V6(ip)), Some(zone)) => write!(f, "[{ip}%{zone}]:{}", self.port),
            (Some(IpAddr::V6(ip)), None) => write!(f, "[{ip}]:{}", self.port),
        }
    }
}

impl FromStr for AddrPort {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<SocketAddr> for AddrPort {
    fn from(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(v4) => Self::new(IpAddr::V4(*v4.ip()), v4.port()),
            SocketAddr::V6(v6) => Self {
                ip: Some(IpAddr::V6(*v6.ip())),
                port: v6.port(),
                zone: (v6.scope_id() != 0).then(|| v6.scope_id().to_string()),
            },
        }
    }
}

impl Serialize for AddrPort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AddrPort {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A bare `address:` in hand-edited YAML decodes as null.
        let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A list of endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddrPorts(Vec<AddrPort>);

impl AddrPorts {
    /// Parse every string, failing on the first invalid one.
    pub fn parse<S: AsRef<str>>(items: &[S]) -> Result<Self, AddrParseError> {
        items
            .iter()
            .map(|s| AddrPort::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Canonical string form of each endpoint.
    pub fn strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Pick one endpoint uniformly at random. `None` if the list is empty.
    pub fn select_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&AddrPort> {
        self.0.choose(rng)
    }

    pub fn into_inner(self) -> Vec<AddrPort> {
        self.0
    }
}

impl Deref for AddrPorts {
    type Target = [AddrPort];

    fn deref(&self) -> &[AddrPort] {
        &self.0
    }
}

impl From<Vec<AddrPort>> for AddrPorts {
    fn from(addrs: Vec<AddrPort>) -> Self {
        Self(addrs)
    }
}

impl FromIterator<AddrPort> for AddrPorts {
    fn from_iter<I: IntoIterator<Item = AddrPort>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for AddrPorts {
    type Item = AddrPort;
    type IntoIter = std::vec::IntoIter<AddrPort>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn empty_string_is_empty_address() {
        let addr = AddrPort::parse("").unwrap();
        assert_eq!(addr, AddrPort::default());
        assert!(addr.is_empty());
        assert_eq!(addr.to_string(), "");
        assert!(addr.to_socket_addr().is_none());
    }

    #[test]
    fn parses_ipv4() {
        let addr = AddrPort::parse("10.0.0.1:8443").unwrap();
        assert_eq!(addr.ip(), Some("10.0.0.1".parse().unwrap()));
        assert_eq!(addr.port(), 8443);
        assert_eq!(addr.zone(), None);
        assert_eq!(addr.to_string(), "10.0.0.1:8443");
    }

    #[test]
    fn parses_ipv6_and_canonicalizes() {
        let addr = AddrPort::parse("[2001:db8:0:0:0:0:0:1]:443").unwrap();
        assert_eq!(addr.to_string(), "[2001:db8::1]:443");
    }

    #[test]
    fn parses_ipv6_zone() {
        let addr = AddrPort::parse("[fe80::1%eth0]:7000").unwrap();
        assert_eq!(addr.zone(), Some("eth0"));
        assert_eq!(addr.to_string(), "[fe80::1%eth0]:7000");
    }

    #[test]
    fn canonical_strings_round_trip() {
        for s in [
            "127.0.0.1:0",
            "192.168.1.100:65535",
            "[::1]:8443",
            "[::ffff:10.0.0.1]:80",
            "[fe80::abcd%2]:9000",
        ] {
            assert_eq!(AddrPort::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn rejects_malformed_input() {
        for s in [
            "10.0.0.1",
            "10.0.0.1:",
            "10.0.0.1:65536",
            "10.0.0.1:0000065536",
            "10.0.0.1:+80",
            "10.0.0.1:http",
            "10.0.0.1%eth0:80",
            "::1:80",
            "[::1]",
            "[::1]80",
            "[fe80::1%]:80",
            "[10.0.0.1]:80",
            "example.com:443",
            "300.0.0.1:80",
            ":80",
        ] {
            let err = AddrPort::parse(s).unwrap_err();
            assert_eq!(err.input(), s);
        }
    }

    #[test]
    fn leading_zeros_in_port_are_accepted() {
        let addr = AddrPort::parse("1.2.3.4:000080").unwrap();
        assert_eq!(addr.port(), 80);
        assert_eq!(addr.to_string(), "1.2.3.4:80");
        assert_eq!(AddrPort::parse("[::1]:0008443").unwrap().port(), 8443);
    }

    #[test]
    fn with_zone_replaces_and_removes() {
        let addr = AddrPort::parse("[fe80::1]:80").unwrap();
        let zoned = addr.with_zone("eth1");
        assert_eq!(zoned.to_string(), "[fe80::1%eth1]:80");
        assert_eq!(zoned.with_zone("").to_string(), "[fe80::1]:80");
        // The receiver is untouched.
        assert_eq!(addr.zone(), None);
    }

    #[test]
    fn with_zone_is_noop_for_ipv4_and_empty() {
        let addr = AddrPort::parse("10.0.0.1:80").unwrap();
        assert_eq!(addr.with_zone("eth0"), addr);
        assert_eq!(AddrPort::default().with_zone("eth0"), AddrPort::default());
    }

    #[test]
    fn socket_addr_conversion() {
        let addr = AddrPort::parse("[fe80::1%3]:80").unwrap();
        let SocketAddr::V6(v6) = addr.to_socket_addr().unwrap() else {
            panic!("expected v6");
        };
        assert_eq!(v6.scope_id(), 3);
        assert_eq!(AddrPort::from(SocketAddr::V6(v6)), addr);

        let unzoned = AddrPort::parse("[fe80::1]:80").unwrap();
        let SocketAddr::V6(v6) = unzoned.to_socket_addr().unwrap() else {
            panic!("expected v6");
        };
        assert_eq!(v6.scope_id(), 0);

        // An interface name cannot be dialed without resolving it first.
        let named = AddrPort::parse("[fe80::1%eth0]:80").unwrap();
        assert!(named.to_socket_addr().is_none());

        let v4: SocketAddr = "10.0.0.2:8443".parse().unwrap();
        assert_eq!(AddrPort::from(v4).to_string(), "10.0.0.2:8443");
    }

    #[test]
    fn json_encoding() {
        let addr = AddrPort::parse("10.0.0.1:8443").unwrap();
        assert_eq!(serde_json::to_string(&addr).unwrap(), "\"10.0.0.1:8443\"");
        assert_eq!(serde_json::to_string(&AddrPort::default()).unwrap(), "\"\"");

        let back: AddrPort = serde_json::from_str("\"\"").unwrap();
        assert!(back.is_empty());
        assert!(serde_json::from_str::<AddrPort>("\"not-an-addr\"").is_err());
    }

    #[test]
    fn yaml_encoding() {
        #[derive(Serialize, Deserialize)]
        struct Doc {
            address: AddrPort,
        }

        let yaml = serde_yaml::to_string(&Doc {
            address: AddrPort::default(),
        })
        .unwrap();
        assert_eq!(yaml.trim(), "address: ''");

        let doc: Doc = serde_yaml::from_str(&yaml).unwrap();
        assert!(doc.address.is_empty());

        let doc: Doc = serde_yaml::from_str("address: '[::1]:80'").unwrap();
        assert_eq!(doc.address.to_string(), "[::1]:80");

        assert!(serde_yaml::from_str::<Doc>("address: 10.0.0.1").is_err());
    }

    #[test]
    fn parse_list_fails_fast() {
        let addrs = AddrPorts::parse(&["10.0.0.1:1", "", "[::1]:2"]).unwrap();
        assert_eq!(addrs.strings(), vec!["10.0.0.1:1", "", "[::1]:2"]);

        let err = AddrPorts::parse(&["10.0.0.1:1", "bogus", "also bogus"]).unwrap_err();
        assert_eq!(err.input(), "bogus");
    }

    #[test]
    fn select_random_is_seedable() {
        let addrs = AddrPorts::parse(&["10.0.0.1:1", "10.0.0.2:1", "10.0.0.3:1"]).unwrap();

        let a = addrs.select_random(&mut StdRng::seed_from_u64(7)).cloned();
        let b = addrs.select_random(&mut StdRng::seed_from_u64(7)).cloned();
        assert_eq!(a, b);
        assert!(addrs.contains(&a.unwrap()));

        assert!(AddrPorts::default().select_random(&mut StdRng::seed_from_u64(7)).is_none());
    }
}
