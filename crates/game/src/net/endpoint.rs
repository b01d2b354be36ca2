use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use super::session::SessionRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid port '{port}': {reason}")]
    InvalidPort { port: String, reason: &'static str },
    #[error("invalid address '{0}': not an IPv4 or IPv6 address")]
    InvalidAddress(String),
}

/// Validated peer descriptor. The argument shape decides the role: a bare
/// port hosts on the IPv4 wildcard, an address plus port joins that peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    addr: SocketAddr,
    role: SessionRole,
}

impl Endpoint {
    pub fn resolve(address: Option<&str>, port: &str) -> Result<Self, ResolveError> {
        let port = parse_port(port)?;

        match address {
            None => Ok(Self {
                addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
                role: SessionRole::Host,
            }),
            Some(address) => Ok(Self {
                addr: SocketAddr::new(parse_address(address)?, port),
                role: SessionRole::Client,
            }),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn family(&self) -> AddressFamily {
        match self.addr.ip() {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }
}

pub fn parse_port(port: &str) -> Result<u16, ResolveError> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ResolveError::InvalidPort {
            port: port.to_string(),
            reason: "expected decimal digits",
        });
    }

    port.parse::<u16>().map_err(|_| ResolveError::InvalidPort {
        port: port.to_string(),
        reason: "out of range 0-65535",
    })
}

fn parse_address(address: &str) -> Result<IpAddr, ResolveError> {
    if let Ok(v4) = address.parse::<Ipv4Addr>() {
        return Ok(IpAddr::V4(v4));
    }
    if let Ok(v6) = address.parse::<Ipv6Addr>() {
        return Ok(IpAddr::V6(v6));
    }
    Err(ResolveError::InvalidAddress(address.to_string()))
}
