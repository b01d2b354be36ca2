use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::endpoint::{AddressFamily, Endpoint};
use super::protocol::MAX_PACKET_SIZE;

// Upper bound on how long a shutdown request can go unnoticed while blocked
// in recv_from.
const SHUTDOWN_POLL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to create UDP socket: {0}")]
    Create(#[source] io::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("no remote address set")]
    NoRemote,
    #[error("packet of {0} bytes exceeds the {max} byte limit", max = MAX_PACKET_SIZE)]
    OversizePacket(usize),
    #[error("send failed: {0}")]
    Send(#[source] io::Error),
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
}

/// Owns the one UDP socket of a session. The socket is closed when the value
/// is dropped.
pub struct PeerSocket {
    socket: UdpSocket,
    local_addr: SocketAddr,
    remote_addr: Option<SocketAddr>,
    stats: NetworkStats,
}

impl PeerSocket {
    /// Host side: bind the wildcard address of the endpoint's family on the
    /// resolved port. Bind failures (port in use, permission) are fatal and
    /// never retried.
    pub fn bind_host(endpoint: &Endpoint) -> Result<Self, TransportError> {
        let addr = endpoint.addr();
        let socket = UdpSocket::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        Self::from_socket(socket, None)
    }

    /// Client side: an ephemeral socket of the matching family, connected to
    /// the resolved peer.
    pub fn connect(endpoint: &Endpoint) -> Result<Self, TransportError> {
        let local = match endpoint.family() {
            AddressFamily::Ipv4 => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            AddressFamily::Ipv6 => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket = UdpSocket::bind(local).map_err(TransportError::Create)?;
        socket.connect(endpoint.addr()).map_err(TransportError::Create)?;
        Self::from_socket(socket, Some(endpoint.addr()))
    }

    fn from_socket(socket: UdpSocket, remote_addr: Option<SocketAddr>) -> Result<Self, TransportError> {
        socket
            .set_read_timeout(Some(SHUTDOWN_POLL))
            .map_err(TransportError::Create)?;
        let local_addr = socket.local_addr().map_err(TransportError::Create)?;

        Ok(Self {
            socket,
            local_addr,
            remote_addr,
            stats: NetworkStats::default(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn send_to(&mut self, payload: &[u8], addr: SocketAddr) -> Result<usize, TransportError> {
        if payload.len() > MAX_PACKET_SIZE {
            return Err(TransportError::OversizePacket(payload.len()));
        }

        let bytes = self.socket.send_to(payload, addr).map_err(TransportError::Send)?;

        self.stats.packets_sent += 1;
        self.stats.bytes_sent += bytes as u64;

        Ok(bytes)
    }

    pub fn send(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        if self.remote_addr.is_none() {
            return Err(TransportError::NoRemote);
        }
        if payload.len() > MAX_PACKET_SIZE {
            return Err(TransportError::OversizePacket(payload.len()));
        }

        let bytes = self.socket.send(payload).map_err(TransportError::Send)?;

        self.stats.packets_sent += 1;
        self.stats.bytes_sent += bytes as u64;

        Ok(bytes)
    }

    /// Wait for one datagram. Blocks until data arrives, the running flag is
    /// cleared (`Ok(None)`), or the socket reports a real error. Datagrams
    /// longer than `buf` are truncated by the OS.
    pub fn recv(
        &mut self,
        buf: &mut [u8],
        running: &AtomicBool,
    ) -> Result<Option<(usize, SocketAddr)>, TransportError> {
        while running.load(Ordering::SeqCst) {
            match self.socket.recv_from(buf) {
                Ok((len, addr)) => {
                    self.stats.packets_received += 1;
                    self.stats.bytes_received += len as u64;
                    return Ok(Some((len, addr)));
                }
                Err(e)
                    if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
                {
                    continue;
                }
                Err(e) => return Err(TransportError::Receive(e)),
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_socket() -> PeerSocket {
        let endpoint = Endpoint::resolve(None, "0").unwrap();
        PeerSocket::bind_host(&endpoint).unwrap()
    }

    fn loopback(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    #[test]
    fn test_bind_host_assigns_local_port() {
        let socket = host_socket();
        assert_ne!(socket.local_addr().port(), 0);
    }

    #[test]
    fn test_connect_matches_endpoint_family() {
        let endpoint = Endpoint::resolve(Some("::1"), "4242").unwrap();
        let socket = match PeerSocket::connect(&endpoint) {
            Ok(socket) => socket,
            // Hosts without an IPv6 stack can't run this one.
            Err(TransportError::Create(_)) => return,
            Err(e) => panic!("{}", e),
        };

        assert!(socket.local_addr().is_ipv6());
        assert_eq!(socket.remote_addr(), Some(endpoint.addr()));
    }

    #[test]
    fn test_loopback_send_receive() {
        let mut receiver = host_socket();
        let mut sender = host_socket();

        let dest = loopback(receiver.local_addr().port());
        sender.send_to(b"3,4|game_active", dest).unwrap();

        let running = AtomicBool::new(true);
        let mut buf = [0u8; MAX_PACKET_SIZE];
        let (len, from) = receiver.recv(&mut buf, &running).unwrap().unwrap();

        assert_eq!(&buf[..len], b"3,4|game_active");
        assert_eq!(from.port(), sender.local_addr().port());
        assert_eq!(sender.stats().packets_sent, 1);
        assert_eq!(receiver.stats().packets_received, 1);
        assert_eq!(receiver.stats().bytes_received, len as u64);
    }

    #[test]
    fn test_send_rejects_oversize_payload() {
        let mut socket = host_socket();
        let dest = loopback(socket.local_addr().port());

        let oversized = [b'0'; MAX_PACKET_SIZE + 1];
        assert!(matches!(
            socket.send_to(&oversized, dest),
            Err(TransportError::OversizePacket(_))
        ));
        assert_eq!(socket.stats().packets_sent, 0);
    }

    #[test]
    fn test_send_requires_remote() {
        let mut socket = host_socket();
        assert!(matches!(
            socket.send(b"1,2|response"),
            Err(TransportError::NoRemote)
        ));
    }

    #[test]
    fn test_recv_returns_none_once_shutdown_requested() {
        let mut socket = host_socket();
        let running = AtomicBool::new(false);

        let mut buf = [0u8; MAX_PACKET_SIZE];
        assert!(matches!(socket.recv(&mut buf, &running), Ok(None)));
    }
}
