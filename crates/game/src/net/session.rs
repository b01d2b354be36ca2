use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::endpoint::Endpoint;
use super::protocol::{GRID_SIZE, MAX_PACKET_SIZE, Packet, PacketState};
use super::transport::{NetworkStats, PeerSocket, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    Host,
    Client,
}

/// Lifecycle of a session. `Idle` is the state before a socket exists;
/// constructors hand back a session already in `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Ready,
    HostWaiting,
    ClientSending,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn step(self, (x, y): (i32, i32)) -> (i32, i32) {
        let (x, y) = match self {
            Direction::Up => (x, y - 1),
            Direction::Down => (x, y + 1),
            Direction::Left => (x - 1, y),
            Direction::Right => (x + 1, y),
        };
        (x.clamp(0, GRID_SIZE - 1), y.clamp(0, GRID_SIZE - 1))
    }
}

/// Display collaborator. Invoked after every completed turn with both dot
/// positions; the session never depends on what it does with them.
pub trait PositionRenderer {
    fn render(&mut self, local: (i32, i32), remote: (i32, i32));
}

/// Input collaborator. A yielded direction moves the local dot one cell;
/// `None` falls back to a fresh random position.
pub trait InputSource {
    fn next_direction(&mut self) -> Option<Direction>;
}

#[derive(Debug, Default)]
pub struct NullInput;

impl InputSource for NullInput {
    fn next_direction(&mut self) -> Option<Direction> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub turn_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            turn_delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub struct Session {
    socket: PeerSocket,
    role: SessionRole,
    state: SessionState,
    config: SessionConfig,
    local_position: (i32, i32),
    remote_position: (i32, i32),
    running: Arc<AtomicBool>,
}

impl Session {
    pub fn host(endpoint: &Endpoint, config: SessionConfig) -> Result<Self, TransportError> {
        let socket = PeerSocket::bind_host(endpoint)?;
        log::info!("Waiting for a peer on {}", socket.local_addr());

        Ok(Self::with_socket(socket, SessionRole::Host, config))
    }

    pub fn client(endpoint: &Endpoint, config: SessionConfig) -> Result<Self, TransportError> {
        let socket = PeerSocket::connect(endpoint)?;
        log::info!("Exchanging with {}", endpoint.addr());

        Ok(Self::with_socket(socket, SessionRole::Client, config))
    }

    fn with_socket(socket: PeerSocket, role: SessionRole, config: SessionConfig) -> Self {
        let center = (GRID_SIZE / 2, GRID_SIZE / 2);

        Self {
            socket,
            role,
            state: SessionState::Ready,
            config,
            local_position: center,
            remote_position: center,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn local_position(&self) -> (i32, i32) {
        self.local_position
    }

    pub fn remote_position(&self) -> (i32, i32) {
        self.remote_position
    }

    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.socket.local_addr()
    }

    pub fn stats(&self) -> &NetworkStats {
        self.socket.stats()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Turn-taking loop. Runs until the running flag is cleared or a send
    /// fails; the fixed delay bounds the exchange rate in both roles.
    pub fn run(
        &mut self,
        input: &mut dyn InputSource,
        renderer: &mut dyn PositionRenderer,
    ) -> Result<(), SessionError> {
        self.state = match self.role {
            SessionRole::Host => SessionState::HostWaiting,
            SessionRole::Client => SessionState::ClientSending,
        };

        while self.running.load(Ordering::SeqCst) {
            if !self.turn_once(input, renderer)? {
                break;
            }
            std::thread::sleep(self.config.turn_delay);
        }

        self.state = SessionState::Terminated;
        log::info!("Session closed");
        Ok(())
    }

    /// One send/receive cycle, without the inter-turn delay. Returns false
    /// once shutdown was requested mid-wait.
    pub fn turn_once(
        &mut self,
        input: &mut dyn InputSource,
        renderer: &mut dyn PositionRenderer,
    ) -> Result<bool, SessionError> {
        match self.role {
            SessionRole::Host => self.host_turn(renderer),
            SessionRole::Client => self.client_turn(input, renderer),
        }
    }

    fn host_turn(&mut self, renderer: &mut dyn PositionRenderer) -> Result<bool, SessionError> {
        let mut buf = [0u8; MAX_PACKET_SIZE];
        let (len, from) = match self.socket.recv(&mut buf, &self.running) {
            Ok(Some(datagram)) => datagram,
            Ok(None) => return Ok(false),
            Err(e) => {
                // A dropped datagram costs one turn, not the session.
                log::warn!("{}", e);
                return Ok(true);
            }
        };

        self.handle_received_packet(&buf[..len]);

        let position = random_coordinates();
        self.local_position = position;
        let reply = Packet::new(position.0, position.1, PacketState::Response).encode();
        self.socket.send_to(reply.as_bytes(), from)?;

        renderer.render(self.local_position, self.remote_position);
        Ok(true)
    }

    fn client_turn(
        &mut self,
        input: &mut dyn InputSource,
        renderer: &mut dyn PositionRenderer,
    ) -> Result<bool, SessionError> {
        let position = match input.next_direction() {
            Some(direction) => direction.step(self.local_position),
            None => random_coordinates(),
        };
        self.local_position = position;

        let packet = Packet::new(position.0, position.1, PacketState::GameActive).encode();
        self.socket.send(packet.as_bytes())?;

        let mut buf = [0u8; MAX_PACKET_SIZE];
        match self.socket.recv(&mut buf, &self.running) {
            Ok(Some((len, _))) => self.handle_received_packet(&buf[..len]),
            Ok(None) => return Ok(false),
            Err(e) => log::warn!("{}", e),
        }

        renderer.render(self.local_position, self.remote_position);
        Ok(true)
    }

    /// Foreign or corrupted datagrams leave the remote dot where it was.
    pub fn handle_received_packet(&mut self, data: &[u8]) {
        match Packet::decode(data) {
            Ok(position) => self.remote_position = position,
            Err(e) => log::debug!("ignoring malformed packet: {}", e),
        }
    }
}

fn random_coordinate() -> i32 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let state = RandomState::new();
    let mut hasher = state.build_hasher();
    hasher.write_u64(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64,
    );
    (hasher.finish() % GRID_SIZE as u64) as i32
}

fn random_coordinates() -> (i32, i32) {
    (random_coordinate(), random_coordinate())
}
