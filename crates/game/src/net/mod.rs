mod endpoint;
mod protocol;
mod session;
mod transport;

pub use endpoint::{AddressFamily, Endpoint, ResolveError, parse_port};
pub use protocol::{DecodeError, GRID_SIZE, MAX_PACKET_SIZE, Packet, PacketState};
pub use session::{
    Direction, InputSource, NullInput, PositionRenderer, Session, SessionConfig, SessionError,
    SessionRole, SessionState,
};
pub use transport::{NetworkStats, PeerSocket, TransportError};
