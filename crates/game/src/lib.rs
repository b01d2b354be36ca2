pub mod net;

pub use net::{
    AddressFamily, DecodeError, Direction, Endpoint, GRID_SIZE, InputSource, MAX_PACKET_SIZE,
    NetworkStats, NullInput, Packet, PacketState, PeerSocket, PositionRenderer, ResolveError,
    Session, SessionConfig, SessionError, SessionRole, SessionState, TransportError, parse_port,
};
