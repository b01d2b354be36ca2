pub const MAX_PACKET_SIZE: usize = 256;
pub const GRID_SIZE: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketState {
    GameActive,
    Response,
}

impl PacketState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PacketState::GameActive => "game_active",
            PacketState::Response => "response",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8")]
    NotText,
    #[error("missing ',' separator")]
    MissingSeparator,
    #[error("malformed coordinate field")]
    MalformedCoordinate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub x: i32,
    pub y: i32,
    pub state: PacketState,
}

impl Packet {
    pub fn new(x: i32, y: i32, state: PacketState) -> Self {
        Self { x, y, state }
    }

    pub fn encode(&self) -> String {
        format!("{},{}|{}", self.x, self.y, self.state.as_str())
    }

    /// Best-effort extraction of the coordinate pair. The `|state` suffix and
    /// anything after the second number is ignored; callers drop the datagram
    /// on error instead of failing the turn.
    pub fn decode(data: &[u8]) -> Result<(i32, i32), DecodeError> {
        let text = std::str::from_utf8(data).map_err(|_| DecodeError::NotText)?;
        let (first, rest) = text.split_once(',').ok_or(DecodeError::MissingSeparator)?;

        let x = first
            .parse::<i32>()
            .map_err(|_| DecodeError::MalformedCoordinate)?;
        let y = leading_int(rest)?;

        Ok((x, y))
    }
}

// Second field terminates at end-of-input or the first non-numeric byte.
fn leading_int(text: &str) -> Result<i32, DecodeError> {
    let bytes = text.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return Err(DecodeError::MalformedCoordinate);
    }
    text[..end]
        .parse::<i32>()
        .map_err(|_| DecodeError::MalformedCoordinate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_format() {
        assert_eq!(
            Packet::new(42, 7, PacketState::GameActive).encode(),
            "42,7|game_active"
        );
        assert_eq!(Packet::new(0, 99, PacketState::Response).encode(), "0,99|response");
    }

    #[test]
    fn test_round_trip_full_grid() {
        for state in [PacketState::GameActive, PacketState::Response] {
            for x in 0..GRID_SIZE {
                for y in 0..GRID_SIZE {
                    let encoded = Packet::new(x, y, state).encode();
                    assert_eq!(Packet::decode(encoded.as_bytes()).unwrap(), (x, y));
                }
            }
        }
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for input in ["abc", "", "5", "5,", "5,abc", ",7", "5x,7", "|game_active"] {
            assert!(
                Packet::decode(input.as_bytes()).is_err(),
                "{:?} should not decode",
                input
            );
        }
    }

    #[test]
    fn test_decode_ignores_trailing_content() {
        assert_eq!(Packet::decode(b"5,7junk").unwrap(), (5, 7));
        assert_eq!(Packet::decode(b"5,7|").unwrap(), (5, 7));
        assert_eq!(Packet::decode(b"12,34|unknown_state").unwrap(), (12, 34));
    }

    #[test]
    fn test_decode_negative_coordinates() {
        assert_eq!(Packet::decode(b"-3,-9|response").unwrap(), (-3, -9));
    }

    #[test]
    fn test_decode_rejects_non_utf8() {
        assert!(Packet::decode(&[0xff, 0xfe, b',', b'1']).is_err());
    }

    #[test]
    fn test_decode_rejects_overflow() {
        assert!(Packet::decode(b"99999999999999,5").is_err());
        assert!(Packet::decode(b"5,99999999999999").is_err());
    }
}
