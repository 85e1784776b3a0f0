use bytes::{Buf, BufMut, BytesMut};

/// Chunk header: pipe id (2) + offset (2) + crc (2) + length (2) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// A pipe identifier as carried on the wire.
///
/// Bit 0 encodes the direction (1 = client-originated, 0 =
/// server-originated); the remaining bits are the pipe index within that
/// direction's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipeId(u16);

impl PipeId {
    /// Id of the client-originated pipe with the given index.
    pub fn client(index: u16) -> Self {
        debug_assert!(index < 0x8000);
        Self((index << 1) | 1)
    }

    /// Id of the server-originated pipe with the given index.
    pub fn server(index: u16) -> Self {
        debug_assert!(index < 0x8000);
        Self(index << 1)
    }

    /// Rebuild from the raw wire value.
    pub fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// The raw wire value.
    pub fn raw(self) -> u16 {
        self.0
    }

    /// Whether bit 0 marks this pipe as client-originated.
    pub fn is_client_originated(self) -> bool {
        self.0 & 1 != 0
    }

    /// The pipe index within its direction's table.
    pub fn index(self) -> u16 {
        self.0 >> 1
    }
}

/// The fixed 8-byte little-endian chunk header.
///
/// Wire format:
/// ```text
/// ┌─────────────┬─────────────┬────────────┬─────────────┐
/// │ pipe_id     │ offset      │ crc        │ length      │
/// │ (2B LE)     │ (2B LE)     │ (2B LE)    │ (2B LE)     │
/// └─────────────┴─────────────┴────────────┴─────────────┘
/// ```
/// Followed immediately by `length` raw payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub pipe_id: PipeId,
    /// Byte position of the payload within the pipe's logical stream.
    pub offset: u16,
    /// CRC16 continuation over all stream bytes before `offset`.
    pub crc: u16,
    /// Payload length in bytes.
    pub length: u16,
}

impl ChunkHeader {
    /// Encode into the wire format.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE);
        dst.put_u16_le(self.pipe_id.raw());
        dst.put_u16_le(self.offset);
        dst.put_u16_le(self.crc);
        dst.put_u16_le(self.length);
    }

    /// Decode from exactly 8 bytes.
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Self {
        let mut buf = &buf[..];
        Self {
            pipe_id: PipeId::from_raw(buf.get_u16_le()),
            offset: buf.get_u16_le(),
            crc: buf.get_u16_le(),
            length: buf.get_u16_le(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let header = ChunkHeader {
            pipe_id: PipeId::from_raw(0x0103),
            offset: 0xBEEF,
            crc: 0x1337,
            length: 512,
        };

        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);

        let decoded = ChunkHeader::decode(buf.as_ref().try_into().unwrap());
        assert_eq!(decoded, header);
    }

    #[test]
    fn header_roundtrip_extremes() {
        for raw in [0u16, 1, u16::MAX] {
            let header = ChunkHeader {
                pipe_id: PipeId::from_raw(raw),
                offset: raw,
                crc: raw,
                length: raw,
            };
            let mut buf = BytesMut::new();
            header.encode(&mut buf);
            let decoded = ChunkHeader::decode(buf.as_ref().try_into().unwrap());
            assert_eq!(decoded, header);
        }
    }

    #[test]
    fn header_is_little_endian() {
        let header = ChunkHeader {
            pipe_id: PipeId::from_raw(0x0201),
            offset: 0x0403,
            crc: 0x0605,
            length: 0x0807,
        };
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(
            buf.as_ref(),
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
    }

    #[test]
    fn direction_bit_encoding() {
        let client = PipeId::client(3);
        assert_eq!(client.raw(), 7);
        assert!(client.is_client_originated());
        assert_eq!(client.index(), 3);

        let server = PipeId::server(3);
        assert_eq!(server.raw(), 6);
        assert!(!server.is_client_originated());
        assert_eq!(server.index(), 3);
    }

    #[test]
    fn pipe_id_zero_is_server_pipe_zero() {
        let id = PipeId::from_raw(0);
        assert!(!id.is_client_originated());
        assert_eq!(id.index(), 0);
    }
}
