//! Post log record format.
//!
//! Each write to the store is one framed record:
//!
//! ```text
//! magic "FPST" (4) | version (2) | kind (1) | payload_len (4) | payload | crc32 (4)
//! ```
//!
//! The CRC covers header and payload. `Put` payloads are the CBOR encoding of
//! the post; `Delete` payloads are the post id as little-endian i64.
//!
//! Only the last record may be incomplete. A length field larger than
//! [`MAX_PAYLOAD_LEN`], or one that runs over a later intact record, is
//! corruption rather than a torn tail.

use crate::error::{CoreError, CoreResult};
use crate::post::{Post, PostId};

/// Magic bytes identifying a post log record.
pub const LOG_MAGIC: [u8; 4] = *b"FPST";

/// Current log format version.
pub const LOG_VERSION: u16 = 1;

/// magic (4) + version (2) + kind (1) + length (4)
const HEADER_SIZE: usize = 11;

const CRC_SIZE: usize = 4;

/// Largest payload a record may carry.
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

const KIND_PUT: u8 = 1;
const KIND_DELETE: u8 = 2;

/// A single entry of the post log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// Insert or replace a post.
    Put(Post),
    /// Delete the post with this id.
    Delete(PostId),
}

impl LogRecord {
    /// Returns the id of the post this record touches.
    #[must_use]
    pub fn post_id(&self) -> PostId {
        match self {
            Self::Put(post) => post.id,
            Self::Delete(id) => *id,
        }
    }

    fn kind(&self) -> u8 {
        match self {
            Self::Put(_) => KIND_PUT,
            Self::Delete(_) => KIND_DELETE,
        }
    }

    /// Encodes the record with its envelope.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let payload = match self {
            Self::Put(post) => {
                let mut buf = Vec::new();
                ciborium::into_writer(post, &mut buf)
                    .map_err(|e| CoreError::Codec(e.to_string()))?;
                buf
            }
            Self::Delete(id) => id.to_le_bytes().to_vec(),
        };

        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(CoreError::Codec(format!(
                "post too large: {} bytes",
                payload.len()
            )));
        }
        let len = payload.len() as u32;

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
        buf.extend_from_slice(&LOG_MAGIC);
        buf.extend_from_slice(&LOG_VERSION.to_le_bytes());
        buf.push(self.kind());
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&payload);
        let crc = compute_crc32(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }

    /// Decodes the record starting at `offset`.
    ///
    /// Returns `Ok(None)` if the bytes end before the record does (a torn
    /// tail), otherwise the record and the offset just past it.
    ///
    /// # Errors
    ///
    /// Returns `LogCorruption` for a bad header, checksum or payload, and for
    /// a record whose length reaches past the end while an intact record
    /// follows it.
    pub fn decode_at(bytes: &[u8], offset: usize) -> CoreResult<Option<(Self, usize)>> {
        let at = offset as u64;
        let rest = &bytes[offset.min(bytes.len())..];
        if rest.len() < HEADER_SIZE {
            return Ok(None);
        }

        if rest[0..4] != LOG_MAGIC {
            return Err(CoreError::log_corruption(at, "bad magic"));
        }
        let version = u16::from_le_bytes([rest[4], rest[5]]);
        if version != LOG_VERSION {
            return Err(CoreError::log_corruption(
                at,
                format!("unsupported version {version}"),
            ));
        }
        let kind = rest[6];
        let len = u32::from_le_bytes([rest[7], rest[8], rest[9], rest[10]]) as usize;
        if len > MAX_PAYLOAD_LEN {
            return Err(CoreError::log_corruption(
                at,
                format!("payload length {len} exceeds limit"),
            ));
        }

        let total = HEADER_SIZE + len + CRC_SIZE;
        if rest.len() < total {
            if let Some(later) = (1..rest.len()).find(|&i| intact_frame_at(&rest[i..])) {
                return Err(CoreError::log_corruption(
                    at,
                    format!(
                        "record length runs over an intact record at offset {}",
                        at + later as u64
                    ),
                ));
            }
            return Ok(None);
        }

        let body_end = HEADER_SIZE + len;
        let stored = u32::from_le_bytes([
            rest[body_end],
            rest[body_end + 1],
            rest[body_end + 2],
            rest[body_end + 3],
        ]);
        if stored != compute_crc32(&rest[..body_end]) {
            return Err(CoreError::log_corruption(at, "crc mismatch"));
        }

        let payload = &rest[HEADER_SIZE..body_end];
        let record = match kind {
            KIND_PUT => {
                let post: Post = ciborium::from_reader(payload)
                    .map_err(|e| CoreError::log_corruption(at, e.to_string()))?;
                Self::Put(post)
            }
            KIND_DELETE => {
                let id: [u8; 8] = payload
                    .try_into()
                    .map_err(|_| CoreError::log_corruption(at, "delete payload is not 8 bytes"))?;
                Self::Delete(PostId::from_le_bytes(id))
            }
            other => {
                return Err(CoreError::log_corruption(
                    at,
                    format!("unknown record kind {other}"),
                ))
            }
        };

        Ok(Some((record, offset + total)))
    }
}

/// True if `bytes` starts with a complete record whose checksum holds.
fn intact_frame_at(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_SIZE + CRC_SIZE || bytes[0..4] != LOG_MAGIC {
        return false;
    }
    let len = u32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]) as usize;
    if len > MAX_PAYLOAD_LEN || bytes.len() < HEADER_SIZE + len + CRC_SIZE {
        return false;
    }
    let body_end = HEADER_SIZE + len;
    let stored = u32::from_le_bytes([
        bytes[body_end],
        bytes[body_end + 1],
        bytes[body_end + 2],
        bytes[body_end + 3],
    ]);
    stored == compute_crc32(&bytes[..body_end])
}

/// Outcome of reading a whole log.
#[derive(Debug)]
pub(crate) struct Replay {
    pub records: Vec<LogRecord>,
    /// Length of the prefix made of complete records.
    pub valid_len: u64,
}

/// Reads every complete record in `bytes`.
pub(crate) fn replay(bytes: &[u8]) -> CoreResult<Replay> {
    let mut records = Vec::new();
    let mut offset = 0;
    while let Some((record, next)) = LogRecord::decode_at(bytes, offset)? {
        records.push(record);
        offset = next;
    }
    Ok(Replay {
        records,
        valid_len: offset as u64,
    })
}

/// Computes the CRC-32 (IEEE) checksum of `data`.
pub fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Post {
        Post {
            likes: 9,
            liked_by_me: true,
            ..Post::new(12, "Dana", "offline first")
        }
    }

    #[test]
    fn put_and_delete_decode() {
        let mut bytes = LogRecord::Put(sample()).encode().unwrap();
        bytes.extend(LogRecord::Delete(12).encode().unwrap());

        let replayed = replay(&bytes).unwrap();
        assert_eq!(
            replayed.records,
            vec![LogRecord::Put(sample()), LogRecord::Delete(12)]
        );
        assert_eq!(replayed.valid_len, bytes.len() as u64);
    }

    #[test]
    fn torn_tail_stops_replay() {
        let first = LogRecord::Delete(1).encode().unwrap();
        let second = LogRecord::Put(sample()).encode().unwrap();
        let mut bytes = first.clone();
        bytes.extend_from_slice(&second[..second.len() - 3]);

        let replayed = replay(&bytes).unwrap();
        assert_eq!(replayed.records, vec![LogRecord::Delete(1)]);
        assert_eq!(replayed.valid_len, first.len() as u64);
    }

    #[test]
    fn flipped_byte_is_corruption() {
        let mut bytes = LogRecord::Put(sample()).encode().unwrap();
        bytes[HEADER_SIZE + 2] ^= 0xFF;
        assert!(matches!(
            replay(&bytes),
            Err(CoreError::LogCorruption { offset: 0, .. })
        ));
    }

    #[test]
    fn oversized_length_is_corruption() {
        let mut bytes = Vec::new();
        for id in 1..=3 {
            bytes.extend(LogRecord::Delete(id).encode().unwrap());
        }
        bytes[10] ^= 0x80;
        assert!(matches!(
            replay(&bytes),
            Err(CoreError::LogCorruption { offset: 0, .. })
        ));
    }

    #[test]
    fn length_running_over_later_records_is_corruption() {
        let first = LogRecord::Put(sample()).encode().unwrap();
        let mut bytes = first.clone();
        bytes.extend(LogRecord::Delete(4).encode().unwrap());
        bytes.extend(LogRecord::Delete(5).encode().unwrap());
        // Stretch the second record's length to just past the end.
        let second = first.len();
        bytes[second + 7] = 40;

        let err = replay(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CoreError::LogCorruption { offset, .. } if offset == second as u64
        ));
    }

    #[test]
    fn torn_tail_after_several_records_is_still_a_tail() {
        let mut bytes = Vec::new();
        for id in 1..=3 {
            bytes.extend(LogRecord::Delete(id).encode().unwrap());
        }
        let valid = bytes.len();
        let torn = LogRecord::Put(sample()).encode().unwrap();
        bytes.extend_from_slice(&torn[..HEADER_SIZE + 5]);

        let replayed = replay(&bytes).unwrap();
        assert_eq!(replayed.records.len(), 3);
        assert_eq!(replayed.valid_len, valid as u64);
    }

    #[test]
    fn bad_magic_is_corruption() {
        let mut bytes = LogRecord::Delete(3).encode().unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            LogRecord::decode_at(&bytes, 0),
            Err(CoreError::LogCorruption { .. })
        ));
    }

    #[test]
    fn crc32_known_value() {
        assert_eq!(compute_crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(compute_crc32(b""), 0);
    }
}
