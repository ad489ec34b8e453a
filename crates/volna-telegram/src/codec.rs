// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dedup token codec.
//!
//! Serializes an [`UploadHandle`] to a URL-safe, unpadded base64 token that
//! can be stored as an opaque string and decoded back losslessly. Binary
//! layout before base64:
//!
//! `[tag u8][id i64 LE][parts i32 LE][name_len u32 LE][name UTF-8]`
//!
//! Decoding is strict: empty input, invalid base64, truncation, trailing
//! bytes, an unknown tag, or non-UTF-8 name bytes are all errors, never a
//! partial result. Callers treat a decode failure as a cache miss.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use volna_core::{UploadHandle, VolnaError};

const TAG_SMALL: u8 = 0;
const TAG_BIG: u8 = 1;

/// Fixed-size prefix: tag + id + parts + name length.
const HEADER_LEN: usize = 1 + 8 + 4 + 4;

/// Encodes an upload handle into a storable token.
pub fn encode(handle: &UploadHandle) -> String {
    let name = handle.name().as_bytes();
    let mut buf = Vec::with_capacity(HEADER_LEN + name.len());
    buf.push(if handle.is_big() { TAG_BIG } else { TAG_SMALL });
    buf.extend_from_slice(&handle.id().to_le_bytes());
    buf.extend_from_slice(&handle.parts().to_le_bytes());
    buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
    buf.extend_from_slice(name);
    URL_SAFE_NO_PAD.encode(buf)
}

/// Decodes a stored token back into an upload handle.
pub fn decode(token: &str) -> Result<UploadHandle, VolnaError> {
    if token.is_empty() {
        return Err(VolnaError::Codec("empty token".into()));
    }
    let buf = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| VolnaError::Codec(format!("invalid base64: {e}")))?;
    if buf.len() < HEADER_LEN {
        return Err(VolnaError::Codec(format!(
            "truncated token: {} bytes, need at least {HEADER_LEN}",
            buf.len()
        )));
    }

    let tag = buf[0];
    let id = i64::from_le_bytes(buf[1..9].try_into().map_err(|_| {
        VolnaError::Codec("truncated id field".into())
    })?);
    let parts = i32::from_le_bytes(buf[9..13].try_into().map_err(|_| {
        VolnaError::Codec("truncated parts field".into())
    })?);
    let name_len = u32::from_le_bytes(buf[13..17].try_into().map_err(|_| {
        VolnaError::Codec("truncated name length field".into())
    })?) as usize;

    let name_bytes = &buf[HEADER_LEN..];
    if name_bytes.len() != name_len {
        return Err(VolnaError::Codec(format!(
            "name length mismatch: header says {name_len}, got {}",
            name_bytes.len()
        )));
    }
    let name = std::str::from_utf8(name_bytes)
        .map_err(|e| VolnaError::Codec(format!("name is not UTF-8: {e}")))?
        .to_string();

    match tag {
        TAG_SMALL => Ok(UploadHandle::Small { id, parts, name }),
        TAG_BIG => Ok(UploadHandle::Big { id, parts, name }),
        other => Err(VolnaError::Codec(format!("unknown handle tag {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn small_handle_round_trips() {
        let handle = UploadHandle::Small {
            id: 123,
            parts: 1,
            name: "test.txt".into(),
        };
        let token = encode(&handle);
        assert!(!token.is_empty());
        assert!(!token.contains('='), "token must be unpadded");
        assert_eq!(decode(&token).unwrap(), handle);
    }

    #[test]
    fn big_handle_round_trips() {
        let handle = UploadHandle::Big {
            id: i64::MIN,
            parts: i32::MAX,
            name: "лекция 1977-02-16.mp3".into(),
        };
        assert_eq!(decode(&encode(&handle)).unwrap(), handle);
    }

    #[test]
    fn empty_name_round_trips() {
        let handle = UploadHandle::Small {
            id: 0,
            parts: 0,
            name: String::new(),
        };
        assert_eq!(decode(&encode(&handle)).unwrap(), handle);
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(decode(""), Err(VolnaError::Codec(_))));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(matches!(decode("not base64!!"), Err(VolnaError::Codec(_))));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let handle = UploadHandle::Small {
            id: 1,
            parts: 1,
            name: "a.mp3".into(),
        };
        let token = encode(&handle);
        let truncated = &token[..token.len() / 2];
        assert!(matches!(decode(truncated), Err(VolnaError::Codec(_))));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let handle = UploadHandle::Small {
            id: 1,
            parts: 1,
            name: "a.mp3".into(),
        };
        let mut raw = URL_SAFE_NO_PAD.decode(encode(&handle)).unwrap();
        raw.push(0xFF);
        let token = URL_SAFE_NO_PAD.encode(raw);
        assert!(matches!(decode(&token), Err(VolnaError::Codec(_))));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let handle = UploadHandle::Small {
            id: 1,
            parts: 1,
            name: "a.mp3".into(),
        };
        let mut raw = URL_SAFE_NO_PAD.decode(encode(&handle)).unwrap();
        raw[0] = 9;
        let token = URL_SAFE_NO_PAD.encode(raw);
        assert!(matches!(decode(&token), Err(VolnaError::Codec(_))));
    }

    #[test]
    fn non_utf8_name_is_rejected() {
        let handle = UploadHandle::Small {
            id: 1,
            parts: 1,
            name: "ab".into(),
        };
        let mut raw = URL_SAFE_NO_PAD.decode(encode(&handle)).unwrap();
        let last = raw.len() - 1;
        raw[last] = 0xFF;
        let token = URL_SAFE_NO_PAD.encode(raw);
        assert!(matches!(decode(&token), Err(VolnaError::Codec(_))));
    }

    proptest! {
        #[test]
        fn round_trip_holds_for_all_field_values(
            id in any::<i64>(),
            parts in any::<i32>(),
            name in ".*",
            big in any::<bool>(),
        ) {
            let handle = if big {
                UploadHandle::Big { id, parts, name }
            } else {
                UploadHandle::Small { id, parts, name }
            };
            prop_assert_eq!(decode(&encode(&handle)).unwrap(), handle);
        }
    }
}
