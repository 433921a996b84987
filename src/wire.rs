//! CQL wire notation primitives.
//!
//! Checked sequential reads and writes of the protocol's primitive
//! notations over `bytes` buffers. Every reader validates the remaining
//! length before consuming, so a truncated body surfaces as
//! [`BodyError::Underflow`] instead of a panic. Every writer has a
//! matching `*_size` helper returning the exact number of bytes it will
//! produce; coders rely on that equality to allocate bodies up front.
//!
//! All multi-byte integers are network byte order (big-endian).

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::error::BodyError;

fn ensure(body: &Bytes, need: usize) -> Result<(), BodyError> {
    let remaining = body.remaining();
    if remaining < need {
        return Err(BodyError::Underflow { need, remaining });
    }
    Ok(())
}

/// Read a single byte.
///
/// # Errors
/// Returns [`BodyError::Underflow`] if the body is exhausted.
pub fn read_u8(body: &mut Bytes) -> Result<u8, BodyError> {
    ensure(body, 1)?;
    Ok(body.get_u8())
}

/// Read a `[short]` (unsigned 16-bit).
///
/// # Errors
/// Returns [`BodyError::Underflow`] if fewer than two bytes remain.
pub fn read_short(body: &mut Bytes) -> Result<u16, BodyError> {
    ensure(body, 2)?;
    Ok(body.get_u16())
}

/// Read an `[int]` (signed 32-bit).
///
/// # Errors
/// Returns [`BodyError::Underflow`] if fewer than four bytes remain.
pub fn read_int(body: &mut Bytes) -> Result<i32, BodyError> {
    ensure(body, 4)?;
    Ok(body.get_i32())
}

/// Read a `[string]`: `[short]` length followed by UTF-8 bytes.
///
/// # Errors
/// Returns [`BodyError::Underflow`] on truncation or
/// [`BodyError::InvalidUtf8`] if the content is not valid UTF-8.
pub fn read_string(body: &mut Bytes) -> Result<String, BodyError> {
    let len = read_short(body)? as usize;
    ensure(body, len)?;
    let raw = body.split_to(len);
    String::from_utf8(raw.to_vec()).map_err(|_| BodyError::InvalidUtf8)
}

/// Read a `[long string]`: `[int]` length followed by UTF-8 bytes.
///
/// # Errors
/// Returns [`BodyError::Underflow`] on truncation or
/// [`BodyError::InvalidUtf8`] if the content is not valid UTF-8.
pub fn read_long_string(body: &mut Bytes) -> Result<String, BodyError> {
    let len = read_int(body)?;
    let len = usize::try_from(len).map_err(|_| BodyError::NegativeLength { len })?;
    ensure(body, len)?;
    let raw = body.split_to(len);
    String::from_utf8(raw.to_vec()).map_err(|_| BodyError::InvalidUtf8)
}

/// Read a `[string list]`.
///
/// # Errors
/// Propagates any underlying `[string]` read failure.
pub fn read_string_list(body: &mut Bytes) -> Result<Vec<String>, BodyError> {
    let count = read_short(body)? as usize;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(read_string(body)?);
    }
    Ok(items)
}

/// Read a `[string multimap]`, as carried by SUPPORTED responses.
///
/// # Errors
/// Propagates any underlying `[string]` read failure.
pub fn read_string_multimap(body: &mut Bytes) -> Result<HashMap<String, Vec<String>>, BodyError> {
    let count = read_short(body)? as usize;
    let mut map = HashMap::with_capacity(count);
    for _ in 0..count {
        let key = read_string(body)?;
        let values = read_string_list(body)?;
        map.insert(key, values);
    }
    Ok(map)
}

/// Read a `[bytes]` notation: `[int]` length, negative meaning absent.
///
/// # Errors
/// Returns [`BodyError::Underflow`] on truncation.
pub fn read_bytes(body: &mut Bytes) -> Result<Option<Bytes>, BodyError> {
    let len = read_int(body)?;
    if len < 0 {
        return Ok(None);
    }
    let len = len as usize;
    ensure(body, len)?;
    Ok(Some(body.split_to(len)))
}

/// Read a `[short bytes]` notation: `[short]` length plus content.
///
/// # Errors
/// Returns [`BodyError::Underflow`] on truncation.
pub fn read_short_bytes(body: &mut Bytes) -> Result<Bytes, BodyError> {
    let len = read_short(body)? as usize;
    ensure(body, len)?;
    Ok(body.split_to(len))
}

/// Read a `[uuid]`: 16 raw bytes.
///
/// # Errors
/// Returns [`BodyError::Underflow`] if fewer than 16 bytes remain.
pub fn read_uuid(body: &mut Bytes) -> Result<Uuid, BodyError> {
    ensure(body, 16)?;
    let mut raw = [0_u8; 16];
    body.copy_to_slice(&mut raw);
    Ok(Uuid::from_bytes(raw))
}

/// Read an `[inet]`: one length byte (4 or 16), address bytes, `[int]` port.
///
/// # Errors
/// Returns [`BodyError::InvalidInetLength`] for any other address length,
/// or [`BodyError::Underflow`] on truncation.
pub fn read_inet(body: &mut Bytes) -> Result<SocketAddr, BodyError> {
    let len = read_u8(body)?;
    let ip = match len {
        4 => {
            ensure(body, 4)?;
            let mut raw = [0_u8; 4];
            body.copy_to_slice(&mut raw);
            IpAddr::V4(Ipv4Addr::from(raw))
        }
        16 => {
            ensure(body, 16)?;
            let mut raw = [0_u8; 16];
            body.copy_to_slice(&mut raw);
            IpAddr::V6(Ipv6Addr::from(raw))
        }
        other => return Err(BodyError::InvalidInetLength { len: other }),
    };
    let port = read_int(body)?;
    Ok(SocketAddr::new(ip, port as u16))
}

/// Read a `[consistency]`: a `[short]` code.
///
/// # Errors
/// Returns [`BodyError::UnknownConsistency`] for codes outside the
/// protocol's set.
pub fn read_consistency(body: &mut Bytes) -> Result<Consistency, BodyError> {
    let code = read_short(body)?;
    Consistency::from_code(code)
}

/// Write a single byte.
pub fn write_u8(value: u8, dst: &mut BytesMut) { dst.put_u8(value); }

/// Write a `[short]`.
pub fn write_short(value: u16, dst: &mut BytesMut) { dst.put_u16(value); }

/// Write an `[int]`.
pub fn write_int(value: i32, dst: &mut BytesMut) { dst.put_i32(value); }

/// Write a `[string]`.
pub fn write_string(value: &str, dst: &mut BytesMut) {
    dst.put_u16(value.len() as u16);
    dst.put_slice(value.as_bytes());
}

/// Write a `[long string]`.
pub fn write_long_string(value: &str, dst: &mut BytesMut) {
    dst.put_i32(value.len() as i32);
    dst.put_slice(value.as_bytes());
}

/// Write a `[string list]`.
pub fn write_string_list(values: &[String], dst: &mut BytesMut) {
    dst.put_u16(values.len() as u16);
    for value in values {
        write_string(value, dst);
    }
}

/// Write a `[string map]` from ordered pairs.
///
/// Pairs rather than a map keep the encoding order deterministic.
pub fn write_string_map(pairs: &[(String, String)], dst: &mut BytesMut) {
    dst.put_u16(pairs.len() as u16);
    for (key, value) in pairs {
        write_string(key, dst);
        write_string(value, dst);
    }
}

/// Write a `[bytes]` notation; `None` encodes as length -1.
pub fn write_bytes(value: Option<&Bytes>, dst: &mut BytesMut) {
    match value {
        Some(bytes) => {
            dst.put_i32(bytes.len() as i32);
            dst.put_slice(bytes);
        }
        None => dst.put_i32(-1),
    }
}

/// Write a `[short bytes]` notation.
pub fn write_short_bytes(value: &Bytes, dst: &mut BytesMut) {
    dst.put_u16(value.len() as u16);
    dst.put_slice(value);
}

/// Write a `[uuid]` as 16 raw bytes.
pub fn write_uuid(value: Uuid, dst: &mut BytesMut) { dst.put_slice(value.as_bytes()); }

/// Write a `[consistency]` code.
pub fn write_consistency(value: Consistency, dst: &mut BytesMut) { dst.put_u16(value.code()); }

/// Write a value list: `[short]` count plus one `[bytes]` per value.
pub fn write_value_list(values: &[Option<Bytes>], dst: &mut BytesMut) {
    dst.put_u16(values.len() as u16);
    for value in values {
        write_bytes(value.as_ref(), dst);
    }
}

/// Exact encoded size of a `[string]`.
#[must_use]
pub fn string_size(value: &str) -> usize { 2 + value.len() }

/// Exact encoded size of a `[long string]`.
#[must_use]
pub fn long_string_size(value: &str) -> usize { 4 + value.len() }

/// Exact encoded size of a `[string list]`.
#[must_use]
pub fn string_list_size(values: &[String]) -> usize {
    2 + values.iter().map(|v| string_size(v)).sum::<usize>()
}

/// Exact encoded size of a `[string map]`.
#[must_use]
pub fn string_map_size(pairs: &[(String, String)]) -> usize {
    2 + pairs
        .iter()
        .map(|(k, v)| string_size(k) + string_size(v))
        .sum::<usize>()
}

/// Exact encoded size of a `[bytes]` notation.
#[must_use]
pub fn bytes_size(value: Option<&Bytes>) -> usize { 4 + value.map_or(0, Bytes::len) }

/// Exact encoded size of a `[short bytes]` notation.
#[must_use]
pub fn short_bytes_size(value: &Bytes) -> usize { 2 + value.len() }

/// Exact encoded size of a value list.
#[must_use]
pub fn value_list_size(values: &[Option<Bytes>]) -> usize {
    2 + values
        .iter()
        .map(|v| bytes_size(v.as_ref()))
        .sum::<usize>()
}

/// Consistency level carried by QUERY, EXECUTE, and BATCH requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Consistency {
    /// Closest replica, no durability guarantee.
    Any,
    /// One replica acknowledgement.
    One,
    /// Two replica acknowledgements.
    Two,
    /// Three replica acknowledgements.
    Three,
    /// Majority of replicas.
    Quorum,
    /// All replicas.
    All,
    /// Majority within the local datacenter.
    LocalQuorum,
    /// Majority within every datacenter.
    EachQuorum,
    /// Linearizable conditional update.
    Serial,
    /// Linearizable within the local datacenter.
    LocalSerial,
    /// One replica within the local datacenter.
    LocalOne,
}

impl Consistency {
    /// Protocol code for this level.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Any => 0x0000,
            Self::One => 0x0001,
            Self::Two => 0x0002,
            Self::Three => 0x0003,
            Self::Quorum => 0x0004,
            Self::All => 0x0005,
            Self::LocalQuorum => 0x0006,
            Self::EachQuorum => 0x0007,
            Self::Serial => 0x0008,
            Self::LocalSerial => 0x0009,
            Self::LocalOne => 0x000A,
        }
    }

    /// Resolve a protocol code back to a level.
    ///
    /// # Errors
    /// Returns [`BodyError::UnknownConsistency`] for unassigned codes.
    pub fn from_code(code: u16) -> Result<Self, BodyError> {
        match code {
            0x0000 => Ok(Self::Any),
            0x0001 => Ok(Self::One),
            0x0002 => Ok(Self::Two),
            0x0003 => Ok(Self::Three),
            0x0004 => Ok(Self::Quorum),
            0x0005 => Ok(Self::All),
            0x0006 => Ok(Self::LocalQuorum),
            0x0007 => Ok(Self::EachQuorum),
            0x0008 => Ok(Self::Serial),
            0x0009 => Ok(Self::LocalSerial),
            0x000A => Ok(Self::LocalOne),
            other => Err(BodyError::UnknownConsistency { code: other }),
        }
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "ANY",
            Self::One => "ONE",
            Self::Two => "TWO",
            Self::Three => "THREE",
            Self::Quorum => "QUORUM",
            Self::All => "ALL",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::Serial => "SERIAL",
            Self::LocalSerial => "LOCAL_SERIAL",
            Self::LocalOne => "LOCAL_ONE",
        };
        f.write_str(name)
    }
}
