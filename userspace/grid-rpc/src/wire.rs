// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Byte layout of the per-tile RPC record and the closed set of request kinds.
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (changing a tag or an offset is a protocol break)
//! TEST_COVERAGE: Unit tests (host)
//!
//! Record shape (little-endian), located at `RPC_RECORD_OFFSET` in tile memory:
//! `[tag:u32][payload:24][response:u32]`
//!
//! INVARIANTS:
//!   - Tags are assigned in declaration order and never reused
//!   - Unused payload bytes are written as zero
//!   - Decoding never panics on arbitrary input

#![forbid(unsafe_code)]

use core::fmt;

use grid_abi::layout::RPC_RECORD_SIZE;

/// Offset of the request tag inside the record.
pub const TAG_OFFSET: usize = 0;
/// Offset of the payload inside the record.
pub const PAYLOAD_OFFSET: usize = 4;
/// Room reserved for the largest payload.
pub const PAYLOAD_LEN: usize = 24;
/// Offset of the response word inside the record.
pub const RESPONSE_OFFSET: usize = PAYLOAD_OFFSET + PAYLOAD_LEN;
/// Bytes written by the tile for one request (tag and payload).
pub const REQUEST_LEN: usize = RESPONSE_OFFSET;
/// Total record size.
pub const RECORD_LEN: usize = RESPONSE_OFFSET + 4;

const _: () = assert!(RECORD_LEN == RPC_RECORD_SIZE);
const _: () = assert!(LogData::ENCODED_LEN <= PAYLOAD_LEN);
const _: () = assert!(ImageUpdateData::ENCODED_LEN <= PAYLOAD_LEN);

/// Errors produced while decoding a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The buffer is shorter than a request.
    #[error("record truncated to {0} bytes")]
    Truncated(usize),
    /// The tag does not name any known request kind.
    #[error("unknown request tag {0:#x}")]
    UnknownTag(u32),
}

/// Request kinds, in tag order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RequestKind {
    /// The tile finished executing; handled by the dispatch loop itself.
    Done = 0,
    /// A new frame of image data is ready in tile memory.
    ImageUpdate = 1,
    /// Text staged in tile memory should be printed by the host.
    Log = 2,
}

impl RequestKind {
    /// Every kind, in tag order.
    pub const ALL: [Self; 3] = [Self::Done, Self::ImageUpdate, Self::Log];

    /// Wire tag.
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Maps a wire tag back to its kind.
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::Done),
            1 => Some(Self::ImageUpdate),
            2 => Some(Self::Log),
            _ => None,
        }
    }

    /// Human readable name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::ImageUpdate => "image_update",
            Self::Log => "log",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Text the tile wants printed: `len` bytes at `addr` in its memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogData {
    /// Tile-local address of the first byte.
    pub addr: u32,
    /// Number of bytes.
    pub len: u32,
}

impl LogData {
    /// Encoded payload size.
    pub const ENCODED_LEN: usize = 8;

    fn encode(&self, out: &mut [u8; PAYLOAD_LEN]) {
        out[0..4].copy_from_slice(&self.addr.to_le_bytes());
        out[4..8].copy_from_slice(&self.len.to_le_bytes());
    }

    fn decode(buf: &[u8; PAYLOAD_LEN]) -> Self {
        Self { addr: le_u32(buf, 0), len: le_u32(buf, 4) }
    }
}

/// A frame of image data published by the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageUpdateData {
    /// Tile-local address of the pixel data.
    pub addr: u32,
    /// Sequence number of this update.
    pub counter: u32,
    /// Smallest pixel value in the frame.
    pub min_value: u64,
    /// Largest pixel value in the frame.
    pub max_value: u64,
}

impl ImageUpdateData {
    /// Encoded payload size.
    pub const ENCODED_LEN: usize = 24;

    fn encode(&self, out: &mut [u8; PAYLOAD_LEN]) {
        out[0..4].copy_from_slice(&self.addr.to_le_bytes());
        out[4..8].copy_from_slice(&self.counter.to_le_bytes());
        out[8..16].copy_from_slice(&self.min_value.to_le_bytes());
        out[16..24].copy_from_slice(&self.max_value.to_le_bytes());
    }

    fn decode(buf: &[u8; PAYLOAD_LEN]) -> Self {
        Self {
            addr: le_u32(buf, 0),
            counter: le_u32(buf, 4),
            min_value: le_u64(buf, 8),
            max_value: le_u64(buf, 16),
        }
    }
}

/// A request that expects an answer from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    /// See [`ImageUpdateData`].
    ImageUpdate(ImageUpdateData),
    /// See [`LogData`].
    Log(LogData),
}

/// Anything a tile can leave in its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Terminal signal; carries no payload.
    Done,
    /// See [`ImageUpdateData`].
    ImageUpdate(ImageUpdateData),
    /// See [`LogData`].
    Log(LogData),
}

impl Request {
    /// The kind of this request.
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::Done => RequestKind::Done,
            Self::ImageUpdate(_) => RequestKind::ImageUpdate,
            Self::Log(_) => RequestKind::Log,
        }
    }
}

impl From<Call> for Request {
    fn from(call: Call) -> Self {
        match call {
            Call::ImageUpdate(data) => Self::ImageUpdate(data),
            Call::Log(data) => Self::Log(data),
        }
    }
}

/// Encodes the tag and payload of `request`.
pub fn encode_request(request: &Request) -> [u8; REQUEST_LEN] {
    let mut out = [0u8; REQUEST_LEN];
    out[TAG_OFFSET..TAG_OFFSET + 4].copy_from_slice(&request.kind().tag().to_le_bytes());
    let mut payload = [0u8; PAYLOAD_LEN];
    match request {
        Request::Done => {}
        Request::ImageUpdate(data) => data.encode(&mut payload),
        Request::Log(data) => data.encode(&mut payload),
    }
    out[PAYLOAD_OFFSET..RESPONSE_OFFSET].copy_from_slice(&payload);
    out
}

/// Decodes the request part of a record.
pub fn decode_request(buf: &[u8]) -> Result<Request, WireError> {
    if buf.len() < REQUEST_LEN {
        return Err(WireError::Truncated(buf.len()));
    }
    let tag = le_u32(buf, TAG_OFFSET);
    let kind = RequestKind::from_tag(tag).ok_or(WireError::UnknownTag(tag))?;
    let mut payload = [0u8; PAYLOAD_LEN];
    payload.copy_from_slice(&buf[PAYLOAD_OFFSET..RESPONSE_OFFSET]);
    Ok(match kind {
        RequestKind::Done => Request::Done,
        RequestKind::ImageUpdate => Request::ImageUpdate(ImageUpdateData::decode(&payload)),
        RequestKind::Log => Request::Log(LogData::decode(&payload)),
    })
}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(word)
}

fn le_u64(buf: &[u8], at: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(word)
}
