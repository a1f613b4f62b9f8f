//! Length-delimited framer for MeshCore companion serial frames.
//!
//! Frames on the serial link are emitted as:
//!
//!   `<marker byte><u16 little-endian length><payload bytes>`
//!
//! with distinct marker bytes for the host-to-device and device-to-host
//! directions. This module provides a small incremental accumulator that
//! can be fed arbitrary chunks and yields whole payloads when available.
//! It applies a conservative size limit and attempts simple
//! resynchronization on malformed input by advancing a byte.

use bytes::{Buf, BytesMut};

/// Marker on frames sent host -> device.
pub const FRAME_TO_DEVICE: u8 = b'<';
/// Marker on frames received device -> host.
pub const FRAME_FROM_DEVICE: u8 = b'>';

/// Companion frames are tiny; anything bigger is line noise.
const MAX_FRAME_SIZE: usize = 4096;

/// Incremental accumulator for device -> host frames.
pub struct FrameAccumulator {
    buf: BytesMut,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(1024),
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Attempt to extract the next complete frame payload. Returns
    /// `Some(payload)` if a full frame is available, otherwise `None`. On
    /// malformed data (bad marker or oversize length) it drops the leading
    /// byte and continues (resynchronization attempt).
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        loop {
            if self.buf.is_empty() {
                return None;
            }
            if self.buf[0] != FRAME_FROM_DEVICE {
                self.buf.advance(1);
                continue;
            }
            if self.buf.len() < 3 {
                return None;
            }
            let len = u16::from_le_bytes([self.buf[1], self.buf[2]]) as usize;
            if len == 0 || len > MAX_FRAME_SIZE {
                self.buf.advance(1);
                continue;
            }
            if self.buf.len() < 3 + len {
                return None;
            }
            let _ = self.buf.split_to(3); // discard marker + length
            return Some(self.buf.split_to(len).to_vec());
        }
    }
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap a command payload in a host -> device frame.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 3);
    out.push(FRAME_TO_DEVICE);
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
    out
}
