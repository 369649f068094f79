//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use bytes::Bytes;
use tagwire::{FrameHeader, HEADER_LEN, Transport, TransportError};

/// Transport double capturing every frame the connection sends.
#[derive(Default)]
pub struct CaptureTransport {
    sent: Mutex<Vec<Bytes>>,
    fail_writes: AtomicBool,
}

impl CaptureTransport {
    pub fn new() -> Self { Self::default() }

    /// All frames sent so far, in order.
    pub fn sent(&self) -> Vec<Bytes> { self.sent.lock().expect("lock").clone() }

    pub fn sent_count(&self) -> usize { self.sent.lock().expect("lock").len() }

    /// Make every subsequent write fail with `TransportError::Closed`.
    pub fn fail_writes(&self) { self.fail_writes.store(true, Ordering::SeqCst); }

    /// Parse the header of the `index`th sent frame.
    pub fn header(&self, index: usize) -> FrameHeader {
        let frames = self.sent();
        let frame = frames.get(index).expect("frame sent");
        let bytes: [u8; HEADER_LEN] = frame[..HEADER_LEN].try_into().expect("header length");
        FrameHeader::parse(&bytes)
    }
}

#[async_trait]
impl Transport for CaptureTransport {
    async fn send(&self, frame: Bytes) -> Result<(), TransportError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.sent.lock().expect("lock").push(frame);
        Ok(())
    }
}

/// Yield until `transport` has captured at least `count` frames.
///
/// Panics rather than hanging if the frames never appear.
pub async fn wait_for_frames(transport: &CaptureTransport, count: usize) {
    for _ in 0..1_000 {
        if transport.sent_count() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "expected {count} frames, saw {} after 1000 yields",
        transport.sent_count()
    );
}
