use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};

/// An encoded still image ready to be sent over the network.
///
/// Not `Clone`: a payload is produced once per capture and moved into the
/// inference call that consumes it.
#[derive(Debug)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    media_type: &'static str,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
}

impl ImagePayload {
    pub(crate) fn new(
        bytes: Vec<u8>,
        media_type: &'static str,
        width: u32,
        height: u32,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            bytes,
            media_type,
            width,
            height,
            captured_at,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Standard, padded base64 of the encoded bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}
