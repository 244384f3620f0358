//! Bridge to the QR pixel decoder
//!
//! The decoder is an explicit trait object handed to the bridge, so nothing about
//! a decode call lives in shared state and several scanners can run side by side.
//! Failing to find a code is the common case and comes back as a value; a decoder
//! that panics is caught here and reported the same way.

use bytes::Bytes;
use qrcam_core::PixelBuffer;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Content of a decoded QR code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecodedPayload(Bytes);

impl DecodedPayload {
    /// Payload from decoded text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(Bytes::from(text.into()))
    }

    /// Payload from raw bytes
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Raw payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload as text, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take the underlying buffer
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

/// Why a scan cycle produced no code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No code in the frame
    #[error("No QR code found in frame")]
    NotFound,

    /// A code was located but could not be read
    #[error("Malformed QR code: {reason}")]
    Malformed {
        /// Failure reason
        reason: String,
    },

    /// The video surface could not provide a frame
    #[error("Frame unavailable: {reason}")]
    FrameUnavailable {
        /// Failure reason
        reason: String,
    },

    /// The decoder failed internally
    #[error("Decoder fault: {reason}")]
    Internal {
        /// Failure reason
        reason: String,
    },

    /// The decoder panicked
    #[error("Decoder panicked: {message}")]
    Panicked {
        /// Panic message
        message: String,
    },
}

impl DecodeError {
    /// Whether this is an ordinary "nothing readable in this frame" outcome
    pub fn is_expected(&self) -> bool {
        matches!(self, DecodeError::NotFound | DecodeError::Malformed { .. })
    }
}

/// QR pixel decoder supplied by the host
pub trait QrDecoder: Send + Sync {
    /// Decode the code visible in `frame`
    fn decode(&self, frame: &PixelBuffer) -> Result<DecodedPayload, DecodeError>;
}

impl<F> QrDecoder for F
where
    F: Fn(&PixelBuffer) -> Result<DecodedPayload, DecodeError> + Send + Sync,
{
    fn decode(&self, frame: &PixelBuffer) -> Result<DecodedPayload, DecodeError> {
        self(frame)
    }
}

/// Submits frames to a decoder, turning panics into errors
#[derive(Clone)]
pub struct DecodeBridge {
    decoder: Arc<dyn QrDecoder>,
}

impl DecodeBridge {
    /// Wrap a decoder
    pub fn new(decoder: Arc<dyn QrDecoder>) -> Self {
        Self { decoder }
    }

    /// Decode `frame` synchronously
    pub fn submit(&self, frame: &PixelBuffer) -> Result<DecodedPayload, DecodeError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.decoder.decode(frame))) {
            Ok(result) => result,
            Err(payload) => Err(DecodeError::Panicked {
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(feature = "rqrr")]
pub use rqrr_decoder::RqrrDecoder;

#[cfg(feature = "rqrr")]
mod rqrr_decoder {
    use super::{DecodeError, DecodedPayload, QrDecoder};
    use qrcam_core::PixelBuffer;
    use tracing::debug;

    /// Decoder backed by the `rqrr` crate, reading the frame's luma
    #[derive(Debug, Default, Clone, Copy)]
    pub struct RqrrDecoder;

    impl QrDecoder for RqrrDecoder {
        fn decode(&self, frame: &PixelBuffer) -> Result<DecodedPayload, DecodeError> {
            let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
                frame.width() as usize,
                frame.height() as usize,
                |x, y| frame.luma(x as u32, y as u32),
            );

            let grids = prepared.detect_grids();
            if grids.is_empty() {
                return Err(DecodeError::NotFound);
            }
            debug!("Found {} potential QR grids", grids.len());

            let mut last_error = String::new();
            for grid in grids {
                match grid.decode() {
                    Ok((_, content)) => return Ok(DecodedPayload::from_text(content)),
                    Err(e) => {
                        debug!("Grid decode failed: {:?}", e);
                        last_error = format!("{:?}", e);
                    }
                }
            }

            Err(DecodeError::Malformed { reason: last_error })
        }
    }

}
