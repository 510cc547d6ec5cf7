//! Line framing shared by every channel.

use crate::error::ChannelError;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};
use tracing::warn;

/// Longest frame accepted or sent, in bytes (excluding the terminator)
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Codec used on both ends of every channel
pub fn line_codec() -> LinesCodec {
    LinesCodec::new_with_max_length(MAX_FRAME_LEN)
}

/// Inbound framing that drops over-long lines and keeps decoding.
///
/// `LinesCodec` reports an over-long line as an error, which puts `FramedRead`
/// into a state where buffered lines behind it wait for the next socket read.
/// Skipping the line inside the decoder keeps the reader in its normal state.
#[derive(Debug)]
pub struct FrameDecoder {
    lines: LinesCodec,
    dropped: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            lines: line_codec(),
            dropped: 0,
        }
    }

    /// Over-long frames skipped so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn note_dropped(&mut self) {
        self.dropped += 1;
        warn!(max_len = MAX_FRAME_LEN, "Dropping over-long frame");
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameDecoder {
    type Item = String;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        loop {
            match self.lines.decode(buf) {
                Err(LinesCodecError::MaxLineLengthExceeded) => self.note_dropped(),
                other => return other,
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        loop {
            match self.lines.decode_eof(buf) {
                Err(LinesCodecError::MaxLineLengthExceeded) => self.note_dropped(),
                other => return other,
            }
        }
    }
}

/// Reject frames that would break newline framing on the wire.
pub fn check_frame(frame: &str) -> Result<(), ChannelError> {
    if frame.contains(['\n', '\r']) {
        return Err(ChannelError::EmbeddedNewline);
    }
    if frame.len() > MAX_FRAME_LEN {
        return Err(ChannelError::FrameTooLong(MAX_FRAME_LEN));
    }
    Ok(())
}

pub(crate) fn map_codec_error(err: LinesCodecError) -> ChannelError {
    match err {
        LinesCodecError::MaxLineLengthExceeded => ChannelError::FrameTooLong(MAX_FRAME_LEN),
        LinesCodecError::Io(e) => ChannelError::Io(e),
    }
}
