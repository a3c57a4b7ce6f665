//! Line-framed reads raced against the read timeout and the shutdown signal.

use super::error_handling::classify_read_error;
use crate::error::HandlerError;
use crate::state::SessionSettings;
use crate::state::managers::lifecycle::ShutdownWatcher;
use bytes::BytesMut;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, FramedRead, LinesCodec, LinesCodecError};

/// One decoded inbound frame.
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Line(String),
    /// A line longer than the limit. Its bytes are discarded up to the next `\n`.
    TooLong,
}

/// `LinesCodec` that reports an over-long line as a frame instead of an error.
///
/// `FramedRead` stops for good after the first decoder error, so the length
/// error must never reach it.
struct ChatLineCodec {
    lines: LinesCodec,
}

impl ChatLineCodec {
    fn new(max_line_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_line_length),
        }
    }
}

fn recover(
    decoded: Result<Option<String>, LinesCodecError>,
) -> Result<Option<Frame>, LinesCodecError> {
    match decoded {
        Ok(line) => Ok(line.map(Frame::Line)),
        Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Frame::TooLong)),
        Err(e) => Err(e),
    }
}

impl Decoder for ChatLineCodec {
    type Item = Frame;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        recover(self.lines.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        recover(self.lines.decode_eof(buf))
    }
}

/// Inbound half of a client stream.
///
/// Yields one line per call, without its `\n` (or `\r\n`).
pub(super) struct LineReader<R> {
    frames: FramedRead<R, ChatLineCodec>,
    shutdown: ShutdownWatcher,
    read_timeout: Option<Duration>,
}

impl<R> LineReader<R>
where
    R: AsyncRead + Unpin,
{
    pub(super) fn new(reader: R, settings: &SessionSettings, shutdown: ShutdownWatcher) -> Self {
        Self {
            frames: FramedRead::new(reader, ChatLineCodec::new(settings.max_line_length)),
            shutdown,
            read_timeout: settings.read_timeout,
        }
    }

    /// Read the next line.
    ///
    /// Shutdown wins over pending input. A clean end of stream is
    /// `HandlerError::EndOfStream`. An over-long line is
    /// `HandlerError::LineTooLong` and the reader stays usable.
    pub(super) async fn next_line(&mut self) -> Result<String, HandlerError> {
        let Self {
            frames,
            shutdown,
            read_timeout,
        } = self;

        let read = async {
            match *read_timeout {
                Some(limit) => tokio::time::timeout(limit, frames.next())
                    .await
                    .map_err(|_| HandlerError::ReadTimeout),
                None => Ok(frames.next().await),
            }
        };

        let frame = tokio::select! {
            biased;
            _ = shutdown.signaled() => return Err(HandlerError::Shutdown),
            frame = read => frame?,
        };

        match frame {
            Some(Ok(Frame::Line(line))) => Ok(line),
            Some(Ok(Frame::TooLong)) => Err(HandlerError::LineTooLong),
            Some(Err(e)) => Err(classify_read_error(e)),
            None => Err(HandlerError::EndOfStream),
        }
    }
}
