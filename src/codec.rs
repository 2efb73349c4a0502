use bytes::{Buf, Bytes, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::frame::{self, Error, Frame};

pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// One decoded request: the argument vector of a command, or the protocol error that made the
/// buffered input unreadable. Protocol errors are items rather than decoder errors so the
/// connection can answer them and keep going.
pub type Request = Result<Vec<Bytes>, Error>;

/// Decodes a single request, an array of bulk strings:
///
/// `*<count>\r\n$<len>\r\n<arg>\r\n...`
///
/// Returns [`Error::Incomplete`] when `src` only holds a prefix of a valid request. On any error
/// found in a `*` or `$` header the cursor is left at the start of that header line.
pub fn decode(src: &mut Cursor<&[u8]>) -> Result<Vec<Bytes>, Error> {
    // Clients send commands to the server as RESP arrays.
    let count = header(src, |src| match frame::get_byte(src)? {
        b'*' => frame::get_length(src)?
            .ok_or_else(|| Error::MalformedFrame("invalid multibulk length".to_string())),
        byte => Err(Error::UnsupportedFrameType(byte)),
    })?;

    let mut args = Vec::with_capacity(count.min(src.remaining()));
    for _ in 0..count {
        let length = header(src, |src| match frame::get_byte(src)? {
            b'$' => frame::get_length(src)?
                .ok_or_else(|| Error::MalformedFrame("invalid bulk length".to_string())),
            byte => Err(Error::MalformedFrame(format!(
                "expected '$', got '{}'",
                char::from(byte)
            ))),
        })?;
        args.push(frame::get_bulk(src, length)?);
    }

    Ok(args)
}

fn header<T>(
    src: &mut Cursor<&[u8]>,
    read: impl FnOnce(&mut Cursor<&[u8]>) -> Result<T, Error>,
) -> Result<T, Error> {
    let start = src.position();
    let res = read(src);
    if res.is_err() {
        src.set_position(start);
    }
    res
}

/// Where decoding resumes after a protocol error, the byte after the CRLF ending the offending
/// header line. `None` while that line has not been fully received.
fn resync_point(src: &[u8], line_start: usize) -> Option<usize> {
    src[line_start..]
        .windows(frame::CRLF.len())
        .position(|window| window == frame::CRLF)
        .map(|index| line_start + index + frame::CRLF.len())
}

/// Inverse of [`decode`], used by clients and tests to build requests.
pub fn encode_request<I, T>(args: I) -> Vec<u8>
where
    I: IntoIterator<Item = T>,
    T: Into<Bytes>,
{
    let frame = Frame::Array(
        args.into_iter()
            .map(|arg| Frame::Bulk(arg.into()))
            .collect(),
    );
    frame.serialize()
}

pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> FrameCodec {
        FrameCodec { max_frame_size }
    }

    fn wait_for_more(&self, src: &BytesMut) -> Result<Option<Request>, crate::Error> {
        // Check if the frame size exceeds a certain limit to prevent DoS attacks.
        if src.len() > self.max_frame_size {
            return Err("frame size exceeds limit".into());
        }
        Ok(None)
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Request;
    type Error = crate::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut cursor = Cursor::new(&src[..]);
        let res = decode(&mut cursor);
        let position = cursor.position() as usize;

        match res {
            Ok(args) => {
                // Remove the parsed frame from the buffer.
                src.advance(position);
                Ok(Some(Ok(args)))
            }
            Err(Error::Incomplete) => self.wait_for_more(src),
            Err(err @ Error::UnterminatedBulk(_)) => {
                // The declared length cannot be trusted, so there is no way to find where the
                // next frame starts. Drop everything buffered.
                src.clear();
                Ok(Some(Err(err)))
            }
            Err(err) => match resync_point(src, position) {
                // Only the bad header line is dropped, pipelined requests after it survive.
                Some(next) => {
                    src.advance(next);
                    Ok(Some(Err(err)))
                }
                None => self.wait_for_more(src),
            },
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(request) => Ok(Some(request)),
            None => {
                if !src.is_empty() {
                    debug!("Discarding {} bytes of incomplete frame at EOF", src.len());
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = crate::Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        frame.write_to(dst);
        Ok(())
    }
}
