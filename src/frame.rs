// https://redis.io/docs/reference/protocol-spec

use std::fmt;
use std::io::Cursor;
use std::str;

use bytes::{Buf, BufMut, Bytes};
use thiserror::Error as ThisError;

pub(crate) static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("unsupported frame type '{}'", char::from(*.0))]
    UnsupportedFrameType(u8),
    #[error("{0}")]
    MalformedFrame(String),
    #[error("bulk string of length {0} is not terminated by CRLF")]
    UnterminatedBulk(usize),
}

/// A single RESP2 value. Commands produce one of these as their reply and the codec turns it
/// into bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    /// Parses any RESP2 frame. Used to read replies, requests go through
    /// [`crate::codec::decode`] which only accepts arrays of bulk strings.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        // The first byte in an RESP-serialized payload always identifies its type.
        // Subsequent bytes constitute the type's contents.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => Ok(Frame::Simple(get_string(src)?)),
            DataType::SimpleError => Ok(Frame::Error(get_string(src)?)),
            DataType::Integer => Ok(Frame::Integer(get_integer(src)?)),
            // $<length>\r\n<data>\r\n
            DataType::BulkString => match get_length(src)? {
                Some(length) => Ok(Frame::Bulk(get_bulk(src, length)?)),
                None => Ok(Frame::Null),
            },
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => {
                let length = match get_length(src)? {
                    Some(length) => length,
                    None => return Ok(Frame::Null),
                };

                let mut frames = Vec::with_capacity(length.min(src.remaining()));
                for _ in 0..length {
                    frames.push(Self::parse(src)?);
                }

                Ok(Frame::Array(frames))
            }
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes);
        bytes
    }

    pub fn write_to<B: BufMut>(&self, dst: &mut B) {
        match self {
            Frame::Simple(s) => {
                dst.put_u8(u8::from(DataType::SimpleString));
                dst.put_slice(s.as_bytes());
                dst.put_slice(CRLF);
            }
            Frame::Error(s) => {
                dst.put_u8(u8::from(DataType::SimpleError));
                dst.put_slice(s.as_bytes());
                dst.put_slice(CRLF);
            }
            Frame::Integer(i) => {
                dst.put_u8(u8::from(DataType::Integer));
                dst.put_slice(i.to_string().as_bytes());
                dst.put_slice(CRLF);
            }
            Frame::Bulk(bytes) => {
                dst.put_u8(u8::from(DataType::BulkString));
                dst.put_slice(bytes.len().to_string().as_bytes());
                dst.put_slice(CRLF);
                dst.put_slice(bytes);
                dst.put_slice(CRLF);
            }
            // RESP2 null bulk string.
            Frame::Null => {
                dst.put_u8(u8::from(DataType::BulkString));
                dst.put_slice(b"-1");
                dst.put_slice(CRLF);
            }
            Frame::Array(arr) => {
                dst.put_u8(u8::from(DataType::Array));
                dst.put_slice(arr.len().to_string().as_bytes());
                dst.put_slice(CRLF);
                for frame in arr {
                    frame.write_to(dst);
                }
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(arr) => {
                write!(f, "*{}", arr.len())?;
                for frame in arr {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}

/// Returns the bytes up to the next CRLF and moves the cursor past it.
pub(crate) fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let data: &'a [u8] = *src.get_ref();

    let end = data[start..]
        .windows(2)
        .position(|window| window == CRLF)
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    src.set_position((end + CRLF.len()) as u64);

    Ok(&data[start..end])
}

pub(crate) fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

fn get_string(src: &mut Cursor<&[u8]>) -> Result<String, Error> {
    let line = get_line(src)?;
    str::from_utf8(line)
        .map(|s| s.to_string())
        .map_err(|_| Error::MalformedFrame("invalid UTF-8 in simple frame".to_string()))
}

pub(crate) fn get_integer(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = get_line(src)?;
    str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            Error::MalformedFrame(format!(
                "invalid integer '{}'",
                String::from_utf8_lossy(line)
            ))
        })
}

/// Reads a bulk or array length. `-1` is the RESP2 null marker and yields `None`, any other
/// negative value is malformed.
pub(crate) fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, Error> {
    match get_integer(src)? {
        -1 => Ok(None),
        length if length < 0 => Err(Error::MalformedFrame(format!(
            "invalid length {}",
            length
        ))),
        length => usize::try_from(length)
            .map(Some)
            .map_err(|_| Error::MalformedFrame(format!("invalid length {}", length))),
    }
}

/// Reads exactly `length` bytes followed by CRLF. The payload may itself contain CRLF.
pub(crate) fn get_bulk(src: &mut Cursor<&[u8]>, length: usize) -> Result<Bytes, Error> {
    let start = src.position() as usize;
    let end = start
        .checked_add(length)
        .ok_or_else(|| Error::MalformedFrame(format!("invalid length {}", length)))?;
    let data = *src.get_ref();

    if data.len() < end + CRLF.len() {
        return Err(Error::Incomplete);
    }

    if &data[end..end + CRLF.len()] != CRLF {
        return Err(Error::UnterminatedBulk(length));
    }

    let bytes = Bytes::copy_from_slice(&data[start..end]);
    src.set_position((end + CRLF.len()) as u64);

    Ok(bytes)
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    Array,        // '*'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            _ => Err(Error::UnsupportedFrameType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::Array => b'*',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_string_frame() {
        let data = b"+OK\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(frame, Ok(Frame::Simple(ref s)) if s == "OK"));
    }

    #[test]
    fn parse_simple_error_frame() {
        let data = b"-Error message\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(
            frame,
            Ok(Frame::Error(ref s)) if s == "Error message"
        ));
    }

    fn parse_integer_frame(data: &[u8], expected: i64) {
        let mut cursor = Cursor::new(data);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(frame, Ok(Frame::Integer(i)) if i == expected));
    }

    #[test]
    fn parse_integer_frame_positive() {
        parse_integer_frame(b":1000\r\n", 1000);
    }

    #[test]
    fn parse_integer_frame_negative() {
        parse_integer_frame(b":-1000\r\n", -1000);
    }

    #[test]
    fn parse_integer_frame_positive_signed() {
        parse_integer_frame(b":+1000\r\n", 1000);
    }

    #[test]
    fn parse_bulk_string_frame() {
        let data = b"$6\r\nfoobar\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert_eq!(frame, Ok(Frame::Bulk(Bytes::from("foobar"))));
    }

    #[test]
    fn parse_bulk_string_frame_containing_crlf() {
        let data = b"$4\r\na\r\nb\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert_eq!(frame, Ok(Frame::Bulk(Bytes::from("a\r\nb"))));
        assert_eq!(cursor.position() as usize, data.len());
    }

    #[test]
    fn parse_bulk_string_frame_empty() {
        let data = b"$0\r\n\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert_eq!(frame, Ok(Frame::Bulk(Bytes::new())));
    }

    #[test]
    fn parse_bulk_string_frame_null() {
        let data = b"$-1\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert_eq!(frame, Ok(Frame::Null));
    }

    #[test]
    fn parse_bulk_string_frame_incomplete() {
        let data = b"$6\r\nfoo";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert_eq!(frame, Err(Error::Incomplete));
    }

    #[test]
    fn parse_bulk_string_frame_wrong_length() {
        let data = b"$3\r\nhello\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert_eq!(frame, Err(Error::UnterminatedBulk(3)));
    }

    #[test]
    fn parse_array_frame_empty() {
        let data = b"*0\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(frame, Ok(Frame::Array(ref a)) if a.is_empty()));
    }

    #[test]
    fn parse_array_frame_nested() {
        let data = b"*2\r\n*3\r\n:1\r\n:2\r\n:3\r\n*2\r\n+Hello\r\n-World\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert_eq!(
            frame,
            Ok(Frame::Array(vec![
                Frame::Array(vec![
                    Frame::Integer(1),
                    Frame::Integer(2),
                    Frame::Integer(3)
                ]),
                Frame::Array(vec![
                    Frame::Simple("Hello".to_string()),
                    Frame::Error("World".to_string())
                ]),
            ]))
        );
    }

    #[test]
    fn parse_array_frame_null() {
        let data = b"*-1\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert_eq!(frame, Ok(Frame::Null));
    }

    #[test]
    fn parse_array_frame_negative_length() {
        let data = b"*-3\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(frame, Err(Error::MalformedFrame(_))));
    }

    #[test]
    fn parse_array_frame_null_in_the_middle() {
        let data = b"*3\r\n$5\r\nhello\r\n$-1\r\n$5\r\nworld\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert_eq!(
            frame,
            Ok(Frame::Array(vec![
                Frame::Bulk(Bytes::from("hello")),
                Frame::Null,
                Frame::Bulk(Bytes::from("world")),
            ]))
        );
    }

    #[test]
    fn parse_unsupported_type() {
        let data = b"#t\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert_eq!(frame, Err(Error::UnsupportedFrameType(b'#')));
    }

    #[test]
    fn serialize_replies() {
        assert_eq!(Frame::Simple("PONG".to_string()).serialize(), b"+PONG\r\n");
        assert_eq!(Frame::Error("ERR boom".to_string()).serialize(), b"-ERR boom\r\n");
        assert_eq!(Frame::Integer(-42).serialize(), b":-42\r\n");
        assert_eq!(Frame::Bulk(Bytes::from("hey")).serialize(), b"$3\r\nhey\r\n");
        assert_eq!(Frame::Bulk(Bytes::new()).serialize(), b"$0\r\n\r\n");
        assert_eq!(Frame::Null.serialize(), b"$-1\r\n");
    }

    #[test]
    fn serialize_nested_array() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("a")),
            Frame::Array(vec![Frame::Integer(1), Frame::Null]),
            Frame::Array(vec![]),
        ]);

        assert_eq!(
            frame.serialize(),
            b"*3\r\n$1\r\na\r\n*2\r\n:1\r\n$-1\r\n*0\r\n".to_vec()
        );
    }

    #[test]
    fn serialized_reply_parses_back() {
        let frame = Frame::Array(vec![
            Frame::Simple("OK".to_string()),
            Frame::Bulk(Bytes::from("bar")),
            Frame::Integer(7),
            Frame::Error("WRONGTYPE nope".to_string()),
            Frame::Null,
        ]);
        let bytes = frame.serialize();
        let mut cursor = Cursor::new(&bytes[..]);

        assert_eq!(Frame::parse(&mut cursor), Ok(frame));
    }
}
