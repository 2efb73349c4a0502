use futures::{SinkExt, StreamExt};
use std::io;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::codec::{FrameCodec, Request};
use crate::frame::Frame;
use crate::Error;

/// A client connection. Requests are read and replies written through [`FrameCodec`], which
/// keeps whatever bytes have not formed a full frame yet buffered between reads.
pub struct Connection {
    pub id: Uuid,
    framed: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream, codec: FrameCodec) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            framed: Framed::new(stream, codec),
        }
    }

    /// Reads the next request. `None` means the peer went away, either cleanly or by resetting
    /// the connection, possibly in the middle of a frame.
    pub async fn read_request(&mut self) -> Result<Option<Request>, Error> {
        match self.framed.next().await {
            Some(Ok(request)) => Ok(Some(request)),
            Some(Err(err)) if is_disconnect(&err) => Ok(None),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }

    pub async fn write_frame(&mut self, frame: Frame) -> Result<(), Error> {
        self.framed.send(frame).await
    }
}

fn is_disconnect(err: &Error) -> bool {
    err.downcast_ref::<io::Error>().is_some_and(|err| {
        matches!(
            err.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::UnexpectedEof
        )
    })
}
