use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::{ListEnd, Store};

/// Insert all the specified values at the tail of the list stored at `key`, in the order they
/// are given. If `key` does not exist, it is created as an empty list before performing the
/// push. When `key` holds a string an error is returned and nothing is inserted.
///
/// Ref: <https://redis.io/docs/latest/commands/rpush/>
#[derive(Debug, PartialEq)]
pub struct Rpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Rpush {
    fn exec(self, store: &Store) -> Result<Frame, CommandError> {
        let len = store.lock().push(self.key, self.values, ListEnd::Back)?;

        Ok(Frame::Integer(len as i64))
    }
}

impl TryFrom<&mut CommandParser> for Rpush {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let values = parser.remaining_bytes()?;

        Ok(Self { key, values })
    }
}
