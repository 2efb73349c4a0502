use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::{ListEnd, Store};

/// Insert all the specified values at the head of the list stored at `key`. If `key` does not
/// exist, it is created as an empty list before performing the push. When `key` holds a string
/// an error is returned and nothing is inserted.
///
/// Elements are inserted one after the other, so `LPUSH mylist a b c` results in a list
/// containing `c` as first element, `b` as second and `a` as third.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Lpush {
    fn exec(self, store: &Store) -> Result<Frame, CommandError> {
        let len = store.lock().push(self.key, self.values, ListEnd::Front)?;

        Ok(Frame::Integer(len as i64))
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let values = parser.remaining_bytes()?;

        Ok(Self { key, values })
    }
}
