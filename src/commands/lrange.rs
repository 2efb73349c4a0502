use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

/// Returns the specified elements of the list stored at `key`. `start` and `stop` are zero-based
/// and both inclusive. Out of range indexes do not produce an error: a `start` past the end of
/// the list, or larger than `stop`, results in an empty list, and a `stop` past the end is
/// treated as the last element.
///
/// **NOTE**: negative offsets are not supported. When `key` holds a string `nil` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/lrange/>
#[derive(Debug, PartialEq)]
pub struct Lrange {
    pub key: String,
    pub start: usize,
    pub stop: usize,
}

impl Executable for Lrange {
    fn exec(self, store: &Store) -> Result<Frame, CommandError> {
        let values = store.lock().range(&self.key, self.start, self.stop);

        match values {
            Some(values) => Ok(Frame::Array(values.into_iter().map(Frame::Bulk).collect())),
            None => Ok(Frame::Null),
        }
    }
}

impl TryFrom<&mut CommandParser> for Lrange {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;
        parser.finish()?;

        Ok(Self {
            key,
            start: index(start)?,
            stop: index(stop)?,
        })
    }
}

fn index(value: i64) -> Result<usize, CommandError> {
    if value < 0 {
        return Err(CommandError::InvalidArgument(
            "value is out of range, must be positive".to_string(),
        ));
    }

    Ok(usize::try_from(value).unwrap_or(usize::MAX))
}
