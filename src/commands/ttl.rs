use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

/// Returns the remaining time to live of a key that has a timeout, in seconds.
///
/// * `-2` if the key does not exist.
/// * `-1` if the key exists but has no associated expire.
///
/// Ref: <https://redis.io/docs/latest/commands/ttl/>
#[derive(Debug, PartialEq)]
pub struct Ttl {
    pub key: String,
}

impl Executable for Ttl {
    fn exec(self, store: &Store) -> Result<Frame, CommandError> {
        let mut state = store.lock();
        let ttl = if state.exists(&self.key) { -1 } else { -2 };
        let ttl = state
            .get_ttl(&self.key)
            // Rounded to the closest second.
            .map(|ttl| ((ttl.as_millis() + 500) / 1000) as i64)
            .unwrap_or(ttl);

        Ok(Frame::Integer(ttl))
    }
}

impl TryFrom<&mut CommandParser> for Ttl {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;

        Ok(Self { key })
    }
}
