use bytes::Bytes;
use std::str;
use tokio::time::Duration;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

/// Set `key` to hold the string `value`. If `key` already holds a value, it is overwritten,
/// regardless of its type. Any previous time to live associated with the key is discarded.
///
/// Options:
///
/// * `EX seconds`: set the specified expire time, in seconds (a positive integer).
/// * `PX milliseconds`: set the specified expire time, in milliseconds (a positive integer).
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: Bytes,
    pub ttl: Option<Ttl>,
}

#[derive(Debug, PartialEq)]
pub enum Ttl {
    Ex(u64),
    Px(u64),
}

impl Ttl {
    pub fn duration(&self) -> Duration {
        match self {
            Ttl::Ex(seconds) => Duration::from_secs(*seconds),
            Ttl::Px(millis) => Duration::from_millis(*millis),
        }
    }
}

impl Executable for Set {
    fn exec(self, store: &Store) -> Result<Frame, CommandError> {
        let mut store = store.lock();

        match self.ttl {
            Some(ttl) => store.set_with_ttl(self.key, self.value, ttl.duration()),
            None => store.set(self.key, self.value),
        }

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.next_bytes()?;

        let mut ttl = None;

        while parser.has_next() {
            let option = parser.next_string()?;

            match option.to_uppercase().as_str() {
                "EX" if ttl.is_none() => ttl = Some(Ttl::Ex(next_expire_time(parser)?)),
                "PX" if ttl.is_none() => ttl = Some(Ttl::Px(next_expire_time(parser)?)),
                // Unexpected or repeated option.
                _ => return Err(CommandError::Syntax),
            }
        }

        Ok(Self { key, value, ttl })
    }
}

fn next_expire_time(parser: &mut CommandParser) -> Result<u64, CommandError> {
    if !parser.has_next() {
        return Err(CommandError::Syntax);
    }

    let value = parser.next_bytes()?;

    str::from_utf8(&value)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&value| value > 0)
        .ok_or_else(|| {
            CommandError::InvalidArgument(format!(
                "invalid expire time in '{}' command",
                parser.command()
            ))
        })
}
