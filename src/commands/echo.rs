use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

/// Returns `message`.
///
/// Ref: <https://redis.io/docs/latest/commands/echo/>
#[derive(Debug, PartialEq)]
pub struct Echo {
    pub message: Bytes,
}

impl Executable for Echo {
    fn exec(self, _store: &Store) -> Result<Frame, CommandError> {
        Ok(Frame::Bulk(self.message))
    }
}

impl TryFrom<&mut CommandParser> for Echo {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let message = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::args;
    use crate::commands::{execute, Command};

    #[test]
    fn message() {
        let cmd = Command::try_from(args(&["ECHO", "hey"])).unwrap();

        assert_eq!(
            cmd,
            Command::Echo(Echo {
                message: Bytes::from("hey")
            })
        );

        let result = cmd.exec(&Store::new()).unwrap();

        assert_eq!(result, Frame::Bulk(Bytes::from("hey")));
    }

    #[test]
    fn missing_message() {
        let result = execute(args(&["ECHO"]), &Store::new());

        assert_eq!(
            result,
            Some(Frame::Error(
                "ERR wrong number of arguments for 'echo' command".to_string()
            ))
        );
    }
}
