use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;

/// Returns the string representation of the type of the value stored at `key`.
///
/// The different types that can be returned are: `string` and `list`. If the key does not
/// exist, `none` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/type/>
#[derive(Debug, PartialEq)]
pub struct Type {
    pub key: String,
}

impl Executable for Type {
    fn exec(self, store: &Store) -> Result<Frame, CommandError> {
        let type_ = match store.lock().kind(&self.key) {
            Some(kind) => kind.as_ref().to_string(),
            None => "none".to_string(),
        };

        Ok(Frame::Simple(type_))
    }
}

impl TryFrom<&mut CommandParser> for Type {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;

        Ok(Self { key })
    }
}
