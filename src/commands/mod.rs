pub mod client;
pub mod dbsize;
pub mod del;
pub mod echo;
pub mod executable;
pub mod exists;
pub mod get;
pub mod llen;
pub mod lpush;
pub mod lrange;
pub mod ping;
pub mod pttl;
pub mod rpush;
pub mod set;
pub mod ttl;
pub mod type_;

use bytes::Bytes;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::{Store, WrongKind};

use client::Client;
use dbsize::DBSize;
use del::Del;
use echo::Echo;
use exists::Exists;
use get::Get;
use llen::Llen;
use lpush::Lpush;
use lrange::Lrange;
use ping::Ping;
use pttl::Pttl;
use rpush::Rpush;
use set::Set;
use ttl::Ttl;
use type_::Type;

/// Runs the command described by `args` against `store` and returns the reply to send back.
///
/// An empty argument vector is not a command and produces no reply. Every other failure is
/// turned into an error reply here, nothing is propagated to the connection.
pub fn execute(args: Vec<Bytes>, store: &Store) -> Option<Frame> {
    if args.is_empty() {
        return None;
    }

    let res = Command::try_from(args).and_then(|cmd| cmd.exec(store));

    Some(res.unwrap_or_else(|err| Frame::Error(err.to_string())))
}

#[derive(Debug, PartialEq)]
pub enum Command {
    DBsize(DBSize),
    Del(Del),
    Echo(Echo),
    Exists(Exists),
    Get(Get),
    Llen(Llen),
    Lpush(Lpush),
    Lrange(Lrange),
    Pttl(Pttl),
    Rpush(Rpush),
    Set(Set),
    Ttl(Ttl),
    Type(Type),

    Client(Client),
    Ping(Ping),
}

impl Executable for Command {
    fn exec(self, store: &Store) -> Result<Frame, CommandError> {
        match self {
            Command::Client(cmd) => cmd.exec(store),
            Command::DBsize(cmd) => cmd.exec(store),
            Command::Del(cmd) => cmd.exec(store),
            Command::Echo(cmd) => cmd.exec(store),
            Command::Exists(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::Llen(cmd) => cmd.exec(store),
            Command::Lpush(cmd) => cmd.exec(store),
            Command::Lrange(cmd) => cmd.exec(store),
            Command::Ping(cmd) => cmd.exec(store),
            Command::Pttl(cmd) => cmd.exec(store),
            Command::Rpush(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::Ttl(cmd) => cmd.exec(store),
            Command::Type(cmd) => cmd.exec(store),
        }
    }
}

/// Parses an argument vector. Unlike [`execute`], an empty vector is an error here.
impl TryFrom<Vec<Bytes>> for Command {
    type Error = CommandError;

    fn try_from(args: Vec<Bytes>) -> Result<Self, Self::Error> {
        let mut parts = args.into_iter();

        let command_name = parts.next().ok_or(CommandError::EmptyCommand)?;
        let command_name = str::from_utf8(&command_name)?;

        let name = command_name.to_lowercase();
        let parser = &mut CommandParser {
            command: name.clone(),
            parts,
        };

        match &name[..] {
            "client" => Client::try_from(parser).map(Command::Client),
            "dbsize" => DBSize::try_from(parser).map(Command::DBsize),
            "del" => Del::try_from(parser).map(Command::Del),
            "echo" => Echo::try_from(parser).map(Command::Echo),
            "exists" => Exists::try_from(parser).map(Command::Exists),
            "get" => Get::try_from(parser).map(Command::Get),
            "llen" => Llen::try_from(parser).map(Command::Llen),
            "lpush" => Lpush::try_from(parser).map(Command::Lpush),
            "lrange" => Lrange::try_from(parser).map(Command::Lrange),
            "ping" => Ping::try_from(parser).map(Command::Ping),
            "pttl" => Pttl::try_from(parser).map(Command::Pttl),
            "rpush" => Rpush::try_from(parser).map(Command::Rpush),
            "set" => Set::try_from(parser).map(Command::Set),
            "ttl" => Ttl::try_from(parser).map(Command::Ttl),
            "type" => Type::try_from(parser).map(Command::Type),
            _ => Err(CommandError::UnknownCommand {
                command: command_name.to_string(),
            }),
        }
    }
}

/// Walks the arguments that follow the command name.
pub struct CommandParser {
    command: String,
    parts: vec::IntoIter<Bytes>,
}

impl CommandParser {
    /// The lowercase command name, as used in error messages.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn has_next(&self) -> bool {
        self.parts.len() > 0
    }

    pub fn next_bytes(&mut self) -> Result<Bytes, CommandError> {
        self.parts.next().ok_or_else(|| self.wrong_arity())
    }

    /// Keys and options must be valid UTF-8, values are kept as raw bytes.
    pub fn next_string(&mut self) -> Result<String, CommandError> {
        let bytes = self.next_bytes()?;

        str::from_utf8(&bytes)
            .map(|s| s.to_string())
            .map_err(CommandError::InvalidUTF8String)
    }

    pub fn next_integer(&mut self) -> Result<i64, CommandError> {
        let bytes = self.next_bytes()?;

        str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(CommandError::NotAnInteger)
    }

    /// Collects every remaining argument as a string. At least one is required.
    pub fn remaining_strings(&mut self) -> Result<Vec<String>, CommandError> {
        let mut strings = vec![self.next_string()?];
        while self.has_next() {
            strings.push(self.next_string()?);
        }
        Ok(strings)
    }

    /// Collects every remaining argument as bytes. At least one is required.
    pub fn remaining_bytes(&mut self) -> Result<Vec<Bytes>, CommandError> {
        let mut values = vec![self.next_bytes()?];
        values.extend(self.parts.by_ref());
        Ok(values)
    }

    /// Fails if there are arguments left over.
    pub fn finish(&self) -> Result<(), CommandError> {
        if self.has_next() {
            return Err(self.wrong_arity());
        }
        Ok(())
    }

    fn wrong_arity(&self) -> CommandError {
        CommandError::WrongArity {
            command: self.command.clone(),
        }
    }
}

/// Everything that can go wrong between receiving an argument vector and producing a reply.
/// The `Display` output is the error reply sent to the client.
#[derive(Debug, ThisError, PartialEq)]
pub enum CommandError {
    #[error("ERR empty command")]
    EmptyCommand,
    #[error("ERR unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("ERR wrong number of arguments for '{command}' command")]
    WrongArity { command: String },
    #[error("ERR syntax error")]
    Syntax,
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR {0}")]
    InvalidArgument(String),
    #[error("ERR invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongKind(#[from] WrongKind),
}
