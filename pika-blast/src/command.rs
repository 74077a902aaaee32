// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::str::FromStr;

use thiserror::Error;

pub const USAGE: &str = "usage: pika-blast <serve|blast [count]|scores>";

/// Subcommand selected on the command line. No arguments means `serve`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Serve,
    Blast { count: usize },
    Scores,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{value}'; {}", USAGE)]
    Unknown { value: String },
    #[error("invalid blast count '{value}'; expected a positive integer")]
    InvalidCount { value: String },
    #[error("unexpected argument '{value}'; {}", USAGE)]
    Unexpected { value: String },
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "serve" => Ok(Command::Serve),
            "blast" => Ok(Command::Blast { count: 1 }),
            "scores" => Ok(Command::Scores),
            _ => Err(CommandError::Unknown {
                value: value.to_string(),
            }),
        }
    }
}

impl Command {
    /// Parses the arguments after the program name.
    pub fn parse<I>(args: I) -> Result<Self, CommandError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let Some(first) = args.next() else {
            return Ok(Command::Serve);
        };
        let mut command = Command::from_str(&first)?;
        if let Command::Blast { count } = &mut command {
            if let Some(raw) = args.next() {
                *count = raw
                    .parse()
                    .ok()
                    .filter(|count: &usize| *count > 0)
                    .ok_or(CommandError::InvalidCount { value: raw })?;
            }
        }
        match args.next() {
            Some(value) => Err(CommandError::Unexpected { value }),
            None => Ok(command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, CommandError> {
        Command::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn no_arguments_serves() {
        assert_eq!(parse(&[]), Ok(Command::Serve));
        assert_eq!(parse(&["SERVE"]), Ok(Command::Serve));
    }

    #[test]
    fn blast_count_defaults_to_one() {
        assert_eq!(parse(&["blast"]), Ok(Command::Blast { count: 1 }));
        assert_eq!(parse(&["blast", "25"]), Ok(Command::Blast { count: 25 }));
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(matches!(parse(&["nuke"]), Err(CommandError::Unknown { .. })));
        assert_eq!(
            parse(&["blast", "0"]),
            Err(CommandError::InvalidCount { value: "0".into() })
        );
        assert!(matches!(
            parse(&["blast", "many"]),
            Err(CommandError::InvalidCount { .. })
        ));
        assert_eq!(
            parse(&["scores", "now"]),
            Err(CommandError::Unexpected { value: "now".into() })
        );
    }
}
