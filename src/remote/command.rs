use thiserror::Error;

use crate::shared::{BeatMode, Drum};

/// One datagram of the text protocol. `None` arguments are reads.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteCommand {
    Volume(Option<i32>),
    Tempo(Option<i32>),
    Mode(Option<BeatMode>),
    Play(Drum),
    Stop,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{0}' is not an integer")]
    BadArgument(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("no mode {0}, expected 0-2")]
    UnknownMode(i64),
    #[error("no sound {0}, expected 0-2")]
    UnknownSound(i64),
    #[error("too many arguments for {0}")]
    UnexpectedArgument(&'static str),
}

impl RemoteCommand {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.trim_end_matches(['\r', '\n']).split_whitespace();
        let Some(word) = words.next() else {
            return Err(CommandError::Empty);
        };
        let (name, arg) = match word {
            "volume" => ("volume", words.next()),
            "tempo" => ("tempo", words.next()),
            "mode" => ("mode", words.next()),
            "play" => ("play", words.next()),
            "stop" => ("stop", words.next()),
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        if words.next().is_some() || (name == "stop" && arg.is_some()) {
            return Err(CommandError::UnexpectedArgument(name));
        }

        let arg = arg.map(parse_int).transpose()?;
        match (name, arg) {
            ("volume", n) => Ok(Self::Volume(n.map(saturate))),
            ("tempo", n) => Ok(Self::Tempo(n.map(saturate))),
            ("mode", None) => Ok(Self::Mode(None)),
            ("mode", Some(n)) => BeatMode::from_code(n)
                .map(|m| Self::Mode(Some(m)))
                .ok_or(CommandError::UnknownMode(n)),
            ("play", None) => Err(CommandError::MissingArgument("play")),
            ("play", Some(n)) => Drum::from_play_id(n)
                .map(Self::Play)
                .ok_or(CommandError::UnknownSound(n)),
            _ => Ok(Self::Stop),
        }
    }
}

fn parse_int(word: &str) -> Result<i64, CommandError> {
    word.parse().map_err(|_| CommandError::BadArgument(word.to_string()))
}

// out-of-range values get clamped downstream, they only need to fit
fn saturate(n: i64) -> i32 {
    n.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_and_writes() {
        assert_eq!(RemoteCommand::parse("volume"), Ok(RemoteCommand::Volume(None)));
        assert_eq!(RemoteCommand::parse("volume 42\n"), Ok(RemoteCommand::Volume(Some(42))));
        assert_eq!(RemoteCommand::parse("tempo\r\n"), Ok(RemoteCommand::Tempo(None)));
        assert_eq!(RemoteCommand::parse("tempo 500"), Ok(RemoteCommand::Tempo(Some(500))));
        assert_eq!(RemoteCommand::parse("mode"), Ok(RemoteCommand::Mode(None)));
        assert_eq!(
            RemoteCommand::parse("mode 2"),
            Ok(RemoteCommand::Mode(Some(BeatMode::Custom)))
        );
        assert_eq!(RemoteCommand::parse("stop\n"), Ok(RemoteCommand::Stop));
    }

    #[test]
    fn test_play_ids() {
        assert_eq!(RemoteCommand::parse("play 0"), Ok(RemoteCommand::Play(Drum::Kick)));
        assert_eq!(RemoteCommand::parse("play 1"), Ok(RemoteCommand::Play(Drum::HiHat)));
        assert_eq!(RemoteCommand::parse("play 2"), Ok(RemoteCommand::Play(Drum::Snare)));
        assert_eq!(RemoteCommand::parse("play 3"), Err(CommandError::UnknownSound(3)));
        assert_eq!(RemoteCommand::parse("play"), Err(CommandError::MissingArgument("play")));
    }

    #[test]
    fn test_undefined_is_not_a_read() {
        assert_eq!(
            RemoteCommand::parse("volume undefined"),
            Err(CommandError::BadArgument("undefined".into()))
        );
    }

    #[test]
    fn test_malformed() {
        assert_eq!(RemoteCommand::parse(""), Err(CommandError::Empty));
        assert_eq!(RemoteCommand::parse(" \r\n"), Err(CommandError::Empty));
        assert_eq!(RemoteCommand::parse("louder"), Err(CommandError::Unknown("louder".into())));
        assert_eq!(
            RemoteCommand::parse("tempo 1 2"),
            Err(CommandError::UnexpectedArgument("tempo"))
        );
        assert_eq!(RemoteCommand::parse("stop now"), Err(CommandError::UnexpectedArgument("stop")));
        assert_eq!(RemoteCommand::parse("mode 3"), Err(CommandError::UnknownMode(3)));
        assert_eq!(RemoteCommand::parse("mode -1"), Err(CommandError::UnknownMode(-1)));
    }

    #[test]
    fn test_huge_values_saturate() {
        assert_eq!(
            RemoteCommand::parse("volume 99999999999"),
            Ok(RemoteCommand::Volume(Some(i32::MAX)))
        );
    }

    #[test]
    fn test_error_text() {
        assert_eq!(CommandError::UnknownMode(7).to_string(), "no mode 7, expected 0-2");
        assert_eq!(
            CommandError::BadArgument("x".into()).to_string(),
            "'x' is not an integer"
        );
    }
}
