use thiserror::Error;

// Any of these puts the engine into silent mode for the rest of the run
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoDevice,

    #[error("failed to get device config: {0}")]
    Config(String),

    #[error("failed to build audio stream: {0}")]
    Build(String),

    #[error("failed to start audio stream: {0}")]
    Play(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to spawn render thread: {0}")]
    Spawn(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    // device ran dry since the last write
    #[error("buffer underrun")]
    Underrun,

    #[error("device write timed out")]
    Timeout,

    #[error("output stream disconnected")]
    Disconnected,

    #[error("output stream error: {0}")]
    Stream(String),
}
