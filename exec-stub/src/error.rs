use std::io;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can stop a launcher run short of the child's own exit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot resolve the path of the running executable: {0}")]
    Environment(#[source] io::Error),

    #[error("cannot copy {} to {}: {source}", .template.display(), .output.display())]
    Copy {
        template: PathBuf,
        output: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot append trailer to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt trailer in {}: {source}", .path.display())]
    CorruptTrailer {
        path: PathBuf,
        #[source]
        source: TrailerError,
    },

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Format(TrailerError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("cannot run command `{command}`: {source}")]
    Execute {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Process status reported when the launcher itself fails.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => 1,
            Error::Environment(_) => 2,
            Error::Copy { .. } => 3,
            Error::Write { .. } => 4,
            Error::CorruptTrailer { .. } => 5,
            Error::Read { .. } => 6,
            Error::Format(_) => 7,
            Error::Execute { .. } => 127,
        }
    }
}

/// Trailer encode/decode failures, independent of where the bytes came from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrailerError {
    #[error("payload of {0} bytes does not fit the 32-bit length field")]
    PayloadTooLarge(usize),

    #[error("image of {image_len} bytes is too short for a length field")]
    MissingLength { image_len: u64 },

    #[error("length field claims {length} payload bytes but only {available} precede it")]
    LengthOutOfBounds { length: u32, available: u64 },

    #[error("command contains bytes that are not valid UTF-8")]
    NotUnicode,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("no argument after -o")]
    MissingOutputValue,

    #[error("please specify output file by using -o before -c")]
    MissingOutput,

    #[error("please check parameters: expected -o <path> -c <command...>")]
    MissingCommand,
}
