//! Locating and extracting the trailer of an executable image on disk.
//!
//! Two strategies share one contract ([`crate::trailer::decode_tail`]):
//! [`Strategy::Seek`] walks backwards from the end of the file with a few
//! small reads, [`Strategy::Map`] maps the file read-only and slices from the
//! mapped end. Both return byte-identical results for the same file.

mod map;
mod seek;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result, TrailerError};

/// Images at least this large are mapped when the strategy is chosen
/// automatically.
pub const MAP_THRESHOLD: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Seek,
    Map,
}

/// Strategy as configured, before the image size is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrategyChoice {
    #[default]
    Auto,
    Fixed(Strategy),
}

impl StrategyChoice {
    pub fn resolve(self, image_len: u64) -> Strategy {
        match self {
            StrategyChoice::Fixed(strategy) => strategy,
            StrategyChoice::Auto if image_len >= MAP_THRESHOLD => Strategy::Map,
            StrategyChoice::Auto => Strategy::Seek,
        }
    }
}

impl FromStr for StrategyChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(StrategyChoice::Auto),
            "seek" => Ok(StrategyChoice::Fixed(Strategy::Seek)),
            "map" | "mmap" => Ok(StrategyChoice::Fixed(Strategy::Map)),
            other => Err(format!("unknown trailer reader `{other}`")),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Seek => f.write_str("seek"),
            Strategy::Map => f.write_str("map"),
        }
    }
}

/// Reads the trailer payload of the image at `path` with the given strategy.
///
/// `Ok(None)` means the file carries no trailer. A trailer whose length field
/// does not fit the file is [`Error::CorruptTrailer`].
pub fn read_trailer(path: &Path, strategy: Strategy) -> Result<Option<Vec<u8>>> {
    debug!(path = %path.display(), %strategy, "reading trailer");
    let outcome = match strategy {
        Strategy::Seek => seek::read(path),
        Strategy::Map => map::read(path),
    };
    match outcome {
        Ok(payload) => Ok(payload),
        Err(ReadFailure::Io(source)) => Err(Error::Read {
            path: path.to_path_buf(),
            source,
        }),
        Err(ReadFailure::Corrupt(source)) => Err(Error::CorruptTrailer {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Picks a strategy for `path` from `choice`, then reads its trailer.
pub fn read_trailer_with(path: &Path, choice: StrategyChoice) -> Result<Option<Vec<u8>>> {
    let strategy = match choice {
        StrategyChoice::Fixed(strategy) => strategy,
        StrategyChoice::Auto => {
            let image_len = fs::metadata(path)
                .map_err(|source| Error::Read {
                    path: path.to_path_buf(),
                    source,
                })?
                .len();
            choice.resolve(image_len)
        }
    };
    read_trailer(path, strategy)
}

/// Failure inside a strategy, before the path is attached.
#[derive(Debug)]
enum ReadFailure {
    Io(std::io::Error),
    Corrupt(TrailerError),
}

impl From<std::io::Error> for ReadFailure {
    fn from(err: std::io::Error) -> Self {
        ReadFailure::Io(err)
    }
}

impl From<TrailerError> for ReadFailure {
    fn from(err: TrailerError) -> Self {
        ReadFailure::Corrupt(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trailer::{encode, MAGIC};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BOTH: [Strategy; 2] = [Strategy::Seek, Strategy::Map];

    fn image_file(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn proxy_image(prefix: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut image = prefix.to_vec();
        image.extend(encode(payload).unwrap());
        image
    }

    #[test]
    fn strategies_agree_on_well_formed_proxy() {
        let file = image_file(&proxy_image(&[0x90; 4096], b"echo \"hello world\" extra"));
        let seek = read_trailer(file.path(), Strategy::Seek).unwrap();
        let map = read_trailer(file.path(), Strategy::Map).unwrap();
        assert_eq!(seek, Some(b"echo \"hello world\" extra".to_vec()));
        assert_eq!(seek, map);
    }

    #[test]
    fn plain_file_has_no_trailer() {
        let file = image_file(b"\x7fELF plain template");
        for strategy in BOTH {
            assert_eq!(read_trailer(file.path(), strategy).unwrap(), None, "{strategy}");
        }
    }

    #[test]
    fn empty_file_has_no_trailer() {
        let file = image_file(b"");
        for strategy in BOTH {
            assert_eq!(read_trailer(file.path(), strategy).unwrap(), None, "{strategy}");
        }
    }

    #[test]
    fn oversized_length_is_corrupt_for_both() {
        let mut image = b"tiny".to_vec();
        image.extend_from_slice(&4096u32.to_le_bytes());
        image.extend_from_slice(&MAGIC);
        let file = image_file(&image);

        for strategy in BOTH {
            let err = read_trailer(file.path(), strategy).unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::CorruptTrailer {
                        source: TrailerError::LengthOutOfBounds { length: 4096, .. },
                        ..
                    }
                ),
                "{strategy}: {err}"
            );
        }
    }

    #[test]
    fn truncated_footer_is_corrupt_for_both() {
        let file = image_file(b"zEXEC");
        for strategy in BOTH {
            let err = read_trailer(file.path(), strategy).unwrap_err();
            assert!(matches!(err, Error::CorruptTrailer { .. }), "{strategy}: {err}");
        }
    }

    #[test]
    fn bytes_before_trailer_do_not_matter() {
        let once = proxy_image(b"template", b"run me");
        let twice = proxy_image(&proxy_image(b"template", b"older"), b"run me");
        for strategy in BOTH {
            let a = read_trailer(image_file(&once).path(), strategy).unwrap();
            let b = read_trailer(image_file(&twice).path(), strategy).unwrap();
            assert_eq!(a, b, "{strategy}");
        }
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        for strategy in BOTH {
            let err = read_trailer(&missing, strategy).unwrap_err();
            assert!(matches!(err, Error::Read { .. }), "{strategy}: {err}");
        }
    }

    #[test]
    fn auto_choice_depends_on_size() {
        assert_eq!(StrategyChoice::Auto.resolve(10), Strategy::Seek);
        assert_eq!(StrategyChoice::Auto.resolve(MAP_THRESHOLD), Strategy::Map);
        assert_eq!(
            StrategyChoice::Fixed(Strategy::Seek).resolve(MAP_THRESHOLD * 8),
            Strategy::Seek
        );
    }

    #[test]
    fn choice_parses_from_text() {
        assert_eq!("MAP".parse(), Ok(StrategyChoice::Fixed(Strategy::Map)));
        assert_eq!("seek".parse(), Ok(StrategyChoice::Fixed(Strategy::Seek)));
        assert_eq!("auto".parse(), Ok(StrategyChoice::Auto));
        assert!("stream".parse::<StrategyChoice>().is_err());
    }

    #[test]
    fn auto_read_uses_file_size() {
        let file = image_file(&proxy_image(b"small", b"payload"));
        assert_eq!(
            read_trailer_with(file.path(), StrategyChoice::Auto).unwrap(),
            Some(b"payload".to_vec())
        );
    }
}
