use std::fmt;
use std::io;

/// Errors surfaced by the FAT engine.
///
/// A mount failure aborts the whole operation; a resolution failure
/// (`NotFound`) affects only that call and leaves the volume usable.
#[derive(Debug)]
pub enum FatError {
    /// The stream ended before a required fixed-size record could be read.
    Truncated,
    /// The image is FAT12, for which no table entry width is supported.
    UnsupportedVariant,
    /// An internal consistency check failed.
    CorruptImage(&'static str),
    /// A path component or file was not located during resolution.
    NotFound,
    /// The underlying stream reported an error.
    Io(io::Error),
}

impl fmt::Display for FatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "image truncated"),
            Self::UnsupportedVariant => write!(f, "FAT12 images are not supported"),
            Self::CorruptImage(what) => write!(f, "corrupt image: {what}"),
            Self::NotFound => write!(f, "not found"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for FatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for FatError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Maps a short read of a fixed-size record to `Truncated`.
pub(crate) fn short_read(err: io::Error) -> FatError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        FatError::Truncated
    } else {
        FatError::Io(err)
    }
}
