//! The one error type everything in the crate returns.

use image::ImageError;
use std::io;

/// What can go wrong.  None of these are fatal to a running viewer:
/// the cache rejects the request and keeps what it had.
#[derive(Debug, Fail)]
pub enum Error {
    /// The window has a non-finite component or a side that is not
    /// strictly positive.
    #[fail(display = "invalid view: {}", _0)]
    InvalidView(String),

    /// The palette provider does not know this name.
    #[fail(display = "unknown palette: {}", _0)]
    UnknownPalette(String),

    /// A value could not be parsed or is out of range.
    #[fail(display = "invalid argument: {}", _0)]
    InvalidArgument(String),

    /// The background generator has exited.
    #[fail(display = "the generation worker is no longer running")]
    WorkerGone,

    /// Writing an image failed.
    #[fail(display = "image error: {}", _0)]
    Image(#[cause] ImageError),

    /// Plain I/O failure.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<ImageError> for Error {
    fn from(err: ImageError) -> Error {
        Error::Image(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = ::std::result::Result<T, Error>;
