use std::error;
use std::fmt;
use std::io;

pub type Report<T> = Result<T, Error>;

/// A human readable message, optionally caused by an I/O error.
#[derive(Debug)]
pub struct Error {
    source: Option<io::Error>,
    message: String,
}

impl Error {
    pub fn new<U, M>(source: U, message: M) -> Self
    where
        U: Into<io::Error>,
        M: Into<String>,
    {
        Error {
            source: Some(source.into()),
            message: message.into(),
        }
    }

    pub fn message<M>(message: M) -> Self
    where
        M: Into<String>,
    {
        Error {
            source: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self
            .source
            .as_ref()
            .map(|err| err as &(dyn error::Error + 'static))
    }
}

pub trait ErrorExt<T, E> {
    /// Wrap any error into an [`io::Error`] so it can be reported.
    fn map_err_into_io(self) -> Result<T, io::Error>
    where
        E: Into<Box<dyn error::Error + Send + Sync>>;

    fn message(self, message: &str) -> Report<T>
    where
        E: Into<io::Error>;

    fn with_message<F, M>(self, f: F) -> Report<T>
    where
        E: Into<io::Error>,
        F: FnOnce() -> M,
        M: Into<String>;
}

impl<T, E> ErrorExt<T, E> for Result<T, E> {
    fn map_err_into_io(self) -> Result<T, io::Error>
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        self.map_err(io::Error::other)
    }

    fn message(self, message: &str) -> Report<T>
    where
        E: Into<io::Error>,
    {
        self.map_err(|err| Error::new(err, message))
    }

    fn with_message<F, M>(self, f: F) -> Report<T>
    where
        E: Into<io::Error>,
        F: FnOnce() -> M,
        M: Into<String>,
    {
        self.map_err(|err| Error::new(err, f()))
    }
}
