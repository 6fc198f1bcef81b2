use std::fmt;
use std::io;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    description: String,
    source: Option<io::Error>,
}

impl Error {
    pub(in crate) fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            source: None,
        }
    }

    pub(in crate) fn from_io(err: io::Error, context: &str) -> Self {
        Self {
            kind: ErrorKind::Io,
            description: format!("{}: {}", context, err),
            source: Some(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The underlying failure without the context, e.g. `Connection refused` for a refused
    /// `connect`. This is the `strerror` text for OS errors.
    pub fn reason(&self) -> String {
        let source = match &self.source {
            Some(v) => v,
            None => return self.description.clone(),
        };
        let s = source.to_string();
        if let Some(code) = source.raw_os_error() {
            let suffix = format!(" (os error {})", code);
            if let Some(v) = s.strip_suffix(suffix.as_str()) {
                return v.to_owned();
            }
        }
        s
    }

    /// The OS error code if this error came from a failed system call.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.source.as_ref().and_then(|e| e.raw_os_error())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self {
            kind: ErrorKind::Io,
            description: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Self::new(ErrorKind::MalformedCommand, format!("malformed hex command: {}", err))
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A system call on a socket, the HCI device or stdio failed.
    Io,

    /// A command line contained something other than hex digit pairs.
    MalformedCommand,

    /// The peer address couldn't be parsed.
    InvalidAddress,

    /// A signal handler couldn't be installed.
    Signal,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn io_error_keeps_os_code() {
        let e = Error::from_io(io::Error::from_raw_os_error(libc::ECONNREFUSED), "connect");
        assert_eq!(e.kind(), ErrorKind::Io);
        assert_eq!(e.raw_os_error(), Some(libc::ECONNREFUSED));
        assert!(e.to_string().starts_with("connect: "));
    }

    #[test]
    fn reason_drops_context_and_code() {
        let e = Error::from_io(io::Error::from_raw_os_error(libc::ECONNREFUSED), "connect");
        assert_eq!(e.reason(), "Connection refused");

        let e = Error::from_io(io::Error::new(io::ErrorKind::NotConnected, "link is closed"),
            "bind");
        assert_eq!(e.reason(), "link is closed");

        let e = Error::new(ErrorKind::InvalidAddress, "invalid device address `x`");
        assert_eq!(e.reason(), "invalid device address `x`");
    }

    #[test]
    fn hex_error_is_malformed_command() {
        let e = Error::from(hex::FromHexError::OddLength);
        assert_eq!(e.kind(), ErrorKind::MalformedCommand);
        assert!(e.raw_os_error().is_none());
    }
}
