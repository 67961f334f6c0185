use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// The transform length, counted in 8-lane blocks, is not a power of two or exceeds what
    /// the 2-adicity of the modulus supports
    UnsupportedLength { blocks: usize, max_blocks: usize },
    /// A power series with a zero constant term has no inverse
    NonInvertibleConstantTerm,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            ErrorKind::UnsupportedLength { blocks, max_blocks } => {
                write!(
                    f,
                    "Unsupported transform length: {blocks} blocks of 8 lanes, \
                     expected a power of two between 1 and {max_blocks}"
                )
            }
            ErrorKind::NonInvertibleConstantTerm => {
                write!(f, "The power series has a zero constant term and cannot be inverted")
            }
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl std::error::Error for Error {}

/// Unwrap 'Extension' trait
///
/// Adds a method similar to `unwrap` to `Result<T, E>` that uses the implementation of
/// `Display` and not `Debug` as the message in the panic. Operator impls, which cannot return a
/// `Result`, go through it.
pub trait UnwrapResultExt<T> {
    fn unwrap_display(self) -> T;
}

impl<T, E> UnwrapResultExt<T> for Result<T, E>
where
    E: Display,
{
    #[track_caller]
    fn unwrap_display(self) -> T {
        match self {
            Ok(t) => t,
            Err(e) => panic!("{}", e),
        }
    }
}
