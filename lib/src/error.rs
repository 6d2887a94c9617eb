use std::{fmt, io};
use std::panic::Location;
use std::error::Error as StdError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A build error: one or more details plus an optional underlying cause.
///
/// Errors are usually created with [`error!`](crate::error!) or
/// [`err!`](crate::err!) and stacked with [`Chainable`], so that the outermost
/// error says what the build was doing and the innermost says what broke:
///
/// ```rust
/// use guidebook::{err, error};
/// use guidebook::error::{Chainable, Result};
///
/// fn load(id: &str) -> Result<()> {
///     err!("guide source missing", "guide id" => id)
/// }
///
/// let e = load("leifengta").chain(error!("failed to compile guide")).unwrap_err();
/// assert_eq!(e.message(), "failed to compile guide");
/// assert_eq!(e.cause().unwrap().message(), "guide source missing");
///
/// let rendered = e.to_string();
/// assert!(rendered.contains("guide id: leifengta"));
/// ```
#[derive(Debug)]
pub struct Error {
    details: Vec<Box<dyn ErrorDetail>>,
    cause: Option<Box<Error>>,
    location: &'static Location<'static>,
}

/// Something that can be reported as part of an [`Error`].
pub trait ErrorDetail: fmt::Display + fmt::Debug + Send + Sync {
    /// Extra `(key, value)` lines printed below the detail's message.
    fn context(&self) -> Vec<(Option<String>, String)> { vec![] }
}

/// A message with keyed parameters, as produced by [`error!`](crate::error!).
#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub params: Vec<(Option<String>, String)>,
}

impl Error {
    #[track_caller]
    pub fn from_std<E>(error: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        Error::from(Box::new(error) as Box<dyn StdError + Send + Sync>)
    }

    /// Makes `self` the innermost cause of `outer` and returns `outer`.
    pub fn chain(self, mut outer: Error) -> Self {
        let mut slot = &mut outer.cause;
        while let Some(next) = slot {
            slot = &mut next.cause;
        }

        *slot = Some(Box::new(self));
        outer
    }

    /// The message of the first detail.
    pub fn message(&self) -> String {
        self.details.first()
            .map(|d| d.to_string())
            .unwrap_or_default()
    }

    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_deref()
    }

    /// Iterates over `self` followed by each nested cause, outermost first.
    pub fn causes(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |e| e.cause())
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl<T: ErrorDetail + 'static> From<T> for Error {
    #[track_caller]
    fn from(detail: T) -> Self {
        Error {
            details: vec![Box::new(detail)],
            cause: None,
            location: Location::caller(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backtrace = std::env::var_os("RUST_BACKTRACE").is_some();
        for (depth, error) in self.causes().enumerate() {
            let indent = " ".repeat(depth * 4);
            let newline = format!("\n{indent}");
            for detail in &error.details {
                writeln!(f, "{indent}{}", detail.to_string().replace('\n', &newline))?;
                for (key, value) in detail.context() {
                    let value = value.replace('\n', &newline);
                    match key {
                        Some(key) => writeln!(f, "{indent}{key}: {value}")?,
                        None => writeln!(f, "{indent}{value}")?,
                    }
                }
            }

            if backtrace {
                writeln!(f, "{indent}[{}]", error.location)?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl ErrorDetail for Message {
    fn context(&self) -> Vec<(Option<String>, String)> {
        self.params.clone()
    }
}

impl ErrorDetail for Box<dyn StdError + Send + Sync> {
    fn context(&self) -> Vec<(Option<String>, String)> {
        std_sources(&**self)
    }
}

fn std_sources(error: &(dyn StdError + 'static)) -> Vec<(Option<String>, String)> {
    std::iter::successors(error.source(), |&e| e.source())
        .map(|e| (None, e.to_string()))
        .collect()
}

macro_rules! impl_error_detail_with_std_error {
    ($($T:ty),* $(,)?) => ($(
        impl $crate::error::ErrorDetail for $T {
            fn context(&self) -> Vec<(Option<String>, String)> {
                std_sources(self)
            }
        }
    )*)
}

impl_error_detail_with_std_error! {
    io::Error,
    toml::de::Error,
    serde_json::Error,
    minijinja::Error,
    std::str::Utf8Error,
}

impl ErrorDetail for String { }
impl ErrorDetail for &'static str { }

/// Returns `Err(error!(...))`. See [`error!`](crate::error!).
#[doc(hidden)]
#[macro_export]
macro_rules! err {
    ($($token:tt)*) => (Err($crate::error!($($token)*)));
}

/// Builds an [`Error`](crate::error::Error) from a message and parameters.
///
/// Parameters are either `key => value` pairs or bare values; both are
/// formatted with `Display`.
#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($msg:expr $(, $($rest:tt)*)?) => (
        $crate::error::Error::from($crate::error::Message {
            text: $msg.to_string(),
            params: {
                #[allow(unused_mut)]
                let mut params: Vec<(Option<String>, String)> = Vec::new();
                $($crate::error!(@param params $($rest)*);)?
                params
            },
        })
    );

    (@param $v:ident $key:expr => $value:expr $(, $($rest:tt)*)?) => {
        $v.push((Some($key.to_string()), $value.to_string()));
        $($crate::error!(@param $v $($rest)*);)?
    };

    (@param $v:ident $value:expr $(, $($rest:tt)*)?) => {
        $v.push((None, $value.to_string()));
        $($crate::error!(@param $v $($rest)*);)?
    };

    (@param $v:ident) => { };
}

pub trait Chainable<T> {
    /// On error, wraps the error so that `outer` describes it.
    fn chain(self, outer: impl Into<Error>) -> Result<T>;

    /// Like [`Chainable::chain`] but only builds `outer` on error.
    fn chain_with<F, E>(self, f: F) -> Result<T>
        where F: FnOnce() -> E, E: Into<Error>;
}

impl<T, E: Into<Error>> Chainable<T> for Result<T, E> {
    #[track_caller]
    fn chain(self, outer: impl Into<Error>) -> Result<T> {
        self.map_err(|e| e.into().chain(outer.into()))
    }

    #[track_caller]
    fn chain_with<F, Outer>(self, f: F) -> Result<T>
        where F: FnOnce() -> Outer, Outer: Into<Error>
    {
        self.map_err(|e| e.into().chain(f().into()))
    }
}
