use std::time::Duration;

/// What a [`VarSet`](crate::VarSet) does when assigning a variable fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorHandling {
    /// Return the error to the caller.
    #[default]
    ContinueOnError,
    /// Exit the process with status 2.
    ExitOnError,
    /// Panic with the error message.
    PanicOnError,
}

/// A built-in variable's current value, typed rather than rendered.
///
/// Returned by [`Getter::get`](crate::Getter::get).
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    Bool(bool),
    Int(isize),
    Int64(i64),
    Uint(usize),
    Uint64(u64),
    String(String),
    Float64(f64),
    Duration(Duration),
}
