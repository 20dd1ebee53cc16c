//! Typed configuration variables read from a TOML document. Declare a
//! variable against a dotted path, load a document, parse, and read.
//!
//! The API follows the shape of a command-line flag library, but values come
//! from nested TOML tables instead of argv.
//!
//! ```ignore
//! use std::time::Duration;
//! use tomlvar::{ErrorHandling, VarSet};
//!
//! let mut vars = VarSet::new("myapp", ErrorHandling::ContinueOnError);
//! let port = vars.uint("server.port", 8080);
//! let timeout = vars.duration("server.timeout", Duration::from_secs(5));
//!
//! vars.load_file("myapp.toml")?;
//! vars.parse()?;
//!
//! println!("listening on {} (timeout {:?})", port.get(), timeout.get());
//! ```
//!
//! # Declaring
//!
//! Each built-in kind has a pair of declaration methods on [`VarSet`]:
//!
//! | Kind | Returns storage | Binds existing storage |
//! |------|-----------------|------------------------|
//! | `bool` | [`bool`](VarSet::bool) | [`bool_var`](VarSet::bool_var) |
//! | `isize` | [`int`](VarSet::int) | [`int_var`](VarSet::int_var) |
//! | `i64` | [`int64`](VarSet::int64) | [`int64_var`](VarSet::int64_var) |
//! | `usize` | [`uint`](VarSet::uint) | [`uint_var`](VarSet::uint_var) |
//! | `u64` | [`uint64`](VarSet::uint64) | [`uint64_var`](VarSet::uint64_var) |
//! | `String` | [`string`](VarSet::string) | [`string_var`](VarSet::string_var) |
//! | `f64` | [`float64`](VarSet::float64) | [`float64_var`](VarSet::float64_var) |
//! | `Duration` | [`duration`](VarSet::duration) | [`duration_var`](VarSet::duration_var) |
//!
//! Storage is a [`Handle`], a cheap shared reference. The default is written
//! into it at declaration time, so it is readable before anything is loaded.
//!
//! Anything serde understands can be declared with
//! [`deserialize`](VarSet::deserialize). For full control, implement
//! [`Value`] and register it with [`var`](VarSet::var); the adapter receives
//! the declared path verbatim and may interpret it however it likes (a
//! comma-separated list of sub-paths, say).
//!
//! Declaring the same path twice panics. That is a bug in the program, not
//! a problem with the configuration.
//!
//! # Node shapes
//!
//! Values are taken from the document as-is; there is no string coercion.
//!
//! | Kind | Accepted TOML node |
//! |------|--------------------|
//! | `bool` | boolean |
//! | integers | integer, range-checked for the target type |
//! | `String` | string |
//! | `f64` | float (an integer literal is rejected) |
//! | `Duration` | string such as `"1h30m"` or `"250ms"` |
//!
//! `int` and `uint` are `isize` and `usize`, so their range follows the
//! target's pointer width: on a 32-bit target `2147483648` does not fit an
//! `int`. Negative values never fit an unsigned kind.
//!
//! # Parsing and error handling
//!
//! [`parse`](VarSet::parse) walks every declared variable. A path that is
//! missing from the document leaves the variable at its default. A path
//! holding the wrong shape is a conversion failure, handled according to
//! the set's [`ErrorHandling`]:
//!
//! - **`ContinueOnError`**: return the error. Variables already assigned
//!   keep their new values.
//! - **`ExitOnError`**: log the error and exit with status 2.
//! - **`PanicOnError`**: panic with the error.
//!
//! Errors loading the document itself are always returned, never subject to
//! the policy.
//!
//! # The default set
//!
//! The [`global`] module mirrors every [`VarSet`] method as a free function
//! on a process-wide set configured with `ExitOnError`.
//!
//! # Logging
//!
//! Diagnostics go through [`tracing`]: declarations and loads at `debug`,
//! each assignment at `trace`, failures at `error`. Install a subscriber to
//! see them.

pub mod duration;
pub mod error;
pub mod global;
pub mod types;

mod document;
mod value;
mod var_set;

#[cfg(test)]
mod fixtures;

pub use document::Document;
pub use error::{ConversionError, DurationError, TomlVarError};
pub use types::{ErrorHandling, Setting};
pub use value::{Adapter, Deserialized, Getter, Handle, Primitive, Value};
pub use var_set::{Var, VarSet};
