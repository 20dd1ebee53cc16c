//! The process-wide default [`VarSet`] and free functions that forward to it.
//!
//! The default set is created on first use, named after `argv[0]` and
//! configured with [`ErrorHandling::ExitOnError`], so a bad value in the
//! document ends the program. Each function here locks the default set for
//! the duration of the call. Callbacks passed to [`visit`], [`visit_all`],
//! [`lookup`] and [`with_default`] run under that lock and must not call back
//! into this module.
//!
//! Libraries and tests should prefer an explicit [`VarSet`]; [`reset`]
//! exists so tests that do use the default can start from a clean slate.

use std::io::Read;
use std::path::Path;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::document::Document;
use crate::error::TomlVarError;
use crate::types::ErrorHandling;
use crate::value::{Handle, Value};
use crate::var_set::{Var, VarSet};

static DEFAULT: LazyLock<Mutex<VarSet>> =
    LazyLock::new(|| Mutex::new(VarSet::new(program_name(), ErrorHandling::ExitOnError)));

fn program_name() -> String {
    std::env::args().next().unwrap_or_default()
}

/// Run `f` with exclusive access to the default set.
pub fn with_default<R>(f: impl FnOnce(&mut VarSet) -> R) -> R {
    let mut set = DEFAULT.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut set)
}

/// Replace the default set with an empty one using `error_handling`.
pub fn reset(error_handling: ErrorHandling) {
    with_default(|set| *set = VarSet::new(program_name(), error_handling));
}

macro_rules! forward_primitives {
    ($($ty:ty => $decl:ident, $decl_var:ident;)*) => {
        $(
            #[doc = concat!("Declare a `", stringify!($ty), "` variable in the default set.")]
            pub fn $decl(path: &str, default: $ty) -> Handle<$ty> {
                with_default(|set| set.$decl(path, default))
            }

            #[doc = concat!("Declare a `", stringify!($ty), "` variable in the default set, stored in `storage`.")]
            pub fn $decl_var(storage: &Handle<$ty>, path: &str, default: $ty) {
                with_default(|set| set.$decl_var(storage, path, default))
            }
        )*
    };
}

forward_primitives! {
    bool => bool, bool_var;
    isize => int, int_var;
    i64 => int64, int64_var;
    usize => uint, uint_var;
    u64 => uint64, uint64_var;
    f64 => float64, float64_var;
    Duration => duration, duration_var;
}

/// Declare a string variable in the default set.
pub fn string(path: &str, default: &str) -> Handle<String> {
    with_default(|set| set.string(path, default))
}

/// Declare a string variable in the default set, stored in `storage`.
pub fn string_var(storage: &Handle<String>, path: &str, default: &str) {
    with_default(|set| set.string_var(storage, path, default))
}

/// Declare a serde-backed variable in the default set.
pub fn deserialize<T>(path: &str, default: T) -> Handle<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    with_default(|set| set.deserialize(path, default))
}

/// Declare a serde-backed variable in the default set, stored in `storage`.
pub fn deserialize_var<T>(storage: &Handle<T>, path: &str, default: T)
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    with_default(|set| set.deserialize_var(storage, path, default))
}

/// Declare a variable with a caller-supplied adapter in the default set.
pub fn var(value: impl Value + 'static, path: &str) {
    with_default(|set| set.var(value, path))
}

/// Parse `content` as the default set's document.
pub fn load(content: &str) -> Result<(), TomlVarError> {
    with_default(|set| set.load(content))
}

/// Read and parse the file at `path` as the default set's document.
pub fn load_file(path: impl AsRef<Path>) -> Result<(), TomlVarError> {
    with_default(|set| set.load_file(path))
}

/// Drain `reader` and parse it as the default set's document.
pub fn load_reader(reader: impl Read) -> Result<(), TomlVarError> {
    with_default(|set| set.load_reader(reader))
}

/// A copy of the default set's loaded document.
pub fn config() -> Option<Document> {
    with_default(|set| set.config().cloned())
}

/// Assign one variable in the default set and mark it as set.
pub fn set(path: &str) -> Result<(), TomlVarError> {
    with_default(|set| set.set(path))
}

/// Assign every variable in the default set from its document.
pub fn parse() -> Result<(), TomlVarError> {
    with_default(VarSet::parse)
}

/// Whether [`parse`] has been called on the default set.
pub fn parsed() -> bool {
    with_default(|set| set.parsed())
}

/// Call `f` with the variable declared at `path`, if there is one.
pub fn lookup<R>(path: &str, f: impl FnOnce(&Var) -> R) -> Option<R> {
    with_default(|set| set.lookup(path).map(f))
}

/// Call `f` for each variable in the default set that has been set, in path order.
pub fn visit(f: impl FnMut(&Var)) {
    with_default(|set| set.visit(f))
}

/// Call `f` for each variable declared in the default set, in path order.
pub fn visit_all(f: impl FnMut(&Var)) {
    with_default(|set| set.visit_all(f))
}

/// Number of variables in the default set that have been set.
pub fn num_set() -> usize {
    with_default(|set| set.num_set())
}
