//! The [`Value`] capability and the adapters that implement it.
//!
//! Every declared variable is stored in the registry as a `Box<dyn Value>`.
//! The built-in kinds (bool, the four integer widths, string, float and
//! duration) share one generic implementation, [`Adapter<T>`], parameterised
//! by a [`Primitive`] that knows which node shape it accepts and how to
//! render itself. [`Deserialized<T>`] covers any serde type, and callers can
//! implement [`Value`] directly for anything else.
//!
//! Adapters never own the variable: they write into a shared [`Handle`] that
//! the caller also holds, so the caller reads results without going through
//! the registry.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::document::{self, Document};
use crate::duration;
use crate::error::ConversionError;
use crate::types::Setting;

/// A variable that can be populated from a document.
pub trait Value: Send {
    /// The current value as text.
    fn render(&self) -> String;

    /// Read `path` from `document` and store the result.
    ///
    /// A missing path is not an error: the stored value is left alone. The
    /// path is passed through exactly as declared, so an adapter may treat it
    /// as a list of sub-paths if it wants to.
    fn assign(&mut self, path: &str, document: &Document) -> Result<(), ConversionError>;

    /// Typed access, for adapters that support it.
    fn as_getter(&self) -> Option<&dyn Getter> {
        None
    }
}

/// A [`Value`] that can hand back its contents without a round-trip
/// through text.
pub trait Getter: Value {
    fn get(&self) -> Setting;
}

/// Shared storage for a declared variable.
///
/// Cloning a handle clones the reference, not the value: every clone sees
/// writes made by the registry.
#[derive(Debug, Default)]
pub struct Handle<T>(Arc<RwLock<T>>);

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Handle(Arc::clone(&self.0))
    }
}

impl<T> Handle<T> {
    pub fn new(value: T) -> Self {
        Handle(Arc::new(RwLock::new(value)))
    }

    pub fn set(&self, value: T) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<T: Clone> Handle<T> {
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

/// A type with a built-in adapter.
pub trait Primitive: Clone + Send + Sync + 'static {
    /// Name used in conversion errors.
    const TYPE_NAME: &'static str;

    fn from_node(node: &toml::Value) -> Result<Self, ConversionError>;

    fn render(&self) -> String;

    fn into_setting(self) -> Setting;
}

fn mismatch(node: &toml::Value, expected: &'static str) -> ConversionError {
    ConversionError::Mismatch {
        value: document::format_value(node),
        found: document::shape_name(node),
        expected,
    }
}

impl Primitive for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_node(node: &toml::Value) -> Result<Self, ConversionError> {
        node.as_bool().ok_or_else(|| mismatch(node, Self::TYPE_NAME))
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn into_setting(self) -> Setting {
        Setting::Bool(self)
    }
}

macro_rules! integer_primitive {
    ($ty:ty, $name:literal, $variant:ident) => {
        impl Primitive for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_node(node: &toml::Value) -> Result<Self, ConversionError> {
                let raw = node
                    .as_integer()
                    .ok_or_else(|| mismatch(node, Self::TYPE_NAME))?;
                <$ty>::try_from(raw).map_err(|_| ConversionError::OutOfRange {
                    value: raw,
                    expected: Self::TYPE_NAME,
                })
            }

            fn render(&self) -> String {
                self.to_string()
            }

            fn into_setting(self) -> Setting {
                Setting::$variant(self)
            }
        }
    };
}

// `int` and `uint` follow the target's pointer width.
integer_primitive!(isize, "int", Int);
integer_primitive!(i64, "int64", Int64);
integer_primitive!(usize, "uint", Uint);
integer_primitive!(u64, "uint64", Uint64);

impl Primitive for String {
    const TYPE_NAME: &'static str = "string";

    fn from_node(node: &toml::Value) -> Result<Self, ConversionError> {
        node.as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch(node, Self::TYPE_NAME))
    }

    fn render(&self) -> String {
        self.clone()
    }

    fn into_setting(self) -> Setting {
        Setting::String(self)
    }
}

impl Primitive for f64 {
    const TYPE_NAME: &'static str = "float64";

    fn from_node(node: &toml::Value) -> Result<Self, ConversionError> {
        node.as_float().ok_or_else(|| mismatch(node, Self::TYPE_NAME))
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn into_setting(self) -> Setting {
        Setting::Float64(self)
    }
}

impl Primitive for Duration {
    const TYPE_NAME: &'static str = "duration";

    fn from_node(node: &toml::Value) -> Result<Self, ConversionError> {
        let literal = node.as_str().ok_or_else(|| mismatch(node, Self::TYPE_NAME))?;
        Ok(duration::parse(literal)?)
    }

    fn render(&self) -> String {
        duration::format(*self)
    }

    fn into_setting(self) -> Setting {
        Setting::Duration(self)
    }
}

/// The built-in adapter for a [`Primitive`].
#[derive(Debug)]
pub struct Adapter<T> {
    storage: Handle<T>,
}

impl<T: Primitive> Adapter<T> {
    /// Write `initial` into `storage` and bind to it.
    pub fn new(initial: T, storage: &Handle<T>) -> Self {
        storage.set(initial);
        Self {
            storage: storage.clone(),
        }
    }
}

impl<T: Primitive> Value for Adapter<T> {
    fn render(&self) -> String {
        self.storage.with(T::render)
    }

    fn assign(&mut self, path: &str, document: &Document) -> Result<(), ConversionError> {
        let Some(node) = document.lookup(path) else {
            return Ok(());
        };
        self.storage.set(T::from_node(node)?);
        Ok(())
    }

    fn as_getter(&self) -> Option<&dyn Getter> {
        Some(self)
    }
}

impl<T: Primitive> Getter for Adapter<T> {
    fn get(&self) -> Setting {
        self.storage.get().into_setting()
    }
}

/// Adapter for any type serde can move in and out of a TOML node.
///
/// Tables, arrays and enums all work, as long as the shape in the document
/// matches what `T` deserializes from.
#[derive(Debug)]
pub struct Deserialized<T> {
    storage: Handle<T>,
}

impl<T> Deserialized<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(initial: T, storage: &Handle<T>) -> Self {
        storage.set(initial);
        Self::bind(storage)
    }

    /// Bind to `storage` as-is; its current contents are the default.
    pub fn bind(storage: &Handle<T>) -> Self {
        Self {
            storage: storage.clone(),
        }
    }
}

impl<T> Value for Deserialized<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn render(&self) -> String {
        self.storage.with(|v| match toml::Value::try_from(v) {
            Ok(node) => document::format_value(&node),
            Err(e) => format!("<{e}>"),
        })
    }

    fn assign(&mut self, path: &str, document: &Document) -> Result<(), ConversionError> {
        let Some(node) = document.lookup(path) else {
            return Ok(());
        };
        let value = node
            .clone()
            .try_into::<T>()
            .map_err(|e| ConversionError::Deserialize {
                value: document::format_value(node),
                found: document::shape_name(node),
                reason: e.to_string(),
            })?;
        self.storage.set(value);
        Ok(())
    }
}
