//! The variable registry.
//!
//! A [`VarSet`] moves through three stages:
//!
//! 1. **Declare.** Each call to [`bool`](VarSet::bool), [`int`](VarSet::int),
//!    [`var`](VarSet::var) and friends records one variable under its path in
//!    the *formal* set and writes the default into its storage.
//! 2. **Load.** [`load`](VarSet::load), [`load_file`](VarSet::load_file) or
//!    [`load_reader`](VarSet::load_reader) parses a TOML document and keeps
//!    it, replacing any earlier one.
//! 3. **Parse.** [`parse`](VarSet::parse) assigns every formal variable from
//!    the document and records each success in the *actual* set.
//!    [`set`](VarSet::set) does the same for a single path.
//!
//! The actual set is always a subset of the formal set. Visiting either one
//! is in ascending path order.
//!
//! A `VarSet` does no locking of its own. To reload configuration while other
//! threads are reading it, build a fresh set, declare, load and parse it, and
//! then publish the results behind your own lock.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, trace};

use crate::document::Document;
use crate::error::TomlVarError;
use crate::types::{ErrorHandling, Setting};
use crate::value::{Adapter, Deserialized, Getter, Handle, Value};

/// A declared variable: a path and the adapter that fills it.
pub struct Var {
    path: String,
    value: Box<dyn Value>,
}

impl Var {
    /// The path this variable was declared under.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The adapter backing this variable.
    pub fn value(&self) -> &dyn Value {
        self.value.as_ref()
    }

    /// The current value as text.
    pub fn render(&self) -> String {
        self.value.render()
    }

    /// The current value, typed, if the adapter supports it.
    pub fn get(&self) -> Option<Setting> {
        self.value.as_getter().map(Getter::get)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("path", &self.path)
            .field("value", &self.value.render())
            .finish()
    }
}

/// A set of declared variables and the document they are read from.
#[derive(Default)]
pub struct VarSet {
    name: String,
    error_handling: ErrorHandling,
    parsed: bool,
    formal: BTreeMap<String, Var>,
    actual: BTreeSet<String>,
    document: Option<Document>,
}

macro_rules! declare_primitives {
    ($($ty:ty => $decl:ident, $decl_var:ident;)*) => {
        impl VarSet {
            $(
                #[doc = concat!("Declare a `", stringify!($ty), "` variable at `path` and return its storage.")]
                pub fn $decl(&mut self, path: &str, default: $ty) -> Handle<$ty> {
                    let storage = Handle::new(default);
                    self.$decl_var(&storage, path, default);
                    storage
                }

                #[doc = concat!("Declare a `", stringify!($ty), "` variable at `path`, stored in `storage`.")]
                pub fn $decl_var(&mut self, storage: &Handle<$ty>, path: &str, default: $ty) {
                    self.var(Adapter::new(default, storage), path);
                }
            )*
        }
    };
}

declare_primitives! {
    bool => bool, bool_var;
    isize => int, int_var;
    i64 => int64, int64_var;
    usize => uint, uint_var;
    u64 => uint64, uint64_var;
    f64 => float64, float64_var;
    Duration => duration, duration_var;
}

impl VarSet {
    /// Create an empty set. `name` only appears in diagnostics.
    pub fn new(name: impl Into<String>, error_handling: ErrorHandling) -> Self {
        Self {
            name: name.into(),
            error_handling,
            ..Self::default()
        }
    }

    /// Reset the name and error handling policy. Declarations are kept.
    pub fn init(&mut self, name: impl Into<String>, error_handling: ErrorHandling) {
        self.name = name.into();
        self.error_handling = error_handling;
    }

    /// The name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What happens when assigning a variable fails.
    pub fn error_handling(&self) -> ErrorHandling {
        self.error_handling
    }

    /// Declare a string variable at `path` and return its storage.
    pub fn string(&mut self, path: &str, default: &str) -> Handle<String> {
        let storage = Handle::new(default.to_string());
        self.string_var(&storage, path, default);
        storage
    }

    /// Declare a string variable at `path`, stored in `storage`.
    pub fn string_var(&mut self, storage: &Handle<String>, path: &str, default: &str) {
        self.var(Adapter::new(default.to_string(), storage), path);
    }

    /// Declare a variable of any type serde can read from a TOML node.
    pub fn deserialize<T>(&mut self, path: &str, default: T) -> Handle<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let storage = Handle::new(default);
        self.var(Deserialized::bind(&storage), path);
        storage
    }

    /// Like [`deserialize`](Self::deserialize), stored in `storage`.
    pub fn deserialize_var<T>(&mut self, storage: &Handle<T>, path: &str, default: T)
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.var(Deserialized::new(default, storage), path);
    }

    /// Declare a variable with a caller-supplied adapter.
    ///
    /// The adapter's current state is the default.
    ///
    /// # Panics
    ///
    /// Panics if `path` is already declared in this set.
    pub fn var(&mut self, value: impl Value + 'static, path: &str) {
        if self.formal.contains_key(path) {
            let msg = if self.name.is_empty() {
                format!("toml var redefined: {path}")
            } else {
                format!("{} toml var redefined: {path}", self.name)
            };
            error!("{msg}");
            panic!("{msg}");
        }
        debug!(set = %self.name, path, "declared toml var");
        self.formal.insert(
            path.to_string(),
            Var {
                path: path.to_string(),
                value: Box::new(value),
            },
        );
    }

    /// Parse `content` as the document to read from.
    ///
    /// On failure the previous document is discarded as well.
    pub fn load(&mut self, content: &str) -> Result<(), TomlVarError> {
        self.install(Document::parse(content))
    }

    /// Read and parse the file at `path` as the document to read from.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), TomlVarError> {
        self.install(Document::from_file(path))
    }

    /// Drain `reader` and parse it as the document to read from.
    pub fn load_reader(&mut self, reader: impl Read) -> Result<(), TomlVarError> {
        self.install(Document::from_reader(reader))
    }

    fn install(&mut self, loaded: Result<Document, TomlVarError>) -> Result<(), TomlVarError> {
        match loaded {
            Ok(document) => {
                debug!(
                    set = %self.name,
                    keys = document.table().len(),
                    "loaded toml document"
                );
                self.document = Some(document);
                Ok(())
            }
            Err(e) => {
                self.document = None;
                Err(e)
            }
        }
    }

    /// The loaded document, if any.
    pub fn config(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Assign one variable from the document and mark it as set.
    ///
    /// The variable is marked even when the document has nothing at `path`.
    /// An unknown path is always returned as an error; a conversion failure
    /// goes through the set's [`ErrorHandling`].
    pub fn set(&mut self, path: &str) -> Result<(), TomlVarError> {
        if !self.formal.contains_key(path) {
            return Err(TomlVarError::UnknownVar(path.to_string()));
        }
        self.apply(path)
    }

    /// Assign every declared variable from the document.
    ///
    /// Stops at the first failure and hands it to the set's
    /// [`ErrorHandling`]. Variables assigned before the failure keep their
    /// new values. Calling `parse` again re-applies the same document.
    pub fn parse(&mut self) -> Result<(), TomlVarError> {
        self.parsed = true;
        let paths: Vec<String> = self.formal.keys().cloned().collect();
        for path in &paths {
            self.apply(path)?;
        }
        Ok(())
    }

    /// Whether [`parse`](Self::parse) has been called.
    pub fn parsed(&self) -> bool {
        self.parsed
    }

    /// The variable declared at `path`, whether or not it has been set.
    pub fn lookup(&self, path: &str) -> Option<&Var> {
        self.formal.get(path)
    }

    /// Call `f` for each variable that has been set, in path order.
    pub fn visit(&self, mut f: impl FnMut(&Var)) {
        for path in &self.actual {
            if let Some(var) = self.formal.get(path) {
                f(var);
            }
        }
    }

    /// Call `f` for each declared variable, in path order.
    pub fn visit_all(&self, mut f: impl FnMut(&Var)) {
        for var in self.formal.values() {
            f(var);
        }
    }

    /// Number of variables that have been set.
    pub fn num_set(&self) -> usize {
        self.actual.len()
    }

    /// Number of declared variables.
    pub fn len(&self) -> usize {
        self.formal.len()
    }

    /// Whether nothing has been declared yet.
    pub fn is_empty(&self) -> bool {
        self.formal.is_empty()
    }

    fn apply(&mut self, path: &str) -> Result<(), TomlVarError> {
        let empty = Document::default();
        let document = self.document.as_ref().unwrap_or(&empty);
        let var = self
            .formal
            .get_mut(path)
            .ok_or_else(|| TomlVarError::UnknownVar(path.to_string()))?;

        if let Err(source) = var.value.assign(path, document) {
            return Err(self.fail(TomlVarError::InvalidValue {
                path: path.to_string(),
                source,
            }));
        }
        trace!(set = %self.name, path, value = %var.value.render(), "assigned toml var");
        self.actual.insert(path.to_string());
        Ok(())
    }

    fn fail(&self, err: TomlVarError) -> TomlVarError {
        error!(set = %self.name, "{err}");
        match self.error_handling {
            ErrorHandling::ContinueOnError => err,
            ErrorHandling::ExitOnError => std::process::exit(2),
            ErrorHandling::PanicOnError => panic!("{err}"),
        }
    }
}

impl fmt::Debug for VarSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VarSet")
            .field("name", &self.name)
            .field("error_handling", &self.error_handling)
            .field("parsed", &self.parsed)
            .field("formal", &self.formal.values().collect::<Vec<_>>())
            .field("actual", &self.actual)
            .field("document", &self.document.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{ALL_ONES, DISTINCT, StringList, TrueCounter};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn declare_all(set: &mut VarSet) {
        set.bool("test.bool", false);
        set.int("test.int", 0);
        set.int64("test.int64", 0);
        set.uint("test.uint", 0);
        set.uint64("test.uint64", 0);
        set.string("test.string", "0");
        set.float64("test.float64", 0.0);
        set.duration("test.duration", Duration::ZERO);
    }

    fn rendered(set: &VarSet, actual_only: bool) -> BTreeMap<String, String> {
        let mut seen = BTreeMap::new();
        let mut record = |var: &Var| {
            seen.insert(var.path().to_string(), var.render());
        };
        if actual_only {
            set.visit(&mut record);
        } else {
            set.visit_all(&mut record);
        }
        seen
    }

    #[test]
    fn defaults_render_before_load() {
        let mut set = VarSet::new("test", ErrorHandling::ContinueOnError);
        declare_all(&mut set);

        let all = rendered(&set, false);
        assert_eq!(all.len(), 8);
        for (path, text) in &all {
            let expected = match path.as_str() {
                "test.bool" => "false",
                "test.duration" => "0s",
                _ => "0",
            };
            assert_eq!(text, expected, "bad default for {path}");
        }
        assert!(rendered(&set, true).is_empty());
    }

    #[test]
    fn set_each_path_marks_actual() {
        let mut set = VarSet::new("test", ErrorHandling::ContinueOnError);
        declare_all(&mut set);
        set.load(ALL_ONES).unwrap();

        for path in [
            "test.bool",
            "test.int",
            "test.int64",
            "test.uint",
            "test.uint64",
            "test.string",
            "test.float64",
            "test.duration",
        ] {
            set.set(path).unwrap();
        }

        let actual = rendered(&set, true);
        assert_eq!(actual.len(), 8);
        for (path, text) in &actual {
            let expected = match path.as_str() {
                "test.bool" => "true",
                "test.duration" => "1s",
                _ => "1",
            };
            assert_eq!(text, expected, "bad value for {path}");
        }
        assert_eq!(set.num_set(), 8);
    }

    #[test]
    fn visit_is_sorted_regardless_of_declaration_order() {
        let mut set = VarSet::default();
        set.int("zeta", 0);
        set.int("alpha", 0);
        set.int("mid.b", 0);
        set.int("mid.a", 0);
        set.parse().unwrap();

        let mut paths = Vec::new();
        set.visit_all(|v| paths.push(v.path().to_string()));
        assert_eq!(paths, ["alpha", "mid.a", "mid.b", "zeta"]);

        let mut visited = Vec::new();
        set.visit(|v| visited.push(v.path().to_string()));
        assert_eq!(visited, paths);
    }

    #[test]
    fn getters_return_typed_defaults() {
        let mut set = VarSet::default();
        set.bool("test.bool", true);
        set.int("test.int", 1);
        set.int64("test.int64", 2);
        set.uint("test.uint", 3);
        set.uint64("test.uint64", 4);
        set.string("test.string", "5");
        set.float64("test.float64", 6.0);
        set.duration("test.duration", Duration::from_nanos(7));

        let mut checked = 0;
        set.visit_all(|var| {
            let expected = match var.path() {
                "test.bool" => Setting::Bool(true),
                "test.int" => Setting::Int(1),
                "test.int64" => Setting::Int64(2),
                "test.uint" => Setting::Uint(3),
                "test.uint64" => Setting::Uint64(4),
                "test.string" => Setting::String("5".into()),
                "test.float64" => Setting::Float64(6.0),
                "test.duration" => Setting::Duration(Duration::from_nanos(7)),
                other => panic!("unexpected path {other}"),
            };
            assert_eq!(var.get(), Some(expected), "bad value for {}", var.path());
            checked += 1;
        });
        assert_eq!(checked, 8);
    }

    #[test]
    fn parse_populates_handles() {
        let mut set = VarSet::new("test", ErrorHandling::ContinueOnError);
        assert!(!set.parsed());

        let b = set.bool("test.bool", false);
        let i = set.int("test.int", 0);
        let i64v = set.int64("test.int64", 0);
        let u = set.uint("test.uint", 0);
        let u64v = set.uint64("test.uint64", 0);
        let s = set.string("test.string", "0");
        let f = set.float64("test.float64", 0.0);
        let d = set.duration("test.duration", Duration::from_secs(5));

        set.load(DISTINCT).unwrap();
        set.parse().unwrap();

        assert!(set.parsed());
        assert!(b.get());
        assert_eq!(i.get(), 22);
        assert_eq!(i64v.get(), 23);
        assert_eq!(u.get(), 24);
        assert_eq!(u64v.get(), 25);
        assert_eq!(s.get(), "hello");
        assert_eq!(f.get(), 2718e28);
        assert_eq!(d.get(), Duration::from_secs(120));
        assert_eq!(set.num_set(), set.len());
    }

    #[test]
    fn var_binding_writes_default_into_caller_storage() {
        let mut set = VarSet::default();
        let port = Handle::new(1usize);
        set.uint_var(&port, "server.port", 8080);
        assert_eq!(port.get(), 8080);

        set.load("[server]\nport = 9090").unwrap();
        set.parse().unwrap();
        assert_eq!(port.get(), 9090);
    }

    #[test]
    fn user_defined_value_receives_literal_path() {
        let mut set = VarSet::default();
        set.init("test", ErrorHandling::ContinueOnError);
        let items = Handle::default();
        set.var(StringList(items.clone()), "a,b,c");

        set.load("a = \"a\"\nb = \"b\"\nc = \"c\"\n").unwrap();
        set.parse().unwrap();

        assert_eq!(items.get(), ["a", "b", "c"]);
        assert_eq!(set.lookup("a,b,c").unwrap().render(), r#"["a", "b", "c"]"#);
        assert!(set.lookup("a,b,c").unwrap().get().is_none());
    }

    #[test]
    fn user_defined_counter() {
        let mut set = VarSet::new("test", ErrorHandling::ContinueOnError);
        let count = Handle::default();
        set.var(TrueCounter(count.clone()), "a,b,c");

        set.load("a = true\nb = false\nc = true\nnotdefined = \"something\"\n")
            .unwrap();
        set.parse().unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn reparse_reapplies_built_ins_and_accumulates_in_counters() {
        let mut set = VarSet::default();
        let port = set.int("port", 0);
        let count = Handle::default();
        set.var(TrueCounter(count.clone()), "on");

        set.load("port = 7\non = true").unwrap();
        set.parse().unwrap();
        set.parse().unwrap();

        assert_eq!(port.get(), 7);
        // The counter's own state accumulates; the registry re-applies once per parse.
        assert_eq!(count.get(), 2);
        assert!(set.parsed());
    }

    #[test]
    #[should_panic(expected = "toml var redefined: dup")]
    fn duplicate_declaration_panics() {
        let mut set = VarSet::default();
        set.bool("dup", false);
        set.int("dup", 0);
    }

    #[test]
    #[should_panic(expected = "app toml var redefined: dup")]
    fn duplicate_declaration_names_the_set() {
        let mut set = VarSet::new("app", ErrorHandling::ContinueOnError);
        set.bool("dup", false);
        set.bool("dup", true);
    }

    #[test]
    fn set_unknown_path_leaves_actual_unchanged() {
        let mut set = VarSet::default();
        set.bool("known", false);
        let err = set.set("nonexistent.path").unwrap_err();
        assert!(matches!(err, TomlVarError::UnknownVar(p) if p == "nonexistent.path"));
        assert_eq!(set.num_set(), 0);
    }

    #[test]
    fn set_marks_actual_even_when_document_lacks_path() {
        let mut set = VarSet::default();
        let debug = set.bool("debug", true);
        set.load("other = 1").unwrap();
        set.set("debug").unwrap();
        assert!(debug.get());

        let mut visited = Vec::new();
        set.visit(|v| visited.push(v.path().to_string()));
        assert_eq!(visited, ["debug"]);
    }

    #[test]
    fn quoted_path_reaches_key_with_dots() {
        let mut set = VarSet::default();
        let top = set.int64("\"a.b\"", 0);
        let host = set.string("server.\"host.name\"", "localhost");
        set.load("\"a.b\" = 3\n[server]\n\"host.name\" = \"x\"").unwrap();
        set.parse().unwrap();
        assert_eq!(top.get(), 3);
        assert_eq!(host.get(), "x");
    }

    #[test]
    fn set_conversion_failure_is_reported() {
        let mut set = VarSet::default();
        let port = set.int("port", 80);
        set.load("port = \"eighty\"").unwrap();
        let err = set.set("port").unwrap_err();
        match err {
            TomlVarError::InvalidValue { path, source } => {
                assert_eq!(path, "port");
                assert!(source.to_string().contains("eighty"));
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
        assert_eq!(port.get(), 80);
        assert_eq!(set.num_set(), 0);
    }

    #[test]
    fn continue_on_error_keeps_earlier_assignments() {
        let mut set = VarSet::new("test", ErrorHandling::ContinueOnError);
        let a = set.int("a", 0);
        let b = set.int("b", 0);
        let c = set.int("c", 0);
        set.load("a = 1\nb = \"two\"\nc = 3").unwrap();

        let err = set.parse().unwrap_err();
        assert!(matches!(err, TomlVarError::InvalidValue { ref path, .. } if path == "b"));
        assert!(set.parsed());
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 0);
        assert_eq!(c.get(), 0);
        assert_eq!(set.num_set(), 1);
    }

    #[test]
    #[should_panic(expected = "Invalid value for toml var 'flag'")]
    fn panic_on_error_panics() {
        let mut set = VarSet::new("test", ErrorHandling::PanicOnError);
        set.bool("flag", false);
        set.load("flag = 1").unwrap();
        let _ = set.parse();
    }

    #[test]
    fn parse_without_document_keeps_defaults() {
        let mut set = VarSet::default();
        let host = set.string("host", "localhost");
        set.parse().unwrap();
        assert_eq!(host.get(), "localhost");
        assert_eq!(set.num_set(), 1);
        assert!(set.config().is_none());
    }

    #[test]
    fn load_error_is_returned_and_clears_document() {
        let mut set = VarSet::default();
        set.bool("flag", false);
        set.load("flag = true").unwrap();
        assert!(set.config().is_some());

        let err = set.load("flag = ").unwrap_err();
        assert!(matches!(err, TomlVarError::Parse(_)));
        assert!(set.config().is_none());
        assert!(!set.parsed());
        assert_eq!(set.num_set(), 0);
    }

    #[test]
    fn load_file_and_reader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "[server]\nhost = \"file\"\n").unwrap();

        let mut set = VarSet::default();
        let host = set.string("server.host", "");
        set.load_file(&path).unwrap();
        set.parse().unwrap();
        assert_eq!(host.get(), "file");

        set.load_reader("[server]\nhost = \"reader\"\n".as_bytes())
            .unwrap();
        set.parse().unwrap();
        assert_eq!(host.get(), "reader");
    }

    #[test]
    fn config_exposes_loaded_document() {
        let mut set = VarSet::default();
        set.load("[extra]\nanswer = 42").unwrap();
        let doc = set.config().unwrap();
        assert_eq!(doc.lookup("extra.answer").unwrap().as_integer(), Some(42));
    }

    #[test]
    fn deserialize_declaration() {
        let mut set = VarSet::default();
        let tags = set.deserialize("tags", vec![String::from("default")]);
        assert!(set.lookup("tags").unwrap().render().contains("default"));

        set.load("tags = [\"a\", \"b\"]").unwrap();
        set.parse().unwrap();
        assert_eq!(tags.get(), ["a", "b"]);
    }

    #[test]
    fn lookup_and_len() {
        let mut set = VarSet::default();
        assert!(set.is_empty());
        set.float64("rate", 1.5);
        assert_eq!(set.len(), 1);
        assert_eq!(set.lookup("rate").unwrap().render(), "1.5");
        assert!(set.lookup("missing").is_none());
    }
}
