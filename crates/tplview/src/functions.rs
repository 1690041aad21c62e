//! Engine-wide helper functions.
//!
//! [`Functions`] maps names to callable template values. The table is
//! installed into every composed namespace as globals, so helpers are
//! available to the master, the content and every partial alike.
//!
//! Names are validated when they are registered, not when a template is
//! parsed: a helper must be a plain identifier, and `include` is reserved
//! for the per-render include helper.
//!
//! ```rust
//! use tplview::Functions;
//!
//! let functions = Functions::new()
//!     .with("sub", |a: i64, b: i64| a - b)
//!     .unwrap()
//!     .with("shout", |s: String| s.to_uppercase())
//!     .unwrap();
//!
//! assert!(functions.contains("sub"));
//! assert!(Functions::new().with("include", || "x").is_err());
//! ```
//!
//! Functions that only one render needs can instead be passed in that
//! render's data with [`Value::from_function`]; they shadow engine
//! functions of the same name for that render only.

use std::collections::BTreeMap;

use minijinja::functions::Function;
use minijinja::value::{FunctionArgs, FunctionResult, Value};
use minijinja::Environment;

use crate::error::ViewError;

/// Name of the per-render include helper.
pub const INCLUDE_FUNCTION: &str = "include";

/// A validated table of helper functions.
#[derive(Debug, Clone, Default)]
pub struct Functions {
    entries: BTreeMap<String, Value>,
}

impl Functions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a Rust closure or function as a helper.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Config`] if `name` is not an identifier or is
    /// reserved.
    pub fn insert<F, Rv, Args>(&mut self, name: &str, f: F) -> Result<(), ViewError>
    where
        F: Function<Rv, Args>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a>,
    {
        self.insert_value(name, Value::from_function::<F, Rv, Args>(f))
    }

    /// Registers an arbitrary template value under `name`.
    ///
    /// Useful for callable objects built elsewhere, or for constants that
    /// every template should see.
    pub fn insert_value(&mut self, name: &str, value: Value) -> Result<(), ViewError> {
        validate_name(name)?;
        self.entries.insert(name.to_string(), value);
        Ok(())
    }

    /// Chained form of [`insert`](Self::insert).
    pub fn with<F, Rv, Args>(mut self, name: &str, f: F) -> Result<Self, ViewError>
    where
        F: Function<Rv, Args>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a>,
    {
        self.insert(name, f)?;
        Ok(self)
    }

    /// Copies every entry of `other` into this table, replacing duplicates.
    pub fn extend(&mut self, other: &Functions) {
        for (name, value) in &other.entries {
            self.entries.insert(name.clone(), value.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Installs every helper as a global of `env`.
    pub(crate) fn install(&self, env: &mut Environment<'static>) {
        for (name, value) in &self.entries {
            env.add_global(name.clone(), value.clone());
        }
    }
}

fn validate_name(name: &str) -> Result<(), ViewError> {
    if name == INCLUDE_FUNCTION {
        return Err(ViewError::config(format!(
            "function name \"{}\" is reserved",
            INCLUDE_FUNCTION
        )));
    }
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(ViewError::config(format!(
            "function name {:?} is not a valid identifier",
            name
        )));
    }
    Ok(())
}
