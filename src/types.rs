use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;

/// Option names that configure the wrapper itself and never become tool flags.
pub const RESERVED_OPTIONS: &[&str] = &["out", "err", "pipe", "log", "overwrite", "executable"];

/// Value attached to a tool option.
///
/// `Yes`/`No`/`Unset` keep "explicitly off" apart from "not given at all".
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Yes,
    No,
    Int(i64),
    Float(f64),
    Text(String),
    Unset,
}

impl OptionValue {
    pub fn is_unset(&self) -> bool {
        matches!(self, OptionValue::Unset)
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, OptionValue::Yes | OptionValue::No)
    }

    /// The positional argument this value contributes, if any.
    ///
    /// Switches render inline as `yes`/`no` and unset values are dropped, so
    /// neither produces an argument.
    pub fn as_arg(&self) -> Option<String> {
        match self {
            OptionValue::Int(n) => Some(n.to_string()),
            OptionValue::Float(x) => Some(x.to_string()),
            OptionValue::Text(s) => Some(s.clone()),
            OptionValue::Yes | OptionValue::No | OptionValue::Unset => None,
        }
    }

    /// Interpret the value as a file path (used when gathering stage outputs).
    pub fn as_path(&self) -> Option<PathBuf> {
        self.as_arg().map(PathBuf::from)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Yes => f.write_str("yes"),
            OptionValue::No => f.write_str("no"),
            OptionValue::Int(n) => write!(f, "{n}"),
            OptionValue::Float(x) => write!(f, "{x}"),
            OptionValue::Text(s) => f.write_str(s),
            OptionValue::Unset => f.write_str("<unset>"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        if value { OptionValue::Yes } else { OptionValue::No }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        match value {
            "yes" => OptionValue::Yes,
            "no" => OptionValue::No,
            other => OptionValue::Text(other.to_string()),
        }
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::from(value.as_str())
    }
}

impl From<&Path> for OptionValue {
    fn from(value: &Path) -> Self {
        OptionValue::Text(value.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for OptionValue {
    fn from(value: PathBuf) -> Self {
        OptionValue::from(value.as_path())
    }
}

impl From<&PathBuf> for OptionValue {
    fn from(value: &PathBuf) -> Self {
        OptionValue::from(value.as_path())
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl<T: Into<OptionValue>> From<Option<T>> for OptionValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(OptionValue::Unset, Into::into)
    }
}

impl FromStr for OptionValue {
    type Err = String;

    /// Parse a command-line value: integers and floats become numbers,
    /// `yes`/`no` become switches, anything else is text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("option value must not be empty".to_string());
        }
        if let Ok(n) = s.parse::<i64>() {
            return Ok(OptionValue::Int(n));
        }
        if let Ok(x) = s.parse::<f64>() {
            return Ok(OptionValue::Float(x));
        }
        Ok(OptionValue::from(s))
    }
}

/// Ordered set of tool options.
///
/// Insertion order is flag order on the command line. Re-setting an existing
/// name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    entries: IndexMap<String, OptionValue>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> &mut Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries.get(name)
    }

    /// True if `name` is present with anything other than `Unset`.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_unset())
    }

    pub fn path(&self, name: &str) -> Option<PathBuf> {
        self.get(name).and_then(OptionValue::as_path)
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.entries.shift_remove(name)
    }

    /// Append every entry of `other`, replacing values already present.
    pub fn extend(&mut self, other: &OptionSet) {
        for (name, value) in other.iter() {
            self.entries.insert(name.to_string(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = OptionSet::new();
        for (k, v) in iter {
            set.set(k, v);
        }
        set
    }
}

/// Parse a `key=value` pair as given on the command line.
pub fn parse_option_pair(s: &str) -> Result<(String, OptionValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid option {s:?} (expected KEY=VALUE)"))?;
    let key = key.trim().trim_start_matches('-');
    if key.is_empty() {
        return Err(format!("invalid option {s:?}: empty name"));
    }
    Ok((key.to_string(), value.parse()?))
}
