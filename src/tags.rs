use std::collections::BTreeMap;
use std::fmt;

pub const PATIENT_NAME: &str = "0010|0010";
pub const STUDY_DATE: &str = "0008|0020";
pub const CONTENT_DATE: &str = "0008|0023";
pub const STUDY_TIME: &str = "0008|0030";
pub const CONTENT_TIME: &str = "0008|0033";
pub const SERIES_DESCRIPTION: &str = "0008|103e";
pub const ROWS: &str = "0028|0010";
pub const COLUMNS: &str = "0028|0011";
pub const PIXEL_SPACING: &str = "0028|0030";
pub const WINDOW_CENTER: &str = "0028|1050";
pub const WINDOW_WIDTH: &str = "0028|1051";

/// Formats a DICOM tag as the `gggg|eeee` code used throughout the viewer.
pub fn tag_code(group: u16, element: u16) -> String {
    format!("{group:04x}|{element:04x}")
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

/// Per-slice metadata keyed by tag code, iterated in code order.
///
/// Keys are stored normalized, so `0008|103E` and `0008|103e` address the
/// same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    entries: BTreeMap<String, String>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: &str, value: impl Into<String>) {
        self.entries.insert(normalize_code(code), value.into());
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries
            .get(code)
            .or_else(|| self.entries.get(&normalize_code(code)))
            .map(String::as_str)
    }

    /// Value with DICOM padding (spaces, NULs) stripped; `None` when blank.
    pub fn trimmed(&self, code: &str) -> Option<&str> {
        self.get(code)
            .map(|value| value.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
            .filter(|value| !value.is_empty())
    }

    pub fn first_present(&self, codes: &[&str]) -> Option<&str> {
        codes.iter().find_map(|code| self.trimmed(code))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(code, value)| (code.as_str(), value.as_str()))
    }

    pub fn same_keys(&self, other: &TagMap) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.keys().eq(other.entries.keys())
    }

    /// Two-column listing for the metadata table.
    pub fn rows(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(code, value)| (code.to_string(), value.to_string()))
            .collect()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TagMap::new();
        for (code, value) in iter {
            map.insert(code.as_ref(), value);
        }
        map
    }
}

/// A value read from metadata, or the documented default used when the
/// metadata was missing or unusable.
#[derive(Debug, Clone, PartialEq)]
pub enum Derived<T> {
    Parsed(T),
    Fallback { value: T, reason: String },
}

impl<T> Derived<T> {
    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Derived::Fallback {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Derived::Parsed(value) | Derived::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Derived::Parsed(value) | Derived::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Derived::Fallback { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Derived::Parsed(_) => None,
            Derived::Fallback { reason, .. } => Some(reason),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Derived::Parsed(value) => write!(f, "{value}"),
            Derived::Fallback { value, reason } => write!(f, "{value} (fallback: {reason})"),
        }
    }
}

/// First entry of a backslash separated multi-value, parsed as a real.
pub fn parse_first_number(value: &str) -> Option<f64> {
    value
        .split('\\')
        .next()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}
