//! String format registry
//!
//! A format is either a regular expression the whole string must match or
//! a callback returning the reason a string is rejected. The registry is
//! a plain value carried by [`ValidationSettings`](super::ValidationSettings).
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// Callback deciding whether a string has a format
pub type FormatCallback = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

const BYTE_PATTERN: &str = r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$";
const EMAIL_PATTERN: &str = r#"^[^@]+@[^@<>",\s]+$"#;
const UUID_PATTERN: &str = r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

/// One registered format
#[derive(Clone)]
pub enum StringFormat {
    Regex(Regex),
    Callback(FormatCallback),
}

impl StringFormat {
    /// Check a string, returning the rejection reason
    pub fn check(&self, value: &str) -> Result<(), String> {
        match self {
            StringFormat::Regex(regex) => {
                if regex.is_match(value) {
                    Ok(())
                } else {
                    Err(format!("does not match pattern {:?}", regex.as_str()))
                }
            }
            StringFormat::Callback(callback) => callback(value),
        }
    }
}

impl fmt::Debug for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringFormat::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            StringFormat::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// Named string formats
#[derive(Clone)]
pub struct FormatRegistry {
    formats: BTreeMap<String, StringFormat>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.formats.keys()).finish()
    }
}

impl FormatRegistry {
    /// A registry with `byte`, `date`, `date-time`, `email`, `uuid`, `ipv4` and `ipv6`
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (name, pattern) in [("byte", BYTE_PATTERN), ("email", EMAIL_PATTERN), ("uuid", UUID_PATTERN)] {
            if let Ok(regex) = Regex::new(pattern) {
                registry.formats.insert(name.to_string(), StringFormat::Regex(regex));
            }
        }

        registry.define_callback("date", |value| {
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|_| ())
                .map_err(|e| format!("not a full-date: {}", e))
        });
        registry.define_callback("date-time", |value| {
            chrono::DateTime::parse_from_rfc3339(value)
                .map(|_| ())
                .map_err(|e| format!("not an RFC 3339 date-time: {}", e))
        });
        registry.define_callback("ipv4", |value| {
            value
                .parse::<Ipv4Addr>()
                .map(|_| ())
                .map_err(|_| "not an IPv4 address".to_string())
        });
        registry.define_callback("ipv6", |value| {
            value
                .parse::<Ipv6Addr>()
                .map(|_| ())
                .map_err(|_| "not an IPv6 address".to_string())
        });
        registry
    }

    /// A registry without any format
    pub fn empty() -> Self {
        Self {
            formats: BTreeMap::new(),
        }
    }

    /// Register a format whose values must match `pattern`
    pub fn define<S: Into<String>>(&mut self, name: S, pattern: &str) -> Result<(), regex::Error> {
        let regex = Regex::new(pattern)?;
        self.formats.insert(name.into(), StringFormat::Regex(regex));
        Ok(())
    }

    /// Register a format decided by a callback
    pub fn define_callback<S, F>(&mut self, name: S, callback: F)
    where
        S: Into<String>,
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        self.formats.insert(name.into(), StringFormat::Callback(Arc::new(callback)));
    }

    /// Remove a format, returning whether it was registered
    pub fn remove(&mut self, name: &str) -> bool {
        self.formats.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&StringFormat> {
        self.formats.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// Check a string against a named format; `None` when the format is unknown
    pub fn check(&self, name: &str, value: &str) -> Option<Result<(), String>> {
        self.formats.get(name).map(|format| format.check(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StringFormat)> {
        self.formats.iter().map(|(name, format)| (name.as_str(), format))
    }
}

/// Formats that constrain numbers rather than strings
pub(crate) fn is_numeric_format(name: &str) -> bool {
    matches!(name, "int32" | "int64" | "float" | "double")
}
