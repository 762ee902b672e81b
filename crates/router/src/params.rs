//! Path parameters bound from a matched pattern.
//!
//! Captured values are percent-decoded. Parameters with a `*` or `+` modifier are split
//! on `/` and every segment is decoded on its own.

use crate::error::RouteError;
use crate::pattern::{Key, ParamKey};
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;

/// Value of a single path parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ParamValue {
    /// Returns the value if the parameter holds a single segment
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            ParamValue::Multiple(_) => None,
        }
    }

    /// Returns the segments if the parameter is repeated
    pub fn as_slice(&self) -> Option<&[String]> {
        match self {
            ParamValue::Single(_) => None,
            ParamValue::Multiple(values) => Some(values),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl<const N: usize> From<[&str; N]> for ParamValue {
    fn from(values: [&str; N]) -> Self {
        ParamValue::Multiple(values.iter().map(ToString::to_string).collect())
    }
}

/// Path parameters extracted from a matched route.
///
/// Parameters whose group did not participate in the match (an absent `?` or `*`
/// parameter) are not present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: BTreeMap<ParamKey, ParamValue>,
}

impl Params {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Binds captured values to their keys, decoding every value
    pub(crate) fn bind(keys: &[Key], values: &[Option<&str>]) -> Result<Self, RouteError> {
        let mut inner = BTreeMap::new();
        for (key, value) in keys.iter().zip(values) {
            let Some(value) = value else {
                continue;
            };

            let value = if key.modifier.is_repeated() {
                ParamValue::Multiple(value.split('/').map(decode).collect::<Result<_, _>>()?)
            } else {
                ParamValue::Single(decode(value)?)
            };
            inner.insert(key.name.clone(), value);
        }
        Ok(Self { inner })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Gets a parameter by name or by position for unnamed groups
    pub fn get(&self, key: impl Into<ParamKey>) -> Option<&ParamValue> {
        self.inner.get(&key.into())
    }

    /// Gets a single segment parameter as a str
    pub fn get_str(&self, key: impl Into<ParamKey>) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &ParamValue)> {
        self.inner.iter()
    }
}

impl<K: Into<ParamKey>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Strict percent decoding: malformed escapes and invalid utf-8 are errors.
pub(crate) fn decode(value: &str) -> Result<String, RouteError> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.get(i + 1..i + 3).is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(RouteError::decode(value));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_utf8_error| RouteError::decode(value))
}
