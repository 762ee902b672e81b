//! Path pattern compilation.
//!
//! Compiles path templates such as `/users/:id`, `/files/:parts*` or `/(\\d+)` into an
//! anchored regular expression plus the ordered list of parameter keys, one key per
//! capture group.
//!
//! The pattern `/` is special cased: it matches every path without evaluating any
//! regular expression.

mod parser;

use parser::Part;
pub use parser::PatternError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_PATTERN: &str = "[^/#?]+?";
const EVERYTHING: &str = "/";

/// Options used when compiling a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchOptions {
    /// when `true` the pattern is case sensitive
    pub sensitive: bool,
    /// when `false` an optional trailing `/` is accepted
    pub strict: bool,
    /// when `false` the pattern only needs to match a prefix of the path ending on a
    /// segment boundary
    pub end: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self { sensitive: false, strict: false, end: true }
    }
}

/// Cardinality of a pattern parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    None,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

impl Modifier {
    /// Repeated parameters are split on `/` when bound
    #[inline]
    pub fn is_repeated(self) -> bool {
        matches!(self, Modifier::ZeroOrMore | Modifier::OneOrMore)
    }

    fn as_str(self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Optional => "?",
            Modifier::ZeroOrMore => "*",
            Modifier::OneOrMore => "+",
        }
    }
}

/// Name of a parameter: named (`:id`) or positional for unnamed groups
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKey {
    Name(String),
    Index(usize),
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Name(name) => f.write_str(name),
            ParamKey::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.to_string())
    }
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        ParamKey::Index(index)
    }
}

/// A parameter descriptor, aligned 1:1 with the capture groups of the pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub name: ParamKey,
    pub modifier: Modifier,
}

/// Raw result of testing a path against a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch<'p> {
    /// the matched part of the path
    pub path: &'p str,
    /// captured values, aligned with [`CompiledPattern::keys`]
    pub values: Vec<Option<&'p str>>,
}

#[derive(Debug, Clone)]
enum Inner {
    Everything,
    Regex {
        regex: Regex,
        // `end: false` patterns finish with a boundary group that is not part of the match
        boundary: bool,
        // a trailing `/` right before the end of the path is kept in the match
        trailing: bool,
    },
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    inner: Inner,
    keys: Vec<Key>,
}

impl CompiledPattern {
    pub fn compile(source: &str, options: MatchOptions) -> Result<Self, PatternError> {
        if source == EVERYTHING {
            return Ok(Self { source: source.to_string(), inner: Inner::Everything, keys: vec![] });
        }

        let parts = parser::parse(source)?;
        let mut keys = Vec::new();
        let mut index = 0;
        let mut route = String::from("^");
        if !options.sensitive {
            route.insert_str(0, "(?i)");
        }

        for part in &parts {
            match part {
                Part::Literal(text) => route.push_str(&regex::escape(text)),
                Part::Param { name, prefix, pattern, modifier } => {
                    let pattern = pattern.as_deref().unwrap_or(DEFAULT_PATTERN);
                    route.push_str(&param_regex(&regex::escape(prefix), pattern, *modifier));

                    let name = match name {
                        Some(name) => ParamKey::Name(name.clone()),
                        None => {
                            index += 1;
                            ParamKey::Index(index - 1)
                        }
                    };
                    keys.push(Key { name, modifier: *modifier });
                }
            }
        }

        let ends_with_delimiter = matches!(parts.last(), Some(Part::Literal(text)) if text.ends_with('/'));
        if ends_with_delimiter && !options.strict {
            // the trailing `/` becomes optional below
            route.pop();
        }

        let boundary = !options.end && !(options.strict && ends_with_delimiter);
        if options.end {
            if !options.strict {
                route.push_str("/?");
            }
            route.push('$');
        } else if boundary {
            route.push_str("(/|$)");
        }

        let regex = Regex::new(&route).map_err(|e| PatternError::Regex(e.to_string()))?;
        let inner = Inner::Regex { regex, boundary, trailing: !options.strict };
        Ok(Self { source: source.to_string(), inner, keys })
    }

    /// The pattern text as written
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parameter keys in capture group order
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Returns true for the `/` pattern which matches every path
    #[inline]
    pub fn is_everything(&self) -> bool {
        matches!(self.inner, Inner::Everything)
    }

    /// Tests a path against the pattern
    pub fn exec<'p>(&self, path: &'p str) -> Option<PatternMatch<'p>> {
        let (regex, boundary, trailing) = match &self.inner {
            Inner::Everything => return Some(PatternMatch { path, values: vec![] }),
            Inner::Regex { regex, boundary, trailing } => (regex, *boundary, *trailing),
        };

        let captures = regex.captures(path)?;
        let whole = captures.get(0)?;
        let end = match captures.get(self.keys.len() + 1) {
            Some(m) if boundary && trailing && m.as_str() == "/" && m.end() == path.len() => m.end(),
            Some(m) if boundary => m.start(),
            _ => whole.end(),
        };

        let values = (1..=self.keys.len()).map(|i| captures.get(i).map(|m| m.as_str())).collect();
        Some(PatternMatch { path: &path[whole.start()..end], values })
    }
}

fn param_regex(prefix: &str, pattern: &str, modifier: Modifier) -> String {
    if prefix.is_empty() {
        return format!("({pattern}){}", modifier.as_str());
    }

    match modifier {
        Modifier::ZeroOrMore => format!("(?:{prefix}((?:{pattern})(?:{prefix}(?:{pattern}))*))?"),
        Modifier::OneOrMore => format!("(?:{prefix}((?:{pattern})(?:{prefix}(?:{pattern}))*))"),
        Modifier::Optional => format!("(?:{prefix}({pattern}))?"),
        Modifier::None => format!("(?:{prefix}({pattern}))"),
    }
}
