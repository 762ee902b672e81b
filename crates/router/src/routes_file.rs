//! Route files.
//!
//! A route file is a JSON array, `//` and `/* */` comments are allowed. Every entry is
//! either a shorthand string or an object:
//!
//! ```json
//! [
//!     // shorthand
//!     "GET /users/:id => ./users#show",
//!     {
//!         "route": "/admin/:page*",
//!         "methods": ["GET", "POST"],
//!         "handler": "./admin",
//!         "matchOptions": { "sensitive": true },
//!         "auth": "admin"
//!     }
//! ]
//! ```
//!
//! Handlers are always module references, they are loaded on first use. Any other key
//! of an object entry is route metadata.

use crate::descriptor::RouteDescriptor;
use crate::error::{RouteError, RoutesFileError};
use crate::pattern::MatchOptions;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::error;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Reserved {
    path: Option<String>,
    route: Option<String>,
    method: Option<String>,
    methods: Option<Vec<String>>,
    handler: Option<String>,
    match_options: Option<MatchOptions>,
}

const RESERVED_KEYS: [&str; 6] = ["path", "route", "method", "methods", "handler", "matchOptions"];

/// Reads and parses a route file
pub async fn read<Req, Res>(path: &Path) -> Result<Vec<RouteDescriptor<Req, Res>>, RouteError> {
    let result = match tokio::fs::read_to_string(path).await {
        Ok(source) => parse(&source),
        Err(e) => Err(RoutesFileError::from(e)),
    };

    result.map_err(|e| {
        error!(path = %path.display(), cause = %e, "failed to read routes file");
        RouteError::routes_file(path, e)
    })
}

/// Parses the content of a route file
pub fn parse<Req, Res>(source: &str) -> Result<Vec<RouteDescriptor<Req, Res>>, RoutesFileError> {
    let entries: Vec<Value> = serde_json::from_str(&strip_comments(source))?;
    entries.into_iter().enumerate().map(|(index, entry)| descriptor(index, entry)).collect()
}

fn descriptor<Req, Res>(index: usize, entry: Value) -> Result<RouteDescriptor<Req, Res>, RoutesFileError> {
    let object = match entry {
        Value::String(shorthand) => return Ok(RouteDescriptor::new(shorthand)),
        Value::Object(object) => object,
        other => return Err(RoutesFileError::invalid_route(index, format!("expected a string or an object, found {other}"))),
    };

    if object.contains_key("middleware") {
        return Err(RoutesFileError::invalid_route(index, "middleware cannot be declared in a routes file"));
    }

    let (reserved, metadata): (Map<String, Value>, Map<String, Value>) =
        object.into_iter().partition(|(key, _)| RESERVED_KEYS.contains(&key.as_str()));
    let reserved: Reserved =
        serde_json::from_value(Value::Object(reserved)).map_err(|e| RoutesFileError::invalid_route(index, e))?;

    let mut descriptor = RouteDescriptor::empty();
    descriptor.path = reserved.path;
    descriptor.route = reserved.route;
    descriptor.method = reserved.method;
    descriptor.methods = reserved.methods;
    descriptor.handler = reserved.handler.map(Into::into);
    descriptor.match_options = reserved.match_options;
    descriptor.metadata = metadata;
    Ok(descriptor)
}

/// Removes `//` and `/* */` comments outside of string literals
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => out.extend(chars.next()),
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut last = '\0';
                for c in chars.by_ref() {
                    if last == '*' && c == '/' {
                        break;
                    }
                    last = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::HandlerRef;

    type Descriptor = RouteDescriptor<(), ()>;

    #[test]
    fn test_strip_comments() {
        let source = "[\n  // line\n  \"GET /a => ./a\", /* block\n */ \"/b // not a comment\"\n]";
        let stripped = strip_comments(source);
        let parsed: Vec<String> = serde_json::from_str(&stripped).unwrap();
        assert_eq!(parsed, vec!["GET /a => ./a", "/b // not a comment"]);

        assert_eq!(strip_comments(r#"["a \" /* b"]"#), r#"["a \" /* b"]"#);
    }

    #[test]
    fn test_parse_entries() {
        let source = r#"[
            "GET /users/:id => ./users#show",
            {
                "route": "/admin/:page*",
                "methods": ["GET", "POST"],
                "handler": "./admin#index",
                "matchOptions": { "sensitive": true },
                "auth": "admin"
            }
        ]"#;
        let descriptors: Vec<Descriptor> = parse(source).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].path.as_deref(), Some("GET /users/:id => ./users#show"));

        let record = &descriptors[1];
        assert_eq!(record.route.as_deref(), Some("/admin/:page*"));
        assert_eq!(record.methods, Some(vec!["GET".to_string(), "POST".to_string()]));
        assert!(matches!(&record.handler, Some(HandlerRef::Module(m)) if m.id() == "./admin" && m.export() == Some("index")));
        assert_eq!(record.match_options, Some(MatchOptions { sensitive: true, ..MatchOptions::default() }));
        assert_eq!(record.metadata.get("auth"), Some(&Value::from("admin")));
        assert_eq!(record.metadata.get("route"), None);
    }

    #[test]
    fn test_invalid_entries() {
        let err = parse::<(), ()>("[1]").unwrap_err();
        assert!(matches!(err, RoutesFileError::InvalidRoute { index: 0, .. }));

        let err = parse::<(), ()>(r#"["/a", { "path": "/b", "method": 7 }]"#).unwrap_err();
        assert!(matches!(err, RoutesFileError::InvalidRoute { index: 1, .. }));

        let err = parse::<(), ()>(r#"[{ "path": "/b", "middleware": [] }]"#).unwrap_err();
        assert!(matches!(err, RoutesFileError::InvalidRoute { index: 0, .. }));

        let err = parse::<(), ()>("[\"/a\",").unwrap_err();
        assert!(matches!(err, RoutesFileError::Json { .. }));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let err = read::<(), ()>(Path::new("/definitely/not/here.json")).await.unwrap_err();
        match err {
            RouteError::RoutesFile { path, source: RoutesFileError::Io { .. } } => {
                assert_eq!(path, Path::new("/definitely/not/here.json"));
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
