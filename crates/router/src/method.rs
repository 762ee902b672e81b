use std::collections::BTreeSet;

const ANY_METHOD: &str = "*";
const ALL: &str = "ALL";

/// The methods a route accepts.
///
/// Methods are uppercased at build time and compared case sensitively at match time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSet {
    Any,
    Only {
        methods: BTreeSet<String>,
        // quick checks for the most common methods
        get: bool,
        post: bool,
    },
}

impl MethodSet {
    /// Normalizes raw method tokens: `None` or any `ALL` token means any method.
    ///
    /// An explicit empty list accepts no method at all.
    pub fn from_tokens<I, S>(tokens: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(tokens) = tokens else {
            return MethodSet::Any;
        };

        let mut methods = BTreeSet::new();
        for token in tokens {
            let method = token.as_ref().trim().to_uppercase();
            if method == ALL || method == ANY_METHOD {
                return MethodSet::Any;
            }
            if !method.is_empty() {
                methods.insert(method);
            }
        }

        let get = methods.contains("GET");
        let post = methods.contains("POST");
        MethodSet::Only { methods, get, post }
    }

    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, MethodSet::Any)
    }

    /// Checks whether the route accepts `method`, `None` accepts every route
    #[inline]
    pub fn accepts(&self, method: Option<&str>) -> bool {
        let Some(method) = method else {
            return true;
        };

        match self {
            MethodSet::Any => true,
            MethodSet::Only { get: true, .. } if method == "GET" => true,
            MethodSet::Only { post: true, .. } if method == "POST" => true,
            MethodSet::Only { methods, .. } => methods.contains(method),
        }
    }

    /// Sorted method names, `["*"]` for any method
    pub fn names(&self) -> Vec<String> {
        match self {
            MethodSet::Any => vec![ANY_METHOD.to_string()],
            MethodSet::Only { methods, .. } => methods.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tokens: &[&str]) -> MethodSet {
        MethodSet::from_tokens(Some(tokens))
    }

    #[test]
    fn test_absent_or_all_is_any() {
        assert!(MethodSet::from_tokens(None::<Vec<String>>).is_any());
        assert!(set(&["ALL"]).is_any());
        assert!(set(&["get", "all"]).is_any());
        assert_eq!(set(&["ALL"]).names(), vec!["*"]);
    }

    #[test]
    fn test_empty_list_accepts_nothing() {
        let none = set(&[]);
        assert!(!none.is_any());
        assert!(none.names().is_empty());
        assert!(!none.accepts(Some("GET")));
        assert!(!none.accepts(Some("DELETE")));
        // lookups that ignore methods still see the route
        assert!(none.accepts(None));
    }

    #[test]
    fn test_uppercased_and_sorted() {
        let methods = set(&["post", "GET", "Patch"]);
        assert_eq!(methods.names(), vec!["GET", "PATCH", "POST"]);
    }

    #[test]
    fn test_accepts() {
        let methods = set(&["GET", "POST"]);
        assert!(methods.accepts(Some("GET")));
        assert!(methods.accepts(Some("POST")));
        assert!(!methods.accepts(Some("PUT")));
        assert!(!methods.accepts(Some("get")));
        assert!(methods.accepts(None));

        let patch = set(&["PATCH"]);
        assert!(patch.accepts(Some("PATCH")));
        assert!(!patch.accepts(Some("GET")));

        assert!(MethodSet::Any.accepts(Some("ANYTHING")));
    }
}
