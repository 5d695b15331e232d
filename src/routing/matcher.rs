//! Path matching module
//!
//! Parses route patterns into segments and matches concrete request paths against them.

use std::fmt;

use super::error::RouteError;
use super::params::Params;

/// One `/`-delimited component of a route pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Must equal the path segment byte for byte
    Literal(String),
    /// Binds any path segment (including an empty one) under this name
    Capture(String),
}

/// A parsed route pattern such as `/group/:grp_id/user/:usr_id`
///
/// Equality is structural: `/test`, `test` and `/test/` parse to the same pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parse a pattern, rejecting nameless or repeated captures
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let mut segments = Vec::new();

        for raw in split_path(pattern) {
            let Some(name) = raw.strip_prefix(':') else {
                segments.push(Segment::Literal(raw.to_string()));
                continue;
            };

            if name.is_empty() {
                return Err(RouteError::EmptyCaptureName {
                    pattern: pattern.to_string(),
                });
            }

            let duplicate = segments
                .iter()
                .any(|s| matches!(s, Segment::Capture(existing) if existing == name));
            if duplicate {
                return Err(RouteError::DuplicateCapture {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }

            segments.push(Segment::Capture(name.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match a concrete request path against this pattern
    pub fn matches(&self, path: &str) -> Option<Params> {
        let segments: Vec<&str> = split_path(path).collect();
        self.match_segments(&segments)
    }

    /// Match an already split path
    ///
    /// Returns `None` on the first differing literal; no partial parameter set escapes.
    pub fn match_segments(&self, path: &[&str]) -> Option<Params> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, value) in self.segments.iter().zip(path) {
            match segment {
                Segment::Capture(name) => params.push(name, value),
                Segment::Literal(literal) => {
                    if literal.as_str() != *value {
                        return None;
                    }
                }
            }
        }

        Some(params)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => write!(f, "/{literal}")?,
                Segment::Capture(name) => write!(f, "/:{name}")?,
            }
        }
        Ok(())
    }
}

/// Split a path into segments after trimming one leading and one trailing `/`
///
/// `/` (and the empty string) yield a single empty segment.
pub fn split_path(path: &str) -> std::str::Split<'_, char> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed.split('/')
}

/// Match `path` against the pattern string `pattern`
///
/// Malformed patterns never match.
pub fn match_path(pattern: &str, path: &str) -> Option<Params> {
    Pattern::parse(pattern).ok()?.matches(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Case {
        pattern: &'static str,
        path: &'static str,
        matched: bool,
        params: &'static [(&'static str, &'static str)],
    }

    const CASES: &[Case] = &[
        Case { pattern: "/", path: "/", matched: true, params: &[] },
        Case { pattern: "/test", path: "/", matched: false, params: &[] },
        Case { pattern: "/", path: "/test", matched: false, params: &[] },
        Case { pattern: "/test", path: "/test/", matched: true, params: &[] },
        Case { pattern: "/test/", path: "/test2", matched: false, params: &[] },
        Case { pattern: "/test2", path: "/test", matched: false, params: &[] },
        Case { pattern: "/test/test2/", path: "/test/test2/", matched: true, params: &[] },
        Case { pattern: "/test2/test", path: "/test/test2", matched: false, params: &[] },
        Case { pattern: "/test/test2", path: "/test/", matched: false, params: &[] },
        Case { pattern: "/test/test2/test3", path: "/test/test2", matched: false, params: &[] },
        Case { pattern: "/test/test3/test3", path: "/test/test2/test3", matched: false, params: &[] },
        Case { pattern: "/group/:grp_id/user/:usr_id", path: "/group/4/user/", matched: false, params: &[] },
        Case { pattern: "/user/:usr_id", path: "/user/8", matched: true, params: &[("usr_id", "8")] },
        Case { pattern: "/group/:grp_id", path: "/user/8", matched: false, params: &[] },
        Case { pattern: "/:id/user", path: "/test/user", matched: true, params: &[("id", "test")] },
        Case { pattern: "/:id/user", path: "/test/grp", matched: false, params: &[] },
        Case {
            pattern: "/group/:grp_id/user/:usr_id",
            path: "/group/4/user/8",
            matched: true,
            params: &[("grp_id", "4"), ("usr_id", "8")],
        },
        Case {
            pattern: "/:id1/:id2/:id3/:id4",
            path: "/test/testing/10/ten",
            matched: true,
            params: &[("id1", "test"), ("id2", "testing"), ("id3", "10"), ("id4", "ten")],
        },
    ];

    #[test]
    fn test_match_table() {
        for case in CASES {
            let result = match_path(case.pattern, case.path);
            assert_eq!(
                result.is_some(),
                case.matched,
                "pattern {} against {}",
                case.pattern,
                case.path
            );

            if let Some(params) = result {
                assert_eq!(params.len(), case.params.len(), "pattern {}", case.pattern);
                for (name, value) in case.params {
                    assert_eq!(params.get(name), Some(*value), "pattern {}", case.pattern);
                }
            }
        }
    }

    #[test]
    fn test_trailing_slash_equivalence() {
        assert_eq!(match_path("/test", "/test/"), match_path("/test", "/test"));
        assert_eq!(
            match_path("/user/:id", "/user/42/"),
            match_path("/user/:id", "/user/42")
        );
    }

    #[test]
    fn test_segment_count_mismatch() {
        assert!(match_path("/a/b", "/a").is_none());
        assert!(match_path("/a", "/a/b").is_none());
    }

    #[test]
    fn test_capture_extraction() {
        let params = match_path("/user/:id", "/user/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_multi_capture() {
        let params = match_path("/:a/:b", "/x/y").unwrap();
        assert_eq!(params.get("a"), Some("x"));
        assert_eq!(params.get("b"), Some("y"));
    }

    #[test]
    fn test_capture_matches_empty_segment() {
        let params = match_path("/user/:id/profile", "/user//profile").unwrap();
        assert_eq!(params.get("id"), Some(""));
    }

    #[test]
    fn test_capture_value_is_raw() {
        let params = match_path("/user/:id", "/user/a%20b").unwrap();
        assert_eq!(params.get("id"), Some("a%20b"));
    }

    #[test]
    fn test_deterministic() {
        let pattern = Pattern::parse("/group/:grp/user/:usr").unwrap();
        let first = pattern.matches("/group/1/user/2");
        for _ in 0..10 {
            assert_eq!(pattern.matches("/group/1/user/2"), first);
        }
    }

    #[test]
    fn test_structural_identity() {
        let a = Pattern::parse("/test").unwrap();
        let b = Pattern::parse("test").unwrap();
        let c = Pattern::parse("/test/").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_ne!(a, Pattern::parse("/test/:id").unwrap());
        assert_eq!(a.to_string(), "/test");
    }

    #[test]
    fn test_display_round_trips_captures() {
        let pattern = Pattern::parse("participant/:id/").unwrap();
        assert_eq!(pattern.to_string(), "/participant/:id");
        assert_eq!(pattern.segments().len(), 2);
    }

    #[test]
    fn test_rejects_malformed_patterns() {
        assert_eq!(
            Pattern::parse("/user/:"),
            Err(RouteError::EmptyCaptureName {
                pattern: "/user/:".to_string()
            })
        );
        assert_eq!(
            Pattern::parse("/:id/x/:id"),
            Err(RouteError::DuplicateCapture {
                pattern: "/:id/x/:id".to_string(),
                name: "id".to_string()
            })
        );
        assert!(match_path("/:id/:id", "/a/b").is_none());
    }
}
