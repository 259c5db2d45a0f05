//! Path pattern compilation and matching.
//!
//! A pattern is split on `/` into segments:
//!
//! | Segment      | Meaning                                                   |
//! |--------------|-----------------------------------------------------------|
//! | `users`      | literal, matched byte for byte                            |
//! | `:id`        | named parameter, one segment                              |
//! | `:id(\d+)`   | named parameter constrained by a regular expression       |
//! | `*`          | positional wildcard, may span several segments            |
//!
//! Patterns compile to an anchored, case-sensitive [`regex::Regex`]. Trailing
//! slashes are significant, so a pattern made only of literals matches a
//! pathname iff the two are byte-equal. Constraints cannot contain `/`.
//!
//! Captured values are percent-decoded like a URI component. A malformed
//! escape is reported as [`RouterError::Decode`], never passed through raw.
//!
//! # Example
//!
//! ```
//! use page_router::{ParameterBag, PathMatcher};
//!
//! let matcher = PathMatcher::compile("/route/:param/*").unwrap();
//! let mut params = ParameterBag::new();
//! assert!(matcher.extract("/route/param/asterisk?x=1", &mut params).unwrap());
//! assert_eq!(params.get("param"), Some("param"));
//! assert_eq!(params.at(1), Some("asterisk"));
//! ```

use crate::error::RouterError;
use crate::params::ParameterBag;
use crate::{error_log, trace_log};
use regex::Regex;
use std::borrow::Cow;

/// Expression used for a named parameter without an explicit constraint.
const SEGMENT_EXPR: &str = "[^/]+?";

/// Expression used for `*`.
const WILDCARD_EXPR: &str = ".*";

/// One capture slot of a compiled pattern, in left-to-right order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKey {
    /// `:name` or `:name(constraint)`
    Named(String),
    /// `*`
    Wildcard,
}

impl ParamKey {
    /// Parameter name, `None` for wildcards.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Wildcard => None,
        }
    }
}

#[derive(Debug)]
enum Segment<'a> {
    Literal(&'a str),
    Param {
        name: &'a str,
        constraint: Option<&'a str>,
    },
    Wildcard,
}

fn parse_segment<'a>(pattern: &str, raw: &'a str) -> Result<Segment<'a>, RouterError> {
    if raw == "*" {
        return Ok(Segment::Wildcard);
    }
    let Some(body) = raw.strip_prefix(':') else {
        return Ok(Segment::Literal(raw));
    };

    let name_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    let (name, rest) = body.split_at(name_len);
    if name.is_empty() {
        return Err(RouterError::invalid_pattern(
            pattern,
            format!("segment '{raw}' has an empty parameter name"),
        ));
    }
    if rest.is_empty() {
        return Ok(Segment::Param {
            name,
            constraint: None,
        });
    }

    match rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(constraint) if !constraint.is_empty() => {
            // The constraint must stand on its own so it cannot close the
            // capture group or escape the anchors.
            Regex::new(constraint).map_err(|err| {
                RouterError::invalid_pattern(
                    pattern,
                    format!("invalid constraint '{constraint}' for '{name}': {err}"),
                )
            })?;
            Ok(Segment::Param {
                name,
                constraint: Some(constraint),
            })
        }
        _ => Err(RouterError::invalid_pattern(
            pattern,
            format!("unexpected '{rest}' after parameter '{name}'"),
        )),
    }
}

/// A compiled path pattern.
///
/// Compilation is pure: compiling the same string twice yields matchers that
/// behave identically on every input.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: String,
    regex: Regex,
    keys: Vec<ParamKey>,
    /// Regex group index of each slot in `keys`.
    groups: Vec<usize>,
}

impl PathMatcher {
    /// Compile `pattern` into a matcher.
    pub fn compile(pattern: &str) -> Result<Self, RouterError> {
        let mut source = String::from("^");
        let mut keys = Vec::new();

        for (i, raw) in pattern.split('/').enumerate() {
            if i > 0 {
                source.push('/');
            }
            match parse_segment(pattern, raw)? {
                Segment::Literal(text) => source.push_str(&regex::escape(text)),
                Segment::Param { name, constraint } => {
                    let expr = constraint.unwrap_or(SEGMENT_EXPR);
                    source.push_str(&format!("(?P<p{}>(?:{}))", keys.len(), expr));
                    keys.push(ParamKey::Named(name.to_string()));
                }
                Segment::Wildcard => {
                    source.push_str(&format!("(?P<p{}>{})", keys.len(), WILDCARD_EXPR));
                    keys.push(ParamKey::Wildcard);
                }
            }
        }
        source.push('$');

        let regex = Regex::new(&source)
            .map_err(|err| RouterError::invalid_pattern(pattern, err.to_string()))?;

        let groups = (0..keys.len())
            .map(|slot| {
                let wanted = format!("p{slot}");
                regex
                    .capture_names()
                    .position(|name| name == Some(wanted.as_str()))
                    .ok_or_else(|| {
                        RouterError::invalid_pattern(pattern, format!("lost capture slot {slot}"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        trace_log!("Compiled pattern '{}' to '{}'", pattern, source);

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            keys,
            groups,
        })
    }

    /// The pattern this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Capture slots in left-to-right order.
    pub fn keys(&self) -> &[ParamKey] {
        &self.keys
    }

    /// Names of the named parameters, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().filter_map(ParamKey::name)
    }

    /// Check whether `path` matches, without decoding any capture.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(strip_query(path))
    }

    /// Match `path` (query suffix ignored) and return the decoded captures.
    ///
    /// `Ok(None)` means no match. A capture that is not valid
    /// percent-encoding yields [`RouterError::Decode`].
    pub fn test(&self, path: &str) -> Result<Option<Vec<String>>, RouterError> {
        let Some(captures) = self.regex.captures(strip_query(path)) else {
            return Ok(None);
        };

        self.groups
            .iter()
            .map(|&group| {
                let raw = captures.get(group).map_or("", |m| m.as_str());
                decode_component(raw).map_err(|err| {
                    error_log!("Pattern '{}' on '{}': {}", self.pattern, path, err);
                    err
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Match `path` and write the captures into `params`.
    ///
    /// Values are appended positionally; named captures are also set under
    /// their name. `params` is left untouched when the result is `Ok(false)`
    /// or an error.
    pub fn extract(&self, path: &str, params: &mut ParameterBag) -> Result<bool, RouterError> {
        let Some(values) = self.test(path)? else {
            return Ok(false);
        };
        for (key, value) in self.keys.iter().zip(values) {
            match key {
                ParamKey::Named(name) => params.push_named(name.as_str(), value),
                ParamKey::Wildcard => params.push_positional(value),
            }
        }
        Ok(true)
    }
}

/// Drop everything from the first `?` on.
pub fn strip_query(path: &str) -> &str {
    path.find('?').map_or(path, |i| &path[..i])
}

/// Percent-decode one captured value, URI-component style.
///
/// Every `%` must be followed by two hex digits and the decoded bytes must
/// form valid UTF-8. `+` is left alone.
pub fn decode_component(raw: &str) -> Result<String, RouterError> {
    let bytes = raw.as_bytes();
    let mut from = 0;
    while let Some(offset) = bytes[from..].iter().position(|&b| b == b'%') {
        let at = from + offset;
        let escaped = bytes
            .get(at + 1..at + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !escaped {
            return Err(RouterError::decode(
                raw,
                format!("malformed escape at byte {at}"),
            ));
        }
        from = at + 3;
    }

    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .map_err(|err| RouterError::decode(raw, err.to_string()))
}
