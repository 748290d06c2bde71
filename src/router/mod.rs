//! Route table module
//!
//! Deterministic dispatch from an incoming (method, path) pair to exactly one
//! registered value, or a declared `NoMatch`. Patterns are path templates with
//! literal segments, `:name` parameter segments, and at most one trailing
//! `*name` wildcard that captures the remainder of the path including slashes.
//!
//! The table is built once during server construction and is immutable
//! afterwards; duplicate `(method, pattern)` registrations are rejected at
//! build time so a conflicting route can never be discovered at request time.
//! Static segments take priority over parameter segments at the same
//! position, and parameters over the wildcard; the tie-break is deterministic.

mod node;

use std::collections::HashMap;

use hyper::Method;
use thiserror::Error;

use node::Node;

/// Route table registration error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// The `(method, pattern)` pair is already registered, or overlaps an
    /// existing pattern at the same position with an incompatible capture.
    #[error("route conflict: {method} {pattern}")]
    Conflict { method: Method, pattern: String },
    /// The pattern itself is malformed.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },
}

/// One segment of a parsed route pattern.
enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
    Wildcard(&'a str),
}

/// Path parameters captured during a successful match.
#[derive(Debug, Default)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A successful lookup: the registered value plus captured parameters.
pub struct Matched<'r, T> {
    pub value: &'r T,
    pub params: Params,
}

/// Declared "no route" outcome; the caller decides the fallback.
#[derive(Debug, PartialEq, Eq)]
pub struct NoMatch;

/// Immutable-after-build route table keyed by method, one segment trie per
/// method.
pub struct Router<T> {
    methods: HashMap<Method, Node<T>>,
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Register `value` under `(method, pattern)`.
    ///
    /// Must only be called during the build phase, before the table is shared
    /// with request handlers.
    pub fn insert(&mut self, method: Method, pattern: &str, value: T) -> Result<(), RouteError> {
        let segments = parse_pattern(pattern)?;
        self.methods
            .entry(method.clone())
            .or_insert_with(Node::new)
            .insert(&segments, value)
            .map_err(|_occupied| RouteError::Conflict {
                method,
                pattern: pattern.to_string(),
            })
    }

    /// Look up the value registered for `(method, path)`.
    ///
    /// Matching is exact on segment count except for a trailing wildcard,
    /// which captures the remaining path as one value. Cost is proportional
    /// to the number of segments in `path`.
    pub fn at(&self, method: &Method, path: &str) -> Result<Matched<'_, T>, NoMatch> {
        let root = self.methods.get(method).ok_or(NoMatch)?;
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let segments: Vec<&str> = trimmed.split('/').collect();

        let mut params = Vec::new();
        match root.find(&segments, &mut params) {
            Some(value) => Ok(Matched {
                value,
                params: Params(params),
            }),
            None => Err(NoMatch),
        }
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment<'_>>, RouteError> {
    let invalid = |reason| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    let Some(rest) = pattern.strip_prefix('/') else {
        return Err(invalid("must start with '/'"));
    };

    let raw: Vec<&str> = rest.split('/').collect();
    let mut segments = Vec::with_capacity(raw.len());

    for (index, segment) in raw.iter().enumerate() {
        if let Some(name) = segment.strip_prefix(':') {
            if name.is_empty() {
                return Err(invalid("parameter segment needs a name"));
            }
            segments.push(Segment::Param(name));
        } else if let Some(name) = segment.strip_prefix('*') {
            if name.is_empty() {
                return Err(invalid("wildcard segment needs a name"));
            }
            if index + 1 != raw.len() {
                return Err(invalid("wildcard is only allowed as the last segment"));
            }
            segments.push(Segment::Wildcard(name));
        } else {
            segments.push(Segment::Literal(segment));
        }
    }

    Ok(segments)
}
