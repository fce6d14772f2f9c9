//! Path resolution.
//!
//! [`resolve`] finds *where* a value lives without reading it: it returns the
//! container holding the last path segment together with that segment's key,
//! so `get` can read, `set` can write and `do` can invoke from the same
//! result.
//!
//! Path grammar (after [`Argument`] normalisation):
//!
//! ```text
//! $                      the environment itself
//! <host value name>      that host value
//! word                   no '.' or '[': the literal string
//! first(.seg)*           compound path
//! seg := ident | [expr]  ident is a literal key, [expr] is evaluated
//! ```
//!
//! The first segment of a compound path is itself resolved against the
//! environment (for `$.a.b` that is `$`, the root). Bracket segments are full
//! expressions evaluated against the environment, e.g. `$.rows[$.cursor]`.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::types::{Argument, ROOT};
use crate::value::Value;
use serde_json::Value as Json;

/// Outcome of resolving a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// An intermediate segment was missing or the path was malformed.
    NotFound,
    /// The argument denotes a whole value rather than a slot in a container.
    Whole(Value),
    /// `parent[key]`, not yet dereferenced.
    Slot { key: Value, parent: Value },
}

impl Location {
    /// Reads the located value. `None` when nothing is there.
    pub fn read(&self) -> Option<Value> {
        match self {
            Location::NotFound => None,
            Location::Whole(value) => Some(value.clone()),
            Location::Slot { key, parent } => parent.member(key),
        }
    }
}

pub fn resolve(ctx: &EvalCtx, arg: &Argument) -> Result<Location, EvalError> {
    match arg.raw() {
        Json::String(path) => resolve_str(ctx, path),
        _ => Ok(Location::Whole(arg.evaluate(ctx)?)),
    }
}

pub fn resolve_str(ctx: &EvalCtx, path: &str) -> Result<Location, EvalError> {
    if path == ROOT {
        return Ok(Location::Whole(ctx.env.as_value()));
    }
    if let Some(value) = ctx.registry.value(path) {
        return Ok(Location::Whole(value.clone()));
    }
    if !path.contains(['.', '[']) {
        return Ok(Location::Whole(Value::String(path.to_string())));
    }

    let Some((first, mut remain)) = split_first(path) else {
        return Ok(Location::NotFound);
    };
    let mut cursor = match resolve_str(ctx, first)?.read() {
        Some(value) if !value.is_null() => value,
        _ => return Ok(Location::NotFound),
    };

    loop {
        let Some((segment, tail)) = next_segment(remain) else {
            return Ok(Location::NotFound);
        };
        let key = match segment {
            Segment::Name(name) => match ctx.registry.value(name) {
                Some(value) => value.clone(),
                None => Value::String(name.to_string()),
            },
            Segment::Computed(expr) => crate::evaluate(&Json::String(expr.to_string()), ctx)?,
        };
        if tail.is_empty() {
            return Ok(Location::Slot { key, parent: cursor });
        }
        cursor = match cursor.member(&key) {
            Some(value) if !value.is_null() => value,
            _ => return Ok(Location::NotFound),
        };
        remain = tail;
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Name(&'a str),
    Computed(&'a str),
}

fn is_name_char(c: char) -> bool {
    !matches!(c, '[' | ']' | ' ' | '.')
}

/// Splits `first.rest` / `first[rest`. Both parts must be non-empty.
fn split_first(path: &str) -> Option<(&str, &str)> {
    let end = path.find(|c| !is_name_char(c)).unwrap_or(path.len());
    if end == 0 {
        return None;
    }
    let (first, rest) = path.split_at(end);
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    if rest.is_empty() {
        return None;
    }
    Some((first, rest))
}

/// Parses one segment and an optional trailing `.`.
fn next_segment(s: &str) -> Option<(Segment<'_>, &str)> {
    let (segment, tail) = if let Some(inner) = s.strip_prefix('[') {
        let close = inner.find(']')?;
        let expr = &inner[..close];
        if expr.is_empty() || expr.contains('[') {
            return None;
        }
        (Segment::Computed(expr), &inner[close + 1..])
    } else {
        let end = s.find(|c| !is_name_char(c)).unwrap_or(s.len());
        if end == 0 {
            return None;
        }
        (Segment::Name(&s[..end]), &s[end..])
    };
    Some((segment, tail.strip_prefix('.').unwrap_or(tail)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_first_segment() {
        assert_eq!(split_first("$.a.b"), Some(("$", "a.b")));
        assert_eq!(split_first("$.[x]"), Some(("$", "[x]")));
        assert_eq!(split_first("$."), None);
        assert_eq!(split_first(".a"), None);
    }

    #[test]
    fn parses_segments() {
        assert_eq!(next_segment("a.b"), Some((Segment::Name("a"), "b")));
        assert_eq!(next_segment("a[0]"), Some((Segment::Name("a"), "[0]")));
        assert_eq!(
            next_segment("[$.i].x"),
            Some((Segment::Computed("$.i"), "x"))
        );
        assert_eq!(next_segment("last"), Some((Segment::Name("last"), "")));
        assert_eq!(next_segment(" a"), None);
        assert_eq!(next_segment("[]"), None);
        assert_eq!(next_segment("[a"), None);
    }
}
