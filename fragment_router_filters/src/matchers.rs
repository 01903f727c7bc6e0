// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifier matchers.
//!
//! [`matches`] records what it found in the request's extension bag:
//! [`Captures`] always, and [`Params`] when the pattern has named groups.
//! Later handlers of the same pipeline read them with
//! [`Extensions::get`](fragment_router::Extensions::get).

use std::collections::BTreeMap;

use fragment_router::Request;
use regex::Regex;

/// Positional captures of the last successful [`matches`]; index `0` is the whole match.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Captures(pub Vec<Option<String>>);

impl Captures {
    /// The text of group `index`, if it participated in the match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(Option::as_deref)
    }

    /// Number of groups, including the whole match.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no group was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Named captures of the last successful [`matches`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Params(pub BTreeMap<String, String>);

impl Params {
    /// The text captured by the group called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Accepts the empty identifier.
pub fn is_home(request: &mut Request) -> bool {
    request.identifier().is_empty()
}

/// Accepts exactly `expected`.
pub fn equals(expected: impl Into<String>) -> impl Fn(&mut Request) -> bool {
    let expected = expected.into();
    move |request| request.identifier() == expected
}

/// Accepts identifiers matched by `pattern`, recording [`Captures`] and [`Params`].
///
/// The pattern is not anchored; use `^` and `$` for a full match.
pub fn matches(pattern: Regex) -> impl Fn(&mut Request) -> bool {
    let named = pattern.capture_names().flatten().count() > 0;
    move |request| {
        let (captures, params) = {
            let Some(found) = pattern.captures(request.identifier()) else {
                return false;
            };
            let captures: Vec<Option<String>> = found
                .iter()
                .map(|group| group.map(|m| m.as_str().to_owned()))
                .collect();
            let params = named.then(|| {
                pattern
                    .capture_names()
                    .flatten()
                    .filter_map(|name| Some((name.to_owned(), found.name(name)?.as_str().to_owned())))
                    .collect::<BTreeMap<_, _>>()
            });
            (captures, params)
        };
        let extensions = request.extensions_mut();
        extensions.insert(Captures(captures));
        if let Some(params) = params {
            extensions.insert(Params(params));
        }
        true
    }
}

/// Accepts identifiers starting with `prefix` and consumes it.
///
/// The consumed text is appended to the request's prefix. An empty prefix always
/// matches and leaves the request untouched.
pub fn has_prefix(prefix: impl Into<String>) -> impl Fn(&mut Request) -> bool {
    let prefix = prefix.into();
    move |request| request.consume(&prefix)
}
