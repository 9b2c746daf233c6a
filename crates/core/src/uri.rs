// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal URI parsing for target/dependency locators.
//!
//! Targets and deps are plain strings everywhere else in the engine; this
//! type exists only at the boundary where a resource adapter needs the
//! pieces (scheme, netloc, path) broken out. We do not pull in the `url`
//! crate here because its authority rules don't match buildpy's
//! historical behavior: a bare path like `build/out.o` is a valid target
//! and defaults to `file://localhost/build/out.o`.

use crate::error::CoreError;
use std::fmt;

/// A parsed target/dependency locator: `{scheme, netloc, path, params, query, fragment}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    pub scheme: String,
    pub netloc: String,
    pub path: String,
    pub params: String,
    pub query: String,
    pub fragment: String,
}

impl Uri {
    /// Parse a target string into its component parts.
    ///
    /// A bare path with no `scheme://` prefix is treated as `file://localhost/<path>`.
    /// For the `file` scheme the netloc defaults to, and must equal, `localhost`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        // `urlparse` only ever produces a netloc when the string carries
        // authority syntax (`scheme://...`); a bare path is never split.
        let (scheme, netloc, mut path) = match raw.split_once("://") {
            Some((scheme, rest)) => match rest.find('/') {
                Some(idx) => (scheme.to_string(), rest[..idx].to_string(), rest[idx..].to_string()),
                None => (scheme.to_string(), rest.to_string(), String::new()),
            },
            None => ("file".to_string(), String::new(), raw.to_string()),
        };

        let fragment = match path.find('#') {
            Some(idx) => {
                let frag = path[idx + 1..].to_string();
                path.truncate(idx);
                frag
            }
            None => String::new(),
        };

        let query = match path.find('?') {
            Some(idx) => {
                let q = path[idx + 1..].to_string();
                path.truncate(idx);
                q
            }
            None => String::new(),
        };

        let params = match path.rfind(';') {
            Some(idx) => {
                let p = path[idx + 1..].to_string();
                path.truncate(idx);
                p
            }
            None => String::new(),
        };

        let netloc = if scheme == "file" && netloc.is_empty() {
            "localhost".to_string()
        } else {
            netloc
        };

        let uri = Self { scheme, netloc, path, params, query, fragment };

        if uri.scheme == "file" && uri.netloc != "localhost" {
            return Err(CoreError::InvalidUri {
                uri: raw.to_string(),
                reason: format!("file:// netloc must be \"localhost\", got {:?}", uri.netloc),
            });
        }

        Ok(uri)
    }

    /// The path with any leading slash kept intact (an absolute filesystem
    /// path for `file://`; an object key for remote schemes).
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.netloc, self.path)?;
        if !self.params.is_empty() {
            write!(f, ";{}", self.params)?;
        }
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "uri_tests.rs"]
mod tests;
