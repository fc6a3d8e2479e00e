//! Location paths selecting the elements to keep.
//!
//! Only a small XPath subset is accepted: named child steps separated by `/`.
//! Predicates, attribute steps, wildcards, axes and `.`/`..` are rejected.
//!
//! | Expression       | Meaning                                              |
//! |------------------|------------------------------------------------------|
//! | `/a/b`, `a/b`    | from the document root, or leaf-first at any depth   |
//! | `//a/b`          | anywhere in the document, compared leaf-first        |
//! | `gml:pos`        | prefixed step, resolved against the given bindings   |
//! | `{urn:x}pos`     | step in Clark notation                               |
//! | `pos`            | step without namespace, matches on local name only   |

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::name::QName;

/// Where a location path is aligned against the open element stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// First step aligned with the document root, or last step aligned with
    /// the innermost open element; either alignment is enough.
    Root,
    /// Last step aligned with the innermost open element.
    Anywhere,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPath {
    anchor: Anchor,
    steps: Vec<QName>,
}

impl LocationPath {
    pub fn new(anchor: Anchor, steps: impl IntoIterator<Item = QName>) -> Self {
        Self {
            anchor,
            steps: steps.into_iter().collect(),
        }
    }

    pub fn anchored(steps: impl IntoIterator<Item = QName>) -> Self {
        Self::new(Anchor::Root, steps)
    }

    pub fn anywhere(steps: impl IntoIterator<Item = QName>) -> Self {
        Self::new(Anchor::Anywhere, steps)
    }

    /// Parses `expr`, resolving step prefixes with `bindings` (prefix -> URI).
    pub fn parse(expr: &str, bindings: &HashMap<String, String>) -> Result<Self> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_path(expr, "path is empty"));
        }

        let (anchor, body) = if let Some(rest) = trimmed.strip_prefix("//") {
            (Anchor::Anywhere, rest)
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            (Anchor::Root, rest)
        } else {
            (Anchor::Root, trimmed)
        };
        if body.is_empty() {
            return Err(Error::invalid_path(expr, "path has no steps"));
        }

        let steps = split_steps(expr, body)?
            .into_iter()
            .map(|step| parse_step(expr, step, bindings))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { anchor, steps })
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn steps(&self) -> &[QName] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl FromStr for LocationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, &HashMap::new())
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lead = match self.anchor {
            Anchor::Root => "/",
            Anchor::Anywhere => "//",
        };
        f.write_str(lead)?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match step.prefix() {
                Some(prefix) => write!(f, "{}:{}", prefix, step.local_name())?,
                None => write!(f, "{}", step)?,
            }
        }
        Ok(())
    }
}

/// Splits on `/`, leaving slashes inside `{...}` namespace URIs alone.
fn split_steps<'a>(expr: &str, body: &'a str) -> Result<Vec<&'a str>> {
    let mut steps = Vec::new();
    let mut in_uri = false;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match c {
            '{' if !in_uri => in_uri = true,
            '}' if in_uri => in_uri = false,
            '/' if !in_uri => {
                steps.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_uri {
        return Err(Error::invalid_path(expr, "unterminated '{' in step"));
    }
    steps.push(&body[start..]);
    Ok(steps)
}

fn parse_step(expr: &str, step: &str, bindings: &HashMap<String, String>) -> Result<QName> {
    let step = step.trim();
    if step.is_empty() {
        return Err(Error::invalid_path(expr, "empty step"));
    }

    if let Some(rest) = step.strip_prefix('{') {
        let (uri, local) = rest
            .split_once('}')
            .ok_or_else(|| Error::invalid_path(expr, "unterminated '{' in step"))?;
        check_name(expr, local)?;
        return Ok(QName::new(uri, local));
    }

    match step.split_once(':') {
        Some((prefix, local)) => {
            check_name(expr, prefix)?;
            check_name(expr, local)?;
            let uri = bindings.get(prefix).ok_or_else(|| {
                Error::invalid_path(expr, format!("prefix '{}' is not bound", prefix))
            })?;
            Ok(QName::new(uri.as_str(), local).with_prefix(prefix))
        }
        None => {
            check_name(expr, step)?;
            Ok(QName::local(step))
        }
    }
}

fn check_name(expr: &str, name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "empty name in step"
    } else if name.starts_with('@') {
        "attribute steps are not supported"
    } else if name.contains('[') || name.contains(']') {
        "predicates are not supported"
    } else if name.contains('*') {
        "wildcards are not supported"
    } else if name == "." || name == ".." {
        "relative steps are not supported"
    } else if name.contains(':') {
        "axes are not supported"
    } else if name.contains('(') {
        "node tests and functions are not supported"
    } else if name.chars().any(char::is_whitespace) {
        "whitespace inside a step"
    } else {
        return Ok(());
    };
    Err(Error::invalid_path(expr, reason))
}
