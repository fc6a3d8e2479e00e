use crate::error::{Error, Result};
use crate::matcher::PathMatcher;
use crate::name::QName;
use crate::path::LocationPath;

/// The currently open elements together with the paths to keep.
///
/// Pushes and pops must be strictly paired. Popping an empty stack is a
/// caller bug and is reported as [`Error::UnbalancedEndElement`].
#[derive(Debug, Clone, Default)]
pub struct PathStack {
    elements: Vec<QName>,
    matchers: Vec<PathMatcher>,
}

impl PathStack {
    pub fn new(paths: impl IntoIterator<Item = LocationPath>) -> Self {
        Self {
            elements: Vec::new(),
            matchers: paths.into_iter().map(PathMatcher::new).collect(),
        }
    }

    pub fn start_element(&mut self, name: QName) {
        self.elements.push(name);
    }

    pub fn end_element(&mut self) -> Result<QName> {
        self.elements.pop().ok_or(Error::UnbalancedEndElement)
    }

    /// `true` when any registered path matches the open elements.
    pub fn should_write(&self) -> bool {
        self.matchers.iter().any(|m| m.matches(&self.elements))
    }

    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[QName] {
        &self.elements
    }

    pub fn matchers(&self) -> &[PathMatcher] {
        &self.matchers
    }
}
