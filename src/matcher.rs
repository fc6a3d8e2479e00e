use crate::name::QName;
use crate::path::{Anchor, LocationPath};

/// Tests open element stacks against one location path.
///
/// Path and stack are compared step by step in lock-step. The first
/// mismatching pair rejects the stack; running out of either sequence
/// accepts it. An accepted stack is only *compatible* with the path: while
/// descending toward a target the matcher keeps answering `true` before the
/// target itself is open.
///
/// Root-anchored paths accept a stack when either alignment holds: walked
/// from the document root (a shorter stack is on its way to a target, a
/// longer one is inside a target) or walked leaf-first from the innermost
/// element (so `/b` also matches `b` at any depth). Paths anchored
/// [`Anchor::Anywhere`] only use the leaf-first walk.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    path: LocationPath,
}

impl PathMatcher {
    pub fn new(path: LocationPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &LocationPath {
        &self.path
    }

    pub fn matches(&self, stack: &[QName]) -> bool {
        let steps = self.path.steps();
        match self.path.anchor() {
            Anchor::Root => {
                aligned(steps.iter(), stack.iter())
                    || aligned(steps.iter().rev(), stack.iter().rev())
            }
            Anchor::Anywhere => aligned(steps.iter().rev(), stack.iter().rev()),
        }
    }
}

impl From<LocationPath> for PathMatcher {
    fn from(path: LocationPath) -> Self {
        Self::new(path)
    }
}

fn aligned<'a>(
    steps: impl Iterator<Item = &'a QName>,
    elements: impl Iterator<Item = &'a QName>,
) -> bool {
    steps.zip(elements).all(|(step, element)| step.matches_step(element))
}
