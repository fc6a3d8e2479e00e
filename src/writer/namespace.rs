use crate::name::XML_NS;

/// Scoped prefix bindings. The empty prefix stands for the default namespace.
///
/// There is always a document level scope below the element scopes, so
/// prefixes can be bound before the root element is opened.
#[derive(Debug, Clone)]
pub struct NamespaceContext {
    scopes: Vec<Vec<(String, String)>>,
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self {
            scopes: vec![Vec::new()],
        }
    }
}

impl NamespaceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Drops the innermost element scope. The document scope is kept.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Binds `prefix` in the innermost scope, replacing a binding of the same
    /// prefix made earlier in that scope.
    pub fn bind(&mut self, prefix: &str, uri: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            match scope.iter_mut().find(|(p, _)| p == prefix) {
                Some(binding) => binding.1 = uri.to_string(),
                None => scope.push((prefix.to_string(), uri.to_string())),
            }
        }
    }

    /// URI bound to `prefix`; `""` asks for the default namespace.
    pub fn uri(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NS);
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
            .filter(|u| !u.is_empty())
    }

    /// A prefix currently bound to `uri`, `""` when it is the default
    /// namespace. Prefixes shadowed by an inner binding are skipped.
    pub fn prefix(&self, uri: &str) -> Option<&str> {
        if uri == XML_NS {
            return Some("xml");
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .filter(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
            .find(|p| self.uri(p) == Some(uri))
    }

    /// Number of element scopes above the document scope.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }
}
