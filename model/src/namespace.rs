//! The server-wide namespace table.
//!
//! Every node manager in a server receives a handle to the same table and
//! registers the namespace URIs it serves. The table only grows; an index,
//! once handed out, keeps naming the same URI for the lifetime of the server.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::ids::STANDARD_NAMESPACE_URI;

/// Append-only mapping from namespace URI to namespace index.
///
/// Index 0 is always the standard namespace.
#[derive(Debug)]
pub struct NamespaceTable {
    uris: RwLock<Vec<String>>,
}

/// Shared handle to a [`NamespaceTable`].
pub type SharedNamespaceTable = Arc<NamespaceTable>;

impl NamespaceTable {
    /// Creates a table holding only the standard namespace.
    #[must_use]
    pub fn new() -> Self {
        Self {
            uris: RwLock::new(vec![STANDARD_NAMESPACE_URI.to_owned()]),
        }
    }

    /// Creates a shared table holding only the standard namespace.
    #[must_use]
    pub fn shared() -> SharedNamespaceTable {
        Arc::new(Self::new())
    }

    /// Returns the index of `uri`, or `None` if it was never registered.
    #[must_use]
    pub fn get_index(&self, uri: &str) -> Option<u16> {
        self.uris
            .read()
            .iter()
            .position(|u| u == uri)
            .and_then(|i| u16::try_from(i).ok())
    }

    /// Returns the index of `uri`, appending it first if it is new.
    ///
    /// Returns `None` only once all 65 536 indices are taken.
    pub fn get_index_or_append(&self, uri: &str) -> Option<u16> {
        let mut uris = self.uris.write();
        if let Some(i) = uris.iter().position(|u| u == uri) {
            return u16::try_from(i).ok();
        }
        let index = u16::try_from(uris.len()).ok()?;
        uris.push(uri.to_owned());
        Some(index)
    }

    /// Returns the URI registered at `index`.
    #[must_use]
    pub fn uri(&self, index: u16) -> Option<String> {
        self.uris.read().get(usize::from(index)).cloned()
    }

    /// Number of registered namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.uris.read().len()
    }

    /// Always false: the standard namespace is present from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Snapshot of all URIs in index order.
    #[must_use]
    pub fn uris(&self) -> Vec<String> {
        self.uris.read().clone()
    }
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_namespace_is_index_zero() {
        let table = NamespaceTable::new();
        assert_eq!(table.get_index(STANDARD_NAMESPACE_URI), Some(0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn append_reuses_existing_index() {
        let table = NamespaceTable::new();
        let a = table.get_index_or_append("urn:a");
        let b = table.get_index_or_append("urn:b");
        let again = table.get_index_or_append("urn:a");
        assert_eq!(a, Some(1));
        assert_eq!(b, Some(2));
        assert_eq!(again, a);
        assert_eq!(table.len(), 3);
        assert_eq!(table.uri(2).as_deref(), Some("urn:b"));
    }

    #[test]
    fn shared_handles_see_the_same_table() {
        let table = NamespaceTable::shared();
        let other = Arc::clone(&table);
        other.get_index_or_append("urn:shared");
        assert_eq!(table.get_index("urn:shared"), Some(1));
    }
}
