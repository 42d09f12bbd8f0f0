//! Kind queries with an optional ancestor filter.

use entimap_value::{Document, DocumentKey, Namespace};
use std::fmt;

/// A query for documents of one kind in one namespace.
///
/// # Example
///
/// ```rust
/// use entimap_storage::Query;
/// use entimap_value::{DocumentKey, Namespace};
///
/// let ns = Namespace::new("tenant-a");
/// let company = DocumentKey::new(&ns, "Company").with_id(7);
/// let query = Query::kind(&ns, "Person").has_ancestor(company).limit(10);
/// assert_eq!(query.kind_name(), "Person");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    namespace: Namespace,
    kind: String,
    ancestor: Option<DocumentKey>,
    limit: Option<usize>,
}

impl Query {
    /// Creates a query for every document of `kind` in `namespace`.
    pub fn kind(namespace: &Namespace, kind: impl Into<String>) -> Self {
        Self {
            namespace: namespace.clone(),
            kind: kind.into(),
            ancestor: None,
            limit: None,
        }
    }

    /// Restricts results to documents under `ancestor` (inclusive).
    #[must_use]
    pub fn has_ancestor(mut self, ancestor: DocumentKey) -> Self {
        self.ancestor = Some(ancestor);
        self
    }

    /// Caps the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Namespace the query runs in.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Kind the query selects.
    pub fn kind_name(&self) -> &str {
        &self.kind
    }

    /// Ancestor filter, if any.
    pub fn ancestor(&self) -> Option<&DocumentKey> {
        self.ancestor.as_ref()
    }

    /// Result cap, if any.
    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Returns `true` if `document` satisfies every filter except the limit.
    pub fn matches(&self, document: &Document) -> bool {
        let Some(key) = &document.key else {
            return false;
        };
        key.kind == self.kind
            && key.namespace == self.namespace.namespace
            && key.project == self.namespace.project
            && self
                .ancestor
                .as_ref()
                .map_or(true, |ancestor| key.has_ancestor(ancestor))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT * FROM {} IN [{}]", self.kind, self.namespace)?;
        if let Some(ancestor) = &self.ancestor {
            write!(f, " WHERE __key__ HAS ANCESTOR {ancestor}")?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}
