//! Namespaces, ancestor paths and document keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope for every key the store holds.
///
/// An absent `project` means the ambient default project applies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Namespace {
    /// Project the namespace belongs to, if not the default one.
    pub project: Option<String>,
    /// Namespace name. Empty is the default namespace.
    pub namespace: String,
}

impl Namespace {
    /// Creates a namespace in the default project.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            project: None,
            namespace: namespace.into(),
        }
    }

    /// Sets the project.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project {
            Some(project) => write!(f, "{project}/{}", self.namespace),
            None => write!(f, "{}", self.namespace),
        }
    }
}

/// How a key identifier is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyKind {
    /// Textual identifier.
    String,
    /// Numeric identifier.
    Long,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::String => f.write_str("string"),
            KeyKind::Long => f.write_str("long"),
        }
    }
}

/// Identifier of one element of a key path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Textual identifier.
    Name(String),
    /// Numeric identifier.
    Id(i64),
}

impl Key {
    /// Returns the representation of this identifier.
    pub fn kind(&self) -> KeyKind {
        match self {
            Key::Name(_) => KeyKind::String,
            Key::Id(_) => KeyKind::Long,
        }
    }

    /// Returns the textual identifier, if this is one.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Id(_) => None,
        }
    }

    /// Returns the numeric identifier, if this is one.
    pub fn as_id(&self) -> Option<i64> {
        match self {
            Key::Id(id) => Some(*id),
            Key::Name(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "{name:?}"),
            Key::Id(id) => write!(f, "{id}"),
        }
    }
}

impl From<i64> for Key {
    fn from(id: i64) -> Self {
        Key::Id(id)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

/// One `(kind, identifier)` element of an ancestor path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ancestor {
    /// Kind of the ancestor document.
    pub kind: String,
    /// Identifier of the ancestor document.
    pub key: Key,
}

impl Ancestor {
    /// Creates an ancestor.
    pub fn new(kind: impl Into<String>, key: impl Into<Key>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
        }
    }

    /// Creates an ancestor with a textual identifier.
    pub fn name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(kind, Key::Name(name.into()))
    }

    /// Creates an ancestor with a numeric identifier.
    pub fn id(kind: impl Into<String>, id: i64) -> Self {
        Self::new(kind, Key::Id(id))
    }
}

impl fmt::Display for Ancestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.key)
    }
}

/// Full key of a document: namespace, ancestor path, kind and identifier.
///
/// A key without an identifier is *incomplete*; the store assigns a numeric
/// identifier when such a document is put.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    /// Project, if not the default one.
    pub project: Option<String>,
    /// Namespace name.
    pub namespace: String,
    /// Ancestors, outermost first.
    pub ancestors: Vec<Ancestor>,
    /// Kind of the document.
    pub kind: String,
    /// Identifier, absent while the key is incomplete.
    pub id: Option<Key>,
}

impl DocumentKey {
    /// Creates an incomplete key with no ancestors.
    pub fn new(namespace: &Namespace, kind: impl Into<String>) -> Self {
        Self {
            project: namespace.project.clone(),
            namespace: namespace.namespace.clone(),
            ancestors: Vec::new(),
            kind: kind.into(),
            id: None,
        }
    }

    /// Builds the key whose path is exactly `path`: the last element becomes
    /// the kind and identifier, the preceding ones the ancestors.
    ///
    /// Returns `None` for an empty path.
    pub fn from_path(namespace: &Namespace, path: &[Ancestor]) -> Option<Self> {
        let (last, parents) = path.split_last()?;
        Some(
            Self::new(namespace, last.kind.clone())
                .with_ancestors(parents.to_vec())
                .with_id(last.key.clone()),
        )
    }

    /// Replaces the ancestor path.
    #[must_use]
    pub fn with_ancestors(mut self, ancestors: Vec<Ancestor>) -> Self {
        self.ancestors = ancestors;
        self
    }

    /// Sets the identifier, completing the key.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Key>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns `true` once an identifier is assigned.
    pub fn is_complete(&self) -> bool {
        self.id.is_some()
    }

    /// Returns the namespace this key lives in.
    pub fn namespace(&self) -> Namespace {
        Namespace {
            project: self.project.clone(),
            namespace: self.namespace.clone(),
        }
    }

    /// Returns this key as a path element, if it is complete.
    pub fn as_ancestor(&self) -> Option<Ancestor> {
        self.id.as_ref().map(|key| Ancestor {
            kind: self.kind.clone(),
            key: key.clone(),
        })
    }

    /// Returns the full path: the ancestors followed by this key when complete.
    pub fn path(&self) -> Vec<Ancestor> {
        let mut path = self.ancestors.clone();
        path.extend(self.as_ancestor());
        path
    }

    /// Returns `true` if `ancestor` is on this key's path.
    ///
    /// A complete key counts as its own ancestor.
    pub fn has_ancestor(&self, ancestor: &DocumentKey) -> bool {
        if self.project != ancestor.project || self.namespace != ancestor.namespace {
            return false;
        }
        let Some(head) = ancestor.as_ancestor() else {
            return false;
        };
        let path = self.path();
        let depth = ancestor.ancestors.len();
        path.len() > depth
            && path[..depth] == ancestor.ancestors[..]
            && path[depth] == head
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.namespace())?;
        for ancestor in &self.ancestors {
            write!(f, "/{ancestor}")?;
        }
        match &self.id {
            Some(id) => write!(f, "/{}({id})", self.kind),
            None => write!(f, "/{}(?)", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> Namespace {
        Namespace::new("tenant-a")
    }

    #[test]
    fn new_key_is_incomplete() {
        let key = DocumentKey::new(&ns(), "Person");
        assert!(!key.is_complete());
        assert!(key.as_ancestor().is_none());
        assert!(key.path().is_empty());
    }

    #[test]
    fn from_path_splits_last_element() {
        let path = vec![Ancestor::id("Company", 7), Ancestor::name("Team", "core")];
        let key = DocumentKey::from_path(&ns(), &path).unwrap();

        assert_eq!(key.kind, "Team");
        assert_eq!(key.id, Some(Key::Name("core".into())));
        assert_eq!(key.ancestors, vec![Ancestor::id("Company", 7)]);
        assert_eq!(key.path(), path);
        assert!(DocumentKey::from_path(&ns(), &[]).is_none());
    }

    #[test]
    fn key_is_its_own_ancestor() {
        let key = DocumentKey::new(&ns(), "Person").with_id(3);
        assert!(key.has_ancestor(&key));
    }

    #[test]
    fn has_ancestor_matches_path_prefix() {
        let company = DocumentKey::new(&ns(), "Company").with_id(1);
        let team = DocumentKey::new(&ns(), "Team")
            .with_ancestors(vec![Ancestor::id("Company", 1)])
            .with_id("core");
        let person = DocumentKey::new(&ns(), "Person")
            .with_ancestors(team.path())
            .with_id(9);

        assert!(person.has_ancestor(&company));
        assert!(person.has_ancestor(&team));
        assert!(!company.has_ancestor(&person));

        let other_company = DocumentKey::new(&ns(), "Company").with_id(2);
        assert!(!person.has_ancestor(&other_company));
    }

    #[test]
    fn has_ancestor_respects_namespace() {
        let parent = DocumentKey::new(&Namespace::new("other"), "Company").with_id(1);
        let child = DocumentKey::new(&ns(), "Person")
            .with_ancestors(vec![Ancestor::id("Company", 1)])
            .with_id(2);
        assert!(!child.has_ancestor(&parent));
    }

    #[test]
    fn incomplete_key_is_nobody_s_ancestor() {
        let pending = DocumentKey::new(&ns(), "Company");
        let child = DocumentKey::new(&ns(), "Company").with_id(1);
        assert!(!child.has_ancestor(&pending));
    }

    #[test]
    fn display_renders_path() {
        let key = DocumentKey::new(&ns().with_project("proj"), "Person")
            .with_ancestors(vec![Ancestor::id("Company", 1)]);
        assert_eq!(key.to_string(), "[proj/tenant-a]/Company(1)/Person(?)");
    }
}
