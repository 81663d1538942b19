use std::fmt;

/// A path to a value inside a form, e.g. `"holdings.0.isin"`.
///
/// Top-level fields are single-segment paths. Repeater items add the item
/// index and the sub-field name as further segments, so every rendered
/// control gets a stable, unique path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    /// Dot-separated path string, e.g. "holdings.0.isin"
    path: String,
}

impl FieldPath {
    /// Create a new path from a dot-separated string.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Create an empty path (the form root).
    pub fn root() -> Self {
        Self {
            path: String::new(),
        }
    }

    /// Append a child segment to this path, returning a new path.
    pub fn child(&self, name: &str) -> Self {
        if name.is_empty() {
            self.clone()
        } else if self.path.is_empty() {
            Self::new(name)
        } else {
            Self::new(format!("{}.{}", self.path, name))
        }
    }

    /// Append a repeater item index to this path.
    pub fn item(&self, index: usize) -> Self {
        self.child(&index.to_string())
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Check if the path is empty.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Get the segments of this path as an iterator.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.').filter(|s| !s.is_empty())
    }

    /// Number of segments; zero for the root.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The name of the top-level field this path points into.
    pub fn field(&self) -> Option<&str> {
        self.segments().next()
    }

    /// The last segment, i.e. the leaf field name.
    pub fn leaf(&self) -> Option<&str> {
        self.path.rsplit('.').next().filter(|s| !s.is_empty())
    }

    /// Returns the path with the given prefix removed, if it matches whole segments.
    pub fn strip_prefix(&self, prefix: &FieldPath) -> Option<Self> {
        let prefix = prefix.as_str();
        if prefix.is_empty() {
            Some(self.clone())
        } else if self.path == prefix {
            Some(Self::root())
        } else if self.path.starts_with(prefix) && self.path[prefix.len()..].starts_with('.') {
            Some(Self::new(&self.path[prefix.len() + 1..]))
        } else {
            None
        }
    }

    /// A DOM-friendly identifier derived from the path (`holdings-0-isin`).
    pub fn to_id(&self) -> String {
        self.path.replace('.', "-")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
