/// Coarse kind of a raw filesystem notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A name appeared or disappeared: create, delete, move in or out.
    Rename,
    /// Contents or metadata changed in place (a write still in progress).
    Modify,
    Other,
}

/// One raw change in the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// File name relative to the watched directory.
    pub filename: String,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, filename: impl Into<String>) -> Self {
        Self {
            kind,
            filename: filename.into(),
        }
    }

    pub fn rename(filename: impl Into<String>) -> Self {
        Self::new(ChangeKind::Rename, filename)
    }

    pub fn modify(filename: impl Into<String>) -> Self {
        Self::new(ChangeKind::Modify, filename)
    }
}
