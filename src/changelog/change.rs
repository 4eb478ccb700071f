/// Tag marking a breaking change
pub const BREAKING_TAG: &str = "!!!";

/// Tag marking a security fix
pub const SECURITY_TAG: &str = "SECURITY";

/// Classification of a changelog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Breaking,
    Security,
    Regular,
}

impl ChangeKind {
    /// Maps a changelog tag to its kind. Unknown tags are regular changes.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            BREAKING_TAG => ChangeKind::Breaking,
            SECURITY_TAG => ChangeKind::Security,
            _ => ChangeKind::Regular,
        }
    }
}

/// A single classified changelog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Breaking { title: String },
    Security { title: String },
    Regular { title: String },
}

impl Change {
    pub fn new(kind: ChangeKind, title: String) -> Self {
        match kind {
            ChangeKind::Breaking => Change::Breaking { title },
            ChangeKind::Security => Change::Security { title },
            ChangeKind::Regular => Change::Regular { title },
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Breaking { .. } => ChangeKind::Breaking,
            Change::Security { .. } => ChangeKind::Security,
            Change::Regular { .. } => ChangeKind::Regular,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Change::Breaking { title } | Change::Security { title } | Change::Regular { title } => {
                title
            }
        }
    }
}
