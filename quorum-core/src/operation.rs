//! Operation identifiers and kinds.

use std::fmt;

/// The kind of a service operation.
///
/// Commands mutate replicated state and must go through the server's
/// consensus path; queries are read-only and may use a relaxed read path.
/// Mislabeling an operation is a correctness bug, not a performance issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum OperationKind {
    /// A state-mutating operation.
    Command = 0,
    /// A read-only operation.
    Query = 1,
}

impl OperationKind {
    /// Creates an `OperationKind` from its wire value.
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Command),
            1 => Some(Self::Query),
            _ => None,
        }
    }

    /// Returns the numeric wire value.
    pub fn value(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => write!(f, "COMMAND"),
            Self::Query => write!(f, "QUERY"),
        }
    }
}

/// Identifies one operation of a primitive type.
///
/// The kind is stored as its raw wire value, open-enum style: peers built
/// against a newer protocol revision may present kinds this client does not
/// know. [`OperationId::kind`] returns `None` for those, and the service
/// client rejects them with `UnsupportedOperation` before touching the
/// transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationId {
    id: String,
    kind: i32,
}

impl OperationId {
    /// Creates a command operation id.
    pub fn command(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: OperationKind::Command.value(),
        }
    }

    /// Creates a query operation id.
    pub fn query(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: OperationKind::Query.value(),
        }
    }

    /// Creates an operation id from a raw kind value.
    pub fn from_raw(id: impl Into<String>, kind: i32) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Returns the operation name.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the operation kind, or `None` if the raw value is unknown.
    pub fn kind(&self) -> Option<OperationKind> {
        OperationKind::from_value(self.kind)
    }

    /// Returns the raw kind value.
    pub fn raw_kind(&self) -> i32 {
        self.kind
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "{}[{}]", self.id, kind),
            None => write!(f, "{}[kind={}]", self.id, self.kind),
        }
    }
}
