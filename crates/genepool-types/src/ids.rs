use serde::{Deserialize, Serialize};

/// Strong typed identifiers used throughout Genepool.
///
/// Gene, capsule, and event ids are content hashes and stay plain strings
/// inside their owning structs; the newtypes here cover identities that are
/// generated or assigned rather than derived from content.

/// Identifier of one admission attempt. Generated, not content-addressed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GateId(pub String);

impl GateId {
    /// Generate a fresh gate id.
    pub fn generate() -> Self {
        Self(format!("gate_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl std::fmt::Display for GateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GateId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a contributing node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
