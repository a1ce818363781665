use serde::{Deserialize, Serialize};

/// A reference to a specific commitment accumulator state (a Merkle root).
///
/// The accumulator is append-only: a commitment that is a member under one
/// anchor stays a member under every later anchor. Deciding which anchors
/// are recent enough to accept is the consensus layer's concern.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct Anchor([u8; 32]);

impl From<[u8; 32]> for Anchor {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Anchor> for [u8; 32] {
    fn from(an: Anchor) -> Self {
        an.0
    }
}

impl Anchor {
    /// The root digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}
