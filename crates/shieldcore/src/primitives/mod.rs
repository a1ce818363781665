mod anchor;
pub(crate) mod codec;

pub use anchor::Anchor;
