mod error;
mod load;
mod parse;
mod tree;

pub use error::MalformedHierarchyError;
pub use load::load_taxonomy;
#[cfg(test)]
pub use parse::RawNode;
pub use tree::{CodeNode, LoadOptions, NodeId, Taxonomy};
#[cfg(test)]
pub(crate) use tree::{normalize, tests::sample_taxonomy};
