//! Storage backends for fragments, build targets, and the per-user package
//! registry. The `FragmentStore` trait lives in `capforge-core`; this crate
//! supplies the in-memory implementation.

pub mod memory;
pub mod registry;

pub use memory::{FragmentPatch, InMemoryStore, NewFragment, NewTarget, TargetPatch};
pub use registry::PackageRegistry;
