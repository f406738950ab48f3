//! Code Assembly Engine — renders fragment metadata and snippet bodies into
//! one self-contained worker source text.
//!
//! Assembly is pure and deterministic: the same target and fragments always
//! yield byte-identical output, so restarting an unchanged target never
//! spuriously rebuilds.

pub mod engine;
pub mod header;
pub mod signature;
pub mod skeleton;

pub use engine::{assemble, assemble_target, FragmentsByKind};
pub use header::substitute_params;
pub use signature::render_signature;
pub use skeleton::{render_skeleton, SkeletonSpec};
