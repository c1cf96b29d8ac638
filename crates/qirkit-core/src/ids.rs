//! Entity references into the [`Module`](crate::Module) arena.
//!
//! Functions, blocks and globals are never deleted, so they are plain `u32` indices into `PrimaryMap`
//! storage. Instructions can be erased, so they use generational slotmap keys: a stale `InstId`
//! is detected instead of silently aliasing a newer instruction.

use cranelift_entity::entity_impl;
use serde::{Deserialize, Serialize};

/// Reference to a function declaration or definition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FuncId(u32);
entity_impl!(FuncId, "fn");

/// Reference to a basic block.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(u32);
entity_impl!(BlockId, "block");

/// Reference to a module-level byte-string constant such as an output label.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalId(u32);
entity_impl!(GlobalId, "global");

slotmap::new_key_type! {
    /// Reference to an instruction. Becomes dangling once the instruction is erased.
    pub struct InstId;
}
