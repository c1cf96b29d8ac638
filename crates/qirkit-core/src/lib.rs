/*! Core IR types and builders for quantum programs.
 *
 * Quantum programs lowered to an LLVM-shaped IR are mostly calls into `__quantum__qis__*` and
 * `__quantum__rt__*` intrinsics stitched together by branches on measurement results. This crate
 * holds the module arena, the cursor-based builder that appends into it, structured conditional
 * lowering, and a visitor framework for rewriting modules in place.
 */

pub mod attributes;
pub mod backend;
pub mod builder;
pub mod coerce;
pub mod ids;
pub mod instructions;
pub mod module;
pub mod pass;
pub mod persist;
pub mod qis;
pub mod types;
pub mod values;
pub mod verify;

pub use attributes::{is_entry_point, EntryPointBuilder};
pub use backend::IrBackend;
pub use builder::{Builder, IfBuilder, InsertPoint};
pub use ids::{BlockId, FuncId, GlobalId, InstId};
pub use instructions::{BinaryOp, CastOp, InstData, InstKind, IntPredicate};
pub use module::{BlockData, FunctionData, Module};
pub use pass::{run_pass, run_pass_with, ModuleVisitor, Operation};
pub use qis::{Intrinsic, QisBuilderExt};
pub use types::{Signature, Type, MAX_INT_WIDTH};
pub use values::{Arg, Constant, Literal, Payload, Value};
pub use verify::{StructuralVerifier, Verifier};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    #[error("Value is out of range: {0}")]
    Overflow(String),
    #[error("Expected {expected} arguments, got {got}.")]
    Arity { expected: usize, got: usize },
    #[error("No insertion point set")]
    NoInsertionPoint,
    #[error("Ownership error: {0}")]
    Ownership(String),
    #[error("Verification failed: {0}")]
    Verification(String),
    #[error("Dangling value: {0}")]
    DanglingValue(String),
    #[error("Invalid type: {0}")]
    InvalidType(String),
    #[error("Builder error: {0}")]
    Builder(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
