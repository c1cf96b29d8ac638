/*! Non-adaptive evaluation of quantum modules.
 *
 * The evaluator walks an entry point instruction by instruction and hands every quantum operation
 * to a [`GateSet`]. Nothing is simulated: measurement outcomes come from a caller-supplied stream,
 * which is enough to drive classical control flow that branches on results.
 */

pub mod config;
pub mod evaluator;
pub mod gates;

pub use config::EvaluatorConfig;
pub use evaluator::Evaluator;
pub use gates::{GateLogger, GateSet, Metadata};

use qirkit_core::IrError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("No matching entry point found.")]
    NoEntryPoint,
    #[error("Multiple matching entry points found.")]
    MultipleEntryPoints,
    #[error("Entry point has parameters or a non-void return type.")]
    EntryPointSignature,
    #[error("Unsupported functions {}.", quote_names(.0))]
    UnsupportedFunctions(Vec<String>),
    #[error("Reached unreachable code in `{0}`")]
    Unreachable(String),
    #[error("Step limit of {0} exceeded")]
    StepLimit(u64),
    #[error("Call depth limit of {0} exceeded")]
    CallDepth(usize),
    #[error("Invalid operand: {0}")]
    InvalidOperand(String),
    #[error(transparent)]
    Ir(#[from] IrError),
}

fn quote_names(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("`{}`", name))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type EvalResult<T> = std::result::Result<T, EvalError>;
