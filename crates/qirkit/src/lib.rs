/*! Build, rewrite, print and evaluate quantum programs in an LLVM-shaped IR.
 *
 * Single import for the whole toolkit: the core builder and pass framework, the text printer and
 * parser, and the non-adaptive evaluator, plus [`SimpleModule`] for the common one-entry-point
 * case.
 */

pub mod backend;
pub mod simple;

pub use qirkit_core as core;
pub use qirkit_emit as emit;
pub use qirkit_eval as eval;
pub use qirkit_parser as parser;

pub use qirkit_core::{
    run_pass, Builder, Constant, EntryPointBuilder, IrBackend, IrError, Module, ModuleVisitor,
    QisBuilderExt, Signature, StructuralVerifier, Type, Value, Verifier,
};
pub use qirkit_emit::{print_module, EmitterConfig, QirEmitter};
pub use qirkit_eval::{Evaluator, EvaluatorConfig, GateLogger, GateSet};
pub use qirkit_parser::parse_module;

pub use backend::{BackendError, TextBackend};
pub use simple::SimpleModule;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Print `module` and write it to `path`.
pub fn write_ir(module: &Module, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = TextBackend::default().print(module)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Parse and verify the module stored at `path`.
///
/// Text without a `; ModuleID` line yields a module named after the file stem.
pub fn read_ir(path: impl AsRef<Path>) -> Result<Module> {
    let path = path.as_ref();
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    TextBackend::default()
        .parse_text(&text, &name)
        .with_context(|| format!("failed to load {}", path.display()))
}
