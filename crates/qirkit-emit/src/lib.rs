/*! Print modules as LLVM assembly.
 *
 * The text form is what gets diffed in tests, checked into fixtures and handed to LLVM tooling,
 * so the printer follows LLVM's own layout: header, opaque struct types, functions in module
 * order, then attribute groups.
 */

pub mod config;
pub mod emitter;
pub mod formatter;
pub mod qir_emitter;

pub use config::{EmitterConfig, IndentStyle, VerbosityLevel};
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emitter, Tint};
pub use formatter::{QirFormatter, SlotTracker};
pub use qir_emitter::{print_module, QirEmitter};
