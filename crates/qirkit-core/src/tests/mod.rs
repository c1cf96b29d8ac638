/*! Test coverage for building and rewriting modules.
 *
 * Conditional lowering and in-place passes both restructure the block graph while it is being
 * built or walked. These tests pin down the resulting graph shape, cursor placement and traversal
 * order for each combination of arms, nesting and mutation.
 */

mod call_tests;

use crate::{
    attributes::EntryPointBuilder,
    ids::{BlockId, FuncId},
    module::Module,
};

/// Module with a `main` entry point and an empty `entry` block.
pub(crate) fn entry_module(qubits: u64, results: u64) -> (Module, FuncId, BlockId) {
    let mut module = Module::new("test");
    let main = EntryPointBuilder::new("main")
        .qubits(qubits)
        .results(results)
        .build(&mut module)
        .unwrap();
    let entry = module.append_block(main, "entry");
    (module, main, entry)
}

pub(crate) fn block_names(module: &Module, func: FuncId) -> Vec<String> {
    module
        .function(func)
        .blocks()
        .iter()
        .map(|block| module.block(*block).name().to_string())
        .collect()
}
