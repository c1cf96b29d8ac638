/*! Whole-module visitor for analyzing and rewriting QIR in place.
 *
 * A pass implements [`ModuleVisitor`] and overrides the hooks it cares about. The default methods
 * forward to the `walk_*` functions, which traverse functions, blocks and instructions in a fixed
 * order and dispatch recognized intrinsic calls to typed `on_*` hooks. Hooks receive the pass's
 * [`Builder`], so they can insert before the visited call, erase it, or detach and re-insert it.
 *
 * Traversal order is decided before any hook runs: functions are visited as declarations, then
 * non-entry definitions, then entry points; blocks are visited entry first, then breadth-first
 * through branch targets. Each block's instruction list is snapshotted before it is visited, and
 * snapshotted instructions that a hook erased or detached are skipped.
 */

use crate::{
    attributes::is_entry_point,
    builder::Builder,
    ids::{BlockId, FuncId, InstId},
    instructions::InstKind,
    module::Module,
    qis::Intrinsic,
    values::Value,
    verify::{StructuralVerifier, Verifier},
    IrError, Result,
};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, trace};

/// How a call is routed to the visitor's hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Intrinsic(Intrinsic),
    Unrecognized,
}

impl Operation {
    /// Classify a call by callee name. A known name called with the wrong arity is unrecognized.
    pub fn classify(callee: &str, arity: usize) -> Self {
        match Intrinsic::from_name(callee) {
            Some(intrinsic) if intrinsic.signature().params.len() == arity => {
                Operation::Intrinsic(intrinsic)
            }
            _ => Operation::Unrecognized,
        }
    }
}

/// Run `visitor` over `module`, verifying structurally before and after.
pub fn run_pass<V: ModuleVisitor + ?Sized>(visitor: &mut V, module: &mut Module) -> Result<()> {
    run_pass_with(visitor, module, &StructuralVerifier)
}

pub fn run_pass_with<V: ModuleVisitor + ?Sized>(
    visitor: &mut V,
    module: &mut Module,
    verifier: &dyn Verifier,
) -> Result<()> {
    if let Some(message) = verifier.verify(module) {
        return Err(IrError::Verification(message));
    }
    {
        let mut builder = Builder::new(module);
        visitor.visit_module(&mut builder)?;
    }
    if let Some(message) = verifier.verify(module) {
        return Err(IrError::Verification(message));
    }
    Ok(())
}

#[allow(unused_variables)]
pub trait ModuleVisitor {
    fn visit_module(&mut self, builder: &mut Builder<'_>) -> Result<()> {
        walk_module(self, builder)
    }

    fn visit_function(&mut self, builder: &mut Builder<'_>, func: FuncId) -> Result<()> {
        walk_function(self, builder, func)
    }

    fn visit_block(&mut self, builder: &mut Builder<'_>, block: BlockId) -> Result<()> {
        walk_block(self, builder, block)
    }

    fn visit_instruction(&mut self, builder: &mut Builder<'_>, inst: InstId) -> Result<()> {
        walk_instruction(self, builder, inst)
    }

    fn visit_call(&mut self, builder: &mut Builder<'_>, call: InstId) -> Result<()> {
        walk_call(self, builder, call)
    }

    fn on_unrecognized_call(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        callee: FuncId,
        args: &[Value],
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_barrier(&mut self, builder: &mut Builder<'_>, call: InstId) -> Result<()> {
        Ok(())
    }

    fn on_qis_ccx(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        control1: &Value,
        control2: &Value,
        target: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_cx(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        control: &Value,
        target: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_cy(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        control: &Value,
        target: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_cz(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        control: &Value,
        target: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_swap(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        qubit1: &Value,
        qubit2: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_rx(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        theta: &Value,
        qubit: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_rxx(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        theta: &Value,
        qubit1: &Value,
        qubit2: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_ry(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        theta: &Value,
        qubit: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_ryy(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        theta: &Value,
        qubit1: &Value,
        qubit2: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_rz(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        theta: &Value,
        qubit: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_rzz(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        theta: &Value,
        qubit1: &Value,
        qubit2: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_h(&mut self, builder: &mut Builder<'_>, call: InstId, qubit: &Value) -> Result<()> {
        Ok(())
    }

    fn on_qis_s(&mut self, builder: &mut Builder<'_>, call: InstId, qubit: &Value) -> Result<()> {
        Ok(())
    }

    fn on_qis_s_adj(&mut self, builder: &mut Builder<'_>, call: InstId, qubit: &Value) -> Result<()> {
        Ok(())
    }

    fn on_qis_t(&mut self, builder: &mut Builder<'_>, call: InstId, qubit: &Value) -> Result<()> {
        Ok(())
    }

    fn on_qis_t_adj(&mut self, builder: &mut Builder<'_>, call: InstId, qubit: &Value) -> Result<()> {
        Ok(())
    }

    fn on_qis_x(&mut self, builder: &mut Builder<'_>, call: InstId, qubit: &Value) -> Result<()> {
        Ok(())
    }

    fn on_qis_y(&mut self, builder: &mut Builder<'_>, call: InstId, qubit: &Value) -> Result<()> {
        Ok(())
    }

    fn on_qis_z(&mut self, builder: &mut Builder<'_>, call: InstId, qubit: &Value) -> Result<()> {
        Ok(())
    }

    fn on_qis_m(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        qubit: &Value,
        result: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_mz(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        qubit: &Value,
        result: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_mresetz(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        qubit: &Value,
        result: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_qis_reset(&mut self, builder: &mut Builder<'_>, call: InstId, qubit: &Value) -> Result<()> {
        Ok(())
    }

    fn on_qis_read_result(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        result: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_rt_result_record_output(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        result: &Value,
        label: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_rt_bool_record_output(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        value: &Value,
        label: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_rt_int_record_output(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        value: &Value,
        label: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_rt_double_record_output(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        value: &Value,
        label: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_rt_tuple_record_output(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        num_elements: &Value,
        label: &Value,
    ) -> Result<()> {
        Ok(())
    }

    fn on_rt_array_record_output(
        &mut self,
        builder: &mut Builder<'_>,
        call: InstId,
        num_elements: &Value,
        label: &Value,
    ) -> Result<()> {
        Ok(())
    }
}

pub fn walk_module<V: ModuleVisitor + ?Sized>(visitor: &mut V, builder: &mut Builder<'_>) -> Result<()> {
    let module = builder.module();
    let (declarations, definitions): (Vec<FuncId>, Vec<FuncId>) = module
        .functions()
        .filter(|func| !is_entry_point(module, *func))
        .partition(|func| module.function(*func).is_declaration());
    let entry_points: Vec<FuncId> = module
        .functions()
        .filter(|func| is_entry_point(module, *func))
        .collect();

    for func in declarations
        .into_iter()
        .chain(definitions)
        .chain(entry_points)
    {
        debug!(function = %builder.module().function(func).name(), "visiting function");
        visitor.visit_function(builder, func)?;
    }
    Ok(())
}

/// Entry block first, then breadth-first through branch targets, each block once.
///
/// For `br i1 %c, label %then, label %else` the `then` block is enqueued before `else`. Blocks
/// unreachable from the entry block are not visited.
pub fn block_order(module: &Module, func: FuncId) -> Vec<BlockId> {
    let Some(entry) = module.function(func).entry_block() else {
        return Vec::new();
    };
    let mut order = Vec::new();
    let mut seen = HashSet::from([entry]);
    let mut queue = VecDeque::from([entry]);
    while let Some(block) = queue.pop_front() {
        order.push(block);
        for successor in module.successors(block) {
            if seen.insert(successor) {
                queue.push_back(successor);
            }
        }
    }
    order
}

pub fn walk_function<V: ModuleVisitor + ?Sized>(
    visitor: &mut V,
    builder: &mut Builder<'_>,
    func: FuncId,
) -> Result<()> {
    for block in block_order(builder.module(), func) {
        visitor.visit_block(builder, block)?;
    }
    Ok(())
}

pub fn walk_block<V: ModuleVisitor + ?Sized>(
    visitor: &mut V,
    builder: &mut Builder<'_>,
    block: BlockId,
) -> Result<()> {
    trace!(block = %builder.module().block(block).name(), "visiting block");
    let snapshot = builder.module().block(block).insts().to_vec();
    for inst in snapshot {
        if builder.module().is_attached(inst) {
            visitor.visit_instruction(builder, inst)?;
        }
    }
    Ok(())
}

pub fn walk_instruction<V: ModuleVisitor + ?Sized>(
    visitor: &mut V,
    builder: &mut Builder<'_>,
    inst: InstId,
) -> Result<()> {
    if matches!(builder.module().inst(inst)?.kind(), InstKind::Call { .. }) {
        visitor.visit_call(builder, inst)?;
    }
    Ok(())
}

pub fn walk_call<V: ModuleVisitor + ?Sized>(
    visitor: &mut V,
    builder: &mut Builder<'_>,
    call: InstId,
) -> Result<()> {
    let (callee, args) = match builder.module().inst(call)?.kind() {
        InstKind::Call { callee, args } => (*callee, args.clone()),
        _ => return Ok(()),
    };
    let name = builder.module().function(callee).name();
    let intrinsic = match Operation::classify(name, args.len()) {
        Operation::Intrinsic(intrinsic) => intrinsic,
        Operation::Unrecognized => {
            return visitor.on_unrecognized_call(builder, call, callee, &args);
        }
    };

    let b = builder;
    match (intrinsic, args.as_slice()) {
        (Intrinsic::Barrier, []) => visitor.on_qis_barrier(b, call),
        (Intrinsic::Ccx, [c1, c2, t]) => visitor.on_qis_ccx(b, call, c1, c2, t),
        (Intrinsic::Cx, [c, t]) => visitor.on_qis_cx(b, call, c, t),
        (Intrinsic::Cy, [c, t]) => visitor.on_qis_cy(b, call, c, t),
        (Intrinsic::Cz, [c, t]) => visitor.on_qis_cz(b, call, c, t),
        (Intrinsic::Swap, [q1, q2]) => visitor.on_qis_swap(b, call, q1, q2),
        (Intrinsic::Rx, [theta, q]) => visitor.on_qis_rx(b, call, theta, q),
        (Intrinsic::Rxx, [theta, q1, q2]) => visitor.on_qis_rxx(b, call, theta, q1, q2),
        (Intrinsic::Ry, [theta, q]) => visitor.on_qis_ry(b, call, theta, q),
        (Intrinsic::Ryy, [theta, q1, q2]) => visitor.on_qis_ryy(b, call, theta, q1, q2),
        (Intrinsic::Rz, [theta, q]) => visitor.on_qis_rz(b, call, theta, q),
        (Intrinsic::Rzz, [theta, q1, q2]) => visitor.on_qis_rzz(b, call, theta, q1, q2),
        (Intrinsic::H, [q]) => visitor.on_qis_h(b, call, q),
        (Intrinsic::S, [q]) => visitor.on_qis_s(b, call, q),
        (Intrinsic::SAdj, [q]) => visitor.on_qis_s_adj(b, call, q),
        (Intrinsic::T, [q]) => visitor.on_qis_t(b, call, q),
        (Intrinsic::TAdj, [q]) => visitor.on_qis_t_adj(b, call, q),
        (Intrinsic::X, [q]) => visitor.on_qis_x(b, call, q),
        (Intrinsic::Y, [q]) => visitor.on_qis_y(b, call, q),
        (Intrinsic::Z, [q]) => visitor.on_qis_z(b, call, q),
        (Intrinsic::M, [q, r]) => visitor.on_qis_m(b, call, q, r),
        (Intrinsic::Mz, [q, r]) => visitor.on_qis_mz(b, call, q, r),
        (Intrinsic::MResetZ, [q, r]) => visitor.on_qis_mresetz(b, call, q, r),
        (Intrinsic::Reset, [q]) => visitor.on_qis_reset(b, call, q),
        (Intrinsic::ReadResult, [r]) => visitor.on_qis_read_result(b, call, r),
        (Intrinsic::ResultRecordOutput, [r, label]) => {
            visitor.on_rt_result_record_output(b, call, r, label)
        }
        (Intrinsic::BoolRecordOutput, [v, label]) => {
            visitor.on_rt_bool_record_output(b, call, v, label)
        }
        (Intrinsic::IntRecordOutput, [v, label]) => visitor.on_rt_int_record_output(b, call, v, label),
        (Intrinsic::DoubleRecordOutput, [v, label]) => {
            visitor.on_rt_double_record_output(b, call, v, label)
        }
        (Intrinsic::TupleRecordOutput, [n, label]) => {
            visitor.on_rt_tuple_record_output(b, call, n, label)
        }
        (Intrinsic::ArrayRecordOutput, [n, label]) => {
            visitor.on_rt_array_record_output(b, call, n, label)
        }
        _ => visitor.on_unrecognized_call(b, call, callee, &args),
    }
}
