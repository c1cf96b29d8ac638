use crate::{
    config::EvaluatorConfig,
    gates::{GateSet, Metadata},
    EvalError, EvalResult,
};
use qirkit_core::{
    attributes, coerce, BinaryOp, CastOp, FuncId, GlobalId, InstData, InstId, InstKind,
    IntPredicate, Intrinsic, IrError, Module, Payload, StructuralVerifier, Type, Value, Verifier,
};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
enum RuntimeValue {
    Int { width: u32, bits: u128 },
    Float(f64),
    Pointer(u64),
    /// Output label; only record-output calls accept it.
    Label(GlobalId),
}

impl RuntimeValue {
    /// Two's complement reading of `bits`; widths outside `1..=128` are clamped into range.
    fn signed(width: u32, bits: u128) -> i128 {
        let shift = 128 - width.clamp(1, 128);
        ((bits << shift) as i128) >> shift
    }
}

struct Frame {
    args: Vec<RuntimeValue>,
    values: HashMap<InstId, RuntimeValue>,
}

/// Mutable state of one run.
struct Machine<'a> {
    module: &'a Module,
    config: &'a EvaluatorConfig,
    gates: &'a mut dyn GateSet,
    outcomes: VecDeque<bool>,
    results: HashMap<u64, bool>,
    max_qubit: Option<u64>,
    steps: u64,
    depth: usize,
}

pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Run the selected entry point, reporting quantum operations to `gates`.
    ///
    /// Each measurement takes the next value of `outcomes`; once the stream is exhausted every
    /// further measurement reads `false`, as does a result that was never measured.
    pub fn run(&self, module: &Module, gates: &mut dyn GateSet, outcomes: &[bool]) -> EvalResult<()> {
        if let Some(message) = StructuralVerifier.verify(module) {
            return Err(IrError::Verification(message).into());
        }
        let entry = self.choose_entry_point(module)?;
        let signature = module.function(entry).signature();
        if !signature.params.is_empty() || !signature.ret.is_void() {
            return Err(EvalError::EntryPointSignature);
        }
        check_supported(module)?;

        debug!(
            "evaluating `{}` with {} outcome(s)",
            module.function(entry).name(),
            outcomes.len()
        );
        let mut machine = Machine {
            module,
            config: &self.config,
            gates,
            outcomes: outcomes.iter().copied().collect(),
            results: HashMap::new(),
            max_qubit: None,
            steps: 0,
            depth: 0,
        };
        machine.call(entry, Vec::new())?;

        let metadata = Metadata {
            number_of_qubits: machine.max_qubit.map_or(0, |id| id as usize + 1),
        };
        machine.gates.finish(&metadata);
        Ok(())
    }

    fn choose_entry_point(&self, module: &Module) -> EvalResult<FuncId> {
        let name = self.config.entry_point.as_deref();
        let mut matching = attributes::entry_points(module)
            .into_iter()
            .filter(|func| name.map_or(true, |name| module.function(*func).name() == name));
        let entry = matching.next().ok_or(EvalError::NoEntryPoint)?;
        if matching.next().is_some() {
            return Err(EvalError::MultipleEntryPoints);
        }
        Ok(entry)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvaluatorConfig::default())
    }
}

/// Declarations the evaluator has no implementation for, in module order.
fn check_supported(module: &Module) -> EvalResult<()> {
    let unsupported: Vec<String> = module
        .functions()
        .map(|func| module.function(func))
        .filter(|data| data.is_declaration() && Intrinsic::from_name(data.name()).is_none())
        .map(|data| data.name().to_string())
        .collect();
    if unsupported.is_empty() {
        Ok(())
    } else {
        Err(EvalError::UnsupportedFunctions(unsupported))
    }
}

impl Machine<'_> {
    fn call(&mut self, func: FuncId, args: Vec<RuntimeValue>) -> EvalResult<Option<RuntimeValue>> {
        if self.depth >= self.config.max_call_depth {
            return Err(EvalError::CallDepth(self.config.max_call_depth));
        }
        self.depth += 1;
        let result = self.execute(func, args);
        self.depth -= 1;
        result
    }

    fn execute(&mut self, func: FuncId, args: Vec<RuntimeValue>) -> EvalResult<Option<RuntimeValue>> {
        let module = self.module;
        let data = module.function(func);
        let mut block = data.entry_block().ok_or_else(|| {
            EvalError::InvalidOperand(format!("`{}` has no body", data.name()))
        })?;
        let mut frame = Frame {
            args,
            values: HashMap::new(),
        };

        loop {
            trace!("entering block `{}`", module.block(block).name());
            let mut next = None;
            for inst in module.block(block).insts() {
                self.steps += 1;
                if self.steps > self.config.max_steps {
                    return Err(EvalError::StepLimit(self.config.max_steps));
                }
                let inst_data = module.inst(*inst)?;
                match inst_data.kind() {
                    InstKind::Br { dest } => {
                        next = Some(*dest);
                        break;
                    }
                    InstKind::CondBr {
                        cond,
                        if_true,
                        if_false,
                    } => {
                        next = Some(if self.truth(&frame, cond)? {
                            *if_true
                        } else {
                            *if_false
                        });
                        break;
                    }
                    InstKind::Ret { value } => {
                        return value
                            .as_ref()
                            .map(|value| self.operand(&frame, value))
                            .transpose();
                    }
                    InstKind::Unreachable => {
                        return Err(EvalError::Unreachable(data.name().to_string()));
                    }
                    _ => {
                        if let Some(value) = self.compute(&frame, inst_data)? {
                            frame.values.insert(*inst, value);
                        }
                    }
                }
            }
            block = next.ok_or_else(|| {
                EvalError::InvalidOperand(format!(
                    "block `{}` fell through without a terminator",
                    module.block(block).name()
                ))
            })?;
        }
    }

    fn compute(&mut self, frame: &Frame, inst: &InstData) -> EvalResult<Option<RuntimeValue>> {
        match inst.kind() {
            InstKind::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.operand(frame, arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                let data = self.module.function(*callee);
                if !data.is_declaration() {
                    return self.call(*callee, args);
                }
                let intrinsic = Intrinsic::from_name(data.name())
                    .ok_or_else(|| EvalError::UnsupportedFunctions(vec![data.name().to_string()]))?;
                self.intrinsic(intrinsic, &args)
            }
            InstKind::Binary { op, lhs, rhs } => {
                let (width, a) = int(self.operand(frame, lhs)?)?;
                let (_, b) = int(self.operand(frame, rhs)?)?;
                let bits = match op {
                    BinaryOp::And => a & b,
                    BinaryOp::Or => a | b,
                    BinaryOp::Xor => a ^ b,
                    BinaryOp::Add => a.wrapping_add(b),
                    BinaryOp::Sub => a.wrapping_sub(b),
                    BinaryOp::Mul => a.wrapping_mul(b),
                    BinaryOp::Shl if b < width as u128 => a << b,
                    BinaryOp::LShr if b < width as u128 => a >> b,
                    BinaryOp::Shl | BinaryOp::LShr => 0,
                };
                Ok(Some(RuntimeValue::Int {
                    width,
                    bits: bits & coerce::mask(width),
                }))
            }
            InstKind::ICmp { pred, lhs, rhs } => {
                let (width, a) = int(self.operand(frame, lhs)?)?;
                let (_, b) = int(self.operand(frame, rhs)?)?;
                let (sa, sb) = (
                    RuntimeValue::signed(width, a),
                    RuntimeValue::signed(width, b),
                );
                let holds = match pred {
                    IntPredicate::Eq => a == b,
                    IntPredicate::Ne => a != b,
                    IntPredicate::Ugt => a > b,
                    IntPredicate::Uge => a >= b,
                    IntPredicate::Ult => a < b,
                    IntPredicate::Ule => a <= b,
                    IntPredicate::Sgt => sa > sb,
                    IntPredicate::Sge => sa >= sb,
                    IntPredicate::Slt => sa < sb,
                    IntPredicate::Sle => sa <= sb,
                };
                Ok(Some(RuntimeValue::Int {
                    width: 1,
                    bits: holds as u128,
                }))
            }
            InstKind::Cast { op, value } => {
                let (_, bits) = int(self.operand(frame, value)?)?;
                let target = inst.ty();
                let width = target.int_width().ok_or_else(|| {
                    EvalError::InvalidOperand(format!("cannot {} to {}", op.mnemonic(), target))
                })?;
                let bits = match op {
                    CastOp::Trunc => bits & coerce::mask(width),
                    CastOp::ZExt => bits,
                };
                Ok(Some(RuntimeValue::Int { width, bits }))
            }
            InstKind::Br { .. }
            | InstKind::CondBr { .. }
            | InstKind::Ret { .. }
            | InstKind::Unreachable => Ok(None),
        }
    }

    fn intrinsic(
        &mut self,
        intrinsic: Intrinsic,
        args: &[RuntimeValue],
    ) -> EvalResult<Option<RuntimeValue>> {
        debug!("dispatching {}", intrinsic.name());
        self.track_qubits(intrinsic, args);
        match intrinsic {
            Intrinsic::Cx => self.gates.cx(pointer(args, 0)?, pointer(args, 1)?),
            Intrinsic::Cy => self.gates.cy(pointer(args, 0)?, pointer(args, 1)?),
            Intrinsic::Cz => self.gates.cz(pointer(args, 0)?, pointer(args, 1)?),
            Intrinsic::Swap => self.gates.swap(pointer(args, 0)?, pointer(args, 1)?),
            Intrinsic::Ccx => {
                let (a, b, c) = (
                    pointer(args, 0)?,
                    pointer(args, 1)?,
                    pointer(args, 2)?,
                );
                self.gates.ccx(a, b, c)
            }
            Intrinsic::H => self.gates.h(pointer(args, 0)?),
            Intrinsic::S => self.gates.s(pointer(args, 0)?),
            Intrinsic::SAdj => self.gates.s_adj(pointer(args, 0)?),
            Intrinsic::T => self.gates.t(pointer(args, 0)?),
            Intrinsic::TAdj => self.gates.t_adj(pointer(args, 0)?),
            Intrinsic::X => self.gates.x(pointer(args, 0)?),
            Intrinsic::Y => self.gates.y(pointer(args, 0)?),
            Intrinsic::Z => self.gates.z(pointer(args, 0)?),
            Intrinsic::Reset => self.gates.reset(pointer(args, 0)?),
            Intrinsic::Rx => self.gates.rx(angle(args)?, pointer(args, 1)?),
            Intrinsic::Ry => self.gates.ry(angle(args)?, pointer(args, 1)?),
            Intrinsic::Rz => self.gates.rz(angle(args)?, pointer(args, 1)?),
            Intrinsic::Rxx => {
                let (theta, a, b) = (angle(args)?, pointer(args, 1)?, pointer(args, 2)?);
                self.gates.rxx(theta, a, b)
            }
            Intrinsic::Ryy => {
                let (theta, a, b) = (angle(args)?, pointer(args, 1)?, pointer(args, 2)?);
                self.gates.ryy(theta, a, b)
            }
            Intrinsic::Rzz => {
                let (theta, a, b) = (angle(args)?, pointer(args, 1)?, pointer(args, 2)?);
                self.gates.rzz(theta, a, b)
            }
            Intrinsic::M | Intrinsic::Mz | Intrinsic::MResetZ => {
                let (qubit, result) = (pointer(args, 0)?, pointer(args, 1)?);
                let outcome = self.outcomes.pop_front().unwrap_or(false);
                trace!("result {} <- {}", result, outcome);
                self.results.insert(result, outcome);
                match intrinsic {
                    Intrinsic::M => self.gates.m(qubit, result),
                    Intrinsic::Mz => self.gates.mz(qubit, result),
                    _ => self.gates.mresetz(qubit, result),
                }
            }
            Intrinsic::ReadResult => {
                let result = pointer(args, 0)?;
                let outcome = self.results.get(&result).copied().unwrap_or(false);
                return Ok(Some(RuntimeValue::Int {
                    width: 1,
                    bits: outcome as u128,
                }));
            }
            Intrinsic::Barrier
            | Intrinsic::ResultRecordOutput
            | Intrinsic::BoolRecordOutput
            | Intrinsic::IntRecordOutput
            | Intrinsic::DoubleRecordOutput
            | Intrinsic::TupleRecordOutput
            | Intrinsic::ArrayRecordOutput => {}
        }
        Ok(None)
    }

    fn track_qubits(&mut self, intrinsic: Intrinsic, args: &[RuntimeValue]) {
        for (ty, arg) in intrinsic.signature().params.iter().zip(args) {
            if let (true, RuntimeValue::Pointer(id)) = (ty.is_qubit(), arg) {
                self.max_qubit = Some(self.max_qubit.map_or(*id, |max| max.max(*id)));
            }
        }
    }

    fn truth(&self, frame: &Frame, value: &Value) -> EvalResult<bool> {
        let (_, bits) = int(self.operand(frame, value)?)?;
        Ok(bits & 1 == 1)
    }

    fn operand(&self, frame: &Frame, value: &Value) -> EvalResult<RuntimeValue> {
        match value {
            Value::Constant(constant) => Ok(match (constant.ty(), constant.payload()) {
                (Type::Integer(width), Payload::Int(bits)) => RuntimeValue::Int {
                    width: *width,
                    bits,
                },
                (_, Payload::Float(bits)) => RuntimeValue::Float(f64::from_bits(bits)),
                (_, Payload::Null) => RuntimeValue::Pointer(0),
                (_, Payload::Address(id)) => RuntimeValue::Pointer(id),
                (_, Payload::Global(id)) => RuntimeValue::Label(id),
                (ty, payload) => {
                    return Err(EvalError::InvalidOperand(format!(
                        "{:?} is not a valid {} constant",
                        payload, ty
                    )))
                }
            }),
            Value::Inst(inst) => frame.values.get(inst).copied().ok_or_else(|| {
                EvalError::InvalidOperand(format!("{:?} has not been computed", inst))
            }),
            Value::Param { index, .. } => {
                frame.args.get(*index as usize).copied().ok_or_else(|| {
                    EvalError::InvalidOperand(format!("missing argument {}", index))
                })
            }
        }
    }
}

fn int(value: RuntimeValue) -> EvalResult<(u32, u128)> {
    match value {
        RuntimeValue::Int { width, bits } => Ok((width, bits)),
        other => Err(EvalError::InvalidOperand(format!(
            "expected an integer, got {:?}",
            other
        ))),
    }
}

fn pointer(args: &[RuntimeValue], index: usize) -> EvalResult<u64> {
    match args.get(index) {
        Some(RuntimeValue::Pointer(id)) => Ok(*id),
        other => Err(EvalError::InvalidOperand(format!(
            "expected a pointer argument at position {}, got {:?}",
            index, other
        ))),
    }
}

fn angle(args: &[RuntimeValue]) -> EvalResult<f64> {
    match args.first() {
        Some(RuntimeValue::Float(theta)) => Ok(*theta),
        other => Err(EvalError::InvalidOperand(format!(
            "expected a rotation angle, got {:?}",
            other
        ))),
    }
}
