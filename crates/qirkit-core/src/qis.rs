//! Quantum instruction set and runtime intrinsics.
//!
//! Every gate, measurement and output-recording routine is an external function named
//! `__quantum__qis__<gate>__<functor>` or `__quantum__rt__<kind>_record_output`. Emitting one
//! declares the callee on first use.

use crate::{
    builder::{Builder, IfBuilder},
    ids::InstId,
    types::{Signature, Type},
    values::{Arg, Value},
    IrError, Result,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intrinsic {
    Barrier,
    Ccx,
    Cx,
    Cy,
    Cz,
    Swap,
    Rx,
    Rxx,
    Ry,
    Ryy,
    Rz,
    Rzz,
    H,
    S,
    SAdj,
    T,
    TAdj,
    X,
    Y,
    Z,
    M,
    Mz,
    MResetZ,
    Reset,
    ReadResult,
    ResultRecordOutput,
    BoolRecordOutput,
    IntRecordOutput,
    DoubleRecordOutput,
    TupleRecordOutput,
    ArrayRecordOutput,
}

impl Intrinsic {
    pub const ALL: [Intrinsic; 31] = [
        Intrinsic::Barrier,
        Intrinsic::Ccx,
        Intrinsic::Cx,
        Intrinsic::Cy,
        Intrinsic::Cz,
        Intrinsic::Swap,
        Intrinsic::Rx,
        Intrinsic::Rxx,
        Intrinsic::Ry,
        Intrinsic::Ryy,
        Intrinsic::Rz,
        Intrinsic::Rzz,
        Intrinsic::H,
        Intrinsic::S,
        Intrinsic::SAdj,
        Intrinsic::T,
        Intrinsic::TAdj,
        Intrinsic::X,
        Intrinsic::Y,
        Intrinsic::Z,
        Intrinsic::M,
        Intrinsic::Mz,
        Intrinsic::MResetZ,
        Intrinsic::Reset,
        Intrinsic::ReadResult,
        Intrinsic::ResultRecordOutput,
        Intrinsic::BoolRecordOutput,
        Intrinsic::IntRecordOutput,
        Intrinsic::DoubleRecordOutput,
        Intrinsic::TupleRecordOutput,
        Intrinsic::ArrayRecordOutput,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Intrinsic::Barrier => "__quantum__qis__barrier__body",
            Intrinsic::Ccx => "__quantum__qis__ccx__body",
            Intrinsic::Cx => "__quantum__qis__cx__body",
            Intrinsic::Cy => "__quantum__qis__cy__body",
            Intrinsic::Cz => "__quantum__qis__cz__body",
            Intrinsic::Swap => "__quantum__qis__swap__body",
            Intrinsic::Rx => "__quantum__qis__rx__body",
            Intrinsic::Rxx => "__quantum__qis__rxx__body",
            Intrinsic::Ry => "__quantum__qis__ry__body",
            Intrinsic::Ryy => "__quantum__qis__ryy__body",
            Intrinsic::Rz => "__quantum__qis__rz__body",
            Intrinsic::Rzz => "__quantum__qis__rzz__body",
            Intrinsic::H => "__quantum__qis__h__body",
            Intrinsic::S => "__quantum__qis__s__body",
            Intrinsic::SAdj => "__quantum__qis__s__adj",
            Intrinsic::T => "__quantum__qis__t__body",
            Intrinsic::TAdj => "__quantum__qis__t__adj",
            Intrinsic::X => "__quantum__qis__x__body",
            Intrinsic::Y => "__quantum__qis__y__body",
            Intrinsic::Z => "__quantum__qis__z__body",
            Intrinsic::M => "__quantum__qis__m__body",
            Intrinsic::Mz => "__quantum__qis__mz__body",
            Intrinsic::MResetZ => "__quantum__qis__mresetz__body",
            Intrinsic::Reset => "__quantum__qis__reset__body",
            Intrinsic::ReadResult => "__quantum__qis__read_result__body",
            Intrinsic::ResultRecordOutput => "__quantum__rt__result_record_output",
            Intrinsic::BoolRecordOutput => "__quantum__rt__bool_record_output",
            Intrinsic::IntRecordOutput => "__quantum__rt__int_record_output",
            Intrinsic::DoubleRecordOutput => "__quantum__rt__double_record_output",
            Intrinsic::TupleRecordOutput => "__quantum__rt__tuple_record_output",
            Intrinsic::ArrayRecordOutput => "__quantum__rt__array_record_output",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|intrinsic| intrinsic.name() == name)
    }

    pub fn signature(&self) -> Signature {
        let q = Type::qubit;
        let r = Type::result;
        match self {
            Intrinsic::Barrier => Signature::void(vec![]),
            Intrinsic::Ccx => Signature::void(vec![q(), q(), q()]),
            Intrinsic::Cx | Intrinsic::Cy | Intrinsic::Cz | Intrinsic::Swap => {
                Signature::void(vec![q(), q()])
            }
            Intrinsic::Rx | Intrinsic::Ry | Intrinsic::Rz => Signature::void(vec![Type::Double, q()]),
            Intrinsic::Rxx | Intrinsic::Ryy | Intrinsic::Rzz => {
                Signature::void(vec![Type::Double, q(), q()])
            }
            Intrinsic::H
            | Intrinsic::S
            | Intrinsic::SAdj
            | Intrinsic::T
            | Intrinsic::TAdj
            | Intrinsic::X
            | Intrinsic::Y
            | Intrinsic::Z
            | Intrinsic::Reset => Signature::void(vec![q()]),
            Intrinsic::M | Intrinsic::Mz | Intrinsic::MResetZ => Signature::void(vec![q(), r()]),
            Intrinsic::ReadResult => Signature::new(Type::bool(), vec![r()]),
            Intrinsic::ResultRecordOutput => Signature::void(vec![r(), Type::label()]),
            Intrinsic::BoolRecordOutput => Signature::void(vec![Type::bool(), Type::label()]),
            Intrinsic::IntRecordOutput
            | Intrinsic::TupleRecordOutput
            | Intrinsic::ArrayRecordOutput => Signature::void(vec![Type::i64(), Type::label()]),
            Intrinsic::DoubleRecordOutput => Signature::void(vec![Type::Double, Type::label()]),
        }
    }

    pub fn is_measurement(&self) -> bool {
        matches!(self, Intrinsic::M | Intrinsic::Mz | Intrinsic::MResetZ)
    }
}

/// Typed emitters for [`Intrinsic`] calls at the builder's cursor.
pub trait QisBuilderExt<'m> {
    /// Declare `intrinsic` if needed and call it.
    fn intrinsic(&mut self, intrinsic: Intrinsic, args: Vec<Arg>) -> Result<InstId>;

    fn barrier(&mut self) -> Result<InstId> {
        self.intrinsic(Intrinsic::Barrier, vec![])
    }

    fn ccx(&mut self, control1: Value, control2: Value, target: Value) -> Result<InstId> {
        self.intrinsic(
            Intrinsic::Ccx,
            vec![control1.into(), control2.into(), target.into()],
        )
    }

    fn cx(&mut self, control: Value, target: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::Cx, vec![control.into(), target.into()])
    }

    fn cy(&mut self, control: Value, target: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::Cy, vec![control.into(), target.into()])
    }

    fn cz(&mut self, control: Value, target: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::Cz, vec![control.into(), target.into()])
    }

    fn swap(&mut self, qubit1: Value, qubit2: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::Swap, vec![qubit1.into(), qubit2.into()])
    }

    fn h(&mut self, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::H, vec![qubit.into()])
    }

    fn s(&mut self, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::S, vec![qubit.into()])
    }

    fn s_adj(&mut self, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::SAdj, vec![qubit.into()])
    }

    fn t(&mut self, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::T, vec![qubit.into()])
    }

    fn t_adj(&mut self, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::TAdj, vec![qubit.into()])
    }

    fn x(&mut self, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::X, vec![qubit.into()])
    }

    fn y(&mut self, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::Y, vec![qubit.into()])
    }

    fn z(&mut self, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::Z, vec![qubit.into()])
    }

    fn rx(&mut self, theta: impl Into<Arg>, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::Rx, vec![theta.into(), qubit.into()])
    }

    fn ry(&mut self, theta: impl Into<Arg>, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::Ry, vec![theta.into(), qubit.into()])
    }

    fn rz(&mut self, theta: impl Into<Arg>, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::Rz, vec![theta.into(), qubit.into()])
    }

    fn rxx(&mut self, theta: impl Into<Arg>, qubit1: Value, qubit2: Value) -> Result<InstId> {
        self.intrinsic(
            Intrinsic::Rxx,
            vec![theta.into(), qubit1.into(), qubit2.into()],
        )
    }

    fn ryy(&mut self, theta: impl Into<Arg>, qubit1: Value, qubit2: Value) -> Result<InstId> {
        self.intrinsic(
            Intrinsic::Ryy,
            vec![theta.into(), qubit1.into(), qubit2.into()],
        )
    }

    fn rzz(&mut self, theta: impl Into<Arg>, qubit1: Value, qubit2: Value) -> Result<InstId> {
        self.intrinsic(
            Intrinsic::Rzz,
            vec![theta.into(), qubit1.into(), qubit2.into()],
        )
    }

    fn reset(&mut self, qubit: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::Reset, vec![qubit.into()])
    }

    fn m(&mut self, qubit: Value, result: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::M, vec![qubit.into(), result.into()])
    }

    fn mz(&mut self, qubit: Value, result: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::Mz, vec![qubit.into(), result.into()])
    }

    fn mresetz(&mut self, qubit: Value, result: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::MResetZ, vec![qubit.into(), result.into()])
    }

    /// Emits the `i1` read of a measurement result.
    fn read_result(&mut self, result: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::ReadResult, vec![result.into()])
    }

    fn result_record_output(&mut self, result: Value, label: Value) -> Result<InstId> {
        self.intrinsic(
            Intrinsic::ResultRecordOutput,
            vec![result.into(), label.into()],
        )
    }

    fn bool_record_output(&mut self, value: impl Into<Arg>, label: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::BoolRecordOutput, vec![value.into(), label.into()])
    }

    fn int_record_output(&mut self, value: impl Into<Arg>, label: Value) -> Result<InstId> {
        self.intrinsic(Intrinsic::IntRecordOutput, vec![value.into(), label.into()])
    }

    fn double_record_output(&mut self, value: impl Into<Arg>, label: Value) -> Result<InstId> {
        self.intrinsic(
            Intrinsic::DoubleRecordOutput,
            vec![value.into(), label.into()],
        )
    }

    fn tuple_record_output(&mut self, num_elements: u64, label: Value) -> Result<InstId> {
        self.intrinsic(
            Intrinsic::TupleRecordOutput,
            vec![num_elements.into(), label.into()],
        )
    }

    fn array_record_output(&mut self, num_elements: u64, label: Value) -> Result<InstId> {
        self.intrinsic(
            Intrinsic::ArrayRecordOutput,
            vec![num_elements.into(), label.into()],
        )
    }

    /// Read `result` and branch on it, like [`Builder::if_`].
    fn if_result(&mut self, result: Value) -> Result<IfBuilder<'_, 'm>>;
}

impl<'m> QisBuilderExt<'m> for Builder<'m> {
    fn intrinsic(&mut self, intrinsic: Intrinsic, args: Vec<Arg>) -> Result<InstId> {
        if self.position().is_none() {
            return Err(IrError::NoInsertionPoint);
        }
        let callee = self
            .module_mut()
            .get_or_declare(intrinsic.name(), intrinsic.signature())?;
        self.call(callee, args)
    }

    fn if_result(&mut self, result: Value) -> Result<IfBuilder<'_, 'm>> {
        let bit = self.read_result(result)?;
        Ok(self.if_(Value::Inst(bit)))
    }
}
