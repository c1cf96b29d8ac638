/*! Cursor-based instruction builder.
 *
 * A [`Builder`] holds the module's only mutable borrow together with an insertion point. Every
 * instruction enters the IR through it, which is where argument coercion, terminator placement and
 * cross-function checks are enforced.
 */

mod conditional;
mod cursor;

pub use conditional::IfBuilder;
pub use cursor::InsertPoint;

use crate::{
    coerce,
    ids::{BlockId, FuncId, InstId},
    instructions::{BinaryOp, CastOp, InstKind, IntPredicate},
    module::Module,
    types::Type,
    values::{Arg, Value},
    IrError, Result,
};

pub struct Builder<'m> {
    module: &'m mut Module,
    position: Option<InsertPoint>,
}

impl<'m> Builder<'m> {
    pub fn new(module: &'m mut Module) -> Self {
        Self {
            module,
            position: None,
        }
    }

    pub fn module(&self) -> &Module {
        &*self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut *self.module
    }

    fn current_function(&self) -> Result<FuncId> {
        let block = self.current_block().ok_or(IrError::NoInsertionPoint)?;
        Ok(self.module.block(block).func())
    }

    fn check_target(&self, target: BlockId) -> Result<()> {
        let func = self.current_function()?;
        let target = self.module.get_block(target)?;
        let owner = target.func();
        if owner != func {
            return Err(IrError::Ownership(format!(
                "cannot branch from `{}` to block `{}` of `{}`",
                self.module.function(func).name(),
                target.name(),
                self.module.function(owner).name()
            )));
        }
        Ok(())
    }

    /// Coerce `args` against the callee's signature and append the call.
    pub fn call(&mut self, callee: FuncId, args: Vec<Arg>) -> Result<InstId> {
        let signature = self.module.function(callee).signature().clone();
        let args = coerce::call_args(self.module, &signature, args)?;
        self.append(InstKind::Call { callee, args }, signature.ret)
    }

    pub fn br(&mut self, dest: BlockId) -> Result<InstId> {
        self.check_target(dest)?;
        self.append(InstKind::Br { dest }, Type::Void)
    }

    pub fn cond_br(&mut self, cond: Value, if_true: BlockId, if_false: BlockId) -> Result<InstId> {
        self.expect_type(&cond, &Type::bool())?;
        self.check_target(if_true)?;
        self.check_target(if_false)?;
        self.append(
            InstKind::CondBr {
                cond,
                if_true,
                if_false,
            },
            Type::Void,
        )
    }

    pub fn ret(&mut self, value: Option<Value>) -> Result<InstId> {
        let func = self.current_function()?;
        let expected = self.module.function(func).signature().ret.clone();
        match &value {
            Some(value) => self.expect_type(value, &expected)?,
            None if !expected.is_void() => {
                return Err(IrError::TypeMismatch(format!(
                    "`{}` must return a value of type {}",
                    self.module.function(func).name(),
                    expected
                )))
            }
            None => {}
        }
        self.append(InstKind::Ret { value }, Type::Void)
    }

    pub fn unreachable(&mut self) -> Result<InstId> {
        self.append(InstKind::Unreachable, Type::Void)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<InstId> {
        let ty = self.int_operands(&lhs, &rhs)?;
        self.append(InstKind::Binary { op, lhs, rhs }, ty)
    }

    pub fn and(&mut self, lhs: Value, rhs: Value) -> Result<InstId> {
        self.binary(BinaryOp::And, lhs, rhs)
    }

    pub fn or(&mut self, lhs: Value, rhs: Value) -> Result<InstId> {
        self.binary(BinaryOp::Or, lhs, rhs)
    }

    pub fn xor(&mut self, lhs: Value, rhs: Value) -> Result<InstId> {
        self.binary(BinaryOp::Xor, lhs, rhs)
    }

    pub fn add(&mut self, lhs: Value, rhs: Value) -> Result<InstId> {
        self.binary(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: Value, rhs: Value) -> Result<InstId> {
        self.binary(BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: Value, rhs: Value) -> Result<InstId> {
        self.binary(BinaryOp::Mul, lhs, rhs)
    }

    pub fn shl(&mut self, lhs: Value, rhs: Value) -> Result<InstId> {
        self.binary(BinaryOp::Shl, lhs, rhs)
    }

    pub fn lshr(&mut self, lhs: Value, rhs: Value) -> Result<InstId> {
        self.binary(BinaryOp::LShr, lhs, rhs)
    }

    pub fn icmp(&mut self, pred: IntPredicate, lhs: Value, rhs: Value) -> Result<InstId> {
        self.int_operands(&lhs, &rhs)?;
        self.append(InstKind::ICmp { pred, lhs, rhs }, Type::bool())
    }

    pub fn trunc(&mut self, value: Value, ty: Type) -> Result<InstId> {
        self.cast(CastOp::Trunc, value, ty)
    }

    pub fn zext(&mut self, value: Value, ty: Type) -> Result<InstId> {
        self.cast(CastOp::ZExt, value, ty)
    }

    pub fn cast(&mut self, op: CastOp, value: Value, ty: Type) -> Result<InstId> {
        let from = self.module.value_type(&value)?;
        let widths = (from.int_width(), ty.int_width());
        let valid = match (op, widths) {
            (CastOp::Trunc, (Some(src), Some(dst))) => dst < src,
            (CastOp::ZExt, (Some(src), Some(dst))) => dst > src,
            _ => false,
        };
        if !valid {
            return Err(IrError::TypeMismatch(format!(
                "invalid {} from {} to {}",
                op.mnemonic(),
                from,
                ty
            )));
        }
        self.append(InstKind::Cast { op, value }, ty)
    }

    fn int_operands(&self, lhs: &Value, rhs: &Value) -> Result<Type> {
        let ty = self.module.value_type(lhs)?;
        if ty.int_width().is_none() {
            return Err(IrError::TypeMismatch(format!(
                "expected an integer operand, got {}",
                ty
            )));
        }
        self.expect_type(rhs, &ty)?;
        Ok(ty)
    }

    fn expect_type(&self, value: &Value, expected: &Type) -> Result<()> {
        let ty = self.module.value_type(value)?;
        if &ty != expected {
            return Err(IrError::TypeMismatch(format!(
                "expected {}, got {}",
                expected, ty
            )));
        }
        Ok(())
    }
}
