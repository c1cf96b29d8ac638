use crate::{
    coerce,
    ids::{FuncId, GlobalId, InstId},
    types::{check_width, Type},
    IrError, Result,
};
use serde::{Deserialize, Serialize};

/// Immutable bits of a constant. Integers hold their width-truncated bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Payload {
    Int(u128),
    Float(u64),
    Null,
    /// Static handle, printed as `inttoptr (i64 n to T)`.
    Address(u64),
    /// `i8*` to the first byte of a module global string.
    Global(GlobalId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constant {
    ty: Type,
    payload: Payload,
}

impl Constant {
    /// Integer constant under the wrap-positive, reject-negative policy of [`coerce::int_bits`].
    pub fn int(ty: &Type, value: i128) -> Result<Self> {
        let width = ty.int_width().ok_or_else(|| {
            IrError::TypeMismatch(format!("expected an integer type, got {}", ty))
        })?;
        Ok(Self {
            ty: ty.clone(),
            payload: Payload::Int(coerce::int_bits(width, value)?),
        })
    }

    /// Integer constant from an already-encoded bit pattern; excess high bits are dropped.
    pub fn int_from_bits(ty: &Type, bits: u128) -> Result<Self> {
        let width = ty.int_width().ok_or_else(|| {
            IrError::TypeMismatch(format!("expected an integer type, got {}", ty))
        })?;
        let width = check_width(width)?;
        Ok(Self {
            ty: ty.clone(),
            payload: Payload::Int(bits & coerce::mask(width)),
        })
    }

    pub fn bool(value: bool) -> Self {
        Self {
            ty: Type::bool(),
            payload: Payload::Int(value as u128),
        }
    }

    pub fn double(value: f64) -> Self {
        Self {
            ty: Type::Double,
            payload: Payload::Float(value.to_bits()),
        }
    }

    pub fn null(ty: Type) -> Result<Self> {
        if !ty.is_pointer() {
            return Err(IrError::TypeMismatch(format!(
                "null requires a pointer type, got {}",
                ty
            )));
        }
        Ok(Self {
            ty,
            payload: Payload::Null,
        })
    }

    /// Static pointer handle. Handle `0` folds to `null`.
    pub fn address(ty: Type, id: u64) -> Result<Self> {
        let mut constant = Self::null(ty)?;
        if id != 0 {
            constant.payload = Payload::Address(id);
        }
        Ok(constant)
    }

    pub fn qubit(id: u64) -> Self {
        Self {
            ty: Type::qubit(),
            payload: Self::handle(id),
        }
    }

    pub fn result(id: u64) -> Self {
        Self {
            ty: Type::result(),
            payload: Self::handle(id),
        }
    }

    /// Label pointer to a global created by [`Module::add_global_string`](crate::Module::add_global_string).
    pub fn global_string(id: GlobalId) -> Self {
        Self {
            ty: Type::label(),
            payload: Payload::Global(id),
        }
    }

    fn handle(id: u64) -> Payload {
        if id == 0 {
            Payload::Null
        } else {
            Payload::Address(id)
        }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn payload(&self) -> Payload {
        self.payload
    }

    pub fn as_bool(&self) -> Option<bool> {
        match (self.ty.is_bool(), self.payload) {
            (true, Payload::Int(bits)) => Some(bits != 0),
            _ => None,
        }
    }

    pub fn as_bits(&self) -> Option<u128> {
        match self.payload {
            Payload::Int(bits) => Some(bits),
            _ => None,
        }
    }

    /// Bit pattern read back as a two's complement value of the constant's width.
    ///
    /// `None` for non-integers and for widths outside `1..=128`.
    pub fn as_signed(&self) -> Option<i128> {
        let width = self.ty.int_width().filter(|width| *width > 0)?;
        let shift = 128u32.checked_sub(width)?;
        Some((self.as_bits()?.checked_shl(shift)? as i128) >> shift)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.payload {
            Payload::Float(bits) => Some(f64::from_bits(bits)),
            _ => None,
        }
    }

    pub fn global_id(&self) -> Option<GlobalId> {
        match self.payload {
            Payload::Global(id) => Some(id),
            _ => None,
        }
    }

    /// Handle id of a pointer constant; `null` reads as `0`.
    pub fn address_id(&self) -> Option<u64> {
        match self.payload {
            Payload::Null => Some(0),
            Payload::Address(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Constant(Constant),
    /// Result of an instruction, resolved through the owning module.
    Inst(InstId),
    Param { func: FuncId, index: u32 },
}

impl Value {
    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Value::Constant(constant) => Some(constant),
            _ => None,
        }
    }

    pub fn as_inst(&self) -> Option<InstId> {
        match self {
            Value::Inst(inst) => Some(*inst),
            _ => None,
        }
    }
}

impl From<Constant> for Value {
    fn from(constant: Constant) -> Self {
        Value::Constant(constant)
    }
}

impl From<InstId> for Value {
    fn from(inst: InstId) -> Self {
        Value::Inst(inst)
    }
}

/// Untyped host literal, typed later against a parameter type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i128),
    Float(f64),
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

macro_rules! int_literal {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Literal {
                fn from(value: $ty) -> Self {
                    Literal::Int(value as i128)
                }
            }

            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Literal(Literal::Int(value as i128))
                }
            }
        )*
    };
}

int_literal!(i32, i64, u32, u64, i128);

/// A call argument: either a literal to be coerced or an already-typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Literal(Literal),
    Value(Value),
}

impl From<Literal> for Arg {
    fn from(literal: Literal) -> Self {
        Arg::Literal(literal)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<Constant> for Arg {
    fn from(constant: Constant) -> Self {
        Arg::Value(Value::Constant(constant))
    }
}

impl From<InstId> for Arg {
    fn from(inst: InstId) -> Self {
        Arg::Value(Value::Inst(inst))
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Literal(Literal::Bool(value))
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Literal(Literal::Float(value))
    }
}
