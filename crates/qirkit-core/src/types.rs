use crate::{IrError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest integer type the arena can hold a constant for.
pub const MAX_INT_WIDTH: u32 = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Integer(u32),
    Double,
    Pointer(Box<Type>),
    /// Opaque struct such as `Qubit` or `Result`.
    Named(String),
}

/// Reject integer widths the arena cannot hold a constant for.
pub fn check_width(width: u32) -> Result<u32> {
    if width == 0 || width > MAX_INT_WIDTH {
        return Err(IrError::InvalidType(format!(
            "integer width {} is outside 1..={}",
            width, MAX_INT_WIDTH
        )));
    }
    Ok(width)
}

impl Type {
    pub fn int(width: u32) -> Result<Type> {
        check_width(width).map(Type::Integer)
    }

    /// Checks every integer width mentioned by the type, including behind pointers.
    pub fn validate(&self) -> Result<()> {
        match self {
            Type::Integer(width) => check_width(*width).map(|_| ()),
            Type::Pointer(inner) => inner.validate(),
            Type::Void | Type::Double | Type::Named(_) => Ok(()),
        }
    }

    pub fn bool() -> Type {
        Type::Integer(1)
    }

    pub fn i64() -> Type {
        Type::Integer(64)
    }

    pub fn ptr(pointee: Type) -> Type {
        Type::Pointer(Box::new(pointee))
    }

    pub fn qubit() -> Type {
        Type::ptr(Type::Named("Qubit".to_string()))
    }

    pub fn result() -> Type {
        Type::ptr(Type::Named("Result".to_string()))
    }

    /// `i8*`, the type of output labels.
    pub fn label() -> Type {
        Type::ptr(Type::Integer(8))
    }

    pub fn int_width(&self) -> Option<u32> {
        match self {
            Type::Integer(width) => Some(*width),
            _ => None,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Integer(1))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_qubit(&self) -> bool {
        self.pointee_name() == Some("Qubit")
    }

    pub fn is_result(&self) -> bool {
        self.pointee_name() == Some("Result")
    }

    fn pointee_name(&self) -> Option<&str> {
        match self {
            Type::Pointer(inner) => match inner.as_ref() {
                Type::Named(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// Names of the opaque structs this type mentions, outermost first.
    pub fn named_structs(&self) -> Vec<&str> {
        match self {
            Type::Named(name) => vec![name.as_str()],
            Type::Pointer(inner) => inner.named_structs(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Integer(width) => write!(f, "i{}", width),
            Type::Double => write!(f, "double"),
            Type::Pointer(inner) => write!(f, "{}*", inner),
            Type::Named(name) => write!(f, "%{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub ret: Type,
    pub params: Vec<Type>,
}

impl Signature {
    pub fn new(ret: Type, params: Vec<Type>) -> Self {
        Self { ret, params }
    }

    pub fn void(params: Vec<Type>) -> Self {
        Self::new(Type::Void, params)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.ret)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}
