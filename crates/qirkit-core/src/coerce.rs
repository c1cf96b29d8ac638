//! Host literal to IR constant conversion.
//!
//! Every integer literal is first staged through a 64-bit value: non-negative literals must fit
//! in an unsigned 64-bit word and negative literals in a signed one. The staged value is then
//! narrowed to the target width. Non-negative values wrap modulo `2^N`; negative values must be
//! representable in `N`-bit two's complement and are rejected otherwise.

use crate::{
    module::Module,
    types::{check_width, Signature, Type},
    values::{Arg, Constant, Literal, Value},
    IrError, Result,
};

const STAGING_UNSIGNED_END: i128 = 1 << 64;
const STAGING_SIGNED_MIN: i128 = i64::MIN as i128;

pub fn mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

/// Encode `value` as the bit pattern of an `iN` constant.
pub fn int_bits(width: u32, value: i128) -> Result<u128> {
    let width = check_width(width)?;
    if value >= 0 {
        if value >= STAGING_UNSIGNED_END {
            return Err(IrError::Overflow(format!(
                "{} does not fit in 64 bits",
                value
            )));
        }
        return Ok(value as u128 & mask(width));
    }

    if value < STAGING_SIGNED_MIN {
        return Err(IrError::Overflow(format!(
            "{} does not fit in 64 bits",
            value
        )));
    }
    let min = i128::MIN >> (128 - width);
    if value < min {
        return Err(IrError::Overflow(format!(
            "{} does not fit in i{}",
            value, width
        )));
    }
    Ok(value as u128 & mask(width))
}

/// Type a host literal against `target`.
pub fn constant(target: &Type, literal: Literal) -> Result<Constant> {
    match (target, literal) {
        (Type::Integer(1), Literal::Bool(value)) => Ok(Constant::bool(value)),
        (Type::Integer(_), Literal::Int(value)) => Constant::int(target, value),
        (Type::Double, Literal::Float(value)) => Ok(Constant::double(value)),
        (Type::Double, Literal::Int(value)) => Ok(Constant::double(value as f64)),
        (target, literal) => Err(IrError::TypeMismatch(format!(
            "cannot convert {} to {}",
            describe(&literal),
            target
        ))),
    }
}

fn describe(literal: &Literal) -> &'static str {
    match literal {
        Literal::Bool(_) => "a bool literal",
        Literal::Int(_) => "an int literal",
        Literal::Float(_) => "a float literal",
    }
}

/// Turn a call argument into a value of exactly `target` type.
pub fn materialize(module: &Module, target: &Type, arg: Arg) -> Result<Value> {
    match arg {
        Arg::Literal(literal) => constant(target, literal).map(Value::Constant),
        Arg::Value(value) => {
            let ty = module.value_type(&value)?;
            if &ty != target {
                return Err(IrError::TypeMismatch(format!(
                    "expected {}, got {}",
                    target, ty
                )));
            }
            Ok(value)
        }
    }
}

/// Check arity, then materialize every argument. Fails on the first bad argument.
pub fn call_args(module: &Module, signature: &Signature, args: Vec<Arg>) -> Result<Vec<Value>> {
    if args.len() != signature.params.len() {
        return Err(IrError::Arity {
            expected: signature.params.len(),
            got: args.len(),
        });
    }
    signature
        .params
        .iter()
        .zip(args)
        .map(|(param, arg)| materialize(module, param, arg))
        .collect()
}
