use super::entry_module;
use crate::builder::Builder;
use crate::instructions::InstKind;
use crate::types::{Signature, Type};
use crate::values::{Arg, Constant, Literal, Value};
use crate::IrError;

fn call_args(module: &crate::module::Module, call: crate::ids::InstId) -> Vec<Value> {
    match module.inst(call).unwrap().kind() {
        InstKind::Call { args, .. } => args.clone(),
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn test_bool_literal_wraps() {
    let (mut module, _, entry) = entry_module(0, 0);
    let f = module
        .add_function("f", Signature::void(vec![Type::bool()]))
        .unwrap();
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);

    let call = builder.call(f, vec![123.into()]).unwrap();
    assert_eq!(call_args(&module, call), vec![Constant::bool(true).into()]);
}

#[test]
fn test_bool_literal_underflow() {
    let (mut module, _, entry) = entry_module(0, 0);
    let f = module
        .add_function("f", Signature::void(vec![Type::bool()]))
        .unwrap();
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);

    assert!(matches!(
        builder.call(f, vec![(-123).into()]),
        Err(IrError::Overflow(_))
    ));
    assert!(module.block(entry).insts().is_empty());
}

#[test]
fn test_int_literal_wraps_modulo_width() {
    let (mut module, _, entry) = entry_module(0, 0);
    let i32_ty = Type::int(32).unwrap();
    let f = module
        .add_function("f", Signature::void(vec![i32_ty.clone()]))
        .unwrap();
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);

    let call = builder.call(f, vec![((1i64 << 32) + 123).into()]).unwrap();
    let args = call_args(&module, call);
    assert_eq!(args[0].as_constant().unwrap().as_signed(), Some(123));
    assert_eq!(args[0].as_constant().unwrap().ty(), &i32_ty);
}

#[test]
fn test_int_literal_underflow() {
    let (mut module, _, entry) = entry_module(0, 0);
    let f = module
        .add_function("f", Signature::void(vec![Type::int(32).unwrap()]))
        .unwrap();
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);

    assert!(matches!(
        builder.call(f, vec![(-(1i64 << 32) - 123).into()]),
        Err(IrError::Overflow(_))
    ));
}

#[test]
fn test_typed_constant_wraps_on_creation() {
    let constant = Constant::int(&Type::int(32).unwrap(), (1 << 32) + 123).unwrap();
    assert_eq!(constant.as_bits(), Some(123));
    assert!(matches!(
        Constant::int(&Type::int(32).unwrap(), -(1 << 32) - 123),
        Err(IrError::Overflow(_))
    ));
    assert!(matches!(
        Constant::int(&Type::bool(), -123),
        Err(IrError::Overflow(_))
    ));
    assert!(matches!(
        Constant::int(&Type::int(128).unwrap(), 1 << 64),
        Err(IrError::Overflow(_))
    ));
}

#[test]
fn test_double_accepts_int_and_float_literals() {
    let (mut module, _, entry) = entry_module(0, 0);
    let f = module
        .add_function("f", Signature::void(vec![Type::Double, Type::Double]))
        .unwrap();
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);

    let call = builder.call(f, vec![23.25.into(), 2.into()]).unwrap();
    assert_eq!(
        call_args(&module, call),
        vec![Constant::double(23.25).into(), Constant::double(2.0).into()]
    );
}

#[test]
fn test_wrong_literal_kinds() {
    let (mut module, _, entry) = entry_module(0, 0);
    let f_int = module
        .add_function("f_int", Signature::void(vec![Type::i64()]))
        .unwrap();
    let f_bool = module
        .add_function("f_bool", Signature::void(vec![Type::bool()]))
        .unwrap();
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);

    assert!(matches!(
        builder.call(f_int, vec![1.23.into()]),
        Err(IrError::TypeMismatch(_))
    ));
    assert!(matches!(
        builder.call(f_int, vec![true.into()]),
        Err(IrError::TypeMismatch(_))
    ));
    assert!(matches!(
        builder.call(f_bool, vec![Arg::Literal(Literal::Float(1.0))]),
        Err(IrError::TypeMismatch(_))
    ));
}

#[test]
fn test_typed_value_must_match_exactly() {
    let (mut module, _, entry) = entry_module(0, 0);
    let f = module
        .add_function("f", Signature::void(vec![Type::i64()]))
        .unwrap();
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);

    let narrow = Constant::int(&Type::int(32).unwrap(), 1).unwrap();
    assert!(matches!(
        builder.call(f, vec![narrow.into()]),
        Err(IrError::TypeMismatch(_))
    ));
    assert!(matches!(
        builder.call(f, vec![Constant::qubit(0).into()]),
        Err(IrError::TypeMismatch(_))
    ));
    let wide = Constant::int(&Type::i64(), 42).unwrap();
    builder.call(f, vec![wide.into()]).unwrap();
}

#[test]
fn test_arity_message() {
    let (mut module, _, entry) = entry_module(0, 0);
    let f = module
        .add_function(
            "f",
            Signature::void(vec![Type::Double, Type::bool(), Type::bool()]),
        )
        .unwrap();
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);

    let err = builder.call(f, vec![1.23.into()]).unwrap_err();
    assert_eq!(err, IrError::Arity { expected: 3, got: 1 });
    assert_eq!(err.to_string(), "Expected 3 arguments, got 1.");
}

#[test]
fn test_call_result_is_usable_value() {
    let (mut module, _, entry) = entry_module(0, 0);
    let source = module
        .add_function("source", Signature::new(Type::i64(), vec![]))
        .unwrap();
    let sink = module
        .add_function("sink", Signature::void(vec![Type::i64()]))
        .unwrap();
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);

    let value = builder.call(source, vec![]).unwrap();
    builder.call(sink, vec![value.into()]).unwrap();

    module.erase_inst(value).unwrap();
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);
    assert!(matches!(
        builder.call(sink, vec![value.into()]),
        Err(IrError::DanglingValue(_))
    ));
}
