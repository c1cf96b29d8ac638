use pretty_assertions::assert_eq;
use qirkit_core::{
    Builder, Constant, EntryPointBuilder, FuncId, IntPredicate, Module, QisBuilderExt, Signature,
    Type, Value,
};
use qirkit_eval::{EvalError, Evaluator, EvaluatorConfig, GateLogger};
use qirkit_parser::parse_module;

fn qubit(id: u64) -> Value {
    Constant::qubit(id).into()
}

fn result(id: u64) -> Value {
    Constant::result(id).into()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Entry point with its builder positioned at the end of `entry`; `ret` is appended afterwards.
fn program(
    qubits: u64,
    results: u64,
    body: impl FnOnce(&mut Builder<'_>) -> qirkit_core::Result<()>,
) -> Module {
    let mut module = Module::new("test");
    let main = EntryPointBuilder::new("main")
        .qubits(qubits)
        .results(results)
        .build(&mut module)
        .unwrap();
    let entry = module.append_block(main, "entry");
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);
    body(&mut builder).unwrap();
    builder.ret(None).unwrap();
    module
}

fn run(module: &Module, outcomes: &[bool]) -> Vec<String> {
    init_tracing();
    let mut logger = GateLogger::new();
    Evaluator::default()
        .run(module, &mut logger, outcomes)
        .unwrap();
    logger.instructions
}

#[test]
fn test_bell_circuit() {
    let module = program(2, 2, |b| {
        b.h(qubit(0))?;
        b.cx(qubit(0), qubit(1))?;
        b.mz(qubit(0), result(0))?;
        b.mz(qubit(1), result(1))?;
        Ok(())
    });

    let mut logger = GateLogger::new();
    Evaluator::default().run(&module, &mut logger, &[]).unwrap();
    assert_eq!(
        logger.instructions,
        vec![
            "h qubit[0]",
            "cx qubit[0], qubit[1]",
            "m qubit[0] => out[0]",
            "m qubit[1] => out[1]",
        ]
    );
    assert_eq!(logger.number_of_qubits, 2);
}

#[test]
fn test_rotations_and_reset() {
    let module = program(3, 0, |b| {
        b.rx(0.5, qubit(0))?;
        b.rzz(2.0, qubit(1), qubit(2))?;
        b.reset(qubit(2))?;
        b.swap(qubit(0), qubit(1))?;
        b.ccx(qubit(0), qubit(1), qubit(2))?;
        b.barrier()?;
        Ok(())
    });
    assert_eq!(
        run(&module, &[]),
        vec![
            "rx theta[0.5] qubit[0]",
            "rzz theta[2.0] qubit[1], qubit[2]",
            "reset 2",
            "swap qubit[0], qubit[1]",
            "ccx qubit[0], qubit[1], qubit[2]",
        ]
    );
}

fn measure_then_x() -> Module {
    program(1, 1, |b| {
        b.mz(qubit(0), result(0))?;
        b.if_result(result(0))?
            .then(|b| b.x(qubit(0)).map(|_| ()))
            .build()
    })
}

#[test]
fn test_if_result_follows_outcome_stream() {
    let module = measure_then_x();
    assert_eq!(
        run(&module, &[true]),
        vec!["m qubit[0] => out[0]", "x qubit[0]"]
    );
    assert_eq!(run(&module, &[false]), vec!["m qubit[0] => out[0]"]);
    assert_eq!(run(&module, &[]), vec!["m qubit[0] => out[0]"]);
}

#[test]
fn test_unmeasured_result_reads_zero() {
    let then_only = program(1, 1, |b| {
        b.if_result(result(0))?
            .then(|b| b.x(qubit(0)).map(|_| ()))
            .build()
    });
    assert_eq!(run(&then_only, &[true]), Vec::<String>::new());

    let else_only = program(1, 1, |b| {
        b.if_result(result(0))?
            .otherwise(|b| b.x(qubit(0)).map(|_| ()))
            .build()
    });
    assert_eq!(run(&else_only, &[]), vec!["x qubit[0]"]);
}

#[test]
fn test_if_continues_after_join() {
    let module = program(1, 1, |b| {
        b.if_result(result(0))?
            .otherwise(|b| b.x(qubit(0)).map(|_| ()))
            .build()?;
        b.h(qubit(0))?;
        Ok(())
    });
    assert_eq!(run(&module, &[]), vec!["x qubit[0]", "h qubit[0]"]);
}

#[test]
fn test_nested_if_result() {
    let nested = |outer_then: bool| {
        program(1, 2, move |b| {
            b.mz(qubit(0), result(0))?;
            b.mz(qubit(0), result(1))?;
            let inner = |b: &mut Builder<'_>| {
                b.if_result(result(1))?
                    .otherwise(|b| b.x(qubit(0)).map(|_| ()))
                    .build()
            };
            let outer = b.if_result(result(0))?;
            if outer_then {
                outer.then(inner).build()
            } else {
                outer.otherwise(inner).build()
            }
        })
    };

    let measured = ["m qubit[0] => out[0]", "m qubit[0] => out[1]"];
    let flipped = [measured[0], measured[1], "x qubit[0]"];

    assert_eq!(run(&nested(true), &[true, false]), flipped);
    assert_eq!(run(&nested(true), &[false, false]), measured);
    assert_eq!(run(&nested(true), &[true, true]), measured);
    assert_eq!(run(&nested(false), &[]), flipped);
    assert_eq!(run(&nested(false), &[true]), measured);
}

#[test]
fn test_mresetz_consumes_outcome() {
    let module = program(1, 2, |b| {
        b.mresetz(qubit(0), result(0))?;
        b.mz(qubit(0), result(1))?;
        b.if_result(result(1))?
            .then(|b| b.z(qubit(0)).map(|_| ()))
            .build()
    });
    assert_eq!(
        run(&module, &[false, true]),
        vec![
            "m qubit[0] => out[0]",
            "reset 0",
            "m qubit[0] => out[1]",
            "z qubit[0]",
        ]
    );
}

#[test]
fn test_classical_arithmetic_drives_branches() {
    let mut module = Module::new("test");
    let main = EntryPointBuilder::new("main").qubits(1).build(&mut module).unwrap();
    let helper = module
        .add_function("double", Signature::new(Type::i64(), vec![Type::i64()]))
        .unwrap();
    let body = module.append_block(helper, "entry");
    let entry = module.append_block(main, "entry");

    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(body);
    let param = Value::Param {
        func: helper,
        index: 0,
    };
    let doubled = builder
        .shl(param, Constant::int(&Type::i64(), 1).unwrap().into())
        .unwrap();
    builder.ret(Some(doubled.into())).unwrap();

    builder.insert_at_end(entry);
    let value = builder.call(helper, vec![21.into()]).unwrap();
    let is_answer = builder
        .icmp(
            IntPredicate::Eq,
            value.into(),
            Constant::int(&Type::i64(), 42).unwrap().into(),
        )
        .unwrap();
    builder
        .if_(is_answer.into())
        .then(|b| b.h(qubit(0)).map(|_| ()))
        .otherwise(|b| b.x(qubit(0)).map(|_| ()))
        .build()
        .unwrap();
    builder.ret(None).unwrap();

    assert_eq!(run(&module, &[]), vec!["h qubit[0]"]);
}

#[test]
fn test_unknown_external_functions_are_rejected() {
    let module = parse_module(
        r#"
        %String = type opaque

        declare %String* @__quantum__rt__bool_to_string(i1)
        declare %String* @__quantum__rt__int_to_string(i1)

        define void @main() #1 {
        entry:
            call %String* @__quantum__rt__bool_to_string(i1 1)
            call %String* @__quantum__rt__int_to_string(i1 1)
            ret void
        }

        attributes #1 = { "EntryPoint" }
        "#,
        "test_unknown_external_func",
    )
    .unwrap();

    let err = Evaluator::default()
        .run(&module, &mut GateLogger::new(), &[])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unsupported functions `__quantum__rt__bool_to_string`, `__quantum__rt__int_to_string`."
    );
}

fn two_entry_points() -> (Module, FuncId, FuncId) {
    let mut module = Module::new("test");
    let mut add = |name: &str, gate: fn(&mut Builder<'_>) -> qirkit_core::Result<()>| {
        let func = EntryPointBuilder::new(name).build(&mut module).unwrap();
        let entry = module.append_block(func, "entry");
        let mut builder = Builder::new(&mut module);
        builder.insert_at_end(entry);
        gate(&mut builder).unwrap();
        builder.ret(None).unwrap();
        func
    };
    let first = add("first", |b| b.x(qubit(0)).map(|_| ()));
    let second = add("second", |b| b.y(qubit(0)).map(|_| ()));
    (module, first, second)
}

#[test]
fn test_entry_point_selection() {
    let (module, _, _) = two_entry_points();

    assert_eq!(
        Evaluator::default().run(&module, &mut GateLogger::new(), &[]),
        Err(EvalError::MultipleEntryPoints)
    );

    let mut logger = GateLogger::new();
    Evaluator::new(EvaluatorConfig::with_entry_point("second"))
        .run(&module, &mut logger, &[])
        .unwrap();
    assert_eq!(logger.instructions, vec!["y qubit[0]"]);

    assert_eq!(
        Evaluator::new(EvaluatorConfig::with_entry_point("missing")).run(
            &module,
            &mut GateLogger::new(),
            &[]
        ),
        Err(EvalError::NoEntryPoint)
    );
}

#[test]
fn test_entry_point_must_take_no_arguments() {
    let mut module = Module::new("test");
    let main = module
        .add_function("main", Signature::void(vec![Type::i64()]))
        .unwrap();
    module.set_attribute(main, "entry_point", None);
    let entry = module.append_block(main, "entry");
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);
    builder.ret(None).unwrap();

    assert_eq!(
        Evaluator::default().run(&module, &mut GateLogger::new(), &[]),
        Err(EvalError::EntryPointSignature)
    );
}

#[test]
fn test_infinite_loop_hits_step_limit() {
    let mut module = Module::new("test");
    let main = EntryPointBuilder::new("main").build(&mut module).unwrap();
    let entry = module.append_block(main, "entry");
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);
    builder.br(entry).unwrap();

    let config = EvaluatorConfig {
        max_steps: 100,
        ..EvaluatorConfig::default()
    };
    assert_eq!(
        Evaluator::new(config).run(&module, &mut GateLogger::new(), &[]),
        Err(EvalError::StepLimit(100))
    );
}

#[test]
fn test_unreachable_is_an_error() {
    let mut module = Module::new("test");
    let main = EntryPointBuilder::new("main").build(&mut module).unwrap();
    let entry = module.append_block(main, "entry");
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);
    builder.unreachable().unwrap();

    assert_eq!(
        Evaluator::default().run(&module, &mut GateLogger::new(), &[]),
        Err(EvalError::Unreachable("main".to_string()))
    );
}

#[test]
fn test_tagged_record_outputs_are_no_ops() {
    let mut module = Module::new("test");
    let main = EntryPointBuilder::new("main")
        .qubits(1)
        .results(1)
        .build(&mut module)
        .unwrap();
    let tuple = module.add_global_string(b"pair");
    let tag = module.add_global_string(b"r0");
    let entry = module.append_block(main, "entry");
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);
    builder.mz(qubit(0), result(0)).unwrap();
    builder.tuple_record_output(1, tuple.into()).unwrap();
    builder.result_record_output(result(0), tag.into()).unwrap();
    builder.ret(None).unwrap();

    assert_eq!(run(&module, &[true]), vec!["m qubit[0] => out[0]"]);

    let parsed = parse_module(
        r#"
        %Qubit = type opaque

        @0 = internal constant [3 x i8] c"r0\00"

        define void @main() #0 {
        entry:
            call void @__quantum__qis__h__body(%Qubit* null)
            call void @__quantum__rt__int_record_output(i64 7, i8* getelementptr inbounds ([3 x i8], [3 x i8]* @0, i32 0, i32 0))
            ret void
        }

        declare void @__quantum__qis__h__body(%Qubit*)
        declare void @__quantum__rt__int_record_output(i64, i8*)

        attributes #0 = { "entry_point" }
        "#,
        "test_tagged_int_output",
    )
    .unwrap();
    assert_eq!(run(&parsed, &[]), vec!["h qubit[0]"]);
}
