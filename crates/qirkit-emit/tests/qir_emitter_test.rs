use pretty_assertions::assert_eq;
use qirkit_core::{
    Builder, Constant, EntryPointBuilder, IntPredicate, Module, QisBuilderExt, Signature, Type,
    Value,
};
use qirkit_emit::{print_module, Emitter, EmitterConfig, QirEmitter, VerbosityLevel};

fn qubit(id: u64) -> Value {
    Constant::qubit(id).into()
}

fn result(id: u64) -> Value {
    Constant::result(id).into()
}

fn bell() -> Module {
    let mut module = Module::new("bell");
    let main = EntryPointBuilder::new("main")
        .qubits(2)
        .results(2)
        .build(&mut module)
        .unwrap();
    let entry = module.append_block(main, "entry");
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);
    builder.h(qubit(0)).unwrap();
    builder.cx(qubit(0), qubit(1)).unwrap();
    builder.mz(qubit(0), result(0)).unwrap();
    builder.mz(qubit(1), result(1)).unwrap();
    builder.ret(None).unwrap();
    module
}

#[test]
fn test_empty_module() {
    let module = Module::new("test");
    assert_eq!(
        print_module(&module).unwrap(),
        "; ModuleID = 'test'\nsource_filename = \"test\"\n"
    );
}

#[test]
fn test_bell_circuit() {
    let expected = r#"; ModuleID = 'bell'
source_filename = "bell"

%Qubit = type opaque
%Result = type opaque

define void @main() #0 {
entry:
  call void @__quantum__qis__h__body(%Qubit* null)
  call void @__quantum__qis__cx__body(%Qubit* null, %Qubit* inttoptr (i64 1 to %Qubit*))
  call void @__quantum__qis__mz__body(%Qubit* null, %Result* null)
  call void @__quantum__qis__mz__body(%Qubit* inttoptr (i64 1 to %Qubit*), %Result* inttoptr (i64 1 to %Result*))
  ret void
}

declare void @__quantum__qis__h__body(%Qubit*)

declare void @__quantum__qis__cx__body(%Qubit*, %Qubit*)

declare void @__quantum__qis__mz__body(%Qubit*, %Result*)

attributes #0 = { "entry_point" "qir_profiles"="custom" "required_num_qubits"="2" "required_num_results"="2" }
"#;
    assert_eq!(print_module(&bell()).unwrap(), expected);
}

fn branching() -> Module {
    let mut module = Module::new("test");
    let main = EntryPointBuilder::new("main")
        .qubits(1)
        .results(1)
        .build(&mut module)
        .unwrap();
    let entry = module.append_block(main, "entry");
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);
    builder.mz(qubit(0), result(0)).unwrap();
    builder
        .if_result(result(0))
        .unwrap()
        .then(|b| b.x(qubit(0)).map(|_| ()))
        .otherwise(|b| b.y(qubit(0)).map(|_| ()))
        .build()
        .unwrap();
    builder.ret(None).unwrap();
    module
}

#[test]
fn test_if_result_branches() {
    let expected = r#"define void @main() #0 {
entry:
  call void @__quantum__qis__mz__body(%Qubit* null, %Result* null)
  %0 = call i1 @__quantum__qis__read_result__body(%Result* null)
  br i1 %0, label %then, label %else

then:
  call void @__quantum__qis__x__body(%Qubit* null)
  br label %continue

else:
  call void @__quantum__qis__y__body(%Qubit* null)
  br label %continue

continue:
  ret void
}
"#;
    let ir = print_module(&branching()).unwrap();
    assert!(ir.contains(expected), "unexpected IR:\n{}", ir);
    assert!(ir.contains("declare i1 @__quantum__qis__read_result__body(%Result*)\n"));
}

#[test]
fn test_verbose_predecessors() {
    let emitter = QirEmitter::new(EmitterConfig {
        verbosity: VerbosityLevel::Verbose,
        ..EmitterConfig::default()
    });
    let ir = emitter.emit_to_string(&branching()).unwrap();
    assert!(ir.contains(&format!("{:<50}; preds = %entry\n", "then:")));
    assert!(ir.contains(&format!("{:<50}; preds = %then, %else\n", "continue:")));
    assert!(ir.contains("\nentry:\n"));
}

#[test]
fn test_quiet_omits_module_id() {
    let emitter = QirEmitter::new(EmitterConfig {
        verbosity: VerbosityLevel::Quiet,
        ..EmitterConfig::default()
    });
    let ir = emitter.emit_to_string(&Module::new("test")).unwrap();
    assert_eq!(ir, "source_filename = \"test\"\n");
}

#[test]
fn test_params_and_integer_ops() {
    let mut module = Module::new("test");
    let f = module
        .add_function("f", Signature::new(Type::i64(), vec![Type::i64(), Type::i64()]))
        .unwrap();
    let entry = module.append_block(f, "entry");
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);
    let a = Value::Param { func: f, index: 0 };
    let b = Value::Param { func: f, index: 1 };
    let sum = builder.add(a.clone(), b).unwrap();
    let less = builder
        .icmp(IntPredicate::Slt, sum.into(), a)
        .unwrap();
    let wide = builder.zext(less.into(), Type::i64()).unwrap();
    let narrow = builder.trunc(wide.into(), Type::int(32).unwrap()).unwrap();
    let back = builder.zext(narrow.into(), Type::i64()).unwrap();
    builder.ret(Some(back.into())).unwrap();

    let expected = r#"; ModuleID = 'test'
source_filename = "test"

define i64 @f(i64 %0, i64 %1) {
entry:
  %2 = add i64 %0, %1
  %3 = icmp slt i64 %2, %0
  %4 = zext i1 %3 to i64
  %5 = trunc i64 %4 to i32
  %6 = zext i32 %5 to i64
  ret i64 %6
}
"#;
    assert_eq!(print_module(&module).unwrap(), expected);
}

#[test]
fn test_literal_arguments() {
    let mut module = Module::new("test");
    let main = EntryPointBuilder::new("main").build(&mut module).unwrap();
    let f = module
        .add_function(
            "f",
            Signature::void(vec![Type::Double, Type::bool(), Type::int(32).unwrap()]),
        )
        .unwrap();
    let entry = module.append_block(main, "entry");
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);
    builder
        .call(f, vec![23.25.into(), true.into(), (-1).into()])
        .unwrap();
    builder
        .call(f, vec![1.into(), false.into(), 0x1_0000_0005u64.into()])
        .unwrap();
    builder.rx(std::f64::consts::PI, qubit(0)).unwrap();
    builder.ret(None).unwrap();

    let ir = print_module(&module).unwrap();
    assert!(ir.contains("  call void @f(double 2.325000e+01, i1 true, i32 -1)\n"));
    assert!(ir.contains("  call void @f(double 1.000000e+00, i1 false, i32 5)\n"));
    assert!(ir.contains(
        "  call void @__quantum__qis__rx__body(double 0x400921FB54442D18, %Qubit* null)\n"
    ));
    assert!(ir.contains("declare void @f(double, i1, i32)\n"));
}

#[test]
fn test_shared_attribute_groups() {
    let mut module = Module::new("test");
    for name in ["first", "second"] {
        let func = EntryPointBuilder::new(name).build(&mut module).unwrap();
        let entry = module.append_block(func, "entry");
        let mut builder = Builder::new(&mut module);
        builder.insert_at_end(entry);
        builder.ret(None).unwrap();
    }
    let other = EntryPointBuilder::new("third")
        .qubits(5)
        .build(&mut module)
        .unwrap();
    module.set_attribute(other, "irreversible", None);

    let ir = print_module(&module).unwrap();
    assert!(ir.contains("define void @first() #0 {"));
    assert!(ir.contains("define void @second() #0 {"));
    assert!(ir.contains("declare void @third() #1\n"));
    assert!(ir.ends_with(concat!(
        "attributes #0 = { \"entry_point\" \"qir_profiles\"=\"custom\" ",
        "\"required_num_qubits\"=\"0\" \"required_num_results\"=\"0\" }\n",
        "attributes #1 = { \"entry_point\" \"irreversible\" \"qir_profiles\"=\"custom\" ",
        "\"required_num_qubits\"=\"5\" \"required_num_results\"=\"0\" }\n",
    )));
}

#[test]
fn test_tagged_record_output() {
    let mut module = Module::new("tags");
    let main = EntryPointBuilder::new("main")
        .results(1)
        .build(&mut module)
        .unwrap();
    let tag = module.add_global_string(b"some tag");
    let entry = module.append_block(main, "entry");
    let mut builder = Builder::new(&mut module);
    builder.insert_at_end(entry);
    builder.result_record_output(result(0), tag.into()).unwrap();
    builder
        .result_record_output(result(0), Constant::null(Type::label()).unwrap().into())
        .unwrap();
    builder.ret(None).unwrap();

    let expected = r#"source_filename = "tags"

%Result = type opaque

@0 = internal constant [9 x i8] c"some tag\00"

define void @main() #0 {
entry:
  call void @__quantum__rt__result_record_output(%Result* null, i8* getelementptr inbounds ([9 x i8], [9 x i8]* @0, i32 0, i32 0))
  call void @__quantum__rt__result_record_output(%Result* null, i8* null)
  ret void
}

declare void @__quantum__rt__result_record_output(%Result*, i8*)

attributes #0 = { "entry_point" "qir_profiles"="custom" "required_num_qubits"="0" "required_num_results"="1" }
"#;
    let config = EmitterConfig {
        verbosity: VerbosityLevel::Quiet,
        ..EmitterConfig::default()
    };
    assert_eq!(
        QirEmitter::new(config).emit_to_string(&module).unwrap(),
        expected
    );
}
