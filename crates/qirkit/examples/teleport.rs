use qirkit::{Evaluator, GateLogger, IrBackend, QisBuilderExt, SimpleModule, TextBackend};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut simple = SimpleModule::new("teleport", 3, 2)?;
    let q = simple.qubits();
    let r = simple.results();

    simple.build(|b| {
        b.h(q[1].clone())?;
        b.cx(q[1].clone(), q[2].clone())?;
        b.cx(q[0].clone(), q[1].clone())?;
        b.h(q[0].clone())?;
        b.mz(q[0].clone(), r[0].clone())?;
        b.mz(q[1].clone(), r[1].clone())?;
        b.if_result(r[0].clone())?
            .then(|b| b.z(q[2].clone()).map(|_| ()))
            .build()?;
        b.if_result(r[1].clone())?
            .then(|b| b.x(q[2].clone()).map(|_| ()))
            .build()
    })?;

    let ir = simple.ir()?;
    println!("{}", ir);

    let module = TextBackend::default().parse_text(&ir, "teleport")?;
    for outcomes in [[false, false], [true, false], [false, true], [true, true]] {
        let mut logger = GateLogger::new();
        Evaluator::default().run(&module, &mut logger, &outcomes)?;
        println!("outcomes {:?}:", outcomes);
        print!("{}", logger);
    }
    Ok(())
}
