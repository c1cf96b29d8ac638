use crate::backend::TextBackend;
use anyhow::{anyhow, Result};
use qirkit_core::{
    BlockId, Builder, Constant, EntryPointBuilder, FuncId, InsertPoint, IrBackend, Module,
    Signature, Value,
};

/// A module with one entry point and statically allocated qubits and results.
///
/// The builder cursor starts at the end of the entry block and survives between calls to
/// [`SimpleModule::build`]. The entry block is left open while building; [`SimpleModule::ir`] and
/// [`SimpleModule::bitcode`] close it with `ret void` just long enough to verify and print.
#[derive(Debug, Clone)]
pub struct SimpleModule {
    module: Module,
    entry_point: FuncId,
    entry_block: BlockId,
    position: Option<InsertPoint>,
    num_qubits: u64,
    num_results: u64,
}

impl SimpleModule {
    pub fn new(name: impl Into<String>, num_qubits: u64, num_results: u64) -> Result<Self> {
        Self::with_entry_point(name, "main", num_qubits, num_results)
    }

    pub fn with_entry_point(
        name: impl Into<String>,
        entry_point_name: &str,
        num_qubits: u64,
        num_results: u64,
    ) -> Result<Self> {
        let mut module = Module::new(name);
        let entry_point = EntryPointBuilder::new(entry_point_name)
            .qubits(num_qubits)
            .results(num_results)
            .build(&mut module)?;
        let entry_block = module.append_block(entry_point, "entry");
        Ok(Self {
            module,
            entry_point,
            entry_block,
            position: Some(InsertPoint::End(entry_block)),
            num_qubits,
            num_results,
        })
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_module(self) -> Module {
        self.module
    }

    pub fn entry_point(&self) -> FuncId {
        self.entry_point
    }

    pub fn entry_block(&self) -> BlockId {
        self.entry_block
    }

    /// Qubit handles indexed by id.
    pub fn qubits(&self) -> Vec<Value> {
        (0..self.num_qubits)
            .map(|id| Constant::qubit(id).into())
            .collect()
    }

    /// Result handles indexed by id.
    pub fn results(&self) -> Vec<Value> {
        (0..self.num_results)
            .map(|id| Constant::result(id).into())
            .collect()
    }

    pub fn add_external_function(&mut self, name: &str, signature: Signature) -> Result<FuncId> {
        Ok(self.module.add_function(name, signature)?)
    }

    /// Null-terminated global string, usable as an output label.
    pub fn add_byte_string(&mut self, value: &[u8]) -> Value {
        self.module.add_global_string(value).into()
    }

    /// Run `f` with a builder positioned where the previous call left off.
    pub fn build<R>(
        &mut self,
        f: impl FnOnce(&mut Builder<'_>) -> qirkit_core::Result<R>,
    ) -> qirkit_core::Result<R> {
        let mut builder = Builder::new(&mut self.module);
        builder.set_position(self.position);
        let result = f(&mut builder);
        self.position = builder.position();
        result
    }

    /// Textual IR of the finished program.
    pub fn ir(&mut self) -> Result<String> {
        self.ir_with(&TextBackend::default())
    }

    pub fn ir_with<B: IrBackend>(&mut self, backend: &B) -> Result<String> {
        self.with_return(|module| Ok(backend.print(module)?), backend)
    }

    /// Byte form of the finished program.
    pub fn bitcode(&mut self) -> Result<Vec<u8>> {
        self.bitcode_with(&TextBackend::default())
    }

    pub fn bitcode_with<B: IrBackend>(&mut self, backend: &B) -> Result<Vec<u8>> {
        self.with_return(|module| Ok(backend.serialize(module)?), backend)
    }

    fn with_return<T, B: IrBackend>(
        &mut self,
        f: impl FnOnce(&Module) -> Result<T>,
        backend: &B,
    ) -> Result<T> {
        let ret = self.build(|builder| builder.ret(None))?;
        let output = match backend.verify(&self.module) {
            Some(message) => Err(anyhow!(message)),
            None => f(&self.module),
        };
        self.module.erase_inst(ret)?;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qirkit_core::{QisBuilderExt, Type};

    #[test]
    fn test_handles() {
        let simple = SimpleModule::new("test", 2, 1).unwrap();
        assert_eq!(
            simple.qubits(),
            vec![
                Value::from(Constant::qubit(0)),
                Value::from(Constant::qubit(1))
            ]
        );
        assert_eq!(simple.results().len(), 1);
        assert!(simple.module().function(simple.entry_point()).has_attribute("entry_point"));
    }

    #[test]
    fn test_ir_leaves_entry_block_open() {
        let mut simple = SimpleModule::new("test", 1, 0).unwrap();
        let q = simple.qubits()[0].clone();
        simple.build(|b| b.h(q.clone())).unwrap();

        let first = simple.ir().unwrap();
        assert!(first.contains("  call void @__quantum__qis__h__body(%Qubit* null)\n  ret void\n"));
        assert_eq!(simple.module().block(simple.entry_block()).insts().len(), 1);

        simple.build(|b| b.x(q)).unwrap();
        let second = simple.ir().unwrap();
        assert!(second.contains("@__quantum__qis__x__body(%Qubit* null)\n  ret void\n"));
    }

    #[test]
    fn test_external_function() {
        let mut simple = SimpleModule::new("test", 0, 0).unwrap();
        let f = simple
            .add_external_function("my_function", Signature::void(vec![Type::i64()]))
            .unwrap();
        simple.build(|b| b.call(f, vec![5.into()])).unwrap();
        let ir = simple.ir().unwrap();
        assert!(ir.contains("call void @my_function(i64 5)"));
        assert!(ir.contains("declare void @my_function(i64)"));
    }

    #[test]
    fn test_byte_string_label() {
        let mut simple = SimpleModule::new("test", 0, 1).unwrap();
        let r = simple.results()[0].clone();
        let tag = simple.add_byte_string(b"some tag");
        assert_eq!(simple.module().byte_string(&tag), Some(&b"some tag\0"[..]));

        simple.build(|b| b.result_record_output(r, tag)).unwrap();
        let ir = simple.ir().unwrap();
        assert!(ir.contains("@0 = internal constant [9 x i8] c\"some tag\\00\"\n"));
        assert!(ir.contains(concat!(
            "call void @__quantum__rt__result_record_output(%Result* null, ",
            "i8* getelementptr inbounds ([9 x i8], [9 x i8]* @0, i32 0, i32 0))"
        )));
    }
}
