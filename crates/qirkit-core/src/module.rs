use crate::{
    builder::InsertPoint,
    ids::{BlockId, FuncId, GlobalId, InstId},
    instructions::{InstData, InstKind},
    types::{Signature, Type},
    values::{Constant, Value},
    IrError, Result,
};
use cranelift_entity::PrimaryMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::trace;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionData {
    name: String,
    signature: Signature,
    blocks: Vec<BlockId>,
    attributes: IndexMap<String, Option<String>>,
}

impl FunctionData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Blocks in layout order; the first one is the entry block.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        self.blocks.first().copied()
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn attributes(&self) -> &IndexMap<String, Option<String>> {
        &self.attributes
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Value of a `"key"="value"` attribute. Flag attributes have no value.
    pub fn attribute_value(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|value| value.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockData {
    name: String,
    func: FuncId,
    insts: Vec<InstId>,
}

impl BlockData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn func(&self) -> FuncId {
        self.func
    }

    pub fn insts(&self) -> &[InstId] {
        &self.insts
    }
}

/// Owns every function, block and instruction of one compilation unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    name: String,
    source_filename: String,
    functions: PrimaryMap<FuncId, FunctionData>,
    blocks: PrimaryMap<BlockId, BlockData>,
    insts: SlotMap<InstId, InstData>,
    #[serde(default)]
    globals: PrimaryMap<GlobalId, Vec<u8>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source_filename: name.clone(),
            name,
            functions: PrimaryMap::new(),
            blocks: PrimaryMap::new(),
            insts: SlotMap::with_key(),
            globals: PrimaryMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn source_filename(&self) -> &str {
        &self.source_filename
    }

    pub fn set_source_filename(&mut self, source_filename: impl Into<String>) {
        self.source_filename = source_filename.into();
    }

    /// Add a null-terminated copy of `value` as a module constant and return an `i8*` to it.
    pub fn add_global_string(&mut self, value: &[u8]) -> Constant {
        let mut bytes = value.to_vec();
        bytes.push(0);
        Constant::global_string(self.add_global(bytes))
    }

    /// Add a global with exactly `bytes` as its initializer.
    pub fn add_global(&mut self, bytes: Vec<u8>) -> GlobalId {
        let id = self.globals.push(bytes);
        trace!(global = %id, len = self.globals[id].len(), "added global");
        id
    }

    pub fn global(&self, id: GlobalId) -> Result<&[u8]> {
        self.globals
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| IrError::NotFound(format!("{:?} in module `{}`", id, self.name)))
    }

    pub fn globals(&self) -> impl Iterator<Item = (GlobalId, &[u8])> + '_ {
        self.globals.iter().map(|(id, bytes)| (id, bytes.as_slice()))
    }

    /// Initializer bytes behind a global string constant, trailing NUL included.
    /// `None` for `null` and every other value.
    pub fn byte_string(&self, value: &Value) -> Option<&[u8]> {
        let id = value.as_constant()?.global_id()?;
        self.global(id).ok()
    }

    pub fn add_function(&mut self, name: impl Into<String>, signature: Signature) -> Result<FuncId> {
        let name = name.into();
        if self.get_function(&name).is_some() {
            return Err(IrError::Builder(format!(
                "function `{}` is already defined",
                name
            )));
        }
        Ok(self.functions.push(FunctionData {
            name,
            signature,
            blocks: Vec::new(),
            attributes: IndexMap::new(),
        }))
    }

    /// Look up `name`, declaring it with `signature` if it does not exist yet.
    pub fn get_or_declare(&mut self, name: &str, signature: Signature) -> Result<FuncId> {
        match self.get_function(name) {
            Some(func) if self.functions[func].signature == signature => Ok(func),
            Some(func) => Err(IrError::TypeMismatch(format!(
                "`{}` is declared as {}, not {}",
                name, self.functions[func].signature, signature
            ))),
            None => self.add_function(name, signature),
        }
    }

    pub fn get_function(&self, name: &str) -> Option<FuncId> {
        self.functions
            .iter()
            .find(|(_, data)| data.name == name)
            .map(|(func, _)| func)
    }

    /// Functions in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = FuncId> + '_ {
        self.functions.keys()
    }

    pub fn function(&self, func: FuncId) -> &FunctionData {
        &self.functions[func]
    }

    /// An empty value is stored as a flag attribute.
    pub fn set_attribute(&mut self, func: FuncId, key: impl Into<String>, value: Option<String>) {
        let value = value.filter(|value| !value.is_empty());
        self.functions[func].attributes.insert(key.into(), value);
    }

    pub fn append_block(&mut self, func: FuncId, name: &str) -> BlockId {
        let block = self.new_block(func, name);
        self.functions[func].blocks.push(block);
        block
    }

    /// Create a block laid out immediately before `sibling`.
    pub fn insert_block_before(&mut self, func: FuncId, name: &str, sibling: BlockId) -> Result<BlockId> {
        let target = self
            .functions
            .get(func)
            .ok_or_else(|| IrError::NotFound(format!("{:?} in module `{}`", func, self.name)))?;
        let sibling_data = self.get_block(sibling)?;
        if sibling_data.func != func {
            return Err(IrError::Ownership(format!(
                "block `{}` belongs to `{}`, not `{}`",
                sibling_data.name, self.functions[sibling_data.func].name, target.name
            )));
        }
        let index = self.layout_index(sibling);
        let block = self.new_block(func, name);
        self.functions[func].blocks.insert(index, block);
        Ok(block)
    }

    fn new_block(&mut self, func: FuncId, name: &str) -> BlockId {
        let name = self.unique_block_name(func, name);
        trace!(function = %self.functions[func].name, block = %name, "created block");
        self.blocks.push(BlockData {
            name,
            func,
            insts: Vec::new(),
        })
    }

    fn unique_block_name(&self, func: FuncId, name: &str) -> String {
        let base = if name.is_empty() { "block" } else { name };
        let taken = |candidate: &str| {
            self.functions[func]
                .blocks
                .iter()
                .any(|block| self.blocks[*block].name == candidate)
        };
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|suffix| format!("{}{}", base, suffix))
            .find(|candidate| !taken(candidate.as_str()))
            .unwrap_or_else(|| base.to_string())
    }

    fn layout_index(&self, block: BlockId) -> usize {
        let func = self.blocks[block].func;
        self.functions[func]
            .blocks
            .iter()
            .position(|candidate| *candidate == block)
            .unwrap_or(self.functions[func].blocks.len())
    }

    pub fn block(&self, block: BlockId) -> &BlockData {
        &self.blocks[block]
    }

    /// Checked form of [`Module::block`] for ids that may not come from this module.
    pub fn get_block(&self, block: BlockId) -> Result<&BlockData> {
        self.blocks
            .get(block)
            .ok_or_else(|| IrError::NotFound(format!("{:?} in module `{}`", block, self.name)))
    }

    pub fn terminator(&self, block: BlockId) -> Option<InstId> {
        let last = *self.blocks[block].insts.last()?;
        self.insts[last].is_terminator().then_some(last)
    }

    pub fn is_terminated(&self, block: BlockId) -> bool {
        self.terminator(block).is_some()
    }

    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        self.terminator(block)
            .map(|term| self.insts[term].kind.successors())
            .unwrap_or_default()
    }

    pub fn inst(&self, inst: InstId) -> Result<&InstData> {
        self.insts
            .get(inst)
            .ok_or_else(|| IrError::DanglingValue(format!("{:?} has been erased", inst)))
    }

    /// Live and linked into some block.
    pub fn is_attached(&self, inst: InstId) -> bool {
        self.insts
            .get(inst)
            .map(|data| data.block.is_some())
            .unwrap_or(false)
    }

    pub fn value_type(&self, value: &Value) -> Result<Type> {
        match value {
            Value::Constant(constant) => Ok(constant.ty().clone()),
            Value::Inst(inst) => Ok(self.inst(*inst)?.ty.clone()),
            Value::Param { func, index } => self
                .functions
                .get(*func)
                .and_then(|data| data.signature.params.get(*index as usize))
                .cloned()
                .ok_or_else(|| IrError::NotFound(format!("parameter {} of {}", index, func))),
        }
    }

    pub(crate) fn create_inst(&mut self, kind: InstKind, ty: Type) -> InstId {
        self.insts.insert(InstData {
            kind,
            ty,
            block: None,
        })
    }

    /// Link a detached instruction at `point`.
    pub(crate) fn link_inst(&mut self, inst: InstId, point: InsertPoint) -> Result<()> {
        if self.inst(inst)?.block.is_some() {
            return Err(IrError::Builder(format!(
                "{:?} is already attached to a block",
                inst
            )));
        }
        let (block, index) = self.resolve(point)?;
        self.blocks[block].insts.insert(index, inst);
        self.insts[inst].block = Some(block);
        Ok(())
    }

    /// Block and position an instruction inserted at `point` would occupy.
    pub(crate) fn resolve(&self, point: InsertPoint) -> Result<(BlockId, usize)> {
        match point {
            InsertPoint::End(block) => Ok((block, self.get_block(block)?.insts.len())),
            InsertPoint::Before(anchor) => {
                let block = self
                    .insts
                    .get(anchor)
                    .and_then(|data| data.block)
                    .ok_or(IrError::NoInsertionPoint)?;
                let index = self.position_in_block(block, anchor)?;
                Ok((block, index))
            }
        }
    }

    fn position_in_block(&self, block: BlockId, inst: InstId) -> Result<usize> {
        self.blocks[block]
            .insts
            .iter()
            .position(|candidate| *candidate == inst)
            .ok_or_else(|| {
                IrError::Builder(format!(
                    "{:?} is not linked into block `{}`",
                    inst, self.blocks[block].name
                ))
            })
    }

    /// Unlink `inst` from its block and free it. Later uses of the id fail as dangling.
    pub fn erase_inst(&mut self, inst: InstId) -> Result<()> {
        self.unlink(inst)?;
        self.insts.remove(inst);
        Ok(())
    }

    /// Unlink `inst` from its block but keep it alive for re-insertion.
    pub fn remove_inst(&mut self, inst: InstId) -> Result<()> {
        self.unlink(inst)
    }

    fn unlink(&mut self, inst: InstId) -> Result<()> {
        if let Some(block) = self.inst(inst)?.block {
            let index = self.position_in_block(block, inst)?;
            self.blocks[block].insts.remove(index);
            self.insts[inst].block = None;
        }
        Ok(())
    }

    /// Move `at` and everything after it into a new block appended to the same function.
    pub fn split_block(&mut self, at: InstId, name: &str) -> Result<BlockId> {
        let block = self
            .inst(at)?
            .block
            .ok_or_else(|| IrError::Builder(format!("{:?} is not attached to a block", at)))?;
        let index = self.position_in_block(block, at)?;
        let func = self.blocks[block].func;
        let tail = self.append_block(func, name);
        let moved = self.blocks[block].insts.split_off(index);
        for inst in &moved {
            self.insts[*inst].block = Some(tail);
        }
        self.blocks[tail].insts = moved;
        Ok(tail)
    }

    /// Function that contains `inst`, if it is attached.
    pub fn inst_function(&self, inst: InstId) -> Result<Option<FuncId>> {
        Ok(self.inst(inst)?.block.map(|block| self.blocks[block].func))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_with_main() -> (Module, FuncId) {
        let mut module = Module::new("test");
        let main = module.add_function("main", Signature::void(vec![])).unwrap();
        (module, main)
    }

    #[test]
    fn test_block_names_are_unique() {
        let (mut module, main) = module_with_main();
        let a = module.append_block(main, "then");
        let b = module.append_block(main, "then");
        let c = module.append_block(main, "");
        assert_eq!(module.block(a).name(), "then");
        assert_eq!(module.block(b).name(), "then1");
        assert_eq!(module.block(c).name(), "block");
    }

    #[test]
    fn test_insert_block_before_sibling() {
        let (mut module, main) = module_with_main();
        let entry = module.append_block(main, "entry");
        let exit = module.append_block(main, "exit");
        let middle = module.insert_block_before(main, "middle", exit).unwrap();
        assert_eq!(module.function(main).blocks(), &[entry, middle, exit]);
    }

    #[test]
    fn test_insert_block_before_foreign_sibling() {
        let (mut module, main) = module_with_main();
        let other = module.add_function("other", Signature::void(vec![])).unwrap();
        let foreign = module.append_block(other, "entry");
        let err = module.insert_block_before(main, "b", foreign).unwrap_err();
        assert!(matches!(err, IrError::Ownership(_)));
        assert!(module.function(main).is_declaration());
    }

    #[test]
    fn test_block_of_another_module() {
        let (mut module, main) = module_with_main();
        module.append_block(main, "entry");
        let (mut other, other_main) = module_with_main();
        for name in ["a", "b", "c"] {
            other.append_block(other_main, name);
        }
        let stranger = *other.function(other_main).blocks().last().unwrap();

        assert!(matches!(module.get_block(stranger), Err(IrError::NotFound(_))));
        assert!(matches!(
            module.insert_block_before(main, "x", stranger),
            Err(IrError::NotFound(_))
        ));
        let inst = module.create_inst(InstKind::Unreachable, Type::Void);
        assert!(matches!(
            module.link_inst(inst, InsertPoint::End(stranger)),
            Err(IrError::NotFound(_))
        ));
        assert_eq!(module.function(main).blocks().len(), 1);
    }

    #[test]
    fn test_global_strings() {
        let mut module = Module::new("labels");
        let tag = module.add_global_string(b"some tag");
        let other = module.add_global_string(b"");

        assert_eq!(tag.ty(), &Type::label());
        assert_eq!(module.byte_string(&tag.clone().into()), Some(&b"some tag\0"[..]));
        assert_eq!(module.byte_string(&other.into()), Some(&b"\0"[..]));
        let null = Constant::null(Type::label()).unwrap();
        assert_eq!(module.byte_string(&null.into()), None);
        assert_eq!(module.globals().count(), 2);

        let id = tag.global_id().unwrap();
        assert!(Module::new("empty").global(id).is_err());
    }

    #[test]
    fn test_erased_instruction_is_dangling() {
        let (mut module, main) = module_with_main();
        let entry = module.append_block(main, "entry");
        let inst = module.create_inst(InstKind::Ret { value: None }, Type::Void);
        module.link_inst(inst, InsertPoint::End(entry)).unwrap();
        assert!(module.is_terminated(entry));

        module.erase_inst(inst).unwrap();
        assert!(!module.is_terminated(entry));
        assert!(matches!(module.inst(inst), Err(IrError::DanglingValue(_))));
        assert!(matches!(
            module.value_type(&Value::Inst(inst)),
            Err(IrError::DanglingValue(_))
        ));
    }

    #[test]
    fn test_duplicate_function_name() {
        let (mut module, _) = module_with_main();
        assert!(module.add_function("main", Signature::void(vec![])).is_err());
        let declared = module
            .get_or_declare("f", Signature::void(vec![Type::qubit()]))
            .unwrap();
        assert_eq!(
            module
                .get_or_declare("f", Signature::void(vec![Type::qubit()]))
                .unwrap(),
            declared
        );
        assert!(matches!(
            module.get_or_declare("f", Signature::void(vec![])),
            Err(IrError::TypeMismatch(_))
        ));
    }
}
