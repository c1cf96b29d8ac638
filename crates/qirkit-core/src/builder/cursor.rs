use super::Builder;
use crate::{
    ids::{BlockId, InstId},
    instructions::InstKind,
    types::Type,
    IrError, Result,
};
use serde::{Deserialize, Serialize};

/// Where the next instruction goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsertPoint {
    End(BlockId),
    /// Immediately before the anchor. The anchor stays put, so repeated appends keep their order.
    Before(InstId),
}

impl<'m> Builder<'m> {
    pub fn position(&self) -> Option<InsertPoint> {
        self.position
    }

    pub fn insert_at_end(&mut self, block: BlockId) {
        self.position = Some(InsertPoint::End(block));
    }

    pub fn insert_before(&mut self, inst: InstId) -> Result<()> {
        self.module.inst(inst)?;
        self.position = Some(InsertPoint::Before(inst));
        Ok(())
    }

    pub fn set_position(&mut self, point: Option<InsertPoint>) {
        self.position = point;
    }

    pub fn clear_position(&mut self) {
        self.position = None;
    }

    /// Block the cursor currently points into.
    pub fn current_block(&self) -> Option<BlockId> {
        match self.position? {
            InsertPoint::End(block) => Some(block),
            InsertPoint::Before(anchor) => self.module.inst(anchor).ok()?.block(),
        }
    }

    /// Create an instruction and link it at the cursor.
    pub fn append(&mut self, kind: InstKind, ty: Type) -> Result<InstId> {
        let point = self.position.ok_or(IrError::NoInsertionPoint)?;
        self.check_insertion(point, kind.is_terminator())?;
        let inst = self.module.create_inst(kind, ty);
        self.module.link_inst(inst, point)?;
        Ok(inst)
    }

    /// Link a detached instruction, such as one taken out with `Module::remove_inst`, at the cursor.
    pub fn insert_existing(&mut self, inst: InstId) -> Result<()> {
        let point = self.position.ok_or(IrError::NoInsertionPoint)?;
        let is_terminator = self.module.inst(inst)?.is_terminator();
        self.check_insertion(point, is_terminator)?;
        self.module.link_inst(inst, point)
    }

    fn check_insertion(&self, point: InsertPoint, is_terminator: bool) -> Result<()> {
        let (block, index) = self.module.resolve(point)?;
        let len = self.module.block(block).insts().len();
        if index == len && self.module.is_terminated(block) {
            return Err(IrError::Builder(format!(
                "block `{}` is already terminated",
                self.module.block(block).name()
            )));
        }
        if is_terminator && index != len {
            return Err(IrError::Builder(format!(
                "terminator must be the last instruction of block `{}`",
                self.module.block(block).name()
            )));
        }
        Ok(())
    }
}
