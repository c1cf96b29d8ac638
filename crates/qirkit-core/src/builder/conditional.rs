use super::{Builder, InsertPoint};
use crate::{ids::BlockId, values::Value, IrError, Result};
use tracing::debug;

type Arm<'a, 'm> = Box<dyn FnOnce(&mut Builder<'m>) -> Result<()> + 'a>;

/// Lowers `if cond { then } else { otherwise }` into a diamond that rejoins at a `continue` block.
///
/// Only the `continue` block is always created; an omitted arm gets no block and its edge of the
/// conditional branch goes straight to `continue`. When the cursor sits in the middle of a block,
/// the instructions from the cursor onwards move into `continue`.
pub struct IfBuilder<'a, 'm> {
    builder: &'a mut Builder<'m>,
    cond: Value,
    then: Option<Arm<'a, 'm>>,
    otherwise: Option<Arm<'a, 'm>>,
}

impl<'a, 'm> IfBuilder<'a, 'm> {
    pub fn then(mut self, arm: impl FnOnce(&mut Builder<'m>) -> Result<()> + 'a) -> Self {
        self.then = Some(Box::new(arm));
        self
    }

    pub fn otherwise(mut self, arm: impl FnOnce(&mut Builder<'m>) -> Result<()> + 'a) -> Self {
        self.otherwise = Some(Box::new(arm));
        self
    }

    pub fn build(self) -> Result<()> {
        let IfBuilder {
            builder,
            cond,
            then,
            otherwise,
        } = self;

        let point = builder.position.ok_or(IrError::NoInsertionPoint)?;
        let ty = builder.module.value_type(&cond)?;
        if !ty.is_bool() {
            return Err(IrError::TypeMismatch(format!(
                "branch condition must be i1, got {}",
                ty
            )));
        }
        let (head, _) = builder.module.resolve(point)?;
        if matches!(point, InsertPoint::End(_)) && builder.module.is_terminated(head) {
            return Err(IrError::Builder(format!(
                "block `{}` is already terminated",
                builder.module.block(head).name()
            )));
        }

        let func = builder.module.block(head).func();
        let then_block = then
            .as_ref()
            .map(|_| builder.module.append_block(func, "then"));
        let else_block = otherwise
            .as_ref()
            .map(|_| builder.module.append_block(func, "else"));
        let continue_block = match point {
            InsertPoint::End(_) => builder.module.append_block(func, "continue"),
            InsertPoint::Before(anchor) => builder.module.split_block(anchor, "continue")?,
        };
        debug!(
            head = %builder.module.block(head).name(),
            then = then_block.is_some(),
            otherwise = else_block.is_some(),
            "lowering conditional"
        );

        builder.insert_at_end(head);
        builder.cond_br(
            cond,
            then_block.unwrap_or(continue_block),
            else_block.unwrap_or(continue_block),
        )?;

        let mut outcome = Ok(());
        for (block, arm) in [(then_block, then), (else_block, otherwise)] {
            if let (Some(block), Some(arm)) = (block, arm) {
                builder.insert_at_end(block);
                if outcome.is_ok() {
                    outcome = arm(&mut *builder);
                }
                builder.close_arm(block, continue_block)?;
            }
        }

        builder.position = Some(match point {
            InsertPoint::End(_) => InsertPoint::End(continue_block),
            InsertPoint::Before(anchor) => InsertPoint::Before(anchor),
        });
        outcome
    }
}

impl<'m> Builder<'m> {
    /// Start lowering a conditional on the `i1` value `cond` at the cursor.
    pub fn if_(&mut self, cond: Value) -> IfBuilder<'_, 'm> {
        IfBuilder {
            builder: self,
            cond,
            then: None,
            otherwise: None,
        }
    }

    /// Branch to `continue_block` from wherever the arm left the cursor, unless it already ends.
    fn close_arm(&mut self, arm: BlockId, continue_block: BlockId) -> Result<()> {
        let tail = self.current_block().unwrap_or(arm);
        if !self.module.is_terminated(tail) {
            self.insert_at_end(tail);
            self.br(continue_block)?;
        }
        Ok(())
    }
}
