use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emitter, Tint};
use crate::formatter::{QirFormatter, SlotTracker};
use anyhow::Result;
use qirkit_core::{BlockId, FuncId, InstId, InstKind, Module, Value};
use std::collections::HashMap;
use std::io::Write;

/// Prints a [`Module`] as LLVM assembly.
#[derive(Debug, Clone, Default)]
pub struct QirEmitter {
    config: EmitterConfig,
}

/// Textual IR of `module` with the default configuration.
pub fn print_module(module: &Module) -> Result<String> {
    QirEmitter::default().emit_to_string(module)
}

type AttributeSet = Vec<(String, Option<String>)>;

/// Attribute groups numbered `#0, #1, ...` in order of first use.
struct AttributeGroups {
    groups: Vec<AttributeSet>,
    by_function: HashMap<FuncId, usize>,
}

impl AttributeGroups {
    fn collect(module: &Module) -> Self {
        let mut groups: Vec<AttributeSet> = Vec::new();
        let mut by_function = HashMap::new();
        for func in module.functions() {
            let mut set: AttributeSet = module
                .function(func)
                .attributes()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            if set.is_empty() {
                continue;
            }
            set.sort();
            let index = match groups.iter().position(|group| *group == set) {
                Some(index) => index,
                None => {
                    groups.push(set);
                    groups.len() - 1
                }
            };
            by_function.insert(func, index);
        }
        Self {
            groups,
            by_function,
        }
    }

    fn suffix(&self, func: FuncId) -> String {
        self.by_function
            .get(&func)
            .map(|index| format!(" #{}", index))
            .unwrap_or_default()
    }

    fn format_group(set: &AttributeSet) -> String {
        set.iter()
            .map(|(key, value)| match value {
                Some(value) => format!(
                    "\"{}\"=\"{}\"",
                    QirFormatter::escape(key),
                    QirFormatter::escape(value)
                ),
                None => format!("\"{}\"", QirFormatter::escape(key)),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl QirEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Opaque struct names in order of first mention.
    fn named_types(module: &Module) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut note = |ty: &qirkit_core::Type| {
            for name in ty.named_structs() {
                if !names.iter().any(|known| known == name) {
                    names.push(name.to_string());
                }
            }
        };
        for func in module.functions() {
            let data = module.function(func);
            note(&data.signature().ret);
            for param in &data.signature().params {
                note(param);
            }
            for block in data.blocks() {
                for inst in module.block(*block).insts() {
                    if let Ok(inst) = module.inst(*inst) {
                        note(inst.ty());
                        for operand in inst.kind().operands() {
                            if let Value::Constant(constant) = operand {
                                note(constant.ty());
                            }
                        }
                    }
                }
            }
        }
        names
    }

    fn predecessors(module: &Module, func: FuncId) -> HashMap<BlockId, Vec<BlockId>> {
        let mut preds: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
        for block in module.function(func).blocks() {
            for successor in module.successors(*block) {
                let entry = preds.entry(successor).or_default();
                if !entry.contains(block) {
                    entry.push(*block);
                }
            }
        }
        preds
    }

    fn block_label(module: &Module, block: BlockId) -> String {
        QirFormatter::format_ident('%', module.block(block).name())
    }

    fn format_instruction(
        module: &Module,
        inst: InstId,
        slots: &SlotTracker,
    ) -> Result<String> {
        let data = module.inst(inst)?;
        let operand = |value: &Value| QirFormatter::format_operand(module, value, slots);
        let value = |value: &Value| QirFormatter::format_value(module, value, slots);
        let assign = slots
            .inst_slot(inst)
            .map(|slot| format!("%{} = ", slot))
            .unwrap_or_default();

        let text = match data.kind() {
            InstKind::Call { callee, args } => format!(
                "{}call {} {}({})",
                assign,
                data.ty(),
                QirFormatter::format_ident('@', module.function(*callee).name()),
                args.iter().map(operand).collect::<Vec<_>>().join(", ")
            ),
            InstKind::Binary { op, lhs, rhs } => {
                format!("{}{} {}, {}", assign, op, operand(lhs), value(rhs))
            }
            InstKind::ICmp { pred, lhs, rhs } => {
                format!("{}icmp {} {}, {}", assign, pred, operand(lhs), value(rhs))
            }
            InstKind::Cast { op, value: source } => {
                format!("{}{} {} to {}", assign, op, operand(source), data.ty())
            }
            InstKind::Br { dest } => format!("br label {}", Self::block_label(module, *dest)),
            InstKind::CondBr {
                cond,
                if_true,
                if_false,
            } => format!(
                "br {}, label {}, label {}",
                operand(cond),
                Self::block_label(module, *if_true),
                Self::block_label(module, *if_false)
            ),
            InstKind::Ret { value: None } => "ret void".to_string(),
            InstKind::Ret { value: Some(ret) } => format!("ret {}", operand(ret)),
            InstKind::Unreachable => "unreachable".to_string(),
        };
        Ok(text)
    }

    fn emit_function<W: Write>(
        &self,
        module: &Module,
        func: FuncId,
        groups: &AttributeGroups,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let data = module.function(func);
        let name = QirFormatter::format_ident('@', data.name());
        let signature = data.signature();

        if data.is_declaration() {
            let params: Vec<String> = signature.params.iter().map(|p| p.to_string()).collect();
            let line = format!(
                "declare {} {}({}){}",
                signature.ret,
                name,
                params.join(", "),
                groups.suffix(func)
            );
            return EmitHelper::write_tinted(writer, context, &line, Tint::Declaration);
        }

        let params: Vec<String> = signature
            .params
            .iter()
            .enumerate()
            .map(|(index, ty)| format!("{} %{}", ty, index))
            .collect();
        let header = format!(
            "define {} {}({}){}",
            signature.ret,
            name,
            params.join(", "),
            groups.suffix(func)
        );

        let slots = SlotTracker::for_function(module, func);
        let preds = if self.config.verbosity.should_print_predecessors() {
            Self::predecessors(module, func)
        } else {
            HashMap::new()
        };

        EmitHelper::write_braced(writer, context, &header, |w, c| {
            for (index, block) in data.blocks().iter().enumerate() {
                if index > 0 {
                    writeln!(w)?;
                }
                let label = QirFormatter::format_ident('%', module.block(*block).name());
                let comment = preds.get(block).filter(|from| !from.is_empty()).map(|from| {
                    let from: Vec<String> = from
                        .iter()
                        .map(|pred| Self::block_label(module, *pred))
                        .collect();
                    format!("preds = {}", from.join(", "))
                });
                EmitHelper::write_label(w, c, label.trim_start_matches('%'), comment.as_deref())?;
                for inst in module.block(*block).insts() {
                    let text = Self::format_instruction(module, *inst, &slots)?;
                    EmitHelper::write_line(w, c, &text)?;
                }
            }
            Ok(())
        })
    }
}

impl Emitter for QirEmitter {
    type Item = Module;

    fn emit<W: Write>(
        &self,
        module: &Module,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        if self.config.verbosity.should_print_module_id() {
            EmitHelper::write_comment(writer, context, &format!("ModuleID = '{}'", module.name()))?;
        }
        EmitHelper::write_line(
            writer,
            context,
            &format!(
                "source_filename = \"{}\"",
                QirFormatter::escape(module.source_filename())
            ),
        )?;

        let types = Self::named_types(module);
        if !types.is_empty() {
            writeln!(writer)?;
            for name in types {
                let line = format!("{} = type opaque", QirFormatter::format_ident('%', &name));
                EmitHelper::write_line(writer, context, &line)?;
            }
        }

        if module.globals().next().is_some() {
            writeln!(writer)?;
            for (id, bytes) in module.globals() {
                EmitHelper::write_line(writer, context, &QirFormatter::format_global(id, bytes))?;
            }
        }

        let groups = AttributeGroups::collect(module);
        for func in module.functions() {
            writeln!(writer)?;
            self.emit_function(module, func, &groups, writer, context)?;
        }

        if !groups.groups.is_empty() {
            writeln!(writer)?;
            for (index, group) in groups.groups.iter().enumerate() {
                let line = format!(
                    "attributes #{} = {{ {} }}",
                    index,
                    AttributeGroups::format_group(group)
                );
                EmitHelper::write_line(writer, context, &line)?;
            }
        }
        Ok(())
    }

    fn context(&self) -> EmitContext {
        EmitContext::from_config(&self.config)
    }
}
