use qirkit_core::{Constant, FuncId, GlobalId, InstId, Module, Payload, Value};
use std::collections::HashMap;

/// Slot numbers for the unnamed values of one function: parameters first, then every
/// instruction with a non-void result in layout order.
pub struct SlotTracker {
    params: u32,
    insts: HashMap<InstId, u32>,
}

impl SlotTracker {
    pub fn for_function(module: &Module, func: FuncId) -> Self {
        let data = module.function(func);
        let params = data.signature().params.len() as u32;
        let mut next = params;
        let mut insts = HashMap::new();
        for block in data.blocks() {
            for inst in module.block(*block).insts() {
                let produces_value = module
                    .inst(*inst)
                    .map(|inst| !inst.ty().is_void())
                    .unwrap_or(false);
                if produces_value {
                    insts.insert(*inst, next);
                    next += 1;
                }
            }
        }
        Self { params, insts }
    }

    pub fn inst_slot(&self, inst: InstId) -> Option<u32> {
        self.insts.get(&inst).copied()
    }

    pub fn param_slot(&self, index: u32) -> Option<u32> {
        (index < self.params).then_some(index)
    }
}

pub struct QirFormatter;

impl QirFormatter {
    /// `@name` or `%name`, quoted when `name` is not a plain identifier.
    pub fn format_ident(sigil: char, name: &str) -> String {
        let plain = !name.is_empty()
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '$' | '.' | '_'));
        if plain {
            format!("{}{}", sigil, name)
        } else {
            format!("{}\"{}\"", sigil, Self::escape(name))
        }
    }

    pub fn escape(text: &str) -> String {
        Self::escape_bytes(text.as_bytes())
    }

    /// Escape `"`, `\` and non-printable bytes as `\XX`.
    pub fn escape_bytes(bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        for &byte in bytes {
            if byte == b'"' || byte == b'\\' || !(0x20..0x7f).contains(&byte) {
                out.push_str(&format!("\\{:02X}", byte));
            } else {
                out.push(byte as char);
            }
        }
        out
    }

    /// Exponent form with six fraction digits when it reads back exactly, otherwise the raw
    /// IEEE bits in hex.
    pub fn format_double(value: f64) -> String {
        if value.is_finite() {
            let text = format!("{:.6e}", value);
            if let Some((mantissa, exponent)) = text.split_once('e') {
                if let Ok(exponent) = exponent.parse::<i32>() {
                    let sign = if exponent < 0 { '-' } else { '+' };
                    let text = format!("{}e{}{:02}", mantissa, sign, exponent.abs());
                    let exact = text
                        .parse::<f64>()
                        .map(|parsed| parsed.to_bits() == value.to_bits())
                        .unwrap_or(false);
                    if exact {
                        return text;
                    }
                }
            }
        }
        format!("0x{:016X}", value.to_bits())
    }

    /// `[N x i8]`, the array type of a global byte string.
    pub fn byte_array_type(len: usize) -> String {
        format!("[{} x i8]", len)
    }

    /// Module-level definition line of a global byte string.
    pub fn format_global(id: GlobalId, bytes: &[u8]) -> String {
        format!(
            "@{} = internal constant {} c\"{}\"",
            id.as_u32(),
            Self::byte_array_type(bytes.len()),
            Self::escape_bytes(bytes)
        )
    }

    pub fn format_constant(module: &Module, constant: &Constant) -> String {
        match constant.payload() {
            Payload::Int(_) => match constant.as_bool() {
                Some(value) => value.to_string(),
                None => constant
                    .as_signed()
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "<badref>".to_string()),
            },
            Payload::Float(bits) => Self::format_double(f64::from_bits(bits)),
            Payload::Null => "null".to_string(),
            Payload::Address(id) => format!("inttoptr (i64 {} to {})", id, constant.ty()),
            Payload::Global(id) => match module.global(id) {
                Ok(bytes) => {
                    let array = Self::byte_array_type(bytes.len());
                    format!(
                        "getelementptr inbounds ({}, {}* @{}, i32 0, i32 0)",
                        array,
                        array,
                        id.as_u32()
                    )
                }
                Err(_) => "<badref>".to_string(),
            },
        }
    }

    pub fn format_value(module: &Module, value: &Value, slots: &SlotTracker) -> String {
        let slot = match value {
            Value::Constant(constant) => return Self::format_constant(module, constant),
            Value::Inst(inst) => slots.inst_slot(*inst),
            Value::Param { index, .. } => slots.param_slot(*index),
        };
        match slot {
            Some(slot) => format!("%{}", slot),
            None => "%<badref>".to_string(),
        }
    }

    /// `<type> <value>`, the form operands take in call and branch position.
    pub fn format_operand(module: &Module, value: &Value, slots: &SlotTracker) -> String {
        let ty = module
            .value_type(value)
            .map(|ty| ty.to_string())
            .unwrap_or_else(|_| "<badref>".to_string());
        format!("{} {}", ty, Self::format_value(module, value, slots))
    }
}
