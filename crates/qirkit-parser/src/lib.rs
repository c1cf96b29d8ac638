/*! Parse LLVM-style text IR back into a [`Module`].
 *
 * Round-tripping modules through text lets fixtures live in version control and lets modules
 * produced elsewhere be inspected, rewritten by passes and evaluated. The grammar covers the
 * subset `qirkit-emit` prints. Lowering goes through the ordinary [`Builder`], so a parsed module
 * obeys the same typing and termination rules as one built in code.
 */

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use qirkit_core::{
    Arg, BinaryOp, BlockId, Builder, CastOp, Constant, FuncId, GlobalId, InstId, IntPredicate,
    IrError, Module, Signature, Type, Value,
};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct QirParser;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("line {line}: {message}")]
    Invalid { line: usize, message: String },

    #[error("line {line}: {source}")]
    Ir { line: usize, source: IrError },

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

pub type ParseResult<T> = Result<T, ParseError>;

type AttributeSet = Vec<(String, Option<String>)>;

pub fn parse(input: &str) -> Result<Pairs<'_, Rule>, Box<pest::error::Error<Rule>>> {
    QirParser::parse(Rule::module, input).map_err(Box::new)
}

pub fn check(input: &str) -> bool {
    parse(input).is_ok()
}

/// Parse `input` into a module. `name` is used when the text carries no `; ModuleID` line.
pub fn parse_module(input: &str, name: &str) -> ParseResult<Module> {
    let root = parse(input)?
        .next()
        .ok_or_else(|| invalid_at(1, "empty input"))?;

    let mut module_name = name.to_string();
    let mut source_filename = None;
    let mut functions = Vec::new();
    let mut strings = Vec::new();
    let mut groups: HashMap<String, AttributeSet> = HashMap::new();

    for item in root.into_inner() {
        match item.as_rule() {
            Rule::module_id => {
                if let Some(id) = item.into_inner().next() {
                    module_name = id.as_str().to_string();
                }
            }
            Rule::source_filename => {
                let string = first_inner(item)?;
                source_filename = Some(string_value(string)?);
            }
            Rule::attribute_group => {
                let line = line_of(&item);
                let mut inner = item.into_inner();
                let reference = next_pair(&mut inner, line)?.as_str().to_string();
                let mut set = AttributeSet::new();
                for attribute in inner {
                    let line = line_of(&attribute);
                    let mut parts = attribute.into_inner();
                    let key = string_value(next_pair(&mut parts, line)?)?;
                    let value = parts.next().map(string_value).transpose()?;
                    set.push((key, value));
                }
                groups.insert(reference, set);
            }
            Rule::global_def => strings.push(lower_global(item)?),
            Rule::declaration | Rule::function_def => functions.push(item),
            _ => {}
        }
    }

    let mut module = Module::new(module_name);
    if let Some(source_filename) = source_filename {
        module.set_source_filename(source_filename);
    }

    // Globals are renumbered in definition order, so `@0`, `@1`, ... read back unchanged.
    let mut globals = HashMap::new();
    for (line, name, bytes) in strings {
        let len = bytes.len();
        let id = module.add_global(bytes);
        if globals.insert(name.clone(), (id, len)).is_some() {
            return Err(invalid_at(line, format!("redefinition of global @{}", name)));
        }
    }

    let mut bodies = Vec::new();
    for item in functions {
        let is_definition = item.as_rule() == Rule::function_def;
        let header = lower_header(item, &groups)?;
        let func = module
            .add_function(header.name.clone(), header.signature)
            .map_err(ir_at(header.line))?;
        for (key, value) in header.attributes {
            module.set_attribute(func, key, value);
        }
        if is_definition {
            bodies.push((func, header.params, header.blocks));
        }
    }

    for (func, params, blocks) in bodies {
        lower_body(&mut module, &globals, func, params, blocks)?;
    }
    Ok(module)
}

/// Parse a file, naming the module after the file stem.
pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<Module> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_module(&text, &name)
}

struct Header<'i> {
    line: usize,
    name: String,
    signature: Signature,
    attributes: AttributeSet,
    params: Vec<String>,
    blocks: Vec<Pair<'i, Rule>>,
}

fn lower_header<'i>(
    item: Pair<'i, Rule>,
    groups: &HashMap<String, AttributeSet>,
) -> ParseResult<Header<'i>> {
    let line = line_of(&item);
    let mut header = Header {
        line,
        name: String::new(),
        signature: Signature::void(vec![]),
        attributes: AttributeSet::new(),
        params: Vec::new(),
        blocks: Vec::new(),
    };
    for part in item.into_inner() {
        match part.as_rule() {
            Rule::ty => header.signature.ret = lower_type(part)?,
            Rule::global_ident => header.name = ident_name(part)?,
            Rule::param_types => {
                for ty in part.into_inner() {
                    header.signature.params.push(lower_type(ty)?);
                }
            }
            Rule::params => {
                for param in part.into_inner() {
                    let line = line_of(&param);
                    let mut inner = param.into_inner();
                    let ty = lower_type(next_pair(&mut inner, line)?)?;
                    let name = ident_name(next_pair(&mut inner, line)?)?;
                    header.signature.params.push(ty);
                    header.params.push(name);
                }
            }
            Rule::attr_ref => {
                let set = groups.get(part.as_str()).ok_or_else(|| {
                    invalid_at(line, format!("undefined attribute group {}", part.as_str()))
                })?;
                header.attributes = set.clone();
            }
            Rule::block => header.blocks.push(part),
            _ => {}
        }
    }
    Ok(header)
}

/// Names visible inside one function body.
/// `@name = ... constant [N x i8] c"..."`, checked against its declared length.
fn lower_global(pair: Pair<'_, Rule>) -> ParseResult<(usize, String, Vec<u8>)> {
    let line = line_of(&pair);
    let mut name = None;
    let mut len = None;
    let mut bytes = None;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::global_ident => name = Some(ident_name(part)?),
            Rule::byte_array => len = Some(byte_array_len(part)?),
            Rule::byte_string => bytes = Some(unescape(first_inner(part)?.as_str())),
            _ => {}
        }
    }
    let (Some(name), Some(len), Some(bytes)) = (name, len, bytes) else {
        return Err(invalid_at(line, "malformed global"));
    };
    if bytes.len() != len {
        return Err(invalid_at(
            line,
            format!(
                "global @{} is declared as [{} x i8] but holds {} bytes",
                name,
                len,
                bytes.len()
            ),
        ));
    }
    Ok((line, name, bytes))
}

fn byte_array_len(pair: Pair<'_, Rule>) -> ParseResult<usize> {
    let line = line_of(&pair);
    let len = first_inner(pair)?;
    len.as_str()
        .parse()
        .map_err(|_| invalid_at(line, format!("invalid array length {}", len.as_str())))
}

struct Scope<'g> {
    values: HashMap<String, Value>,
    labels: HashMap<String, BlockId>,
    globals: &'g HashMap<String, (GlobalId, usize)>,
}

impl Scope<'_> {
    fn value(&self, name: &str, line: usize) -> ParseResult<Value> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| invalid_at(line, format!("use of undefined value %{}", name)))
    }

    fn block(&self, name: &str, line: usize) -> ParseResult<BlockId> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| invalid_at(line, format!("use of undefined label %{}", name)))
    }

    fn global(&self, name: &str, line: usize) -> ParseResult<(GlobalId, usize)> {
        self.globals
            .get(name)
            .copied()
            .ok_or_else(|| invalid_at(line, format!("use of undefined global @{}", name)))
    }
}

fn lower_body(
    module: &mut Module,
    globals: &HashMap<String, (GlobalId, usize)>,
    func: FuncId,
    params: Vec<String>,
    blocks: Vec<Pair<'_, Rule>>,
) -> ParseResult<()> {
    let mut scope = Scope {
        values: HashMap::new(),
        labels: HashMap::new(),
        globals,
    };
    for (index, name) in params.into_iter().enumerate() {
        scope.values.insert(
            name,
            Value::Param {
                func,
                index: index as u32,
            },
        );
    }

    let mut bodies = Vec::new();
    for block in blocks {
        let line = line_of(&block);
        let mut inner = block.into_inner();
        let label = ident_name(next_pair(&mut inner, line)?)?;
        if scope.labels.contains_key(&label) {
            return Err(invalid_at(line, format!("redefinition of label %{}", label)));
        }
        let id = module.append_block(func, &label);
        scope.labels.insert(label, id);
        bodies.push((id, inner));
    }

    let mut builder = Builder::new(module);
    for (block, instructions) in bodies {
        builder.insert_at_end(block);
        for instruction in instructions {
            lower_instruction(&mut builder, &mut scope, instruction)?;
        }
    }
    Ok(())
}

fn lower_instruction(
    builder: &mut Builder<'_>,
    scope: &mut Scope,
    pair: Pair<'_, Rule>,
) -> ParseResult<()> {
    let line = line_of(&pair);
    if pair.as_rule() != Rule::assignment {
        lower_operation(builder, scope, pair)?;
        return Ok(());
    }

    let mut inner = pair.into_inner();
    let name = ident_name(next_pair(&mut inner, line)?)?;
    if scope.values.contains_key(&name) {
        return Err(invalid_at(line, format!("redefinition of value %{}", name)));
    }
    let inst = lower_operation(builder, scope, next_pair(&mut inner, line)?)?;
    if builder.module().inst(inst).map_err(ir_at(line))?.ty().is_void() {
        return Err(invalid_at(line, format!("cannot assign a void value to %{}", name)));
    }
    scope.values.insert(name, Value::Inst(inst));
    Ok(())
}

fn lower_operation(
    builder: &mut Builder<'_>,
    scope: &Scope,
    pair: Pair<'_, Rule>,
) -> ParseResult<InstId> {
    let line = line_of(&pair);
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();
    let ir = ir_at(line);

    match rule {
        Rule::call_inst => {
            let ret = lower_type(next_pair(&mut inner, line)?)?;
            let name = ident_name(next_pair(&mut inner, line)?)?;
            let callee = builder
                .module()
                .get_function(&name)
                .ok_or_else(|| invalid_at(line, format!("call to undeclared function @{}", name)))?;
            let declared = &builder.module().function(callee).signature().ret;
            if *declared != ret {
                return Err(invalid_at(
                    line,
                    format!("@{} returns {}, not {}", name, declared, ret),
                ));
            }
            let mut args = Vec::new();
            if let Some(list) = inner.next() {
                for arg in list.into_inner() {
                    args.push(Arg::from(lower_typed_value(scope, arg)?));
                }
            }
            builder.call(callee, args).map_err(ir)
        }
        Rule::binary_inst => {
            let op = next_pair(&mut inner, line)?;
            let op = BinaryOp::from_mnemonic(op.as_str())
                .ok_or_else(|| invalid_at(line, format!("unknown operation {}", op.as_str())))?;
            let ty = lower_type(next_pair(&mut inner, line)?)?;
            let lhs = lower_value(scope, &ty, next_pair(&mut inner, line)?)?;
            let rhs = lower_value(scope, &ty, next_pair(&mut inner, line)?)?;
            builder.binary(op, lhs, rhs).map_err(ir)
        }
        Rule::icmp_inst => {
            let pred = next_pair(&mut inner, line)?;
            let pred = IntPredicate::from_mnemonic(pred.as_str())
                .ok_or_else(|| invalid_at(line, format!("unknown predicate {}", pred.as_str())))?;
            let ty = lower_type(next_pair(&mut inner, line)?)?;
            let lhs = lower_value(scope, &ty, next_pair(&mut inner, line)?)?;
            let rhs = lower_value(scope, &ty, next_pair(&mut inner, line)?)?;
            builder.icmp(pred, lhs, rhs).map_err(ir)
        }
        Rule::cast_inst => {
            let op = next_pair(&mut inner, line)?;
            let op = CastOp::from_mnemonic(op.as_str())
                .ok_or_else(|| invalid_at(line, format!("unknown cast {}", op.as_str())))?;
            let value = lower_typed_value(scope, next_pair(&mut inner, line)?)?;
            let ty = lower_type(next_pair(&mut inner, line)?)?;
            builder.cast(op, value, ty).map_err(ir)
        }
        Rule::br => {
            let dest = scope.block(&ident_name(next_pair(&mut inner, line)?)?, line)?;
            builder.br(dest).map_err(ir)
        }
        Rule::br_cond => {
            let cond = lower_typed_value(scope, next_pair(&mut inner, line)?)?;
            let if_true = scope.block(&ident_name(next_pair(&mut inner, line)?)?, line)?;
            let if_false = scope.block(&ident_name(next_pair(&mut inner, line)?)?, line)?;
            builder.cond_br(cond, if_true, if_false).map_err(ir)
        }
        Rule::ret => {
            let operand = next_pair(&mut inner, line)?;
            let value = match operand.as_rule() {
                Rule::void_ty => None,
                _ => Some(lower_typed_value(scope, operand)?),
            };
            builder.ret(value).map_err(ir)
        }
        Rule::unreachable => builder.unreachable().map_err(ir),
        other => Err(invalid_at(line, format!("unexpected {:?}", other))),
    }
}

fn lower_typed_value(scope: &Scope, pair: Pair<'_, Rule>) -> ParseResult<Value> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let ty = lower_type(next_pair(&mut inner, line)?)?;
    lower_value(scope, &ty, next_pair(&mut inner, line)?)
}

fn lower_value(scope: &Scope, ty: &Type, pair: Pair<'_, Rule>) -> ParseResult<Value> {
    let line = line_of(&pair);
    let ir = ir_at(line);
    let text = pair.as_str();
    let constant = match pair.as_rule() {
        Rule::local_ident => return scope.value(&ident_name(pair)?, line),
        Rule::bool_lit if ty.is_bool() => Constant::bool(text == "true"),
        Rule::int_lit => {
            let value: i128 = text
                .parse()
                .map_err(|_| invalid_at(line, format!("integer {} out of range", text)))?;
            Constant::int_from_bits(ty, value as u128).map_err(ir)?
        }
        Rule::float_lit if *ty == Type::Double => {
            let value: f64 = text
                .parse()
                .map_err(|_| invalid_at(line, format!("invalid floating point {}", text)))?;
            Constant::double(value)
        }
        Rule::hex_float if *ty == Type::Double => {
            let bits = u64::from_str_radix(&text[2..], 16)
                .map_err(|_| invalid_at(line, format!("invalid floating point {}", text)))?;
            Constant::double(f64::from_bits(bits))
        }
        Rule::null_lit => Constant::null(ty.clone()).map_err(ir)?,
        Rule::inttoptr => {
            let mut inner = pair.into_inner();
            let _source = next_pair(&mut inner, line)?;
            let id = next_pair(&mut inner, line)?;
            let id: u64 = id
                .as_str()
                .parse()
                .map_err(|_| invalid_at(line, format!("invalid handle {}", id.as_str())))?;
            let target = lower_type(next_pair(&mut inner, line)?)?;
            if target != *ty {
                return Err(invalid_at(
                    line,
                    format!("inttoptr to {} used as {}", target, ty),
                ));
            }
            Constant::address(target, id).map_err(ir)?
        }
        Rule::global_ref => {
            let mut inner = pair.into_inner();
            let array = byte_array_len(next_pair(&mut inner, line)?)?;
            let pointee = byte_array_len(next_pair(&mut inner, line)?)?;
            let name = ident_name(next_pair(&mut inner, line)?)?;
            let (id, len) = scope.global(&name, line)?;
            if array != len || pointee != len {
                return Err(invalid_at(
                    line,
                    format!("global @{} is [{} x i8], not [{} x i8]", name, len, array),
                ));
            }
            let indices = inner.filter(|part| part.as_rule() == Rule::int_lit);
            if indices.map(|index| index.as_str()).any(|index| index != "0") {
                return Err(invalid_at(line, format!("only the start of @{} can be addressed", name)));
            }
            if *ty != Type::label() {
                return Err(invalid_at(
                    line,
                    format!("global string @{} used as {}", name, ty),
                ));
            }
            Constant::global_string(id)
        }
        _ => {
            return Err(invalid_at(
                line,
                format!("{} is not a valid {} constant", text, ty),
            ))
        }
    };
    Ok(constant.into())
}

fn lower_type(pair: Pair<'_, Rule>) -> ParseResult<Type> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let base = next_pair(&mut inner, line)?;
    let mut ty = match base.as_rule() {
        Rule::void_ty => Type::Void,
        Rule::double_ty => Type::Double,
        Rule::int_ty => {
            let width: u32 = base.as_str()[1..]
                .parse()
                .map_err(|_| invalid_at(line, format!("invalid type {}", base.as_str())))?;
            Type::int(width).map_err(ir_at(line))?
        }
        Rule::local_ident => Type::Named(ident_name(base)?),
        other => return Err(invalid_at(line, format!("unexpected {:?}", other))),
    };
    for _ in inner {
        ty = Type::ptr(ty);
    }
    Ok(ty)
}

fn ident_name(pair: Pair<'_, Rule>) -> ParseResult<String> {
    let part = first_inner(pair)?;
    match part.as_rule() {
        Rule::string => string_value(part),
        _ => Ok(part.as_str().to_string()),
    }
}

/// Contents of a quoted string with `\XX` escapes decoded.
fn string_value(pair: Pair<'_, Rule>) -> ParseResult<String> {
    let raw = first_inner(pair)?.as_str();
    Ok(String::from_utf8_lossy(&unescape(raw)).into_owned())
}

fn unescape(raw: &str) -> Vec<u8> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if let Some(byte) = raw
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn first_inner(pair: Pair<'_, Rule>) -> ParseResult<Pair<'_, Rule>> {
    let line = line_of(&pair);
    next_pair(&mut pair.into_inner(), line)
}

fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, line: usize) -> ParseResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| invalid_at(line, "malformed input"))
}

fn line_of(pair: &Pair<'_, Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

fn invalid_at(line: usize, message: impl Into<String>) -> ParseError {
    ParseError::Invalid {
        line,
        message: message.into(),
    }
}

fn ir_at(line: usize) -> impl Fn(IrError) -> ParseError {
    move |source| ParseError::Ir { line, source }
}
