use crate::{
    ids::{BlockId, FuncId, InstId},
    instructions::InstKind,
    module::Module,
    types::Type,
    values::Value,
};

/// Checks a module for well-formedness, returning a description of the first problem found.
pub trait Verifier {
    fn verify(&self, module: &Module) -> Option<String>;
}

/// Structural checks: block termination, operand liveness and scope, call and return typing.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralVerifier;

impl Verifier for StructuralVerifier {
    fn verify(&self, module: &Module) -> Option<String> {
        module
            .functions()
            .find_map(|func| verify_function(module, func).err())
    }
}

type Check = std::result::Result<(), String>;

fn verify_function(module: &Module, func: FuncId) -> Check {
    let data = module.function(func);
    let signature = data.signature();
    for ty in signature.params.iter().chain([&signature.ret]) {
        valid_type(ty, data.name())?;
    }
    for block in data.blocks() {
        let block_data = module.block(*block);
        if block_data.func() != func {
            return Err(format!(
                "block `{}` is listed in `{}` but owned by another function",
                block_data.name(),
                data.name()
            ));
        }
        let Some((last, body)) = block_data.insts().split_last() else {
            return Err(format!(
                "block `{}` in function `{}` does not have a terminator",
                block_data.name(),
                data.name()
            ));
        };
        for inst in body {
            if module.inst(*inst).map(|d| d.is_terminator()).unwrap_or(false) {
                return Err(format!(
                    "terminator found in the middle of block `{}` in function `{}`",
                    block_data.name(),
                    data.name()
                ));
            }
        }
        if !module.inst(*last).map(|d| d.is_terminator()).unwrap_or(false) {
            return Err(format!(
                "block `{}` in function `{}` does not have a terminator",
                block_data.name(),
                data.name()
            ));
        }
        for inst in block_data.insts() {
            verify_inst(module, func, *block, *inst)?;
        }
    }
    Ok(())
}

fn verify_inst(module: &Module, func: FuncId, block: BlockId, inst: InstId) -> Check {
    let fname = module.function(func).name();
    let data = module
        .inst(inst)
        .map_err(|_| format!("erased instruction still linked in `{}`", fname))?;
    if data.block() != Some(block) {
        return Err(format!("instruction parent mismatch in `{}`", fname));
    }
    valid_type(data.ty(), fname)?;

    for operand in data.kind().operands() {
        verify_operand(module, func, operand)?;
    }

    match data.kind() {
        InstKind::Call { callee, args } => {
            let signature = module.function(*callee).signature();
            if args.len() != signature.params.len() {
                return Err(format!(
                    "call to `{}` in `{}` has {} arguments, expected {}",
                    module.function(*callee).name(),
                    fname,
                    args.len(),
                    signature.params.len()
                ));
            }
            for (arg, param) in args.iter().zip(&signature.params) {
                expect(module, arg, param, fname)?;
            }
            if data.ty() != &signature.ret {
                return Err(format!(
                    "call to `{}` in `{}` has result type {}, expected {}",
                    module.function(*callee).name(),
                    fname,
                    data.ty(),
                    signature.ret
                ));
            }
        }
        InstKind::CondBr { cond, .. } => expect(module, cond, &Type::bool(), fname)?,
        InstKind::Ret { value } => {
            let ret = &module.function(func).signature().ret;
            match value {
                Some(value) => expect(module, value, ret, fname)?,
                None if !ret.is_void() => {
                    return Err(format!("`{}` returns void but is declared {}", fname, ret))
                }
                None => {}
            }
        }
        InstKind::Binary { lhs, rhs, .. } | InstKind::ICmp { lhs, rhs, .. } => {
            let ty = module.value_type(lhs).map_err(|e| e.to_string())?;
            expect(module, rhs, &ty, fname)?;
        }
        InstKind::Cast { .. } | InstKind::Br { .. } | InstKind::Unreachable => {}
    }

    for target in data.kind().successors() {
        let target = module.get_block(target).map_err(|e| e.to_string())?;
        if target.func() != func {
            return Err(format!(
                "branch in `{}` targets block `{}` of another function",
                fname,
                target.name()
            ));
        }
    }
    Ok(())
}

fn verify_operand(module: &Module, func: FuncId, operand: &Value) -> Check {
    let fname = module.function(func).name();
    match operand {
        Value::Constant(constant) => {
            valid_type(constant.ty(), fname)?;
            if let Some(id) = constant.global_id() {
                module.global(id).map_err(|e| format!("{} in `{}`", e, fname))?;
                if constant.ty() != &Type::label() {
                    return Err(format!("global string in `{}` typed as {}", fname, constant.ty()));
                }
            }
            Ok(())
        }
        Value::Inst(def) => match module.inst_function(*def) {
            Ok(Some(owner)) if owner == func => Ok(()),
            Ok(Some(_)) => Err(format!(
                "operand in `{}` refers to an instruction of another function",
                fname
            )),
            Ok(None) => Err(format!(
                "operand in `{}` refers to a detached instruction",
                fname
            )),
            Err(_) => Err(format!("operand in `{}` refers to an erased instruction", fname)),
        },
        Value::Param { func: owner, index } => {
            if *owner != func {
                return Err(format!(
                    "operand in `{}` refers to a parameter of another function",
                    fname
                ));
            }
            if *index as usize >= module.function(func).signature().params.len() {
                return Err(format!("parameter {} out of range in `{}`", index, fname));
            }
            Ok(())
        }
    }
}

fn valid_type(ty: &Type, fname: &str) -> Check {
    ty.validate().map_err(|e| format!("{} in `{}`", e, fname))
}

fn expect(module: &Module, value: &Value, expected: &Type, fname: &str) -> Check {
    let ty = module.value_type(value).map_err(|e| e.to_string())?;
    if &ty != expected {
        return Err(format!(
            "type mismatch in `{}`: expected {}, got {}",
            fname, expected, ty
        ));
    }
    Ok(())
}
