//! Byte form of a [`Module`]: the arena serialized as JSON.

use crate::module::Module;
use crate::verify::{StructuralVerifier, Verifier};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed module bytes: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("stored module `{name}` is invalid: {message}")]
    Invalid { name: String, message: String },
}

pub fn to_bytes(module: &Module) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(module)
}

pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Module> {
    serde_json::from_slice(bytes)
}

/// Write the byte form of `module` to `path`.
pub fn write_snapshot(module: &Module, path: impl AsRef<Path>) -> Result<(), PersistError> {
    fs::write(path, to_bytes(module)?)?;
    Ok(())
}

/// Read a module written by [`write_snapshot`], rejecting one that fails structural checks.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<Module, PersistError> {
    let module = from_bytes(&fs::read(path)?)?;
    match StructuralVerifier.verify(&module) {
        Some(message) => Err(PersistError::Invalid {
            name: module.name().to_string(),
            message,
        }),
        None => Ok(module),
    }
}
