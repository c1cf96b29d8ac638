use qirkit_core::{persist, IrBackend, Module, StructuralVerifier, Verifier};
use qirkit_emit::{Emitter, EmitterConfig, QirEmitter};
use qirkit_parser::{parse_module, ParseError};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to print module: {0}")]
    Print(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Malformed module bytes: {0}")]
    Bytes(#[from] serde_json::Error),
    #[error("Invalid module: {0}")]
    Invalid(String),
}

/// Default [`IrBackend`]: LLVM-style text for printing and parsing, JSON for the byte form.
///
/// Parsed modules are verified before they are handed back.
#[derive(Debug, Clone, Default)]
pub struct TextBackend {
    config: EmitterConfig,
}

impl TextBackend {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    fn checked(&self, module: Module) -> Result<Module, BackendError> {
        match self.verify(&module) {
            Some(message) => Err(BackendError::Invalid(message)),
            None => Ok(module),
        }
    }
}

impl Verifier for TextBackend {
    fn verify(&self, module: &Module) -> Option<String> {
        StructuralVerifier.verify(module)
    }
}

impl IrBackend for TextBackend {
    type Error = BackendError;

    fn print(&self, module: &Module) -> Result<String, BackendError> {
        QirEmitter::new(self.config.clone())
            .emit_to_string(module)
            .map_err(|e| BackendError::Print(e.to_string()))
    }

    fn serialize(&self, module: &Module) -> Result<Vec<u8>, BackendError> {
        Ok(persist::to_bytes(module)?)
    }

    fn parse_text(&self, text: &str, name: &str) -> Result<Module, BackendError> {
        debug!("parsing module `{}` from {} bytes of text", name, text.len());
        self.checked(parse_module(text, name)?)
    }

    fn parse_bytes(&self, bytes: &[u8], name: &str) -> Result<Module, BackendError> {
        let mut module = persist::from_bytes(bytes)?;
        module.set_name(name);
        self.checked(module)
    }
}
