//! Seam to the component that prints, serializes and parses modules.

use crate::{module::Module, verify::Verifier};

/// A textual and binary codec for [`Module`]s that can also verify them.
pub trait IrBackend: Verifier {
    type Error: std::error::Error + Send + Sync + 'static;

    fn print(&self, module: &Module) -> Result<String, Self::Error>;

    fn serialize(&self, module: &Module) -> Result<Vec<u8>, Self::Error>;

    fn parse_text(&self, text: &str, name: &str) -> Result<Module, Self::Error>;

    fn parse_bytes(&self, bytes: &[u8], name: &str) -> Result<Module, Self::Error>;
}
