//! Entry-point creation and the function attributes that describe it.

use crate::{
    ids::FuncId,
    module::Module,
    types::Signature,
    Result,
};

pub const ENTRY_POINT: &str = "entry_point";
pub const LEGACY_ENTRY_POINT: &str = "EntryPoint";
pub const REQUIRED_NUM_QUBITS: &str = "required_num_qubits";
pub const REQUIRED_NUM_RESULTS: &str = "required_num_results";
pub const QIR_PROFILES: &str = "qir_profiles";
pub const OUTPUT_LABELING_SCHEMA: &str = "output_labeling_schema";
pub const IRREVERSIBLE: &str = "irreversible";
pub const INTEROP_FRIENDLY: &str = "InteropFriendly";

const QUBIT_KEYS: [&str; 3] = ["requiredQubits", REQUIRED_NUM_QUBITS, "num_required_qubits"];
const RESULT_KEYS: [&str; 3] = ["requiredResults", REQUIRED_NUM_RESULTS, "num_required_results"];

pub fn is_entry_point(module: &Module, func: FuncId) -> bool {
    let data = module.function(func);
    data.has_attribute(ENTRY_POINT) || data.has_attribute(LEGACY_ENTRY_POINT)
}

pub fn is_irreversible(module: &Module, func: FuncId) -> bool {
    module.function(func).has_attribute(IRREVERSIBLE)
}

pub fn is_interop_friendly(module: &Module, func: FuncId) -> bool {
    module.function(func).has_attribute(INTEROP_FRIENDLY)
}

pub fn required_num_qubits(module: &Module, func: FuncId) -> Option<u64> {
    numeric_attribute(module, func, &QUBIT_KEYS)
}

pub fn required_num_results(module: &Module, func: FuncId) -> Option<u64> {
    numeric_attribute(module, func, &RESULT_KEYS)
}

fn numeric_attribute(module: &Module, func: FuncId, keys: &[&str]) -> Option<u64> {
    let data = module.function(func);
    keys.iter()
        .find_map(|key| data.attribute_value(key))
        .and_then(|value| value.parse().ok())
}

/// Every function carrying an entry-point attribute, in declaration order.
pub fn entry_points(module: &Module) -> Vec<FuncId> {
    module
        .functions()
        .filter(|func| is_entry_point(module, *func))
        .collect()
}

#[derive(Debug, Clone)]
pub struct EntryPointBuilder {
    name: String,
    required_num_qubits: u64,
    required_num_results: u64,
    qir_profiles: String,
    output_labeling_schema: Option<String>,
}

impl EntryPointBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_num_qubits: 0,
            required_num_results: 0,
            qir_profiles: "custom".to_string(),
            output_labeling_schema: None,
        }
    }

    pub fn qubits(mut self, count: u64) -> Self {
        self.required_num_qubits = count;
        self
    }

    pub fn results(mut self, count: u64) -> Self {
        self.required_num_results = count;
        self
    }

    pub fn profiles(mut self, qir_profiles: impl Into<String>) -> Self {
        self.qir_profiles = qir_profiles.into();
        self
    }

    pub fn output_labeling_schema(mut self, schema: impl Into<String>) -> Self {
        self.output_labeling_schema = Some(schema.into());
        self
    }

    /// Declare a `void()` function carrying the entry-point attributes.
    pub fn build(self, module: &mut Module) -> Result<FuncId> {
        let func = module.add_function(self.name, Signature::void(vec![]))?;
        module.set_attribute(func, ENTRY_POINT, None);
        module.set_attribute(
            func,
            REQUIRED_NUM_QUBITS,
            Some(self.required_num_qubits.to_string()),
        );
        module.set_attribute(
            func,
            REQUIRED_NUM_RESULTS,
            Some(self.required_num_results.to_string()),
        );
        module.set_attribute(func, QIR_PROFILES, Some(self.qir_profiles));
        if let Some(schema) = self.output_labeling_schema {
            module.set_attribute(func, OUTPUT_LABELING_SCHEMA, Some(schema));
        }
        Ok(func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_point_attributes() {
        let mut module = Module::new("test");
        let main = EntryPointBuilder::new("main")
            .qubits(2)
            .results(1)
            .profiles("base_profile")
            .build(&mut module)
            .unwrap();

        assert!(is_entry_point(&module, main));
        assert_eq!(required_num_qubits(&module, main), Some(2));
        assert_eq!(required_num_results(&module, main), Some(1));
        assert_eq!(
            module.function(main).attribute_value(QIR_PROFILES),
            Some("base_profile")
        );
        assert!(!module.function(main).has_attribute(OUTPUT_LABELING_SCHEMA));
    }

    #[test]
    fn test_legacy_attribute_spellings() {
        let mut module = Module::new("test");
        let main = module.add_function("main", Signature::void(vec![])).unwrap();
        assert!(!is_entry_point(&module, main));

        module.set_attribute(main, LEGACY_ENTRY_POINT, None);
        module.set_attribute(main, "requiredQubits", Some("5".to_string()));
        module.set_attribute(main, "num_required_results", Some("3".to_string()));
        module.set_attribute(main, IRREVERSIBLE, None);

        assert!(is_entry_point(&module, main));
        assert!(is_irreversible(&module, main));
        assert!(!is_interop_friendly(&module, main));
        assert_eq!(required_num_qubits(&module, main), Some(5));
        assert_eq!(required_num_results(&module, main), Some(3));
        assert_eq!(entry_points(&module), vec![main]);
    }
}
