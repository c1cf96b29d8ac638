#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Entry point to run. Required when the module has more than one.
    pub entry_point: Option<String>,
    /// Instructions executed before evaluation gives up on a looping program.
    pub max_steps: u64,
    pub max_call_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            entry_point: None,
            max_steps: 1_000_000,
            max_call_depth: 64,
        }
    }
}

impl EvaluatorConfig {
    pub fn with_entry_point(name: impl Into<String>) -> Self {
        Self {
            entry_point: Some(name.into()),
            ..Self::default()
        }
    }
}
