//! Structured error types for heatgrid.
//!
//! Pointer positions outside the grid and stale bin identities are normal
//! conditions and never surface here.

/// All errors that can occur while configuring or wiring up a heat map.
#[derive(Debug, thiserror::Error)]
pub enum HeatgridError {
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed dataset or config JSON.
    #[error("Dataset JSON: {0}")]
    Dataset(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure in the browser glue (listener registration, JS conversion).
    #[error("Binding error: {0}")]
    Binding(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HeatgridError>;

#[cfg(target_arch = "wasm32")]
impl From<HeatgridError> for wasm_bindgen::JsValue {
    fn from(e: HeatgridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
