//! The validation entry point and the engine seam
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::Schema;
use crate::validation::builtin::BuiltInEngine;
use crate::validation::conformant::ConformantEngine;
use crate::validation::error::ValidationResult;
use crate::validation::settings::{Engine, ValidationSettings};
use serde_json::Value;

/// Decides whether a value conforms to a schema
pub trait ValidationEngine {
    /// Short name used in log events
    fn name(&self) -> &'static str;

    /// Validate `value` against `schema`
    fn validate(&self, schema: &Schema, value: &Value, settings: &ValidationSettings) -> ValidationResult<()>;
}

/// The engine implementing a selection
pub fn engine_for(engine: Engine) -> &'static dyn ValidationEngine {
    match engine {
        Engine::BuiltIn => &BuiltInEngine,
        Engine::Conformant => &ConformantEngine,
    }
}

impl Schema {
    /// Validate a value with the engine selected in `settings`
    pub fn validate_value(&self, value: &Value, settings: &ValidationSettings) -> ValidationResult<()> {
        engine_for(settings.engine()).validate(self, value, settings)
    }
}

/// Validate a value against a schema
pub fn validate(schema: &Schema, value: &Value, settings: &ValidationSettings) -> ValidationResult<()> {
    schema.validate_value(value, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_engine_selection() {
        assert_eq!(engine_for(Engine::BuiltIn).name(), "built-in");
        assert_eq!(engine_for(Engine::Conformant).name(), "conformant");
    }

    #[test]
    fn test_validate_value_dispatches() {
        let schema = Schema::new_string().with_max_length(3);
        for engine in [Engine::BuiltIn, Engine::Conformant] {
            let settings = ValidationSettings::new().with_engine(engine);
            assert!(schema.validate_value(&json!("abc"), &settings).is_ok());
            assert!(validate(&schema, &json!("abcd"), &settings).is_err());
        }
    }
}
