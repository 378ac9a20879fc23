//! `persona` section: role, instructions and sampling temperature

use super::{check_range, expect_mapping, require_fields, SectionValidator};
use crate::diagnostic::Diagnostics;
use crate::value::Value;

const SECTION: &str = "persona";

/// Allowed `temperature` interval
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);

/// Validator for the `persona` section
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonaValidator;

impl SectionValidator for PersonaValidator {
    fn section(&self) -> &'static str {
        SECTION
    }

    fn validate(&self, value: &Value, diagnostics: &mut Diagnostics) {
        let Some(persona) = expect_mapping(SECTION, value, diagnostics) else {
            return;
        };
        require_fields(SECTION, None, persona, &["role", "instructions"], diagnostics);
        check_range(
            SECTION,
            "temperature",
            persona.get("temperature"),
            TEMPERATURE_RANGE,
            diagnostics,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticCode;
    use crate::value::Mapping;

    fn persona(temperature: Option<Value>) -> Value {
        let mut map = Mapping::new();
        map.insert("role".into(), Value::from("assistant"));
        map.insert("instructions".into(), Value::from("Be helpful."));
        if let Some(temperature) = temperature {
            map.insert("temperature".into(), temperature);
        }
        Value::from(map)
    }

    fn run(value: &Value) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        PersonaValidator.validate(value, &mut diagnostics);
        diagnostics
    }

    #[test]
    fn temperature_in_range() {
        assert!(run(&persona(Some(Value::from(0.7)))).is_empty());
        assert!(run(&persona(Some(Value::from(0.0)))).is_empty());
        assert!(run(&persona(Some(Value::from(2.0)))).is_empty());
        assert!(run(&persona(None)).is_empty());
    }

    #[test]
    fn temperature_out_of_range() {
        let diagnostics = run(&persona(Some(Value::from(3.0))));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.count(DiagnosticCode::InvalidRange), 1);
        assert_eq!(run(&persona(Some(Value::from(-0.1)))).count(DiagnosticCode::InvalidRange), 1);
    }

    #[test]
    fn non_numeric_temperature() {
        let diagnostics = run(&persona(Some(Value::from("warm"))));
        assert_eq!(diagnostics.count(DiagnosticCode::InvalidType), 1);
    }

    #[test]
    fn missing_role_and_instructions() {
        let diagnostics = run(&Value::from(Mapping::new()));
        assert_eq!(diagnostics.count(DiagnosticCode::MissingField), 2);
    }
}
