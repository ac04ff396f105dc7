//! Parameter descriptors and the parameter injector.
//!
//! The injector binds a node's configuration element to an operator:
//! either through the operator's own conversion (when it declares the
//! capability) or through the default converter, which matches config
//! children to declared parameter descriptors by name.

use log::debug;

use crate::error::OperatorError;
use crate::model::graph::ConfigElement;
use crate::operator::Operator;

/// A typed parameter value produced by the default converter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            ParamValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Value space of a declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Float { min: f64, max: f64 },
    Integer { min: i64, max: i64 },
    Boolean,
    Text,
    Choice { options: Vec<String> },
}

/// One entry of an operator's declared parameter schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: String,
    pub label: String,
    pub kind: ParamKind,
    pub default: ParamValue,
}

impl ParamDescriptor {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        kind: ParamKind,
        default: ParamValue,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            default,
        }
    }

    /// Parse a raw string value against this descriptor's kind.
    pub fn parse(&self, raw: &str) -> Result<ParamValue, OperatorError> {
        match &self.kind {
            ParamKind::Float { min, max } => {
                let value: f64 = raw.parse().map_err(|_| self.injection_error(raw))?;
                if value < *min || value > *max {
                    return Err(OperatorError::ParameterInjection(format!(
                        "parameter '{}': value {} outside [{}, {}]",
                        self.name, value, min, max
                    )));
                }
                Ok(ParamValue::Number(value))
            }
            ParamKind::Integer { min, max } => {
                let value: i64 = raw.parse().map_err(|_| self.injection_error(raw))?;
                if value < *min || value > *max {
                    return Err(OperatorError::ParameterInjection(format!(
                        "parameter '{}': value {} outside [{}, {}]",
                        self.name, value, min, max
                    )));
                }
                Ok(ParamValue::Integer(value))
            }
            ParamKind::Boolean => {
                let value: bool = raw.parse().map_err(|_| self.injection_error(raw))?;
                Ok(ParamValue::Boolean(value))
            }
            ParamKind::Text => Ok(ParamValue::Text(raw.to_string())),
            ParamKind::Choice { options } => {
                if !options.iter().any(|o| o == raw) {
                    return Err(OperatorError::ParameterInjection(format!(
                        "parameter '{}': '{}' is not one of {:?}",
                        self.name, raw, options
                    )));
                }
                Ok(ParamValue::Text(raw.to_string()))
            }
        }
    }

    fn injection_error(&self, raw: &str) -> OperatorError {
        OperatorError::ParameterInjection(format!(
            "parameter '{}': cannot parse '{}'",
            self.name, raw
        ))
    }
}

/// Bind a node's configuration to an operator instance.
///
/// A missing configuration is a no-op: the operator keeps its defaults.
pub fn inject_parameters(
    operator: &mut dyn Operator,
    config: Option<&ConfigElement>,
) -> Result<(), OperatorError> {
    let Some(config) = config else {
        return Ok(());
    };
    if operator.capabilities().custom_parameter_conversion {
        return operator
            .configure(config)
            .map_err(|e| OperatorError::ParameterInjection(e.to_string()));
    }
    apply_default_conversion(operator, config)
}

fn apply_default_conversion(
    operator: &mut dyn Operator,
    config: &ConfigElement,
) -> Result<(), OperatorError> {
    let descriptors = operator.parameters();
    for child in &config.children {
        let Some(descriptor) = descriptors.iter().find(|d| d.name == child.name) else {
            debug!("Skipping undeclared parameter '{}'", child.name);
            continue;
        };
        let Some(raw) = child.value.as_deref() else {
            continue;
        };
        let value = descriptor.parse(raw)?;
        operator.set_parameter(&descriptor.name, &value)?;
    }
    Ok(())
}
