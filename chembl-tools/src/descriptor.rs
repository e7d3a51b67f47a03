//! Operation descriptors advertised to the external agent.

use std::collections::HashSet;

use chembl_primitives::{OperationName, ParamSpec, ResultShape};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{RegistryError, RegistryResult};

/// Broad class of an operation, used to pick its default deadline.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationCategory {
    /// Bulk query against the remote data service.
    DataQuery,
    /// Single-value cheminformatics or status call.
    Utility,
}

/// Immutable description of a registered operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
    name: OperationName,
    description: String,
    parameters: Vec<ParamSpec>,
    returns: ResultShape,
    category: OperationCategory,
}

impl OperationDescriptor {
    /// Starts building a descriptor for the given name and result shape.
    #[must_use]
    pub fn builder(name: OperationName, returns: ResultShape) -> DescriptorBuilder {
        DescriptorBuilder {
            name,
            description: String::new(),
            parameters: Vec::new(),
            returns,
            category: OperationCategory::Utility,
        }
    }

    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &OperationName {
        &self.name
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the ordered parameter list.
    #[must_use]
    pub fn parameters(&self) -> &[ParamSpec] {
        &self.parameters
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|param| param.name() == name)
    }

    /// Returns the declared result shape.
    #[must_use]
    pub const fn returns(&self) -> ResultShape {
        self.returns
    }

    /// Returns the operation category.
    #[must_use]
    pub const fn category(&self) -> OperationCategory {
        self.category
    }

    /// Renders the parameter list as a JSON Schema object.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|param| (param.name().to_owned(), param.schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|param| param.is_required())
            .map(ParamSpec::name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

/// Builder for [`OperationDescriptor`].
#[derive(Debug)]
pub struct DescriptorBuilder {
    name: OperationName,
    description: String,
    parameters: Vec<ParamSpec>,
    returns: ResultShape,
    category: OperationCategory,
}

impl DescriptorBuilder {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the category. Defaults to [`OperationCategory::Utility`].
    #[must_use]
    pub fn category(mut self, category: OperationCategory) -> Self {
        self.category = category;
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Finalises the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidDescriptor`] if two parameters share a
    /// name.
    pub fn build(self) -> RegistryResult<OperationDescriptor> {
        let mut seen = HashSet::new();
        for param in &self.parameters {
            if !seen.insert(param.name()) {
                return Err(RegistryError::InvalidDescriptor {
                    reason: format!(
                        "parameter `{}` declared twice on `{}`",
                        param.name(),
                        self.name
                    ),
                });
            }
        }

        Ok(OperationDescriptor {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            returns: self.returns,
            category: self.category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chembl_primitives::ParamType;

    fn lookup() -> OperationDescriptor {
        OperationDescriptor::builder(
            OperationName::new("chembl_id_lookup").unwrap(),
            ResultShape::Records,
        )
        .description("Look up ChEMBL IDs")
        .category(OperationCategory::DataQuery)
        .param(ParamSpec::required("available_type", ParamType::String).unwrap())
        .param(ParamSpec::optional("q", ParamType::String).unwrap())
        .build()
        .unwrap()
    }

    #[test]
    fn input_schema_lists_required_fields() {
        let schema = lookup().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["available_type"]));
        assert_eq!(schema["properties"]["q"]["type"], "string");
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn duplicate_parameter_is_rejected() {
        let err = OperationDescriptor::builder(
            OperationName::new("dup").unwrap(),
            ResultShape::Text,
        )
        .param(ParamSpec::required("smiles", ParamType::String).unwrap())
        .param(ParamSpec::optional("smiles", ParamType::String).unwrap())
        .build()
        .expect_err("duplicate parameter");
        assert!(matches!(err, RegistryError::InvalidDescriptor { .. }));
    }

    #[test]
    fn parameter_lookup_and_category() {
        let descriptor = lookup();
        assert_eq!(descriptor.category(), OperationCategory::DataQuery);
        assert!(descriptor.parameter("q").is_some());
        assert!(descriptor.parameter("missing").is_none());
    }
}
