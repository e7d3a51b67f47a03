//! Argument validation against a descriptor's parameter list.

use chembl_primitives::ParamType;
use serde_json::Value;

use crate::descriptor::OperationDescriptor;
use crate::error::{ArgumentProblem, InvocationError};
use crate::handler::Arguments;

/// Checks `args` against the descriptor, returning the argument mapping.
///
/// `null` stands for "no arguments". A `null` value for an optional parameter
/// is dropped rather than treated as mistyped.
pub(crate) fn validate_arguments(
    descriptor: &OperationDescriptor,
    args: Value,
) -> Result<Arguments, InvocationError> {
    let mut args = match args {
        Value::Null => Arguments::new(),
        Value::Object(map) => map,
        other => {
            return Err(invalid(
                descriptor,
                vec![ArgumentProblem::NotAnObject {
                    found: ParamType::describe(&other),
                }],
            ));
        }
    };

    let mut problems = Vec::new();
    let mut dropped = Vec::new();
    for param in descriptor.parameters() {
        match args.get(param.name()) {
            None => {
                if param.is_required() {
                    problems.push(ArgumentProblem::Missing {
                        field: param.name().to_owned(),
                    });
                }
            }
            Some(Value::Null) if !param.is_required() => dropped.push(param.name()),
            Some(value) if !param.kind().matches(value) => {
                problems.push(ArgumentProblem::Mistyped {
                    field: param.name().to_owned(),
                    expected: param.kind(),
                    found: ParamType::describe(value),
                });
            }
            Some(_) => {}
        }
    }

    for name in dropped {
        args.remove(name);
    }

    problems.extend(
        args.keys()
            .filter(|key| descriptor.parameter(key).is_none())
            .map(|key| ArgumentProblem::Unexpected { field: key.clone() }),
    );

    if problems.is_empty() {
        Ok(args)
    } else {
        Err(invalid(descriptor, problems))
    }
}

fn invalid(descriptor: &OperationDescriptor, problems: Vec<ArgumentProblem>) -> InvocationError {
    InvocationError::InvalidArguments {
        operation: descriptor.name().as_str().to_owned(),
        problems,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chembl_primitives::{OperationName, ParamSpec, ResultShape};
    use serde_json::json;

    fn organism() -> OperationDescriptor {
        OperationDescriptor::builder(OperationName::new("organism").unwrap(), ResultShape::Records)
            .param(ParamSpec::required("tax_id", ParamType::Integer).unwrap())
            .param(ParamSpec::optional("limit", ParamType::Integer).unwrap())
            .build()
            .unwrap()
    }

    fn problems(result: Result<Arguments, InvocationError>) -> Vec<ArgumentProblem> {
        match result {
            Err(InvocationError::InvalidArguments { problems, .. }) => problems,
            other => panic!("expected invalid arguments, got {other:?}"),
        }
    }

    #[test]
    fn accepts_matching_arguments() {
        let args = validate_arguments(&organism(), json!({"tax_id": 9606})).unwrap();
        assert_eq!(args.get("tax_id"), Some(&json!(9606)));
    }

    #[test]
    fn null_optional_is_dropped() {
        let args =
            validate_arguments(&organism(), json!({"tax_id": 9606, "limit": null})).unwrap();
        assert!(!args.contains_key("limit"));
    }

    #[test]
    fn reports_missing_mistyped_and_extra_fields() {
        let found = problems(validate_arguments(
            &organism(),
            json!({"limit": "ten", "species": "human"}),
        ));
        assert_eq!(
            found,
            vec![
                ArgumentProblem::Missing {
                    field: "tax_id".into()
                },
                ArgumentProblem::Mistyped {
                    field: "limit".into(),
                    expected: ParamType::Integer,
                    found: "string",
                },
                ArgumentProblem::Unexpected {
                    field: "species".into()
                },
            ]
        );
    }

    #[test]
    fn null_payload_means_no_arguments() {
        let found = problems(validate_arguments(&organism(), Value::Null));
        assert_eq!(
            found,
            vec![ArgumentProblem::Missing {
                field: "tax_id".into()
            }]
        );
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let found = problems(validate_arguments(&organism(), json!([9606])));
        assert_eq!(found, vec![ArgumentProblem::NotAnObject { found: "array" }]);
    }
}
