//! Generic forwarding adapter.
//!
//! One adapter type replaces a hand-written function per collaborator call:
//! it binds validated arguments in declared order, forwards them to a single
//! callable, and coerces the raw value into the declared [`ResultShape`].

use std::fmt;

use async_trait::async_trait;
use chembl_primitives::{ParamType, ResultShape};
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::descriptor::OperationDescriptor;
use crate::handler::{Arguments, Operation, OperationResult};

/// Future returned by a forwarding callable.
pub type ForwardFuture = BoxFuture<'static, OperationResult>;

/// Arguments in the order the descriptor declares them. Absent optional
/// parameters are skipped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundArguments(Vec<(String, Value)>);

impl BoundArguments {
    /// Consumes the binding, returning owned pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.0
    }
}

impl FromIterator<(String, Value)> for BoundArguments {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Raw collaborator value could not be read as the declared shape.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected {expected} result, got {found}")]
pub struct ShapeMismatch {
    expected: ResultShape,
    found: &'static str,
}

/// Coerces a raw collaborator value into `shape`.
///
/// # Errors
///
/// Returns [`ShapeMismatch`] when the value has no reading in that shape.
pub fn coerce(shape: ResultShape, value: Value) -> Result<Value, ShapeMismatch> {
    let mismatch = |value: &Value| ShapeMismatch {
        expected: shape,
        found: ParamType::describe(value),
    };

    if shape.accepts(&value) {
        return Ok(value);
    }

    match (shape, value) {
        (ResultShape::Text, value @ (Value::Number(_) | Value::Bool(_))) => {
            Ok(Value::String(value.to_string()))
        }
        (ResultShape::Boolean, Value::String(text)) => match text.trim() {
            "true" | "True" => Ok(Value::Bool(true)),
            "false" | "False" => Ok(Value::Bool(false)),
            _ => Err(ShapeMismatch {
                expected: shape,
                found: "string",
            }),
        },
        (ResultShape::Mapping, Value::Array(mut items))
            if items.len() == 1 && items[0].is_object() =>
        {
            Ok(items.remove(0))
        }
        (ResultShape::Records, value @ Value::Object(_)) => Ok(Value::Array(vec![value])),
        (_, value) => Err(mismatch(&value)),
    }
}

/// Adapter forwarding one operation to exactly one collaborator call.
pub struct ForwardingAdapter<F> {
    shape: ResultShape,
    arguments: Vec<String>,
    call: F,
}

impl<F> fmt::Debug for ForwardingAdapter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardingAdapter")
            .field("shape", &self.shape)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

impl<F> ForwardingAdapter<F>
where
    F: Fn(BoundArguments) -> ForwardFuture + Send + Sync,
{
    /// Creates an adapter from explicit argument names and shape.
    pub fn new<I, S>(shape: ResultShape, arguments: I, call: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            shape,
            arguments: arguments.into_iter().map(Into::into).collect(),
            call,
        }
    }

    /// Creates an adapter whose argument order and shape follow `descriptor`.
    pub fn for_descriptor(descriptor: &OperationDescriptor, call: F) -> Self {
        Self::new(
            descriptor.returns(),
            descriptor.parameters().iter().map(|param| param.name().to_owned()),
            call,
        )
    }

    fn bind(&self, mut args: Arguments) -> BoundArguments {
        self.arguments
            .iter()
            .filter_map(|name| args.remove(name).map(|value| (name.clone(), value)))
            .collect()
    }
}

#[async_trait]
impl<F> Operation for ForwardingAdapter<F>
where
    F: Fn(BoundArguments) -> ForwardFuture + Send + Sync,
{
    async fn call(&self, args: Arguments) -> OperationResult {
        let raw = (self.call)(self.bind(args)).await?;
        Ok(coerce(self.shape, raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::OperationFailure;
    use futures::FutureExt;
    use serde_json::json;

    #[test]
    fn coerces_each_shape() {
        assert_eq!(coerce(ResultShape::Text, json!("CCO")), Ok(json!("CCO")));
        assert_eq!(coerce(ResultShape::Text, json!(42)), Ok(json!("42")));
        assert_eq!(coerce(ResultShape::Boolean, json!("false")), Ok(json!(false)));
        assert_eq!(
            coerce(ResultShape::Mapping, json!([{"qed_weighted": 0.55}])),
            Ok(json!({"qed_weighted": 0.55}))
        );
        assert_eq!(
            coerce(ResultShape::Records, json!({"alert_id": 1})),
            Ok(json!([{"alert_id": 1}]))
        );
    }

    #[test]
    fn rejects_unreadable_values() {
        let err = coerce(ResultShape::Records, json!(["a", "b"])).unwrap_err();
        assert_eq!(err.to_string(), "expected records result, got array");
        assert!(coerce(ResultShape::Boolean, json!("maybe")).is_err());
        assert!(coerce(ResultShape::Mapping, json!([{}, {}])).is_err());
        assert!(coerce(ResultShape::Text, Value::Null).is_err());
    }

    #[tokio::test]
    async fn binds_in_declared_order_and_forwards_once() {
        let adapter = ForwardingAdapter::new(
            ResultShape::Records,
            ["available_type", "q"],
            |bound: BoundArguments| -> ForwardFuture {
                async move {
                    let names: Vec<String> =
                        bound.into_pairs().into_iter().map(|(name, _)| name).collect();
                    Ok(json!([{ "order": names }]))
                }
                .boxed()
            },
        );

        let mut args = Arguments::new();
        args.insert("q".into(), json!("aspirin"));
        args.insert("available_type".into(), json!("compound"));
        let value = adapter.call(args).await.unwrap();
        assert_eq!(value, json!([{ "order": ["available_type", "q"] }]));
    }

    #[tokio::test]
    async fn collaborator_errors_propagate_unmodified() {
        let adapter = ForwardingAdapter::new(
            ResultShape::Text,
            ["smiles"],
            |_bound: BoundArguments| -> ForwardFuture {
                async { Err(OperationFailure::from("upstream exploded")) }.boxed()
            },
        );
        let err = adapter.call(Arguments::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "upstream exploded");
    }
}
