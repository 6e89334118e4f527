use serde_json::{Map, Value};

use crate::internal::tools::spec::ToolDefinition;

/// Restrict resolved arguments to the key set declared by the tool schema.
///
/// A strict allow-list: keys the schema does not declare are dropped
/// silently, protecting handlers from models that invent parameter names.
/// Nothing is validated or auto-filled. If the schema's `properties` cannot
/// be introspected the arguments pass through unchanged rather than failing
/// the step.
pub fn sanitize(definition: &ToolDefinition, args: Map<String, Value>) -> Map<String, Value> {
    let Some(properties) = definition
        .parameters
        .get("properties")
        .and_then(Value::as_object)
    else {
        return args;
    };

    args.into_iter()
        .filter(|(key, _)| properties.contains_key(key))
        .collect()
}
