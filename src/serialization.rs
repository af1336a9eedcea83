use crate::model::{BuiltIn, IdlModel, Type};
use serde::ser::{Serialize, SerializeMap, Serializer};

impl Serialize for BuiltIn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A type serializes as a single-key object naming its variant:
/// `{"builtIn":"string"}`, `{"array":{..}}`, `{"mapValue":{..}}` or
/// `{"userDefined":"inc.User"}`.
impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Type::BuiltIn(builtin) => map.serialize_entry("builtIn", builtin)?,
            Type::Array(element) => map.serialize_entry("array", element)?,
            Type::Map(value) => map.serialize_entry("mapValue", value)?,
            Type::UserDefined(type_ref) => map.serialize_entry("userDefined", &type_ref.name)?,
        }
        map.end()
    }
}

pub(crate) fn to_value(model: &IdlModel) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(model)
}

pub(crate) fn to_json(model: &IdlModel) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(model)
}

pub(crate) fn to_yaml(model: &IdlModel) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;
    use serde_json::json;

    #[test]
    fn test_type_shapes() {
        let ty = Type::Map(Box::new(Type::Array(Box::new(Type::user_defined(
            "inc.User",
            Position::start_of("t.pulse"),
        )))));
        assert_eq!(
            serde_json::to_value(&ty).unwrap(),
            json!({ "mapValue": { "array": { "userDefined": "inc.User" } } })
        );
        assert_eq!(
            serde_json::to_value(Type::BuiltIn(BuiltIn::Bool)).unwrap(),
            json!({ "builtIn": "bool" })
        );
    }
}
