use famgraph_core::{FamGraphError, Result};
use neo4rs::{Node, Relation, Row};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Normalize one driver row into a plain JSON object.
///
/// Scalar columns come through as native JSON values. Node and relationship
/// columns are flattened into their property maps, augmented with `_labels`
/// (nodes), `_type` (relationships) and `_id`, so downstream consumers never
/// see driver wrapper types. Collections are handled recursively by the
/// driver's own deserializer.
pub fn normalize_row(row: &Row) -> Result<Value> {
    let generic: Value = row
        .to::<Value>()
        .map_err(|e| FamGraphError::Database(format!("row decode failed: {e}")))?;

    let Value::Object(fields) = generic else {
        return Ok(generic);
    };

    let mut out = Map::with_capacity(fields.len());
    for (key, value) in fields {
        // Wrapper metadata is only recoverable from the raw column, so probe
        // for node/relationship shapes before falling back to the generic value.
        if let Ok(node) = row.get::<Node>(&key) {
            out.insert(key, flatten_node(&node));
        } else if let Ok(rel) = row.get::<Relation>(&key) {
            out.insert(key, flatten_relation(&rel));
        } else {
            out.insert(key, value);
        }
    }

    Ok(Value::Object(out))
}

fn flatten_node(node: &Node) -> Value {
    let mut map = match node.to::<Value>() {
        Ok(Value::Object(props)) => props,
        _ => Map::new(),
    };
    map.insert(
        "_labels".to_string(),
        Value::Array(
            node.labels()
                .iter()
                .map(|l| Value::String(l.to_string()))
                .collect(),
        ),
    );
    map.insert("_id".to_string(), Value::from(node.id()));
    Value::Object(map)
}

fn flatten_relation(rel: &Relation) -> Value {
    let mut map = match rel.to::<Value>() {
        Ok(Value::Object(props)) => props,
        _ => Map::new(),
    };
    map.insert("_type".to_string(), Value::String(rel.typ().to_string()));
    map.insert("_id".to_string(), Value::from(rel.id()));
    Value::Object(map)
}

/// Decode normalized rows into typed result structs. Unknown fields are
/// ignored so catalog queries can evolve without breaking older consumers.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(FamGraphError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use famgraph_core::Person;

    #[test]
    fn decode_rows_tolerates_missing_optional_fields() {
        let rows = vec![serde_json::json!({
            "id": "p1",
            "tenantId": "fam-1",
            "name": "Kim",
            "role": "parent"
        })];
        let people: Vec<Person> = decode_rows(rows).unwrap();
        assert_eq!(people[0].name, "Kim");
        assert!(people[0].skills.is_empty());
    }

    #[test]
    fn decode_rows_surfaces_shape_errors() {
        let rows = vec![serde_json::json!({ "name": 42 })];
        let result: Result<Vec<Person>> = decode_rows(rows);
        assert!(result.is_err());
    }
}
