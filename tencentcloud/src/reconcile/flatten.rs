//! Response to state translation
//!
//! `flatten` turns an API object into a `Dynamic` tree with snake_case keys,
//! `conform` trims that tree to what a schema declares, and `merge_non_null`
//! folds it into locally known state without clearing fields the API left
//! out. All three are pure.

use serde_json::Value;
use std::collections::HashMap;
use tfplug::schema::{AttributeType, Block, NestedBlock};
use tfplug::Dynamic;

/// `ClusterCIDR` -> `cluster_cidr`, `Mp4Param` -> `mp4_param`
pub fn pascal_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Converts a JSON response fragment; null object fields are dropped
pub fn flatten(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::Null,
        Value::Bool(b) => Dynamic::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Dynamic::Int(i),
            None => Dynamic::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Dynamic::String(s.clone()),
        Value::Array(items) => Dynamic::List(items.iter().map(flatten).collect()),
        Value::Object(fields) => Dynamic::Map(
            fields
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (pascal_to_snake(k), flatten(v)))
                .collect(),
        ),
    }
}

/// Keeps the keys `block` declares, renaming first via `renames`
/// (`(flattened_key, attribute_name)` pairs), and coerces values to the
/// declared types. Values that cannot be coerced are dropped.
pub fn conform(
    block: &Block,
    fragment: HashMap<String, Dynamic>,
    renames: &[(&str, &str)],
) -> HashMap<String, Dynamic> {
    let mut out = HashMap::new();

    for (key, value) in fragment {
        let name = renames
            .iter()
            .find(|(from, _)| *from == key)
            .map(|(_, to)| to.to_string())
            .unwrap_or(key);

        let conformed = if let Some(attr) = block.attribute(&name) {
            conform_value(&attr.r#type, value)
        } else if let Some(nested) = block.nested_block(&name) {
            conform_block(nested, value)
        } else {
            None
        };

        if let Some(value) = conformed {
            out.insert(name, value);
        }
    }

    out
}

fn conform_block(nested: &NestedBlock, value: Dynamic) -> Option<Dynamic> {
    match value {
        Dynamic::Map(inner) => Some(Dynamic::List(vec![Dynamic::Map(conform(
            &nested.block,
            inner,
            &[],
        ))])),
        Dynamic::List(items) => Some(Dynamic::List(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Dynamic::Map(inner) => Some(Dynamic::Map(conform(&nested.block, inner, &[]))),
                    _ => None,
                })
                .collect(),
        )),
        _ => None,
    }
}

fn conform_value(ty: &AttributeType, value: Dynamic) -> Option<Dynamic> {
    match (ty, value) {
        (_, Dynamic::Null) => Some(Dynamic::Null),
        (AttributeType::String, Dynamic::String(s)) => Some(Dynamic::String(s)),
        (AttributeType::String, Dynamic::Int(i)) => Some(Dynamic::String(i.to_string())),
        (AttributeType::String, Dynamic::Float(f)) => Some(Dynamic::String(f.to_string())),
        (AttributeType::String, Dynamic::Bool(b)) => Some(Dynamic::String(b.to_string())),
        (AttributeType::Int, v @ (Dynamic::Int(_) | Dynamic::Float(_))) => {
            v.as_i64().map(Dynamic::Int)
        }
        (AttributeType::Int, Dynamic::String(s)) => s.parse().ok().map(Dynamic::Int),
        (AttributeType::Float, v @ (Dynamic::Int(_) | Dynamic::Float(_))) => {
            v.as_f64().map(Dynamic::Float)
        }
        (AttributeType::Bool, Dynamic::Bool(b)) => Some(Dynamic::Bool(b)),
        (AttributeType::List(inner), Dynamic::List(items))
        | (AttributeType::Set(inner), Dynamic::List(items)) => Some(Dynamic::List(
            items
                .into_iter()
                .filter_map(|item| conform_value(inner, item))
                .collect(),
        )),
        // a single object where a list of objects is declared
        (AttributeType::List(inner), Dynamic::Map(fields))
        | (AttributeType::Set(inner), Dynamic::Map(fields))
            if matches!(**inner, AttributeType::Object(_)) =>
        {
            conform_value(inner, Dynamic::Map(fields)).map(|v| Dynamic::List(vec![v]))
        }
        (AttributeType::Map(inner), Dynamic::Map(entries)) => Some(Dynamic::Map(
            entries
                .into_iter()
                .filter_map(|(k, v)| conform_value(inner, v).map(|v| (k, v)))
                .collect(),
        )),
        (AttributeType::Object(fields), Dynamic::Map(entries)) => Some(Dynamic::Map(
            entries
                .into_iter()
                .filter_map(|(k, v)| {
                    let field = fields.get(&k)?;
                    conform_value(field, v).map(|v| (k, v))
                })
                .collect(),
        )),
        (ty, other) => {
            tracing::trace!(
                "dropping {} value where {} is declared",
                other.type_name(),
                ty.name()
            );
            None
        }
    }
}

/// Folds `observed` into `local`: null observed values keep the local value,
/// objects merge key by key, lists of objects with an unchanged length merge
/// element by element, anything else is replaced
pub fn merge_non_null(local: &mut Dynamic, observed: Dynamic) {
    match (local, observed) {
        (_, Dynamic::Null) => {}
        (Dynamic::Map(local), Dynamic::Map(observed)) => {
            for (key, value) in observed {
                match local.get_mut(&key) {
                    Some(slot) => merge_non_null(slot, value),
                    None if value.is_null() => {}
                    None => {
                        local.insert(key, value);
                    }
                }
            }
        }
        (Dynamic::List(local), Dynamic::List(observed))
            if local.len() == observed.len()
                && local.iter().chain(observed.iter()).all(|v| matches!(v, Dynamic::Map(_))) =>
        {
            for (slot, value) in local.iter_mut().zip(observed) {
                merge_non_null(slot, value);
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tfplug::schema::{AttributeBuilder, NestedBlockBuilder, NestingMode, SchemaBuilder};

    fn map(value: Dynamic) -> HashMap<String, Dynamic> {
        match value {
            Dynamic::Map(m) => m,
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn snake_case_handles_acronyms_and_digits() {
        assert_eq!(pascal_to_snake("TemplateId"), "template_id");
        assert_eq!(pascal_to_snake("ClusterCIDR"), "cluster_cidr");
        assert_eq!(pascal_to_snake("Mp4Param"), "mp4_param");
        assert_eq!(pascal_to_snake("AiAsrInputIndexList"), "ai_asr_input_index_list");
        assert_eq!(pascal_to_snake("VpcId"), "vpc_id");
        assert_eq!(pascal_to_snake("LanIp"), "lan_ip");
    }

    #[test]
    fn repeated_group_yields_one_map_per_element_with_only_non_null_fields() {
        let response = json!({
            "Content": [
                {"InstanceId": "ins-1", "LanIp": "10.0.0.1", "WanIp": null},
                {"InstanceId": "ins-2", "LanIp": null, "WanIp": null},
                {"InstanceId": "ins-3", "LanIp": "10.0.0.3", "WanIp": "1.1.1.3"},
            ]
        });

        let flat = map(flatten(&response));
        let content = flat["content"].as_list().unwrap();

        assert_eq!(content.len(), 3);
        let sizes: Vec<usize> = content
            .iter()
            .map(|item| item.as_map().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 1, 3]);
        assert_eq!(
            content[0].as_map().unwrap()["instance_id"],
            Dynamic::from("ins-1")
        );
        assert!(!content[1].as_map().unwrap().contains_key("lan_ip"));
    }

    #[test]
    fn flatten_is_deterministic() {
        let response = json!({"TemplateId": 12, "Ratio": 0.5, "Enabled": true});
        assert_eq!(flatten(&response), flatten(&response));
        let flat = map(flatten(&response));
        assert_eq!(flat["template_id"], Dynamic::Int(12));
        assert_eq!(flat["ratio"], Dynamic::Float(0.5));
    }

    #[test]
    fn conform_wraps_objects_into_declared_blocks_and_drops_unknown_keys() {
        let schema = SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("template_name", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("template_id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("flv_param")
                    .nesting(NestingMode::List)
                    .max_items(1)
                    .attribute(
                        AttributeBuilder::new("record_interval", AttributeType::Int)
                            .optional()
                            .build(),
                    )
                    .build(),
            )
            .build();

        let fragment = map(flatten(&json!({
            "TemplateName": "record",
            "TemplateId": 1001,
            "CreateTime": "2024-01-01 00:00:00",
            "FlvParam": {"RecordInterval": 1800, "StorageMode": "normal"},
        })));

        let conformed = conform(&schema.block, fragment, &[]);

        assert_eq!(conformed.len(), 3);
        assert_eq!(conformed["template_id"], Dynamic::from("1001"));
        let flv = conformed["flv_param"].as_list().unwrap();
        assert_eq!(flv.len(), 1);
        let flv = flv[0].as_map().unwrap();
        assert_eq!(flv.len(), 1);
        assert_eq!(flv["record_interval"], Dynamic::Int(1800));
    }

    #[test]
    fn conform_applies_renames() {
        let schema = SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("group_desc", AttributeType::String)
                    .optional()
                    .build(),
            )
            .build();

        let fragment = map(flatten(&json!({"Description": "web tier"})));
        let conformed = conform(&schema.block, fragment, &[("description", "group_desc")]);

        assert_eq!(conformed["group_desc"], Dynamic::from("web tier"));
    }

    #[test]
    fn merge_keeps_local_values_the_api_omits() {
        let mut local = Dynamic::Map(HashMap::from([
            ("alias".to_string(), Dynamic::from("blue")),
            ("group_desc".to_string(), Dynamic::from("old")),
        ]));
        let observed = Dynamic::Map(HashMap::from([
            ("group_desc".to_string(), Dynamic::from("new")),
            ("alias".to_string(), Dynamic::Null),
            ("group_status".to_string(), Dynamic::from("Running")),
        ]));

        merge_non_null(&mut local, observed);

        let local = map(local);
        assert_eq!(local["alias"], Dynamic::from("blue"));
        assert_eq!(local["group_desc"], Dynamic::from("new"));
        assert_eq!(local["group_status"], Dynamic::from("Running"));
    }

    #[test]
    fn merge_recurses_into_same_length_object_lists() {
        let mut local = Dynamic::List(vec![Dynamic::Map(HashMap::from([
            ("input_stream_name".to_string(), Dynamic::from("a")),
            ("input_url".to_string(), Dynamic::from("rtmp://push/a")),
        ]))]);
        let observed = Dynamic::List(vec![Dynamic::Map(HashMap::from([(
            "input_stream_name".to_string(),
            Dynamic::from("a"),
        )]))]);

        merge_non_null(&mut local, observed);

        let item = local.as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(item["input_url"], Dynamic::from("rtmp://push/a"));
    }

    #[test]
    fn merge_replaces_lists_whose_length_changed() {
        let mut local = Dynamic::List(vec![Dynamic::Int(1), Dynamic::Int(2)]);
        merge_non_null(&mut local, Dynamic::List(vec![Dynamic::Int(3)]));
        assert_eq!(local, Dynamic::List(vec![Dynamic::Int(3)]));
    }

    #[test]
    fn merge_fills_unknown_values() {
        let mut local = Dynamic::Map(HashMap::from([(
            "create_time".to_string(),
            Dynamic::Unknown,
        )]));
        merge_non_null(
            &mut local,
            Dynamic::Map(HashMap::from([(
                "create_time".to_string(),
                Dynamic::from("2024-01-01"),
            )])),
        );
        assert_eq!(map(local)["create_time"], Dynamic::from("2024-01-01"));
    }
}
