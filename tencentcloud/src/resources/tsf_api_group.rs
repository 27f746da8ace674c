//! TSF API gateway group

use serde_json::Value;
use std::collections::HashMap;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::validator::OneOfValidator;
use tfplug::DynamicValue;

use super::{id_attribute, member};
use crate::api::tsf::{
    ApiGroupRequest, GroupIdRequest, CREATE_API_GROUP, DELETE_API_GROUP, DESCRIBE_API_GROUP,
    UPDATE_API_GROUP,
};
use crate::api::{ApiCall, Service};
use crate::reconcile::{
    request_from_state, IdentityStrategy, ReconcileError, ResourceDefinition, ResourceId,
};

pub const TYPE_NAME: &str = "tencentcloud_tsf_api_group";

const KEY_POSITIONS: &[&str] = &["path", "header", "query"];

fn optional(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .computed()
}

fn object(fields: &[(&str, AttributeType)]) -> AttributeType {
    let fields: HashMap<String, AttributeType> = fields
        .iter()
        .map(|(name, ty)| (name.to_string(), ty.clone()))
        .collect();
    AttributeType::Object(fields)
}

/// The describe result as returned, kept for outputs
fn result_attribute() -> Attribute {
    let deploy_group = object(&[
        ("deploy_group_id", AttributeType::String),
        ("deploy_group_name", AttributeType::String),
        ("application_id", AttributeType::String),
        ("application_name", AttributeType::String),
        ("application_type", AttributeType::String),
        ("group_status", AttributeType::String),
        ("cluster_type", AttributeType::String),
    ]);
    let result = object(&[
        ("group_id", AttributeType::String),
        ("group_name", AttributeType::String),
        ("group_context", AttributeType::String),
        ("auth_type", AttributeType::String),
        ("status", AttributeType::String),
        ("created_time", AttributeType::String),
        ("updated_time", AttributeType::String),
        (
            "binded_gateway_deploy_groups",
            AttributeType::List(Box::new(deploy_group)),
        ),
        ("api_count", AttributeType::Int),
        ("acl_mode", AttributeType::String),
        ("description", AttributeType::String),
        ("group_type", AttributeType::String),
        ("gateway_instance_type", AttributeType::String),
        ("gateway_instance_id", AttributeType::String),
        ("namespace_name_key", AttributeType::String),
        ("service_name_key", AttributeType::String),
        ("namespace_name_key_position", AttributeType::String),
        ("service_name_key_position", AttributeType::String),
    ]);

    AttributeBuilder::new("result", AttributeType::List(Box::new(result)))
        .description("API group information")
        .computed()
        .build()
}

#[derive(Default)]
pub struct TsfApiGroup;

impl ResourceDefinition for TsfApiGroup {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a TSF API group")
            .attribute(id_attribute("API group id"))
            .attribute(
                AttributeBuilder::new("group_name", AttributeType::String)
                    .description("Group name, cannot contain Chinese characters")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("group_context", AttributeType::String)
                    .description("Group context path")
                    .required()
                    .build(),
            )
            .attribute(
                optional("auth_type", "secret for key authentication, none for no authentication")
                    .validator(OneOfValidator::new(&["secret", "none"]))
                    .build(),
            )
            .attribute(optional("description", "Remarks").build())
            .attribute(
                optional("group_type", "ms for a microservice group, external for external APIs")
                    .immutable()
                    .validator(OneOfValidator::new(&["ms", "external"]))
                    .build(),
            )
            .attribute(optional("gateway_instance_id", "Gateway instance id").immutable().build())
            .attribute(optional("namespace_name_key", "Namespace parameter key").build())
            .attribute(optional("service_name_key", "Microservice name parameter key").build())
            .attribute(
                optional("namespace_name_key_position", "Namespace parameter position")
                    .validator(OneOfValidator::new(KEY_POSITIONS))
                    .build(),
            )
            .attribute(
                optional("service_name_key_position", "Microservice name parameter position")
                    .validator(OneOfValidator::new(KEY_POSITIONS))
                    .build(),
            )
            .attribute(result_attribute())
            .build()
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::ServerAssigned("/Result")
    }

    fn create_call(&self, desired: &DynamicValue) -> Result<ApiCall, ReconcileError> {
        let request: ApiGroupRequest = request_from_state(desired, None)?;
        Ok(ApiCall::new(Service::Tsf, CREATE_API_GROUP, &request)?)
    }

    fn read_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = GroupIdRequest {
            group_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Tsf, DESCRIBE_API_GROUP, &request)?)
    }

    /// The group's fields feed the top-level attributes; the same object is
    /// kept whole under `result`
    fn extract_observed(
        &self,
        _id: &ResourceId,
        response: Value,
    ) -> Result<Option<Value>, ReconcileError> {
        Ok(member(response, "Result").map(|result| {
            let mut observed = result.clone();
            if let Value::Object(fields) = &mut observed {
                fields.insert("Result".to_string(), result);
            }
            observed
        }))
    }

    fn update_call(
        &self,
        id: &ResourceId,
        desired: &DynamicValue,
        changed: &[&str],
    ) -> Result<Option<ApiCall>, ReconcileError> {
        let mut request: ApiGroupRequest = request_from_state(desired, Some(changed))?;
        request.group_id = Some(id.to_string());
        Ok(Some(ApiCall::new(Service::Tsf, UPDATE_API_GROUP, &request)?))
    }

    fn delete_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = GroupIdRequest {
            group_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Tsf, DELETE_API_GROUP, &request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::flatten;
    use serde_json::json;
    use tfplug::Dynamic;

    #[test]
    fn describe_fills_attributes_and_result() {
        let response = json!({
            "Result": {
                "GroupId": "grp-1",
                "GroupName": "orders",
                "GroupContext": "/orders",
                "Status": "released",
                "BindedGatewayDeployGroups": [{"DeployGroupId": "group-1", "ClusterType": "V"}],
                "ApiCount": 3,
            },
            "RequestId": "req-1",
        });

        let raw = TsfApiGroup
            .extract_observed(&ResourceId::new("grp-1"), response)
            .unwrap()
            .unwrap();
        let Dynamic::Map(fragment) = flatten::flatten(&raw) else {
            panic!("expected an object");
        };
        let observed = flatten::conform(&TsfApiGroup.schema().block, fragment, &[]);

        assert_eq!(observed["group_context"], Dynamic::from("/orders"));
        assert!(!observed.contains_key("status"));

        let result = observed["result"].as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(result["status"], Dynamic::from("released"));
        assert_eq!(result["api_count"], Dynamic::Int(3));
        let bound = result["binded_gateway_deploy_groups"].as_list().unwrap();
        assert_eq!(bound.len(), 1);
    }

    #[test]
    fn key_positions_are_validated() {
        let mut config = DynamicValue::object();
        for (name, value) in [
            ("group_name", "orders"),
            ("group_context", "/orders"),
            ("service_name_key_position", "body"),
        ] {
            config
                .set_string(&tfplug::AttributePath::new(name), value.to_string())
                .unwrap();
        }

        let diagnostics = TsfApiGroup.schema().validate(&config);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("service_name_key_position"));
    }
}
