//! TSF namespace

use serde_json::Value;
use std::collections::HashMap;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::validator::OneOfValidator;
use tfplug::DynamicValue;

use super::{id_attribute, member};
use crate::api::tsf::{
    NamespaceIdRequest, NamespaceRequest, CREATE_NAMESPACE, DELETE_NAMESPACE,
    DESCRIBE_SIMPLE_NAMESPACES, MODIFY_NAMESPACE,
};
use crate::api::{ApiCall, Service};
use crate::reconcile::{
    request_from_state, IdentityStrategy, ReconcileError, ResourceDefinition, ResourceId,
};

pub const TYPE_NAME: &str = "tencentcloud_tsf_namespace";

fn computed(name: &str, r#type: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .computed()
        .build()
}

/// Optional, filled in by the API when left unset
fn defaulted(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .computed()
}

fn cluster_type() -> AttributeType {
    let fields: HashMap<String, AttributeType> = [
        ("cluster_id", AttributeType::String),
        ("cluster_name", AttributeType::String),
        ("cluster_desc", AttributeType::String),
        ("cluster_type", AttributeType::String),
        ("vpc_id", AttributeType::String),
        ("subnet_id", AttributeType::String),
        ("cluster_status", AttributeType::String),
        ("cluster_cidr", AttributeType::String),
        ("cluster_total_cpu", AttributeType::Float),
        ("cluster_total_mem", AttributeType::Float),
        ("cluster_used_cpu", AttributeType::Float),
        ("cluster_used_mem", AttributeType::Float),
        ("instance_count", AttributeType::Int),
        ("run_instance_count", AttributeType::Int),
        ("normal_instance_count", AttributeType::Int),
        ("delete_flag", AttributeType::Bool),
        ("create_time", AttributeType::String),
        ("update_time", AttributeType::String),
        ("tsf_region_id", AttributeType::String),
        ("tsf_region_name", AttributeType::String),
        ("tsf_zone_id", AttributeType::String),
        ("tsf_zone_name", AttributeType::String),
        ("cluster_version", AttributeType::String),
    ]
    .into_iter()
    .map(|(name, ty)| (name.to_string(), ty))
    .collect();

    AttributeType::List(Box::new(AttributeType::Object(fields)))
}

#[derive(Default)]
pub struct TsfNamespace;

impl ResourceDefinition for TsfNamespace {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a TSF namespace")
            .attribute(id_attribute("Namespace id"))
            .attribute(
                AttributeBuilder::new("namespace_name", AttributeType::String)
                    .description("Namespace name")
                    .required()
                    .build(),
            )
            .attribute(defaulted("cluster_id", "Cluster id").immutable().build())
            .attribute(defaulted("namespace_desc", "Namespace description").build())
            .attribute(
                defaulted(
                    "namespace_resource_type",
                    "Namespace resource type, DEF by default",
                )
                .immutable()
                .build(),
            )
            .attribute(
                defaulted(
                    "namespace_type",
                    "DEF for a common namespace, GLOBAL for a global one",
                )
                .immutable()
                .validator(OneOfValidator::new(&["DEF", "GLOBAL"]))
                .build(),
            )
            .attribute(defaulted("namespace_id", "Namespace id to create the namespace with").immutable().build())
            .attribute(defaulted("is_ha_enable", "Whether high availability is enabled").build())
            .attribute(
                AttributeBuilder::new("program_id", AttributeType::String)
                    .description("Dataset to bind")
                    .optional()
                    .computed()
                    .immutable()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "program_id_list",
                    AttributeType::Set(Box::new(AttributeType::String)),
                )
                .description("Datasets to bind")
                .optional()
                .computed()
                .immutable()
                .build(),
            )
            .attribute(computed("kube_inject_enable", AttributeType::Bool, "KubeInjectEnable value"))
            .attribute(computed("namespace_code", AttributeType::String, "Namespace code"))
            .attribute(computed("is_default", AttributeType::String, "Whether this is the default namespace"))
            .attribute(computed("namespace_status", AttributeType::String, "Namespace status"))
            .attribute(computed("delete_flag", AttributeType::Bool, "Whether the namespace can be deleted"))
            .attribute(computed("create_time", AttributeType::String, "Creation time"))
            .attribute(computed("update_time", AttributeType::String, "Update time"))
            .attribute(computed(
                "cluster_list",
                cluster_type(),
                "Clusters the namespace spans, basic information only",
            ))
            .build()
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::ServerAssigned("/Result")
    }

    fn create_call(&self, desired: &DynamicValue) -> Result<ApiCall, ReconcileError> {
        let request: NamespaceRequest = request_from_state(desired, None)?;
        Ok(ApiCall::new(Service::Tsf, CREATE_NAMESPACE, &request)?)
    }

    fn read_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = NamespaceIdRequest {
            namespace_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Tsf, DESCRIBE_SIMPLE_NAMESPACES, &request)?)
    }

    /// `Result.Content` holds at most the one namespace asked for
    fn extract_observed(
        &self,
        _id: &ResourceId,
        response: Value,
    ) -> Result<Option<Value>, ReconcileError> {
        Ok(member(response, "Result")
            .and_then(|result| member(result, "Content"))
            .and_then(|content| match content {
                Value::Array(items) => items.into_iter().next(),
                _ => None,
            }))
    }

    fn update_call(
        &self,
        id: &ResourceId,
        desired: &DynamicValue,
        changed: &[&str],
    ) -> Result<Option<ApiCall>, ReconcileError> {
        let mut request: NamespaceRequest = request_from_state(desired, Some(changed))?;
        request.namespace_id = Some(id.to_string());
        Ok(Some(ApiCall::new(Service::Tsf, MODIFY_NAMESPACE, &request)?))
    }

    fn delete_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = NamespaceIdRequest {
            namespace_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Tsf, DELETE_NAMESPACE, &request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::flatten;
    use serde_json::json;
    use tfplug::Dynamic;

    #[test]
    fn describe_picks_the_first_content_item() {
        let response = json!({
            "Result": {"TotalCount": 1, "Content": [{"NamespaceId": "namespace-1", "NamespaceName": "dev"}]},
            "RequestId": "req-1",
        });
        let observed = TsfNamespace
            .extract_observed(&ResourceId::new("namespace-1"), response)
            .unwrap()
            .unwrap();
        assert_eq!(observed["NamespaceName"], "dev");

        let empty = json!({"Result": {"TotalCount": 0, "Content": []}});
        assert!(TsfNamespace
            .extract_observed(&ResourceId::new("namespace-1"), empty)
            .unwrap()
            .is_none());
    }

    #[test]
    fn cluster_list_conforms_to_its_object_type() {
        let raw = json!({
            "NamespaceName": "dev",
            "ClusterList": [{"ClusterId": "cluster-1", "ClusterCIDR": "10.0.0.0/16", "OperationInfo": {}}],
        });
        let Dynamic::Map(fragment) = flatten::flatten(&raw) else {
            panic!("expected an object");
        };

        let conformed = flatten::conform(&TsfNamespace.schema().block, fragment, &[]);
        let clusters = conformed["cluster_list"].as_list().unwrap();
        let cluster = clusters[0].as_map().unwrap();
        assert_eq!(cluster["cluster_cidr"], Dynamic::from("10.0.0.0/16"));
        assert!(!cluster.contains_key("operation_info"));
    }

    #[test]
    fn modify_carries_the_namespace_id() {
        let mut desired = DynamicValue::object();
        desired
            .set_string(&tfplug::AttributePath::new("namespace_desc"), "shared".to_string())
            .unwrap();
        let call = TsfNamespace
            .update_call(&ResourceId::new("namespace-1"), &desired, &["namespace_desc"])
            .unwrap()
            .unwrap();
        assert_eq!(
            call.payload,
            json!({"NamespaceId": "namespace-1", "NamespaceDesc": "shared"})
        );
    }
}
