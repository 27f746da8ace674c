//! TSF instance attachment: imports a cloud host into a TSF cluster
//!
//! There is no describe-by-id action for cluster instances, so a read pages
//! through the cluster's listing until the instance turns up or the listing
//! runs out.

use serde_json::Value;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::AttributePath;
use tfplug::DynamicValue;

use super::{id_attribute, member};
use crate::api::tsf::{
    AddInstancesRequest, DescribeClusterInstancesRequest, RemoveInstancesRequest, ADD_INSTANCES,
    CLUSTER_INSTANCES_PAGE, DESCRIBE_CLUSTER_INSTANCES, REMOVE_INSTANCES,
};
use crate::api::{ApiCall, Service};
use crate::reconcile::{
    request_from_state, IdentityStrategy, ReconcileError, ResourceDefinition, ResourceId,
};

pub const TYPE_NAME: &str = "tencentcloud_tsf_instances_attachment";

const IDENTITY: &[&str] = &["cluster_id", "instance_id"];

/// The host already belongs to a cluster; waiting will not free it
const INSTANCE_IN_USE: &str = "ResourceInUse.InstanceHasBeenUsed";

fn computed_attributes() -> Vec<(&'static str, AttributeType, &'static str)> {
    vec![
        ("instance_name", AttributeType::String, "Instance name"),
        ("lan_ip", AttributeType::String, "Private IP"),
        ("wan_ip", AttributeType::String, "Public IP"),
        ("instance_desc", AttributeType::String, "Instance description"),
        ("cluster_name", AttributeType::String, "Cluster name"),
        ("instance_status", AttributeType::String, "Machine status"),
        ("instance_available_status", AttributeType::String, "Machine availability"),
        ("service_instance_status", AttributeType::String, "Service status on the machine"),
        ("count_in_tsf", AttributeType::Int, "1 when the machine is counted in TSF, 0 otherwise"),
        ("group_id", AttributeType::String, "Deployment group of the machine"),
        ("application_id", AttributeType::String, "Application of the machine"),
        ("application_name", AttributeType::String, "Application name"),
        ("instance_created_time", AttributeType::String, "Machine creation time"),
        ("instance_expired_time", AttributeType::String, "Machine expiry time"),
        ("instance_charge_type", AttributeType::String, "Billing mode"),
        ("instance_total_cpu", AttributeType::Float, "Total CPU"),
        ("instance_total_mem", AttributeType::Float, "Total memory"),
        ("instance_used_cpu", AttributeType::Float, "CPU in use"),
        ("instance_used_mem", AttributeType::Float, "Memory in use"),
        ("instance_limit_cpu", AttributeType::Float, "CPU limit"),
        ("instance_limit_mem", AttributeType::Float, "Memory limit"),
        ("instance_pkg_version", AttributeType::String, "Deployed package version"),
        ("cluster_type", AttributeType::String, "Cluster type"),
        ("restrict_state", AttributeType::String, "Business state"),
        ("update_time", AttributeType::String, "Update time"),
        ("operation_state", AttributeType::Int, "Execution state"),
        ("namespace_id", AttributeType::String, "Namespace id"),
        ("instance_zone_id", AttributeType::String, "Availability zone"),
        ("application_type", AttributeType::String, "Application type"),
        ("application_resource_type", AttributeType::String, "Application resource type"),
        ("service_sidecar_status", AttributeType::String, "Sidecar status"),
        ("group_name", AttributeType::String, "Deployment group name"),
        ("namespace_name", AttributeType::String, "Namespace name"),
        ("reason", AttributeType::String, "Health check reason"),
        ("agent_version", AttributeType::String, "Agent version"),
        ("node_instance_id", AttributeType::String, "Container host instance id"),
    ]
}

fn computed(name: &str, r#type: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .computed()
        .build()
}

fn import_option(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .immutable()
}

fn instance_id(id: &ResourceId) -> Result<(&str, &str), ReconcileError> {
    let parts = id.parts(IDENTITY.len())?;
    Ok((parts[0], parts[1]))
}

fn page(cluster_id: &str, offset: i64) -> Result<ApiCall, ReconcileError> {
    let request = DescribeClusterInstancesRequest {
        cluster_id: cluster_id.to_string(),
        offset,
        limit: CLUSTER_INSTANCES_PAGE,
    };
    Ok(ApiCall::new(Service::Tsf, DESCRIBE_CLUSTER_INSTANCES, &request)?)
}

fn content(response: &Value) -> &[Value] {
    response
        .pointer("/Result/Content")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[derive(Default)]
pub struct TsfInstancesAttachment;

impl ResourceDefinition for TsfInstancesAttachment {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Imports a cloud host into a TSF cluster")
            .attribute(id_attribute("`cluster_id#instance_id`"))
            .attribute(
                AttributeBuilder::new("cluster_id", AttributeType::String)
                    .description("Cluster to import into")
                    .required()
                    .immutable()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("instance_id", AttributeType::String)
                    .description("Cloud host to import")
                    .required()
                    .immutable()
                    .build(),
            )
            .attribute(import_option("os_name", "Operating system to reinstall with").build())
            .attribute(import_option("image_id", "Image to reinstall with").build())
            .attribute(
                import_option("password", "Login password for the reinstalled host")
                    .sensitive()
                    .build(),
            )
            .attribute(import_option("key_id", "Key pair for the reinstalled host").build())
            .attribute(import_option("sg_id", "Security group").build())
            .attribute(
                import_option("instance_import_mode", "R to reinstall, M to import manually")
                    .build(),
            );

        for (name, r#type, description) in computed_attributes() {
            builder = builder.attribute(computed(name, r#type, description));
        }

        builder.build()
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::Composite(IDENTITY)
    }

    fn fatal_codes(&self) -> &'static [&'static str] {
        &[INSTANCE_IN_USE]
    }

    fn create_call(&self, desired: &DynamicValue) -> Result<ApiCall, ReconcileError> {
        let mut request: AddInstancesRequest = request_from_state(desired, None)?;
        request.instance_id_list = vec![desired.get_string(&AttributePath::new("instance_id"))?];
        Ok(ApiCall::new(Service::Tsf, ADD_INSTANCES, &request)?)
    }

    /// `Result: false` means the host was not imported
    fn verify_created(&self, response: &Value) -> Result<(), ReconcileError> {
        match response.get("Result").and_then(Value::as_bool) {
            Some(true) => Ok(()),
            _ => Err(ReconcileError::Inconsistent(
                "failed to import the cloud host into the cluster".to_string(),
            )),
        }
    }

    fn read_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let (cluster_id, _) = instance_id(id)?;
        page(cluster_id, 0)
    }

    fn extract_observed(
        &self,
        id: &ResourceId,
        response: Value,
    ) -> Result<Option<Value>, ReconcileError> {
        let (_, wanted) = instance_id(id)?;
        Ok(member(response, "Result")
            .and_then(|result| member(result, "Content"))
            .and_then(|content| match content {
                Value::Array(items) => items
                    .into_iter()
                    .find(|item| item.get("InstanceId").and_then(Value::as_str) == Some(wanted)),
                _ => None,
            }))
    }

    /// Stops after an empty or short page
    fn next_read_call(
        &self,
        _id: &ResourceId,
        previous: &ApiCall,
        response: &Value,
    ) -> Result<Option<ApiCall>, ReconcileError> {
        let previous: DescribeClusterInstancesRequest =
            serde_json::from_value(previous.payload.clone())?;
        let seen = content(response).len();
        if seen == 0 || (seen as i64) < previous.limit {
            return Ok(None);
        }
        page(&previous.cluster_id, previous.offset + previous.limit).map(Some)
    }

    fn update_call(
        &self,
        _id: &ResourceId,
        _desired: &DynamicValue,
        _changed: &[&str],
    ) -> Result<Option<ApiCall>, ReconcileError> {
        Ok(None)
    }

    fn delete_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let (cluster_id, instance_id) = instance_id(id)?;
        let request = RemoveInstancesRequest {
            cluster_id: cluster_id.to_string(),
            instance_id_list: vec![instance_id.to_string()],
        };
        Ok(ApiCall::new(Service::Tsf, REMOVE_INSTANCES, &request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id() -> ResourceId {
        ResourceId::compose(&["cluster-1", "ins-2"])
    }

    fn listing(ids: &[&str]) -> Value {
        let content: Vec<Value> = ids
            .iter()
            .map(|id| json!({"InstanceId": id, "ClusterId": "cluster-1"}))
            .collect();
        json!({"Result": {"TotalCount": 100, "Content": content}})
    }

    #[test]
    fn import_sends_the_instance_as_a_list() {
        let mut desired = DynamicValue::object();
        for (name, value) in [
            ("cluster_id", "cluster-1"),
            ("instance_id", "ins-2"),
            ("instance_import_mode", "R"),
            ("password", "Secr3t!"),
        ] {
            desired
                .set_string(&AttributePath::new(name), value.to_string())
                .unwrap();
        }

        let call = TsfInstancesAttachment.create_call(&desired).unwrap();
        assert_eq!(
            call.payload,
            json!({
                "ClusterId": "cluster-1",
                "InstanceIdList": ["ins-2"],
                "InstanceImportMode": "R",
                "Password": "Secr3t!",
            })
        );
    }

    #[test]
    fn a_false_result_is_a_failed_import() {
        assert!(TsfInstancesAttachment
            .verify_created(&json!({"Result": true}))
            .is_ok());
        assert!(matches!(
            TsfInstancesAttachment.verify_created(&json!({"Result": false})),
            Err(ReconcileError::Inconsistent(_))
        ));
    }

    #[test]
    fn full_pages_lead_to_the_next_offset() {
        let first = TsfInstancesAttachment.read_call(&id()).unwrap();
        assert_eq!(
            first.payload,
            json!({"ClusterId": "cluster-1", "Offset": 0, "Limit": 20})
        );

        let full: Vec<String> = (0..20).map(|i| format!("ins-x{}", i)).collect();
        let full: Vec<&str> = full.iter().map(String::as_str).collect();
        let next = TsfInstancesAttachment
            .next_read_call(&id(), &first, &listing(&full))
            .unwrap()
            .unwrap();
        assert_eq!(
            next.payload,
            json!({"ClusterId": "cluster-1", "Offset": 20, "Limit": 20})
        );
    }

    #[test]
    fn short_or_empty_pages_end_the_search() {
        let first = TsfInstancesAttachment.read_call(&id()).unwrap();
        for ids in [vec![], vec!["ins-9"]] {
            assert!(TsfInstancesAttachment
                .next_read_call(&id(), &first, &listing(&ids))
                .unwrap()
                .is_none());
        }
    }

    #[test]
    fn picks_the_instance_out_of_the_page() {
        let found = TsfInstancesAttachment
            .extract_observed(&id(), listing(&["ins-1", "ins-2"]))
            .unwrap()
            .unwrap();
        assert_eq!(found["InstanceId"], "ins-2");

        assert!(TsfInstancesAttachment
            .extract_observed(&id(), listing(&["ins-1"]))
            .unwrap()
            .is_none());
    }

    #[test]
    fn nothing_about_an_attachment_can_change() {
        let schema = TsfInstancesAttachment.schema();
        let immutable = schema.immutable_attributes();
        for name in schema.configurable_attributes() {
            assert!(immutable.contains(&name), "{} should be immutable", name);
        }
    }
}
