//! TSF container deployment group

use serde_json::Value;
use tfplug::schema::{
    Attribute, AttributeBuilder, AttributeType, NestedBlockBuilder, Schema, SchemaBuilder,
};
use tfplug::validator::OneOfValidator;
use tfplug::DynamicValue;

use super::{id_attribute, member};
use crate::api::tsf::{
    ContainGroupRequest, GroupIdRequest, CREATE_CONTAIN_GROUP, DELETE_CONTAINER_GROUP,
    DESCRIBE_CONTAINER_GROUP_DETAIL, MODIFY_CONTAINER_GROUP,
};
use crate::api::{ApiCall, Service};
use crate::reconcile::{
    request_from_state, IdentityStrategy, ReconcileError, ResourceDefinition, ResourceId,
};

pub const TYPE_NAME: &str = "tencentcloud_tsf_contain_group";

fn computed_attributes() -> Vec<(&'static str, AttributeType, &'static str)> {
    vec![
        ("group_id", AttributeType::String, "Group id"),
        ("current_num", AttributeType::Int, "Number of running instances"),
        ("create_time", AttributeType::String, "Creation time"),
        ("server", AttributeType::String, "Image registry server"),
        ("reponame", AttributeType::String, "Image repository name"),
        ("tag_name", AttributeType::String, "Image tag"),
        ("cluster_name", AttributeType::String, "Cluster name"),
        ("namespace_name", AttributeType::String, "Namespace name"),
        ("lb_ip", AttributeType::String, "Load balancer IP"),
        ("application_type", AttributeType::String, "Application type"),
        ("cluster_ip", AttributeType::String, "Service cluster IP"),
        ("application_name", AttributeType::String, "Application name"),
        ("message", AttributeType::String, "Latest deployment message"),
        ("status", AttributeType::String, "Group status"),
        ("microservice_type", AttributeType::String, "Microservice type"),
        ("instance_count", AttributeType::Int, "Number of instances"),
        ("updated_time", AttributeType::Int, "Update timestamp"),
        ("max_surge", AttributeType::String, "Pods allowed above the desired count during a rollout"),
        ("max_unavailable", AttributeType::String, "Pods allowed to be unavailable during a rollout"),
    ]
}

fn computed(name: &str, r#type: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .computed()
        .build()
}

fn fixed(name: &str, r#type: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .required()
        .immutable()
        .build()
}

/// Optional resource quota, fixed once the group exists
fn quota(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .immutable()
        .build()
}

/// Optional, filled in by the API when left unset
fn defaulted(name: &str, r#type: AttributeType, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .optional()
        .computed()
}

#[derive(Default)]
pub struct TsfContainGroup;

impl ResourceDefinition for TsfContainGroup {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Manages a TSF container deployment group")
            .attribute(id_attribute("Group id"))
            .attribute(fixed("application_id", AttributeType::String, "Application the group belongs to"))
            .attribute(fixed("namespace_id", AttributeType::String, "Namespace the group belongs to"))
            .attribute(fixed("group_name", AttributeType::String, "Group name, up to 60 characters"))
            .attribute(fixed("instance_num", AttributeType::Int, "Number of instances"))
            .attribute(fixed("cluster_id", AttributeType::String, "Cluster the group runs in"))
            .attribute(
                AttributeBuilder::new("access_type", AttributeType::Int)
                    .description("0 public network, 1 inside the cluster, 2 NodePort")
                    .required()
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("protocol_ports")
                    .description("Service port mappings")
                    .required()
                    .attribute(
                        AttributeBuilder::new("protocol", AttributeType::String)
                            .description("TCP or UDP")
                            .required()
                            .validator(OneOfValidator::new(&["TCP", "UDP"]))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("port", AttributeType::Int)
                            .description("Service port")
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("target_port", AttributeType::Int)
                            .description("Container port")
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("node_port", AttributeType::Int)
                            .description("Host port, assigned by the cluster when unset")
                            .optional()
                            .computed()
                            .build(),
                    )
                    .build(),
            )
            .attribute(quota("cpu_limit", "Maximum CPU cores"))
            .attribute(quota("mem_limit", "Maximum memory in MiB"))
            .attribute(quota("group_comment", "Group remarks, up to 200 characters"))
            .attribute(quota("cpu_request", "Initially allocated CPU cores"))
            .attribute(quota("mem_request", "Initially allocated memory in MiB"))
            .attribute(quota("agent_cpu_request", "Initially allocated agent CPU cores"))
            .attribute(quota("agent_cpu_limit", "Maximum agent CPU cores"))
            .attribute(quota("agent_mem_request", "Initially allocated agent memory in MiB"))
            .attribute(quota("agent_mem_limit", "Maximum agent memory in MiB"))
            .attribute(
                defaulted("update_type", AttributeType::Int, "0 for quick update, 1 for rolling update")
                    .build(),
            )
            .attribute(
                defaulted("update_ivl", AttributeType::Int, "Rolling update interval in seconds")
                    .build(),
            )
            .attribute(
                defaulted("group_resource_type", AttributeType::String, "DEF or GW, DEF by default")
                    .immutable()
                    .build(),
            )
            .attribute(defaulted("subnet_id", AttributeType::String, "Subnet id").build());

        for (name, description) in [
            ("istio_cpu_request", "Initially allocated istio CPU cores"),
            ("istio_cpu_limit", "Maximum istio CPU cores"),
            ("istio_mem_request", "Initially allocated istio memory in MiB"),
            ("istio_mem_limit", "Maximum istio memory in MiB"),
        ] {
            builder = builder.attribute(
                defaulted(name, AttributeType::String, description)
                    .immutable()
                    .build(),
            );
        }

        for (name, r#type, description) in computed_attributes() {
            builder = builder.attribute(computed(name, r#type, description));
        }

        builder.build()
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::ServerAssigned("/Result")
    }

    fn create_call(&self, desired: &DynamicValue) -> Result<ApiCall, ReconcileError> {
        let request: ContainGroupRequest = request_from_state(desired, None)?;
        Ok(ApiCall::new(Service::Tsf, CREATE_CONTAIN_GROUP, &request)?)
    }

    fn read_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = GroupIdRequest {
            group_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Tsf, DESCRIBE_CONTAINER_GROUP_DETAIL, &request)?)
    }

    fn extract_observed(
        &self,
        _id: &ResourceId,
        response: Value,
    ) -> Result<Option<Value>, ReconcileError> {
        Ok(member(response, "Result"))
    }

    fn update_call(
        &self,
        id: &ResourceId,
        desired: &DynamicValue,
        changed: &[&str],
    ) -> Result<Option<ApiCall>, ReconcileError> {
        let mut request: ContainGroupRequest = request_from_state(desired, Some(changed))?;
        request.group_id = Some(id.to_string());
        Ok(Some(ApiCall::new(Service::Tsf, MODIFY_CONTAINER_GROUP, &request)?))
    }

    fn delete_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = GroupIdRequest {
            group_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Tsf, DELETE_CONTAINER_GROUP, &request)?)
    }
}
