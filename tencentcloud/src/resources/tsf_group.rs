//! TSF deployment group

use serde_json::Value;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::DynamicValue;

use super::{id_attribute, member};
use crate::api::tsf::{
    GroupIdRequest, GroupRequest, CREATE_GROUP, DELETE_GROUP, DESCRIBE_GROUP, MODIFY_GROUP,
};
use crate::api::{ApiCall, Service};
use crate::reconcile::{
    request_from_state, IdentityStrategy, ReconcileError, ResourceDefinition, ResourceId,
};

pub const TYPE_NAME: &str = "tencentcloud_tsf_group";

fn computed_attributes() -> Vec<(&'static str, AttributeType, &'static str)> {
    vec![
        ("group_id", AttributeType::String, "Group id"),
        ("group_status", AttributeType::String, "Group status"),
        ("package_id", AttributeType::String, "Deployed package id"),
        ("package_name", AttributeType::String, "Deployed package name"),
        ("package_version", AttributeType::String, "Deployed package version"),
        ("cluster_name", AttributeType::String, "Cluster name"),
        ("namespace_name", AttributeType::String, "Namespace name"),
        ("application_name", AttributeType::String, "Application name"),
        ("instance_count", AttributeType::Int, "Number of instances"),
        ("run_instance_count", AttributeType::Int, "Number of running instances"),
        ("off_instance_count", AttributeType::Int, "Number of stopped instances"),
        ("startup_parameters", AttributeType::String, "Startup parameters"),
        ("create_time", AttributeType::String, "Creation time"),
        ("update_time", AttributeType::String, "Update time"),
        ("microservice_type", AttributeType::String, "Microservice type"),
        ("application_type", AttributeType::String, "Application type"),
        ("updated_time", AttributeType::Int, "Update timestamp"),
        ("deploy_desc", AttributeType::String, "Deployment description"),
        ("update_type", AttributeType::Int, "Update mode, 0 for quick update, 1 for rolling"),
        ("deploy_beta_enable", AttributeType::Bool, "Whether beta batches are enabled"),
        ("deploy_exe_mode", AttributeType::String, "Batch execution mode"),
        ("deploy_wait_time", AttributeType::Int, "Wait between batches in seconds"),
        ("enable_health_check", AttributeType::Bool, "Whether health checks are enabled"),
        ("package_type", AttributeType::String, "Package type"),
        ("start_script", AttributeType::String, "Base64 start script"),
        ("stop_script", AttributeType::String, "Base64 stop script"),
    ]
}

fn computed(name: &str, r#type: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .computed()
        .build()
}

fn fixed(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .required()
        .immutable()
        .build()
}

#[derive(Default)]
pub struct TsfGroup;

impl ResourceDefinition for TsfGroup {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Manages a TSF virtual machine deployment group")
            .attribute(id_attribute("Group id"))
            .attribute(fixed("application_id", "Application the group belongs to"))
            .attribute(fixed("namespace_id", "Namespace the group belongs to"))
            .attribute(fixed("group_name", "Group name"))
            .attribute(fixed("cluster_id", "Cluster the group runs in"))
            .attribute(
                AttributeBuilder::new("group_desc", AttributeType::String)
                    .description("Group description")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("group_resource_type", AttributeType::String)
                    .description("Resource type of the group")
                    .optional()
                    .immutable()
                    .default_value("DEF")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("alias", AttributeType::String)
                    .description("Group alias")
                    .optional()
                    .build(),
            )
            .attribute(computed(
                "deploy_batch",
                AttributeType::List(Box::new(AttributeType::Float)),
                "Share of instances in each deployment batch",
            ));

        for (name, r#type, description) in computed_attributes() {
            builder = builder.attribute(computed(name, r#type, description));
        }

        builder.build()
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::ServerAssigned("/Result")
    }

    fn create_call(&self, desired: &DynamicValue) -> Result<ApiCall, ReconcileError> {
        let request: GroupRequest = request_from_state(desired, None)?;
        Ok(ApiCall::new(Service::Tsf, CREATE_GROUP, &request)?)
    }

    fn read_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = GroupIdRequest {
            group_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Tsf, DESCRIBE_GROUP, &request)?)
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
        let mut request: GroupRequest = request_from_state(desired, Some(changed))?;
        request.group_id = Some(id.to_string());
        Ok(Some(ApiCall::new(Service::Tsf, MODIFY_GROUP, &request)?))
    }

    fn delete_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = GroupIdRequest {
            group_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Tsf, DELETE_GROUP, &request)?)
    }
}
