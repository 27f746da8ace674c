//! TSF scheduled task

use serde_json::Value;
use std::collections::HashMap;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::validator::{IntRangeValidator, OneOfValidator, StringLengthValidator};
use tfplug::DynamicValue;

use super::{id_attribute, member};
use crate::api::tsf::{
    TaskIdRequest, TaskRequest, CREATE_TASK, DELETE_TASK, DESCRIBE_TASK_DETAIL, MODIFY_TASK,
};
use crate::api::{ApiCall, Service};
use crate::reconcile::{
    request_from_state, IdentityStrategy, ReconcileError, ResourceDefinition, ResourceId,
};

pub const TYPE_NAME: &str = "tencentcloud_tsf_task";

fn object(fields: &[(&str, AttributeType)]) -> AttributeType {
    let fields: HashMap<String, AttributeType> = fields
        .iter()
        .map(|(name, ty)| (name.to_string(), ty.clone()))
        .collect();
    AttributeType::List(Box::new(AttributeType::Object(fields)))
}

fn computed(name: &str, r#type: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .computed()
        .build()
}

fn required(name: &str, r#type: AttributeType, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .required()
}

/// Optional, filled in by the API when left unset
fn defaulted(name: &str, r#type: AttributeType, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .optional()
        .computed()
}

#[derive(Default)]
pub struct TsfTask;

impl ResourceDefinition for TsfTask {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a TSF scheduled task")
            .attribute(id_attribute("Task id"))
            .attribute(computed("task_id", AttributeType::String, "Task id"))
            .attribute(
                required("task_name", AttributeType::String, "Task name, up to 64 characters")
                    .validator(StringLengthValidator {
                        min: Some(1),
                        max: Some(64),
                    })
                    .build(),
            )
            .attribute(
                required("task_content", AttributeType::String, "Task content, up to 65536 bytes")
                    .validator(StringLengthValidator {
                        min: None,
                        max: Some(65536),
                    })
                    .build(),
            )
            .attribute(
                required("execute_type", AttributeType::String, "unicast or broadcast")
                    .validator(OneOfValidator::new(&["unicast", "broadcast"]))
                    .build(),
            )
            .attribute(required("task_type", AttributeType::String, "Task type, java").build())
            .attribute(required("time_out", AttributeType::Int, "Timeout in milliseconds").build())
            .attribute(required("group_id", AttributeType::String, "Deployment group to run on").build())
            .attribute(
                defaulted(
                    "task_rule",
                    object(&[
                        ("rule_type", AttributeType::String),
                        ("expression", AttributeType::String),
                        ("repeat_interval", AttributeType::Int),
                    ]),
                    "Trigger rule: rule_type Cron or Repeat, a cron expression or a repeat interval in milliseconds",
                )
                .build(),
            )
            .attribute(
                defaulted("retry_count", AttributeType::Int, "Retries, 0 to 10")
                    .validator(IntRangeValidator::new(Some(0), Some(10)))
                    .build(),
            )
            .attribute(
                defaulted("retry_interval", AttributeType::Int, "Retry interval in milliseconds, up to 600000")
                    .validator(IntRangeValidator::new(Some(0), Some(600_000)))
                    .build(),
            )
            .attribute(defaulted("shard_count", AttributeType::Int, "Number of shards").build())
            .attribute(
                defaulted(
                    "shard_arguments",
                    object(&[
                        ("shard_key", AttributeType::Int),
                        ("shard_value", AttributeType::String),
                    ]),
                    "Shard parameters, keys from 1 to 1000",
                )
                .build(),
            )
            .attribute(
                defaulted("success_operator", AttributeType::String, "Operator judging task success")
                    .build(),
            )
            .attribute(
                defaulted("success_ratio", AttributeType::String, "Success rate threshold, e.g. 100")
                    .build(),
            )
            .attribute(
                defaulted(
                    "advance_settings",
                    object(&[("sub_task_concurrency", AttributeType::Int)]),
                    "Advanced settings: per-machine subtask concurrency, 2 by default",
                )
                .build(),
            )
            .attribute(
                defaulted("task_argument", AttributeType::String, "Task parameters, up to 10000 characters")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "program_id_list",
                    AttributeType::Set(Box::new(AttributeType::String)),
                )
                .description("Datasets the task belongs to")
                .optional()
                .build(),
            )
            .attribute(computed("task_state", AttributeType::String, "ENABLED or DISABLED"))
            .attribute(computed(
                "belong_flow_ids",
                AttributeType::Set(Box::new(AttributeType::String)),
                "Workflows the task belongs to",
            ))
            .attribute(computed("task_log_id", AttributeType::String, "Task history id"))
            .attribute(computed("trigger_type", AttributeType::String, "Trigger type"))
            .build()
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::ServerAssigned("/Result")
    }

    fn create_call(&self, desired: &DynamicValue) -> Result<ApiCall, ReconcileError> {
        let request: TaskRequest = request_from_state(desired, None)?;
        Ok(ApiCall::new(Service::Tsf, CREATE_TASK, &request)?)
    }

    fn read_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = TaskIdRequest {
            task_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Tsf, DESCRIBE_TASK_DETAIL, &request)?)
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
        let mut request: TaskRequest = request_from_state(desired, Some(changed))?;
        request.task_id = Some(id.to_string());
        Ok(Some(ApiCall::new(Service::Tsf, MODIFY_TASK, &request)?))
    }

    fn delete_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = TaskIdRequest {
            task_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Tsf, DELETE_TASK, &request)?)
    }
}
