//! Live record template: per-format recording settings

use serde_json::Value;
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, Schema, SchemaBuilder};
use tfplug::validator::{IntRangeValidator, OneOfValidator};
use tfplug::DynamicValue;

use super::{id_attribute, member, numeric_id};
use crate::api::live::{
    RecordTemplateRequest, TemplateIdRequest, CREATE_LIVE_RECORD_TEMPLATE,
    DELETE_LIVE_RECORD_TEMPLATE, DESCRIBE_LIVE_RECORD_TEMPLATE, MODIFY_LIVE_RECORD_TEMPLATE,
};
use crate::api::{ApiCall, Service};
use crate::reconcile::{
    request_from_state, IdentityStrategy, ReconcileError, ResourceDefinition, ResourceId,
};

pub const TYPE_NAME: &str = "tencentcloud_live_record_template";

/// One `RecordParam` block, shared by every recording format
fn record_param(name: &str, format: &str) -> NestedBlock {
    NestedBlockBuilder::new(name)
        .description(&format!("{} recording parameters, set when {} recording is enabled", format, format))
        .max_items(1)
        .attribute(
            AttributeBuilder::new("record_interval", AttributeType::Int)
                .description("Max recording time per file in seconds, 1800 by default")
                .optional()
                .validator(IntRangeValidator::new(Some(30), Some(7200)))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("storage_time", AttributeType::Int)
                .description("Storage duration of the recording file in seconds, 0 keeps it forever")
                .optional()
                .validator(IntRangeValidator::new(Some(0), Some(129_600_000)))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("enable", AttributeType::Int)
                .description("Whether to record in this format, 0 or 1")
                .optional()
                .validator(IntRangeValidator::new(Some(0), Some(1)))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("vod_sub_app_id", AttributeType::Int)
                .description("VOD subapplication id")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("vod_file_name", AttributeType::String)
                .description("Recording file name, may use placeholders such as {StreamID}")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("procedure", AttributeType::String)
                .description("Task flow")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("storage_mode", AttributeType::String)
                .description("Storage class: normal or cold")
                .optional()
                .validator(OneOfValidator::new(&["normal", "cold"]))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("class_id", AttributeType::Int)
                .description("VOD subapplication category")
                .optional()
                .build(),
        )
        .build()
}

#[derive(Default)]
pub struct LiveRecordTemplate;

impl ResourceDefinition for LiveRecordTemplate {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a live recording template")
            .attribute(id_attribute("Template id"))
            .attribute(
                AttributeBuilder::new("template_name", AttributeType::String)
                    .description("Template name; letters, digits, underscores and hyphens")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Message description")
                    .optional()
                    .build(),
            )
            .block(record_param("flv_param", "FLV"))
            .block(record_param("hls_param", "HLS"))
            .block(record_param("mp4_param", "MP4"))
            .block(record_param("aac_param", "AAC"))
            .block(record_param("mp3_param", "MP3"))
            .attribute(
                AttributeBuilder::new("is_delay_live", AttributeType::Int)
                    .description("0 for LVB, 1 for LCB; fixed at creation")
                    .optional()
                    .computed()
                    .immutable()
                    .validator(IntRangeValidator::new(Some(0), Some(1)))
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("hls_special_param")
                    .description("HLS-specific recording parameters")
                    .max_items(1)
                    .attribute(
                        AttributeBuilder::new("flow_continue_duration", AttributeType::Int)
                            .description("Timeout for resuming an interrupted HLS push, 0 to 1800")
                            .optional()
                            .validator(IntRangeValidator::new(Some(0), Some(1800)))
                            .build(),
                    )
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("remove_watermark", AttributeType::Bool)
                    .description("Whether to remove the watermark; only applies to type 1 recording")
                    .optional()
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("flv_special_param")
                    .description("FLV-specific recording parameters")
                    .max_items(1)
                    .attribute(
                        AttributeBuilder::new("upload_in_recording", AttributeType::Bool)
                            .description("Whether to upload the file while recording")
                            .optional()
                            .build(),
                    )
                    .build(),
            )
            .build()
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::ServerAssigned("/TemplateId")
    }

    fn create_call(&self, desired: &DynamicValue) -> Result<ApiCall, ReconcileError> {
        let request: RecordTemplateRequest = request_from_state(desired, None)?;
        Ok(ApiCall::new(Service::Live, CREATE_LIVE_RECORD_TEMPLATE, &request)?)
    }

    fn read_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = TemplateIdRequest {
            template_id: numeric_id(id)?,
        };
        Ok(ApiCall::new(Service::Live, DESCRIBE_LIVE_RECORD_TEMPLATE, &request)?)
    }

    fn extract_observed(
        &self,
        _id: &ResourceId,
        response: Value,
    ) -> Result<Option<Value>, ReconcileError> {
        Ok(member(response, "Template"))
    }

    fn update_call(
        &self,
        id: &ResourceId,
        desired: &DynamicValue,
        changed: &[&str],
    ) -> Result<Option<ApiCall>, ReconcileError> {
        let mut request: RecordTemplateRequest = request_from_state(desired, Some(changed))?;
        request.template_id = Some(numeric_id(id)?);
        Ok(Some(ApiCall::new(
            Service::Live,
            MODIFY_LIVE_RECORD_TEMPLATE,
            &request,
        )?))
    }

    fn delete_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = TemplateIdRequest {
            template_id: numeric_id(id)?,
        };
        Ok(ApiCall::new(Service::Live, DELETE_LIVE_RECORD_TEMPLATE, &request)?)
    }
}
