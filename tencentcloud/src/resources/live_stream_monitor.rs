//! Live stream monitor: watches input streams and renders a monitor output

use serde_json::Value;
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, Schema, SchemaBuilder};
use tfplug::validator::{IntRangeValidator, StringLengthValidator};
use tfplug::DynamicValue;

use super::{id_attribute, member, HttpUrlValidator};
use crate::api::live::{
    MonitorIdRequest, StreamMonitorRequest, CREATE_LIVE_STREAM_MONITOR,
    DELETE_LIVE_STREAM_MONITOR, DESCRIBE_LIVE_STREAM_MONITOR, MODIFY_LIVE_STREAM_MONITOR,
};
use crate::api::{ApiCall, Service};
use crate::reconcile::{
    request_from_state, IdentityStrategy, ReconcileError, ResourceDefinition, ResourceId,
};

pub const TYPE_NAME: &str = "tencentcloud_live_stream_monitor";

fn switch(name: &str, description: &str) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, AttributeType::Int)
        .description(description)
        .optional()
        .validator(IntRangeValidator::new(Some(0), Some(1)))
        .build()
}

fn max_bytes(max: usize) -> StringLengthValidator {
    StringLengthValidator {
        min: None,
        max: Some(max),
    }
}

#[derive(Default)]
pub struct LiveStreamMonitor;

impl ResourceDefinition for LiveStreamMonitor {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a live stream monitor task")
            .attribute(id_attribute("Monitor id"))
            .block(
                NestedBlockBuilder::new("output_info")
                    .description("Monitor output")
                    .required()
                    .max_items(1)
                    .attribute(
                        AttributeBuilder::new("output_stream_width", AttributeType::Int)
                            .description("Output stream width, 1 to 1920")
                            .required()
                            .validator(IntRangeValidator::new(Some(1), Some(1920)))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("output_stream_height", AttributeType::Int)
                            .description("Output stream height, 1 to 1080")
                            .required()
                            .validator(IntRangeValidator::new(Some(1), Some(1080)))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("output_stream_name", AttributeType::String)
                            .description("Output stream name")
                            .optional()
                            .validator(max_bytes(256))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("output_domain", AttributeType::String)
                            .description("Output play domain")
                            .optional()
                            .validator(max_bytes(128))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("output_app", AttributeType::String)
                            .description("Output play path")
                            .optional()
                            .validator(max_bytes(32))
                            .build(),
                    )
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("input_list")
                    .description("Monitored input streams, in display order")
                    .required()
                    .attribute(
                        AttributeBuilder::new("input_stream_name", AttributeType::String)
                            .description("Input stream name")
                            .required()
                            .validator(max_bytes(256))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("input_domain", AttributeType::String)
                            .description("Input push domain")
                            .optional()
                            .validator(max_bytes(128))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("input_app", AttributeType::String)
                            .description("Input push path")
                            .optional()
                            .validator(max_bytes(32))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("input_url", AttributeType::String)
                            .description("Input stream push URL")
                            .optional()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("description", AttributeType::String)
                            .description("Description")
                            .optional()
                            .validator(max_bytes(256))
                            .build(),
                    )
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("monitor_name", AttributeType::String)
                    .description("Monitor task name")
                    .optional()
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("notify_policy")
                    .description("Event notification policy")
                    .max_items(1)
                    .attribute(
                        AttributeBuilder::new("notify_policy_type", AttributeType::Int)
                            .description("0 disables notification, 1 uses the global policy")
                            .optional()
                            .validator(IntRangeValidator::new(Some(0), Some(1)))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("callback_url", AttributeType::String)
                            .description("Callback URL, http or https, up to 512 bytes")
                            .optional()
                            .validator(HttpUrlValidator)
                            .validator(max_bytes(512))
                            .build(),
                    )
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("asr_language", AttributeType::Int)
                    .description("Speech recognition language: 0 off, 1 Chinese, 2 English, 3 Japanese, 4 Korean")
                    .optional()
                    .validator(IntRangeValidator::new(Some(0), Some(4)))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ocr_language", AttributeType::Int)
                    .description("Text recognition: 0 off, 1 Chinese and English")
                    .optional()
                    .validator(IntRangeValidator::new(Some(0), Some(1)))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "ai_asr_input_index_list",
                    AttributeType::Set(Box::new(AttributeType::Int)),
                )
                .description("Inputs to run speech recognition on, the first input is 1")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "ai_ocr_input_index_list",
                    AttributeType::Set(Box::new(AttributeType::Int)),
                )
                .description("Inputs to run text recognition on, the first input is 1")
                .optional()
                .build(),
            )
            .attribute(switch("check_stream_broken", "Whether to check for broken streams"))
            .attribute(switch(
                "check_stream_low_frame_rate",
                "Whether to check for low frame rates",
            ))
            .attribute(switch("allow_monitor_report", "Whether to store monitor events"))
            .attribute(switch("ai_format_diagnose", "Whether to diagnose stream formats"))
            .build()
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::ServerAssigned("/MonitorId")
    }

    fn create_call(&self, desired: &DynamicValue) -> Result<ApiCall, ReconcileError> {
        let request: StreamMonitorRequest = request_from_state(desired, None)?;
        Ok(ApiCall::new(Service::Live, CREATE_LIVE_STREAM_MONITOR, &request)?)
    }

    fn read_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = MonitorIdRequest {
            monitor_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Live, DESCRIBE_LIVE_STREAM_MONITOR, &request)?)
    }

    fn extract_observed(
        &self,
        _id: &ResourceId,
        response: Value,
    ) -> Result<Option<Value>, ReconcileError> {
        let fallback = response
            .get("LiveStreamMonitorInfo")
            .and_then(|infos| infos.get(0))
            .cloned();
        Ok(member(response, "LiveStreamMonitor").or(fallback))
    }

    /// The modify action replaces the whole task, so the full desired state
    /// is sent whatever changed
    fn update_call(
        &self,
        id: &ResourceId,
        desired: &DynamicValue,
        _changed: &[&str],
    ) -> Result<Option<ApiCall>, ReconcileError> {
        let mut request: StreamMonitorRequest = request_from_state(desired, None)?;
        request.monitor_id = Some(id.to_string());
        Ok(Some(ApiCall::new(
            Service::Live,
            MODIFY_LIVE_STREAM_MONITOR,
            &request,
        )?))
    }

    fn delete_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = MonitorIdRequest {
            monitor_id: id.to_string(),
        };
        Ok(ApiCall::new(Service::Live, DELETE_LIVE_STREAM_MONITOR, &request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tfplug::types::{AttributePath, Dynamic};

    fn desired() -> DynamicValue {
        let mut state = DynamicValue::object();
        state
            .set_list(
                &AttributePath::new("output_info"),
                vec![Dynamic::Map(
                    [
                        ("output_stream_width".to_string(), Dynamic::Int(1280)),
                        ("output_stream_height".to_string(), Dynamic::Int(720)),
                    ]
                    .into_iter()
                    .collect(),
                )],
            )
            .unwrap();
        state
            .set_list(
                &AttributePath::new("input_list"),
                vec![Dynamic::Map(
                    [("input_stream_name".to_string(), Dynamic::from("cam-1"))]
                        .into_iter()
                        .collect(),
                )],
            )
            .unwrap();
        state
            .set_string(&AttributePath::new("monitor_name"), "lobby".to_string())
            .unwrap();
        state
    }

    #[test]
    fn modify_sends_the_whole_task() {
        let call = LiveStreamMonitor
            .update_call(&ResourceId::new("monitor-1"), &desired(), &["monitor_name"])
            .unwrap()
            .unwrap();

        assert_eq!(
            call.payload,
            json!({
                "MonitorId": "monitor-1",
                "OutputInfo": {"OutputStreamWidth": 1280, "OutputStreamHeight": 720},
                "InputList": [{"InputStreamName": "cam-1"}],
                "MonitorName": "lobby",
            })
        );
    }

    #[test]
    fn output_dimensions_are_bounded() {
        let mut config = desired();
        config
            .set_list(
                &AttributePath::new("output_info"),
                vec![Dynamic::Map(
                    [
                        ("output_stream_width".to_string(), Dynamic::Int(4096)),
                        ("output_stream_height".to_string(), Dynamic::Int(720)),
                    ]
                    .into_iter()
                    .collect(),
                )],
            )
            .unwrap();

        let diagnostics = LiveStreamMonitor.schema().validate(&config);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("output_stream_width"));
    }

    #[test]
    fn describe_falls_back_to_the_info_list() {
        let response = json!({"LiveStreamMonitorInfo": [{"MonitorId": "monitor-1", "MonitorName": "lobby"}]});
        let observed = LiveStreamMonitor
            .extract_observed(&ResourceId::new("monitor-1"), response)
            .unwrap()
            .unwrap();
        assert_eq!(observed["MonitorName"], "lobby");
    }
}
