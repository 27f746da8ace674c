//! Live callback template: where stream events are reported

use serde_json::Value;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::validator::StringLengthValidator;
use tfplug::DynamicValue;

use super::{id_attribute, member, numeric_id, HttpUrlValidator};
use crate::api::live::{
    CallbackTemplateRequest, TemplateIdRequest, CREATE_LIVE_CALLBACK_TEMPLATE,
    DELETE_LIVE_CALLBACK_TEMPLATE, DESCRIBE_LIVE_CALLBACK_TEMPLATE, MODIFY_LIVE_CALLBACK_TEMPLATE,
};
use crate::api::{ApiCall, Service};
use crate::reconcile::{
    request_from_state, IdentityStrategy, ReconcileError, ResourceDefinition, ResourceId,
};

pub const TYPE_NAME: &str = "tencentcloud_live_callback_template";

const NOTIFY_URLS: &[(&str, &str)] = &[
    ("stream_begin_notify_url", "Stream start callback URL"),
    ("stream_end_notify_url", "Stream end callback URL"),
    ("record_notify_url", "Recording callback URL"),
    ("snapshot_notify_url", "Screencapturing callback URL"),
    ("porn_censorship_notify_url", "Porn detection callback URL"),
    ("stream_mix_notify_url", "Stream mixing callback URL"),
    ("push_exception_notify_url", "Push error callback URL"),
    ("audio_audit_notify_url", "Audio auditing callback URL"),
];

#[derive(Default)]
pub struct LiveCallbackTemplate;

impl ResourceDefinition for LiveCallbackTemplate {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Manages a live callback template")
            .attribute(id_attribute("Template id"))
            .attribute(
                AttributeBuilder::new("template_name", AttributeType::String)
                    .description("Template name, up to 255 bytes")
                    .required()
                    .validator(StringLengthValidator {
                        min: Some(1),
                        max: Some(255),
                    })
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description, up to 1,024 bytes")
                    .optional()
                    .validator(StringLengthValidator {
                        min: None,
                        max: Some(1024),
                    })
                    .build(),
            );

        for (name, description) in NOTIFY_URLS {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .description(description)
                    .optional()
                    .validator(HttpUrlValidator)
                    .build(),
            );
        }

        builder
            .attribute(
                AttributeBuilder::new("callback_key", AttributeType::String)
                    .description("Key used to sign callback requests")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .build()
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::ServerAssigned("/TemplateId")
    }

    fn create_call(&self, desired: &DynamicValue) -> Result<ApiCall, ReconcileError> {
        let request: CallbackTemplateRequest = request_from_state(desired, None)?;
        Ok(ApiCall::new(Service::Live, CREATE_LIVE_CALLBACK_TEMPLATE, &request)?)
    }

    fn read_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = TemplateIdRequest {
            template_id: numeric_id(id)?,
        };
        Ok(ApiCall::new(Service::Live, DESCRIBE_LIVE_CALLBACK_TEMPLATE, &request)?)
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
        let mut request: CallbackTemplateRequest = request_from_state(desired, Some(changed))?;
        request.template_id = Some(numeric_id(id)?);
        Ok(Some(ApiCall::new(
            Service::Live,
            MODIFY_LIVE_CALLBACK_TEMPLATE,
            &request,
        )?))
    }

    fn delete_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        let request = TemplateIdRequest {
            template_id: numeric_id(id)?,
        };
        Ok(ApiCall::new(Service::Live, DELETE_LIVE_CALLBACK_TEMPLATE, &request)?)
    }
}
