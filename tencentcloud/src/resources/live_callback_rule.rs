//! Live callback rule: binds a callback template to a push domain and app

use serde_json::Value;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::validator::StringLengthValidator;
use tfplug::DynamicValue;

use super::id_attribute;
use crate::api::live::{
    CallbackRuleRequest, DescribeLiveCallbackRulesRequest, CREATE_LIVE_CALLBACK_RULE,
    DELETE_LIVE_CALLBACK_RULE, DESCRIBE_LIVE_CALLBACK_RULES,
};
use crate::api::{ApiCall, Service};
use crate::reconcile::{
    request_from_state, IdentityStrategy, ReconcileError, ResourceDefinition, ResourceId,
};

pub const TYPE_NAME: &str = "tencentcloud_live_callback_rule";

const IDENTITY: &[&str] = &["domain_name", "app_name"];

#[derive(Default)]
pub struct LiveCallbackRule;

impl ResourceDefinition for LiveCallbackRule {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Binds a live callback template to a push domain and app")
            .attribute(id_attribute("`domain_name#app_name`"))
            .attribute(
                AttributeBuilder::new("domain_name", AttributeType::String)
                    .description("Push domain")
                    .required()
                    .immutable()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("app_name", AttributeType::String)
                    .description("Push path, the AppName in the push URL, `live` by default")
                    .required()
                    .immutable()
                    .validator(StringLengthValidator {
                        min: Some(1),
                        max: Some(32),
                    })
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("template_id", AttributeType::Int)
                    .description("Callback template id")
                    .required()
                    .immutable()
                    .build(),
            )
            .build()
    }

    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::Composite(IDENTITY)
    }

    fn create_call(&self, desired: &DynamicValue) -> Result<ApiCall, ReconcileError> {
        let request: CallbackRuleRequest = request_from_state(desired, None)?;
        Ok(ApiCall::new(Service::Live, CREATE_LIVE_CALLBACK_RULE, &request)?)
    }

    fn read_call(&self, _id: &ResourceId) -> Result<ApiCall, ReconcileError> {
        Ok(ApiCall::new(
            Service::Live,
            DESCRIBE_LIVE_CALLBACK_RULES,
            &DescribeLiveCallbackRulesRequest {},
        )?)
    }

    /// The describe action lists every rule of the account
    fn extract_observed(
        &self,
        id: &ResourceId,
        response: Value,
    ) -> Result<Option<Value>, ReconcileError> {
        let parts = id.parts(IDENTITY.len())?;
        let (domain, app) = (parts[0], parts[1]);

        let rule = response
            .get("Rules")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|rule| {
                rule.get("DomainName").and_then(Value::as_str) == Some(domain)
                    && rule.get("AppName").and_then(Value::as_str) == Some(app)
            })
            .cloned();

        Ok(rule)
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
        let parts = id.parts(IDENTITY.len())?;
        let request = CallbackRuleRequest {
            domain_name: parts[0].to_string(),
            app_name: parts[1].to_string(),
            template_id: None,
        };
        Ok(ApiCall::new(Service::Live, DELETE_LIVE_CALLBACK_RULE, &request)?)
    }
}
