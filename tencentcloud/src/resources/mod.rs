pub mod live_callback_rule;
pub mod live_callback_template;
pub mod live_record_template;
pub mod live_stream_monitor;
pub mod tsf_api_group;
pub mod tsf_contain_group;
pub mod tsf_group;
pub mod tsf_instances_attachment;
pub mod tsf_namespace;
pub mod tsf_task;

pub use live_callback_rule::LiveCallbackRule;
pub use live_callback_template::LiveCallbackTemplate;
pub use live_record_template::LiveRecordTemplate;
pub use live_stream_monitor::LiveStreamMonitor;
pub use tsf_api_group::TsfApiGroup;
pub use tsf_contain_group::TsfContainGroup;
pub use tsf_group::TsfGroup;
pub use tsf_instances_attachment::TsfInstancesAttachment;
pub use tsf_namespace::TsfNamespace;
pub use tsf_task::TsfTask;

use serde_json::Value;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, Dynamic};
use tfplug::validator::Validator;

use crate::reconcile::{ReconcileError, ResourceId};

/// The computed `id` every resource carries
pub(crate) fn id_attribute(description: &str) -> Attribute {
    AttributeBuilder::new("id", AttributeType::String)
        .description(description)
        .computed()
        .build()
}

/// Live templates are addressed by a numeric id kept as a string in state
pub(crate) fn numeric_id(id: &ResourceId) -> Result<i64, ReconcileError> {
    id.as_str()
        .parse()
        .map_err(|_| ReconcileError::MalformedIdentity {
            id: id.to_string(),
            expected: "a numeric template id".to_string(),
        })
}

/// Takes a non-null member out of a describe response
pub(crate) fn member(mut response: Value, key: &str) -> Option<Value> {
    response
        .get_mut(key)
        .map(Value::take)
        .filter(|v| !v.is_null())
}

/// Accepts only `http://` and `https://` URLs
pub(crate) struct HttpUrlValidator;

impl Validator for HttpUrlValidator {
    fn description(&self) -> String {
        "an http:// or https:// URL".to_string()
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(url) = value.as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} must be an http:// or https:// URL", path),
                        format!("Got '{}'", url),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_id_rejects_non_numbers() {
        assert_eq!(numeric_id(&ResourceId::new("1001")).unwrap(), 1001);
        assert!(matches!(
            numeric_id(&ResourceId::new("tpl-1")),
            Err(ReconcileError::MalformedIdentity { .. })
        ));
    }

    #[test]
    fn member_skips_null() {
        let response = json!({"Template": null, "Result": {"GroupId": "grp-1"}});
        assert!(member(response.clone(), "Template").is_none());
        assert!(member(response.clone(), "Missing").is_none());
        assert_eq!(member(response, "Result").unwrap()["GroupId"], "grp-1");
    }

    #[test]
    fn url_validator_requires_http_scheme() {
        let path = AttributePath::new("stream_begin_notify_url");
        let mut diagnostics = vec![];

        HttpUrlValidator.validate(&Dynamic::from("https://hook.example.com/begin"), &path, &mut diagnostics);
        assert!(diagnostics.is_empty());

        HttpUrlValidator.validate(&Dynamic::from("ftp://hook.example.com"), &path, &mut diagnostics);
        assert_eq!(diagnostics.len(), 1);
    }
}
