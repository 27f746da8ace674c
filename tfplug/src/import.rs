//! Import helpers for simplifying resource import implementations

use crate::context::Context;
use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Sets the import ID to a specific attribute in state
///
/// This is useful for resources where the import ID is the identity used by
/// read; the following read fills in everything else.
///
/// Example: ID "5000.livepush.myqcloud.com#live" -> state.id = "5000.livepush.myqcloud.com#live"
pub fn import_state_passthrough_id(
    ctx: &Context,
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    if request.id.trim().is_empty() {
        response.diagnostics.push(
            Diagnostic::error(
                "Invalid import ID",
                format!("An empty ID cannot be imported into {}", request.type_name),
            )
            .with_attribute(attr_path),
        );
        return;
    }

    let mut state = DynamicValue::object();

    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        response.diagnostics.push(
            Diagnostic::error(
                format!("Failed to set import ID: {}", e),
                format!(
                    "Could not set attribute '{}' to value '{}'",
                    attr_path, request.id
                ),
            )
            .with_attribute(attr_path),
        );
        return;
    }

    tracing::debug!(
        log_id = ctx.log_id(),
        "importing {} with id {}",
        request.type_name,
        request.id
    );

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str) -> ImportResourceStateRequest {
        ImportResourceStateRequest {
            type_name: "tencentcloud_tsf_namespace".to_string(),
            id: id.to_string(),
        }
    }

    #[test]
    fn passthrough_copies_id_into_state() {
        let mut response = ImportResourceStateResponse::default();
        import_state_passthrough_id(
            &Context::new(),
            AttributePath::new("id"),
            &request("namespace-aemrg36v"),
            &mut response,
        );

        assert!(response.diagnostics.is_empty());
        assert_eq!(response.imported_resources.len(), 1);
        assert_eq!(
            response.imported_resources[0]
                .state
                .get_string(&AttributePath::new("id"))
                .unwrap(),
            "namespace-aemrg36v"
        );
    }

    #[test]
    fn passthrough_rejects_blank_id() {
        let mut response = ImportResourceStateResponse::default();
        import_state_passthrough_id(
            &Context::new(),
            AttributePath::new("id"),
            &request("  "),
            &mut response,
        );

        assert!(response.imported_resources.is_empty());
        assert_eq!(response.diagnostics.len(), 1);
    }
}
