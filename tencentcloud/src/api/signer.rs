//! TC3-HMAC-SHA256 request signing

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const SIGNED_HEADERS: &str = "content-type;host";

/// API key pair plus an optional STS token
#[derive(Clone)]
pub struct Credential {
    pub secret_id: String,
    pub secret_key: String,
    pub token: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"***")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Builds the `Authorization` header for a JSON POST to `/`
pub fn authorization(
    credential: &Credential,
    service: &str,
    host: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, ApiError> {
    let date = chrono::DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| ApiError::SigningError(format!("invalid timestamp {}", timestamp)))?
        .format("%Y-%m-%d")
        .to_string();

    let canonical_request = format!(
        "POST\n/\n\ncontent-type:{}\nhost:{}\n\n{}\n{}",
        CONTENT_TYPE,
        host,
        SIGNED_HEADERS,
        hex::encode(Sha256::digest(payload))
    );

    let scope = format!("{}/{}/tc3_request", date, service);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        timestamp,
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let secret_date = hmac_sha256(format!("TC3{}", credential.secret_key).as_bytes(), &date)?;
    let secret_service = hmac_sha256(&secret_date, service)?;
    let secret_signing = hmac_sha256(&secret_service, "tc3_request")?;
    let signature = hex::encode(hmac_sha256(&secret_signing, &string_to_sign)?);

    Ok(format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credential.secret_id, scope, SIGNED_HEADERS, signature
    ))
}

fn hmac_sha256(key: &[u8], message: &str) -> Result<Vec<u8>, ApiError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| ApiError::SigningError(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential {
            secret_id: "AKIDz8krbsJ5yKBZQpn74WFkmLPx3EXAMPLE".to_string(),
            secret_key: "Gu5t9xGARNpq86cd98joQYCN3EXAMPLE".to_string(),
            token: None,
        }
    }

    #[test]
    fn signs_known_request() {
        let payload =
            br#"{"DomainName":"5000.livepush.myqcloud.com","AppName":"live","TemplateId":1000}"#;

        let header = authorization(
            &credential(),
            "live",
            "live.tencentcloudapi.com",
            1551113065,
            payload,
        )
        .unwrap();

        assert_eq!(
            header,
            "TC3-HMAC-SHA256 Credential=AKIDz8krbsJ5yKBZQpn74WFkmLPx3EXAMPLE/2019-02-25/live/tc3_request, \
             SignedHeaders=content-type;host, \
             Signature=cde6d139bc41449d1634a76c3f365d593eb7b76a106c4a7189ba40af95ae3aab"
        );
    }

    #[test]
    fn signature_depends_on_payload() {
        let a = authorization(&credential(), "tsf", "tsf.tencentcloudapi.com", 1700000000, b"{}")
            .unwrap();
        let b = authorization(
            &credential(),
            "tsf",
            "tsf.tencentcloudapi.com",
            1700000000,
            br#"{"NamespaceId":"namespace-1"}"#,
        )
        .unwrap();

        assert_ne!(a, b);
        assert!(a.contains("/2023-11-14/tsf/tc3_request"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let text = format!("{:?}", credential());
        assert!(!text.contains("Gu5t9xGARNpq86cd98joQYCN3EXAMPLE"));
    }
}
