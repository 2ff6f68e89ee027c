use super::{StorageAccountKey, StorageDataPlane};
use crate::constants::*;
use crate::{Config, Credential, ServiceSasRequest};
use async_trait::async_trait;
use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use runpkg_core::utils::Redact;
use runpkg_core::{Context, Error, ProvideCredential, Result, SigningCredential};
use serde::Deserialize;
use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex};

/// Characters left as is in a path segment.
static PATH_SEGMENT: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// ArmDataPlane issues the storage reads through Azure Resource Manager.
///
/// - `POST .../storageAccounts/{account}/ListServiceSas`
/// - `POST .../storageAccounts/{account}/listKeys`
///
/// The bearer token is loaded from the configured provider and cached until
/// it is no longer valid.
#[derive(Clone)]
pub struct ArmDataPlane {
    subscription_id: String,
    arm_endpoint: String,
    provider: Arc<dyn ProvideCredential<Credential = Credential>>,
    credential: Arc<Mutex<Option<Credential>>>,
}

impl Debug for ArmDataPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArmDataPlane")
            .field("subscription_id", &self.subscription_id)
            .field("arm_endpoint", &self.arm_endpoint)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListServiceSasResponse {
    service_sas_token: String,
}

#[derive(Deserialize)]
struct ListKeysResponse {
    #[serde(default)]
    keys: Vec<StorageAccountKey>,
}

impl ArmDataPlane {
    /// Create a data plane for the subscription in `config`.
    pub fn new(
        config: &Config,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Result<Self> {
        let subscription_id = config
            .subscription_id
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::config_invalid(format!(
                    "subscription id is required, set {AZURE_SUBSCRIPTION_ID}"
                ))
            })?;

        Ok(Self {
            subscription_id,
            arm_endpoint: config.arm_endpoint.trim_end_matches('/').to_string(),
            provider: Arc::new(provider),
            credential: Arc::new(Mutex::new(None)),
        })
    }

    fn account_url(&self, resource_group: &str, account_name: &str, action: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/storageAccounts/{}/{action}?api-version={ARM_API_VERSION}",
            self.arm_endpoint,
            utf8_percent_encode(&self.subscription_id, &PATH_SEGMENT),
            utf8_percent_encode(resource_group, &PATH_SEGMENT),
            utf8_percent_encode(account_name, &PATH_SEGMENT),
        )
    }

    async fn credential(&self, ctx: &Context) -> Result<Credential> {
        let cached = self.credential.lock().expect("lock poisoned").clone();
        if let Some(cred) = cached.filter(|c| c.is_valid()) {
            return Ok(cred);
        }

        let cred = self
            .provider
            .provide_credential(ctx)
            .await?
            .filter(|c| c.is_valid())
            .ok_or_else(|| {
                Error::credential_invalid("no valid azure resource manager credential found")
            })?;
        *self.credential.lock().expect("lock poisoned") = Some(cred.clone());
        Ok(cred)
    }

    async fn post(&self, ctx: &Context, url: &str, body: Bytes) -> Result<Bytes> {
        let cred = self.credential(ctx).await?;

        let req = http::Request::builder()
            .method(http::Method::POST)
            .uri(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, {
                let mut value: HeaderValue =
                    format!("Bearer {}", cred.token).parse().map_err(|e| {
                        Error::unexpected("failed to parse authorization header").with_source(e)
                    })?;
                value.set_sensitive(true);
                value
            })
            .body(body)?;

        debug!("sending data-plane request: POST {url}");
        let resp = ctx.http_send(req).await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.into_body());
        }

        if status == StatusCode::UNAUTHORIZED {
            self.credential.lock().expect("lock poisoned").take();
        }
        Err(Error::data_plane_failed(format!(
            "{url} failed with status {status}: {}",
            String::from_utf8_lossy(resp.body())
        )))
    }
}

#[async_trait]
impl StorageDataPlane for ArmDataPlane {
    async fn list_service_sas(&self, ctx: &Context, req: &ServiceSasRequest) -> Result<String> {
        let url = self.account_url(&req.resource_group, &req.account_name, "ListServiceSas");
        let body = serde_json::to_vec(req)?;

        let resp = self.post(ctx, &url, Bytes::from(body)).await?;
        let resp: ListServiceSasResponse = serde_json::from_slice(&resp).map_err(|e| {
            Error::data_plane_failed("malformed ListServiceSas response").with_source(e)
        })?;

        debug!(
            "minted service sas for {}: {:?}",
            req.canonicalized_resource,
            Redact::from(&resp.service_sas_token)
        );
        Ok(resp.service_sas_token)
    }

    async fn list_account_keys(
        &self,
        ctx: &Context,
        resource_group: &str,
        account_name: &str,
    ) -> Result<Vec<StorageAccountKey>> {
        let url = self.account_url(resource_group, account_name, "listKeys");

        let resp = self.post(ctx, &url, Bytes::new()).await?;
        let resp: ListKeysResponse = serde_json::from_slice(&resp)
            .map_err(|e| Error::data_plane_failed("malformed listKeys response").with_source(e))?;

        debug!("listed {} keys of account {account_name}", resp.keys.len());
        Ok(resp.keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHttpSend;
    use crate::{SasPolicy, StaticCredentialProvider};
    use pretty_assertions::assert_eq;
    use runpkg_core::time::parse_rfc3339;
    use runpkg_core::ErrorKind;

    const ACCOUNT_PATH: &str = "/subscriptions/sub/resourceGroups/rg1/providers/Microsoft.Storage/storageAccounts/storacct";

    fn data_plane() -> ArmDataPlane {
        let config = Config::default().with_subscription_id("sub");
        ArmDataPlane::new(&config, StaticCredentialProvider::new("armtoken")).unwrap()
    }

    fn sas_request() -> ServiceSasRequest {
        let now = parse_rfc3339("2024-03-01T08:12:34Z").unwrap();
        let window = SasPolicy::default().window(now).unwrap();
        ServiceSasRequest::container_read("rg1", "storacct", "deploymentzips", &window)
    }

    #[test]
    fn test_subscription_required() {
        let err = ArmDataPlane::new(&Config::default(), StaticCredentialProvider::new("t"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[tokio::test]
    async fn test_list_service_sas() {
        let http = MockHttpSend::new().with_response(
            &format!("{ACCOUNT_PATH}/ListServiceSas"),
            200,
            r#"{"serviceSasToken":"sv=X&sig=Y"}"#,
        );
        let ctx = Context::new().with_http_send(http.clone());

        let token = data_plane()
            .list_service_sas(&ctx, &sas_request())
            .await
            .unwrap();
        assert_eq!(token, "sv=X&sig=Y");

        let reqs = http.requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].method(), http::Method::POST);
        assert_eq!(
            reqs[0].uri().to_string(),
            format!("https://management.azure.com{ACCOUNT_PATH}/ListServiceSas?api-version=2023-01-01")
        );
        assert_eq!(reqs[0].headers()[header::AUTHORIZATION], "Bearer armtoken");
        assert!(reqs[0].headers()[header::AUTHORIZATION].is_sensitive());

        let body: serde_json::Value = serde_json::from_slice(reqs[0].body()).unwrap();
        assert_eq!(body["canonicalizedResource"], "/blob/storacct/deploymentzips");
        assert_eq!(body["signedResource"], "c");
        assert_eq!(body["signedPermission"], "r");
        assert_eq!(body["signedProtocol"], "https");
    }

    #[tokio::test]
    async fn test_list_account_keys() {
        let http = MockHttpSend::new().with_response(
            &format!("{ACCOUNT_PATH}/listKeys"),
            200,
            r#"{"keys":[
                {"keyName":"key1","value":"abc123","permissions":"FULL","creationTime":"2024-03-01T08:12:34Z"},
                {"keyName":"key2","value":"def456","permissions":"FULL"}
            ]}"#,
        );
        let ctx = Context::new().with_http_send(http);

        let keys = data_plane()
            .list_account_keys(&ctx, "rg1", "storacct")
            .await
            .unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].key_name, "key1");
        assert_eq!(keys[0].value.expose(), "abc123");
        assert!(!format!("{:?}", keys[0]).contains("abc123"));
    }

    #[tokio::test]
    async fn test_failure_status() {
        let http = MockHttpSend::new().with_response(
            &format!("{ACCOUNT_PATH}/listKeys"),
            403,
            r#"{"error":{"code":"AuthorizationFailed"}}"#,
        );
        let ctx = Context::new().with_http_send(http);

        let err = data_plane()
            .list_account_keys(&ctx, "rg1", "storacct")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataPlaneFailed);
        assert!(err.to_string().contains("AuthorizationFailed"));
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let http = MockHttpSend::new().with_response(
            &format!("{ACCOUNT_PATH}/ListServiceSas"),
            200,
            r#"{"unexpected":true}"#,
        );
        let ctx = Context::new().with_http_send(http);

        let err = data_plane()
            .list_service_sas(&ctx, &sas_request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataPlaneFailed);
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let config = Config::default().with_subscription_id("sub");
        let dp = ArmDataPlane::new(&config, crate::EnvCredentialProvider::new()).unwrap();

        let err = dp
            .list_account_keys(&Context::new(), "rg1", "storacct")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
    }
}
