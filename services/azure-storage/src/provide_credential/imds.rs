use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use runpkg_core::time::{now, parse_rfc3339, DateTime};
use runpkg_core::{Context, Error, ProvideCredential, Result};

/// Load an ARM token from the Azure Instance Metadata Service (IMDS).
///
/// IMDS is available on Azure VMs and other Azure compute resources with a
/// managed identity.
///
/// Reference: <https://learn.microsoft.com/en-us/entra/identity/managed-identities-azure-resources/how-to-use-vm-token>
#[derive(Debug, Default, Clone)]
pub struct ImdsCredentialProvider {
    endpoint: Option<String>,
    client_id: Option<String>,
}

impl ImdsCredentialProvider {
    /// Create a new IMDS provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the token endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Pick a user assigned identity by client id.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

#[async_trait]
impl ProvideCredential for ImdsCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let token = self.get_access_token(ctx).await?;

        let expires_on = if token.expires_on.is_empty() {
            now() + chrono::TimeDelta::minutes(10)
        } else {
            parse_expires_on(&token.expires_on)?
        };

        Ok(Some(Credential::with_bearer_token(
            &token.access_token,
            Some(expires_on),
        )))
    }
}

#[derive(serde::Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_on: String,
}

/// IMDS reports `expires_on` as unix seconds, App Service as RFC 3339.
fn parse_expires_on(s: &str) -> Result<DateTime> {
    match s.parse::<i64>() {
        Ok(secs) => chrono::DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| Error::unexpected(format!("expires_on out of range: {secs}"))),
        Err(_) => parse_rfc3339(s),
    }
}

impl ImdsCredentialProvider {
    async fn get_access_token(&self, ctx: &Context) -> Result<AccessTokenResponse> {
        let envs = ctx.env_vars();

        let endpoint = self
            .endpoint
            .as_ref()
            .or_else(|| envs.get(AZURE_IMDS_ENDPOINT))
            .filter(|e| !e.is_empty())
            .map(String::as_str)
            .unwrap_or(DEFAULT_IMDS_ENDPOINT);

        let query = {
            let mut query = form_urlencoded::Serializer::new(String::new());
            query
                .append_pair("api-version", "2018-02-01")
                .append_pair("resource", ARM_RESOURCE);

            if let Some(object_id) = envs.get(AZURE_OBJECT_ID).filter(|s| !s.is_empty()) {
                query.append_pair("object_id", object_id);
            } else if let Some(client_id) = self
                .client_id
                .as_ref()
                .or_else(|| envs.get(AZURE_CLIENT_ID))
                .filter(|s| !s.is_empty())
            {
                query.append_pair("client_id", client_id);
            } else if let Some(msi_res_id) = envs.get(AZURE_MSI_RES_ID).filter(|s| !s.is_empty()) {
                query.append_pair("msi_res_id", msi_res_id);
            }
            query.finish()
        };

        let mut req = http::Request::builder()
            .method(http::Method::GET)
            .uri(format!("{endpoint}?{query}"))
            .header("Metadata", "true");

        if let Some(msi_secret) = envs.get(AZURE_MSI_SECRET).filter(|s| !s.is_empty()) {
            req = req.header("X-IDENTITY-HEADER", msi_secret);
        }

        let req = req
            .body(bytes::Bytes::new())
            .map_err(|e| Error::unexpected("failed to build IMDS request").with_source(e))?;

        let resp = ctx.http_send(req).await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = String::from_utf8_lossy(resp.body());
            return Err(Error::credential_invalid(format!(
                "IMDS request failed with status {status}: {body}"
            )));
        }

        serde_json::from_slice(resp.body())
            .map_err(|e| Error::unexpected("failed to parse IMDS response").with_source(e))
    }
}
