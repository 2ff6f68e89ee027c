// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use runpkg_core::time::now;
use runpkg_core::{Context, Error, ProvideCredential, Result};

/// Load an ARM token with a service principal's client secret.
///
/// Values not set on the provider are read from `AZURE_TENANT_ID`,
/// `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET` and `AZURE_AUTHORITY_HOST`.
///
/// Reference: <https://learn.microsoft.com/en-us/entra/identity-platform/v2-oauth2-client-creds-grant-flow>
#[derive(Debug, Default, Clone)]
pub struct ClientSecretCredentialProvider {
    tenant_id: Option<String>,
    client_id: Option<String>,
    authority_host: Option<String>,
}

impl ClientSecretCredentialProvider {
    /// Create a new client secret provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tenant ID.
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the client ID.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the authority host, for sovereign clouds.
    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = Some(authority_host.into());
        self
    }
}

#[async_trait]
impl ProvideCredential for ClientSecretCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let envs = ctx.env_vars();

        let Some(tenant_id) = self
            .tenant_id
            .as_ref()
            .or_else(|| envs.get(AZURE_TENANT_ID))
            .filter(|v| !v.is_empty())
        else {
            return Ok(None);
        };
        let Some(client_id) = self
            .client_id
            .as_ref()
            .or_else(|| envs.get(AZURE_CLIENT_ID))
            .filter(|v| !v.is_empty())
        else {
            return Ok(None);
        };
        let Some(client_secret) = envs.get(AZURE_CLIENT_SECRET).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        let authority_host = self
            .authority_host
            .as_ref()
            .or_else(|| envs.get(AZURE_AUTHORITY_HOST))
            .filter(|v| !v.is_empty())
            .map(String::as_str)
            .unwrap_or(DEFAULT_AUTHORITY_HOST);

        let token =
            get_client_secret_token(tenant_id, client_id, client_secret, authority_host, ctx)
                .await?;
        let expires_on = now()
            + chrono::TimeDelta::try_seconds(token.expires_in as i64)
                .unwrap_or_else(|| chrono::TimeDelta::minutes(10));

        Ok(Some(Credential::with_bearer_token(
            &token.access_token,
            Some(expires_on),
        )))
    }
}

#[derive(serde::Deserialize)]
struct ClientSecretTokenResponse {
    access_token: String,
    expires_in: u64,
}

async fn get_client_secret_token(
    tenant_id: &str,
    client_id: &str,
    client_secret: &str,
    authority_host: &str,
    ctx: &Context,
) -> Result<ClientSecretTokenResponse> {
    let url = format!(
        "{}/{}/oauth2/v2.0/token",
        authority_host.trim_end_matches('/'),
        tenant_id
    );

    let body = form_urlencoded::Serializer::new(String::new())
        .append_pair("scope", ARM_SCOPE)
        .append_pair("client_id", client_id)
        .append_pair("client_secret", client_secret)
        .append_pair("grant_type", "client_credentials")
        .finish();

    let req = http::Request::builder()
        .method(http::Method::POST)
        .uri(&url)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(bytes::Bytes::from(body))
        .map_err(|e| Error::unexpected("failed to build client secret request").with_source(e))?;

    let resp = ctx.http_send(req).await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = String::from_utf8_lossy(resp.body());
        return Err(Error::credential_invalid(format!(
            "client secret request failed with status {status}: {body}"
        )));
    }

    serde_json::from_slice(resp.body())
        .map_err(|e| Error::unexpected("failed to parse client secret response").with_source(e))
}
