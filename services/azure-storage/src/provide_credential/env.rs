use async_trait::async_trait;
use runpkg_core::{Context, ProvideCredential, Result};

use crate::constants::AZURE_ACCESS_TOKEN;
use crate::credential::Credential;

/// EnvCredentialProvider reads a pre-fetched ARM token from `AZURE_ACCESS_TOKEN`.
///
/// This is what `az account get-access-token` hands out in CI pipelines.
#[derive(Clone, Debug, Default)]
pub struct EnvCredentialProvider {}

impl EnvCredentialProvider {
    /// Create a new env provider.
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        Ok(ctx
            .env_var(AZURE_ACCESS_TOKEN)
            .filter(|token| !token.is_empty())
            .map(|token| Credential::with_bearer_token(&token, None)))
    }
}
