use crate::provide_credential::{
    ClientSecretCredentialProvider, EnvCredentialProvider, ImdsCredentialProvider,
};
use crate::Credential;
use async_trait::async_trait;
use runpkg_core::{Context, ProvideCredential, ProvideCredentialChain, Result};

/// Default provider that tries multiple ARM credential sources in order.
///
/// 1. A pre-fetched token in `AZURE_ACCESS_TOKEN`
/// 2. Client secret (service principal)
/// 3. IMDS (managed identity)
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    chain: ProvideCredentialChain<Credential>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        let chain = ProvideCredentialChain::new()
            .push(EnvCredentialProvider::new())
            .push(ClientSecretCredentialProvider::new())
            .push(ImdsCredentialProvider::new());

        Self { chain }
    }
}

impl DefaultCredentialProvider {
    /// Create a new default provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try `provider` before the default sources.
    pub fn push_front(self, provider: impl ProvideCredential<Credential = Credential>) -> Self {
        let chain = ProvideCredentialChain::new()
            .push(provider)
            .push(self.chain);
        Self { chain }
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.chain.provide_credential(ctx).await
    }
}
