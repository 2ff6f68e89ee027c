use crate::{Context, Result};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// SigningCredential is the trait used by data-plane clients to authorize requests.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is still usable.
    fn is_valid(&self) -> bool;
}

impl<T: SigningCredential> SigningCredential for Option<T> {
    fn is_valid(&self) -> bool {
        let Some(cred) = self else {
            return false;
        };

        cred.is_valid()
    }
}

/// ProvideCredential is the trait used to load credentials from the environment.
///
/// Returning `Ok(None)` means this source has nothing to offer, which lets a
/// [`ProvideCredentialChain`] move on to the next one.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this provider.
    type Credential: Send + Sync + Unpin + 'static;

    /// Load credential from current env.
    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}

#[async_trait::async_trait]
impl<P: ProvideCredential> ProvideCredential for Arc<P> {
    type Credential = P::Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.as_ref().provide_credential(ctx).await
    }
}

/// A chain of credential providers that will be tried in order.
pub struct ProvideCredentialChain<C: Send + Sync + Unpin + 'static> {
    providers: Vec<Box<dyn ProvideCredential<Credential = C>>>,
}

impl<C: Send + Sync + Unpin + 'static> ProvideCredentialChain<C> {
    /// Create a new empty credential provider chain.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a credential provider to the chain.
    pub fn push(mut self, provider: impl ProvideCredential<Credential = C>) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain holds no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl<C: Send + Sync + Unpin + 'static> Default for ProvideCredentialChain<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send + Sync + Unpin + 'static> Debug for ProvideCredentialChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvideCredentialChain")
            .field("providers", &self.providers)
            .finish()
    }
}

#[async_trait::async_trait]
impl<C: Send + Sync + Unpin + 'static> ProvideCredential for ProvideCredentialChain<C> {
    type Credential = C;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        for provider in &self.providers {
            log::debug!("trying credential provider: {provider:?}");

            match provider.provide_credential(ctx).await {
                Ok(Some(cred)) => {
                    log::debug!("loaded credential from provider: {provider:?}");
                    return Ok(Some(cred));
                }
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("error loading credential from provider {provider:?}: {e:?}");
                    continue;
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[derive(Debug)]
    struct Fixed(Option<&'static str>);

    #[async_trait::async_trait]
    impl ProvideCredential for Fixed {
        type Credential = String;

        async fn provide_credential(&self, _: &Context) -> Result<Option<String>> {
            Ok(self.0.map(|v| v.to_string()))
        }
    }

    #[derive(Debug)]
    struct Broken;

    #[async_trait::async_trait]
    impl ProvideCredential for Broken {
        type Credential = String;

        async fn provide_credential(&self, _: &Context) -> Result<Option<String>> {
            Err(Error::credential_invalid("token endpoint unreachable"))
        }
    }

    #[tokio::test]
    async fn test_chain_returns_first_success() {
        let ctx = Context::new();
        let chain = ProvideCredentialChain::new()
            .push(Broken)
            .push(Fixed(None))
            .push(Fixed(Some("first")))
            .push(Fixed(Some("second")));

        let cred = chain.provide_credential(&ctx).await.unwrap();
        assert_eq!(cred.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_chain_returns_none_when_all_fail() {
        let ctx = Context::new();
        let chain = ProvideCredentialChain::new().push(Broken).push(Fixed(None));

        assert!(chain.provide_credential(&ctx).await.unwrap().is_none());
        assert!(ProvideCredentialChain::<String>::new()
            .provide_credential(&ctx)
            .await
            .unwrap()
            .is_none());
    }
}
