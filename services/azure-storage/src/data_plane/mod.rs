//! Storage data-plane operations.
//!
//! Only two reads are needed to publish a package: minting a service SAS and
//! listing account keys. Both are side-effect free on cloud state.

use crate::ServiceSasRequest;
use async_trait::async_trait;
use runpkg_core::{Context, Result, SecretString};
use serde::Deserialize;
use std::fmt::Debug;
use std::sync::Arc;

mod arm;
pub use arm::ArmDataPlane;

mod shared_key;
pub use shared_key::SharedKeyDataPlane;

/// One access key of a storage account.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountKey {
    /// `key1` or `key2`.
    pub key_name: String,
    /// The base64 key itself.
    pub value: SecretString,
    /// `FULL` or `READ`.
    #[serde(default)]
    pub permissions: String,
}

/// StorageDataPlane issues the storage data-plane reads.
#[async_trait]
pub trait StorageDataPlane: Debug + Send + Sync + 'static {
    /// Mint a service SAS token, returned without a leading `?`.
    async fn list_service_sas(&self, ctx: &Context, req: &ServiceSasRequest) -> Result<String>;

    /// List the access keys of an account, primary key first.
    async fn list_account_keys(
        &self,
        ctx: &Context,
        resource_group: &str,
        account_name: &str,
    ) -> Result<Vec<StorageAccountKey>>;
}

#[async_trait]
impl<T: StorageDataPlane> StorageDataPlane for Arc<T> {
    async fn list_service_sas(&self, ctx: &Context, req: &ServiceSasRequest) -> Result<String> {
        self.as_ref().list_service_sas(ctx, req).await
    }

    async fn list_account_keys(
        &self,
        ctx: &Context,
        resource_group: &str,
        account_name: &str,
    ) -> Result<Vec<StorageAccountKey>> {
        self.as_ref()
            .list_account_keys(ctx, resource_group, account_name)
            .await
    }
}
