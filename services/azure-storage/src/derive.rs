use crate::connection_string;
use crate::data_plane::StorageDataPlane;
use crate::{Config, SasPolicy, ServiceSasRequest};
use log::debug;
use runpkg_core::time::now;
use runpkg_core::utils::redact_query;
use runpkg_core::{Context, Error, Input, Output, Result};
use std::sync::Arc;

/// Deriver turns storage identities into the values an app is configured
/// with: a signed read url for its package and the account's access key.
///
/// Every value is derived lazily. Nothing is sent to the data plane until
/// all the names it depends on have resolved, and each derived value sends
/// at most one request no matter how many consumers read it.
#[derive(Clone, Debug)]
pub struct Deriver {
    ctx: Context,
    data_plane: Arc<dyn StorageDataPlane>,
    endpoint_suffix: String,
    sas_policy: SasPolicy,
}

impl Deriver {
    /// Create a deriver with the default endpoint suffix and SAS policy.
    pub fn new(ctx: Context, data_plane: impl StorageDataPlane) -> Self {
        let config = Config::default();
        Self {
            ctx,
            data_plane: Arc::new(data_plane),
            endpoint_suffix: config.endpoint_suffix,
            sas_policy: config.sas_policy,
        }
    }

    /// Take the endpoint suffix and SAS policy from `config`.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.endpoint_suffix = config.endpoint_suffix.clone();
        self.sas_policy = config.sas_policy;
        self
    }

    /// Set the storage endpoint suffix.
    pub fn with_endpoint_suffix(mut self, endpoint_suffix: impl Into<String>) -> Self {
        self.endpoint_suffix = endpoint_suffix.into();
        self
    }

    /// Set the SAS policy.
    pub fn with_sas_policy(mut self, sas_policy: SasPolicy) -> Self {
        self.sas_policy = sas_policy;
        self
    }

    /// Derive a read-only https url for `blob`, signed with a container
    /// scoped service SAS.
    ///
    /// The url has the form
    /// `https://{account}.blob.{suffix}/{container}/{blob}?{token}`.
    pub fn signed_blob_read_url(
        &self,
        blob: impl Into<Input<String>>,
        container: impl Into<Input<String>>,
        account: impl Into<Input<String>>,
        resource_group: impl Into<Input<String>>,
    ) -> Result<Output<String>> {
        let names = Output::all([
            blob.into().into_output(),
            container.into().into_output(),
            account.into().into_output(),
            resource_group.into().into_output(),
        ])?;

        let this = self.clone();
        Ok(names.apply_async(move |names| async move {
            let [blob, container, account, resource_group] = names.as_slice() else {
                return Err(Error::unexpected("expected four resolved names"));
            };

            let window = this.sas_policy.window(now())?;
            let req = ServiceSasRequest::container_read(resource_group, account, container, &window);
            let token = this.data_plane.list_service_sas(&this.ctx, &req).await?;

            let url = format_blob_url(&this.endpoint_suffix, account, container, blob, &token);
            debug!("derived signed blob url: {}", redact_query(&url));
            Ok(url)
        }))
    }

    /// Derive the connection string of `account`, built from its primary key.
    ///
    /// The result is always secret. With a non-default endpoint suffix, such
    /// as `core.chinacloudapi.cn`, the string ends with `EndpointSuffix` so
    /// clients do not fall back to the public cloud.
    pub fn connection_string(
        &self,
        resource_group: impl Into<Input<String>>,
        account: impl Into<Input<String>>,
    ) -> Result<Output<String>> {
        let account = account.into().into_output();
        let key = self.primary_key(resource_group, &account)?;

        let endpoint_suffix = self.endpoint_suffix.clone();
        Ok(account.zip(&key).apply(move |(account, key)| {
            connection_string::build(account, key, &endpoint_suffix)
        }))
    }

    /// Derive the primary access key of `account`.
    ///
    /// The result is always secret.
    pub fn primary_key(
        &self,
        resource_group: impl Into<Input<String>>,
        account: impl Into<Input<String>>,
    ) -> Result<Output<String>> {
        let names = Output::all([
            resource_group.into().into_output(),
            account.into().into_output(),
        ])?;

        let this = self.clone();
        let key = names.apply_async(move |names| async move {
            let [resource_group, account] = names.as_slice() else {
                return Err(Error::unexpected("expected two resolved names"));
            };

            let keys = this
                .data_plane
                .list_account_keys(&this.ctx, resource_group, account)
                .await?;
            let primary = keys.into_iter().next().ok_or_else(|| {
                Error::data_plane_failed(format!("account {account} has no access keys"))
            })?;

            debug!("retrieved {} of account {account}", primary.key_name);
            Ok(primary.value.into_inner())
        });
        Ok(key.into_secret())
    }
}

/// Format the url of a blob carrying a SAS token.
///
/// A leading `?` on the token is tolerated.
pub fn format_blob_url(
    endpoint_suffix: &str,
    account: &str,
    container: &str,
    blob: &str,
    token: &str,
) -> String {
    format!(
        "https://{account}.blob.{endpoint_suffix}/{container}/{blob}?{}",
        token.trim_start_matches('?')
    )
}
