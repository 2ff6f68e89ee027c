use crate::constants::*;
use crate::SasPolicy;
use runpkg_core::{Context, Error, Result};

/// Config carries the storage settings of a provisioning run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// `subscription_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: `AZURE_SUBSCRIPTION_ID`
    ///
    /// Only required by the ARM data plane.
    pub subscription_id: Option<String>,
    /// Storage endpoint suffix, `core.windows.net` in the public cloud.
    ///
    /// - env value: `RUNPKG_STORAGE_ENDPOINT_SUFFIX`
    pub endpoint_suffix: String,
    /// Azure Resource Manager endpoint.
    ///
    /// - env value: `AZURE_RESOURCE_MANAGER_ENDPOINT`
    pub arm_endpoint: String,
    /// Validity window of minted SAS tokens.
    ///
    /// - env values: `RUNPKG_SAS_BACKDATE_DAYS`, `RUNPKG_SAS_VALIDITY_DAYS`
    pub sas_policy: SasPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            subscription_id: None,
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            arm_endpoint: DEFAULT_ARM_ENDPOINT.to_string(),
            sas_policy: SasPolicy::default(),
        }
    }
}

impl Config {
    /// Load config from env, keeping defaults for unset values.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = non_empty(ctx, AZURE_SUBSCRIPTION_ID) {
            config.subscription_id = Some(v);
        }
        if let Some(v) = non_empty(ctx, RUNPKG_STORAGE_ENDPOINT_SUFFIX) {
            config.endpoint_suffix = v;
        }
        if let Some(v) = non_empty(ctx, AZURE_RESOURCE_MANAGER_ENDPOINT) {
            config.arm_endpoint = v.trim_end_matches('/').to_string();
        }

        let backdate = parse_days(ctx, RUNPKG_SAS_BACKDATE_DAYS)?;
        let validity = parse_days(ctx, RUNPKG_SAS_VALIDITY_DAYS)?;
        if backdate.is_some() || validity.is_some() {
            config.sas_policy = SasPolicy::from_days(
                backdate.unwrap_or(DEFAULT_SAS_BACKDATE_DAYS),
                validity.unwrap_or(DEFAULT_SAS_VALIDITY_DAYS),
            )?;
        }

        Ok(config)
    }

    /// Set the subscription id.
    pub fn with_subscription_id(mut self, subscription_id: impl Into<String>) -> Self {
        self.subscription_id = Some(subscription_id.into());
        self
    }

    /// Set the storage endpoint suffix.
    pub fn with_endpoint_suffix(mut self, endpoint_suffix: impl Into<String>) -> Self {
        self.endpoint_suffix = endpoint_suffix.into();
        self
    }

    /// Set the ARM endpoint.
    pub fn with_arm_endpoint(mut self, arm_endpoint: impl Into<String>) -> Self {
        self.arm_endpoint = arm_endpoint.into();
        self
    }

    /// Set the SAS policy.
    pub fn with_sas_policy(mut self, sas_policy: SasPolicy) -> Self {
        self.sas_policy = sas_policy;
        self
    }
}

fn non_empty(ctx: &Context, key: &str) -> Option<String> {
    ctx.env_var(key).filter(|v| !v.trim().is_empty())
}

fn parse_days(ctx: &Context, key: &str) -> Result<Option<i64>> {
    let Some(v) = non_empty(ctx, key) else {
        return Ok(None);
    };

    v.trim().parse::<i64>().map(Some).map_err(|e| {
        Error::config_invalid(format!("{key} must be a whole number of days, got {v:?}"))
            .with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;
    use runpkg_core::{ErrorKind, StaticEnv};
    use std::collections::HashMap;

    fn ctx(envs: &[(&str, &str)]) -> Context {
        Context::new().with_env(StaticEnv {
            home_dir: None,
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        })
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env(&ctx(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.endpoint_suffix, "core.windows.net");
        assert_eq!(config.arm_endpoint, "https://management.azure.com");
        assert_eq!(config.sas_policy.validity(), TimeDelta::days(3650));
    }

    #[test]
    fn test_from_env() {
        let config = Config::from_env(&ctx(&[
            (AZURE_SUBSCRIPTION_ID, "00000000-0000-0000-0000-000000000000"),
            (RUNPKG_STORAGE_ENDPOINT_SUFFIX, "core.chinacloudapi.cn"),
            (AZURE_RESOURCE_MANAGER_ENDPOINT, "https://management.chinacloudapi.cn/"),
            (RUNPKG_SAS_VALIDITY_DAYS, "30"),
        ]))
        .unwrap();

        assert_eq!(
            config.subscription_id.as_deref(),
            Some("00000000-0000-0000-0000-000000000000")
        );
        assert_eq!(config.endpoint_suffix, "core.chinacloudapi.cn");
        assert_eq!(config.arm_endpoint, "https://management.chinacloudapi.cn");
        assert_eq!(config.sas_policy.backdate(), TimeDelta::days(365));
        assert_eq!(config.sas_policy.validity(), TimeDelta::days(30));
    }

    #[test]
    fn test_invalid_days() {
        let err = Config::from_env(&ctx(&[(RUNPKG_SAS_BACKDATE_DAYS, "a year")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = Config::from_env(&ctx(&[(RUNPKG_SAS_VALIDITY_DAYS, "0")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
