use super::{StorageAccountKey, StorageDataPlane};
use crate::connection_string;
use crate::constants::*;
use crate::ServiceSasRequest;
use async_trait::async_trait;
use log::debug;
use runpkg_core::{hash, Context, Error, Result, SecretString};
use std::collections::BTreeMap;

/// SharedKeyDataPlane answers the storage reads from account keys it
/// already holds, signing service SAS tokens locally.
///
/// Useful against Azurite or when the caller has an account key but no ARM
/// access. Keys never leave the process.
#[derive(Clone, Debug, Default)]
pub struct SharedKeyDataPlane {
    accounts: BTreeMap<String, Vec<SecretString>>,
}

impl SharedKeyDataPlane {
    /// Create a data plane without any account.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a base64 account key. The first key added for an account is its
    /// primary key.
    pub fn with_account_key(mut self, account_name: &str, account_key: &str) -> Self {
        self.accounts
            .entry(account_name.to_string())
            .or_default()
            .push(SecretString::new(account_key.to_string()));
        self
    }

    /// Build from a connection string carrying `AccountName` and `AccountKey`.
    pub fn from_connection_string(conn_str: &str) -> Result<Self> {
        let parsed = connection_string::parse(conn_str)?;
        match (parsed.account_name, parsed.account_key) {
            (Some(name), Some(key)) => Ok(Self::new().with_account_key(&name, key.expose())),
            _ => Err(Error::config_invalid(
                "connection string must carry AccountName and AccountKey",
            )),
        }
    }

    /// Load from `AZURE_STORAGE_CONNECTION_STRING`, or from
    /// `AZURE_STORAGE_ACCOUNT_NAME` plus `AZURE_STORAGE_ACCOUNT_KEY`.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        if let Some(conn_str) = ctx
            .env_var(AZURE_STORAGE_CONNECTION_STRING)
            .filter(|v| !v.is_empty())
        {
            return Self::from_connection_string(&conn_str);
        }

        match (
            ctx.env_var(AZURE_STORAGE_ACCOUNT_NAME),
            ctx.env_var(AZURE_STORAGE_ACCOUNT_KEY),
        ) {
            (Some(name), Some(key)) if !name.is_empty() && !key.is_empty() => {
                Ok(Self::new().with_account_key(&name, &key))
            }
            _ => Err(Error::config_invalid(format!(
                "set {AZURE_STORAGE_CONNECTION_STRING} or {AZURE_STORAGE_ACCOUNT_NAME} and {AZURE_STORAGE_ACCOUNT_KEY}"
            ))),
        }
    }

    fn keys(&self, account_name: &str) -> Result<&[SecretString]> {
        self.accounts
            .get(account_name)
            .map(Vec::as_slice)
            .filter(|keys| !keys.is_empty())
            .ok_or_else(|| {
                Error::data_plane_failed(format!("no key known for account {account_name}"))
            })
    }
}

// https://learn.microsoft.com/en-us/rest/api/storageservices/create-service-sas#version-2018-11-09-and-later
fn string_to_sign(req: &ServiceSasRequest) -> String {
    [
        req.permissions.as_str(),
        req.start.as_str(),
        req.expiry.as_str(),
        req.canonicalized_resource.as_str(),
        "", // si
        "", // sip
        req.protocols.as_str(),
        SERVICE_SAS_VERSION,
        req.resource.as_str(),
        "", // snapshot time
        req.cache_control.as_deref().unwrap_or_default(),
        req.content_disposition.as_deref().unwrap_or_default(),
        req.content_encoding.as_deref().unwrap_or_default(),
        "", // rscl
        req.content_type.as_deref().unwrap_or_default(),
    ]
    .join("\n")
}

fn sign(key: &SecretString, req: &ServiceSasRequest) -> Result<String> {
    let decoded = hash::base64_decode(key.expose())
        .map_err(|e| Error::config_invalid("account key is not valid base64").with_source(e))?;
    let signature = hash::base64_hmac_sha256(&decoded, string_to_sign(req).as_bytes());

    let mut elements: Vec<(&str, &str)> = vec![
        ("sv", SERVICE_SAS_VERSION),
        ("st", req.start.as_str()),
        ("se", req.expiry.as_str()),
        ("sr", req.resource.as_str()),
        ("sp", req.permissions.as_str()),
        ("spr", req.protocols.as_str()),
    ];
    for (k, v) in [
        ("rscc", &req.cache_control),
        ("rscd", &req.content_disposition),
        ("rsce", &req.content_encoding),
        ("rsct", &req.content_type),
    ] {
        if let Some(v) = v {
            elements.push((k, v.as_str()));
        }
    }
    elements.push(("sig", signature.as_str()));

    Ok(elements
        .into_iter()
        .map(|(k, v)| format!("{k}={}", urlencoded(v)))
        .collect::<Vec<_>>()
        .join("&"))
}

fn urlencoded(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[async_trait]
impl StorageDataPlane for SharedKeyDataPlane {
    async fn list_service_sas(&self, _: &Context, req: &ServiceSasRequest) -> Result<String> {
        let keys = self.keys(&req.account_name)?;
        let token = sign(&keys[0], req)?;

        debug!(
            "signed service sas for {} locally",
            req.canonicalized_resource
        );
        Ok(token)
    }

    async fn list_account_keys(
        &self,
        _: &Context,
        _: &str,
        account_name: &str,
    ) -> Result<Vec<StorageAccountKey>> {
        let keys = self.keys(account_name)?;

        Ok(keys
            .iter()
            .enumerate()
            .map(|(idx, value)| StorageAccountKey {
                key_name: format!("key{}", idx + 1),
                value: value.clone(),
                permissions: "FULL".to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SasPolicy;
    use pretty_assertions::assert_eq;
    use runpkg_core::time::parse_rfc3339;
    use runpkg_core::{ErrorKind, StaticEnv};
    use std::collections::HashMap;

    fn sas_request() -> ServiceSasRequest {
        let now = parse_rfc3339("2024-03-01T08:12:34Z").unwrap();
        let window = SasPolicy::default().window(now).unwrap();
        ServiceSasRequest::container_read("rg1", "storacct", "deploymentzips", &window)
    }

    #[test]
    fn test_string_to_sign() {
        assert_eq!(
            string_to_sign(&sas_request()),
            "r\n2023-03-02\n2034-02-27\n/blob/storacct/deploymentzips\n\n\nhttps\n2018-11-09\nc\n\nmax-age=5\ninline\ndeflate\n\napplication/json"
        );
    }

    #[tokio::test]
    async fn test_list_service_sas() {
        let key = hash::base64_encode(b"key");
        let dp = SharedKeyDataPlane::new().with_account_key("storacct", &key);

        let token = dp
            .list_service_sas(&Context::new(), &sas_request())
            .await
            .unwrap();
        assert_eq!(
            token,
            "sv=2018-11-09&st=2023-03-02&se=2034-02-27&sr=c&sp=r&spr=https\
             &rscc=max-age%3D5&rscd=inline&rsce=deflate&rsct=application%2Fjson\
             &sig=Ej8sm0CL09XCgkg%2FymK%2BLnc%2FJrA8az7ciqgQvv7fI44%3D"
        );
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let dp = SharedKeyDataPlane::new().with_account_key("other", "a2V5");

        let err = dp
            .list_service_sas(&Context::new(), &sas_request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataPlaneFailed);
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let dp = SharedKeyDataPlane::new().with_account_key("storacct", "not base64!");

        let err = dp
            .list_service_sas(&Context::new(), &sas_request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[tokio::test]
    async fn test_list_account_keys() {
        let dp = SharedKeyDataPlane::new()
            .with_account_key("storacct", "a2V5MQ==")
            .with_account_key("storacct", "a2V5Mg==");

        let keys = dp
            .list_account_keys(&Context::new(), "rg1", "storacct")
            .await
            .unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].key_name, "key1");
        assert_eq!(keys[0].value.expose(), "a2V5MQ==");
        assert_eq!(keys[1].key_name, "key2");
        assert_eq!(keys[1].permissions, "FULL");
    }

    #[tokio::test]
    async fn test_from_env() {
        let ctx = Context::new().with_env(StaticEnv {
            home_dir: None,
            envs: HashMap::from([(
                AZURE_STORAGE_CONNECTION_STRING.to_string(),
                "DefaultEndpointsProtocol=https;AccountName=storacct;AccountKey=a2V5".to_string(),
            )]),
        });
        let dp = SharedKeyDataPlane::from_env(&ctx).unwrap();
        let keys = dp.list_account_keys(&ctx, "rg1", "storacct").await.unwrap();
        assert_eq!(keys[0].value.expose(), "a2V5");

        let ctx = Context::new().with_env(StaticEnv {
            home_dir: None,
            envs: HashMap::from([
                (AZURE_STORAGE_ACCOUNT_NAME.to_string(), "storacct".to_string()),
                (AZURE_STORAGE_ACCOUNT_KEY.to_string(), "a2V5".to_string()),
            ]),
        });
        assert!(SharedKeyDataPlane::from_env(&ctx).is_ok());

        let err = SharedKeyDataPlane::from_env(&Context::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_connection_string_without_key() {
        let err =
            SharedKeyDataPlane::from_connection_string("BlobEndpoint=https://x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
