use std::collections::HashMap;

use crate::constants::DEFAULT_ENDPOINT_SUFFIX;

use runpkg_core::{Error, Result, SecretString};

// Azurite defaults.
const AZURITE_DEFAULT_STORAGE_ACCOUNT_NAME: &str = "devstoreaccount1";
const AZURITE_DEFAULT_STORAGE_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const AZURITE_DEFAULT_BLOB_URI: &str = "http://127.0.0.1:10000";

/// Build the connection string apps use to reach a storage account.
///
/// `EndpointSuffix` is only written outside the public cloud, so public
/// cloud accounts get the plain three-part form.
pub fn build(account_name: &str, account_key: &str, endpoint_suffix: &str) -> String {
    let mut conn =
        format!("DefaultEndpointsProtocol=https;AccountName={account_name};AccountKey={account_key}");
    if endpoint_suffix != DEFAULT_ENDPOINT_SUFFIX {
        conn.push_str(";EndpointSuffix=");
        conn.push_str(endpoint_suffix);
    }
    conn
}

/// The parts of an [Azure storage connection string][1] runpkg cares about.
///
/// [1]: https://learn.microsoft.com/en-us/azure/storage/common/storage-configure-connection-string
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionString {
    /// `AccountName`
    pub account_name: Option<String>,
    /// `AccountKey`
    pub account_key: Option<SecretString>,
    /// `SharedAccessSignature`
    pub sas_token: Option<SecretString>,
    /// Blob endpoint, either given as `BlobEndpoint` or built from
    /// `DefaultEndpointsProtocol`, `AccountName` and `EndpointSuffix`.
    pub blob_endpoint: Option<String>,
}

/// Parse a connection string.
///
/// `UseDevelopmentStorage=true` resolves to the local Azurite account unless
/// the account name, key or proxy uri are overridden.
pub fn parse(conn_str: &str) -> Result<ConnectionString> {
    let key_values = parse_into_key_values(conn_str)?;

    if key_values.get("UseDevelopmentStorage").map(String::as_str) == Some("true") {
        let account_name = key_values
            .get("AccountName")
            .cloned()
            .unwrap_or_else(|| AZURITE_DEFAULT_STORAGE_ACCOUNT_NAME.to_string());
        let account_key = key_values
            .get("AccountKey")
            .cloned()
            .unwrap_or_else(|| AZURITE_DEFAULT_STORAGE_ACCOUNT_KEY.to_string());
        let proxy_uri = key_values
            .get("DevelopmentStorageProxyUri")
            .map(String::as_str)
            .unwrap_or(AZURITE_DEFAULT_BLOB_URI);

        return Ok(ConnectionString {
            blob_endpoint: Some(format!("{proxy_uri}/{account_name}")),
            account_name: Some(account_name),
            account_key: Some(SecretString::new(account_key)),
            sas_token: None,
        });
    }

    let blob_endpoint = match key_values.get("BlobEndpoint") {
        Some(endpoint) => Some(endpoint.clone()),
        None => blob_endpoint_from_parts(&key_values)?,
    };

    Ok(ConnectionString {
        account_name: key_values.get("AccountName").cloned(),
        account_key: key_values.get("AccountKey").cloned().map(SecretString::new),
        sas_token: key_values
            .get("SharedAccessSignature")
            .cloned()
            .map(SecretString::new),
        blob_endpoint,
    })
}

fn parse_into_key_values(conn_str: &str) -> Result<HashMap<String, String>> {
    conn_str
        .trim()
        .replace('\n', "")
        .split(';')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .enumerate()
        .map(|(idx, field)| {
            // Values such as base64 keys contain `=`, so split on the first one.
            let (key, value) = field.split_once('=').ok_or_else(|| {
                Error::config_invalid(format!(
                    "invalid connection string, field {idx} has no '='"
                ))
            })?;
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

fn blob_endpoint_from_parts(key_values: &HashMap<String, String>) -> Result<Option<String>> {
    let (Some(account_name), Some(endpoint_suffix)) = (
        key_values.get("AccountName"),
        key_values.get("EndpointSuffix"),
    ) else {
        return Ok(None);
    };

    let protocol = key_values
        .get("DefaultEndpointsProtocol")
        .map(String::as_str)
        .unwrap_or("https");
    if protocol != "http" && protocol != "https" {
        return Err(Error::config_invalid(format!(
            "invalid DefaultEndpointsProtocol: {protocol}"
        )));
    }

    Ok(Some(format!(
        "{protocol}://{account_name}.blob.{endpoint_suffix}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn secret(v: &str) -> Option<SecretString> {
        Some(SecretString::new(v.to_string()))
    }

    #[test]
    fn test_build() {
        assert_eq!(
            build("storacct", "abc123", DEFAULT_ENDPOINT_SUFFIX),
            "DefaultEndpointsProtocol=https;AccountName=storacct;AccountKey=abc123"
        );
    }

    #[test]
    fn test_build_then_parse() {
        let parsed = parse(&build("storacct", "a2V5PQ==", DEFAULT_ENDPOINT_SUFFIX)).unwrap();
        assert_eq!(parsed.account_name.as_deref(), Some("storacct"));
        assert_eq!(parsed.account_key, secret("a2V5PQ=="));
        assert_eq!(parsed.blob_endpoint, None);
    }

    #[test]
    fn test_parse() {
        let test_cases = vec![
            ("blob endpoint only",
                "BlobEndpoint=https://storacct.blob.core.windows.net/",
                Some(ConnectionString {
                    blob_endpoint: Some("https://storacct.blob.core.windows.net/".to_string()),
                    ..Default::default()
                }),
            ),
            ("account key and endpoint from parts",
                "DefaultEndpointsProtocol=https;AccountName=storacct;AccountKey=abc123;EndpointSuffix=core.windows.net",
                Some(ConnectionString {
                    account_name: Some("storacct".to_string()),
                    account_key: secret("abc123"),
                    blob_endpoint: Some("https://storacct.blob.core.windows.net".to_string()),
                    ..Default::default()
                }),
            ),
            ("sovereign cloud suffix without protocol",
                "AccountName=storacct;EndpointSuffix=core.chinacloudapi.cn",
                Some(ConnectionString {
                    account_name: Some("storacct".to_string()),
                    blob_endpoint: Some("https://storacct.blob.core.chinacloudapi.cn".to_string()),
                    ..Default::default()
                }),
            ),
            ("sas token",
                "BlobEndpoint=https://storacct.blob.core.windows.net;SharedAccessSignature=sv=2018-11-09&sig=abc",
                Some(ConnectionString {
                    sas_token: secret("sv=2018-11-09&sig=abc"),
                    blob_endpoint: Some("https://storacct.blob.core.windows.net".to_string()),
                    ..Default::default()
                }),
            ),
            ("development storage",
                "UseDevelopmentStorage=true",
                Some(ConnectionString {
                    account_name: Some("devstoreaccount1".to_string()),
                    account_key: secret(AZURITE_DEFAULT_STORAGE_ACCOUNT_KEY),
                    blob_endpoint: Some("http://127.0.0.1:10000/devstoreaccount1".to_string()),
                    ..Default::default()
                }),
            ),
            ("development storage with custom proxy",
                "UseDevelopmentStorage=true;DevelopmentStorageProxyUri=http://127.0.0.1:12345;AccountName=local",
                Some(ConnectionString {
                    account_name: Some("local".to_string()),
                    account_key: secret(AZURITE_DEFAULT_STORAGE_ACCOUNT_KEY),
                    blob_endpoint: Some("http://127.0.0.1:12345/local".to_string()),
                    ..Default::default()
                }),
            ),
            ("line breaks and stray separators",
                ";\n    AccountName=storacct;\n    AccountKey=abc123;\n",
                Some(ConnectionString {
                    account_name: Some("storacct".to_string()),
                    account_key: secret("abc123"),
                    ..Default::default()
                }),
            ),
            ("missing equals",
                "AccountNamestoracct;AccountKey=abc123",
                None,
            ),
            ("invalid protocol",
                "DefaultEndpointsProtocol=ftp;AccountName=storacct;EndpointSuffix=core.windows.net",
                None,
            ),
        ];

        for (name, conn_str, expected) in test_cases {
            let actual = parse(conn_str);

            match expected {
                Some(expected) => assert_eq!(actual.unwrap(), expected, "case: {name}"),
                None => assert!(actual.is_err(), "expected error for case: {name}"),
            }
        }
    }

    #[test]
    fn test_parse_error_hides_key() {
        let err = parse("AccountName=storacct;abc123secretkey").unwrap_err();
        assert!(err.to_string().contains("field 1"));
        assert!(!err.to_string().contains("abc123secretkey"));
    }
}
