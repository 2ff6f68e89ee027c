use crate::constants::*;
use chrono::TimeDelta;
use runpkg_core::time::{format_date, DateTime};
use runpkg_core::{Error, Result};
use serde::Serialize;

/// SasPolicy decides the validity window of minted SAS tokens.
///
/// The start is backdated so that a token minted on a host whose clock runs
/// ahead of the storage service is usable right away, and the expiry is far
/// enough out that a deployed app keeps reading its package.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SasPolicy {
    backdate: TimeDelta,
    validity: TimeDelta,
}

impl Default for SasPolicy {
    fn default() -> Self {
        Self {
            backdate: TimeDelta::days(DEFAULT_SAS_BACKDATE_DAYS),
            validity: TimeDelta::days(DEFAULT_SAS_VALIDITY_DAYS),
        }
    }
}

impl SasPolicy {
    /// Create a policy from a backdate and a validity, both in days.
    pub fn from_days(backdate_days: i64, validity_days: i64) -> Result<Self> {
        if backdate_days < 0 {
            return Err(Error::config_invalid(format!(
                "sas backdate must not be negative, got {backdate_days} days"
            )));
        }
        if validity_days <= 0 {
            return Err(Error::config_invalid(format!(
                "sas validity must be positive, got {validity_days} days"
            )));
        }

        let backdate = TimeDelta::try_days(backdate_days)
            .ok_or_else(|| Error::config_invalid("sas backdate is out of range"))?;
        let validity = TimeDelta::try_days(validity_days)
            .ok_or_else(|| Error::config_invalid("sas validity is out of range"))?;
        Ok(Self { backdate, validity })
    }

    /// How far before now a token becomes valid.
    pub fn backdate(&self) -> TimeDelta {
        self.backdate
    }

    /// How far after now a token stays valid.
    pub fn validity(&self) -> TimeDelta {
        self.validity
    }

    /// Compute the window of a token minted at `now`.
    pub fn window(&self, now: DateTime) -> Result<SasWindow> {
        let start = now
            .checked_sub_signed(self.backdate)
            .ok_or_else(|| Error::config_invalid("sas start is out of range"))?;
        let expiry = now
            .checked_add_signed(self.validity)
            .ok_or_else(|| Error::config_invalid("sas expiry is out of range"))?;

        if start >= expiry {
            return Err(Error::config_invalid(format!(
                "sas window is empty: start {start} is not before expiry {expiry}"
            )));
        }
        Ok(SasWindow { start, expiry })
    }
}

/// The validity window of one SAS token, `[start, expiry)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SasWindow {
    /// First instant the token is valid.
    pub start: DateTime,
    /// First instant the token is no longer valid.
    pub expiry: DateTime,
}

/// The kind of storage object a service SAS grants access to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SignedResource {
    /// Every blob in a container.
    #[serde(rename = "c")]
    Container,
}

impl SignedResource {
    /// The `sr` value of this resource.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignedResource::Container => "c",
        }
    }
}

/// ServiceSasRequest describes the service SAS to mint.
///
/// It serializes into the body of the ARM `ListServiceSas` operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceSasRequest {
    /// Resource group holding the storage account.
    #[serde(skip)]
    pub resource_group: String,
    /// Storage account name.
    #[serde(skip)]
    pub account_name: String,
    /// `/blob/{account}/{container}` for container scoped tokens.
    #[serde(rename = "canonicalizedResource")]
    pub canonicalized_resource: String,
    /// `sr`
    #[serde(rename = "signedResource")]
    pub resource: SignedResource,
    /// `sp`
    #[serde(rename = "signedPermission")]
    pub permissions: String,
    /// `spr`
    #[serde(rename = "signedProtocol")]
    pub protocols: String,
    /// `st`, formatted as `yyyy-MM-dd`.
    #[serde(rename = "signedStart")]
    pub start: String,
    /// `se`, formatted as `yyyy-MM-dd`.
    #[serde(rename = "signedExpiry")]
    pub expiry: String,
    /// `rscc`
    #[serde(rename = "rscc", skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    /// `rscd`
    #[serde(rename = "rscd", skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,
    /// `rsce`
    #[serde(rename = "rsce", skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    /// `rsct`
    #[serde(rename = "rsct", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ServiceSasRequest {
    /// Read-only, https-only access to the blobs of one container.
    pub fn container_read(
        resource_group: &str,
        account_name: &str,
        container: &str,
        window: &SasWindow,
    ) -> Self {
        Self {
            resource_group: resource_group.to_string(),
            account_name: account_name.to_string(),
            canonicalized_resource: format!("/blob/{account_name}/{container}"),
            resource: SignedResource::Container,
            permissions: "r".to_string(),
            protocols: "https".to_string(),
            start: format_date(window.start),
            expiry: format_date(window.expiry),
            cache_control: Some("max-age=5".to_string()),
            content_disposition: Some("inline".to_string()),
            content_encoding: Some("deflate".to_string()),
            content_type: Some("application/json".to_string()),
        }
    }
}
