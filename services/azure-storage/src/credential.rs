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

use runpkg_core::time::{now, DateTime};
use runpkg_core::utils::Redact;
use runpkg_core::SigningCredential;
use std::fmt::{Debug, Formatter};

/// Credential is an Azure Resource Manager bearer token.
#[derive(Clone)]
pub struct Credential {
    /// Bearer token.
    pub token: String,
    /// Expiration time for this credential.
    pub expires_in: Option<DateTime>,
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &Redact::from(&self.token))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl SigningCredential for Credential {
    fn is_valid(&self) -> bool {
        if self.token.is_empty() {
            return false;
        }
        // Take 20s as buffer to avoid a token expiring mid request.
        match self.expires_in {
            Some(expires) => expires > now() + chrono::TimeDelta::seconds(20),
            None => true,
        }
    }
}

impl Credential {
    /// Create a new bearer token credential.
    pub fn with_bearer_token(token: &str, expires_in: Option<DateTime>) -> Self {
        Self {
            token: token.to_string(),
            expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(Credential::with_bearer_token("eyJ0eXAiOiJKV1QiLCJhbGciOi", None).is_valid());
        assert!(!Credential::with_bearer_token("", None).is_valid());

        let soon = now() + chrono::TimeDelta::seconds(5);
        assert!(!Credential::with_bearer_token("eyJ0eXAiOiJKV1QiLCJhbGciOi", Some(soon)).is_valid());

        let later = now() + chrono::TimeDelta::minutes(30);
        assert!(Credential::with_bearer_token("eyJ0eXAiOiJKV1QiLCJhbGciOi", Some(later)).is_valid());
    }

    #[test]
    fn test_debug_redacts_token() {
        let cred = Credential::with_bearer_token("eyJ0eXAiOiJKV1QiLCJhbGciOi", None);
        let rendered = format!("{cred:?}");
        assert!(!rendered.contains("eyJ0eXAiOiJKV1QiLCJhbGciOi"));
        assert!(rendered.contains("eyJ***iOi"));
    }
}
