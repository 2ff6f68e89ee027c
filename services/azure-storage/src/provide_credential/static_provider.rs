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
use async_trait::async_trait;
use runpkg_core::{Context, ProvideCredential, Result};

use crate::credential::Credential;

/// StaticCredentialProvider always returns the same bearer token.
#[derive(Clone, Debug)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    /// Create a provider for a token without known expiry.
    pub fn new(bearer_token: &str) -> Self {
        Self {
            credential: Credential::with_bearer_token(bearer_token, None),
        }
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _ctx: &Context) -> Result<Option<Self::Credential>> {
        Ok(Some(self.credential.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credential_provider() {
        let provider = StaticCredentialProvider::new("mybearertoken");
        let cred = provider
            .provide_credential(&Context::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(cred.token, "mybearertoken");
        assert!(cred.expires_in.is_none());
    }
}
