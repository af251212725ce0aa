// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Azure AD bearer tokens for Resource Manager calls.
//!
//! Three identity modes are supported, matching the identities a CAPZ
//! cluster can reference:
//!
//! - user-assigned managed identity, through the instance metadata service
//! - service principal with a client secret (`client_credentials` grant)
//! - workload identity, exchanging the projected service account token as a
//!   client assertion

use super::arm::ArmError;
use crate::cluster::azure::AzureIdentity;
use crate::constants::{
    ARM_ENDPOINT, ARM_SCOPE, AZURE_AUTHORITY_HOST, AZURE_FEDERATED_TOKEN_FILE_ENV,
    AZURE_IMDS_TOKEN_ENDPOINT,
};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use url::{form_urlencoded, Url};

/// IMDS token API version
const IMDS_API_VERSION: &str = "2018-02-01";

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Source of Resource Manager bearer tokens.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Acquire a token for the Resource Manager scope.
    async fn token(&self) -> std::result::Result<String, ArmError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

async fn read_token(response: reqwest::Response) -> std::result::Result<String, ArmError> {
    if !response.status().is_success() {
        return Err(ArmError::from_response(response).await);
    }
    let token: TokenResponse = response.json().await?;
    Ok(token.access_token)
}

/// User-assigned managed identity.
pub struct ManagedIdentityCredential {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

impl ManagedIdentityCredential {
    #[must_use]
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            client_id: client_id.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    async fn token(&self) -> std::result::Result<String, ArmError> {
        let mut url = Url::parse(&self.endpoint)?;
        url.query_pairs_mut()
            .append_pair("api-version", IMDS_API_VERSION)
            .append_pair("resource", &format!("{ARM_ENDPOINT}/"))
            .append_pair("client_id", &self.client_id);

        debug!(client_id = %self.client_id, "Requesting managed identity token");
        let response = self.http.get(url).header("Metadata", "true").send().await?;
        read_token(response).await
    }
}

/// Azure AD token endpoint of a tenant.
fn token_endpoint(authority: &str, tenant_id: &str) -> std::result::Result<Url, ArmError> {
    Ok(Url::parse(&format!(
        "{}/{tenant_id}/oauth2/v2.0/token",
        authority.trim_end_matches('/')
    ))?)
}

async fn post_form(
    http: &reqwest::Client,
    url: Url,
    form: String,
) -> std::result::Result<String, ArmError> {
    let response = http
        .post(url)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(form)
        .send()
        .await?;
    read_token(response).await
}

/// Service principal authenticating with a client secret.
pub struct ClientSecretCredential {
    http: reqwest::Client,
    authority: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl ClientSecretCredential {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        authority: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            authority: authority.into(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self) -> std::result::Result<String, ArmError> {
        let url = token_endpoint(&self.authority, &self.tenant_id)?;
        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("scope", ARM_SCOPE)
            .finish();

        debug!(tenant_id = %self.tenant_id, client_id = %self.client_id, "Requesting service principal token");
        post_form(&self.http, url, form).await
    }
}

/// Federated workload identity.
pub struct WorkloadIdentityCredential {
    http: reqwest::Client,
    authority: String,
    tenant_id: String,
    client_id: String,
    token_file: PathBuf,
}

impl WorkloadIdentityCredential {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        authority: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        token_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            http,
            authority: authority.into(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            token_file: token_file.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for WorkloadIdentityCredential {
    async fn token(&self) -> std::result::Result<String, ArmError> {
        // The projected token is rotated by the kubelet, read it on every exchange.
        let assertion = tokio::fs::read_to_string(&self.token_file)
            .await
            .map_err(|source| ArmError::TokenFile {
                path: self.token_file.display().to_string(),
                source,
            })?;

        let url = token_endpoint(&self.authority, &self.tenant_id)?;
        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.client_id)
            .append_pair("client_assertion_type", CLIENT_ASSERTION_TYPE)
            .append_pair("client_assertion", assertion.trim())
            .append_pair("scope", ARM_SCOPE)
            .finish();

        debug!(tenant_id = %self.tenant_id, client_id = %self.client_id, "Exchanging federated token");
        post_form(&self.http, url, form).await
    }
}

/// Build the credential matching a cluster identity.
///
/// # Errors
///
/// Returns a resolution error for workload identity when the federated token
/// file is not configured in the operator environment.
pub fn credential_for(
    cluster: &str,
    identity: &AzureIdentity,
    http: &reqwest::Client,
) -> Result<Arc<dyn TokenCredential>> {
    let credential: Arc<dyn TokenCredential> = match identity {
        AzureIdentity::UserAssignedMsi { client_id } => Arc::new(ManagedIdentityCredential::new(
            http.clone(),
            AZURE_IMDS_TOKEN_ENDPOINT,
            client_id.clone(),
        )),
        AzureIdentity::ManualServicePrincipal {
            tenant_id,
            client_id,
            client_secret,
        } => Arc::new(ClientSecretCredential::new(
            http.clone(),
            AZURE_AUTHORITY_HOST,
            tenant_id.clone(),
            client_id.clone(),
            client_secret.clone(),
        )),
        AzureIdentity::WorkloadIdentity {
            tenant_id,
            client_id,
        } => {
            let token_file = std::env::var(AZURE_FEDERATED_TOKEN_FILE_ENV).map_err(|_| {
                Error::resolution(
                    cluster,
                    format!("workload identity requires {AZURE_FEDERATED_TOKEN_FILE_ENV} to be set"),
                )
            })?;
            Arc::new(WorkloadIdentityCredential::new(
                http.clone(),
                AZURE_AUTHORITY_HOST,
                tenant_id.clone(),
                client_id.clone(),
                token_file,
            ))
        }
    };
    Ok(credential)
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod credential_tests;
