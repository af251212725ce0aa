// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer management for namespaced resources.
//!
//! Used for the `Bucket` record itself and for the access-key secret the
//! Azure adapter generates. Both helpers are idempotent: the patch is only
//! sent when the finalizer list actually changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use object_storage_operator::constants::BUCKET_FINALIZER;
//! use object_storage_operator::reconcilers::finalizers::ensure_finalizer;
//!
//! // Persist the finalizer before touching the provider
//! ensure_finalizer(&client, &bucket, BUCKET_FINALIZER).await?;
//! ```

use super::retry::retry_api_call;
use crate::errors::Result;
use kube::api::{Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::{json, Value};
use tracing::info;

/// Finalizer list with `finalizer` appended, or `None` if it is already present.
#[must_use]
pub fn with_finalizer(current: &[String], finalizer: &str) -> Option<Vec<String>> {
    if current.iter().any(|f| f == finalizer) {
        return None;
    }
    let mut finalizers = current.to_vec();
    finalizers.push(finalizer.to_string());
    Some(finalizers)
}

/// Finalizer list with `finalizer` removed, or `None` if it was not present.
#[must_use]
pub fn without_finalizer(current: &[String], finalizer: &str) -> Option<Vec<String>> {
    if !current.iter().any(|f| f == finalizer) {
        return None;
    }
    Some(
        current
            .iter()
            .filter(|f| f.as_str() != finalizer)
            .cloned()
            .collect(),
    )
}

/// Merge patch replacing the finalizer list.
#[must_use]
pub fn finalizers_patch(finalizers: &[String]) -> Value {
    json!({ "metadata": { "finalizers": finalizers } })
}

async fn patch_finalizers<T>(client: &Client, resource: &T, finalizers: &[String]) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::de::DeserializeOwned,
{
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    let api: Api<T> = Api::namespaced(client.clone(), &namespace);
    let patch = finalizers_patch(finalizers);

    retry_api_call(
        || {
            let api = api.clone();
            let name = name.clone();
            let patch = patch.clone();
            async move {
                api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
                    .await
            }
        },
        "patch finalizers",
    )
    .await?;
    Ok(())
}

/// Add `finalizer` to a namespaced resource if not already present.
///
/// # Errors
///
/// Returns an error if the patch fails after retries.
pub async fn ensure_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::de::DeserializeOwned,
{
    let Some(finalizers) = with_finalizer(resource.finalizers(), finalizer) else {
        return Ok(());
    };

    patch_finalizers(client, resource, &finalizers).await?;
    info!(
        kind = %T::kind(&()),
        namespace = %resource.namespace().unwrap_or_default(),
        name = %resource.name_any(),
        finalizer,
        "Added finalizer"
    );
    Ok(())
}

/// Remove `finalizer` from a namespaced resource if present.
///
/// # Errors
///
/// Returns an error if the patch fails after retries.
pub async fn remove_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::de::DeserializeOwned,
{
    let Some(finalizers) = without_finalizer(resource.finalizers(), finalizer) else {
        return Ok(());
    };

    patch_finalizers(client, resource, &finalizers).await?;
    info!(
        kind = %T::kind(&()),
        namespace = %resource.namespace().unwrap_or_default(),
        name = %resource.name_any(),
        finalizer,
        "Removed finalizer"
    );
    Ok(())
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
