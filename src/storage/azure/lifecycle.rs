// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Blob lifecycle management policy.
//!
//! A storage account has at most one management policy (`default`). The
//! operator owns a single rule inside it; rules added by anyone else are
//! carried over untouched.

use super::arm::{ArmClient, ArmError};
use super::naming::ResourceIds;
use crate::constants::{AZURE_LIFECYCLE_RULE_NAME, STORAGE_API_VERSION};
use serde_json::{json, Value};
use tracing::debug;

/// Rule deleting block blobs `days` after their last modification.
#[must_use]
pub fn expiration_rule(days: i32) -> Value {
    json!({
        "enabled": true,
        "name": AZURE_LIFECYCLE_RULE_NAME,
        "type": "Lifecycle",
        "definition": {
            "actions": {
                "baseBlob": {
                    "delete": {
                        "daysAfterModificationGreaterThan": days
                    }
                }
            },
            "filters": {
                "blobTypes": ["blockBlob"]
            }
        }
    })
}

fn is_owned_rule(rule: &Value) -> bool {
    rule.get("name").and_then(Value::as_str) == Some(AZURE_LIFECYCLE_RULE_NAME)
}

/// Rules of a management policy document.
#[must_use]
pub fn policy_rules(policy: &Value) -> Vec<Value> {
    policy
        .pointer("/properties/policy/rules")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// `rules` with the expiration rule set to `days`.
#[must_use]
pub fn with_expiration_rule(rules: Vec<Value>, days: i32) -> Vec<Value> {
    let mut rules = without_expiration_rule(rules);
    rules.push(expiration_rule(days));
    rules
}

/// `rules` without the expiration rule.
#[must_use]
pub fn without_expiration_rule(rules: Vec<Value>) -> Vec<Value> {
    rules.into_iter().filter(|rule| !is_owned_rule(rule)).collect()
}

/// Request body of a management policy holding `rules`.
#[must_use]
pub fn policy_body(rules: Vec<Value>) -> Value {
    json!({
        "properties": {
            "policy": {
                "rules": rules
            }
        }
    })
}

async fn current_rules(arm: &ArmClient, ids: &ResourceIds) -> Result<Option<Vec<Value>>, ArmError> {
    match arm.get(&ids.management_policy(), STORAGE_API_VERSION).await {
        Ok(policy) => Ok(Some(policy_rules(&policy))),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Converge the expiration rule: set it to `days`, or remove it when `None`.
pub async fn apply(arm: &ArmClient, ids: &ResourceIds, days: Option<i32>) -> Result<(), ArmError> {
    let path = ids.management_policy();
    let existing = current_rules(arm, ids).await?;

    match (days, existing) {
        (Some(days), existing) => {
            let rules = with_expiration_rule(existing.unwrap_or_default(), days);
            arm.put(&path, STORAGE_API_VERSION, &policy_body(rules)).await?;
            debug!(account = %ids.account_name(), days, "Applied blob expiration rule");
        }
        (None, None) => {}
        (None, Some(rules)) => {
            if !rules.iter().any(is_owned_rule) {
                return Ok(());
            }
            let remaining = without_expiration_rule(rules);
            if remaining.is_empty() {
                match arm.delete(&path, STORAGE_API_VERSION).await {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e),
                }
            } else {
                arm.put(&path, STORAGE_API_VERSION, &policy_body(remaining))
                    .await?;
            }
            debug!(account = %ids.account_name(), "Removed blob expiration rule");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod lifecycle_tests;
