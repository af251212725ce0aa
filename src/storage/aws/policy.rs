// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! IAM policy documents rendered for buckets and access roles.
//!
//! All documents are built as JSON values and serialized once, so bucket and
//! account names are always escaped correctly.

use serde_json::{json, Value};

const POLICY_VERSION: &str = "2012-10-17";

/// ARN of a bucket and of every object inside it.
fn bucket_resources(partition: &str, bucket_name: &str) -> [String; 2] {
    [
        format!("arn:{partition}:s3:::{bucket_name}"),
        format!("arn:{partition}:s3:::{bucket_name}/*"),
    ]
}

/// Bucket policy denying every request made without TLS.
#[must_use]
pub fn bucket_policy(partition: &str, bucket_name: &str) -> String {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [
            {
                "Sid": "EnforceSSLOnly",
                "Effect": "Deny",
                "Principal": "*",
                "Action": "s3:*",
                "Resource": bucket_resources(partition, bucket_name),
                "Condition": {
                    "Bool": {
                        "aws:SecureTransport": "false"
                    }
                }
            }
        ]
    })
    .to_string()
}

/// Inputs of the role trust policy.
#[derive(Clone, Debug)]
pub struct TrustPolicyParams<'a> {
    pub partition: &'a str,
    pub account_id: &'a str,
    /// OIDC issuer domain of the workload cluster
    pub irsa_domain: &'a str,
    pub service_account_namespace: &'a str,
    pub service_account_name: &'a str,
}

/// Trust policy letting one service account assume the role through IRSA.
#[must_use]
pub fn trust_policy(params: &TrustPolicyParams<'_>) -> String {
    let subject_key = format!("{}:sub", params.irsa_domain);
    let subject = format!(
        "system:serviceaccount:{}:{}",
        params.service_account_namespace, params.service_account_name
    );

    json!({
        "Version": POLICY_VERSION,
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": {
                    "Federated": format!(
                        "arn:{}:iam::{}:oidc-provider/{}",
                        params.partition, params.account_id, params.irsa_domain
                    )
                },
                "Action": "sts:AssumeRoleWithWebIdentity",
                "Condition": {
                    "StringEquals": {
                        subject_key: subject
                    }
                }
            }
        ]
    })
    .to_string()
}

/// Inline role policy granting object access on the bucket and any extra buckets.
#[must_use]
pub fn role_policy(partition: &str, bucket_name: &str, extra_bucket_names: &[String]) -> String {
    let resources: Vec<Value> = std::iter::once(bucket_name)
        .chain(extra_bucket_names.iter().map(String::as_str))
        .filter(|name| !name.is_empty())
        .flat_map(|name| bucket_resources(partition, name))
        .map(Value::String)
        .collect();

    json!({
        "Version": POLICY_VERSION,
        "Statement": [
            {
                "Effect": "Allow",
                "Action": [
                    "s3:ListBucket",
                    "s3:PutObject",
                    "s3:GetObject",
                    "s3:DeleteObject"
                ],
                "Resource": resources
            },
            {
                "Effect": "Allow",
                "Action": [
                    "s3:GetAccessPoint",
                    "s3:GetAccountPublicAccessBlock",
                    "s3:ListAccessPoints"
                ],
                "Resource": "*"
            }
        ]
    })
    .to_string()
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod policy_tests;
