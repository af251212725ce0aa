// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `crd.rs`

#[cfg(test)]
mod tests {
    use crate::constants::{API_GROUP, API_VERSION, KIND_BUCKET};
    use crate::crd::*;
    use kube::CustomResourceExt;
    use serde_json::json;

    fn tag(key: &str, value: &str) -> BucketTag {
        BucketTag {
            key: key.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_spec_deserializes_camel_case_fields() {
        let spec: BucketSpec = serde_json::from_value(json!({
            "name": "giantswarm-glippy-loki",
            "expirationPolicy": { "days": 100 },
            "reclaimPolicy": "Delete",
            "accessRole": {
                "roleName": "giantswarm-glippy-loki",
                "extraBucketNames": ["giantswarm-glippy-mimir"],
                "serviceAccountName": "loki",
                "serviceAccountNamespace": "loki"
            },
            "tags": [{ "key": "app", "value": "loki" }]
        }))
        .unwrap();

        assert_eq!(spec.name, "giantswarm-glippy-loki");
        assert_eq!(spec.expiration_days(), Some(100));
        assert_eq!(spec.reclaim_policy, ReclaimPolicy::Delete);
        let role = spec.access_role.as_ref().unwrap();
        assert_eq!(role.extra_bucket_names, vec!["giantswarm-glippy-mimir"]);
        assert_eq!(role.service_account_namespace, "loki");
        assert_eq!(spec.tags, vec![tag("app", "loki")]);
    }

    #[test]
    fn test_reclaim_policy_defaults_to_retain() {
        let spec: BucketSpec = serde_json::from_value(json!({ "name": "b1" })).unwrap();

        assert_eq!(spec.reclaim_policy, ReclaimPolicy::Retain);
        assert!(spec.expiration_policy.is_none());
        assert!(spec.access_role.is_none());
        assert!(spec.tags.is_empty());
    }

    #[test]
    fn test_status_uses_upper_case_id_keys() {
        let status = BucketStatus {
            bucket_ready: true,
            bucket_id: Some("b1".into()),
            bucket_azure_role_assignment_id: Some("assignment".into()),
        };

        let value = serde_json::to_value(&status).unwrap();

        assert_eq!(
            value,
            json!({
                "bucketReady": true,
                "bucketID": "b1",
                "bucketAzureRoleAssignmentID": "assignment"
            })
        );
    }

    #[test]
    fn test_normalized_tags_drop_empty_entries() {
        let spec = BucketSpec {
            name: "b1".into(),
            tags: vec![tag("app", "loki"), tag("", "orphan"), tag("team", "")],
            ..Default::default()
        };

        let tags = spec.normalized_tags();

        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("app").map(String::as_str), Some("loki"));
    }

    #[test]
    fn test_normalized_tags_last_value_wins() {
        let spec = BucketSpec {
            name: "b1".into(),
            tags: vec![tag("app", "loki"), tag("app", "mimir")],
            ..Default::default()
        };

        assert_eq!(
            spec.normalized_tags().get("app").map(String::as_str),
            Some("mimir")
        );
    }

    #[test]
    fn test_requested_access_role_ignores_empty_role_name() {
        let mut spec = BucketSpec {
            name: "b1".into(),
            access_role: Some(BucketAccessRole {
                role_name: String::new(),
                service_account_name: "sa".into(),
                service_account_namespace: "ns".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(spec.requested_access_role().is_none());

        if let Some(role) = spec.access_role.as_mut() {
            role.role_name = "role".into();
        }
        assert_eq!(
            spec.requested_access_role().map(|r| r.role_name.as_str()),
            Some("role")
        );
    }

    #[test]
    fn test_ready_status_keeps_role_assignment() {
        let mut bucket = Bucket::new("loki", BucketSpec {
            name: "b1".into(),
            ..Default::default()
        });
        bucket.status = Some(BucketStatus {
            bucket_ready: false,
            bucket_id: None,
            bucket_azure_role_assignment_id: Some("assignment".into()),
        });

        let status = bucket.ready_status();

        assert!(status.bucket_ready);
        assert_eq!(status.bucket_id.as_deref(), Some("b1"));
        assert_eq!(
            status.bucket_azure_role_assignment_id.as_deref(),
            Some("assignment")
        );
    }

    #[test]
    fn test_finalizer_and_deletion_helpers() {
        let mut bucket = Bucket::new("loki", BucketSpec::default());
        assert!(!bucket.has_finalizer("f"));
        assert!(!bucket.is_being_deleted());

        bucket.metadata.finalizers = Some(vec!["f".into()]);
        bucket.metadata.deletion_timestamp =
            Some(serde_json::from_value(json!("2025-01-01T00:00:00Z")).unwrap());

        assert!(bucket.has_finalizer("f"));
        assert!(bucket.is_being_deleted());
    }

    #[test]
    fn test_crd_metadata() {
        let crd = Bucket::crd();

        assert_eq!(crd.spec.group, API_GROUP);
        assert_eq!(crd.spec.names.kind, KIND_BUCKET);
        assert_eq!(crd.spec.names.plural, "buckets");
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(
            crd.spec.names.short_names.as_deref(),
            Some(&["bkt".to_string()][..])
        );
        assert_eq!(crd.spec.versions[0].name, API_VERSION);
    }
}
