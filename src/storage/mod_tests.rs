// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `storage/mod.rs`

#[cfg(test)]
mod tests {
    use super::super::merge_tags;
    use crate::crd::{BucketSpec, BucketTag};
    use std::collections::BTreeMap;

    #[test]
    fn test_bucket_tags_override_cluster_tags() {
        let cluster_tags = BTreeMap::from([
            ("installation".to_string(), "glippy".to_string()),
            ("team".to_string(), "atlas".to_string()),
            ("empty".to_string(), String::new()),
        ]);
        let spec = BucketSpec {
            name: "b1".into(),
            tags: vec![BucketTag {
                key: "team".into(),
                value: "honeybadger".into(),
            }],
            ..Default::default()
        };

        let tags = merge_tags(&cluster_tags, &spec);

        assert_eq!(tags.len(), 2);
        assert_eq!(tags["installation"], "glippy");
        assert_eq!(tags["team"], "honeybadger");
    }
}
