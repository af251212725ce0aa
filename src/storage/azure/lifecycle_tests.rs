// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `lifecycle.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    fn foreign_rule() -> Value {
        json!({
            "enabled": true,
            "name": "ArchiveOldLogs",
            "type": "Lifecycle",
            "definition": {"actions": {"baseBlob": {"tierToArchive": {"daysAfterModificationGreaterThan": 30}}}}
        })
    }

    #[test]
    fn test_expiration_rule_shape() {
        let rule = expiration_rule(100);

        assert_eq!(rule["name"], "ExpirationLogging");
        assert_eq!(rule["enabled"], true);
        assert_eq!(
            rule["definition"]["actions"]["baseBlob"]["delete"]["daysAfterModificationGreaterThan"],
            100
        );
        assert_eq!(rule["definition"]["filters"]["blobTypes"], json!(["blockBlob"]));
    }

    #[test]
    fn test_setting_expiration_keeps_foreign_rules() {
        // Act
        let rules = with_expiration_rule(vec![foreign_rule()], 7);

        // Assert
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0]["name"], "ArchiveOldLogs");
        assert_eq!(rules[1], expiration_rule(7));
    }

    #[test]
    fn test_setting_expiration_replaces_previous_value() {
        // Arrange
        let existing = vec![expiration_rule(100)];

        // Act
        let rules = with_expiration_rule(existing, 30);

        // Assert
        assert_eq!(rules, vec![expiration_rule(30)]);
    }

    #[test]
    fn test_removing_expiration_only_drops_owned_rule() {
        let rules = without_expiration_rule(vec![foreign_rule(), expiration_rule(100)]);

        assert_eq!(rules, vec![foreign_rule()]);
    }

    #[test]
    fn test_policy_rules_round_trip_through_body() {
        let body = policy_body(vec![expiration_rule(1)]);

        assert_eq!(policy_rules(&body), vec![expiration_rule(1)]);
    }

    #[test]
    fn test_policy_rules_of_unexpected_document() {
        assert!(policy_rules(&json!({"properties": {}})).is_empty());
    }
}
