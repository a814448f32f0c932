// Unit tests for usradmin-tui
// These tests work with the public API without modifying the main codebase

#[cfg(test)]
mod validate_tests {
    use usradmin_tui::validate::{
        FieldErrors, MSG_EMAIL_INVALID, MSG_NAME_REQUIRED, MSG_NAME_TOO_LONG, validate_user_input,
    };

    #[test]
    fn test_empty_name_fails_required() {
        let err = validate_user_input("", "john@example.com").unwrap_err();
        assert_eq!(err.name, Some(MSG_NAME_REQUIRED));
    }

    #[test]
    fn test_long_name_fails_too_long() {
        let err = validate_user_input(&"x".repeat(101), "john@example.com").unwrap_err();
        assert_eq!(err.name, Some(MSG_NAME_TOO_LONG));
    }

    #[test]
    fn test_first_violated_rule_wins() {
        // empty beats too-long by ordering; an empty name can only be required
        let err = validate_user_input("", "bad").unwrap_err();
        assert_eq!(err.name, Some(MSG_NAME_REQUIRED));
        assert_eq!(err.email, Some(MSG_EMAIL_INVALID));
    }

    #[test]
    fn test_valid_payload_passes() {
        let input = validate_user_input("John Doe", "john@example.com").unwrap();
        assert_eq!(input.name, "John Doe");
        assert_eq!(input.email, "john@example.com");
    }

    #[test]
    fn test_field_errors_is_empty() {
        assert!(FieldErrors::default().is_empty());
    }
}

#[cfg(test)]
mod mutation_tests {
    use usradmin_tui::app::mutation::{MutationKind, MutationStatus, MutationTracker};

    #[test]
    fn test_one_in_flight_per_tracker() {
        let mut t = MutationTracker::new(MutationKind::Create);
        assert!(t.begin().is_some());
        assert!(t.begin().is_none());
        assert!(t.begin().is_none());
    }

    #[test]
    fn test_settlement_after_reset_is_dropped() {
        let mut t = MutationTracker::new(MutationKind::Delete);
        let seq = t.begin().unwrap();
        t.reset();
        assert!(!t.settle_err(seq, "late".to_string()));
        assert_eq!(t.status(), MutationStatus::Idle);
        assert_eq!(t.error(), None);
    }

    #[test]
    fn test_fallback_error_messages() {
        for (kind, msg) in [
            (MutationKind::Create, "Failed to create user"),
            (MutationKind::Update, "Failed to update user"),
            (MutationKind::Delete, "Failed to delete user"),
        ] {
            let mut t = MutationTracker::new(kind);
            let seq = t.begin().unwrap();
            t.settle_err(seq, String::new());
            assert_eq!(t.error(), Some(msg));
        }
    }
}

#[cfg(test)]
mod cache_tests {
    use usradmin_tui::api::{ApiError, User, UserList};
    use usradmin_tui::app::cache::QueryCache;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: format!("{id} name"),
            email: format!("{id}@example.com"),
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_mutation_invalidates_list_always() {
        let mut cache = QueryCache::new();
        cache.list.claim_fetch();
        cache.settle_list(Ok(UserList { users: vec![user("a")], total: 1 }));
        assert!(!cache.list.needs_fetch());
        cache.invalidate_after_mutation(Some("a"), None);
        assert!(cache.list.needs_fetch());
    }

    #[test]
    fn test_detail_invalidated_only_when_selected() {
        let mut cache = QueryCache::new();
        cache.detail_mut("a").claim_fetch();
        cache.settle_detail("a", Ok(user("a")));
        // mutated a, but b is selected: a's detail stays fresh
        cache.invalidate_after_mutation(Some("a"), Some("b"));
        assert!(!cache.detail("a").unwrap().needs_fetch());
        // mutated a while a is selected: a's detail goes stale
        cache.invalidate_after_mutation(Some("a"), Some("a"));
        assert!(cache.detail("a").unwrap().needs_fetch());
    }

    #[test]
    fn test_settlement_for_dropped_entry_is_a_no_op() {
        let mut cache = QueryCache::new();
        cache.detail_mut("a").claim_fetch();
        cache.drop_detail("a");
        cache.settle_detail("a", Ok(user("a")));
        assert!(cache.detail("a").is_none());
    }

    #[test]
    fn test_error_settlement_is_surfaced() {
        let mut cache = QueryCache::new();
        cache.list.claim_fetch();
        cache.settle_list(Err(ApiError::Transport("connection refused".to_string())));
        assert!(cache.list.error.as_deref().unwrap().contains("connection refused"));
        // an error settlement ends the in-flight fetch without re-queueing
        assert!(!cache.list.needs_fetch());
    }
}

#[cfg(test)]
mod theme_tests {
    use usradmin_tui::theme::ThemePreference;

    #[test]
    fn test_cycle_order_is_light_dark_system() {
        assert_eq!(ThemePreference::Light.next(), ThemePreference::Dark);
        assert_eq!(ThemePreference::Dark.next(), ThemePreference::System);
        assert_eq!(ThemePreference::System.next(), ThemePreference::Light);
    }

    #[test]
    fn test_cycle_is_a_three_cycle_from_any_start() {
        for start in [
            ThemePreference::Light,
            ThemePreference::Dark,
            ThemePreference::System,
        ] {
            assert_eq!(start.next().next().next(), start);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(ThemePreference::Light.label(), "Light");
        assert_eq!(ThemePreference::Dark.label(), "Dark");
        assert_eq!(ThemePreference::System.label(), "System");
    }
}
