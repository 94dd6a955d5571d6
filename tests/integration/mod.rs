//! End-to-end tests for the rule sets shipped in `rules/`.

mod shipped_rules;
