use std::sync::OnceLock;

use regex::Regex;

use crate::buttons::ButtonRegistry;

/// Non-recursive brace pattern: the smallest `{ ... }` span mentioning an
/// `"action"` key. Replies are mostly prose, so the whole text is never
/// required to parse as JSON.
fn action_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"\{[^}]*"action"[^}]*\}"#).unwrap())
}

/// Old-style action names still emitted by some prompts, mapped to the
/// canonical button ids. Identity entries keep the canonical names working
/// even when the literal id was edited out of the registry text.
const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("button_fold", "fold"),
    ("button_call", "call"),
    ("button_raise", "raise"),
    ("button_check", "check"),
    ("fold", "fold"),
    ("call", "call"),
    ("raise", "raise"),
    ("check", "check"),
];

fn legacy_alias(action: &str) -> Option<&'static str> {
    LEGACY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == action)
        .map(|(_, id)| *id)
}

/// Scans an AI reply for an action directive and resolves it against the
/// registry. Returns the first candidate (in text order) that resolves,
/// either as an exact registered id or through the legacy alias table.
///
/// Malformed candidates and unknown ids are skipped, never surfaced: a
/// reply that carries no usable action simply yields `None`.
pub fn resolve_action(text: &str, registry: &ButtonRegistry) -> Option<String> {
    for candidate in action_pattern().find_iter(text) {
        let parsed: serde_json::Value = match serde_json::from_str(candidate.as_str()) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(candidate = candidate.as_str(), error = %e, "unparseable action candidate skipped");
                continue;
            }
        };

        let Some(action) = parsed.get("action").and_then(|v| v.as_str()) else {
            continue;
        };

        // Exact id match wins over any alias mapping.
        if registry.contains(action) {
            tracing::info!(action, "direct button match");
            return Some(action.to_string());
        }

        if let Some(mapped) = legacy_alias(action) {
            if registry.contains(mapped) {
                tracing::info!(action, mapped, "legacy alias resolved");
                return Some(mapped.to_string());
            }
        }

        tracing::warn!(
            action,
            available = ?registry.available_ids(),
            "action not registered, trying next candidate"
        );
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buttons::{BoundingBox, Button, ButtonRegistry};

    fn registry() -> ButtonRegistry {
        ButtonRegistry::with_defaults()
    }

    #[test]
    fn registered_id_resolves_directly() {
        assert_eq!(
            resolve_action(r#"{"action": "fold"}"#, &registry()),
            Some("fold".into())
        );
    }

    #[test]
    fn alias_inside_prose_resolves_to_canonical_id() {
        let reply = r#"Выполняю действие: {"action": "button_call"}"#;
        assert_eq!(resolve_action(reply, &registry()), Some("call".into()));
    }

    #[test]
    fn alias_needs_its_target_registered() {
        let mut reg = registry();
        reg.remove("fold");
        assert_eq!(resolve_action(r#"{"action": "button_fold"}"#, &reg), None);
    }

    #[test]
    fn plain_prose_yields_no_action() {
        assert_eq!(resolve_action("Я думаю, стоит подождать.", &registry()), None);
        assert_eq!(resolve_action("", &registry()), None);
    }

    #[test]
    fn unknown_id_is_skipped_without_error() {
        assert_eq!(
            resolve_action(r#"{"action": "nonexistent_id"}"#, &registry()),
            None
        );
    }

    #[test]
    fn first_resolvable_candidate_wins() {
        let reply = r#"{"action": "raise"} then maybe {"action": "fold"}"#;
        assert_eq!(resolve_action(reply, &registry()), Some("raise".into()));
    }

    #[test]
    fn bad_candidate_does_not_poison_later_ones() {
        let reply = r#"{"action": broken} ... {"action": "check"}"#;
        assert_eq!(resolve_action(reply, &registry()), Some("check".into()));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(resolve_action(r#"{"action": "Fold"}"#, &registry()), None);
    }

    #[test]
    fn alias_key_that_is_also_registered_wins_as_itself() {
        let mut reg = registry();
        reg.insert(
            "button_fold",
            Button {
                name: "Legacy fold".into(),
                bounds: BoundingBox {
                    x: 0,
                    y: 0,
                    width: 10,
                    height: 10,
                },
                description: String::new(),
            },
        );
        // "button_fold" is both a registered id and an alias key; the
        // registered id takes precedence.
        assert_eq!(
            resolve_action(r#"{"action": "button_fold"}"#, &reg),
            Some("button_fold".into())
        );
    }

    #[test]
    fn extra_fields_in_the_candidate_are_tolerated() {
        let reply = r#"{"confidence": 0.9, "action": "call", "note": "pot odds"}"#;
        assert_eq!(resolve_action(reply, &registry()), Some("call".into()));
    }
}
