//! The build-wide rule registry.
//!
//! Maps each [`ClassIdentity`] to its [`CompiledRule`]. The registry only
//! grows during a build: the first rule registered under an identity is kept
//! and later registrations are no-ops, so the CSS behind a class name never
//! changes once it has been handed out. Entries are iterated in ascending
//! identity order.
//!
//! The registry may hold rules that no file references any more; which rules
//! are live is decided by the [`UsageTracker`](crate::usage::UsageTracker).

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::compile::CompiledRule;
use crate::identity::ClassIdentity;

/// Thread-safe, append-only map of identity to compiled CSS.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    rules: RwLock<BTreeMap<ClassIdentity, CompiledRule>>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `rule` unless `identity` is already present.
    ///
    /// Returns `true` when the rule was inserted.
    pub fn register(&self, identity: ClassIdentity, rule: CompiledRule) -> bool {
        let mut rules = self.rules.write();
        if rules.contains_key(&identity) {
            return false;
        }
        log::trace!("registered {} as .{}", identity, rule.class_name());
        rules.insert(identity, rule);
        true
    }

    pub fn lookup(&self, identity: &ClassIdentity) -> Option<CompiledRule> {
        self.rules.read().get(identity).cloned()
    }

    pub fn contains(&self, identity: &ClassIdentity) -> bool {
        self.rules.read().contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// A copy of every registered rule, in identity order.
    pub fn snapshot(&self) -> BTreeMap<ClassIdentity, CompiledRule> {
        self.rules.read().clone()
    }

    /// Concatenates the CSS of the given identities, in identity order.
    ///
    /// Identities with no registered rule are skipped. Each rule is followed
    /// by a newline.
    pub fn css_for<'a, I>(&self, identities: I) -> String
    where
        I: IntoIterator<Item = &'a ClassIdentity>,
    {
        let mut wanted: Vec<&ClassIdentity> = identities.into_iter().collect();
        wanted.sort();
        wanted.dedup();

        let rules = self.rules.read();
        let mut css = String::new();
        for identity in wanted {
            if let Some(rule) = rules.get(identity) {
                css.push_str(rule.css());
                css.push('\n');
            }
        }
        css
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::compile::compile;
    use crate::literal::StyleLiteral;

    fn rule_for(json: &str) -> (ClassIdentity, CompiledRule) {
        let literal: StyleLiteral = serde_json::from_str(json).unwrap();
        let identity = ClassIdentity::of(&literal);
        let rule = compile(literal.as_object().unwrap(), &identity.class_name("zx"));
        (identity, rule)
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = StyleRegistry::new();
        let (id, rule) = rule_for(r#"{"p": 1}"#);
        assert!(registry.register(id, rule.clone()));
        assert_eq!(registry.lookup(&id), Some(rule));
        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregistration_is_noop() {
        let registry = StyleRegistry::new();
        let (id, rule) = rule_for(r#"{"p": 1}"#);
        let (_, other) = rule_for(r#"{"p": 2}"#);
        assert!(registry.register(id, rule.clone()));
        assert!(!registry.register(id, other));
        assert_eq!(registry.lookup(&id), Some(rule));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_absent() {
        let registry = StyleRegistry::new();
        let (id, _) = rule_for(r#"{"p": 1}"#);
        assert_eq!(registry.lookup(&id), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_css_for_is_ordered_and_skips_unknown() {
        let registry = StyleRegistry::new();
        let (a, rule_a) = rule_for(r#"{"p": 1}"#);
        let (b, rule_b) = rule_for(r#"{"p": 2}"#);
        let (missing, _) = rule_for(r#"{"p": 3}"#);
        registry.register(a, rule_a.clone());
        registry.register(b, rule_b.clone());

        let (first, second) = if a < b { (&rule_a, &rule_b) } else { (&rule_b, &rule_a) };
        let expected = format!("{}\n{}\n", first.css(), second.css());
        assert_eq!(registry.css_for([&b, &missing, &a, &b]), expected);
        assert_eq!(registry.css_for([&a, &b]), expected);
    }

    #[test]
    fn test_concurrent_registration_keeps_one_entry() {
        let registry = Arc::new(StyleRegistry::new());
        let (id, rule) = rule_for(r#"{"m": 0}"#);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let rule = rule.clone();
                thread::spawn(move || registry.register(id, rule))
            })
            .collect();
        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|inserted| *inserted)
            .count();
        assert_eq!(inserted, 1);
        assert_eq!(registry.len(), 1);
    }
}
