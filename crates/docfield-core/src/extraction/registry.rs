//! The pattern registry: named rules grouped by purpose.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::patterns;
use super::FieldExtractor;
use crate::models::document::FieldGroup;

lazy_static! {
    /// Process-wide standard registry, built once.
    pub static ref STANDARD_REGISTRY: PatternRegistry = PatternRegistry::standard();
}

/// A named matching rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    name: String,
    regex: Regex,
}

impl PatternRule {
    /// Create a rule from a compiled regex.
    pub fn new(name: impl Into<String>, regex: Regex) -> Self {
        Self {
            name: name.into(),
            regex,
        }
    }

    /// Compile `pattern` into a rule.
    pub fn from_pattern(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::new(name, Regex::new(pattern)?))
    }

    /// Field name this rule produces.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl FieldExtractor for PatternRule {
    type Output = String;

    /// First match: capture group 1 when the rule has one, else the whole match.
    fn extract(&self, text: &str) -> Option<String> {
        let caps = self.regex.captures(text)?;
        let matched = caps.get(1).or_else(|| caps.get(0))?;
        Some(matched.as_str().trim().to_string())
    }

    /// Every non-overlapping whole match, left to right.
    fn extract_all(&self, text: &str) -> Vec<String> {
        self.regex
            .find_iter(text)
            .map(|m| m.as_str().trim().to_string())
            .collect()
    }
}

/// Generic multi-valued rules plus ordered single-valued rules per field group.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    generic: Vec<PatternRule>,
    fields: BTreeMap<FieldGroup, Vec<PatternRule>>,
}

impl PatternRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed rule table.
    pub fn standard() -> Self {
        Self::new()
            .with_generic(PatternRule::new("NIF", patterns::NIF.clone()))
            .with_generic(PatternRule::new("NIE", patterns::NIE.clone()))
            .with_generic(PatternRule::new("PASSPORT", patterns::PASSPORT.clone()))
            .with_generic(PatternRule::new("IBAN", patterns::IBAN.clone()))
            .with_generic(PatternRule::new("SOCIAL_SECURITY", patterns::SOCIAL_SECURITY.clone()))
            .with_generic(PatternRule::new("DATE", patterns::DATE.clone()))
            .with_generic(PatternRule::new("POSTAL_CODE", patterns::POSTAL_CODE.clone()))
            .with_generic(PatternRule::new("PHONE", patterns::PHONE.clone()))
            .with_generic(PatternRule::new("EMAIL", patterns::EMAIL.clone()))
            .with_field(FieldGroup::Personal, PatternRule::new("NAME", patterns::NAME.clone()))
            .with_field(FieldGroup::Personal, PatternRule::new("SURNAME", patterns::SURNAME.clone()))
            .with_field(FieldGroup::Personal, PatternRule::new("ADDRESS", patterns::ADDRESS.clone()))
            .with_field(FieldGroup::IdentityDocument, PatternRule::new("NAME", patterns::DNI_NAME.clone()))
            .with_field(FieldGroup::IdentityDocument, PatternRule::new("SURNAME", patterns::DNI_SURNAME.clone()))
            .with_field(FieldGroup::Invoice, PatternRule::new("AMOUNT", patterns::AMOUNT.clone()))
            .with_field(FieldGroup::Invoice, PatternRule::new("INVOICE_DATE", patterns::INVOICE_DATE.clone()))
            .with_field(FieldGroup::Contract, PatternRule::new("CLAUSE", patterns::CLAUSE.clone()))
            .with_field(FieldGroup::Contract, PatternRule::new("VALIDITY", patterns::VALIDITY.clone()))
            .with_field(FieldGroup::Medical, PatternRule::new("DIAGNOSIS", patterns::DIAGNOSIS.clone()))
            .with_field(FieldGroup::Medical, PatternRule::new("MEDICATION", patterns::MEDICATION.clone()))
    }

    /// Add a generic rule, replacing any generic rule with the same name.
    pub fn with_generic(mut self, rule: PatternRule) -> Self {
        match self.generic.iter_mut().find(|r| r.name == rule.name) {
            Some(existing) => *existing = rule,
            None => self.generic.push(rule),
        }
        self
    }

    /// Append a field rule to `group`, after the rules already there.
    pub fn with_field(mut self, group: FieldGroup, rule: PatternRule) -> Self {
        self.fields.entry(group).or_default().push(rule);
        self
    }

    /// Generic rules.
    pub fn generic_rules(&self) -> &[PatternRule] {
        &self.generic
    }

    /// Field rules of `group`, in priority order.
    pub fn field_rules(&self, group: FieldGroup) -> &[PatternRule] {
        self.fields.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up a generic rule by name.
    pub fn rule(&self, name: &str) -> Option<&PatternRule> {
        self.generic.iter().find(|r| r.name == name)
    }

    /// Total number of rules.
    pub fn len(&self) -> usize {
        self.generic.len() + self.fields.values().map(Vec::len).sum::<usize>()
    }

    /// Whether the registry has no rules.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let registry = &*STANDARD_REGISTRY;
        assert_eq!(registry.generic_rules().len(), 9);
        assert_eq!(registry.len(), 20);

        let personal: Vec<&str> = registry
            .field_rules(FieldGroup::Personal)
            .iter()
            .map(PatternRule::name)
            .collect();
        assert_eq!(personal, vec!["NAME", "SURNAME", "ADDRESS"]);
        assert_eq!(registry.field_rules(FieldGroup::IdentityDocument).len(), 2);
        assert!(registry.rule("IBAN").is_some());
        assert!(registry.rule("NAME").is_none());
    }

    #[test]
    fn test_extract_prefers_group_one() {
        let rule = PatternRule::new("NAME", patterns::NAME.clone());
        assert_eq!(rule.extract("Nombre:   Lucía Gómez  "), Some("Lucía Gómez".to_string()));

        let rule = PatternRule::new("NIF", patterns::NIF.clone());
        assert_eq!(rule.extract("dni 12345678Z"), Some("12345678Z".to_string()));
        assert_eq!(rule.extract("nothing here"), None);
    }

    #[test]
    fn test_extract_all_keeps_duplicates_in_order() {
        let rule = PatternRule::new("POSTAL_CODE", patterns::POSTAL_CODE.clone());
        assert_eq!(
            rule.extract_all("28001 Madrid, 08002 Barcelona, 28001 Madrid"),
            vec!["28001", "08002", "28001"]
        );
    }

    #[test]
    fn test_custom_registry() {
        let registry = PatternRegistry::new()
            .with_generic(PatternRule::from_pattern("CODE", r"\bK[0-9]{3}\b").unwrap())
            .with_generic(PatternRule::from_pattern("CODE", r"\bQ[0-9]{3}\b").unwrap())
            .with_field(FieldGroup::Invoice, PatternRule::from_pattern("REF", r"ref:\s*(\w+)").unwrap());

        assert_eq!(registry.generic_rules().len(), 1);
        assert_eq!(registry.rule("CODE").unwrap().extract_all("K123 Q456"), vec!["Q456"]);
        assert_eq!(registry.field_rules(FieldGroup::Invoice).len(), 1);
        assert!(registry.field_rules(FieldGroup::Medical).is_empty());
        assert!(PatternRegistry::new().is_empty());
    }
}
