//! Runs a pattern registry against OCR text.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::registry::{PatternRegistry, STANDARD_REGISTRY};
use super::{ExtractionResult, FieldExtractor, FieldValue};
use crate::models::document::{ClassProfile, DocumentClass};
use crate::validation::identity::IdentityKind;

/// Warning added when an identity document yields no NIF or NIE.
pub const NO_IDENTITY_WARNING: &str = "no identity number found";

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Apply every generic rule of `registry` to `text`.
///
/// Only rules with at least one match appear in the map.
pub fn extract_generic(text: &str, registry: &PatternRegistry) -> BTreeMap<String, Vec<String>> {
    let mut found = BTreeMap::new();
    for rule in registry.generic_rules() {
        let matches = rule.extract_all(text);
        if !matches.is_empty() {
            trace!("{}: {} match(es)", rule.name(), matches.len());
            found.insert(rule.name().to_string(), matches);
        }
    }
    found
}

/// Field extraction for a document class over an explicit registry.
#[derive(Debug, Clone)]
pub struct FieldEngine<'r> {
    registry: &'r PatternRegistry,
    validate_identity: bool,
}

impl FieldEngine<'static> {
    /// Engine over the standard registry.
    pub fn standard() -> Self {
        Self::new(&STANDARD_REGISTRY)
    }
}

impl<'r> FieldEngine<'r> {
    /// Create an engine over `registry`.
    pub fn new(registry: &'r PatternRegistry) -> Self {
        Self {
            registry,
            validate_identity: true,
        }
    }

    /// Enable or disable checksum annotation of identity numbers.
    pub fn with_identity_validation(mut self, validate: bool) -> Self {
        self.validate_identity = validate;
        self
    }

    /// Whether identity numbers get a checksum annotation.
    pub fn validates_identity(&self) -> bool {
        self.validate_identity
    }

    /// Registry in use.
    pub fn registry(&self) -> &PatternRegistry {
        self.registry
    }

    /// Extract generic and class-specific fields from raw OCR text.
    pub fn extract(&self, text: &str, class: DocumentClass) -> ExtractionResult {
        trace!("Extracting with {} profile", class);
        self.extract_with_profile(text, &class.profile())
    }

    /// Extract with an explicit profile: its field group and identity flag.
    pub fn extract_with_profile(&self, text: &str, profile: &ClassProfile) -> ExtractionResult {
        let text = normalize_whitespace(text);
        let mut result = ExtractionResult::default();

        if text.is_empty() {
            debug!("No text to extract from");
            return result;
        }

        for (name, values) in extract_generic(&text, self.registry) {
            result.fields.insert(name, FieldValue::Multiple(values));
        }

        for rule in self.registry.field_rules(profile.field_group) {
            if let Some(value) = rule.extract(&text) {
                result.fields.insert(rule.name().to_string(), FieldValue::Single(value));
            }
        }

        if profile.validates_identity {
            self.annotate_identity(&mut result);
        }

        debug!(
            "Extracted {} field(s) for {:?} fields ({} warning(s))",
            result.fields.len(),
            profile.field_group,
            result.warnings.len()
        );
        result
    }

    fn annotate_identity(&self, result: &mut ExtractionResult) {
        let mut any = false;

        for kind in [IdentityKind::Nif, IdentityKind::Nie] {
            let name = kind.field_name();
            let Some(values) = result.multiple(name).map(<[String]>::to_vec) else {
                continue;
            };
            any = true;

            if !self.validate_identity {
                continue;
            }

            let checks: Vec<bool> = values.iter().map(|v| kind.validate(v)).collect();
            for (value, valid) in values.iter().zip(&checks) {
                if !valid {
                    result.warnings.push(format!("{} {} failed checksum", name, value));
                }
            }
            result.identity_checks.insert(name.to_string(), checks);
        }

        if !any {
            result.warnings.push(NO_IDENTITY_WARNING.to_string());
        }
    }
}

impl Default for FieldEngine<'static> {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PatternRule;
    use crate::models::document::FieldGroup;
    use pretty_assertions::assert_eq;

    fn multiple(values: &[&str]) -> FieldValue {
        FieldValue::Multiple(values.iter().map(|v| v.to_string()).collect())
    }

    fn single(value: &str) -> FieldValue {
        FieldValue::Single(value.to_string())
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Nombre:\n\tJUAN \r\n PEREZ  "), "Nombre: JUAN PEREZ");
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }

    #[test]
    fn test_normalize_whitespace_is_idempotent() {
        for text in ["a  b\nc", "  x ", "NIF:\n12345678Z\n\nFecha 01/02/2020", "single"] {
            let once = normalize_whitespace(text);
            assert_eq!(normalize_whitespace(&once), once);
        }
    }

    #[test]
    fn test_identity_card_example() {
        let result = FieldEngine::standard().extract("Nombre: JUAN PEREZ. NIF: 12345678Z.", DocumentClass::IdentityCard);

        let mut fields = BTreeMap::new();
        fields.insert("NAME".to_string(), single("JUAN PEREZ"));
        fields.insert("NIF".to_string(), multiple(&["12345678Z"]));
        assert_eq!(result.fields, fields);

        let mut checks = BTreeMap::new();
        checks.insert("NIF".to_string(), vec![true]);
        assert_eq!(result.identity_checks, checks);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_multiline_ocr_text() {
        let text = "Nombre:\nJUAN\nPEREZ.\nNIE:\n  X1234567L";
        let result = FieldEngine::standard().extract(text, DocumentClass::Passport);
        assert_eq!(result.single("NAME"), Some("JUAN PEREZ"));
        assert_eq!(result.get("NIE"), Some(&multiple(&["X1234567L"])));
        assert_eq!(result.identity_checks.get("NIE"), Some(&vec![true]));
    }

    #[test]
    fn test_empty_text_yields_empty_result() {
        for class in DocumentClass::ALL {
            let result = FieldEngine::standard().extract("", class);
            assert_eq!(result, ExtractionResult::default());
            let result = FieldEngine::standard().extract("  \n ", class);
            assert!(result.is_empty());
        }
    }

    #[test]
    fn test_duplicates_in_order() {
        let generic = extract_generic("NIF 12345678Z, copia 00000000T, otra 12345678Z", &STANDARD_REGISTRY);
        assert_eq!(generic["NIF"], vec!["12345678Z", "00000000T", "12345678Z"]);
    }

    #[test]
    fn test_extract_generic_omits_unmatched_rules() {
        let generic = extract_generic("contacto: info@clinica.es", &STANDARD_REGISTRY);
        assert_eq!(generic.keys().collect::<Vec<_>>(), vec!["EMAIL"]);
        assert!(extract_generic("", &STANDARD_REGISTRY).is_empty());
    }

    #[test]
    fn test_invalid_checksum_is_kept() {
        let result = FieldEngine::standard().extract("DNI 12345678A y 12345678Z", DocumentClass::IdentityCard);
        assert_eq!(result.get("NIF"), Some(&multiple(&["12345678A", "12345678Z"])));
        assert_eq!(result.identity_checks["NIF"], vec![false, true]);
        assert_eq!(result.warnings, vec!["NIF 12345678A failed checksum".to_string()]);
    }

    #[test]
    fn test_missing_identity_number_warns() {
        let result = FieldEngine::standard().extract("Nombre: Ana Ruiz", DocumentClass::IdentityCard);
        assert_eq!(result.single("NAME"), Some("Ana Ruiz"));
        assert_eq!(result.warnings, vec![NO_IDENTITY_WARNING.to_string()]);
        assert!(result.identity_checks.is_empty());
    }

    #[test]
    fn test_non_identity_class_is_not_annotated() {
        let result = FieldEngine::standard().extract("Paciente con DNI 12345678A", DocumentClass::MedicalRecord);
        assert_eq!(result.get("NIF"), Some(&multiple(&["12345678A"])));
        assert!(result.identity_checks.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let result = FieldEngine::standard()
            .with_identity_validation(false)
            .extract("NIF 12345678A", DocumentClass::IdentityCard);
        assert!(result.identity_checks.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invoice_fields() {
        let text = "Factura 2024/17\nFecha: 15/03/2024\nTotal: 1234,56 €\nIBAN ES9121000418450200051332";
        let result = FieldEngine::standard().extract(text, DocumentClass::Invoice);

        assert_eq!(result.single("AMOUNT"), Some("1234,56"));
        assert_eq!(result.single("INVOICE_DATE"), Some("15/03/2024"));
        assert_eq!(result.get("DATE"), Some(&multiple(&["15/03/2024"])));
        assert_eq!(result.get("IBAN"), Some(&multiple(&["ES9121000418450200051332"])));
        assert!(result.get("NAME").is_none());
    }

    #[test]
    fn test_contract_fields() {
        let text = "Cláusula 5. Vigencia: doce meses desde la firma. Cláusula 6.";
        let result = FieldEngine::standard().extract(text, DocumentClass::Contract);
        assert_eq!(result.single("CLAUSE"), Some("5"));
        assert_eq!(result.single("VALIDITY"), Some("doce meses desde la firma"));
    }

    #[test]
    fn test_medical_fields() {
        let text = "Diagnóstico: gripe común. Tratamiento: paracetamol 1g cada 8 horas.";
        let result = FieldEngine::standard().extract(text, DocumentClass::MedicalRecord);
        assert_eq!(result.single("DIAGNOSIS"), Some("gripe común"));
        assert_eq!(result.single("MEDICATION"), Some("paracetamol 1g cada 8 horas"));
    }

    #[test]
    fn test_single_document_fields() {
        let engine = FieldEngine::standard();
        let text = "Nombre: JUAN CARLOS.\nApellidos: GARCÍA LÓPEZ.\nDNI 12345678Z";

        let result = engine.extract_with_profile(text, &ClassProfile::SINGLE_DOCUMENT);
        assert_eq!(result.single("NAME"), Some("JUAN CARLOS"));
        assert_eq!(result.single("SURNAME"), Some("GARCÍA LÓPEZ"));
        assert_eq!(result.identity_checks["NIF"], vec![true]);
        assert!(result.warnings.is_empty());

        // Lower-case text ends the value, unlike the general identity rules
        let text = "Nombre: ANA maría. NIF 12345678Z";
        let single = engine.extract_with_profile(text, &ClassProfile::SINGLE_DOCUMENT);
        assert_eq!(single.single("NAME"), Some("ANA"));
        let card = engine.extract(text, DocumentClass::IdentityCard);
        assert_eq!(card.single("NAME"), Some("ANA maría"));
    }

    #[test]
    fn test_substituted_registry() {
        let registry = PatternRegistry::new()
            .with_generic(PatternRule::from_pattern("TICKET", r"\bT-[0-9]{4}\b").unwrap())
            .with_field(FieldGroup::Contract, PatternRule::from_pattern("PARTY", r"(?i)parte:\s*(\w+)").unwrap());

        let result = FieldEngine::new(&registry).extract("Parte: ACME. T-0001 T-0002. 12345678Z", DocumentClass::Contract);

        let mut fields = BTreeMap::new();
        fields.insert("PARTY".to_string(), single("ACME"));
        fields.insert("TICKET".to_string(), multiple(&["T-0001", "T-0002"]));
        assert_eq!(result.fields, fields);
    }
}
