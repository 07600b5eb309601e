//! Document classes and the per-class processing profile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::SINGLE_DOCUMENT_MIN_WIDTH;

/// Kind of document being scanned. Chosen by the caller and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentClass {
    /// National identity card (DNI/NIE).
    IdentityCard,
    /// Passport.
    Passport,
    /// Commercial invoice.
    Invoice,
    /// Contract.
    Contract,
    /// Medical record or report.
    MedicalRecord,
}

/// Convolution filter applied after the contrast stretch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// No extra filtering.
    None,
    /// Sharpen kernel, for small printed text on official documents.
    Sharpen,
    /// Gaussian-like denoise kernel.
    Denoise,
}

/// Group of labelled single-value fields extracted for a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    /// Name, surname, address.
    Personal,
    /// Amount and invoice date.
    Invoice,
    /// Clause number and validity.
    Contract,
    /// Diagnosis and medication.
    Medical,
    /// Upper-case name and surname as printed on a DNI card.
    IdentityDocument,
}

/// Declarative processing profile of a document class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassProfile {
    /// Contrast stretch factor around mid-gray.
    pub contrast_factor: f32,
    /// Filter applied after the contrast stretch.
    pub filter: FilterKind,
    /// Labelled fields to extract.
    pub field_group: FieldGroup,
    /// Whether NIF/NIE matches get a checksum annotation.
    pub validates_identity: bool,
    /// Upscale threshold overriding the preprocessor's own.
    pub upscale_min_width: Option<u32>,
}

impl ClassProfile {
    /// Profile of a lone DNI card scan, with its own 800 px upscale threshold.
    pub const SINGLE_DOCUMENT: ClassProfile = ClassProfile {
        contrast_factor: 1.5,
        filter: FilterKind::None,
        field_group: FieldGroup::IdentityDocument,
        validates_identity: true,
        upscale_min_width: Some(SINGLE_DOCUMENT_MIN_WIDTH),
    };
}

impl DocumentClass {
    /// All classes, in declaration order.
    pub const ALL: [DocumentClass; 5] = [
        DocumentClass::IdentityCard,
        DocumentClass::Passport,
        DocumentClass::Invoice,
        DocumentClass::Contract,
        DocumentClass::MedicalRecord,
    ];

    /// Processing profile for this class.
    pub fn profile(self) -> ClassProfile {
        match self {
            DocumentClass::IdentityCard | DocumentClass::Passport => ClassProfile {
                contrast_factor: 1.8,
                filter: FilterKind::Sharpen,
                field_group: FieldGroup::Personal,
                validates_identity: true,
                upscale_min_width: None,
            },
            DocumentClass::Invoice => ClassProfile {
                contrast_factor: 1.3,
                filter: FilterKind::None,
                field_group: FieldGroup::Invoice,
                validates_identity: false,
                upscale_min_width: None,
            },
            DocumentClass::Contract => ClassProfile {
                contrast_factor: 1.3,
                filter: FilterKind::None,
                field_group: FieldGroup::Contract,
                validates_identity: false,
                upscale_min_width: None,
            },
            DocumentClass::MedicalRecord => ClassProfile {
                contrast_factor: 1.5,
                filter: FilterKind::Denoise,
                field_group: FieldGroup::Medical,
                validates_identity: false,
                upscale_min_width: None,
            },
        }
    }

    /// Canonical snake-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentClass::IdentityCard => "identity_card",
            DocumentClass::Passport => "passport",
            DocumentClass::Invoice => "invoice",
            DocumentClass::Contract => "contract",
            DocumentClass::MedicalRecord => "medical_record",
        }
    }
}

impl fmt::Display for DocumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "identity_card" | "identity" | "id" | "dni" => Ok(DocumentClass::IdentityCard),
            "passport" | "pasaporte" => Ok(DocumentClass::Passport),
            "invoice" | "factura" => Ok(DocumentClass::Invoice),
            "contract" | "contrato" => Ok(DocumentClass::Contract),
            "medical_record" | "medical" | "documento_medico" => Ok(DocumentClass::MedicalRecord),
            other => Err(format!("unknown document class: '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_match_class_table() {
        let id = DocumentClass::IdentityCard.profile();
        assert_eq!(id.contrast_factor, 1.8);
        assert_eq!(id.filter, FilterKind::Sharpen);
        assert!(id.validates_identity);

        assert_eq!(DocumentClass::Passport.profile(), id);

        let invoice = DocumentClass::Invoice.profile();
        assert_eq!(invoice.contrast_factor, 1.3);
        assert_eq!(invoice.filter, FilterKind::None);
        assert_eq!(invoice.field_group, FieldGroup::Invoice);

        let contract = DocumentClass::Contract.profile();
        assert_eq!(contract.contrast_factor, 1.3);
        assert_eq!(contract.field_group, FieldGroup::Contract);

        let medical = DocumentClass::MedicalRecord.profile();
        assert_eq!(medical.contrast_factor, 1.5);
        assert_eq!(medical.filter, FilterKind::Denoise);
        assert!(!medical.validates_identity);

        assert!(DocumentClass::ALL.iter().all(|c| c.profile().upscale_min_width.is_none()));
    }

    #[test]
    fn test_single_document_profile() {
        let profile = ClassProfile::SINGLE_DOCUMENT;
        assert_eq!(profile.contrast_factor, 1.5);
        assert_eq!(profile.filter, FilterKind::None);
        assert_eq!(profile.field_group, FieldGroup::IdentityDocument);
        assert!(profile.validates_identity);
        assert_eq!(profile.upscale_min_width, Some(800));
    }

    #[test]
    fn test_parse_class_names() {
        for class in DocumentClass::ALL {
            assert_eq!(class.as_str().parse::<DocumentClass>(), Ok(class));
        }
        assert_eq!("DNI".parse::<DocumentClass>(), Ok(DocumentClass::IdentityCard));
        assert_eq!("medical-record".parse::<DocumentClass>(), Ok(DocumentClass::MedicalRecord));
        assert!("receipt".parse::<DocumentClass>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&DocumentClass::MedicalRecord).unwrap();
        assert_eq!(json, "\"medical_record\"");
    }
}
