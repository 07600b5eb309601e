//! Regex patterns for identity, commercial and medical documents.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Identity numbers
    pub static ref NIF: Regex = Regex::new(
        r"\b[0-9]{8}[A-Z]\b"
    ).unwrap();

    pub static ref NIE: Regex = Regex::new(
        r"\b[XYZ][0-9]{7}[A-Z]\b"
    ).unwrap();

    pub static ref PASSPORT: Regex = Regex::new(
        r"\b[A-Z]{3}[0-9]{6}\b"
    ).unwrap();

    // Spanish IBAN, no grouping spaces
    pub static ref IBAN: Regex = Regex::new(
        r"\bES[0-9]{22}\b"
    ).unwrap();

    pub static ref SOCIAL_SECURITY: Regex = Regex::new(
        r"\b[0-9]{2}\s?[0-9]{8}\s?[0-9]{2}\b"
    ).unwrap();

    pub static ref DATE: Regex = Regex::new(
        r"\b[0-3]?[0-9][/-][0-1]?[0-9][/-][0-9]{2,4}\b"
    ).unwrap();

    pub static ref POSTAL_CODE: Regex = Regex::new(
        r"\b[0-9]{5}\b"
    ).unwrap();

    // Mobile (6-9 + 8 digits) or 3+3+3 groups
    pub static ref PHONE: Regex = Regex::new(
        r"\b[6-9][0-9]{8}\b|\b[0-9]{3}\s?[0-9]{3}\s?[0-9]{3}\b"
    ).unwrap();

    pub static ref EMAIL: Regex = Regex::new(
        r"(?i)\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"
    ).unwrap();

    // Personal fields
    pub static ref NAME: Regex = Regex::new(
        r"(?i)(?:nombres?|name)[:\s]*([A-ZÁÉÍÓÚÑ][A-Za-záéíóúñ\s]+)"
    ).unwrap();

    pub static ref SURNAME: Regex = Regex::new(
        r"(?i)(?:apellidos?|surname)[:\s]*([A-ZÁÉÍÓÚÑ][A-Za-záéíóúñ\s]+)"
    ).unwrap();

    // DNI card fields: case-insensitive label, upper-case value
    pub static ref DNI_NAME: Regex = Regex::new(
        r"(?i:nombres?):?\s*([A-ZÁÉÍÓÚÑ\s]+)"
    ).unwrap();

    pub static ref DNI_SURNAME: Regex = Regex::new(
        r"(?i:apellidos?):?\s*([A-ZÁÉÍÓÚÑ\s]+)"
    ).unwrap();

    pub static ref ADDRESS: Regex = Regex::new(
        r"(?i)(?:domicilio|dirección|address)[:\s]*([A-Za-záéíóúñ0-9\s,.-]+)"
    ).unwrap();

    // Invoice fields
    pub static ref AMOUNT: Regex = Regex::new(
        r"(?i)(?:total|importe)[:\s]*([0-9]+[,.]?[0-9]*)[\s€]"
    ).unwrap();

    pub static ref INVOICE_DATE: Regex = Regex::new(
        r"(?i)(?:fecha|date)[:\s]*([0-3]?[0-9][/-][0-1]?[0-9][/-][0-9]{2,4})"
    ).unwrap();

    // Contract fields
    pub static ref CLAUSE: Regex = Regex::new(
        r"(?i)cláusula[\s]*([0-9]+)"
    ).unwrap();

    pub static ref VALIDITY: Regex = Regex::new(
        r"(?i)(?:vigencia|validez)[:\s]*([^.]+)"
    ).unwrap();

    // Medical fields
    pub static ref DIAGNOSIS: Regex = Regex::new(
        r"(?i)(?:diagnóstico|diagnosis)[:\s]*([^.]+)"
    ).unwrap();

    pub static ref MEDICATION: Regex = Regex::new(
        r"(?i)(?:medicamento|tratamiento)[:\s]*([^.]+)"
    ).unwrap();
}
