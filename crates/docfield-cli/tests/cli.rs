use std::fs;

use assert_cmd::Command;
use image::{DynamicImage, GrayImage, Luma};
use predicates::prelude::*;

fn docfield() -> Command {
    Command::cargo_bin("docfield").unwrap()
}

#[test]
fn test_help_lists_commands() {
    docfield()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_validate_accepts_valid_numbers() {
    docfield()
        .args(["validate", "12345678Z", "X1234567L", "00000000T"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NIF 12345678Z: valid"))
        .stdout(predicate::str::contains("NIE X1234567L: valid"));
}

#[test]
fn test_validate_rejects_wrong_letter() {
    docfield()
        .args(["validate", "12345678Z", "12345678A"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("NIF 12345678A: invalid check letter"))
        .stderr(predicate::str::contains("1 of 2 identity number(s) invalid"));
}

#[test]
fn test_process_text_json() {
    let dir = tempfile::tempdir().unwrap();
    let text = dir.path().join("dni.txt");
    fs::write(&text, "Nombre: JUAN PEREZ.\nNIF: 12345678Z.").unwrap();

    let output = docfield()
        .args(["process", "--class", "dni", "--text"])
        .arg(&text)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["class"], "identity_card");
    assert_eq!(report["result"]["fields"]["NAME"], "JUAN PEREZ");
    assert_eq!(report["result"]["fields"]["NIF"][0], "12345678Z");
    assert_eq!(report["result"]["identity_checks"]["NIF"][0], true);
}

#[test]
fn test_process_text_csv_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let text = dir.path().join("factura.txt");
    let out = dir.path().join("factura.csv");
    fs::write(&text, "Factura\nFecha: 15/03/2024\nTotal: 1234,56 €").unwrap();

    docfield()
        .args(["process", "-k", "invoice", "-f", "csv", "--text"])
        .arg(&text)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("field,value,valid\n"));
    assert!(csv.contains("AMOUNT,\"1234,56\","));
    assert!(csv.contains("INVOICE_DATE,15/03/2024,"));
}

#[test]
fn test_process_image_without_models() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("page.png");
    DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 20, Luma([200]))).save(&page).unwrap();

    docfield()
        .arg("process")
        .arg(&page)
        .arg("--model-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("OCR models not found"));
}

#[test]
fn test_process_missing_input() {
    docfield()
        .args(["process", "/nonexistent/scan.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_preprocess_upscales_invoice() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("scan.png");
    let output = dir.path().join("clean.png");
    DynamicImage::ImageLuma8(GrayImage::from_pixel(600, 100, Luma([100]))).save(&input).unwrap();

    docfield()
        .arg("preprocess")
        .arg(&input)
        .args(["--class", "invoice", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("600x100 -> 1200x200"));

    let processed = image::open(&output).unwrap();
    assert_eq!((processed.width(), processed.height()), (1200, 200));
}

#[test]
fn test_preprocess_single_document() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dni.png");
    let output = dir.path().join("clean.png");
    DynamicImage::ImageLuma8(GrayImage::from_pixel(900, 100, Luma([100]))).save(&input).unwrap();

    docfield()
        .arg("preprocess")
        .arg(&input)
        .args(["--single-document", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("900x100 -> 900x100"));

    // (100 - 128) * 1.5 + 128, unfiltered
    let processed = image::open(&output).unwrap().to_rgb8();
    assert!(processed.pixels().all(|p| p[0] == 86));
}

#[test]
fn test_process_text_single_document() {
    let dir = tempfile::tempdir().unwrap();
    let text = dir.path().join("dni.txt");
    fs::write(&text, "Nombre: ANA maría. Apellidos: RUIZ. NIF: 12345678Z.").unwrap();

    let output = docfield()
        .args(["process", "--single-document", "--text"])
        .arg(&text)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["class"], "identity_card");
    assert_eq!(report["result"]["fields"]["NAME"], "ANA");
    assert_eq!(report["result"]["fields"]["SURNAME"], "RUIZ");
    assert_eq!(report["result"]["identity_checks"]["NIF"][0], true);
}

#[test]
fn test_batch_text_files_with_summary() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    fs::write(dir.path().join("a.txt"), "Nombre: ANA RUIZ. NIF: 12345678Z.").unwrap();
    fs::write(dir.path().join("b.txt"), "Nombre: LUIS GIL. NIE: X1234567L.").unwrap();
    fs::write(dir.path().join("notes.md"), "ignored").unwrap();

    let pattern = dir.path().join("*").to_string_lossy().to_string();
    docfield()
        .args(["batch", &pattern, "-k", "dni", "-j", "2", "--summary", "--output-dir"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"))
        .stdout(predicate::str::contains("Processed 2 files"));

    let a: serde_json::Value = serde_json::from_str(&fs::read_to_string(out.join("a.txt.json")).unwrap()).unwrap();
    assert_eq!(a["result"]["fields"]["NAME"], "ANA RUIZ");
    assert!(out.join("b.txt.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("a.txt,success,identity_card,"));
    assert!(lines[2].starts_with("b.txt,success,identity_card,"));
    assert!(lines[2].contains("X1234567L,true"));
}

#[test]
fn test_batch_no_matches() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = dir.path().join("*.pdf").to_string_lossy().to_string();

    docfield()
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn test_config_init_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    let config_arg = config.to_string_lossy().to_string();

    docfield()
        .args(["-c", &config_arg, "config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    docfield()
        .args(["-c", &config_arg, "config", "get", "pdf.render_dpi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("300"));

    docfield()
        .args(["-c", &config_arg, "config", "set", "extraction.default_class", "invoice"])
        .assert()
        .success();

    docfield()
        .args(["-c", &config_arg, "config", "get", "extraction.default_class"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"invoice\""));

    docfield()
        .args(["-c", &config_arg, "config", "set", "pdf.render_dpi", "0"])
        .assert()
        .failure();

    docfield()
        .args(["-c", &config_arg, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_default_class_applies_to_process() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    let text = dir.path().join("doc.txt");
    fs::write(&config, r#"{ "extraction": { "default_class": "medical_record" } }"#).unwrap();
    fs::write(&text, "Diagnóstico: gripe común.").unwrap();

    let output = docfield()
        .arg("-c")
        .arg(&config)
        .args(["process", "--text"])
        .arg(&text)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["class"], "medical_record");
    assert_eq!(report["result"]["fields"]["DIAGNOSIS"], "gripe común");
}
