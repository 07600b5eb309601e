//! Validate command - NIF/NIE check letters.

use clap::Args;
use console::style;

use docfield_core::validation::IdentityKind;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Identity numbers to check (e.g. 12345678Z, X1234567L)
    #[arg(required = true)]
    codes: Vec<String>,
}

/// Verdict line for one code.
fn verdict(code: &str) -> (bool, String) {
    match IdentityKind::detect(code) {
        Some(kind) => {
            let valid = kind.validate(code);
            let label = if valid { "valid" } else { "invalid check letter" };
            (valid, format!("{} {}: {}", kind.field_name(), code, label))
        }
        None => (false, format!("{}: not a NIF or NIE", code)),
    }
}

pub async fn run(args: ValidateArgs) -> anyhow::Result<()> {
    let mut invalid = 0;

    for code in &args.codes {
        let (valid, line) = verdict(code.trim());
        if valid {
            println!("{} {}", style("✓").green(), line);
        } else {
            invalid += 1;
            println!("{} {}", style("✗").red(), line);
        }
    }

    if invalid > 0 {
        anyhow::bail!("{} of {} identity number(s) invalid", invalid, args.codes.len());
    }

    Ok(())
}
