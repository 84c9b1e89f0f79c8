//! Input, output and passphrase helpers for the CLI.

use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;

use dialoguer::Password;
use stegage_core::Passphrase;
use zeroize::Zeroizing;

use crate::constants::PASSPHRASE_ENV;
use crate::errors::CliError;

/// Read the passphrase from STEGAGE_PASSPHRASE, or prompt on the terminal.
///
/// With `confirm` the prompt asks twice and rejects mismatches.
pub fn prompt_passphrase(confirm: bool) -> anyhow::Result<Passphrase> {
    if let Ok(value) = std::env::var(PASSPHRASE_ENV) {
        let value = Zeroizing::new(value);
        if !value.is_empty() {
            return Ok(Passphrase::new(value.as_bytes())?);
        }
    }
    if !io::stderr().is_terminal() {
        return Err(CliError::invalid_input(format!(
            "No passphrase provided and no TTY available. Set {}.",
            PASSPHRASE_ENV
        ))
        .into());
    }

    let prompt = Password::new().with_prompt("Passphrase");
    let prompt = if confirm {
        prompt.with_confirmation("Confirm passphrase", "Passphrases do not match")
    } else {
        prompt
    };
    let value = Zeroizing::new(
        prompt
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))?,
    );
    Ok(Passphrase::new(value.as_bytes())?)
}

/// Read a whole file, or stdin when `path` is `None`.
pub fn read_input(path: Option<&Path>, what: &str) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                CliError::not_found(
                    format!("{} not found: {}", capitalize(what), path.display()),
                    "Hint: Check the path and try again.",
                )
                .into()
            } else {
                anyhow::anyhow!("Failed to read {} {}: {}", what, path.display(), e)
            }
        }),
        None => {
            if io::stdin().is_terminal() {
                return Err(CliError::invalid_input(format!(
                    "No {} given. Pass a path or pipe it on stdin.",
                    what
                ))
                .into());
            }
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
            Ok(buffer)
        }
    }
}

/// Write `bytes` to `path` atomically, or to stdout when `path` is `None`.
///
/// With `binary` set, writing to a terminal is refused.
pub fn write_output(path: Option<&Path>, bytes: &[u8], binary: bool) -> anyhow::Result<()> {
    match path {
        Some(path) => stegage_core::fs::write_atomic(path, bytes)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e)),
        None => {
            let stdout = io::stdout();
            if binary && stdout.is_terminal() {
                return Err(CliError::invalid_input(
                    "Refusing to write image data to a terminal. Use --output or redirect stdout.",
                )
                .into());
            }
            let mut handle = stdout.lock();
            handle
                .write_all(bytes)
                .and_then(|_| handle.flush())
                .map_err(|e| anyhow::anyhow!("Failed to write stdout: {}", e))
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
