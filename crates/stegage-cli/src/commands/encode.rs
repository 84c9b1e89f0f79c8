use stegage_core::Pipeline;
use tracing::info;
use zeroize::Zeroizing;

use crate::cli::EncodeArgs;
use crate::commands::CommandContext;
use crate::errors::CliError;
use crate::helpers::{prompt_passphrase, read_input, write_output};
use crate::progress::Spinner;

pub fn run(ctx: &CommandContext, args: &EncodeArgs) -> anyhow::Result<()> {
    let mut config = ctx.config.clone();
    if let Some(work_factor) = args.work_factor {
        config.cipher.work_factor = work_factor;
        config
            .validate()
            .map_err(|e| CliError::invalid_input(format!("--work-factor: {}", e)))?;
    }
    let pipeline = Pipeline::new(config).map_err(CliError::from)?;

    let cover_bytes = read_input(Some(&args.inside), "cover image")?;
    let cover = pipeline
        .decode_cover(&cover_bytes)
        .map_err(CliError::from)?;
    if let Ok(format) = pipeline.registry().detect(&cover_bytes) {
        if !format.lossless {
            info!(format = format.name, "lossy cover; output will be PNG");
        }
    }

    let plaintext = Zeroizing::new(read_input(args.file.as_deref(), "input file")?);
    // Reject before asking for a passphrase.
    pipeline
        .check_capacity(plaintext.len(), &cover)
        .map_err(CliError::from)?;

    let passphrase = prompt_passphrase(true)?;
    let stego = {
        let _spinner = Spinner::start("Encrypting", ctx.quiet);
        pipeline.conceal(&passphrase, &plaintext, &cover)
    }
    .map_err(CliError::from)?;
    let png = stego.encode_png().map_err(CliError::from)?;

    write_output(args.output.as_deref(), &png, true)?;

    if let Some(path) = &args.output {
        if !ctx.quiet {
            println!(
                "Hid {} bytes in {} ({}x{})",
                plaintext.len(),
                path.display(),
                stego.width(),
                stego.height()
            );
        }
    }
    Ok(())
}
