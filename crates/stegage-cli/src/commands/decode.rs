use zeroize::Zeroizing;

use crate::cli::DecodeArgs;
use crate::commands::CommandContext;
use crate::errors::CliError;
use crate::helpers::{prompt_passphrase, read_input, write_output};
use crate::progress::Spinner;

pub fn run(ctx: &CommandContext, args: &DecodeArgs) -> anyhow::Result<()> {
    let pipeline = ctx.pipeline()?;

    let image_bytes = read_input(args.image.as_deref(), "image")?;
    let image = pipeline
        .decode_cover(&image_bytes)
        .map_err(CliError::from)?;
    // No passphrase prompt for images that hold nothing.
    let blob = pipeline.extract_blob(&image).map_err(CliError::from)?;

    let passphrase = prompt_passphrase(false)?;
    let plaintext = {
        let _spinner = Spinner::start("Decrypting", ctx.quiet);
        pipeline.engine().decrypt(&passphrase, &blob)
    }
    .map_err(CliError::from)?;
    let plaintext = Zeroizing::new(plaintext);

    write_output(args.output.as_deref(), &plaintext, false)?;

    if let Some(path) = &args.output {
        if !ctx.quiet {
            println!("Recovered {} bytes to {}", plaintext.len(), path.display());
        }
    }
    Ok(())
}
