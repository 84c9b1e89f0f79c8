use stegage_core::{ChannelPolicy, LENGTH_PREFIX_BITS};

use crate::cli::CapacityArgs;
use crate::commands::CommandContext;
use crate::errors::CliError;
use crate::helpers::read_input;

pub fn run(ctx: &CommandContext, args: &CapacityArgs) -> anyhow::Result<()> {
    let pipeline = ctx.pipeline()?;

    let bytes = read_input(Some(&args.image), "image")?;
    let format = *pipeline.registry().detect(&bytes).map_err(CliError::from)?;
    let cover = pipeline.decode_cover(&bytes).map_err(CliError::from)?;

    let channels = match pipeline.codec().config().channels {
        ChannelPolicy::Rgb => "rgb",
        ChannelPolicy::Rgba => "rgba",
    };
    let capacity_bits = pipeline.codec().capacity_bits(&cover);
    let max_plaintext = pipeline.max_plaintext_len(&cover).unwrap_or(0);

    println!(
        "image:      {}x{} {} ({})",
        cover.width(),
        cover.height(),
        format.name,
        if format.lossless { "lossless" } else { "lossy" }
    );
    println!("channels:   {}", channels);
    println!(
        "capacity:   {} bits ({} usable after the length prefix)",
        capacity_bits,
        capacity_bits.saturating_sub(LENGTH_PREFIX_BITS)
    );
    println!("max file:   {} bytes", max_plaintext);
    if !format.lossless && !ctx.quiet {
        eprintln!("note: {} covers are read only; the result is written as PNG", format.name);
    }
    Ok(())
}
