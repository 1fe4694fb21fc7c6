//! The `uddokta image` command: render a prompt with the image models only.
//!
//! Handy for checking a Hugging Face token and model list without spending
//! text-provider credits.

use base64::Engine;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use uddokta_core::{Config, HuggingFaceProvider, ImageProvider};

const DEFAULT_PROMPT: &str = "A vibrant fantasy landscape, highly detailed, photorealistic";

/// Arguments for the `image` command.
#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Prompt to render
    #[arg(default_value = DEFAULT_PROMPT)]
    pub prompt: String,

    /// Try only this model instead of the configured primary + fallbacks
    #[arg(short, long)]
    pub model: Option<String>,

    /// Where to write the image
    #[arg(short, long, default_value = "hf-test.png")]
    pub output: PathBuf,
}

/// Execute the image command.
pub async fn execute(args: ImageArgs, config: &Config) -> anyhow::Result<()> {
    let provider = HuggingFaceProvider::new(
        &config.image.huggingface,
        Duration::from_millis(config.limits.image_timeout_ms),
    );

    tracing::info!("Prompt: {}", args.prompt);
    let uri = match &args.model {
        Some(model) => {
            tracing::info!("Model: {model}");
            provider
                .call_model(model, &args.prompt)
                .await
                .map_err(|f| anyhow::anyhow!("Generation failed: {f}"))?
        }
        None => {
            tracing::info!("Models: {}", provider.models().join(", "));
            provider
                .generate(&args.prompt)
                .await
                .map_err(|e| anyhow::anyhow!("Generation failed: {e}"))?
        }
    };

    let bytes = uri.decode()?;
    std::fs::write(&args.output, &bytes)?;
    println!(
        "Wrote {} image to {} ({} bytes)",
        uri.media_type(),
        args.output.display(),
        bytes.len()
    );
    Ok(())
}

/// Decode the base64 payload of a `data:` URI.
pub fn decode_data_uri(uri: &str) -> anyhow::Result<Vec<u8>> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("Not a data URI"))?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        anyhow::bail!("Not a base64 data URI: {header}");
    }
    Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
}
