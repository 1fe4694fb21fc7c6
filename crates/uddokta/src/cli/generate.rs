//! The `uddokta generate` command: one poster, printed as JSON.

use clap::Args;
use serde_json::{Map, Value};
use std::path::PathBuf;
use uddokta_core::{Config, PosterRequest, PosterService};

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Marketing idea or text for the poster
    #[arg(required = true)]
    pub text: String,

    /// Optional stats as a JSON object, e.g. '{"target_age":"18-30"}'
    #[arg(short, long)]
    pub stats: Option<String>,

    /// Write the generated image to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON response
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the generate command.
pub async fn execute(args: GenerateArgs, config: &Config) -> anyhow::Result<()> {
    let stats = parse_stats(args.stats.as_deref())?;
    let service = PosterService::from_config(config);

    let response = service
        .create(PosterRequest::new(args.text).with_stats(stats))
        .await?;

    if let (Some(path), Some(image)) = (&args.output, &response.image) {
        let bytes = super::image::decode_data_uri(image)?;
        std::fs::write(path, &bytes)?;
        tracing::info!("Wrote image to {} ({} bytes)", path.display(), bytes.len());
    }
    if let Some(err) = &response.hf_error {
        tracing::warn!("Failed to generate image: {err}");
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");
    Ok(())
}

/// Parse the `--stats` argument. Empty input means no stats; anything else
/// must be a JSON object.
pub fn parse_stats(input: Option<&str>) -> anyhow::Result<Map<String, Value>> {
    let Some(text) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Map::new());
    };
    let value: Value = serde_json::from_str(text)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in stats: {e}"))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("Stats must be a JSON object (e.g. {{\"price\":499}})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stats_empty() {
        assert!(parse_stats(None).unwrap().is_empty());
        assert!(parse_stats(Some("   ")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_stats_object() {
        let stats = parse_stats(Some(r#"{"price": 499, "sector_focus": "tech"}"#)).unwrap();
        assert_eq!(stats["price"], 499);
        assert_eq!(stats["sector_focus"], "tech");
    }

    #[test]
    fn test_parse_stats_rejects_non_object() {
        let err = parse_stats(Some("[1, 2]")).unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn test_parse_stats_rejects_bad_json() {
        let err = parse_stats(Some("{price:")).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }
}
