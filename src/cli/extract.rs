//! The `extract` subcommand.

use anyhow::{bail, Context, Result};
use log::info;
use std::path::PathBuf;

use camels_archive::archive::{FileSystemSink, UploadContext};
use camels_archive::classifier::{classify, Classification, MatchRules};
use camels_archive::extractor::Extractor;

use super::config::Config;

/// Classify and extract a measurement file.
pub fn run(
    input: PathBuf,
    output_dir: Option<PathBuf>,
    upload_id: Option<String>,
    config: Option<PathBuf>,
    print: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };

    let classification = classify(&input, None, &MatchRules::default());
    let Classification::Match(variant) = classification else {
        bail!("{} is not a recognized CAMELS measurement file", input.display());
    };
    info!("Classified {} as {variant:?} variant", input.display());

    let extractor = Extractor::new(&config.extractor_config())
        .context("Failed to build the identity service client")?;

    if print {
        // Testing mode: return the document instead of persisting it.
        let document = extractor
            .parse(&input, variant)
            .with_context(|| format!("Extraction of {} failed", input.display()))?;
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let output_dir = match output_dir {
        Some(dir) => dir,
        None => input
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let sink = FileSystemSink::new(&output_dir);
    let context = UploadContext { upload_id };
    extractor
        .process(&input, variant, &sink, &context)
        .with_context(|| format!("Extraction of {} failed", input.display()))?;

    summary(&input, &output_dir);
    Ok(())
}

#[cfg(feature = "colorized_output")]
fn summary(input: &std::path::Path, output_dir: &std::path::Path) {
    use console::style;
    println!(
        "{} extracted {} into {}",
        style("ok").green().bold(),
        style(input.display()).cyan(),
        output_dir.display()
    );
}

#[cfg(not(feature = "colorized_output"))]
fn summary(input: &std::path::Path, output_dir: &std::path::Path) {
    println!("extracted {} into {}", input.display(), output_dir.display());
}
