//! The `classify` subcommand.

use anyhow::Result;
use std::path::PathBuf;

use camels_archive::classifier::{classify, Classification, MatchRules, Variant};

/// Classify a candidate file and report the result.
///
/// Exits nonzero on rejection so the command composes in shell pipelines.
pub fn run(file: PathBuf) -> Result<()> {
    match classify(&file, None, &MatchRules::default()) {
        Classification::Match(Variant::Default) => {
            report("CAMELS measurement (default variant)");
        }
        Classification::Match(Variant::Diode) => {
            report("CAMELS measurement (diode variant)");
        }
        Classification::NotAMatch => {
            report("not a CAMELS measurement");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[cfg(feature = "colorized_output")]
fn report(message: &str) {
    use console::style;
    println!("{}", style(message).bold());
}

#[cfg(not(feature = "colorized_output"))]
fn report(message: &str) {
    println!("{message}");
}
