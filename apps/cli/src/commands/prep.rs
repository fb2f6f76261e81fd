//! Prep command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use imgprep_core::{
    run_pipeline, ImageCrateCodec, NullProgressSink, PrepConfig, PrepLayout, PrepOptions, ProgressSink,
    StdoutProgressSink, DEFAULT_IMAGE_SIZE,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Default for all three directories, matching the fetch stage.
const DEFAULT_DIR: &str = "data";

#[derive(Debug)]
pub struct PrepArgs {
    pub data_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub target_output: Option<PathBuf>,
    pub image_size: Option<u32>,
    pub jobs: Option<usize>,
    pub json: bool,
}

fn resolve_options(args: &PrepArgs, config: &PrepConfig) -> PrepOptions {
    let dir = |flag: &Option<PathBuf>, configured: &Option<PathBuf>| {
        flag.clone().or_else(|| configured.clone()).unwrap_or_else(|| PathBuf::from(DEFAULT_DIR))
    };

    let layout = PrepLayout::new(
        dir(&args.data_path, &config.data_path),
        dir(&args.output_path, &config.output_path),
        dir(&args.target_output, &config.target_output),
    );

    let mut options = PrepOptions::new(layout);
    options.image_size = args.image_size.or(config.image_size).unwrap_or(DEFAULT_IMAGE_SIZE);
    options.jobs = args.jobs.or(config.jobs).unwrap_or(1);
    options
}

fn banner(title: &str) {
    println!();
    println!("{}", "#".repeat(75).dimmed());
    println!("{}", format!("#   {title}").bold().cyan());
    println!("{}", "#".repeat(75).dimmed());
}

pub async fn execute(args: PrepArgs, config: &PrepConfig) -> Result<()> {
    let options = resolve_options(&args, config);
    let layout = &options.layout;

    if !args.json {
        banner("Preprocess");
        println!("  data_path => {}", layout.data_dir().display());
        println!("  output_path => {}", layout.output_dir().display());
        println!("  target_output => {}", layout.target_dir().display());
        println!("  image_size => {}", options.image_size);
        println!("  jobs => {}", options.jobs);
        banner("Processing Images");
    }

    let sink: Box<dyn ProgressSink> =
        if args.json { Box::new(NullProgressSink) } else { Box::new(StdoutProgressSink) };

    let summary = run_pipeline(&options, sink.as_ref(), Arc::new(ImageCrateCodec))
        .await
        .context("Preprocessing failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("{}", "Done!".bold().green());
    println!(
        "  Saved to {}: processed {} records.",
        summary.container.display().to_string().cyan(),
        summary.written
    );
    println!("  written={} skipped={}", summary.written, summary.skipped);
    for (kind, count) in &summary.skipped_by_kind {
        println!("    {} {}", format!("{kind}:").yellow(), count);
    }
    println!("  sha256: {}", summary.container_sha256.dimmed());
    println!("  summary: {}", layout.summary_path().display().to_string().dimmed());
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> PrepArgs {
        PrepArgs { data_path: None, output_path: None, target_output: None, image_size: None, jobs: None, json: false }
    }

    #[test]
    fn test_defaults() {
        let options = resolve_options(&args(), &PrepConfig::default());
        assert_eq!(options.layout.data_dir(), PathBuf::from("data"));
        assert_eq!(options.layout.output_dir(), PathBuf::from("data"));
        assert_eq!(options.image_size, 160);
        assert_eq!(options.jobs, 1);
    }

    #[test]
    fn test_flags_override_config() {
        let config = PrepConfig {
            data_path: Some(PathBuf::from("/cfg/data")),
            target_output: Some(PathBuf::from("/cfg/target")),
            image_size: Some(224),
            jobs: Some(2),
            ..Default::default()
        };
        let flags = PrepArgs { data_path: Some(PathBuf::from("/flag/data")), jobs: Some(8), ..args() };

        let options = resolve_options(&flags, &config);
        assert_eq!(options.layout.data_dir(), PathBuf::from("/flag/data"));
        assert_eq!(options.layout.target_dir(), PathBuf::from("/cfg/target"));
        assert_eq!(options.image_size, 224);
        assert_eq!(options.jobs, 8);
    }
}
