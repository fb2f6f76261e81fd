//! Inspect command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use imgprep_core::{ContainerReader, FeatureRecord};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default)]
struct ContainerStats {
    records: u64,
    labels: BTreeMap<u32, u64>,
    shapes: BTreeMap<(u32, u32, u32), u64>,
    preview: Vec<RecordPreview>,
}

#[derive(Debug)]
struct RecordPreview {
    index: u64,
    label: u32,
    shape: (u32, u32, u32),
    min: f32,
    max: f32,
    mean: f32,
}

impl RecordPreview {
    fn new(index: u64, record: &FeatureRecord) -> Self {
        let (mut min, mut max, mut sum) = (f32::MAX, f32::MIN, 0.0f64);
        for &p in &record.pixels {
            min = min.min(p);
            max = max.max(p);
            sum += f64::from(p);
        }
        if record.pixels.is_empty() {
            (min, max) = (0.0, 0.0);
        }
        let mean = if record.pixels.is_empty() { 0.0 } else { (sum / record.pixels.len() as f64) as f32 };
        Self { index, label: record.label, shape: (record.height, record.width, record.depth), min, max, mean }
    }
}

fn scan(path: &Path, limit: usize) -> Result<ContainerStats> {
    let reader = ContainerReader::open(path).with_context(|| format!("Failed to open container: {}", path.display()))?;

    let mut stats = ContainerStats::default();
    for record in reader {
        let record = record.with_context(|| format!("Failed to read container: {}", path.display()))?;
        if stats.preview.len() < limit {
            stats.preview.push(RecordPreview::new(stats.records, &record));
        }
        *stats.labels.entry(record.label).or_insert(0) += 1;
        *stats.shapes.entry((record.height, record.width, record.depth)).or_insert(0) += 1;
        stats.records += 1;
    }
    Ok(stats)
}

pub fn execute(path: &Path, limit: usize, json_output: bool) -> Result<()> {
    let stats = scan(path, limit)?;

    if json_output {
        let out = json!({
            "container": path,
            "records": stats.records,
            "labels": stats.labels.iter().map(|(k, v)| (k.to_string(), *v)).collect::<BTreeMap<_, _>>(),
            "shapes": stats
                .shapes
                .iter()
                .map(|((h, w, d), count)| json!({"height": h, "width": w, "depth": d, "count": count}))
                .collect::<Vec<_>>(),
            "preview": stats
                .preview
                .iter()
                .map(|p| json!({
                    "index": p.index,
                    "label": p.label,
                    "height": p.shape.0,
                    "width": p.shape.1,
                    "depth": p.shape.2,
                    "min": p.min,
                    "max": p.max,
                    "mean": p.mean,
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Container ({} records)", stats.records).bold().cyan());
    println!("  {}", path.display().to_string().dimmed());
    println!();

    if stats.records == 0 {
        println!("  {}", "Container holds no records.".dimmed());
        println!();
        return Ok(());
    }

    println!("{}", "Labels".bold());
    for (label, count) in &stats.labels {
        println!("  {label:<6} {count}");
    }
    println!();

    println!("{}", "Shapes".bold());
    for ((h, w, d), count) in &stats.shapes {
        println!("  {h}x{w}x{d}  {count}");
    }
    println!();

    println!("{:<8} {:<6} {:<14} {:<8} {:<8} {}", "Index", "Label", "Shape", "Min", "Max", "Mean");
    println!("{}", "─".repeat(60));
    for p in &stats.preview {
        println!(
            "{:<8} {:<6} {:<14} {:<8.4} {:<8.4} {:.4}",
            p.index,
            p.label,
            format!("{}x{}x{}", p.shape.0, p.shape.1, p.shape.2),
            p.min,
            p.max,
            p.mean
        );
    }
    println!();
    Ok(())
}
