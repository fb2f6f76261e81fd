use crate::codec::ImageCodec;
use crate::container::ContainerWriter;
use crate::encoder::{RecordEncoder, DEFAULT_IMAGE_SIZE};
use crate::error::{PrepError, PrepResult};
use crate::layout::PrepLayout;
use crate::manifest::Manifest;
use crate::progress::{PrepEvent, ProgressSink};
use crate::rows::RowSource;
use crate::summary::{PrepRunId, PrepSummary};
use crate::supervisor::Supervisor;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PrepOptions {
    pub layout: PrepLayout,
    pub image_size: u32,
    /// Rows encoded concurrently; 1 keeps the run strictly sequential.
    pub jobs: usize,
}

impl PrepOptions {
    #[must_use]
    pub fn new(layout: PrepLayout) -> Self {
        Self { layout, image_size: DEFAULT_IMAGE_SIZE, jobs: 1 }
    }

    pub fn validate(&self) -> PrepResult<()> {
        if self.image_size == 0 {
            return Err(PrepError::Config("image size must be >= 1".to_string()));
        }
        if self.jobs == 0 {
            return Err(PrepError::Config("jobs must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Materialize the dataset described by the layout's manifest into a single
/// container, then write the run summary next to it.
///
/// The manifest and row file are opened before the container is created, so a
/// configuration error leaves any previous container untouched.
pub async fn run_pipeline(
    options: &PrepOptions,
    sink: &dyn ProgressSink,
    codec: Arc<dyn ImageCodec>,
) -> PrepResult<PrepSummary> {
    options.validate()?;
    let layout = &options.layout;
    let run_id = PrepRunId::new();

    let manifest_path = layout.manifest_path();
    info!(run = %run_id, manifest = %manifest_path.display(), "loading manifest");
    let manifest = Arc::new(Manifest::load(&manifest_path)?);

    let entries: Vec<(String, String)> =
        manifest.entries().into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    for (key, value) in &entries {
        debug!("{key} => {value}");
    }
    sink.on_event(PrepEvent::ManifestLoaded { run_id: run_id.clone(), entries });

    let rows = RowSource::open(&layout.row_file_path(&manifest))?;
    let asset_root = layout.asset_root(&manifest);

    layout.ensure_target_dir()?;
    let container = layout.container_path();
    let mut writer = ContainerWriter::open(&container)?;
    info!(run = %run_id, container = %container.display(), image_size = options.image_size, jobs = options.jobs, "processing images");
    sink.on_event(PrepEvent::Started { run_id: run_id.clone(), container: container.clone() });

    let encoder = RecordEncoder::new(asset_root, manifest, options.image_size, codec);
    let supervisor = Supervisor::new(run_id.clone(), sink);
    let report = if options.jobs > 1 {
        supervisor.run_concurrent(rows, Arc::new(encoder), &mut writer, options.jobs).await?
    } else {
        supervisor.run(rows, &encoder, &mut writer)?
    };
    writer.close()?;

    info!(
        run = %run_id,
        seen = report.seen,
        written = report.written,
        skipped = report.skipped,
        "saved to {}",
        container.display()
    );
    sink.on_event(PrepEvent::Finished {
        run_id: run_id.clone(),
        seen: report.seen,
        written: report.written,
        skipped: report.skipped,
    });

    let summary = PrepSummary::new(run_id, container, options.image_size, report)?;
    summary.write_json(&layout.summary_path())?;
    Ok(summary)
}
