// SPDX-License-Identifier: MIT
//
// The pipeline itself: load, transform, save. Each run parses its own
// copy of the input bytes, so the caller's buffer is never mutated and a
// cancelled or failed run leaves nothing behind.

use std::time::Instant;

use chrono::Utc;
use tracing::{info, instrument};

use quire_core::config::EngineConfig;
use quire_core::error::{EngineError, Result};
use quire_core::types::{EditOutcome, OutputMetadata, PipelineStage, RunId};
use quire_document::{
    delete_with, extract_with, organize_with, remove_images, rotate_with, serialize,
    EditableDocument,
};
use quire_protect::protect;

use crate::cancel::CancelToken;
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::request::EditRequest;

// Percentage bands for the three stages.
const LOADED: u8 = 10;
const TRANSFORMED: u8 = 85;
const SAVING: u8 = 90;

/// Executes edit requests against PDF bytes.
#[derive(Debug, Clone, Default)]
pub struct EditPipeline {
    config: EngineConfig,
}

impl EditPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Run one edit synchronously. CPU-bound; call from a worker thread or
    /// go through [`EditPipeline::run`].
    #[instrument(skip_all, fields(request = request.label(), bytes_len = input.len()))]
    pub fn run_blocking(
        &self,
        input: &[u8],
        request: &EditRequest,
        progress: Option<ProgressCallback>,
        cancel: CancelToken,
    ) -> Result<EditOutcome> {
        let started = Instant::now();
        let run_id = RunId::new();
        let mut reporter = ProgressReporter::new(progress);

        reporter.report(0, PipelineStage::Load.label());
        let document = EditableDocument::from_bytes(input)?;
        cancel.checkpoint()?;
        reporter.report(LOADED, PipelineStage::Transform.label());

        let mut document = self.apply(document, request, &mut reporter, &cancel)?;

        cancel.checkpoint()?;
        reporter.report(SAVING, PipelineStage::Save.label());

        // A protect run compressed its streams before encrypting (readers
        // decrypt first, then apply filters); compressing the ciphertext
        // here would corrupt the document.
        let mut save_config = self.config.clone();
        if matches!(request, EditRequest::Protect { .. }) {
            save_config.compress_output = false;
        }
        let bytes = serialize(&mut document, &save_config)?;

        let metadata = OutputMetadata {
            page_count: document.page_count(),
            original_size_bytes: input.len() as u64,
            output_size_bytes: bytes.len() as u64,
            processing_time_ms: started.elapsed().as_millis() as u64,
        };
        reporter.report(100, "done");

        info!(
            %run_id,
            pages = metadata.page_count,
            output_bytes = metadata.output_size_bytes,
            elapsed_ms = metadata.processing_time_ms,
            "Pipeline run complete"
        );
        Ok(EditOutcome {
            run_id,
            bytes,
            metadata,
            completed_at: Utc::now(),
        })
    }

    /// Async entry point: offloads [`EditPipeline::run_blocking`] to the
    /// blocking thread pool.
    pub async fn run(
        &self,
        input: Vec<u8>,
        request: EditRequest,
        progress: Option<ProgressCallback>,
        cancel: CancelToken,
    ) -> Result<EditOutcome> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || {
            pipeline.run_blocking(&input, &request, progress, cancel)
        })
        .await
        .map_err(|err| EngineError::Internal(format!("pipeline worker failed: {err}")))?
    }

    /// Dispatch the transform stage, wiring per-page progress and
    /// cancellation into operations that copy page by page.
    fn apply(
        &self,
        mut document: EditableDocument,
        request: &EditRequest,
        reporter: &mut ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<EditableDocument> {
        let mut observer = |done: u32, total: u32| -> Result<()> {
            cancel.checkpoint()?;
            reporter.report_span(LOADED, TRANSFORMED, done, total, "processing pages");
            Ok(())
        };

        match request {
            EditRequest::Extract { pages } => extract_with(&document, pages, Some(&mut observer)),
            EditRequest::Delete { pages } => delete_with(&document, pages, Some(&mut observer)),
            EditRequest::Rotate { pages, angle } => {
                rotate_with(&mut document, pages, *angle, Some(&mut observer))?;
                Ok(document)
            }
            EditRequest::Organize { operations } => {
                organize_with(&document, operations, Some(&mut observer))
            }
            EditRequest::RemoveImages { scope } => {
                remove_images(&mut document, scope)?;
                drop(observer);
                reporter.report(TRANSFORMED, "images removed");
                Ok(document)
            }
            EditRequest::Protect { settings } => {
                // Compression must precede encryption, so it happens here
                // instead of at save time.
                if self.config.compress_output {
                    document.inner_mut().compress();
                }
                protect(&mut document, settings)?;
                drop(observer);
                reporter.report(TRANSFORMED, "protection applied");
                Ok(document)
            }
        }
    }
}
