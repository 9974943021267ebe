use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::{
    assets::decode::decode_image,
    batch::archive::{ArchiveBlob, CompositeResult, CompositeSink, ZipPackager},
    batch::source::SourceImage,
    config::options::{BatchOptions, FailurePolicy},
    foundation::error::{BatchError, BatchResult},
    render::encode::encode_frame,
    render::scene::OffscreenScene,
    render::text::TextPainter,
    template::model::Template,
};

/// Where a run currently is. Indices are zero-based positions in the input list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchPhase {
    /// No run in progress.
    #[default]
    Idle,
    /// Decoding image `i`.
    Loading(usize),
    /// Building the off-screen scene for image `i`.
    Compositing(usize),
    /// Rasterizing and encoding image `i`.
    Exporting(usize),
    /// Every image was handled; the sink holds the full batch.
    Done,
}

/// Cooperative cancellation flag, checked before each image.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// An image left out of the archive under [`FailurePolicy::SkipAndContinue`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedImage {
    /// Original file name.
    pub file: String,
    /// Human-readable failure.
    pub reason: String,
}

/// Summary of a finished run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Source images in the batch.
    pub total: usize,
    /// Composites handed to the sink.
    pub composited: usize,
    /// Images skipped, in input order.
    pub skipped: Vec<SkippedImage>,
}

/// Stamps a template onto source images, one image at a time.
///
/// A single compositor can run many batches; fonts resolved in one run stay cached for the next.
pub struct BatchCompositor {
    options: BatchOptions,
    text: TextPainter,
    phase: BatchPhase,
}

impl BatchCompositor {
    /// Build a compositor, loading fonts from `options.fonts`.
    pub fn new(options: BatchOptions) -> BatchResult<Self> {
        let text = TextPainter::new(&options.fonts);
        Self::with_text_painter(options, text)
    }

    /// Build a compositor around an existing text painter.
    pub fn with_text_painter(options: BatchOptions, text: TextPainter) -> BatchResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            text,
            phase: BatchPhase::Idle,
        })
    }

    /// Active options.
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Current phase.
    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    /// Mutable access to the text painter, e.g. to register embedded fonts.
    pub fn text_painter_mut(&mut self) -> &mut TextPainter {
        &mut self.text
    }

    fn enter(&mut self, phase: BatchPhase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "batch phase");
        self.phase = phase;
    }

    /// Composite one image at its native size and encode it.
    #[tracing::instrument(level = "debug", skip(self, image, template), fields(file = %image.name))]
    pub fn composite_one(
        &mut self,
        index: usize,
        image: &SourceImage,
        template: &Template,
    ) -> BatchResult<CompositeResult> {
        self.enter(BatchPhase::Loading(index));
        let decoded = decode_image(&image.name, &image.bytes)?;
        let (width, height) = (decoded.width, decoded.height);
        let rasterize_err = |e: BatchError| BatchError::rasterize(&image.name, e);

        self.enter(BatchPhase::Compositing(index));
        let mut scene = OffscreenScene::new(width, height).map_err(rasterize_err)?;
        scene.set_background(&decoded).map_err(rasterize_err)?;
        drop(decoded);
        for obj in template.objects() {
            scene.add_object(obj, &mut self.text).map_err(rasterize_err)?;
        }

        self.enter(BatchPhase::Exporting(index));
        let frame = scene.rasterize().map_err(rasterize_err)?;
        let bytes = encode_frame(frame, self.options.output_format).map_err(rasterize_err)?;

        Ok(CompositeResult {
            name: image.output_name(&self.options.name_prefix),
            width,
            height,
            bytes,
        })
    }

    /// Composite every image in order and push the results into `sink`.
    ///
    /// `progress` is called once per image, after it is handled, with `(completed, total)`.
    /// On abort or cancellation the sink is told to discard what it has.
    #[tracing::instrument(skip_all, fields(images = images.len(), objects = template.len()))]
    pub fn run(
        &mut self,
        images: &[SourceImage],
        template: &Template,
        sink: &mut dyn CompositeSink,
        mut progress: impl FnMut(usize, usize),
        cancel: &CancelToken,
    ) -> BatchResult<BatchReport> {
        self.phase = BatchPhase::Idle;
        if template.is_empty() {
            return Err(BatchError::EmptyTemplate);
        }
        template.validate()?;

        let total = images.len();
        sink.begin(total)?;
        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };

        for (i, image) in images.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(completed = i, total, "batch cancelled");
                return Err(self.fail(sink, BatchError::Cancelled { completed: i, total }));
            }

            match self.composite_one(i, image, template) {
                Ok(result) => {
                    if let Err(e) = sink.push(result) {
                        return Err(self.fail(sink, e));
                    }
                    report.composited += 1;
                }
                Err(e @ (BatchError::Decode { .. } | BatchError::Rasterize { .. }))
                    if self.options.failure_policy == FailurePolicy::SkipAndContinue =>
                {
                    tracing::warn!(file = %image.name, error = %e, "skipping image");
                    report.skipped.push(SkippedImage {
                        file: image.name.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(file = %image.name, error = %e, "aborting batch");
                    return Err(self.fail(sink, e));
                }
            }

            progress(i + 1, total);
        }

        self.enter(BatchPhase::Done);
        tracing::info!(
            total,
            composited = report.composited,
            skipped = report.skipped.len(),
            "batch complete"
        );
        Ok(report)
    }

    fn fail(&mut self, sink: &mut dyn CompositeSink, err: BatchError) -> BatchError {
        sink.abort();
        self.enter(BatchPhase::Idle);
        err
    }
}

/// Run a whole batch and return the finished archive.
///
/// Nothing is returned on failure: a bad image, an empty template or a bad option means no
/// archive at all (unless `options` asks to skip failing images).
pub fn process_batch(
    images: &[SourceImage],
    template: &Template,
    options: BatchOptions,
    progress: Option<&mut dyn FnMut(usize, usize)>,
) -> BatchResult<ArchiveBlob> {
    let mut compositor = BatchCompositor::new(options)?;
    let mut packager = ZipPackager::new();

    let report = match progress {
        Some(cb) => compositor.run(images, template, &mut packager, cb, &CancelToken::new())?,
        None => compositor.run(
            images,
            template,
            &mut packager,
            |_, _| {},
            &CancelToken::new(),
        )?,
    };
    packager.finish(&report)
}

#[cfg(test)]
#[path = "../../tests/unit/batch/compositor.rs"]
mod tests;
