//! batchmark stamps one text/annotation template onto a batch of images and packages the
//! composites into a single zip archive.
//!
//! # Pipeline overview
//!
//! 1. **Capture**: `EditorScene -> Template` keeps the editable text objects of a canvas document
//! 2. **Composite**: for each `SourceImage`, decode, paint it as the background of an
//!    `OffscreenScene` of the same size, draw the template on top, rasterize and encode
//! 3. **Package**: push every `CompositeResult` into a `ZipPackager` and finish it into an
//!    `ArchiveBlob`
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Sequential**: one decoded image and one scene are alive at a time.
//! - **All-or-nothing by default**: a failing image aborts the batch and no archive is produced,
//!   unless [`FailurePolicy::SkipAndContinue`] is selected.
//! - **Native size**: composites always have their source's dimensions; template coordinates are
//!   never rescaled.
//!
//! ```no_run
//! use batchmark::{BatchOptions, EditorScene, SourceImage, capture_template, process_batch};
//!
//! # fn main() -> batchmark::BatchResult<()> {
//! let scene = EditorScene::from_path("scene.json".as_ref())?;
//! let template = capture_template(&scene)?;
//! let images = vec![SourceImage::from_path("a.png".as_ref())?];
//! let archive = process_batch(&images, &template, BatchOptions::default(), None)?;
//! archive.write_to_path("processed_images.zip".as_ref())?;
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod batch;
mod config;
mod foundation;
mod render;
mod template;

pub use assets::decode::{DecodedImage, decode_image};
pub use assets::fonts::{FontBook, FontSources, ResolvedFont, TextAlign, TextLayoutEngine};
pub use batch::archive::{
    ArchiveBlob, CompositeResult, CompositeSink, FAILURES_MANIFEST, InMemorySink, ZipPackager,
};
pub use batch::compositor::{
    BatchCompositor, BatchPhase, BatchReport, CancelToken, SkippedImage, process_batch,
};
pub use batch::source::{DEFAULT_NAME_PREFIX, SourceImage};
pub use config::options::{BatchOptions, FailurePolicy, OPTIONS_KEY};
pub use config::store::{JsonFileStore, MemoryStore, SettingsStore};
pub use foundation::color::Rgba8;
pub use foundation::error::{BatchError, BatchResult};
pub use render::encode::{OutputFormat, encode_frame};
pub use render::scene::{OffscreenScene, RasterFrame};
pub use render::text::TextPainter;
pub use template::capture::{EditorScene, capture_template};
pub use template::model::{
    FontStyle, FontWeight, ObjectKind, OriginX, OriginY, Template, TemplateObject,
};
