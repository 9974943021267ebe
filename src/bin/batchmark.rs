use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use batchmark::{
    BatchCompositor, BatchOptions, CancelToken, EditorScene, FailurePolicy, JsonFileStore,
    OutputFormat, SettingsStore, SourceImage, Template, ZipPackager, capture_template,
};

#[derive(Parser, Debug)]
#[command(name = "batchmark", version)]
struct Cli {
    /// Settings file (JSON object) holding persisted options.
    #[arg(long, global = true, default_value = "batchmark-settings.json")]
    settings: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the editable text objects of a canvas document into a template file.
    Capture(CaptureArgs),
    /// Stamp a template onto images and write a zip archive.
    Run(RunArgs),
    /// Read or write persisted settings.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// Canvas JSON document.
    #[arg(long)]
    scene: PathBuf,

    /// Output template JSON.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Template JSON written by `capture`.
    #[arg(long, conflicts_with = "scene", required_unless_present = "scene")]
    template: Option<PathBuf>,

    /// Canvas JSON document to capture the template from.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Output zip path.
    #[arg(long, default_value = "processed_images.zip")]
    out: PathBuf,

    /// Output image encoding.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// JPEG quality (1-100).
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Leave failing images out instead of aborting the batch.
    #[arg(long, default_value_t = false)]
    skip_failures: bool,

    /// Extra directory to search for fonts (repeatable).
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    /// Do not load the platform's installed fonts.
    #[arg(long, default_value_t = false)]
    no_system_fonts: bool,

    /// Source images, processed in the given order.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the JSON value stored under a key.
    Get {
        /// Settings key.
        key: String,
    },
    /// Store a JSON value under a key.
    Set {
        /// Settings key.
        key: String,
        /// JSON value.
        value: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut store = JsonFileStore::open(&cli.settings)
        .with_context(|| format!("open settings '{}'", cli.settings.display()))?;

    match cli.cmd {
        Command::Capture(args) => cmd_capture(args),
        Command::Run(args) => cmd_run(args, &store),
        Command::Config(cmd) => cmd_config(cmd, &mut store),
    }
}

fn cmd_capture(args: CaptureArgs) -> anyhow::Result<()> {
    let template = load_scene_template(&args.scene)?;
    if template.is_empty() {
        eprintln!("warning: no editable text objects in '{}'", args.scene.display());
    }

    write_with_parent(&args.out, template.to_json_pretty()?.as_bytes())?;
    eprintln!("wrote {} ({} objects)", args.out.display(), template.len());
    Ok(())
}

fn cmd_run(args: RunArgs, store: &dyn SettingsStore) -> anyhow::Result<()> {
    let template = match (&args.template, &args.scene) {
        (Some(path), _) => Template::from_path(path)?,
        (None, Some(path)) => load_scene_template(path)?,
        (None, None) => anyhow::bail!("either --template or --scene is required"),
    };

    let mut options = BatchOptions::load(store)?;
    options.apply_env_overrides()?;
    apply_run_args(&mut options, &args);
    options.validate()?;

    let images = args
        .images
        .iter()
        .map(|p| SourceImage::from_path(p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut compositor = BatchCompositor::new(options)?;
    let mut packager = ZipPackager::new();
    let report = compositor.run(
        &images,
        &template,
        &mut packager,
        |done, total| eprintln!("[{done}/{total}]"),
        &CancelToken::new(),
    )?;
    let archive = packager.finish(&report)?;
    archive.write_to_path(&args.out)?;

    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.file, skipped.reason);
    }
    eprintln!(
        "wrote {} ({} of {} images)",
        args.out.display(),
        report.composited,
        report.total
    );
    Ok(())
}

fn apply_run_args(options: &mut BatchOptions, args: &RunArgs) {
    match args.format {
        Some(FormatArg::Png) => options.output_format = OutputFormat::Png,
        Some(FormatArg::Jpeg) => {
            if !matches!(options.output_format, OutputFormat::Jpeg { .. }) {
                options.output_format = OutputFormat::Jpeg {
                    quality: OutputFormat::DEFAULT_JPEG_QUALITY,
                };
            }
        }
        None => {}
    }
    if let (Some(q), OutputFormat::Jpeg { quality }) =
        (args.jpeg_quality, &mut options.output_format)
    {
        *quality = q;
    }

    if args.skip_failures {
        options.failure_policy = FailurePolicy::SkipAndContinue;
    }
    if args.no_system_fonts {
        options.fonts.system_fonts = false;
    }
    options.fonts.font_dirs.extend(args.font_dirs.iter().cloned());
}

fn cmd_config(cmd: ConfigCommand, store: &mut dyn SettingsStore) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Get { key } => {
            let value = store.get(&key)?.unwrap_or(serde_json::Value::Null);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        ConfigCommand::Set { key, value } => {
            let value: serde_json::Value = serde_json::from_str(&value)
                .with_context(|| format!("parse JSON value for '{key}'"))?;
            if key == batchmark::OPTIONS_KEY {
                serde_json::from_value::<BatchOptions>(value.clone())
                    .context("value is not valid batch options")?
                    .validate()?;
            }
            store.set(&key, value)?;
        }
    }
    Ok(())
}

fn load_scene_template(path: &Path) -> anyhow::Result<Template> {
    let scene = EditorScene::from_path(path)?;
    Ok(capture_template(&scene)?)
}

fn write_with_parent(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}
