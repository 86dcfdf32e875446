//! CLI binary for fit-media.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `FitOptions`, renders Markdown and prints the HTML.

use anyhow::{Context, Result};
use clap::Parser;
use fit_media::{
    renderer_with, render_to_file, Decoding, FitOptions, FitStrategy, RawFitOptions, RenderEnv,
    RenderOptions,
};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render a document, probing images relative to the current directory
  fitmedia README.md -o README.html

  # Images live under site/static, document references /img/...
  fitmedia --img-dir site/static docs/page.md

  # Read Markdown from stdin
  cat post.md | fitmedia --decoding async

  # Fit video players in place instead of wrapping them
  fitmedia --strategy aspect-ratio --fit-elements video,iframe post.md

  # Reuse a JSON option bag (imgDir, imgLazyLoad, fitWrapElements, ...)
  fitmedia --config fit-media.json post.md

CONFIG FILE KEYS:
  imgDir, imgLazyLoad (lazyLoad), imgDecoding (decoding), aspectRatio,
  imgSizeHint (sizeHint), fitWrapElements (fitElements), resizeElements,
  fitStrategy, trustDimensionAttrs
  Flags given on the command line override the file.
"#;

/// Render Markdown to HTML with layout-stable media elements.
#[derive(Parser, Debug)]
#[command(
    name = "fitmedia",
    version,
    about = "Render Markdown to HTML with layout-stable img/iframe/video elements",
    long_about = "Render Markdown to HTML, stamping intrinsic sizes, aspect-ratio styles and \
lazy-loading hints on images, and wrapping embedded players in ratio boxes so the page \
does not shift while media loads.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to render; `-` or omitted reads stdin.
    input: Option<PathBuf>,

    /// Write HTML to this file instead of stdout.
    #[arg(short, long, env = "FITMEDIA_OUTPUT")]
    output: Option<PathBuf>,

    /// JSON file with a fit-media option bag.
    #[arg(long, env = "FITMEDIA_CONFIG")]
    config: Option<PathBuf>,

    /// Prefix prepended to image src values before probing.
    #[arg(long, env = "FITMEDIA_IMG_DIR")]
    img_dir: Option<String>,

    /// Do not add loading="lazy" to images.
    #[arg(long, env = "FITMEDIA_NO_LAZY_LOAD")]
    no_lazy_load: bool,

    /// Decoding hint for images.
    #[arg(long, env = "FITMEDIA_DECODING", value_enum)]
    decoding: Option<DecodingArg>,

    /// Do not inject aspect-ratio declarations.
    #[arg(long, env = "FITMEDIA_NO_ASPECT_RATIO")]
    no_aspect_ratio: bool,

    /// Do not stamp width/height attributes on images.
    #[arg(long, env = "FITMEDIA_NO_SIZE_HINT")]
    no_size_hint: bool,

    /// Elements to fit with --strategy (comma separated).
    #[arg(long, env = "FITMEDIA_FIT_ELEMENTS", value_delimiter = ',')]
    fit_elements: Option<Vec<String>>,

    /// Elements to resize in place (comma separated).
    #[arg(long, env = "FITMEDIA_RESIZE_ELEMENTS", value_delimiter = ',')]
    resize_elements: Option<Vec<String>>,

    /// How fit elements reserve space.
    #[arg(long, env = "FITMEDIA_STRATEGY", value_enum)]
    strategy: Option<StrategyArg>,

    /// Always probe image files, even when width/height are present.
    #[arg(long, env = "FITMEDIA_ALWAYS_PROBE")]
    always_probe: bool,

    /// Close void elements XHTML-style (`<img />`).
    #[arg(long, env = "FITMEDIA_XHTML")]
    xhtml: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FITMEDIA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FITMEDIA_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DecodingArg {
    Auto,
    Sync,
    Async,
}

impl From<DecodingArg> for Decoding {
    fn from(v: DecodingArg) -> Self {
        match v {
            DecodingArg::Auto => Decoding::Auto,
            DecodingArg::Sync => Decoding::Sync,
            DecodingArg::Async => Decoding::Async,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Wrap,
    AspectRatio,
}

impl From<StrategyArg> for FitStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Wrap => FitStrategy::Wrap,
            StrategyArg::AspectRatio => FitStrategy::AspectRatio,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let options = build_options(&cli)?;

    // ── Render ───────────────────────────────────────────────────────────
    let input = cli.input.as_ref().filter(|p| p.as_os_str() != "-");

    if let (Some(input), Some(output), false) = (input, cli.output.as_ref(), cli.xhtml) {
        render_to_file(input, output, &options).context("Rendering failed")?;
        if !cli.quiet {
            eprintln!("✔  {} → {}", input.display(), output.display());
        }
        return Ok(());
    }

    let markdown = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read Markdown from stdin")?;
            buf
        }
    };

    let renderer = renderer_with(&options).with_options(RenderOptions {
        xhtml_out: cli.xhtml,
    });
    let html = renderer.render_markdown(&markdown, &mut RenderEnv::default());

    match cli.output {
        Some(ref path) => {
            std::fs::write(path, &html)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!("✔  wrote {}", path.display());
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(html.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Merge the config file (if any) with CLI flags into `FitOptions`.
fn build_options(cli: &Cli) -> Result<FitOptions> {
    let mut raw = match cli.config {
        Some(ref path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            RawFitOptions::from_json(&json).context("Invalid config file")?
        }
        None => RawFitOptions::default(),
    };

    if let Some(ref dir) = cli.img_dir {
        raw.img_dir = Some(dir.clone());
    }
    if cli.no_lazy_load {
        raw.img_lazy_load = Some(false);
    }
    if let Some(decoding) = cli.decoding {
        raw.img_decoding = Some(Decoding::from(decoding).to_string());
    }
    if cli.no_aspect_ratio {
        raw.aspect_ratio = Some(false);
    }
    if cli.no_size_hint {
        raw.img_size_hint = Some(false);
    }
    if let Some(ref elements) = cli.fit_elements {
        raw.fit_wrap_elements = Some(elements.clone());
    }
    if let Some(ref elements) = cli.resize_elements {
        raw.resize_elements = Some(elements.clone());
    }
    if let Some(strategy) = cli.strategy {
        raw.fit_strategy = Some(strategy.into());
    }
    if cli.always_probe {
        raw.trust_dimension_attrs = Some(false);
    }

    let options = raw.normalize();

    // Rebuild through the builder so bad element names fail fast.
    FitOptions::builder()
        .img_dir(options.img_dir)
        .lazy_load(options.lazy_load)
        .decoding(options.decoding)
        .aspect_ratio(options.aspect_ratio)
        .size_hint(options.size_hint)
        .resize_elements(options.resize_elements)
        .wrap_elements(options.wrap_elements)
        .strategy(options.strategy)
        .trust_dimension_attrs(options.trust_dimension_attrs)
        .build()
        .context("Invalid configuration")
}
