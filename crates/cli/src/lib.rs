use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use doc_model::{PageMode, ScrollDirection, StatusBarStyle, UniformDocument, ViewerSettings};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use storage::Storage;
use viewer_core::{
    Geometry, LayoutParams, RecordingChrome, RecordingDelegate, Spread, TapAction, ViewerController,
    ViewerEvent, ViewerSnapshot,
};

#[derive(Debug, Parser)]
#[command(name = "folio-cli")]
#[command(about = "Folio viewer core CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the spread layout of a document as JSON.
    Layout {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Replay a navigation script and print the resulting state as JSON.
    Navigate {
        #[command(flatten)]
        view: ViewArgs,
        /// Comma separated steps: next, prev, goto:N, scroll:OFFSET, tap:X:Y,
        /// rotate:WxH, hud:show|hide|toggle, reload, thumbnails, document.
        #[arg(long, value_delimiter = ',', required = true)]
        steps: Vec<String>,
    },
    /// Print the effective viewer settings.
    Settings {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Single,
    Double,
    Automatic,
}

impl From<ModeArg> for PageMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => PageMode::Single,
            ModeArg::Double => PageMode::Double,
            ModeArg::Automatic => PageMode::Automatic,
        }
    }
}

#[derive(Debug, Args)]
struct ViewArgs {
    /// Number of pages in the synthetic document.
    #[arg(long)]
    pages: u32,
    /// Page width divided by page height (US Letter by default).
    #[arg(long)]
    aspect: Option<f32>,
    #[arg(long, default_value_t = 768.0)]
    width: f32,
    #[arg(long, default_value_t = 1024.0)]
    height: f32,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Pair the first page instead of showing it alone.
    #[arg(long)]
    first_page_double: bool,
    #[arg(long)]
    vertical: bool,
    #[arg(long)]
    padding: Option<f32>,
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl ViewArgs {
    fn settings(&self) -> Result<ViewerSettings> {
        let mut settings = effective_settings(self.config.as_deref())?;

        if let Some(mode) = self.mode {
            settings.page_mode = mode.into();
        }
        if self.first_page_double {
            settings.double_page_mode_on_first_page = true;
        }
        if self.vertical {
            settings.page_scrolling = ScrollDirection::Vertical;
        }
        if let Some(padding) = self.padding {
            if !padding.is_finite() || padding < 0.0 {
                bail!("--padding must be a non-negative number, got {padding}");
            }
            settings.page_padding = padding;
        }

        Ok(settings)
    }

    fn document(&self) -> Result<UniformDocument> {
        match self.aspect {
            Some(aspect) => UniformDocument::new(self.pages, aspect).context("invalid --aspect"),
            None => Ok(UniformDocument::letter(self.pages)),
        }
    }

    fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }
}

#[derive(Debug, Serialize)]
struct LayoutOutput<'a> {
    page_count: u32,
    dual_page_mode: bool,
    content_extent: f32,
    spreads: &'a [Spread],
}

#[derive(Debug, Serialize)]
struct StepOutput {
    step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tap: Option<TapAction>,
    page: u32,
    real_page: u32,
    current_spread: usize,
    scroll_offset: f32,
}

#[derive(Debug, Serialize)]
struct NavigateOutput {
    steps: Vec<StepOutput>,
    #[serde(rename = "final")]
    final_state: ViewerSnapshot,
    events: Vec<ViewerEvent>,
    status_bar_style: StatusBarStyle,
    status_bar_hidden: bool,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Layout { view } => run_layout(&view),
        Commands::Navigate { view, steps } => run_navigate(&view, &steps),
        Commands::Settings { config } => run_settings(config.as_deref()),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_layout(view: &ViewArgs) -> Result<()> {
    let settings = view.settings()?;
    let document = view.document()?;
    let params = LayoutParams::from_settings(&settings, view.geometry());

    let spreads = viewer_core::compute_spreads_for(&document, &params).context("failed to compute layout")?;
    let content_extent =
        spreads.last().map(|spread| spread.frame.end(params.scroll_direction)).unwrap_or_default();

    let payload = LayoutOutput {
        page_count: view.pages,
        dual_page_mode: params.is_double(),
        content_extent,
        spreads: &spreads,
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn run_navigate(view: &ViewArgs, steps: &[String]) -> Result<()> {
    let settings = view.settings()?;
    let document = view.document()?;
    let chrome = RecordingChrome::new(StatusBarStyle::Default, false);
    let delegate = RecordingDelegate::new();

    let mut viewer = ViewerController::with_document(document, settings, view.geometry());
    viewer.set_chrome(chrome.clone());
    viewer.set_delegate(delegate.clone());

    let mut outputs = Vec::with_capacity(steps.len());
    for step in steps {
        let step = step.trim();
        let tap = apply_step(&mut viewer, step).with_context(|| format!("invalid step `{step}`"))?;
        tracing::debug!(step, page = viewer.page(), offset = viewer.scroll_offset(), "replayed step");
        outputs.push(StepOutput {
            step: step.to_owned(),
            tap,
            page: viewer.page(),
            real_page: viewer.real_page(),
            current_spread: viewer.current_spread(),
            scroll_offset: viewer.scroll_offset(),
        });
    }

    let payload = NavigateOutput {
        steps: outputs,
        final_state: viewer.snapshot(),
        events: delegate.events(),
        status_bar_style: chrome.style(),
        status_bar_hidden: chrome.hidden(),
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// Applies one scripted step. Animated navigation is completed immediately.
fn apply_step(viewer: &mut ViewerController, step: &str) -> Result<Option<TapAction>> {
    let mut parts = step.split(':');
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match (command, args.as_slice()) {
        ("next", []) => {
            viewer.scroll_to_next_page(true);
        }
        ("prev", []) => {
            viewer.scroll_to_previous_page(true);
        }
        ("goto", [page]) => {
            let page = page.parse::<u32>().context("page must be a non-negative integer")?;
            viewer.scroll_to_page(page, true);
        }
        ("scroll", [offset]) => {
            let offset = offset.parse::<f32>().context("offset must be a number")?;
            viewer.did_scroll(offset);
        }
        ("tap", [x, y]) => {
            let x = x.parse::<f32>().context("tap x must be a number")?;
            let y = y.parse::<f32>().context("tap y must be a number")?;
            let action = viewer.handle_tap(x, y);
            finish_animation(viewer);
            return Ok(Some(action));
        }
        ("rotate", [size]) => {
            let (width, height) = size.split_once('x').context("rotate expects WIDTHxHEIGHT")?;
            let width = width.parse::<f32>().context("width must be a number")?;
            let height = height.parse::<f32>().context("height must be a number")?;
            viewer.apply_geometry_change(Geometry::new(width, height));
        }
        ("hud", ["show"]) => {
            viewer.show_hud(false);
        }
        ("hud", ["hide"]) => {
            viewer.hide_hud(false);
        }
        ("hud", ["toggle"]) => {
            viewer.toggle_hud(false);
        }
        ("reload", []) => viewer.reload_data(),
        ("thumbnails", []) => viewer.set_view_mode(doc_model::ViewMode::Thumbnails),
        ("document", []) => viewer.set_view_mode(doc_model::ViewMode::Document),
        _ => bail!("unknown step"),
    }

    finish_animation(viewer);
    Ok(None)
}

fn finish_animation(viewer: &mut ViewerController) {
    if let Some(animation) = viewer.pending_animation() {
        viewer.did_scroll(animation.target_offset);
        viewer.scroll_animation_did_finish(animation.id);
    }
}

fn run_settings(config: Option<&Path>) -> Result<()> {
    let settings = effective_settings(config)?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

/// Settings from `config` (or the saved settings), then `FOLIO_*` overrides.
fn effective_settings(config: Option<&Path>) -> Result<ViewerSettings> {
    let mut settings = match config {
        Some(path) => storage::load_settings_file(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?,
        None => match Storage::from_default_project() {
            Ok(store) => store.load_settings().context("failed to read saved settings")?,
            Err(error) => {
                tracing::warn!(%error, "no settings directory, using defaults");
                ViewerSettings::default()
            }
        },
    };

    storage::apply_env_overrides(&mut settings).context("invalid environment override")?;
    Ok(settings)
}
