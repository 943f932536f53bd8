use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use radarscene::config::SceneConfig;
use radarscene::mount::mount;
use radarscene::preview::run_preview;
use radarscene::random::RandomSource;
use radarscene::raster::RasterSurface;
use radarscene::scheduler::ManualScheduler;
use radarscene::surface::RecordingSurface;
use radarscene::viewport::{SharedViewport, ViewportSize};
use std::cell::RefCell;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::Level;

/// Render the animated radar backdrop
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Scene configuration file (YAML)
    #[arg(short, long, env = "RADARSCENE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Animate the scene in the terminal
    Preview {
        /// Frames per second
        #[arg(long, default_value_t = 60)]
        fps: u32,

        /// Seed for the particle field
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Render a frame to a PNG file
    Snapshot {
        /// Where to write the image
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        frame: FrameArgs,
    },

    /// Print the drawing operations of a frame as JSON lines
    Trace {
        #[command(flatten)]
        frame: FrameArgs,
    },
}

#[derive(Args)]
struct FrameArgs {
    /// Width in display pixels
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Height in display pixels
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Device pixel ratio
    #[arg(long, default_value_t = 1.0)]
    ratio: f64,

    /// Number of frames to draw; the last one is the output
    #[arg(long, default_value_t = 1)]
    frames: u64,

    /// Seed for the particle field
    #[arg(long)]
    seed: Option<u64>,
}

impl FrameArgs {
    fn viewport(&self) -> Result<ViewportSize> {
        ViewportSize::new(self.width, self.height, self.ratio).context("invalid frame size")
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(io::stderr).init();
}

fn load_config(path: Option<&Path>) -> Result<SceneConfig> {
    if let Some(path) = path {
        return SceneConfig::load(path).with_context(|| format!("loading config from {}", path.display()));
    }
    match SceneConfig::default_path() {
        Some(path) if path.exists() => {
            SceneConfig::load(&path).with_context(|| format!("loading config from {}", path.display()))
        }
        _ => Ok(SceneConfig::default()),
    }
}

fn make_rng(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(fastrand::Rng::with_seed(seed)),
        None => Box::new(fastrand::Rng::new()),
    }
}

/// Mount onto `surface` and tick until `frames` frames have been drawn. `before_tick` runs ahead of
/// every tick.
fn render_frames<S, B>(surface: Rc<RefCell<S>>, config: SceneConfig, args: &FrameArgs, mut before_tick: B) -> Result<()>
where
    S: radarscene::surface::DrawingContext + 'static,
    B: FnMut(&RefCell<S>),
{
    let scheduler = ManualScheduler::new();
    let viewport = SharedViewport::new(args.viewport()?);
    let mut scene = mount(Some(surface.clone()), scheduler.clone(), viewport, make_rng(args.seed), config)
        .context("scene could not be mounted")?;
    while scene.frame() < args.frames {
        before_tick(surface.as_ref());
        scheduler.tick();
    }
    scene.unmount();
    Ok(())
}

fn snapshot(config: SceneConfig, output: &Path, args: &FrameArgs) -> Result<()> {
    let backdrop = config.backdrop();
    let surface = Rc::new(RefCell::new(RasterSurface::new(0, 0)));
    render_frames(surface.clone(), config, args, |_| {})?;
    surface.borrow().save_png(output, &backdrop)?;
    tracing::info!(path = %output.display(), "snapshot written");
    Ok(())
}

fn trace(config: SceneConfig, args: &FrameArgs) -> Result<()> {
    let surface = Rc::new(RefCell::new(RecordingSurface::new()));
    render_frames(surface.clone(), config, args, |surface| {
        surface.borrow_mut().take_operations();
    })?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for operation in surface.borrow().operations() {
        serde_json::to_writer(&mut out, operation)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Preview { fps, seed } => run_preview(config, fps, make_rng(seed)).context("terminal preview failed"),
        Command::Snapshot { output, frame } => snapshot(config, &output, &frame),
        Command::Trace { frame } => trace(config, &frame),
    }
}
