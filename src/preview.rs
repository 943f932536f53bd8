use crate::config::SceneConfig;
use crate::mount::mount;
use crate::random::RandomSource;
use crate::raster::RasterSurface;
use crate::scheduler::PacedScheduler;
use crate::viewport::{SharedViewport, ViewportSize};
use crossterm::cursor::{self, MoveTo};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use image::RgbImage;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

/// Display pixels covered by one terminal cell. Each cell shows two stacked backing pixels.
const CELL_WIDTH: f64 = 8.0;
const CELL_HEIGHT: f64 = 16.0;

/// The viewport a terminal of `columns` x `rows` cells represents.
///
/// The pixel ratio maps every cell to one backing pixel across and two down, which is what a
/// half-block character can show.
pub fn terminal_viewport(columns: u16, rows: u16) -> ViewportSize {
    ViewportSize { width: columns as f64 * CELL_WIDTH, height: rows as f64 * CELL_HEIGHT, pixel_ratio: 1.0 / CELL_WIDTH }
}

/// Top and bottom pixel colors for every cell in terminal row `row`
fn half_block_cells(image: &RgbImage, row: u32) -> impl Iterator<Item = ([u8; 3], [u8; 3])> + '_ {
    let (top, bottom) = (row * 2, row * 2 + 1);
    (0..image.width()).filter(move |_| top < image.height()).map(move |x| {
        let upper = image.get_pixel(x, top).0;
        let lower = if bottom < image.height() { image.get_pixel(x, bottom).0 } else { upper };
        (upper, lower)
    })
}

fn rgb(color: [u8; 3]) -> TermColor {
    TermColor::Rgb { r: color[0], g: color[1], b: color[2] }
}

fn present<W: Write>(out: &mut W, image: &RgbImage) -> io::Result<()> {
    let rows = image.height().div_ceil(2);
    for row in 0..rows {
        queue!(out, MoveTo(0, row as u16))?;
        let mut current: Option<([u8; 3], [u8; 3])> = None;
        for cell in half_block_cells(image, row) {
            if current != Some(cell) {
                queue!(out, SetForegroundColor(rgb(cell.0)), SetBackgroundColor(rgb(cell.1)))?;
                current = Some(cell);
            }
            queue!(out, Print('▀'))?;
        }
    }
    queue!(out, ResetColor)?;
    out.flush()
}

/// Drain pending terminal events. Returns false once the user asked to quit.
fn pump_events(viewport: &SharedViewport) -> io::Result<bool> {
    while event::poll(Duration::ZERO)? {
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(false),
                _ => {}
            },
            Event::Resize(columns, rows) => viewport.resize(terminal_viewport(columns, rows)),
            _ => {}
        }
    }
    Ok(true)
}

/// Run the scene in the terminal until the user quits
pub fn run_preview(config: SceneConfig, fps: u32, rng: Box<dyn RandomSource>) -> io::Result<()> {
    let (columns, rows) = terminal::size()?;
    let mut stdout = io::stdout();

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    let result = animate(&mut stdout, config, fps, rng, terminal_viewport(columns, rows));
    let restored = execute!(stdout, ResetColor, cursor::Show, LeaveAlternateScreen).and(terminal::disable_raw_mode());
    result.and(restored)
}

fn animate<W: Write>(
    out: &mut W,
    config: SceneConfig,
    fps: u32,
    rng: Box<dyn RandomSource>,
    size: ViewportSize,
) -> io::Result<()> {
    let backdrop = config.backdrop();
    let surface = Rc::new(RefCell::new(RasterSurface::new(0, 0)));
    let scheduler = PacedScheduler::with_fps(fps);
    let viewport = SharedViewport::new(size);

    let Some(mut scene) = mount(Some(surface.clone()), scheduler.clone(), viewport.clone(), rng, config) else {
        return Ok(());
    };
    tracing::info!(fps, interval = ?scheduler.interval(), "starting terminal preview");

    let mut outcome = Ok(());
    let mut presented = 0;
    scheduler.run_while(|| {
        match pump_events(&viewport) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                outcome = Err(e);
                return false;
            }
        }
        if scene.frame() != presented {
            presented = scene.frame();
            let frame = surface.borrow().flatten(&backdrop);
            if let Err(e) = present(out, &frame) {
                outcome = Err(e);
                return false;
            }
        }
        true
    });
    scene.unmount();
    outcome
}
