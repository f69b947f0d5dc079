//! Demo terminal-state producer.
//!
//! Stands in for a real terminal: a tokio task rebuilds a showcase grid on a
//! timer (and immediately after a resize) and publishes it through the
//! [`SnapshotHandoff`]. The render loop never waits for it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use termgrid_config::{Config, color_u8_to_f32};
use termgrid_render::{CellAttributes, GridSnapshot, LogicalCell, SnapshotHandoff};
use tokio::runtime::Runtime;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// How often the demo content changes.
pub const DEMO_TICK: Duration = Duration::from_millis(250);

const PROMPT: &str = "$ ";
const TYPED: &str = "echo \"hello from termgrid\"";

/// The classic 16-color palette, used for the color ramp rows.
const ANSI_COLORS: [[u8; 3]; 16] = [
    [0, 0, 0],
    [205, 49, 49],
    [13, 188, 121],
    [229, 229, 16],
    [36, 114, 200],
    [188, 63, 188],
    [17, 168, 205],
    [229, 229, 229],
    [102, 102, 102],
    [241, 76, 76],
    [35, 209, 139],
    [245, 245, 67],
    [59, 142, 234],
    [214, 112, 214],
    [41, 184, 219],
    [255, 255, 255],
];

/// Default colors of the demo grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoPalette {
    pub foreground: [f32; 4],
    pub background: [f32; 4],
}

impl DemoPalette {
    pub fn from_config(config: &Config) -> Self {
        Self {
            foreground: color_u8_to_f32(config.foreground),
            background: color_u8_to_f32(config.background),
        }
    }
}

/// One generated demo screen.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoScreen {
    pub grid: GridSnapshot,
    /// Cursor cell (col, row)
    pub cursor: (u32, u32),
}

/// Build the showcase screen for a `cols x rows` grid at animation step `tick`.
///
/// Content that does not fit is clipped.
pub fn demo_screen(cols: usize, rows: usize, tick: u64, palette: &DemoPalette) -> DemoScreen {
    let plain = LogicalCell::new(' ', palette.foreground, palette.background);
    let mut grid = GridSnapshot::filled(cols, rows, plain);

    let header_attrs = CellAttributes {
        bold: true,
        inverse: true,
        ..CellAttributes::default()
    };
    let header = plain.with_attrs(header_attrs);
    grid.write_str(0, 0, &" ".repeat(cols), header);
    grid.write_str(
        1,
        0,
        &format!("termgrid {}  {}x{}  tick {}", crate::VERSION, cols, rows, tick),
        header,
    );

    grid.write_str(1, 2, "Attributes:", plain);
    let samples: [(&str, CellAttributes); 8] = [
        ("regular", CellAttributes::default()),
        ("bold", attrs(|a| a.bold = true)),
        ("italic", attrs(|a| a.italic = true)),
        ("underline", attrs(|a| a.underline = true)),
        ("strikethrough", attrs(|a| a.strikethrough = true)),
        ("inverse", attrs(|a| a.inverse = true)),
        ("blink", attrs(|a| a.blink = true)),
        ("dim", attrs(|a| a.dim = true)),
    ];
    for (i, (label, style)) in samples.iter().enumerate() {
        grid.write_str(3, 3 + i, label, plain.with_attrs(*style));
    }

    grid.write_str(1, 12, "Colors:", plain);
    for (i, rgb) in ANSI_COLORS.iter().enumerate() {
        let swatch = LogicalCell::new(' ', palette.foreground, color_u8_to_f32(*rgb));
        let (col, row) = (3 + (i % 8) * 3, 13 + i / 8);
        grid.write_str(col, row, "   ", swatch);
    }
    for (i, rgb) in ANSI_COLORS.iter().enumerate().skip(1).take(7) {
        let text = LogicalCell::new(' ', color_u8_to_f32(*rgb), palette.background);
        grid.write_str(28 + i * 2, 13, "\u{25A0}", text);
    }

    grid.write_str(1, 16, "Glyphs: \u{250C}\u{2500}\u{2510} \u{2502} \u{2514}\u{2500}\u{2518} \u{2591}\u{2592}\u{2593}\u{2588} \u{03BB} \u{2192} \u{2713} \u{2603}", plain);

    // Marquee moving one cell per tick
    let marquee = " GPU cell grid * glyph atlas * instanced quads *";
    let width = cols.saturating_sub(2);
    if width > 0 {
        let chars: Vec<char> = marquee.chars().collect();
        let start = (tick as usize) % chars.len();
        let line: String = chars.iter().cycle().skip(start).take(width).collect();
        grid.write_str(1, 18, &line, plain);
    }

    // Prompt that types itself out, then starts over
    let prompt_row = rows.saturating_sub(1).min(20);
    let typed_len = (tick as usize) % (TYPED.len() + 8);
    let typed: String = TYPED.chars().take(typed_len).collect();
    grid.write_str(0, prompt_row, PROMPT, plain.with_attrs(attrs(|a| a.bold = true)));
    grid.write_str(PROMPT.len(), prompt_row, &typed, plain);

    let cursor_col = (PROMPT.len() + typed.chars().count()).min(cols.saturating_sub(1));
    DemoScreen {
        grid,
        cursor: (cursor_col as u32, prompt_row as u32),
    }
}

fn attrs(set: impl FnOnce(&mut CellAttributes)) -> CellAttributes {
    let mut attrs = CellAttributes::default();
    set(&mut attrs);
    attrs
}

struct DemoShared {
    size: Mutex<(usize, usize)>,
    cursor: Mutex<(u32, u32)>,
    resized: Notify,
}

/// Handle to the running demo producer task. Dropping it stops the task.
pub struct DemoProducer {
    shared: Arc<DemoShared>,
    task: JoinHandle<()>,
}

impl DemoProducer {
    /// Start publishing `cols x rows` demo screens into `handoff`.
    pub fn spawn(
        runtime: &Runtime,
        handoff: Arc<SnapshotHandoff>,
        palette: DemoPalette,
        cols: usize,
        rows: usize,
    ) -> Self {
        let shared = Arc::new(DemoShared {
            size: Mutex::new((cols, rows)),
            cursor: Mutex::new((0, 0)),
            resized: Notify::new(),
        });

        let task_shared = Arc::clone(&shared);
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(DEMO_TICK);
            let mut tick = 0u64;
            loop {
                tokio::select! {
                    _ = ticker.tick() => tick += 1,
                    _ = task_shared.resized.notified() => {}
                }
                let (cols, rows) = *task_shared.size.lock();
                let screen = demo_screen(cols, rows, tick, &palette);
                *task_shared.cursor.lock() = screen.cursor;
                let generation = handoff.publish(screen.grid);
                log::trace!("Demo: published {}x{} as generation {}", cols, rows, generation);
            }
        });
        log::info!("Demo producer started ({}x{})", cols, rows);

        Self { shared, task }
    }

    /// Change the grid size; a new screen is published right away.
    pub fn resize(&self, cols: usize, rows: usize) {
        let mut size = self.shared.size.lock();
        if *size == (cols, rows) {
            return;
        }
        *size = (cols, rows);
        drop(size);
        log::debug!("Demo: grid resized to {}x{}", cols, rows);
        self.shared.resized.notify_one();
    }

    pub fn size(&self) -> (usize, usize) {
        *self.shared.size.lock()
    }

    /// Cursor cell of the latest published screen.
    pub fn cursor(&self) -> (u32, u32) {
        *self.shared.cursor.lock()
    }
}

impl Drop for DemoProducer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
