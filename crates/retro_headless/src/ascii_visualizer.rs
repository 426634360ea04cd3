//! ASCII arena visualizer.
//!
//! Renders a [`WorldSnapshot`] one character per cell for quick terminal
//! review of a headless run.

use retro_core::snapshot::{UnitRole, WorldSnapshot};

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Show the legend and counts under the grid.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            use_color: true,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
}

/// What occupies a cell; later layers draw over earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    Particle,
    Projectile,
    Enemy,
    Player,
}

impl Cell {
    fn glyph(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Particle => ',',
            Self::Projectile => '*',
            Self::Enemy => 'E',
            Self::Player => '@',
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Empty | Self::Particle => colors::DIM,
            Self::Projectile => colors::YELLOW,
            Self::Enemy => colors::RED,
            Self::Player => colors::CYAN,
        }
    }
}

/// Map a world position to a grid index, or `None` off-grid.
fn cell_index(position: [f32; 2], width: usize, height: usize) -> Option<(usize, usize)> {
    let [x, y] = position;
    if x < 0.0 || y < 0.0 {
        return None;
    }
    let (cx, cy) = (x as usize, y as usize);
    (cx < width && cy < height).then_some((cx, cy))
}

/// Render a snapshot as ASCII art.
#[must_use]
pub fn render_ascii(snapshot: &WorldSnapshot, config: &AsciiConfig) -> String {
    let width = snapshot.world[0] as usize;
    let height = snapshot.world[1] as usize;
    let mut grid = vec![vec![Cell::Empty; width]; height];

    let mut place = |position: [f32; 2], cell: Cell| {
        if let Some((x, y)) = cell_index(position, width, height) {
            if cell as u8 > grid[y][x] as u8 {
                grid[y][x] = cell;
            }
        }
    };
    for particle in &snapshot.particles {
        place(particle.position, Cell::Particle);
    }
    for projectile in &snapshot.projectiles {
        place(projectile.position, Cell::Projectile);
    }
    for unit in &snapshot.units {
        let cell = match unit.role {
            UnitRole::Player => Cell::Player,
            UnitRole::Enemy => Cell::Enemy,
        };
        place(unit.position, cell);
    }

    let (bold, reset) = if config.use_color {
        (colors::BOLD, colors::RESET)
    } else {
        ("", "")
    };

    let mut output = String::new();
    output.push_str(&format!("{bold}Tick {}{reset}\n", snapshot.tick));
    output.push('+');
    output.push_str(&"-".repeat(width));
    output.push_str("+\n");
    for row in &grid {
        output.push('|');
        for cell in row {
            if config.use_color && *cell != Cell::Empty {
                output.push_str(cell.color());
                output.push(cell.glyph());
                output.push_str(colors::RESET);
            } else {
                output.push(cell.glyph());
            }
        }
        output.push_str("|\n");
    }
    output.push('+');
    output.push_str(&"-".repeat(width));
    output.push_str("+\n");

    if config.show_legend {
        let player = snapshot
            .units
            .iter()
            .find(|u| u.role == UnitRole::Player)
            .map_or_else(|| "down".to_string(), |p| p.health.to_string());
        let enemies = snapshot
            .units
            .iter()
            .filter(|u| u.role == UnitRole::Enemy)
            .count();
        output.push_str("@=player E=enemy *=fireball ,=particle\n");
        output.push_str(&format!(
            "player hp: {player}  enemies: {enemies}  fireballs: {}  particles: {}\n",
            snapshot.projectiles.len(),
            snapshot.particles.len()
        ));
    }

    output
}
