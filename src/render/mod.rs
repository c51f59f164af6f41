//! Frame rendering.
//!
//! [`Renderer::render`] turns a [`SessionView`] into a [`DisplayList`] every frame. It owns the
//! drawing surface size, which grows to fit the current grid and is reset when a new job
//! starts. All drawing goes through [`Canvas`].

pub mod canvas;

pub use canvas::{Canvas, DisplayList, DrawCommand, Paint, Rgb, TextAlign};

use crate::models::{DisplaySettings, EMPTY_CELL, GridModel};
use crate::state::SessionView;
use std::time::Instant;

const CLEAR_COLOR: Rgb = Rgb::WHITE;
const BACKGROUND_COLOR: Rgb = Rgb::grey(30);
const STATUS_COLOR: Rgb = Rgb::grey(230);
const STATUS_TEXT_SIZE: f32 = 18.0;
const STATUS_POSITION: (f32, f32) = (30.0, 30.0);
const EMPTY_CELL_COLOR: Rgb = Rgb::grey(30);
const LETTER_CELL_COLOR: Rgb = Rgb(30, 200, 30);
const CELL_STROKE: Rgb = Rgb::WHITE;
const GLYPH_COLOR: Rgb = Rgb::BLACK;
const GLYPH_SIZE: f32 = 32.0;

/// Grid placement on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub cell_size: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            cell_size: 50.0,
            offset_x: 30.0,
            offset_y: 60.0,
        }
    }
}

impl Layout {
    pub fn from_settings(settings: &DisplaySettings) -> Self {
        Self {
            cell_size: settings.cell_size,
            offset_x: settings.offset_x,
            offset_y: settings.offset_y,
        }
    }

    /// Surface size needed to show `grid`, leaving one spare cell of margin on each axis.
    pub fn required_size(&self, grid: &GridModel) -> (f32, f32) {
        (
            self.offset_x + self.cell_size * (grid.width() as f32 + 1.0),
            self.offset_y + self.cell_size * (grid.row_count() as f32 + 1.0),
        )
    }

    /// Centre of the cell at `(column, row)`.
    pub fn cell_center(&self, column: usize, row: usize) -> (f32, f32) {
        let half = self.cell_size / 2.0;
        (
            self.offset_x + column as f32 * self.cell_size + half,
            self.offset_y + row as f32 * self.cell_size + half,
        )
    }
}

/// Size of the scrollable drawing surface.
///
/// Within one job the surface only grows. A new job generation starts again from the
/// viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingSurface {
    width: f32,
    height: f32,
    generation: u64,
}

impl DrawingSurface {
    pub fn new(viewport: (f32, f32)) -> Self {
        Self {
            width: viewport.0,
            height: viewport.1,
            generation: 0,
        }
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Start over at the viewport size for a new job.
    pub fn reset(&mut self, generation: u64, viewport: (f32, f32)) {
        tracing::debug!(
            "Resetting drawing surface for job {} to {}x{}",
            generation,
            viewport.0,
            viewport.1
        );
        self.generation = generation;
        self.width = viewport.0;
        self.height = viewport.1;
    }

    /// Grow each axis to `size` if it is larger. Returns whether anything changed.
    pub fn ensure(&mut self, size: (f32, f32)) -> bool {
        let mut grown = false;
        if size.0 > self.width {
            self.width = size.0;
            grown = true;
        }
        if size.1 > self.height {
            self.height = size.1;
            grown = true;
        }
        grown
    }

    /// Apply the frame's viewport and required size.
    pub fn fit(&mut self, generation: u64, viewport: (f32, f32), required: (f32, f32)) {
        if generation != self.generation {
            self.reset(generation, viewport);
        } else {
            self.ensure(viewport);
        }

        if self.ensure(required) {
            tracing::debug!("Drawing surface grew to {}x{}", self.width, self.height);
        }
    }
}

/// Draws the status line and solution grid.
#[derive(Debug)]
pub struct Renderer {
    layout: Layout,
    surface: DrawingSurface,
}

impl Renderer {
    pub fn new(layout: Layout, viewport: (f32, f32)) -> Self {
        Self {
            layout,
            surface: DrawingSurface::new(viewport),
        }
    }

    /// Produce this frame's display list.
    pub fn render(
        &mut self,
        view: &SessionView<'_>,
        viewport: (f32, f32),
        now: Instant,
    ) -> DisplayList {
        let required = self.layout.required_size(view.grid);
        self.surface.fit(view.generation, viewport, required);

        let (width, height) = self.surface.size();
        let mut canvas = Canvas::new(width, height);

        canvas.clear(CLEAR_COLOR);
        canvas.rect_centered(
            width / 2.0,
            height / 2.0,
            width,
            height,
            Paint::fill(BACKGROUND_COLOR),
        );

        canvas.text(
            view.stats.status(now).to_string(),
            STATUS_POSITION.0,
            STATUS_POSITION.1,
            STATUS_TEXT_SIZE,
            STATUS_COLOR,
            TextAlign::Left,
        );

        self.draw_grid(&mut canvas, view.grid);
        canvas.finish()
    }

    fn draw_grid(&self, canvas: &mut Canvas, grid: &GridModel) {
        let size = self.layout.cell_size;

        for (column, row, c) in grid.cells() {
            let (cx, cy) = self.layout.cell_center(column, row);

            if c == EMPTY_CELL {
                canvas.rect_centered(
                    cx,
                    cy,
                    size,
                    size,
                    Paint::fill(EMPTY_CELL_COLOR).with_stroke(CELL_STROKE),
                );
            } else {
                canvas.rect_centered(
                    cx,
                    cy,
                    size,
                    size,
                    Paint::fill(LETTER_CELL_COLOR).with_stroke(CELL_STROKE),
                );
                canvas.text(
                    c.to_string(),
                    cx,
                    cy,
                    GLYPH_SIZE,
                    GLYPH_COLOR,
                    TextAlign::Center,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStats;

    fn view<'a>(generation: u64, stats: &'a JobStats, grid: &'a GridModel) -> SessionView<'a> {
        SessionView {
            generation,
            stats,
            grid,
        }
    }

    #[test]
    fn test_required_size_uses_widest_row() {
        let layout = Layout::default();
        let grid = GridModel::from_lines(["AB", "CDEF", "G"]);

        assert_eq!(layout.required_size(&grid), (30.0 + 50.0 * 5.0, 60.0 + 50.0 * 4.0));
        assert_eq!(layout.required_size(&GridModel::default()), (80.0, 110.0));
    }

    #[test]
    fn test_surface_grows_but_never_shrinks_within_job() {
        let mut surface = DrawingSurface::new((200.0, 200.0));

        surface.fit(1, (200.0, 200.0), (400.0, 150.0));
        assert_eq!(surface.size(), (400.0, 200.0));

        surface.fit(1, (100.0, 100.0), (80.0, 110.0));
        assert_eq!(surface.size(), (400.0, 200.0));

        surface.fit(1, (500.0, 100.0), (80.0, 110.0));
        assert_eq!(surface.size(), (500.0, 200.0));
    }

    #[test]
    fn test_new_job_resets_surface() {
        let mut surface = DrawingSurface::new((200.0, 200.0));
        surface.fit(1, (200.0, 200.0), (900.0, 900.0));

        surface.fit(2, (300.0, 250.0), (80.0, 110.0));
        assert_eq!(surface.size(), (300.0, 250.0));
    }

    #[test]
    fn test_idle_frame() {
        let stats = JobStats::default();
        let grid = GridModel::default();
        let mut renderer = Renderer::new(Layout::default(), (640.0, 480.0));

        let list = renderer.render(&view(0, &stats, &grid), (640.0, 480.0), Instant::now());

        assert_eq!((list.width, list.height), (640.0, 480.0));
        assert_eq!(list.commands.len(), 3);
        assert_eq!(list.commands[0], DrawCommand::Clear(Rgb::WHITE));
        assert_eq!(
            list.commands[1],
            DrawCommand::Rect {
                x: 0.0,
                y: 0.0,
                width: 640.0,
                height: 480.0,
                paint: Paint::fill(Rgb::grey(30)),
            }
        );
        assert_eq!(
            list.commands[2],
            DrawCommand::Text {
                x: 30.0,
                y: 30.0,
                text: "Enter letters and click 'Solve' to begin".to_string(),
                size: 18.0,
                color: Rgb::grey(230),
                align: TextAlign::Left,
            }
        );
    }

    #[test]
    fn test_grid_cells() {
        let stats = JobStats::default();
        let grid = GridModel::from_lines(["A."]);
        let mut renderer = Renderer::new(Layout::default(), (640.0, 480.0));

        let list = renderer.render(&view(1, &stats, &grid), (640.0, 480.0), Instant::now());
        let cells = &list.commands[3..];

        assert_eq!(cells.len(), 3);
        assert_eq!(
            cells[0],
            DrawCommand::Rect {
                x: 30.0,
                y: 60.0,
                width: 50.0,
                height: 50.0,
                paint: Paint::fill(Rgb(30, 200, 30)).with_stroke(Rgb::WHITE),
            }
        );
        assert_eq!(
            cells[1],
            DrawCommand::Text {
                x: 55.0,
                y: 85.0,
                text: "A".to_string(),
                size: 32.0,
                color: Rgb::BLACK,
                align: TextAlign::Center,
            }
        );
        assert_eq!(
            cells[2],
            DrawCommand::Rect {
                x: 80.0,
                y: 60.0,
                width: 50.0,
                height: 50.0,
                paint: Paint::fill(Rgb::grey(30)).with_stroke(Rgb::WHITE),
            }
        );
    }

    #[test]
    fn test_large_grid_grows_surface() {
        let stats = JobStats::default();
        let grid = GridModel::from_lines(["ABCDEFGHIJKLMNOP"]);
        let mut renderer = Renderer::new(Layout::default(), (300.0, 200.0));

        let list = renderer.render(&view(1, &stats, &grid), (300.0, 200.0), Instant::now());

        assert_eq!((list.width, list.height), (880.0, 200.0));
    }
}
