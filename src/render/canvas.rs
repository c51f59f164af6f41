//! Drawing primitives and the coordinate adapter every primitive goes through.
//!
//! Callers describe shapes the way they think about them: rectangles by their centre, arcs
//! with counter-clockwise angles in a Y-up frame. [`Canvas`] converts each primitive once
//! into screen space (top-left origin, Y down) and records it in a [`DisplayList`].

use std::f32::consts::TAU;
use std::fmt::Write as _;

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub const fn grey(level: u8) -> Self {
        Rgb(level, level, level)
    }
}

/// Fill and stroke for a shape. `None` disables that part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Paint {
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
}

impl Paint {
    pub const fn fill(color: Rgb) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }

    pub const fn with_stroke(self, color: Rgb) -> Self {
        Self {
            fill: self.fill,
            stroke: Some(color),
        }
    }
}

/// Horizontal anchoring of text; text is always centred vertically on its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// One primitive in screen space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole surface
    Clear(Rgb),

    /// Axis-aligned rectangle from its top-left corner
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        paint: Paint,
    },

    Line {
        from: (f32, f32),
        to: (f32, f32),
        stroke: Rgb,
    },

    Circle {
        center: (f32, f32),
        diameter: f32,
        paint: Paint,
    },

    /// Elliptical arc drawn clockwise on screen from `start` to `stop` (radians)
    Arc {
        center: (f32, f32),
        width: f32,
        height: f32,
        start: f32,
        stop: f32,
        paint: Paint,
    },

    Triangle {
        points: [(f32, f32); 3],
        paint: Paint,
    },

    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        color: Rgb,
        align: TextAlign,
    },
}

impl DrawCommand {
    /// SVG path data for the shapes that have no native widget.
    ///
    /// Returns `None` for clears, rectangles and text.
    pub fn svg_path(&self) -> Option<String> {
        let mut path = String::new();
        match self {
            DrawCommand::Line { from, to, .. } => {
                let _ = write!(path, "M {} {} L {} {}", from.0, from.1, to.0, to.1);
            }
            DrawCommand::Circle {
                center, diameter, ..
            } => {
                let r = diameter / 2.0;
                let (cx, cy) = *center;
                let _ = write!(
                    path,
                    "M {} {} A {r} {r} 0 1 1 {} {} A {r} {r} 0 1 1 {} {} Z",
                    cx - r,
                    cy,
                    cx + r,
                    cy,
                    cx - r,
                    cy
                );
            }
            DrawCommand::Arc {
                center,
                width,
                height,
                start,
                stop,
                ..
            } => {
                let (rx, ry) = (width / 2.0, height / 2.0);
                let point = |angle: f32| (center.0 + rx * angle.cos(), center.1 + ry * angle.sin());
                // Sweeps that cross zero arrive with stop < start
                let sweep = stop - start;
                let span = if sweep >= TAU { TAU } else { sweep.rem_euclid(TAU) };

                let (x0, y0) = point(*start);
                let _ = write!(path, "M {} {}", x0, y0);
                // A single SVG arc cannot describe a full turn
                let halves = if span > TAU / 2.0 { 2 } else { 1 };
                for i in 1..=halves {
                    let (x, y) = point(start + span * i as f32 / halves as f32);
                    let _ = write!(path, " A {} {} 0 0 1 {} {}", rx, ry, x, y);
                }
            }
            DrawCommand::Triangle { points, .. } => {
                let [a, b, c] = points;
                let _ = write!(
                    path,
                    "M {} {} L {} {} L {} {} Z",
                    a.0, a.1, b.0, b.1, c.0, c.1
                );
            }
            DrawCommand::Clear(_) | DrawCommand::Rect { .. } | DrawCommand::Text { .. } => {
                return None;
            }
        }
        Some(path)
    }
}

/// A finished frame: surface size plus primitives in paint order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayList {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

/// Recording surface and the only place coordinates are converted.
#[derive(Debug)]
pub struct Canvas {
    width: f32,
    height: f32,
    commands: Vec<DrawCommand>,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn clear(&mut self, color: Rgb) {
        self.commands.push(DrawCommand::Clear(color));
    }

    /// Rectangle given by its centre.
    pub fn rect_centered(&mut self, cx: f32, cy: f32, width: f32, height: f32, paint: Paint) {
        self.commands.push(DrawCommand::Rect {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
            paint,
        });
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, stroke: Rgb) {
        self.commands.push(DrawCommand::Line {
            from: (x1, y1),
            to: (x2, y2),
            stroke,
        });
    }

    pub fn circle(&mut self, cx: f32, cy: f32, diameter: f32, paint: Paint) {
        self.commands.push(DrawCommand::Circle {
            center: (cx, cy),
            diameter,
            paint,
        });
    }

    /// Arc with counter-clockwise angles measured in a Y-up frame.
    ///
    /// Flipping the Y axis turns the sweep `start..stop` into `2π - stop..2π - start`.
    pub fn arc(
        &mut self,
        cx: f32,
        cy: f32,
        width: f32,
        height: f32,
        start: f32,
        stop: f32,
        paint: Paint,
    ) {
        self.commands.push(DrawCommand::Arc {
            center: (cx, cy),
            width,
            height,
            start: TAU - stop,
            stop: TAU - start,
            paint,
        });
    }

    pub fn triangle(&mut self, a: (f32, f32), b: (f32, f32), c: (f32, f32), paint: Paint) {
        self.commands.push(DrawCommand::Triangle {
            points: [a, b, c],
            paint,
        });
    }

    pub fn text(
        &mut self,
        text: impl Into<String>,
        x: f32,
        y: f32,
        size: f32,
        color: Rgb,
        align: TextAlign,
    ) {
        self.commands.push(DrawCommand::Text {
            x,
            y,
            text: text.into(),
            size,
            color,
            align,
        });
    }

    pub fn finish(self) -> DisplayList {
        DisplayList {
            width: self.width,
            height: self.height,
            commands: self.commands,
        }
    }
}
