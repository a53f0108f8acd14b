use std::f32::consts::{FRAC_PI_2, PI};

const QUADRANT: f32 = FRAC_PI_2;
const ANGLE_EPSILON: f32 = 1.0e-6;
const SPLIT_TOLERANCE: f32 = 1.0e-4;

pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * PI / 180.0
}

pub fn rad_to_deg(radians: f32) -> f32 {
    radians * 180.0 / PI
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo {
        x: f32,
        y: f32,
    },
    LineTo {
        x: f32,
        y: f32,
    },
    CubicTo {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x: f32,
        y: f32,
    },
    Close,
}

/// An outline built from lines and cubic Bézier segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        let mut path = Path::new();
        path.move_to(x, y);
        path.line_to(x + width, y);
        path.line_to(x + width, y + height);
        path.line_to(x, y + height);
        path.close();
        path
    }

    /// Rectangle with four quarter-circle corners of equal radius.
    ///
    /// The radius is clamped to half the shorter side; a non-positive radius
    /// yields a plain rectangle.
    pub fn rounded_rect(x: f32, y: f32, width: f32, height: f32, radius: f32) -> Self {
        let r = radius.min(width / 2.0).min(height / 2.0);
        if r <= 0.0 {
            return Path::rect(x, y, width, height);
        }
        let right = x + width;
        let bottom = y + height;
        let mut path = Path::new();
        path.move_to(x + r, y);
        path.line_to(right - r, y);
        path.append_arc(right - r, y + r, r, -QUADRANT, 0.0);
        path.line_to(right, bottom - r);
        path.append_arc(right - r, bottom - r, r, 0.0, QUADRANT);
        path.line_to(x + r, bottom);
        path.append_arc(x + r, bottom - r, r, QUADRANT, PI);
        path.line_to(x, y + r);
        path.append_arc(x + r, y + r, r, PI, PI + QUADRANT);
        path.close();
        path
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.segments.push(PathSegment::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.segments.push(PathSegment::LineTo { x, y });
    }

    pub fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.segments.push(PathSegment::CubicTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    pub fn close(&mut self) {
        self.segments.push(PathSegment::Close);
    }

    /// Appends a circular arc as cubic segments of at most 90 degrees each.
    ///
    /// The arc starts wherever the current point is; callers place the pen at
    /// the arc start first.
    pub fn append_arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32) {
        let sweep = end - start;
        let pieces = (sweep.abs() / QUADRANT - SPLIT_TOLERANCE).ceil().max(1.0) as usize;
        let step = sweep / pieces as f32;
        for i in 0..pieces {
            let a0 = start + step * i as f32;
            let arc = arc_to_bezier(cx, cy, radius, a0, a0 + step);
            self.cubic_to(arc.c1.0, arc.c1.1, arc.c2.0, arc.c2.1, arc.p3.0, arc.p3.1);
        }
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Path {
        let segments = self
            .segments
            .iter()
            .map(|segment| match *segment {
                PathSegment::MoveTo { x, y } => PathSegment::MoveTo {
                    x: x + dx,
                    y: y + dy,
                },
                PathSegment::LineTo { x, y } => PathSegment::LineTo {
                    x: x + dx,
                    y: y + dy,
                },
                PathSegment::CubicTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => PathSegment::CubicTo {
                    x1: x1 + dx,
                    y1: y1 + dy,
                    x2: x2 + dx,
                    y2: y2 + dy,
                    x: x + dx,
                    y: y + dy,
                },
                PathSegment::Close => PathSegment::Close,
            })
            .collect();
        Path { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn curve_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, PathSegment::CubicTo { .. }))
            .count()
    }
}

/// One cubic Bézier segment approximating a circular arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcCurve {
    pub p0: (f32, f32),
    pub c1: (f32, f32),
    pub c2: (f32, f32),
    pub p3: (f32, f32),
}

/// Closed-form cubic approximation of an arc of at most 90 degrees.
///
/// The unit arc is built symmetric about the x axis, spanning `-a..a` where
/// `a` is half the sweep, then rotated onto the bisector of `start..end`,
/// scaled by `radius` and moved to the centre.
pub fn arc_to_bezier(cx: f32, cy: f32, radius: f32, start: f32, end: f32) -> ArcCurve {
    let half = (end - start) / 2.0;
    let x0 = libm::cosf(half);
    let y0 = libm::sinf(half);
    let (x1, y1) = if y0.abs() < ANGLE_EPSILON {
        (x0, y0)
    } else {
        let x1 = (4.0 - x0) / 3.0;
        let y1 = (1.0 - x0) * (3.0 - x0) / (3.0 * y0);
        (x1, y1)
    };

    let bisector = start + half;
    let cos_b = libm::cosf(bisector);
    let sin_b = libm::sinf(bisector);
    let place = |ux: f32, uy: f32| -> (f32, f32) {
        let rx = ux * cos_b - uy * sin_b;
        let ry = ux * sin_b + uy * cos_b;
        (cx + rx * radius, cy + ry * radius)
    };

    ArcCurve {
        p0: place(x0, -y0),
        c1: place(x1, -y1),
        c2: place(x1, y1),
        p3: place(x0, y0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Axis-aligned bounds of the rectangle `(0, 0, width, height)` after a
/// rotation about the origin.
///
/// Sine and cosine terms within `AXIS_SNAP` of zero are treated as zero, so
/// quarter turns given as `f32` multiples of pi swap the sides exactly.
pub fn rotated_bounds(width: f32, height: f32, angle: f32) -> Bounds {
    let (width, height) = (width as f64, height as f64);
    let cos = snap_to_axis(libm::cos(angle as f64));
    let sin = snap_to_axis(libm::sin(angle as f64));
    let corners = [(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)];
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (x, y) in corners {
        let rx = x * cos - y * sin;
        let ry = x * sin + y * cos;
        min_x = min_x.min(rx);
        min_y = min_y.min(ry);
        max_x = max_x.max(rx);
        max_y = max_y.max(ry);
    }
    Bounds {
        min_x: min_x as f32,
        min_y: min_y as f32,
        max_x: max_x as f32,
        max_y: max_y as f32,
    }
}

const AXIS_SNAP: f64 = 1e-6;

fn snap_to_axis(value: f64) -> f64 {
    if value.abs() < AXIS_SNAP { 0.0 } else { value }
}

/// Position and orientation of one glyph laid along a circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularPlacement {
    pub x: f32,
    pub y: f32,
    /// Glyph rotation; zero at the top of the circle.
    pub rotation: f32,
}

/// Places glyph advances clockwise along a circle starting at `start_angle`.
///
/// Each glyph is centred on its slice of arc length, so the returned point is
/// the glyph's baseline midpoint.
pub fn circular_placements(
    advances: &[f32],
    center: (f32, f32),
    radius: f32,
    start_angle: f32,
) -> Vec<CircularPlacement> {
    if radius <= 0.0 {
        return Vec::new();
    }
    let mut consumed = 0.0f32;
    let mut out = Vec::with_capacity(advances.len());
    for advance in advances {
        let mid = start_angle + (consumed + advance / 2.0) / radius;
        out.push(CircularPlacement {
            x: center.0 + radius * libm::cosf(mid),
            y: center.1 + radius * libm::sinf(mid),
            rotation: mid + QUADRANT,
        });
        consumed += advance;
    }
    out
}

/// Arc angle consumed by text of `total_advance` on a circle of `radius`.
pub fn arc_span(total_advance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    total_advance / radius
}
