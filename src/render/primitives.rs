use crate::error::{ChartError, ChartResult};

fn ensure(condition: bool, message: &str) -> ChartResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ChartError::InvalidData(message.to_owned()))
    }
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|value| value.is_finite())
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// RGBA color, channels in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    #[must_use]
    pub const fn with_alpha(self, alpha: f64) -> Self {
        Self::rgba(self.red, self.green, self.blue, alpha)
    }

    pub fn validate(self) -> ChartResult<()> {
        let channels = [self.red, self.green, self.blue, self.alpha];
        ensure(
            channels.iter().all(|value| (0.0..=1.0).contains(value)),
            "color channels must be in [0, 1]",
        )
    }
}

/// Straight segment, used for axes and ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePrimitive {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub stroke_width: f64,
    pub color: Color,
}

impl LinePrimitive {
    #[must_use]
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64, stroke_width: f64, color: Color) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            stroke_width,
            color,
        }
    }

    pub fn validate(self) -> ChartResult<()> {
        ensure(
            all_finite(&[self.x1, self.y1, self.x2, self.y2]),
            "line endpoints must be finite",
        )?;
        ensure(positive(self.stroke_width), "line stroke width must be > 0")?;
        self.color.validate()
    }
}

/// Connected run of samples; one per unbroken stretch of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylinePrimitive {
    pub points: Vec<(f64, f64)>,
    pub stroke_width: f64,
    pub color: Color,
}

impl PolylinePrimitive {
    #[must_use]
    pub fn new(points: Vec<(f64, f64)>, stroke_width: f64, color: Color) -> Self {
        Self {
            points,
            stroke_width,
            color,
        }
    }

    pub fn validate(&self) -> ChartResult<()> {
        ensure(self.points.len() >= 2, "polyline needs at least two points")?;
        ensure(
            self.points.iter().all(|&(x, y)| all_finite(&[x, y])),
            "polyline points must be finite",
        )?;
        ensure(
            positive(self.stroke_width),
            "polyline stroke width must be > 0",
        )?;
        self.color.validate()
    }
}

/// Axis-aligned box: plot background, gap shading, tooltip body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectPrimitive {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill_color: Color,
    /// Zero draws no border.
    pub border_width: f64,
    pub border_color: Color,
    pub corner_radius: f64,
}

impl RectPrimitive {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64, fill_color: Color) -> Self {
        Self {
            x,
            y,
            width,
            height,
            fill_color,
            border_width: 0.0,
            border_color: fill_color,
            corner_radius: 0.0,
        }
    }

    #[must_use]
    pub const fn with_border(mut self, border_width: f64, border_color: Color) -> Self {
        self.border_width = border_width;
        self.border_color = border_color;
        self
    }

    #[must_use]
    pub fn contains(self, x: f64, y: f64) -> bool {
        (self.x..=self.x + self.width).contains(&x) && (self.y..=self.y + self.height).contains(&y)
    }

    pub fn validate(self) -> ChartResult<()> {
        ensure(all_finite(&[self.x, self.y]), "rect origin must be finite")?;
        ensure(
            non_negative(self.width) && non_negative(self.height),
            "rect size must be >= 0",
        )?;
        ensure(
            non_negative(self.border_width) && non_negative(self.corner_radius),
            "rect border width and corner radius must be >= 0",
        )?;
        self.fill_color.validate()?;
        self.border_color.validate()
    }
}

/// Filled disc marking the hovered sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CirclePrimitive {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub fill_color: Color,
}

impl CirclePrimitive {
    #[must_use]
    pub const fn new(cx: f64, cy: f64, radius: f64, fill_color: Color) -> Self {
        Self {
            cx,
            cy,
            radius,
            fill_color,
        }
    }

    pub fn validate(self) -> ChartResult<()> {
        ensure(all_finite(&[self.cx, self.cy]), "circle center must be finite")?;
        ensure(positive(self.radius), "circle radius must be > 0")?;
        self.fill_color.validate()
    }
}

/// Where `TextPrimitive::x` sits on the rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextHAlign {
    Left,
    Center,
    Right,
}

/// Single-line label; `y` is the top of the text box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPrimitive {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size_px: f64,
    pub color: Color,
    pub h_align: TextHAlign,
}

impl TextPrimitive {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        x: f64,
        y: f64,
        font_size_px: f64,
        color: Color,
        h_align: TextHAlign,
    ) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_size_px,
            color,
            h_align,
        }
    }

    pub fn validate(&self) -> ChartResult<()> {
        ensure(!self.text.is_empty(), "text must not be empty")?;
        ensure(all_finite(&[self.x, self.y]), "text position must be finite")?;
        ensure(positive(self.font_size_px), "font size must be > 0")?;
        self.color.validate()
    }
}
