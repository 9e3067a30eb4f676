use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::io::Write;

use cairo::{Context, Format, ImageSurface, LineJoin};
use pango::FontDescription;

use crate::error::{ChartError, ChartResult};
use crate::render::{
    CirclePrimitive, Color, LinePrimitive, PolylinePrimitive, RectPrimitive, RenderFrame,
    Renderer, TextHAlign, TextPrimitive,
};

const FONT_FAMILY: &str = "Sans";

/// Primitive counts from the last paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CairoRenderStats {
    pub rects_drawn: usize,
    pub polylines_drawn: usize,
    pub lines_drawn: usize,
    pub circles_drawn: usize,
    pub texts_drawn: usize,
}

/// Paints frames into a Cairo context owned by the host (a widget's draw
/// callback, a PDF surface).
pub trait CairoContextRenderer {
    fn render_on_cairo_context(
        &mut self,
        context: &Context,
        frame: &RenderFrame,
    ) -> ChartResult<()>;
}

/// Cairo/Pango backend drawing into an owned ARGB image surface.
#[derive(Debug)]
pub struct CairoRenderer {
    surface: ImageSurface,
    background: Color,
    last_stats: CairoRenderStats,
}

impl CairoRenderer {
    pub fn new(width: i32, height: i32) -> ChartResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(ChartError::InvalidViewport {
                width: width.max(0).unsigned_abs(),
                height: height.max(0).unsigned_abs(),
            });
        }
        let surface = ImageSurface::create(Format::ARgb32, width, height)
            .map_err(|err| backend_error("create image surface", err))?;
        Ok(Self {
            surface,
            background: Color::rgb(1.0, 1.0, 1.0),
            last_stats: CairoRenderStats::default(),
        })
    }

    #[must_use]
    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    #[must_use]
    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) -> ChartResult<()> {
        self.background = color;
        color.validate()
    }

    #[must_use]
    pub fn last_stats(&self) -> CairoRenderStats {
        self.last_stats
    }

    /// Encodes the surface as PNG, e.g. for chart snapshots.
    pub fn write_png<W: Write>(&self, writer: &mut W) -> ChartResult<()> {
        self.surface
            .write_to_png(writer)
            .map_err(|err| ChartError::InvalidData(format!("png export failed: {err}")))
    }

    fn paint(&mut self, context: &Context, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;
        set_source(context, self.background);
        context
            .paint()
            .map_err(|err| backend_error("clear surface", err))?;

        for rect in &frame.rects {
            paint_rect(context, rect)?;
        }
        for polyline in &frame.polylines {
            paint_polyline(context, polyline)?;
        }
        for line in &frame.lines {
            paint_line(context, line)?;
        }
        for circle in &frame.circles {
            paint_circle(context, circle)?;
        }
        for rect in &frame.overlay_rects {
            paint_rect(context, rect)?;
        }
        for text in &frame.texts {
            paint_text(context, text);
        }

        self.last_stats = CairoRenderStats {
            rects_drawn: frame.rects.len() + frame.overlay_rects.len(),
            polylines_drawn: frame.polylines.len(),
            lines_drawn: frame.lines.len(),
            circles_drawn: frame.circles.len(),
            texts_drawn: frame.texts.len(),
        };
        Ok(())
    }
}

impl Renderer for CairoRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        let context =
            Context::new(&self.surface).map_err(|err| backend_error("create context", err))?;
        self.paint(&context, frame)
    }
}

impl CairoContextRenderer for CairoRenderer {
    fn render_on_cairo_context(
        &mut self,
        context: &Context,
        frame: &RenderFrame,
    ) -> ChartResult<()> {
        self.paint(context, frame)
    }
}

fn set_source(context: &Context, color: Color) {
    context.set_source_rgba(color.red, color.green, color.blue, color.alpha);
}

fn paint_rect(context: &Context, rect: &RectPrimitive) -> ChartResult<()> {
    rect_path(context, rect);
    set_source(context, rect.fill_color);
    if rect.border_width <= 0.0 {
        return context.fill().map_err(|err| backend_error("fill rect", err));
    }
    context
        .fill_preserve()
        .map_err(|err| backend_error("fill rect", err))?;
    set_source(context, rect.border_color);
    context.set_line_width(rect.border_width);
    context
        .stroke()
        .map_err(|err| backend_error("stroke rect border", err))
}

fn rect_path(context: &Context, rect: &RectPrimitive) {
    let radius = rect
        .corner_radius
        .min(rect.width / 2.0)
        .min(rect.height / 2.0);
    if radius <= 0.0 {
        context.rectangle(rect.x, rect.y, rect.width, rect.height);
        return;
    }
    let (left, top) = (rect.x, rect.y);
    let (right, bottom) = (rect.x + rect.width, rect.y + rect.height);
    context.new_sub_path();
    context.arc(right - radius, top + radius, radius, -FRAC_PI_2, 0.0);
    context.arc(right - radius, bottom - radius, radius, 0.0, FRAC_PI_2);
    context.arc(left + radius, bottom - radius, radius, FRAC_PI_2, PI);
    context.arc(left + radius, top + radius, radius, PI, PI + FRAC_PI_2);
    context.close_path();
}

fn paint_polyline(context: &Context, polyline: &PolylinePrimitive) -> ChartResult<()> {
    let Some((&(x, y), rest)) = polyline.points.split_first() else {
        return Ok(());
    };
    context.move_to(x, y);
    for &(x, y) in rest {
        context.line_to(x, y);
    }
    set_source(context, polyline.color);
    context.set_line_width(polyline.stroke_width);
    context.set_line_join(LineJoin::Round);
    context
        .stroke()
        .map_err(|err| backend_error("stroke series line", err))
}

fn paint_line(context: &Context, line: &LinePrimitive) -> ChartResult<()> {
    context.move_to(line.x1, line.y1);
    context.line_to(line.x2, line.y2);
    set_source(context, line.color);
    context.set_line_width(line.stroke_width);
    context
        .stroke()
        .map_err(|err| backend_error("stroke line", err))
}

fn paint_circle(context: &Context, circle: &CirclePrimitive) -> ChartResult<()> {
    context.new_sub_path();
    context.arc(circle.cx, circle.cy, circle.radius, 0.0, TAU);
    set_source(context, circle.fill_color);
    context
        .fill()
        .map_err(|err| backend_error("fill point marker", err))
}

fn paint_text(context: &Context, text: &TextPrimitive) {
    let layout = pangocairo::functions::create_layout(context);
    let font = FontDescription::from_string(&format!("{FONT_FAMILY} {}px", text.font_size_px));
    layout.set_font_description(Some(&font));
    layout.set_text(&text.text);

    let width = f64::from(layout.pixel_size().0);
    let x = match text.h_align {
        TextHAlign::Left => text.x,
        TextHAlign::Center => text.x - width / 2.0,
        TextHAlign::Right => text.x - width,
    };
    set_source(context, text.color);
    context.move_to(x, text.y);
    pangocairo::functions::show_layout(context, &layout);
}

fn backend_error(action: &str, err: cairo::Error) -> ChartError {
    ChartError::InvalidData(format!("cairo failed to {action}: {err}"))
}
