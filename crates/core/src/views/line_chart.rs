use borough_lens_protocol::{Paint, Point, RenderCommand, TextAlign, ThemeToken, Viewport};

use crate::model::Timeline;
use crate::viz::surface::{Emphasis, LinePath, LineSurface};

pub(crate) const MARGIN_LEFT: f64 = 56.0;
pub(crate) const MARGIN_RIGHT: f64 = 16.0;
pub(crate) const MARGIN_TOP: f64 = 16.0;
pub(crate) const MARGIN_BOTTOM: f64 = 24.0;
const FONT_SIZE: f64 = 10.0;

/// Plot area of a chart inside `viewport`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub fn new(viewport: &Viewport) -> Self {
        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: (viewport.width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0),
            height: (viewport.height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0),
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// X of timeline index `i` out of `len` steps.
    pub fn x_at(&self, i: usize, len: usize) -> f64 {
        if len <= 1 {
            self.left
        } else {
            self.left + self.width * i as f64 / (len - 1) as f64
        }
    }

    pub fn axes(&self) -> [RenderCommand; 2] {
        [
            RenderCommand::DrawLine {
                from: Point::new(self.left, self.top),
                to: Point::new(self.left, self.bottom()),
                color: Paint::Token(ThemeToken::AxisLine),
                width: 1.0,
            },
            RenderCommand::DrawLine {
                from: Point::new(self.left, self.bottom()),
                to: Point::new(self.left + self.width, self.bottom()),
                color: Paint::Token(ThemeToken::AxisLine),
                width: 1.0,
            },
        ]
    }

    /// Vertical marker at the current timeline index.
    pub fn cursor(&self, index: usize, len: usize) -> RenderCommand {
        let x = self.x_at(index, len);
        RenderCommand::DrawLine {
            from: Point::new(x, self.top),
            to: Point::new(x, self.bottom()),
            color: Paint::Token(ThemeToken::TextMuted),
            width: 1.0,
        }
    }

    /// First and last date labels under the x axis.
    pub fn date_labels(&self, timeline: &Timeline) -> Vec<RenderCommand> {
        let y = self.bottom() + FONT_SIZE + 4.0;
        let mut labels = Vec::with_capacity(2);
        if let Some(first) = timeline.labels().first() {
            labels.push(RenderCommand::DrawText {
                position: Point::new(self.left, y),
                text: first.clone(),
                color: ThemeToken::TextMuted,
                font_size: FONT_SIZE,
                align: TextAlign::Left,
            });
        }
        if timeline.len() > 1
            && let Some(last) = timeline.labels().last()
        {
            labels.push(RenderCommand::DrawText {
                position: Point::new(self.left + self.width, y),
                text: last.clone(),
                color: ThemeToken::TextMuted,
                font_size: FONT_SIZE,
                align: TextAlign::Right,
            });
        }
        labels
    }
}

/// Render every borough's price history. The emphasized path is drawn
/// last so it sits on top.
pub fn render_line_chart(line: &LineSurface, timeline: &Timeline, viewport: &Viewport) -> Vec<RenderCommand> {
    if line.len == 0 {
        return Vec::new();
    }
    let frame = Frame::new(viewport);
    let (lo, hi) = line.value_extent;
    let y_of = |v: f64| frame.bottom() - (v - lo) / (hi - lo) * frame.height;

    let mut commands = Vec::with_capacity(line.paths.len() * 2 + 10);
    commands.push(RenderCommand::BeginGroup {
        id: "line-chart".into(),
        label: Some("Average price over time".into()),
    });
    commands.extend(frame.axes());

    for (value, align_y) in [(hi, frame.top), (lo, frame.bottom())] {
        commands.push(RenderCommand::DrawText {
            position: Point::new(frame.left - 4.0, align_y + FONT_SIZE / 2.0),
            text: format!("£{}k", (value / 1_000.0).round()),
            color: ThemeToken::TextMuted,
            font_size: FONT_SIZE,
            align: TextAlign::Right,
        });
    }

    let ordered = line
        .paths
        .iter()
        .filter(|p| p.emphasis != Emphasis::Emphasized)
        .chain(line.paths.iter().filter(|p| p.emphasis == Emphasis::Emphasized));
    for path in ordered {
        push_segments(&mut commands, path, line.len, &frame, &y_of);
    }

    commands.push(frame.cursor(line.cursor, line.len));
    commands.extend(frame.date_labels(timeline));
    commands.push(RenderCommand::EndGroup);
    commands
}

/// Gaps in the series split the path.
fn push_segments(
    commands: &mut Vec<RenderCommand>,
    path: &LinePath,
    len: usize,
    frame: &Frame,
    y_of: &dyn Fn(f64) -> f64,
) {
    let mut points: Vec<Point> = Vec::new();
    let mut flush = |points: &mut Vec<Point>| {
        if points.len() >= 2 {
            commands.push(RenderCommand::DrawPath {
                points: std::mem::take(points),
                closed: false,
                fill: None,
                stroke: Some(Paint::Token(ThemeToken::LineSeries)),
                stroke_width: path.stroke_width(),
                opacity: path.opacity(),
                key: Some(path.borough.clone()),
            });
        }
        points.clear();
    };
    for (i, value) in path.values.iter().enumerate() {
        match value {
            Some(v) if v.is_finite() => points.push(Point::new(frame.x_at(i, len), y_of(*v))),
            _ => flush(&mut points),
        }
    }
    flush(&mut points);
}
