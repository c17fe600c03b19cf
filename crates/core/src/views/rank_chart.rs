use borough_lens_protocol::{Paint, Point, RenderCommand, TextAlign, ThemeToken, Viewport};

use crate::model::Timeline;
use crate::viz::surface::{Emphasis, RankLine, RankSurface};
use crate::views::line_chart::Frame;

/// Render rank histories as lines plus one dot per borough at the cursor.
///
/// Rank 1 is at the top. Dots take their animated position and radius, so
/// entering dots grow and exiting ones shrink between frames.
pub fn render_rank_chart(rank: &RankSurface, timeline: &Timeline, viewport: &Viewport) -> Vec<RenderCommand> {
    if rank.len == 0 || rank.max_rank == 0 {
        return Vec::new();
    }
    let frame = Frame::new(viewport);
    let span = (rank.max_rank.max(2) - 1) as f64;
    let y_of = |r: f64| frame.top + (r - 1.0) / span * frame.height;

    let mut commands = Vec::with_capacity(rank.lines.len() + rank.dots.len() + 10);
    commands.push(RenderCommand::BeginGroup {
        id: "rank-chart".into(),
        label: Some("Borough rank by average price".into()),
    });
    commands.extend(frame.axes());

    let lines = rank
        .lines
        .iter()
        .filter(|l| l.emphasis != Emphasis::Emphasized)
        .chain(rank.lines.iter().filter(|l| l.emphasis == Emphasis::Emphasized));
    for line in lines {
        push_rank_line(&mut commands, line, rank.len, &frame, &y_of);
    }

    commands.push(frame.cursor(rank.cursor, rank.len));

    let x = frame.x_at(rank.cursor, rank.len);
    for dot in &rank.dots {
        let radius = dot.radius();
        if radius <= 0.0 {
            continue;
        }
        commands.push(RenderCommand::DrawCircle {
            center: Point::new(x, y_of(dot.position.value())),
            radius,
            fill: Paint::Token(ThemeToken::RankDot),
            stroke: Some(Paint::Token(ThemeToken::Surface)),
            stroke_width: dot.stroke_width(),
            opacity: dot.opacity(),
            key: Some(dot.borough.clone()),
        });
    }

    if let Some(top) = rank.live_dots().find(|d| d.rank == 1) {
        commands.push(RenderCommand::DrawText {
            position: Point::new(frame.left + frame.width, frame.top - 4.0),
            text: format!("#1 {}", top.borough),
            color: ThemeToken::TextSecondary,
            font_size: 10.0,
            align: TextAlign::Right,
        });
    }
    commands.extend(frame.date_labels(timeline));
    commands.push(RenderCommand::EndGroup);
    commands
}

fn push_rank_line(
    commands: &mut Vec<RenderCommand>,
    line: &RankLine,
    len: usize,
    frame: &Frame,
    y_of: &dyn Fn(f64) -> f64,
) {
    let mut run: Vec<Point> = Vec::new();
    for (i, r) in line.ranks.iter().enumerate() {
        if let Some(r) = r {
            run.push(Point::new(frame.x_at(i, len), y_of(*r as f64)));
            continue;
        }
        if run.len() >= 2 {
            commands.push(rank_path(line, std::mem::take(&mut run)));
        }
        run.clear();
    }
    if run.len() >= 2 {
        commands.push(rank_path(line, run));
    }
}

fn rank_path(line: &RankLine, points: Vec<Point>) -> RenderCommand {
    RenderCommand::DrawPath {
        points,
        closed: false,
        fill: None,
        stroke: Some(Paint::Token(ThemeToken::RankSeries)),
        stroke_width: line.stroke_width(),
        opacity: line.opacity(),
        key: Some(line.borough.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CalendarDate, HousingDataset, RankSnapshot, TimeSeriesRecord};

    fn surface() -> (HousingDataset, RankSurface) {
        let records = [("Camden", 1, 3.0), ("Barnet", 1, 2.0), ("Camden", 2, 1.0), ("Barnet", 2, 2.0)]
            .into_iter()
            .map(|(region, month, price)| TimeSeriesRecord {
                region: region.into(),
                date: CalendarDate::new(2020, month, 1),
                average_price: Some(price),
                change_1m: None,
                change_12m: None,
            })
            .collect();
        let ds = HousingDataset::from_records(records);
        let mut rank = RankSurface::from_dataset(&ds);
        rank.join(&RankSnapshot::from_slice(ds.slice(0).unwrap()), 0);
        rank.advance(0);
        (ds, rank)
    }

    #[test]
    fn dots_sit_on_their_rank() {
        let (ds, rank) = surface();
        // Plot area 400 x 100 from (56, 16).
        let commands = render_rank_chart(&rank, ds.timeline(), &Viewport::new(472.0, 140.0));
        let dots: Vec<(&str, f64)> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawCircle { key: Some(k), center, .. } => Some((k.as_str(), center.y)),
                _ => None,
            })
            .collect();
        assert_eq!(dots, [("Camden", 16.0), ("Barnet", 116.0)]);
        assert!(commands.iter().any(|c| matches!(
            c,
            RenderCommand::DrawText { text, .. } if text == "#1 Camden"
        )));
    }

    #[test]
    fn one_line_per_borough() {
        let (ds, rank) = surface();
        let commands = render_rank_chart(&rank, ds.timeline(), &Viewport::new(472.0, 140.0));
        let lines = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawPath { .. }))
            .count();
        assert_eq!(lines, 2);
    }

    #[test]
    fn shrunk_dots_are_not_drawn() {
        let (ds, mut rank) = surface();
        for dot in &mut rank.dots {
            dot.size.retarget(0.0, 0);
        }
        let commands = render_rank_chart(&rank, ds.timeline(), &Viewport::new(472.0, 140.0));
        assert!(!commands.iter().any(|c| matches!(c, RenderCommand::DrawCircle { .. })));
    }
}
