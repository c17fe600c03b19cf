use borough_lens_protocol::{Paint, Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};

use crate::viz::scale::ColorScale;
use crate::viz::surface::MapSurface;
use crate::viz::projection::Mercator;

const STROKE_WIDTH: f64 = 1.0;

const LEGEND_X: f64 = 50.0;
const LEGEND_Y: f64 = 50.0;
const LEGEND_WIDTH: f64 = 200.0;
const LEGEND_HEIGHT: f64 = 10.0;
const LEGEND_FONT_SIZE: f64 = 10.0;

/// Render the choropleth: one closed path per polygon ring, keyed by
/// borough, followed by the price legend.
pub fn render_map(map: &MapSurface, viewport: &Viewport) -> Vec<RenderCommand> {
    let projection = Mercator::london(viewport.width, viewport.height);
    let fraction = map.fraction();

    let mut commands = Vec::with_capacity(map.features.len() * 2 + 8);
    commands.push(RenderCommand::BeginGroup {
        id: "boroughs".into(),
        label: Some("Borough map".into()),
    });

    for feature in &map.features {
        let fill = feature.paint(fraction);
        for polygon in &feature.geometry.polygons {
            for ring in polygon {
                if ring.len() < 3 {
                    continue;
                }
                commands.push(RenderCommand::DrawPath {
                    points: ring.iter().map(|p| projection.project(*p)).collect(),
                    closed: true,
                    fill: Some(fill),
                    stroke: Some(Paint::Token(ThemeToken::MapStroke)),
                    stroke_width: STROKE_WIDTH,
                    opacity: 1.0,
                    key: Some(feature.name.clone()),
                });
            }
        }
    }

    commands.push(RenderCommand::EndGroup);
    commands.extend(render_legend(&map.scale));
    commands
}

/// Gradient bar between the scale's end colors with rounded min/max labels.
pub fn render_legend(scale: &ColorScale) -> Vec<RenderCommand> {
    let (lo, hi) = scale.domain();
    vec![
        RenderCommand::BeginGroup {
            id: "legend".into(),
            label: Some("Average price".into()),
        },
        RenderCommand::DrawGradient {
            rect: Rect::new(LEGEND_X, LEGEND_Y, LEGEND_WIDTH, LEGEND_HEIGHT),
            from: scale.color(lo),
            to: scale.color(hi),
            border_color: Some(Paint::Token(ThemeToken::LegendBorder)),
        },
        RenderCommand::DrawText {
            position: Point::new(LEGEND_X, LEGEND_Y - 5.0),
            text: format!("{}", lo.round()),
            color: ThemeToken::TextSecondary,
            font_size: LEGEND_FONT_SIZE,
            align: TextAlign::Left,
        },
        RenderCommand::DrawText {
            position: Point::new(LEGEND_X + LEGEND_WIDTH, LEGEND_Y - 5.0),
            text: format!("{}", hi.round()),
            color: ThemeToken::TextSecondary,
            font_size: LEGEND_FONT_SIZE,
            align: TextAlign::Right,
        },
        RenderCommand::EndGroup,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoFeature;

    fn square(name: &str) -> GeoFeature {
        GeoFeature {
            name: name.into(),
            polygons: vec![vec![vec![
                [-0.12, 51.48],
                [-0.08, 51.48],
                [-0.08, 51.50],
                [-0.12, 51.50],
                [-0.12, 51.48],
            ]]],
        }
    }

    #[test]
    fn one_keyed_path_per_ring() {
        let mut map = MapSurface::new(vec![square("Camden"), square("Barnet")], ColorScale::new(0.0, 1.0));
        map.features[0].highlighted = true;
        let commands = render_map(&map, &Viewport::new(960.0, 600.0));
        let paths: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawPath { key, fill, points, .. } => Some((key.clone(), *fill, points.len())),
                _ => None,
            })
            .collect();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].0.as_deref(), Some("Camden"));
        assert_eq!(paths[0].1, Some(Paint::Token(ThemeToken::Highlight)));
        assert!(matches!(paths[1].1, Some(Paint::Rgb(_))));
        assert_eq!(paths[0].2, 5);
    }

    #[test]
    fn legend_labels_are_rounded() {
        let commands = render_legend(&ColorScale::new(72_150.6, 1_463_377.4));
        let texts: Vec<&str> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, ["72151", "1463377"]);
    }
}
