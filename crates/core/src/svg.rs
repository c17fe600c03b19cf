//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use std::fmt::Write as _;

use borough_lens_protocol::{Paint, Point, RenderCommand, TextAlign, ThemeToken};

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the SVG viewBox dimensions.
/// `dark` selects the color palette. Keyed shapes carry a `data-borough`
/// attribute so a host page can route hover events back to the core.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, dark: bool) -> String {
    let mut svg = String::with_capacity(commands.len() * 160);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:system-ui,-apple-system,sans-serif;font-size:11px">"#,
    );
    let _ = write!(
        svg,
        r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
        resolve_token(ThemeToken::Background, dark),
    );

    let mut gradients = 0usize;
    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                label,
            } => {
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"{} rx="2">"#,
                    rect.x,
                    rect.y,
                    rect.w,
                    rect.h,
                    resolve(color, dark),
                    stroke_attr(border_color.as_ref(), 1.0, dark),
                );
                if let Some(label) = label {
                    let _ = write!(svg, "<title>{}</title>", escape_xml(label));
                }
                svg.push_str("</rect>");
            }
            RenderCommand::DrawGradient {
                rect,
                from,
                to,
                border_color,
            } => {
                gradients += 1;
                let id = format!("gradient-{gradients}");
                let _ = write!(
                    svg,
                    r#"<defs><linearGradient id="{id}"><stop offset="0%" stop-color="{}"/><stop offset="100%" stop-color="{}"/></linearGradient></defs>"#,
                    from.to_hex(),
                    to.to_hex(),
                );
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="url(#{id})"{}/>"#,
                    rect.x,
                    rect.y,
                    rect.w,
                    rect.h,
                    stroke_attr(border_color.as_ref(), 1.0, dark),
                );
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width: line_width,
            } => {
                let _ = write!(
                    svg,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{line_width}"/>"#,
                    from.x,
                    from.y,
                    to.x,
                    to.y,
                    resolve(color, dark),
                );
            }
            RenderCommand::DrawText {
                text,
                position,
                color,
                font_size,
                align,
            } => {
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                let _ = write!(
                    svg,
                    r#"<text x="{}" y="{}" fill="{}" font-size="{font_size}" text-anchor="{anchor}">{}</text>"#,
                    position.x,
                    position.y,
                    resolve_token(*color, dark),
                    escape_xml(text),
                );
            }
            RenderCommand::DrawPath {
                points,
                closed,
                fill,
                stroke,
                stroke_width,
                opacity,
                key,
            } => {
                if points.is_empty() {
                    continue;
                }
                let fill = fill.as_ref().map_or_else(|| "none".to_string(), |p| resolve(p, dark));
                let _ = write!(
                    svg,
                    r#"<path d="{}" fill="{fill}"{} opacity="{opacity}"{}/>"#,
                    path_data(points, *closed),
                    stroke_attr(stroke.as_ref(), *stroke_width, dark),
                    key_attr(key.as_deref()),
                );
            }
            RenderCommand::DrawCircle {
                center,
                radius,
                fill,
                stroke,
                stroke_width,
                opacity,
                key,
            } => {
                let _ = write!(
                    svg,
                    r#"<circle cx="{}" cy="{}" r="{radius}" fill="{}"{} opacity="{opacity}"{}/>"#,
                    center.x,
                    center.y,
                    resolve(fill, dark),
                    stroke_attr(stroke.as_ref(), *stroke_width, dark),
                    key_attr(key.as_deref()),
                );
            }
            RenderCommand::BeginGroup { id, label } => {
                let _ = write!(svg, r#"<g id="{}">"#, escape_xml(id));
                if let Some(label) = label {
                    let _ = write!(svg, "<title>{}</title>", escape_xml(label));
                }
            }
            RenderCommand::EndGroup => svg.push_str("</g>"),
        }
    }

    svg.push_str("</svg>");
    svg
}

fn path_data(points: &[Point], closed: bool) -> String {
    let mut d = String::with_capacity(points.len() * 16);
    for (i, p) in points.iter().enumerate() {
        let _ = write!(d, "{}{:.2},{:.2}", if i == 0 { 'M' } else { 'L' }, p.x, p.y);
    }
    if closed {
        d.push('Z');
    }
    d
}

fn stroke_attr(paint: Option<&Paint>, width: f64, dark: bool) -> String {
    match paint {
        Some(p) => format!(r#" stroke="{}" stroke-width="{width}""#, resolve(p, dark)),
        None => String::new(),
    }
}

fn key_attr(key: Option<&str>) -> String {
    match key {
        Some(k) => format!(r#" data-borough="{}""#, escape_xml(k)),
        None => String::new(),
    }
}

fn resolve(paint: &Paint, dark: bool) -> String {
    match paint {
        Paint::Token(token) => resolve_token(*token, dark).to_string(),
        Paint::Rgb(color) => color.to_hex(),
    }
}

fn resolve_token(token: ThemeToken, dark: bool) -> &'static str {
    if dark {
        match token {
            ThemeToken::Background => "#1a1a2e",
            ThemeToken::Surface | ThemeToken::TooltipBackground => "#24243a",
            ThemeToken::Border | ThemeToken::TooltipBorder | ThemeToken::AxisLine => "#4a4a60",
            ThemeToken::TextPrimary | ThemeToken::TooltipText => "#ececec",
            ThemeToken::TextSecondary => "#bdbdbd",
            ThemeToken::TextMuted => "#9e9e9e",
            ThemeToken::MapStroke => "#1a1a2e",
            ThemeToken::MapNoData => "#555555",
            ThemeToken::LegendBorder => "#ececec",
            ThemeToken::Highlight => "#ffb300",
            ThemeToken::LineSeries => "#64b5f6",
            ThemeToken::RankSeries => "#90a4ae",
            ThemeToken::RankDot => "#42a5f5",
        }
    } else {
        match token {
            ThemeToken::Background => "#ffffff",
            ThemeToken::Surface => "#ffffff",
            ThemeToken::TooltipBackground => "#fdfdfd",
            ThemeToken::Border | ThemeToken::TooltipBorder => "#dee2e6",
            ThemeToken::AxisLine => "#666677",
            ThemeToken::TextPrimary | ThemeToken::TooltipText => "#1a1a2e",
            ThemeToken::TextSecondary => "#444455",
            ThemeToken::TextMuted => "#666677",
            ThemeToken::MapStroke => "#ffffff",
            ThemeToken::MapNoData => "#cccccc",
            ThemeToken::LegendBorder => "#000000",
            ThemeToken::Highlight => "#ff7f00",
            ThemeToken::LineSeries => "#2171b5",
            ThemeToken::RankSeries => "#9ecae1",
            ThemeToken::RankDot => "#08519c",
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use borough_lens_protocol::{Color, Rect};

    #[test]
    fn basic_svg_output() {
        let commands = vec![
            RenderCommand::BeginGroup {
                id: "boroughs".into(),
                label: None,
            },
            RenderCommand::DrawPath {
                points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
                closed: true,
                fill: Some(Paint::Rgb(Color::rgb8(0x08, 0x30, 0x6b))),
                stroke: Some(Paint::Token(ThemeToken::MapStroke)),
                stroke_width: 1.0,
                opacity: 1.0,
                key: Some("Camden".into()),
            },
            RenderCommand::EndGroup,
        ];
        let svg = render_svg(&commands, 800.0, 400.0, false);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"<g id="boroughs">"#));
        assert!(svg.contains("M0.00,0.00L10.00,0.00L10.00,10.00Z"));
        assert!(svg.contains(r##"fill="#08306b""##));
        assert!(svg.contains(r#"data-borough="Camden""#));
    }

    #[test]
    fn gradients_get_unique_ids() {
        let gradient = RenderCommand::DrawGradient {
            rect: Rect::new(50.0, 50.0, 200.0, 10.0),
            from: Color::rgb8(0xf7, 0xfb, 0xff),
            to: Color::rgb8(0x08, 0x30, 0x6b),
            border_color: None,
        };
        let svg = render_svg(&[gradient.clone(), gradient], 300.0, 100.0, true);
        assert!(svg.contains(r#"id="gradient-1""#));
        assert!(svg.contains("url(#gradient-2)"));
        assert!(svg.contains("#f7fbff"));
    }

    #[test]
    fn escapes_xml_entities() {
        let commands = vec![RenderCommand::DrawText {
            position: Point::new(0.0, 0.0),
            text: "Barking & Dagenham <1>".into(),
            color: ThemeToken::TextPrimary,
            font_size: 10.0,
            align: TextAlign::Right,
        }];
        let svg = render_svg(&commands, 400.0, 100.0, false);
        assert!(svg.contains("Barking &amp; Dagenham &lt;1&gt;"));
        assert!(svg.contains(r#"text-anchor="end""#));
    }
}
