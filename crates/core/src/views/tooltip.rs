use borough_lens_protocol::{Paint, Point, Rect, RenderCommand, TextAlign, ThemeToken};

use crate::viz::tooltip::Tooltip;

const PADDING: f64 = 6.0;
const LINE_HEIGHT: f64 = 14.0;
const FONT_SIZE: f64 = 11.0;
const CHAR_WIDTH: f64 = 6.5;

/// Render the shared tooltip box, or nothing while hidden.
pub fn render_tooltip(tooltip: &Tooltip) -> Vec<RenderCommand> {
    let (Some(content), Some(origin)) = (&tooltip.content, tooltip.position) else {
        return Vec::new();
    };
    if !tooltip.visible {
        return Vec::new();
    }

    let title = content.title();
    let lines = content.lines();
    let widest = lines
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(title.chars().count()))
        .max()
        .unwrap_or(0);
    let width = widest as f64 * CHAR_WIDTH + PADDING * 2.0;
    let height = (lines.len() + 1) as f64 * LINE_HEIGHT + PADDING * 2.0;

    let mut commands = Vec::with_capacity(lines.len() + 4);
    commands.push(RenderCommand::BeginGroup {
        id: "tooltip".into(),
        label: None,
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(origin.x, origin.y, width, height),
        color: Paint::Token(ThemeToken::TooltipBackground),
        border_color: Some(Paint::Token(ThemeToken::TooltipBorder)),
        label: None,
    });
    let text_x = origin.x + PADDING;
    let mut y = origin.y + PADDING + FONT_SIZE;
    commands.push(RenderCommand::DrawText {
        position: Point::new(text_x, y),
        text: title.to_string(),
        color: ThemeToken::TooltipText,
        font_size: FONT_SIZE + 1.0,
        align: TextAlign::Left,
    });
    for line in lines {
        y += LINE_HEIGHT;
        commands.push(RenderCommand::DrawText {
            position: Point::new(text_x, y),
            text: line,
            color: ThemeToken::TooltipText,
            font_size: FONT_SIZE,
            align: TextAlign::Left,
        });
    }
    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::tooltip::{Pointer, TooltipContent};

    #[test]
    fn hidden_tooltip_renders_nothing() {
        assert!(render_tooltip(&Tooltip::default()).is_empty());
    }

    #[test]
    fn series_tooltip_has_title_and_four_lines() {
        let mut tooltip = Tooltip::default();
        tooltip.show(
            TooltipContent::Series {
                name: "Camden".into(),
                date: "July 2025".into(),
                price: None,
                change_1m: Some(0.2),
                change_12m: None,
            },
            Pointer { x: 0.0, y: 100.0 },
        );
        let commands = render_tooltip(&tooltip);
        let texts: Vec<&str> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            texts,
            ["Camden", "July 2025", "Avg Price: No data", "1m change: 0.2%", "12m change: No data"]
        );
        let RenderCommand::DrawRect { rect, .. } = &commands[1] else {
            panic!("expected the tooltip box");
        };
        assert_eq!((rect.x, rect.y), (10.0, 72.0));

        tooltip.hide();
        assert!(render_tooltip(&tooltip).is_empty());
    }
}
