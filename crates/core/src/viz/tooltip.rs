use borough_lens_protocol::Point;
use serde::{Deserialize, Serialize};

const OFFSET_X: f64 = 10.0;
const OFFSET_Y: f64 = -28.0;
pub const VISIBLE_OPACITY: f64 = 0.9;

/// Pointer position in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

/// What the shared tooltip shows, chosen by the surface that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TooltipContent {
    /// Map or line-chart hover.
    Series {
        name: String,
        date: String,
        price: Option<f64>,
        change_1m: Option<f64>,
        change_12m: Option<f64>,
    },
    /// Rank-chart hover.
    Rank {
        name: String,
        rank: usize,
        price: f64,
    },
}

impl TooltipContent {
    pub fn title(&self) -> &str {
        match self {
            Self::Series { name, .. } | Self::Rank { name, .. } => name,
        }
    }

    /// Body lines below the title.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Series {
                date,
                price,
                change_1m,
                change_12m,
                ..
            } => vec![
                date.clone(),
                format!("Avg Price: {}", format_price(*price)),
                format!("1m change: {}", format_change(*change_1m)),
                format!("12m change: {}", format_change(*change_12m)),
            ],
            Self::Rank { rank, price, .. } => vec![
                format!("Rank: {rank}"),
                format!("Avg Price: {}", format_price(Some(*price))),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tooltip {
    pub visible: bool,
    pub position: Option<Point>,
    pub content: Option<TooltipContent>,
}

impl Tooltip {
    pub fn show(&mut self, content: TooltipContent, pointer: Pointer) {
        self.content = Some(content);
        self.visible = true;
        self.move_to(pointer);
    }

    pub fn move_to(&mut self, pointer: Pointer) {
        self.position = Some(Point::new(pointer.x + OFFSET_X, pointer.y + OFFSET_Y));
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn opacity(&self) -> f64 {
        if self.visible { VISIBLE_OPACITY } else { 0.0 }
    }
}

/// `£1,234,567` (whole pounds) or `No data`.
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p.is_finite() && p > 0.0 => format!("£{}", group_thousands(p.round() as u64)),
        _ => "No data".to_string(),
    }
}

/// One decimal and a percent sign, or `No data`.
pub fn format_change(change: Option<f64>) -> String {
    match change {
        Some(c) if c.is_finite() => format!("{c:.1}%"),
        _ => "No data".to_string(),
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
