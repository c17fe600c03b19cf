use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The 32 London boroughs shown on the map and ranked in the charts.
pub const LONDON_BOROUGHS: [&str; 32] = [
    "Barking and Dagenham",
    "Barnet",
    "Bexley",
    "Brent",
    "Bromley",
    "Camden",
    "Croydon",
    "Ealing",
    "Enfield",
    "Greenwich",
    "Hackney",
    "Hammersmith and Fulham",
    "Haringey",
    "Harrow",
    "Havering",
    "Hillingdon",
    "Hounslow",
    "Islington",
    "Kensington and Chelsea",
    "Kingston upon Thames",
    "Lambeth",
    "Lewisham",
    "Merton",
    "Newham",
    "Redbridge",
    "Richmond upon Thames",
    "Southwark",
    "Sutton",
    "Tower Hamlets",
    "Waltham Forest",
    "Wandsworth",
    "Westminster",
];

pub fn is_london_borough(name: &str) -> bool {
    LONDON_BOROUGHS.contains(&name.trim())
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Calendar date of an observation. Field order gives chronological `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i32,
    /// 1-based.
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Timeline label, e.g. `"July 2025"`.
    pub fn month_label(&self) -> String {
        let name = MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("Unknown");
        format!("{name} {}", self.year)
    }

    fn month_key(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}

/// One borough/date observation from the time-series dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    pub region: String,
    pub date: CalendarDate,
    pub average_price: Option<f64>,
    pub change_1m: Option<f64>,
    pub change_12m: Option<f64>,
}

/// Every region's observation for one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateSlice {
    pub date: CalendarDate,
    pub label: String,
    by_region: BTreeMap<String, TimeSeriesRecord>,
}

impl DateSlice {
    pub fn get(&self, region: &str) -> Option<&TimeSeriesRecord> {
        self.by_region.get(region.trim())
    }

    pub fn price(&self, region: &str) -> Option<f64> {
        self.get(region).and_then(|r| r.average_price)
    }

    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.by_region.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_region.is_empty()
    }
}

/// A borough's position in one date's price ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub borough: String,
    /// 1 = most expensive.
    pub rank: usize,
    pub price: f64,
}

/// Boroughs ordered by descending average price for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankSnapshot {
    pub label: String,
    pub entries: Vec<RankEntry>,
}

impl RankSnapshot {
    /// Rank the allow-listed boroughs that have a price in `slice`.
    /// Equal prices are ordered by name so ranks stay a permutation.
    pub fn from_slice(slice: &DateSlice) -> Self {
        let mut priced: Vec<(&str, f64)> = LONDON_BOROUGHS
            .iter()
            .filter_map(|b| slice.price(b).map(|p| (*b, p)))
            .filter(|(_, p)| p.is_finite())
            .collect();
        priced.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let entries = priced
            .into_iter()
            .enumerate()
            .map(|(i, (borough, price))| RankEntry {
                borough: borough.to_string(),
                rank: i + 1,
                price,
            })
            .collect();

        Self {
            label: slice.label.clone(),
            entries,
        }
    }

    pub fn rank_of(&self, borough: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.borough == borough)
            .map(|e| e.rank)
    }

    pub fn entry(&self, borough: &str) -> Option<&RankEntry> {
        self.entries.iter().find(|e| e.borough == borough)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered month labels; a slider position indexes into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    labels: Vec<String>,
}

impl Timeline {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Maximum slider value. Always `len - 1` (0 for an empty timeline).
    pub fn slider_max(&self) -> usize {
        self.labels.len().saturating_sub(1)
    }

    pub fn clamp(&self, index: usize) -> usize {
        index.min(self.slider_max())
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Parsed time series grouped into chronological month slices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousingDataset {
    slices: Vec<DateSlice>,
    timeline: Timeline,
}

impl HousingDataset {
    /// Group records by month. A later record for the same region and
    /// month replaces an earlier one.
    pub fn from_records(records: Vec<TimeSeriesRecord>) -> Self {
        let mut by_month: BTreeMap<(i32, u32), DateSlice> = BTreeMap::new();
        for record in records {
            let slice = by_month
                .entry(record.date.month_key())
                .or_insert_with(|| DateSlice {
                    date: record.date,
                    label: record.date.month_label(),
                    by_region: BTreeMap::new(),
                });
            slice.by_region.insert(record.region.trim().to_string(), record);
        }

        let slices: Vec<DateSlice> = by_month.into_values().collect();
        let timeline = Timeline::new(slices.iter().map(|s| s.label.clone()).collect());
        Self { slices, timeline }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn slices(&self) -> &[DateSlice] {
        &self.slices
    }

    pub fn slice(&self, index: usize) -> Option<&DateSlice> {
        self.slices.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Min/max allow-listed price over the whole series, widened by 1 when
    /// degenerate.
    pub fn price_extent(&self) -> (f64, f64) {
        extent(self.slices.iter().flat_map(|slice| {
            LONDON_BOROUGHS.into_iter().filter_map(move |b| slice.price(b))
        }))
    }

    /// Like [`HousingDataset::price_extent`] but over every region in the
    /// file, aggregates such as "London" included. This is the domain of
    /// the map colour scale.
    pub fn all_regions_price_extent(&self) -> (f64, f64) {
        extent(self.slices.iter().flat_map(|slice| {
            slice.regions().filter_map(move |r| slice.price(r))
        }))
    }

    /// A borough's price at every timeline index.
    pub fn price_series(&self, borough: &str) -> Vec<Option<f64>> {
        self.slices.iter().map(|s| s.price(borough)).collect()
    }
}

fn extent(prices: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for p in prices.filter(|p| p.is_finite()) {
        lo = lo.min(p);
        hi = hi.max(p);
    }
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if hi <= lo {
        hi = lo + 1.0;
    }
    (lo, hi)
}
