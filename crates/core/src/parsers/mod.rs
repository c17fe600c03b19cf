pub mod csv;
pub mod topology;

use thiserror::Error;

use crate::model::{GeoFeature, HousingDataset};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("time series: {0}")]
    Csv(#[from] csv::CsvParseError),
    #[error("topology: {0}")]
    Topology(#[from] topology::TopologyParseError),
}

/// Parse the housing CSV and group it into per-month slices.
pub fn parse_dataset(data: &[u8]) -> Result<HousingDataset, ParseError> {
    let records = csv::parse_time_series(data)?;
    Ok(HousingDataset::from_records(records))
}

/// Parse the borough boundaries from the first topology object.
pub fn parse_boundaries(data: &[u8]) -> Result<Vec<GeoFeature>, ParseError> {
    Ok(topology::parse_boroughs(data, None)?)
}
