pub mod borough;
pub mod geo;
pub mod housing;
pub mod scene;
pub mod section;

pub use borough::BoroughDetail;
pub use geo::{GeoFeature, LonLat, Polygon, Ring};
pub use housing::{
    CalendarDate, DateSlice, HousingDataset, LONDON_BOROUGHS, RankEntry, RankSnapshot,
    TimeSeriesRecord, Timeline, is_london_borough,
};
pub use scene::{ElementSpec, NodeId, SceneError, SceneTree, Selector};
pub use section::{ContentRole, Placement, Section, SectionKind, Stage};
