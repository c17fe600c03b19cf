use serde::{Deserialize, Serialize};

/// Descriptive record served by `GET {api}/boroughs/{slug}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoroughDetail {
    pub name: String,
    pub slug: String,
    pub location: String,
    pub history: String,
    pub living: String,
}

/// Image id used when a slug has no entry in [`IMAGE_IDS`].
pub const DEFAULT_IMAGE_ID: u32 = 1060;

/// Placeholder-image ids by borough slug.
pub const IMAGE_IDS: &[(&str, u32)] = &[
    ("barking-and-dagenham", 1060),
    ("barnet", 1061),
    ("bexley", 1062),
    ("brent", 1063),
    ("camden", 1064),
    ("croydon", 1065),
    ("ealing", 1066),
    ("enfield", 1067),
    ("greenwich", 1068),
    ("hackney", 1069),
    ("hammersmith-and-fulham-area", 1070),
    ("haringey", 1071),
    ("harrow", 1072),
    ("havering", 1073),
    ("hillingdon", 1074),
    ("hounslow", 1075),
    ("islington", 1076),
    ("kensington-and-chelsea", 1077),
    ("kingston-upon-thames", 1078),
    ("lambeth", 1079),
    ("lewisham", 1080),
    ("merton", 1081),
    ("newham", 1082),
    ("redbridge", 1083),
    ("richmond-upon-thames", 1084),
    ("southwark", 1085),
    ("sutton", 1086),
    ("tower-hamlets", 1087),
    ("waltham-forest", 1088),
    ("wandsworth", 1089),
    ("city-of-westminster", 1090),
];

pub fn image_id(slug: &str) -> u32 {
    IMAGE_IDS
        .iter()
        .find(|(s, _)| *s == slug)
        .map_or(DEFAULT_IMAGE_ID, |(_, id)| *id)
}

pub fn image_url(slug: &str) -> String {
    format!("https://picsum.photos/id/{}/600/400", image_id(slug))
}
