//! Catalog figures and the master data they reference.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;
use super::serde_helpers::double_option;

static RELEASE_DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid release date pattern"));

/// `YYYY-MM-DD` literal check. Calendar validity is not checked.
pub fn is_release_date_literal(value: &str) -> bool {
    RELEASE_DATE_PATTERN.is_match(value)
}

/// Shared lookup tables referenced by figures and acquisitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasterKind {
    Series,
    Character,
    Manufacturer,
    Category,
    Scale,
    /// Purchase site referenced by acquisitions
    Shop,
}

impl MasterKind {
    pub const ALL: [MasterKind; 6] = [
        MasterKind::Series,
        MasterKind::Character,
        MasterKind::Manufacturer,
        MasterKind::Category,
        MasterKind::Scale,
        MasterKind::Shop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MasterKind::Series => "series",
            MasterKind::Character => "character",
            MasterKind::Manufacturer => "manufacturer",
            MasterKind::Category => "category",
            MasterKind::Scale => "scale",
            MasterKind::Shop => "shop",
        }
    }

    /// Kind an entry of this kind may be parented to (character → series).
    pub fn parent_kind(&self) -> Option<MasterKind> {
        match self {
            MasterKind::Character => Some(MasterKind::Series),
            _ => None,
        }
    }
}

impl fmt::Display for MasterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MasterKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MasterKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("Unknown master data kind: {}", s)))
    }
}

/// Reference to a master data row by id, or by name ("create new if not found").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MasterRef {
    Id(i32),
    Name(String),
}

/// Master data row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterEntry {
    pub id: i32,
    pub kind: MasterKind,
    pub name: String,
    pub parent_id: Option<i32>,
}

/// How precisely a release date is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePrecision {
    Year,
    Quarter,
    Month,
    Day,
    #[default]
    Unknown,
}

impl ReleasePrecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleasePrecision::Year => "year",
            ReleasePrecision::Quarter => "quarter",
            ReleasePrecision::Month => "month",
            ReleasePrecision::Day => "day",
            ReleasePrecision::Unknown => "unknown",
        }
    }
}

impl FromStr for ReleasePrecision {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(ReleasePrecision::Year),
            "quarter" => Ok(ReleasePrecision::Quarter),
            "month" => Ok(ReleasePrecision::Month),
            "day" => Ok(ReleasePrecision::Day),
            "unknown" => Ok(ReleasePrecision::Unknown),
            other => Err(DomainError::Validation(format!(
                "Unknown release precision: {}",
                other
            ))),
        }
    }
}

/// Image descriptor passed at registration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInput {
    pub url: String,
    #[serde(default)]
    pub is_thumbnail: bool,
}

/// Stored figure image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureImage {
    pub id: i32,
    pub figure_id: i32,
    pub url: String,
    pub is_thumbnail: bool,
    pub sort_order: i32,
}

/// Figure data for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub id: i32,
    pub name: String,
    pub name_en: Option<String>,
    pub name_ja: Option<String>,
    pub manufacturer: Option<MasterEntry>,
    pub series: Option<MasterEntry>,
    pub character: Option<MasterEntry>,
    pub category: Option<MasterEntry>,
    pub scale: Option<MasterEntry>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub sculptors: Vec<String>,
    pub paint_work: Vec<String>,
    pub release_date: Option<String>,
    pub release_precision: ReleasePrecision,
    pub price_krw: Option<i64>,
    pub price_jpy: Option<i64>,
    pub price_usd: Option<f64>,
    pub description: Option<String>,
    pub specification: Option<String>,
    pub is_limited: bool,
    pub is_adult: bool,
    pub thumbnail_url: Option<String>,
    pub images: Vec<FigureImage>,
    pub created_at: String,
    pub updated_at: String,
}

/// The slice of a figure an acquisition listing needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureSummary {
    pub id: i32,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub release_date: Option<String>,
    pub release_precision: ReleasePrecision,
}

/// Input for the atomic "register a figure" operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterFigureInput {
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_ja: Option<String>,
    pub manufacturer: MasterRef,
    pub series: MasterRef,
    pub character: MasterRef,
    pub category: MasterRef,
    #[serde(default)]
    pub scale: Option<MasterRef>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub sculptors: Vec<String>,
    #[serde(default)]
    pub paint_work: Vec<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub release_precision: ReleasePrecision,
    #[serde(default)]
    pub price_krw: Option<i64>,
    #[serde(default)]
    pub price_jpy: Option<i64>,
    #[serde(default)]
    pub price_usd: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub specification: Option<String>,
    #[serde(default)]
    pub is_limited: bool,
    #[serde(default)]
    pub is_adult: bool,
    #[serde(default)]
    pub images: Vec<ImageInput>,
}

impl RegisterFigureInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("name is required".to_string()));
        }
        if let Some(date) = &self.release_date {
            if !is_release_date_literal(date) {
                return Err(DomainError::Validation(
                    "release_date must be YYYY-MM-DD".to_string(),
                ));
            }
        }
        if self.price_krw.is_some_and(|p| p < 0) || self.price_jpy.is_some_and(|p| p < 0) {
            return Err(DomainError::Validation(
                "prices must not be negative".to_string(),
            ));
        }
        if self.price_usd.is_some_and(|p| p < 0.0 || !p.is_finite()) {
            return Err(DomainError::Validation(
                "prices must not be negative".to_string(),
            ));
        }
        for reference in [&self.manufacturer, &self.series, &self.character, &self.category]
            .into_iter()
            .chain(self.scale.as_ref())
        {
            if let MasterRef::Name(name) = reference {
                if name.trim().is_empty() {
                    return Err(DomainError::Validation(
                        "master data names must not be empty".to_string(),
                    ));
                }
            }
        }
        if self.images.iter().any(|img| img.url.trim().is_empty()) {
            return Err(DomainError::Validation("image url is required".to_string()));
        }
        Ok(())
    }

    /// Thumbnail flags as stored: exactly one thumbnail when any image exists,
    /// the first flagged image winning, the first image by default.
    pub fn normalized_images(&self) -> Vec<ImageInput> {
        let thumbnail = self
            .images
            .iter()
            .position(|img| img.is_thumbnail)
            .unwrap_or(0);

        self.images
            .iter()
            .enumerate()
            .map(|(index, img)| ImageInput {
                url: img.url.clone(),
                is_thumbnail: index == thumbnail,
            })
            .collect()
    }
}

/// Input for updating a figure. Master data is re-pointed by id only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFigureInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub name_en: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub name_ja: Option<Option<String>>,
    pub manufacturer_id: Option<i32>,
    pub series_id: Option<i32>,
    pub character_id: Option<i32>,
    pub category_id: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub scale_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub size: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub material: Option<Option<String>>,
    pub sculptors: Option<Vec<String>>,
    pub paint_work: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub release_date: Option<Option<String>>,
    pub release_precision: Option<ReleasePrecision>,
    #[serde(default, deserialize_with = "double_option")]
    pub price_krw: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub price_jpy: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub price_usd: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub specification: Option<Option<String>>,
    pub is_limited: Option<bool>,
    pub is_adult: Option<bool>,
}

impl UpdateFigureInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DomainError::Validation("name must not be empty".to_string()));
        }
        if let Some(Some(date)) = &self.release_date {
            if !is_release_date_literal(date) {
                return Err(DomainError::Validation(
                    "release_date must be YYYY-MM-DD".to_string(),
                ));
            }
        }
        let negative_int = |p: &Option<Option<i64>>| matches!(p, Some(Some(v)) if *v < 0);
        if negative_int(&self.price_krw)
            || negative_int(&self.price_jpy)
            || matches!(self.price_usd, Some(Some(v)) if v < 0.0)
        {
            return Err(DomainError::Validation(
                "prices must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> RegisterFigureInput {
        serde_json::from_value(serde_json::json!({
            "name": "Rem 1/7",
            "manufacturer": "Good Smile Company",
            "series": 3,
            "character": "Rem",
            "category": "Scale Figure"
        }))
        .unwrap()
    }

    #[test]
    fn test_master_ref_accepts_id_or_name() {
        let input = input();
        assert_eq!(input.series, MasterRef::Id(3));
        assert_eq!(
            input.manufacturer,
            MasterRef::Name("Good Smile Company".to_string())
        );
        assert_eq!(input.release_precision, ReleasePrecision::Unknown);
    }

    #[test]
    fn test_release_date_literal_only_checks_shape() {
        assert!(is_release_date_literal("2024-03-10"));
        assert!(is_release_date_literal("2024-02-30"));
        assert!(!is_release_date_literal("2024-3-10"));
        assert!(!is_release_date_literal("2024/03/10"));
        assert!(!is_release_date_literal(" 2024-03-10"));
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut bad = input();
        bad.release_date = Some("March 2024".to_string());
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.price_krw = Some(-1);
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.character = MasterRef::Name("  ".to_string());
        assert!(bad.validate().is_err());

        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_normalized_images_keep_single_thumbnail() {
        let mut input = input();
        input.images = vec![
            ImageInput { url: "a".into(), is_thumbnail: false },
            ImageInput { url: "b".into(), is_thumbnail: true },
            ImageInput { url: "c".into(), is_thumbnail: true },
        ];
        let flags: Vec<bool> = input
            .normalized_images()
            .iter()
            .map(|img| img.is_thumbnail)
            .collect();
        assert_eq!(flags, vec![false, true, false]);

        input.images.iter_mut().for_each(|img| img.is_thumbnail = false);
        assert!(input.normalized_images()[0].is_thumbnail);
    }

    #[test]
    fn test_master_kind_round_trips_path_segment() {
        for kind in MasterKind::ALL {
            assert_eq!(kind.as_str().parse::<MasterKind>().unwrap(), kind);
        }
        assert!("publisher".parse::<MasterKind>().is_err());
        assert_eq!(MasterKind::Character.parent_kind(), Some(MasterKind::Series));
    }
}
