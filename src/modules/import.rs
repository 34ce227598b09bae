//! Bulk catalog import: pasted CSV or JSON text → validated registration drafts.
//!
//! Parsing is lenient and produces [`RawRecord`]s. [`validate_record`] turns a
//! raw record into either a [`RegisterFigureInput`] or the list of messages
//! explaining why it cannot be registered.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::figure::{
    ImageInput, MasterRef, RegisterFigureInput, ReleasePrecision, is_release_date_literal,
};

pub const REQUIRED_FIELDS: [&str; 7] = [
    "name",
    "manufacturer",
    "series",
    "character",
    "category",
    "releaseDate",
    "price",
];

const LIST_COLUMNS: [&str; 3] = ["sculptors", "paintWork", "images"];
const BOOL_COLUMNS: [&str; 2] = ["limited", "adult"];

pub const VALID_STATUS: &str = "유효함";
pub const INVALID_STATUS: &str = "오류";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Csv,
    Json,
}

/// One loosely-typed input row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub BTreeMap<String, Value>);

impl RawRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn is_present(&self, key: &str) -> bool {
        match self.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Bool(b)) => *b,
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

pub fn parse(format: ImportFormat, text: &str) -> Result<Vec<RawRecord>, String> {
    match format {
        ImportFormat::Csv => parse_csv(text),
        ImportFormat::Json => parse_json(text),
    }
}

fn split_list(value: &str) -> Value {
    Value::Array(
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect(),
    )
}

/// Parse CSV with a header row. Quoted fields may contain commas.
pub fn parse_csv(text: &str) -> Result<Vec<RawRecord>, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| format!("CSV parse error: {}", e))?
        .clone();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|e| format!("CSV parse error: {}", e))?;
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let mut fields = BTreeMap::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            let value = if LIST_COLUMNS.contains(&header) {
                split_list(cell)
            } else if BOOL_COLUMNS.contains(&header) {
                match cell {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    "" => Value::Null,
                    other => Value::String(other.to_string()),
                }
            } else {
                Value::String(cell.to_string())
            };
            fields.insert(header.to_string(), value);
        }
        records.push(RawRecord(fields));
    }

    Ok(records)
}

/// Parse a JSON array of objects.
pub fn parse_json(text: &str) -> Result<Vec<RawRecord>, String> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| format!("JSON parse error: {}", e))?;

    let Value::Array(items) = value else {
        return Err("JSON input must be an array of objects".to_string());
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(RawRecord(map.into_iter().collect())),
            _ => Err(format!("JSON item {} is not an object", index)),
        })
        .collect()
}

fn missing(field: &str) -> String {
    format!("{} 필드가 누락되었습니다.", field)
}

fn non_negative_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (number.is_finite() && number >= 0.0).then_some(number)
}

fn master_ref(value: Option<&Value>) -> Option<MasterRef> {
    match value? {
        Value::Number(n) => n.as_i64().and_then(|id| i32::try_from(id).ok()).map(MasterRef::Id),
        Value::String(s) if !s.trim().is_empty() => Some(MasterRef::Name(s.trim().to_string())),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn images(value: Option<&Value>) -> Result<Vec<ImageInput>, String> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(Value::String(_)) => {
            return Ok(string_list(value)
                .into_iter()
                .map(|url| ImageInput { url, is_thumbnail: false })
                .collect());
        }
        Some(_) => return Err("images 값이 올바르지 않습니다.".to_string()),
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(url) if !url.trim().is_empty() => Ok(ImageInput {
                url: url.trim().to_string(),
                is_thumbnail: false,
            }),
            Value::Object(_) => serde_json::from_value::<ImageInput>(item.clone())
                .map_err(|_| "images 값이 올바르지 않습니다.".to_string()),
            _ => Err("images 값이 올바르지 않습니다.".to_string()),
        })
        .collect()
}

fn flag(record: &RawRecord, key: &str, errors: &mut Vec<String>) -> bool {
    match record.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            errors.push(format!("{} 값은 true 또는 false여야 합니다.", key));
            false
        }
    }
}

fn optional_price(record: &RawRecord, key: &str, errors: &mut Vec<String>) -> Option<f64> {
    if !record.is_present(key) {
        return None;
    }
    let value = record.get(key).and_then(non_negative_number);
    if value.is_none() {
        errors.push(format!("{}는 0 이상의 숫자여야 합니다.", key));
    }
    value
}

/// Validate one record, producing a registration draft or every problem found.
pub fn validate_record(record: &RawRecord) -> Result<RegisterFigureInput, Vec<String>> {
    let mut errors: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !record.is_present(field))
        .map(|field| missing(field))
        .collect();

    let price = optional_price(record, "price", &mut errors);
    let price_jpy = optional_price(record, "priceJpy", &mut errors);
    let price_usd = optional_price(record, "priceUsd", &mut errors);

    let release_date = record.text("releaseDate");
    if record.is_present("releaseDate")
        && !release_date.as_deref().is_some_and(is_release_date_literal)
    {
        errors.push("releaseDate는 YYYY-MM-DD 형식이어야 합니다.".to_string());
    }

    let release_precision = match record.text("releasePrecision") {
        Some(text) => text.parse::<ReleasePrecision>().unwrap_or_else(|_| {
            errors.push("releasePrecision 값이 올바르지 않습니다.".to_string());
            ReleasePrecision::Unknown
        }),
        None if release_date.is_some() => ReleasePrecision::Day,
        None => ReleasePrecision::Unknown,
    };

    let is_limited = flag(record, "limited", &mut errors);
    let is_adult = flag(record, "adult", &mut errors);

    let images = images(record.get("images")).unwrap_or_else(|e| {
        errors.push(e);
        Vec::new()
    });

    let manufacturer = master_ref(record.get("manufacturer"));
    let series = master_ref(record.get("series"));
    let character = master_ref(record.get("character"));
    let category = master_ref(record.get("category"));
    for (field, reference) in [
        ("manufacturer", &manufacturer),
        ("series", &series),
        ("character", &character),
        ("category", &category),
    ] {
        if record.is_present(field) && reference.is_none() {
            errors.push(format!("{} 값이 올바르지 않습니다.", field));
        }
    }

    let name = record.text("name");

    match (name, manufacturer, series, character, category) {
        (Some(name), Some(manufacturer), Some(series), Some(character), Some(category))
            if errors.is_empty() =>
        {
            Ok(RegisterFigureInput {
                name,
                name_en: record.text("nameEn"),
                name_ja: record.text("nameJa"),
                manufacturer,
                series,
                character,
                category,
                scale: master_ref(record.get("scale")),
                size: record.text("size"),
                material: record.text("material"),
                sculptors: string_list(record.get("sculptors")),
                paint_work: string_list(record.get("paintWork")),
                release_date,
                release_precision,
                price_krw: price.map(|p| p.round() as i64),
                price_jpy: price_jpy.map(|p| p.round() as i64),
                price_usd,
                description: record.text("description"),
                specification: record.text("specification"),
                is_limited,
                is_adult,
                images,
            })
        }
        _ => Err(errors),
    }
}

/// Preview row shown before submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPreview {
    pub row: usize,
    pub name: Option<String>,
    pub status: &'static str,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub total: usize,
    pub valid_count: usize,
    /// Row index → messages, for invalid rows only
    pub errors: BTreeMap<usize, Vec<String>>,
    pub records: Vec<RecordPreview>,
    /// Drafts for the valid rows, in input order
    #[serde(skip)]
    pub drafts: Vec<(usize, RegisterFigureInput)>,
}

/// Validate a batch. Pure: the same records always give the same report.
pub fn validate_data(records: &[RawRecord]) -> ValidationReport {
    let mut errors = BTreeMap::new();
    let mut previews = Vec::with_capacity(records.len());
    let mut drafts = Vec::new();

    for (row, record) in records.iter().enumerate() {
        let name = record.text("name");
        match validate_record(record) {
            Ok(draft) => {
                previews.push(RecordPreview {
                    row,
                    name,
                    status: VALID_STATUS,
                    errors: Vec::new(),
                });
                drafts.push((row, draft));
            }
            Err(messages) => {
                previews.push(RecordPreview {
                    row,
                    name,
                    status: INVALID_STATUS,
                    errors: messages.clone(),
                });
                errors.insert(row, messages);
            }
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        total: records.len(),
        valid_count: drafts.len(),
        errors,
        records: previews,
        drafts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "name,manufacturer,series,character,category,releaseDate,price,sculptors,limited,adult";

    #[test]
    fn test_parse_csv_handles_quotes_lists_and_flags() {
        let csv = format!(
            "{}\n\"Rem, Wedding Ver.\",GSC,Re:Zero,Rem,Scale,2024-03-10,189000,\"Kim, Lee\",true,false\n",
            HEADER
        );
        let records = parse_csv(&csv).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.get("name"), Some(&Value::String("Rem, Wedding Ver.".into())));
        assert_eq!(
            record.get("sculptors"),
            Some(&serde_json::json!(["Kim", "Lee"]))
        );
        assert_eq!(record.get("limited"), Some(&Value::Bool(true)));
        assert_eq!(record.get("adult"), Some(&Value::Bool(false)));

        let draft = validate_record(record).unwrap();
        assert_eq!(draft.name, "Rem, Wedding Ver.");
        assert_eq!(draft.price_krw, Some(189_000));
        assert_eq!(draft.sculptors, vec!["Kim", "Lee"]);
        assert!(draft.is_limited);
        assert!(!draft.is_adult);
        assert_eq!(draft.release_precision, ReleasePrecision::Day);
        assert_eq!(draft.series, MasterRef::Name("Re:Zero".into()));
    }

    #[test]
    fn test_missing_price_is_reported() {
        let csv = format!("{}\nRem,GSC,Re:Zero,Rem,Scale,2024-03-10,,,,\n", HEADER);
        let records = parse_csv(&csv).unwrap();

        let report = validate_data(&records);
        assert!(!report.is_valid);
        assert_eq!(report.errors[&0], vec!["price 필드가 누락되었습니다.".to_string()]);
        assert_eq!(report.records[0].status, INVALID_STATUS);
        assert!(report.drafts.is_empty());
    }

    #[test]
    fn test_every_missing_field_gets_a_message() {
        let report = validate_data(&[RawRecord::default()]);
        let messages = &report.errors[&0];
        assert_eq!(messages.len(), REQUIRED_FIELDS.len());
        assert!(messages.contains(&"releaseDate 필드가 누락되었습니다.".to_string()));
    }

    #[test]
    fn test_price_and_date_format_rules() {
        let records = parse_json(
            r#"[
                {"name":"A","manufacturer":"M","series":"S","character":"C","category":"K",
                 "releaseDate":"2024/03/10","price":-5},
                {"name":"B","manufacturer":"M","series":"S","character":"C","category":"K",
                 "releaseDate":"2024-02-30","price":"12000"},
                {"name":"C","manufacturer":"M","series":"S","character":"C","category":"K",
                 "releaseDate":"2024-02-01","price":"abc"}
            ]"#,
        )
        .unwrap();

        let report = validate_data(&records);
        assert_eq!(
            report.errors[&0],
            vec![
                "price는 0 이상의 숫자여야 합니다.".to_string(),
                "releaseDate는 YYYY-MM-DD 형식이어야 합니다.".to_string(),
            ]
        );
        assert!(!report.errors.contains_key(&1));
        assert_eq!(report.errors[&2], vec!["price는 0 이상의 숫자여야 합니다.".to_string()]);
        assert_eq!(report.records[1].status, VALID_STATUS);
        assert_eq!(report.valid_count, 1);
    }

    #[test]
    fn test_json_ids_select_existing_master_rows() {
        let records = parse_json(
            r#"[{"name":"A","manufacturer":4,"series":"S","character":"C","category":"K",
                 "releaseDate":"2024-01-01","price":0,"paintWork":["P1","P2"],
                 "images":["https://img/1.jpg",{"url":"https://img/2.jpg","is_thumbnail":true}]}]"#,
        )
        .unwrap();

        let draft = validate_record(&records[0]).unwrap();
        assert_eq!(draft.manufacturer, MasterRef::Id(4));
        assert_eq!(draft.price_krw, Some(0));
        assert_eq!(draft.paint_work, vec!["P1", "P2"]);
        assert_eq!(draft.images.len(), 2);
        assert!(draft.images[1].is_thumbnail);
    }

    #[test]
    fn test_bad_flag_is_flagged() {
        let csv = format!("{}\nRem,GSC,Re:Zero,Rem,Scale,2024-03-10,1000,,yes,\n", HEADER);
        let report = validate_data(&parse_csv(&csv).unwrap());
        assert_eq!(
            report.errors[&0],
            vec!["limited 값은 true 또는 false여야 합니다.".to_string()]
        );
    }

    #[test]
    fn test_validation_is_deterministic() {
        let csv = format!(
            "{}\nRem,GSC,Re:Zero,Rem,Scale,2024-03-10,1000,,,\n,GSC,,Rem,Scale,bad,,,,\n",
            HEADER
        );
        let first = validate_data(&parse_csv(&csv).unwrap());
        let second = validate_data(&parse_csv(&csv).unwrap());
        assert_eq!(first, second);
        assert_eq!(first.valid_count, 1);
        assert!(!first.is_valid);
    }

    #[test]
    fn test_json_must_be_array_of_objects() {
        assert!(parse_json(r#"{"name":"A"}"#).is_err());
        assert!(parse_json(r#"[1, 2]"#).is_err());
        assert!(parse_json("not json").is_err());
        assert!(parse_json("[]").unwrap().is_empty());
    }

    #[test]
    fn test_blank_csv_lines_are_skipped() {
        let csv = format!("{}\n,,,,,,,,,\nRem,GSC,Re:Zero,Rem,Scale,2024-03-10,1000,,,\n", HEADER);
        assert_eq!(parse_csv(&csv).unwrap().len(), 1);
    }
}
