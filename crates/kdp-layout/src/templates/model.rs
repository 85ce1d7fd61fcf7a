use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::types::{AgeGroup, Alignment, BookType, ColorScheme, ImagePlacement, TrimSize};

/// Formatting properties carried by a template.
///
/// Known keys are typed; anything else is kept in `extra` so records
/// written by other tools survive a load/save cycle unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemplateProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<ColorScheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_alignment: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_alignment: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_placement: Option<ImagePlacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_numbering: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_border: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_borders: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateProperties {
    /// Overlay `other` key by key; keys absent from `other` keep their value.
    pub fn merge(&mut self, other: TemplateProperties) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.layout, other.layout);
        take(&mut self.font_family, other.font_family);
        take(&mut self.title_font, other.title_font);
        take(&mut self.body_font, other.body_font);
        take(&mut self.caption_font, other.caption_font);
        take(&mut self.color_scheme, other.color_scheme);
        take(&mut self.title_alignment, other.title_alignment);
        take(&mut self.body_alignment, other.body_alignment);
        take(&mut self.image_placement, other.image_placement);
        take(&mut self.page_numbering, other.page_numbering);
        take(&mut self.image_border, other.image_border);
        take(&mut self.captions, other.captions);
        take(&mut self.page_borders, other.page_borders);
        self.extra.extend(other.extra);
    }
}

/// A stored, reusable book layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookTemplate {
    #[serde(rename = "template_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub book_type: BookType,
    #[serde(default)]
    pub age_groups: Vec<AgeGroup>,
    /// Empty means every trim size
    #[serde(default)]
    pub trim_sizes: Vec<TrimSize>,
    #[serde(default)]
    pub properties: TemplateProperties,
    #[serde(default)]
    pub preview_image: Option<PathBuf>,
    #[serde(default = "missing_timestamp", deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "missing_timestamp", deserialize_with = "lenient_timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn missing_timestamp() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Parse an RFC 3339 timestamp, or a naive ISO 8601 one taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

impl BookTemplate {
    /// Whether the template suits the given filters (`None` matches anything)
    pub fn matches(&self, age_group: Option<AgeGroup>, trim_size: Option<TrimSize>) -> bool {
        let age_ok = age_group.is_none_or(|age| self.age_groups.contains(&age));
        let trim_ok = trim_size
            .is_none_or(|trim| self.trim_sizes.is_empty() || self.trim_sizes.contains(&trim));
        age_ok && trim_ok
    }
}

/// Fields for a new user template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub book_type: BookType,
    #[serde(default)]
    pub age_groups: Vec<AgeGroup>,
    #[serde(default)]
    pub trim_sizes: Vec<TrimSize>,
    #[serde(default)]
    pub properties: TemplateProperties,
    #[serde(default)]
    pub preview_image: Option<PathBuf>,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemplateUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub age_groups: Option<Vec<AgeGroup>>,
    #[serde(default)]
    pub trim_sizes: Option<Vec<TrimSize>>,
    #[serde(default)]
    pub properties: Option<TemplateProperties>,
    #[serde(default)]
    pub preview_image: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_keys_round_trip() {
        let json = r#"{"title_font":"Times-Bold","fun_facts":true,"info_boxes":{"style":"rounded"}}"#;
        let props: TemplateProperties = serde_json::from_str(json).unwrap();
        assert_eq!(props.title_font.as_deref(), Some("Times-Bold"));
        assert_eq!(props.extra.get("fun_facts"), Some(&Value::Bool(true)));

        let back: Value = serde_json::to_value(&props).unwrap();
        let original: Value = serde_json::from_str(json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-05-01T10:20:30Z").unwrap();
        let naive = parse_timestamp("2024-05-01T10:20:30.123456").unwrap();
        assert_eq!(naive.timestamp(), rfc.timestamp());
        assert_eq!(naive.timestamp_subsec_micros(), 123456);
        assert!(parse_timestamp("2024-05-01 10:20:30").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_merge_only_overrides_present_keys() {
        let mut base = TemplateProperties {
            title_font: Some("Helvetica-Bold".into()),
            body_font: Some("Helvetica".into()),
            ..Default::default()
        };
        let overlay = TemplateProperties {
            body_font: Some("Times-Roman".into()),
            captions: Some(true),
            ..Default::default()
        };
        base.merge(overlay);
        assert_eq!(base.title_font.as_deref(), Some("Helvetica-Bold"));
        assert_eq!(base.body_font.as_deref(), Some("Times-Roman"));
        assert_eq!(base.captions, Some(true));
    }
}
