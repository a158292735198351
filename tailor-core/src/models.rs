use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier assigned to a record when it is first created
pub type RecordId = Uuid;

/// Minimum number of characters a phone number must have
pub const MIN_PHONE_LEN: usize = 11;

/// Placeholder shown for a measurement with no value
pub const NOT_AVAILABLE: &str = "N/A";

/// One entry of the fixed measurement catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementField {
    Head,
    ShoulderToShoulder,
    Neck,
    Chest,
    Waist,
    ShoulderToNipple,
    ShoulderToUnderbust,
    ShoulderToWaist,
    NippleToNipple,
    SleeveLength,
    RoundSleeve,
    Hip,
    HalfLength,
    TopLength,
    GownLength,
    TrouserWaist,
    Crotch,
    TrouserLength,
    Thigh,
    WaistToKnee,
    Calf,
    Ankle,
    InsideLegSeam,
}

impl MeasurementField {
    /// All measurement fields in display order
    pub const ALL: [MeasurementField; 23] = [
        MeasurementField::Head,
        MeasurementField::ShoulderToShoulder,
        MeasurementField::Neck,
        MeasurementField::Chest,
        MeasurementField::Waist,
        MeasurementField::ShoulderToNipple,
        MeasurementField::ShoulderToUnderbust,
        MeasurementField::ShoulderToWaist,
        MeasurementField::NippleToNipple,
        MeasurementField::SleeveLength,
        MeasurementField::RoundSleeve,
        MeasurementField::Hip,
        MeasurementField::HalfLength,
        MeasurementField::TopLength,
        MeasurementField::GownLength,
        MeasurementField::TrouserWaist,
        MeasurementField::Crotch,
        MeasurementField::TrouserLength,
        MeasurementField::Thigh,
        MeasurementField::WaistToKnee,
        MeasurementField::Calf,
        MeasurementField::Ankle,
        MeasurementField::InsideLegSeam,
    ];

    /// Key used in the persisted JSON and as the form input name
    pub fn key(&self) -> &'static str {
        match self {
            MeasurementField::Head => "head",
            MeasurementField::ShoulderToShoulder => "shoulderToShoulder",
            MeasurementField::Neck => "neck",
            MeasurementField::Chest => "chest",
            MeasurementField::Waist => "waist",
            MeasurementField::ShoulderToNipple => "shoulderToNipple",
            MeasurementField::ShoulderToUnderbust => "shoulderToUnderbust",
            MeasurementField::ShoulderToWaist => "shoulderToWaist",
            MeasurementField::NippleToNipple => "nippleToNipple",
            MeasurementField::SleeveLength => "sleeveLength",
            MeasurementField::RoundSleeve => "roundSleeve",
            MeasurementField::Hip => "hip",
            MeasurementField::HalfLength => "halfLength",
            MeasurementField::TopLength => "topLength",
            MeasurementField::GownLength => "gownLength",
            MeasurementField::TrouserWaist => "trouserWaist",
            MeasurementField::Crotch => "crotch",
            MeasurementField::TrouserLength => "trouserLength",
            MeasurementField::Thigh => "thigh",
            MeasurementField::WaistToKnee => "waistToKnee",
            MeasurementField::Calf => "calf",
            MeasurementField::Ankle => "ankle",
            MeasurementField::InsideLegSeam => "insideLegSeam",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            MeasurementField::Head => "Head",
            MeasurementField::ShoulderToShoulder => "Shoulder to Shoulder",
            MeasurementField::Neck => "Neck",
            MeasurementField::Chest => "Chest",
            MeasurementField::Waist => "Waist",
            MeasurementField::ShoulderToNipple => "Shoulder to Nipple",
            MeasurementField::ShoulderToUnderbust => "Shoulder to Underbust",
            MeasurementField::ShoulderToWaist => "Shoulder to Waist",
            MeasurementField::NippleToNipple => "Nipple to Nipple",
            MeasurementField::SleeveLength => "Sleeve Length",
            MeasurementField::RoundSleeve => "Round Sleeve",
            MeasurementField::Hip => "Hip",
            MeasurementField::HalfLength => "Half Length",
            MeasurementField::TopLength => "Top Length",
            MeasurementField::GownLength => "Gown Length",
            MeasurementField::TrouserWaist => "Trouser Waist",
            MeasurementField::Crotch => "Crotch",
            MeasurementField::TrouserLength => "Trouser Length",
            MeasurementField::Thigh => "Thigh",
            MeasurementField::WaistToKnee => "Waist to Knee",
            MeasurementField::Calf => "Calf",
            MeasurementField::Ankle => "Ankle",
            MeasurementField::InsideLegSeam => "Inside Leg Seam",
        }
    }

    /// Looks up a field by its persisted key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for MeasurementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Optional body measurements, stored as free-form strings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoulder_to_shoulder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neck: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoulder_to_nipple: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoulder_to_underbust: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoulder_to_waist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nipple_to_nipple: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleeve_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_sleeve: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gown_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trouser_waist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crotch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trouser_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thigh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist_to_knee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ankle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inside_leg_seam: Option<String>,
}

impl Measurements {
    fn slot(&self, field: MeasurementField) -> &Option<String> {
        match field {
            MeasurementField::Head => &self.head,
            MeasurementField::ShoulderToShoulder => &self.shoulder_to_shoulder,
            MeasurementField::Neck => &self.neck,
            MeasurementField::Chest => &self.chest,
            MeasurementField::Waist => &self.waist,
            MeasurementField::ShoulderToNipple => &self.shoulder_to_nipple,
            MeasurementField::ShoulderToUnderbust => &self.shoulder_to_underbust,
            MeasurementField::ShoulderToWaist => &self.shoulder_to_waist,
            MeasurementField::NippleToNipple => &self.nipple_to_nipple,
            MeasurementField::SleeveLength => &self.sleeve_length,
            MeasurementField::RoundSleeve => &self.round_sleeve,
            MeasurementField::Hip => &self.hip,
            MeasurementField::HalfLength => &self.half_length,
            MeasurementField::TopLength => &self.top_length,
            MeasurementField::GownLength => &self.gown_length,
            MeasurementField::TrouserWaist => &self.trouser_waist,
            MeasurementField::Crotch => &self.crotch,
            MeasurementField::TrouserLength => &self.trouser_length,
            MeasurementField::Thigh => &self.thigh,
            MeasurementField::WaistToKnee => &self.waist_to_knee,
            MeasurementField::Calf => &self.calf,
            MeasurementField::Ankle => &self.ankle,
            MeasurementField::InsideLegSeam => &self.inside_leg_seam,
        }
    }

    fn slot_mut(&mut self, field: MeasurementField) -> &mut Option<String> {
        match field {
            MeasurementField::Head => &mut self.head,
            MeasurementField::ShoulderToShoulder => &mut self.shoulder_to_shoulder,
            MeasurementField::Neck => &mut self.neck,
            MeasurementField::Chest => &mut self.chest,
            MeasurementField::Waist => &mut self.waist,
            MeasurementField::ShoulderToNipple => &mut self.shoulder_to_nipple,
            MeasurementField::ShoulderToUnderbust => &mut self.shoulder_to_underbust,
            MeasurementField::ShoulderToWaist => &mut self.shoulder_to_waist,
            MeasurementField::NippleToNipple => &mut self.nipple_to_nipple,
            MeasurementField::SleeveLength => &mut self.sleeve_length,
            MeasurementField::RoundSleeve => &mut self.round_sleeve,
            MeasurementField::Hip => &mut self.hip,
            MeasurementField::HalfLength => &mut self.half_length,
            MeasurementField::TopLength => &mut self.top_length,
            MeasurementField::GownLength => &mut self.gown_length,
            MeasurementField::TrouserWaist => &mut self.trouser_waist,
            MeasurementField::Crotch => &mut self.crotch,
            MeasurementField::TrouserLength => &mut self.trouser_length,
            MeasurementField::Thigh => &mut self.thigh,
            MeasurementField::WaistToKnee => &mut self.waist_to_knee,
            MeasurementField::Calf => &mut self.calf,
            MeasurementField::Ankle => &mut self.ankle,
            MeasurementField::InsideLegSeam => &mut self.inside_leg_seam,
        }
    }

    /// Returns the value of a measurement, treating empty strings as missing
    pub fn get(&self, field: MeasurementField) -> Option<&str> {
        self.slot(field).as_deref().filter(|v| !v.is_empty())
    }

    /// Sets a measurement; empty or whitespace-only values clear it
    pub fn set(&mut self, field: MeasurementField, value: Option<String>) {
        *self.slot_mut(field) = value.filter(|v| !v.trim().is_empty());
    }

    /// Stores a form input as entered: blank input is kept as an empty
    /// value so the key is persisted
    pub fn store_input(&mut self, field: MeasurementField, value: &str) {
        *self.slot_mut(field) = Some(value.trim().to_string());
    }

    /// True if the key was persisted, even with an empty value
    pub fn has(&self, field: MeasurementField) -> bool {
        self.slot(field).is_some()
    }

    /// Iterates over the fields that carry a value, in catalog order
    pub fn present(&self) -> impl Iterator<Item = (MeasurementField, &str)> + '_ {
        MeasurementField::ALL
            .iter()
            .filter_map(move |&f| self.get(f).map(|v| (f, v)))
    }
}

/// One client's measurement entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MeasurementRecord {
    /// Stable identifier; nil on records written before ids existed
    #[serde(default = "Uuid::nil")]
    pub id: RecordId,

    /// Client name
    pub name: String,

    /// Client phone number, kept as entered
    pub phone: String,

    /// Local date/time the record was last saved
    #[serde(default)]
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,

    #[serde(flatten)]
    pub measurements: Measurements,
}

impl MeasurementRecord {
    /// Creates a new record with a fresh id and the current local timestamp
    pub fn new(name: String, phone: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            phone,
            timestamp: timestamp_now(),
            comments: None,
            measurements: Measurements::default(),
        }
    }

    /// Returns the comments if present and non-empty
    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// True if `key` was persisted on this record, even with an empty value.
    /// Records written before every input was saved lack some keys.
    pub fn has_key(&self, key: &str) -> bool {
        match key {
            "name" | "phone" => true,
            "timestamp" => !self.timestamp.is_empty(),
            "comments" => self.comments.is_some(),
            other => MeasurementField::from_key(other).is_some_and(|f| self.measurements.has(f)),
        }
    }

    /// Returns the value stored under a persisted key, if any.
    ///
    /// Covers `name`, `phone`, `timestamp`, `comments` and every measurement key.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(self.name.as_str()).filter(|v| !v.is_empty()),
            "phone" => Some(self.phone.as_str()).filter(|v| !v.is_empty()),
            "timestamp" => Some(self.timestamp.as_str()).filter(|v| !v.is_empty()),
            "comments" => self.comments(),
            other => MeasurementField::from_key(other).and_then(|f| self.measurements.get(f)),
        }
    }
}

/// Formats the current local time the way the record timestamps are shown,
/// e.g. `3/14/2025, 9:05:07 AM`
pub fn timestamp_now() -> String {
    Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_keys_are_unique_and_roundtrip() {
        for field in MeasurementField::ALL {
            assert_eq!(MeasurementField::from_key(field.key()), Some(field));
        }
        assert_eq!(MeasurementField::from_key("name"), None);
    }

    #[test]
    fn test_record_serializes_with_flat_camel_case_keys() {
        let mut record = MeasurementRecord::new("Ada".to_string(), "08012345678".to_string());
        record
            .measurements
            .set(MeasurementField::ShoulderToShoulder, Some("16".to_string()));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["shoulderToShoulder"], "16");
        assert!(json.get("measurements").is_none());
        assert!(json.get("head").is_none());
    }

    #[test]
    fn test_legacy_record_without_id_parses() {
        let raw = r#"{"name":"Bo","phone":"08000000000","timestamp":"1/2/2024, 3:04:05 PM","comments":"","head":"22","neck":""}"#;
        let record: MeasurementRecord = serde_json::from_str(raw).unwrap();
        assert!(record.id.is_nil());
        assert_eq!(record.measurements.get(MeasurementField::Head), Some("22"));
        assert_eq!(record.measurements.get(MeasurementField::Neck), None);
        assert_eq!(record.comments(), None);
    }

    #[test]
    fn test_value_of_covers_all_keys() {
        let mut record = MeasurementRecord::new("Cy".to_string(), "08011112222".to_string());
        record.comments = Some("loose fit".to_string());
        record
            .measurements
            .set(MeasurementField::InsideLegSeam, Some("30".to_string()));

        assert_eq!(record.value_of("name"), Some("Cy"));
        assert_eq!(record.value_of("comments"), Some("loose fit"));
        assert_eq!(record.value_of("insideLegSeam"), Some("30"));
        assert_eq!(record.value_of("calf"), None);
        assert_eq!(record.value_of("unknown"), None);
    }

    #[test]
    fn test_set_blank_clears_measurement() {
        let mut m = Measurements::default();
        m.set(MeasurementField::Hip, Some("40".to_string()));
        m.set(MeasurementField::Hip, Some("  ".to_string()));
        assert_eq!(m.get(MeasurementField::Hip), None);
        assert_eq!(m.present().count(), 0);
    }

    #[test]
    fn test_store_input_keeps_blank_keys() {
        let mut record = MeasurementRecord::new("Di".to_string(), "08012345678".to_string());
        record.measurements.store_input(MeasurementField::Chest, "  ");
        assert!(record.has_key("chest"));
        assert_eq!(record.value_of("chest"), None);
        assert!(!record.has_key("neck"));
        assert!(!record.has_key("comments"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["chest"], "");
        assert!(json.get("neck").is_none());
    }
}
