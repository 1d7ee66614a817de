//! REST `obs` wire model and value classification.
//!
//! Responsibilities:
//! - Define a lenient wire model (`Observation`) for the REST observation representation,
//!   including nested `groupMembers`.
//! - Classify the untyped `value` field exactly once, at deserialisation, into [`ObsValue`].
//!
//! Notes:
//! - The REST API returns `value` as a string, a number, `null`, or a concept object. Date
//!   values arrive as strings, so strings that parse as a REST date-time are classified as
//!   [`ObsValue::Date`].
//! - Serialisation writes each value back in its raw JSON form.

use super::{lenient, lenient_optional_list, non_blank};
use crate::constants::{FULLY_SPECIFIED, REST_DATE_FORMAT, REST_DATETIME_FORMAT};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// REST `obs` resource (subset used for display).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub obs_datetime: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub voided: bool,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub concept: Option<ConceptRef>,
    #[serde(default)]
    pub value: ObsValue,
    #[serde(
        default,
        deserialize_with = "lenient_optional_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_members: Option<Vec<Observation>>,
}

impl Observation {
    /// The question concept's uuid, if present and non-blank.
    pub fn concept_uuid(&self) -> Option<&str> {
        self.concept.as_ref().and_then(ConceptRef::uuid)
    }

    /// Child observations in source order. Empty for leaves.
    pub fn members(&self) -> &[Observation] {
        self.group_members.as_deref().unwrap_or_default()
    }

    /// Returns `true` when this observation is a container for group members.
    pub fn is_group(&self) -> bool {
        self.group_members.is_some()
    }

    /// Parsed `obsDatetime`, if present and well formed.
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        self.obs_datetime.as_deref().and_then(parse_rest_datetime)
    }
}

/// Reference to a concept (the question an observation answers).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptRef {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<ConceptName>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl ConceptRef {
    pub fn uuid(&self) -> Option<&str> {
        non_blank(self.uuid.as_ref())
    }

    /// The concept's own `name.name`, if present and non-blank.
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(ConceptName::text)
    }

    pub fn display(&self) -> Option<&str> {
        non_blank(self.display.as_ref())
    }
}

/// REST `conceptName` reference.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ConceptName {
    pub fn text(&self) -> Option<&str> {
        non_blank(self.name.as_ref())
    }
}

/// One of the alternate names of a concept.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_name_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale_preferred: Option<bool>,
}

impl LocalizedName {
    pub fn text(&self) -> Option<&str> {
        non_blank(self.name.as_ref())
    }

    /// Returns `true` when tagged as the canonical (`FULLY_SPECIFIED`) name.
    pub fn is_fully_specified(&self) -> bool {
        self.concept_name_type
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(FULLY_SPECIFIED))
    }

    pub fn locale(&self) -> Option<&str> {
        non_blank(self.locale.as_ref())
    }

    /// Returns `true` when the server marks this as the preferred name for its locale.
    pub fn is_locale_preferred(&self) -> bool {
        self.locale_preferred.unwrap_or(false)
    }
}

/// An observation value that is itself a concept (an answer).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CodedValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<ConceptName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<LocalizedName>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl CodedValue {
    pub fn uuid(&self) -> Option<&str> {
        non_blank(self.uuid.as_ref())
    }

    /// The top-level canonical `name.name`.
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(ConceptName::text)
    }

    pub fn names(&self) -> &[LocalizedName] {
        self.names.as_deref().unwrap_or_default()
    }

    pub fn display(&self) -> Option<&str> {
        non_blank(self.display.as_ref())
    }
}

/// A primitive observation value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    Text(String),
    Number(Number),
    Boolean(bool),
}

impl Primitive {
    /// The value as it should appear on screen (`9`, not `9.0`, for integral numbers).
    pub fn display(&self) -> String {
        match self {
            Primitive::Text(text) => text.clone(),
            Primitive::Number(number) => match number.as_f64() {
                Some(value)
                    if number.is_f64()
                        && value.fract() == 0.0
                        && value >= i64::MIN as f64
                        && value < i64::MAX as f64 =>
                {
                    (value as i64).to_string()
                }
                _ => number.to_string(),
            },
            Primitive::Boolean(flag) => flag.to_string(),
        }
    }
}

/// A date or date-time observation value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateValue {
    /// The string exactly as received.
    pub raw: String,
    /// Wall-clock time in the offset the server reported.
    pub datetime: NaiveDateTime,
}

/// Classified observation value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ObsValue {
    /// `null`; the observation is a group container or has no answer.
    #[default]
    Absent,
    Primitive(Primitive),
    Date(DateValue),
    Coded(CodedValue),
    /// Any other shape (arrays, objects that are not concepts). Kept raw so it survives
    /// serialisation; never displayed.
    Unsupported(Value),
}

impl ObsValue {
    /// Classify a raw REST `value`.
    pub fn classify(raw: Value) -> Self {
        match raw {
            Value::Null => ObsValue::Absent,
            Value::Bool(flag) => ObsValue::Primitive(Primitive::Boolean(flag)),
            Value::Number(number) => ObsValue::Primitive(Primitive::Number(number)),
            Value::String(text) => match parse_rest_datetime(&text) {
                Some(datetime) => ObsValue::Date(DateValue {
                    raw: text,
                    datetime,
                }),
                None => ObsValue::Primitive(Primitive::Text(text)),
            },
            Value::Object(ref map) if looks_like_concept(map) => {
                match CodedValue::deserialize(&raw) {
                    Ok(coded) => ObsValue::Coded(coded),
                    Err(err) => {
                        tracing::debug!("concept-shaped obs value did not parse: {err}");
                        ObsValue::Unsupported(raw)
                    }
                }
            }
            other => ObsValue::Unsupported(other),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ObsValue::Absent)
    }

    pub fn as_coded(&self) -> Option<&CodedValue> {
        match self {
            ObsValue::Coded(coded) => Some(coded),
            _ => None,
        }
    }
}

fn looks_like_concept(map: &serde_json::Map<String, Value>) -> bool {
    ["uuid", "name", "names", "display"]
        .iter()
        .any(|key| map.contains_key(*key))
}

impl<'de> Deserialize<'de> for ObsValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(ObsValue::classify(raw))
    }
}

impl Serialize for ObsValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ObsValue::Absent => serializer.serialize_none(),
            ObsValue::Primitive(Primitive::Text(text)) => serializer.serialize_str(text),
            ObsValue::Primitive(Primitive::Number(number)) => number.serialize(serializer),
            ObsValue::Primitive(Primitive::Boolean(flag)) => serializer.serialize_bool(*flag),
            ObsValue::Date(date) => serializer.serialize_str(&date.raw),
            ObsValue::Coded(coded) => coded.serialize(serializer),
            ObsValue::Unsupported(raw) => raw.serialize(serializer),
        }
    }
}

/// Parse a REST date or date-time string.
///
/// Accepts RFC 3339, the REST layout (`2023-05-12T08:30:00.000+0000`) and bare dates
/// (`2023-05-12`, read as midnight). Returns the wall-clock time in the reported offset.
pub fn parse_rest_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }

    if let Ok(parsed) = DateTime::parse_from_str(raw, REST_DATETIME_FORMAT) {
        return Some(parsed.naive_local());
    }

    NaiveDate::parse_from_str(raw, REST_DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obs(value: Value) -> Observation {
        serde_json::from_value(value).expect("observation should deserialise")
    }

    #[test]
    fn classifies_text_and_numbers_as_primitives() {
        let text = obs(json!({ "uuid": "o1", "value": "RENO" }));
        assert_eq!(
            text.value,
            ObsValue::Primitive(Primitive::Text("RENO".into()))
        );

        let number = obs(json!({ "uuid": "o2", "value": 9 }));
        match &number.value {
            ObsValue::Primitive(p) => assert_eq!(p.display(), "9"),
            other => panic!("expected primitive, got {other:?}"),
        }

        let decimal = obs(json!({ "uuid": "o3", "value": 36.6 }));
        match &decimal.value {
            ObsValue::Primitive(p) => assert_eq!(p.display(), "36.6"),
            other => panic!("expected primitive, got {other:?}"),
        }

        let whole_double = obs(json!({ "uuid": "o4", "value": 9.0 }));
        match &whole_double.value {
            ObsValue::Primitive(p) => assert_eq!(p.display(), "9"),
            other => panic!("expected primitive, got {other:?}"),
        }

        let negative_double = obs(json!({ "uuid": "o5", "value": -2.0 }));
        match &negative_double.value {
            ObsValue::Primitive(p) => assert_eq!(p.display(), "-2"),
            other => panic!("expected primitive, got {other:?}"),
        }
    }

    #[test]
    fn classifies_rest_datetimes_as_dates() {
        let o = obs(json!({ "uuid": "o1", "value": "2021-09-15T00:00:00.000+0000" }));
        let ObsValue::Date(date) = &o.value else {
            panic!("expected date, got {:?}", o.value);
        };
        assert_eq!(date.raw, "2021-09-15T00:00:00.000+0000");
        assert_eq!(date.datetime.date().to_string(), "2021-09-15");

        let rfc = obs(json!({ "value": "2021-09-15T10:30:00+02:00" }));
        assert!(matches!(rfc.value, ObsValue::Date(_)));

        let bare = obs(json!({ "value": "2021-09-15" }));
        assert!(matches!(bare.value, ObsValue::Date(_)));

        let not_a_date = obs(json!({ "value": "2021 was a year" }));
        assert!(matches!(not_a_date.value, ObsValue::Primitive(Primitive::Text(_))));
    }

    #[test]
    fn classifies_concept_objects_as_coded() {
        let o = obs(json!({
            "uuid": "o1",
            "concept": { "uuid": "299AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "name": { "uuid": "n1", "name": "VDRL" } },
            "value": {
                "uuid": "664AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
                "name": { "uuid": "n2", "name": "NEGATIVE" },
                "names": [
                    { "uuid": "n3", "name": "NEGATIVE", "conceptNameType": "FULLY_SPECIFIED" },
                    { "uuid": "n4", "name": "neg", "conceptNameType": null }
                ]
            }
        }));

        let coded = o.value.as_coded().expect("coded value");
        assert_eq!(coded.uuid(), Some("664AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"));
        assert_eq!(coded.name(), Some("NEGATIVE"));
        assert_eq!(coded.names().len(), 2);
        assert!(coded.names()[0].is_fully_specified());
        assert!(!coded.names()[1].is_fully_specified());
        assert_eq!(o.concept_uuid(), Some("299AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"));
    }

    #[test]
    fn unexpected_shapes_are_unsupported_not_errors() {
        let array = obs(json!({ "value": [1, 2] }));
        assert!(matches!(array.value, ObsValue::Unsupported(_)));

        let wrong_object = obs(json!({ "value": { "foo": "bar" } }));
        assert!(matches!(wrong_object.value, ObsValue::Unsupported(_)));

        let bad_coded = obs(json!({ "value": { "uuid": 12, "name": "x" } }));
        assert!(matches!(bad_coded.value, ObsValue::Unsupported(_)));
    }

    #[test]
    fn missing_and_null_fields_are_tolerated() {
        let o = obs(json!({ "voided": null, "value": null, "groupMembers": null }));
        assert!(!o.voided);
        assert!(o.value.is_absent());
        assert!(!o.is_group());
        assert!(o.members().is_empty());
        assert_eq!(o.concept_uuid(), None);

        let blank_uuid = obs(json!({ "concept": { "uuid": "  " } }));
        assert_eq!(blank_uuid.concept_uuid(), None);
    }

    #[test]
    fn malformed_fields_fall_back_to_defaults() {
        let o = obs(json!({
            "uuid": 7,
            "voided": "no",
            "concept": { "uuid": "c1", "name": "VDRL", "display": ["x"] },
            "value": "kept",
            "groupMembers": [{ "uuid": "m1", "value": "A" }, "junk", { "uuid": "m2", "value": "B" }]
        }));

        assert_eq!(o.uuid, None);
        assert!(!o.voided);
        assert_eq!(o.concept_uuid(), Some("c1"));
        assert_eq!(o.concept.as_ref().and_then(ConceptRef::name), None);
        assert_eq!(o.value, ObsValue::Primitive(Primitive::Text("kept".into())));

        let ids: Vec<_> = o.members().iter().filter_map(|m| m.uuid.as_deref()).collect();
        assert_eq!(ids, ["m1", "m2"]);

        let not_a_list = obs(json!({ "uuid": "g", "groupMembers": { "uuid": "m" } }));
        assert!(!not_a_list.is_group());
    }

    #[test]
    fn group_members_keep_source_order() {
        let group = obs(json!({
            "uuid": "g",
            "value": null,
            "groupMembers": [
                { "uuid": "a", "value": "A" },
                { "uuid": "b", "value": "B" },
                { "uuid": "c", "value": "C" }
            ]
        }));

        let ids: Vec<_> = group
            .members()
            .iter()
            .map(|m| m.uuid.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(group.is_group());
    }

    #[test]
    fn serialises_values_in_raw_form() {
        let raw = json!({
            "uuid": "o1",
            "obsDatetime": "2021-09-15T00:00:00.000+0000",
            "voided": false,
            "value": "2021-09-15T00:00:00.000+0000"
        });
        let o = obs(raw.clone());
        assert_eq!(serde_json::to_value(&o).expect("serialise"), raw);
        assert!(o.recorded_at().is_some());
    }
}
