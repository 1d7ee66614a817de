//! REST `encounter` wire model.
//!
//! An encounter arrives either on its own or inside a list. Lists may be a bare JSON array or
//! a REST page (`{ "results": [...], "links": [...] }`); both are accepted.

use super::observation::{parse_rest_datetime, Observation};
use super::{lenient, lenient_list, non_blank};
use crate::{schema_mismatch, OpenmrsError, OpenmrsResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// REST `encounter` resource (subset used for list views).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub uuid: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub encounter_datetime: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub encounter_type: Option<EncounterTypeRef>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub form: Option<FormRef>,
    /// Malformed entries are dropped; the rest keep their order.
    #[serde(default, deserialize_with = "lenient_list")]
    pub obs: Vec<Observation>,
}

impl Encounter {
    /// Parsed `encounterDatetime`, if present and well formed.
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        self.encounter_datetime
            .as_deref()
            .and_then(parse_rest_datetime)
    }

    pub fn form_label(&self) -> Option<&str> {
        self.form.as_ref().and_then(FormRef::label)
    }

    pub fn encounter_type_label(&self) -> Option<&str> {
        self.encounter_type.as_ref().and_then(EncounterTypeRef::label)
    }
}

/// Reference to the encounter type.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EncounterTypeRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl EncounterTypeRef {
    /// `name`, falling back to `display`.
    pub fn label(&self) -> Option<&str> {
        non_blank(self.name.as_ref()).or_else(|| non_blank(self.display.as_ref()))
    }
}

/// Reference to the form used to capture an encounter.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FormRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl FormRef {
    /// `name`, falling back to `display`.
    pub fn label(&self) -> Option<&str> {
        non_blank(self.name.as_ref()).or_else(|| non_blank(self.display.as_ref()))
    }

    pub fn uuid(&self) -> Option<&str> {
        non_blank(self.uuid.as_ref())
    }
}

/// Parse a single encounter from JSON text.
///
/// # Errors
///
/// Returns [`OpenmrsError::Translation`] naming the failing path when the JSON does not match
/// the encounter wire model.
pub(crate) fn read_json(json: &str) -> OpenmrsResult<Encounter> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|err| schema_mismatch("encounter", err))
}

/// Parse a list of encounters from JSON text.
///
/// # Errors
///
/// Returns [`OpenmrsError`] if:
/// - the text is not JSON,
/// - the document is neither an array nor an object with a `results` array,
/// - an encounter lacks a string `uuid` (the message names the failing path).
///
/// Malformed fields below the encounter level are tolerated; see [`Encounter`].
pub(crate) fn read_list_json(json: &str) -> OpenmrsResult<Vec<Encounter>> {
    let document: Value = serde_json::from_str(json)?;

    let (list, prefix) = match &document {
        Value::Array(_) => (&document, ""),
        Value::Object(map) => match map.get("results") {
            Some(results) if results.is_array() => (results, "results"),
            _ => {
                return Err(OpenmrsError::InvalidInput(
                    "encounter page must contain a 'results' array".into(),
                ))
            }
        },
        _ => {
            return Err(OpenmrsError::InvalidInput(
                "expected an array of encounters or a page with 'results'".into(),
            ))
        }
    };

    serde_path_to_error::deserialize::<_, Vec<Encounter>>(list).map_err(|err| {
        let what = if prefix.is_empty() {
            "encounter list".to_string()
        } else {
            format!("encounter list ({prefix})")
        };
        schema_mismatch(&what, err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCOUNTER: &str = r#"{
        "uuid": "e1",
        "encounterDatetime": "2022-03-01T09:15:00.000+0000",
        "encounterType": { "uuid": "et1", "display": "Labour and delivery" },
        "form": { "uuid": "f1", "name": "Labour & Delivery Form", "display": "L&D" },
        "obs": [
            { "uuid": "o1", "concept": { "uuid": "c1", "name": { "name": "Child name" } }, "value": "RENO" }
        ],
        "links": [{ "rel": "self", "uri": "http://example/ws/rest/v1/encounter/e1" }]
    }"#;

    #[test]
    fn parses_single_encounter_ignoring_rest_links() {
        let encounter = read_json(ENCOUNTER).expect("should parse");
        assert_eq!(encounter.uuid, "e1");
        assert_eq!(encounter.obs.len(), 1);
        assert_eq!(encounter.form_label(), Some("Labour & Delivery Form"));
        assert_eq!(encounter.encounter_type_label(), Some("Labour and delivery"));
        assert_eq!(
            encounter.datetime().map(|d| d.to_string()),
            Some("2022-03-01 09:15:00".to_string())
        );
    }

    #[test]
    fn parses_bare_array_and_rest_page() {
        let array = format!("[{ENCOUNTER}]");
        assert_eq!(read_list_json(&array).expect("array").len(), 1);

        let page = format!(r#"{{ "results": [{ENCOUNTER}, {ENCOUNTER}], "links": [] }}"#);
        assert_eq!(read_list_json(&page).expect("page").len(), 2);
    }

    #[test]
    fn null_obs_is_treated_as_empty() {
        let encounter = read_json(r#"{ "uuid": "e2", "obs": null }"#).expect("should parse");
        assert!(encounter.obs.is_empty());
        assert_eq!(encounter.datetime(), None);
        assert_eq!(encounter.form_label(), None);
    }

    #[test]
    fn schema_mismatch_reports_path() {
        let err = read_list_json(r#"[{ "uuid": "e1" }, { "uuid": 5 }]"#)
            .expect_err("should reject a numeric uuid");
        match err {
            OpenmrsError::Translation(msg) => {
                assert!(msg.contains("[1].uuid"), "unexpected message: {msg}");
            }
            other => panic!("expected Translation error, got {other:?}"),
        }

        let err = read_json(r#"{ "encounterDatetime": "x" }"#).expect_err("uuid is required");
        assert!(matches!(err, OpenmrsError::Translation(msg) if msg.contains("uuid")));
    }

    #[test]
    fn malformed_observation_keeps_sibling_encounters() {
        let list = read_list_json(
            r#"[
                { "uuid": "e1", "obs": [{ "uuid": "o1", "concept": { "uuid": "c1" }, "value": "RENO" }] },
                {
                    "uuid": "e2",
                    "form": "not a form",
                    "obs": [
                        {
                            "uuid": "o2",
                            "voided": "no",
                            "concept": { "uuid": "c2", "name": "VDRL" },
                            "value": "x",
                            "groupMembers": "none"
                        },
                        42
                    ]
                }
            ]"#,
        )
        .expect("malformed observation fields should not reject the list");

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].obs.len(), 1);

        let e2 = &list[1];
        assert_eq!(e2.form, None);
        assert_eq!(e2.obs.len(), 1);
        let obs = &e2.obs[0];
        assert_eq!(obs.concept_uuid(), Some("c2"));
        assert_eq!(obs.concept.as_ref().and_then(|c| c.name.as_ref()), None);
        assert!(!obs.voided);
        assert!(!obs.is_group());
    }

    #[test]
    fn rejects_unexpected_document_shapes() {
        assert!(matches!(
            read_list_json(r#"{ "items": [] }"#),
            Err(OpenmrsError::InvalidInput(_))
        ));
        assert!(matches!(
            read_list_json("42"),
            Err(OpenmrsError::InvalidInput(_))
        ));
        assert!(matches!(
            read_list_json("not json"),
            Err(OpenmrsError::InvalidJson(_))
        ));
    }
}
