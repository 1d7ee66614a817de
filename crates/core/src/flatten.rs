//! Observation flattening for the expanded-row detail panel.
//!
//! An observation tree is walked depth first. Every leaf yields one [`DetailEntry`]; group
//! containers yield nothing themselves and contribute their members' entries in source order.
//! The panel renders entries in this order, so a question stays next to the field after it.

use crate::resolver::{concept_label, display_obs_value};
use obsview_types::Locale;
use openmrs::{ConceptMap, Observation};
use serde::Serialize;

/// One label/value line of the detail panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DetailEntry {
    pub label: String,
    pub value: String,
}

impl DetailEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Flatten one observation into detail entries.
///
/// Voided observations, and everything beneath them, are skipped. A group with an empty
/// member list behaves like a leaf with no value and yields nothing.
pub fn flatten(
    observation: &Observation,
    concept_map: Option<&ConceptMap>,
    locale: Option<&Locale>,
) -> Vec<DetailEntry> {
    let mut entries = Vec::new();
    collect(observation, concept_map, locale, &mut entries);
    entries
}

/// Flatten an encounter's observations, in order.
pub fn flatten_all(
    observations: &[Observation],
    concept_map: Option<&ConceptMap>,
    locale: Option<&Locale>,
) -> Vec<DetailEntry> {
    let mut entries = Vec::new();
    for observation in observations {
        collect(observation, concept_map, locale, &mut entries);
    }
    entries
}

fn collect(
    observation: &Observation,
    concept_map: Option<&ConceptMap>,
    locale: Option<&Locale>,
    out: &mut Vec<DetailEntry>,
) {
    if observation.voided {
        return;
    }

    if observation.is_group() {
        for member in observation.members() {
            collect(member, concept_map, locale, out);
        }
        return;
    }

    if observation.value.is_absent() {
        return;
    }

    if observation.concept_uuid().is_none() {
        tracing::warn!(
            obs = observation.uuid.as_deref().unwrap_or("<unknown>"),
            "observation has no concept uuid"
        );
    }

    out.push(DetailEntry {
        label: concept_label(observation.concept.as_ref()),
        value: display_obs_value(
            &observation.value,
            observation.concept_uuid(),
            concept_map,
            locale,
        ),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use openmrs::ConceptMapEntry;
    use serde_json::{json, Value};

    const PLACENTA_COMPLETE: &str = "163454AAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const POSITIVE: &str = "703AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    fn obs(value: Value) -> Observation {
        serde_json::from_value(value).expect("observation should deserialise")
    }

    fn leaf(uuid: &str, concept: &str, label: &str, value: Value) -> Value {
        json!({
            "uuid": uuid,
            "obsDatetime": "2022-03-01T09:15:00.000+0000",
            "voided": false,
            "concept": { "uuid": concept, "name": { "uuid": format!("{concept}-name"), "name": label } },
            "value": value,
            "groupMembers": null
        })
    }

    fn group(uuid: &str, label: &str, members: Vec<Value>) -> Value {
        json!({
            "uuid": uuid,
            "obsDatetime": "2022-03-01T09:15:00.000+0000",
            "voided": false,
            "concept": { "uuid": format!("{uuid}-concept"), "name": { "uuid": "g", "name": label } },
            "value": null,
            "groupMembers": members
        })
    }

    fn outcome_of_delivery() -> Observation {
        obs(group(
            "delivery",
            "Outcome of delivery",
            vec![
                leaf("o1", "child-name", "Child name", json!("RENO")),
                leaf(
                    "o2",
                    "1587AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
                    "Sex of child",
                    json!({
                        "uuid": "1534AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
                        "name": { "uuid": "m1", "name": "Male Gender" },
                        "names": [
                            { "uuid": "m2", "name": "M", "conceptNameType": "SHORT" },
                            { "uuid": "m1", "name": "Male Gender", "conceptNameType": "FULLY_SPECIFIED" }
                        ]
                    }),
                ),
                group(
                    "apgar",
                    "APGAR scores",
                    vec![
                        leaf("o3", "apgar-1", "APGAR score at 1 minute", json!(9.0)),
                        leaf("o4", "apgar-5", "APGAR score at 5 minutes", json!(9.0)),
                        leaf("o5", "apgar-10", "APGAR score at 10 minutes", json!(10.0)),
                    ],
                ),
            ],
        ))
    }

    #[test]
    fn leaf_emits_exactly_one_entry() {
        let o = obs(leaf("o1", "child-name", "Child name", json!("RENO")));
        assert_eq!(flatten(&o, None, None), vec![DetailEntry::new("Child name", "RENO")]);
    }

    #[test]
    fn delivery_outcome_flattens_leaves_in_order_without_containers() {
        let entries = flatten(&outcome_of_delivery(), None, None);

        assert_eq!(
            entries,
            vec![
                DetailEntry::new("Child name", "RENO"),
                DetailEntry::new("Sex of child", "Male Gender"),
                DetailEntry::new("APGAR score at 1 minute", "9"),
                DetailEntry::new("APGAR score at 5 minutes", "9"),
                DetailEntry::new("APGAR score at 10 minutes", "10"),
            ]
        );
        assert!(entries.iter().all(|e| e.label != "Outcome of delivery"));
        assert!(entries.iter().all(|e| e.label != "APGAR scores"));
    }

    #[test]
    fn group_members_keep_source_order() {
        let g = obs(group(
            "g",
            "Group",
            vec![
                leaf("c", "C", "C", json!("3")),
                leaf("a", "A", "A", json!("1")),
                leaf("b", "B", "B", json!("2")),
            ],
        ));
        let labels: Vec<_> = flatten(&g, None, None).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, ["C", "A", "B"]);
    }

    #[test]
    fn empty_group_and_valueless_leaf_emit_nothing() {
        let empty_group = obs(group("g", "Empty", vec![]));
        assert!(flatten(&empty_group, None, None).is_empty());

        let valueless = obs(leaf("o", "c", "Nothing", Value::Null));
        assert!(flatten(&valueless, None, None).is_empty());
    }

    #[test]
    fn coded_member_resolves_through_concept_map() {
        let g = obs(group(
            "g",
            "Placenta",
            vec![leaf(
                "o",
                PLACENTA_COMPLETE,
                "Placenta complete",
                json!({ "uuid": POSITIVE, "name": { "uuid": "p", "name": "POSITIVE" } }),
            )],
        ));
        let map = ConceptMap::new().with_entry(
            PLACENTA_COMPLETE,
            ConceptMapEntry::new("Placenta complete").with_answer(POSITIVE, "Yes"),
        );

        assert_eq!(
            flatten(&g, Some(&map), None),
            vec![DetailEntry::new("Placenta complete", "Yes")]
        );
        assert_eq!(
            flatten(&g, None, None),
            vec![DetailEntry::new("Placenta complete", "POSITIVE")]
        );
    }

    #[test]
    fn works_at_arbitrary_depth() {
        let mut tree = leaf("deep", "deep", "Deepest", json!("bottom"));
        for level in 0..50 {
            tree = group(&format!("g{level}"), "Level", vec![tree]);
        }
        assert_eq!(
            flatten(&obs(tree), None, None),
            vec![DetailEntry::new("Deepest", "bottom")]
        );
    }

    #[test]
    fn voided_observations_are_skipped() {
        let mut voided = leaf("v", "v", "Voided", json!("hidden"));
        voided["voided"] = json!(true);
        let g = obs(group(
            "g",
            "Group",
            vec![voided, leaf("k", "k", "Kept", json!("shown"))],
        ));
        assert_eq!(flatten(&g, None, None), vec![DetailEntry::new("Kept", "shown")]);
    }

    #[test]
    fn malformed_member_degrades_to_empty_parts() {
        let g = obs(group(
            "g",
            "Group",
            vec![
                json!({ "uuid": "bad", "value": { "name": { "name": "No uuid" } } }),
                json!({ "uuid": "odd", "concept": { "uuid": "odd" }, "value": [1, 2] }),
                leaf("ok", "ok", "Fine", json!("yes")),
            ],
        ));
        assert_eq!(
            flatten(&g, None, None),
            vec![
                DetailEntry::new("", ""),
                DetailEntry::new("odd", ""),
                DetailEntry::new("Fine", "yes"),
            ]
        );
    }

    #[test]
    fn flatten_all_concatenates_in_order_and_is_restartable() {
        let observations = vec![
            obs(leaf("a", "a", "First", json!("1"))),
            outcome_of_delivery(),
            obs(leaf("z", "z", "Last", json!("2"))),
        ];

        let first = flatten_all(&observations, None, None);
        let second = flatten_all(&observations, None, None);
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
        assert_eq!(first.first().map(|e| e.label.as_str()), Some("First"));
        assert_eq!(first.last().map(|e| e.label.as_str()), Some("Last"));
    }
}
