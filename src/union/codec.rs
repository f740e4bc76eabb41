//! Encode/decode procedure construction.
//!
//! Encode: scan slots in model order and serialize the first one that is set; nothing
//! set is `EmptyUnion`. Decode: read only the discriminant, then hand the *whole*
//! payload (discriminant included) to the matching variant.

use serde::{Deserialize, Serialize};

use crate::ir::{Arm, Failure, ProcKind, Procedure, Stmt};

use super::model::UnionModel;

/// What encode does when more than one slot is populated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodePolicy {
    /// Earliest set slot wins; later ones are ignored.
    #[default]
    FirstMatch,
    /// Two or more set slots is `MultipleVariantsSet`.
    Strict,
}

pub fn emit_encode(model: &UnionModel<'_>) -> Procedure {
    emit_encode_with(model, EncodePolicy::FirstMatch)
}

pub fn emit_encode_with(model: &UnionModel<'_>, policy: EncodePolicy) -> Procedure {
    let mut body = Vec::with_capacity(model.variants.len() + 2);
    if policy == EncodePolicy::Strict {
        body.push(Stmt::RequireAtMostOne);
    }
    body.extend((0..model.variants.len()).map(|slot| Stmt::ReturnIfSet { slot }));
    body.push(Stmt::Fail { failure: Failure::EmptyUnion });
    Procedure { kind: ProcKind::Encode, body }
}

pub fn emit_decode(model: &UnionModel<'_>, property: &str) -> Procedure {
    let arms = model
        .variants
        .iter()
        .enumerate()
        .map(|(slot, v)| Arm { tag: v.tag.clone(), slot })
        .collect();
    let accepted = model.tags().map(str::to_string).collect();
    Procedure {
        kind: ProcKind::Decode,
        body: vec![
            Stmt::ReadDiscriminant { property: property.to_string() },
            Stmt::Dispatch { property: property.to_string(), arms, accepted },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::DefaultNamer;
    use crate::resolve::SchemaGraph;
    use crate::union::{analyze::analyze, model::build};
    use serde_json::json;

    fn graph() -> SchemaGraph {
        let branch = |title: &str, tag: &str| {
            json!({
                "title": title,
                "type": "object",
                "properties": { "type": { "type": "string", "enum": [tag] } },
                "required": ["type"]
            })
        };
        SchemaGraph::from_value(json!({
            "title": "Pick",
            "type": "object",
            "oneOf": [ branch("Left", "left"), branch("Right", "right") ]
        }))
        .unwrap()
    }

    #[test]
    fn encode_checks_every_slot_in_order_then_fails() {
        let g = graph();
        let result = analyze(&g, g.root()).unwrap();
        let model = build(&g, &DefaultNamer, g.root(), &result).unwrap();
        let proc_ = emit_encode(&model);
        assert_eq!(proc_.kind, ProcKind::Encode);
        assert_eq!(
            proc_.body,
            vec![
                Stmt::ReturnIfSet { slot: 0 },
                Stmt::ReturnIfSet { slot: 1 },
                Stmt::Fail { failure: Failure::EmptyUnion },
            ]
        );
    }

    #[test]
    fn strict_encode_guards_first() {
        let g = graph();
        let result = analyze(&g, g.root()).unwrap();
        let model = build(&g, &DefaultNamer, g.root(), &result).unwrap();
        let proc_ = emit_encode_with(&model, EncodePolicy::Strict);
        assert_eq!(proc_.body.first(), Some(&Stmt::RequireAtMostOne));
        assert_eq!(proc_.body.len(), 4);
    }

    #[test]
    fn decode_reads_tag_then_dispatches() {
        let g = graph();
        let result = analyze(&g, g.root()).unwrap();
        let model = build(&g, &DefaultNamer, g.root(), &result).unwrap();
        let proc_ = emit_decode(&model, &result.property);
        assert_eq!(proc_.kind, ProcKind::Decode);
        assert_eq!(proc_.body[0], Stmt::ReadDiscriminant { property: "type".into() });
        match &proc_.body[1] {
            Stmt::Dispatch { property, arms, accepted } => {
                assert_eq!(property, "type");
                assert_eq!(arms, &vec![
                    Arm { tag: "left".into(), slot: 0 },
                    Arm { tag: "right".into(), slot: 1 },
                ]);
                assert_eq!(accepted, &["left", "right"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn policy_names_on_the_wire() {
        assert_eq!(serde_json::to_value(EncodePolicy::FirstMatch).unwrap(), json!("first-match"));
        let p: EncodePolicy = serde_json::from_value(json!("strict")).unwrap();
        assert_eq!(p, EncodePolicy::Strict);
    }
}
