//! Executes encode/decode procedures over `serde_json::Value`.
//!
//! This is the behavior the generated code has, runnable without compiling the
//! generated source. Payloads are kept as raw JSON; validating them against the
//! variant schema is the payload type's job, not the union's.

use serde::de::Error as _;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ir::{Failure, Procedure, Stmt, UnionDecl};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("tagged union type must have exactly 1 non-nil field value")]
    EmptyUnion,

    #[error("tagged union type must have exactly 1 non-nil field value (found {} set: {set:?})", .set.len())]
    MultipleVariantsSet { set: Vec<String> },

    #[error("tagged union type must have a {property:?} property whose value is one of {accepted:?} (got {value:?})")]
    UnknownDiscriminantValue { property: String, value: String, accepted: Vec<String> },

    #[error("cannot decode discriminant property {property:?}: {source}")]
    DiscriminantDecodeFailure {
        property: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid JSON input: {0}")]
    Parse(String),

    #[error("malformed {0} procedure: {1}")]
    MalformedProcedure(&'static str, &'static str),
}

/// In-memory union value: one optional slot per variant, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnionValue {
    pub slots: Vec<Option<Value>>,
}

/// An encode/decode pair bound to the declaration it was built for.
#[derive(Debug, Clone, Copy)]
pub struct Codec<'a> {
    decl: &'a UnionDecl,
    encode: &'a Procedure,
    decode: &'a Procedure,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl UnionValue {
    pub fn empty(width: usize) -> Self {
        Self { slots: vec![None; width] }
    }

    pub fn with(width: usize, slot: usize, payload: Value) -> Self {
        let mut out = Self::empty(width.max(slot + 1));
        out.slots[slot] = Some(payload);
        out
    }

    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn set_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
    }

    pub fn is_empty(&self) -> bool {
        self.set_slots().next().is_none()
    }
}

impl<'a> Codec<'a> {
    pub fn new(decl: &'a UnionDecl, encode: &'a Procedure, decode: &'a Procedure) -> Self {
        Self { decl, encode, decode }
    }

    pub fn decl(&self) -> &'a UnionDecl {
        self.decl
    }

    pub fn empty_value(&self) -> UnionValue {
        UnionValue::empty(self.decl.slots.len())
    }

    /// Value with only the slot for `tag` populated.
    pub fn value_with(&self, tag: &str, payload: Value) -> Option<UnionValue> {
        let slot = self.decl.slot_for_tag(tag)?;
        Some(UnionValue::with(self.decl.slots.len(), slot, payload))
    }

    pub fn encode(&self, value: &UnionValue) -> Result<Value, CodecError> {
        for stmt in &self.encode.body {
            match stmt {
                Stmt::RequireAtMostOne => {
                    let set: Vec<String> = value
                        .set_slots()
                        .map(|i| self.field_name(i))
                        .collect();
                    if set.len() > 1 {
                        return Err(CodecError::MultipleVariantsSet { set });
                    }
                }
                Stmt::ReturnIfSet { slot } => {
                    if let Some(payload) = value.get(*slot) {
                        return Ok(payload.clone());
                    }
                }
                Stmt::Fail { failure } => return Err(self.failure(*failure, value)),
                Stmt::ReadDiscriminant { .. } | Stmt::Dispatch { .. } => {
                    return Err(CodecError::MalformedProcedure("encode", "contains a decode step"));
                }
            }
        }
        Err(CodecError::MalformedProcedure("encode", "falls off the end"))
    }

    pub fn decode(&self, input: &Value) -> Result<UnionValue, CodecError> {
        let mut tag: Option<String> = None;
        for stmt in &self.decode.body {
            match stmt {
                Stmt::ReadDiscriminant { property } => {
                    tag = Some(read_discriminant(input, property)?);
                }
                Stmt::Dispatch { property, arms, accepted } => {
                    let Some(value) = tag.take() else {
                        return Err(CodecError::MalformedProcedure("decode", "dispatches before reading the discriminant"));
                    };
                    let Some(arm) = arms.iter().find(|arm| arm.tag == value) else {
                        return Err(CodecError::UnknownDiscriminantValue {
                            property: property.clone(),
                            value,
                            accepted: accepted.clone(),
                        });
                    };
                    return Ok(UnionValue::with(self.decl.slots.len(), arm.slot, input.clone()));
                }
                Stmt::Fail { failure } => return Err(self.failure(*failure, &self.empty_value())),
                Stmt::RequireAtMostOne | Stmt::ReturnIfSet { .. } => {
                    return Err(CodecError::MalformedProcedure("decode", "contains an encode step"));
                }
            }
        }
        Err(CodecError::MalformedProcedure("decode", "falls off the end"))
    }

    pub fn decode_str(&self, src: &str) -> Result<UnionValue, CodecError> {
        let input: Value = crate::path_de::from_str_with_path(src).map_err(CodecError::Parse)?;
        self.decode(&input)
    }

    fn field_name(&self, slot: usize) -> String {
        self.decl
            .slots
            .get(slot)
            .map(|s| s.field.clone())
            .unwrap_or_else(|| format!("#{slot}"))
    }

    fn failure(&self, failure: Failure, value: &UnionValue) -> CodecError {
        match failure {
            Failure::EmptyUnion => CodecError::EmptyUnion,
            Failure::MultipleVariantsSet => CodecError::MultipleVariantsSet {
                set: value.set_slots().map(|i| self.field_name(i)).collect(),
            },
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Decode just `property` as a string, leaving the rest of the input untouched.
fn read_discriminant(input: &Value, property: &str) -> Result<String, CodecError> {
    let fail = |source| CodecError::DiscriminantDecodeFailure {
        property: property.to_string(),
        source,
    };
    let Some(map) = input.as_object() else {
        let source = Map::<String, Value>::deserialize(input)
            .err()
            .unwrap_or_else(|| serde_json::Error::custom("expected an object"));
        return Err(fail(source));
    };
    let field = map
        .get(property)
        .ok_or_else(|| fail(serde_json::Error::custom(format!("missing field `{property}`"))))?;
    String::deserialize(field).map_err(fail)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
