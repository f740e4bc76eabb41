// Strongly-typed IR handed to emission. No source text here.

use serde::Serialize;

/// Declaration of a tagged-union record: one optional slot per variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnionDecl {
    pub name: String,
    pub doc: Option<String>,
    pub discriminant: String,
    pub slots: Vec<Slot>,   // model order == field order == encode-check order
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub field: String,
    pub payload_type: String,
    pub tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcKind {
    Encode,
    Decode,
}

/// Body of a generated procedure, executed top to bottom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Procedure {
    pub kind: ProcKind,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Stmt {
    /// Fail with `MultipleVariantsSet` if two or more slots are populated.
    RequireAtMostOne,
    /// `if slot is set { return encode(slot) }`
    ReturnIfSet { slot: usize },
    /// Decode only `property` from the input; failure → `DiscriminantDecodeFailure`.
    ReadDiscriminant { property: String },
    /// Route the whole input into the slot whose tag equals the value just read;
    /// no match → `UnknownDiscriminantValue` listing `accepted`.
    Dispatch {
        property: String,
        arms: Vec<Arm>,
        accepted: Vec<String>,
    },
    Fail { failure: Failure },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arm {
    pub tag: String,
    pub slot: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    EmptyUnion,
    MultipleVariantsSet,
}

impl UnionDecl {
    pub fn slot_for_tag(&self, tag: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.tag == tag)
    }
    pub fn accepted_tags(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.tag.clone()).collect()
    }
}
