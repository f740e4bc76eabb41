//! Discriminant detection.
//!
//! A `oneOf` is taggable when its branches are objects sharing exactly one property,
//! and that property is required, string-typed, and pinned to a single distinct enum
//! literal in every branch.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use thiserror::Error;

use crate::resolve::{ResolveError, SchemaView};
use crate::schema::{Kind, Schema};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("{schema}: a tagged union must be a single-type object schema with at least one `oneOf` branch")]
    NotAUnion { schema: String },

    #[error("{schema}: oneOf branch #{branch} must be an object schema with at least one property")]
    BranchNotAnObject { schema: String, branch: usize },

    #[error("{schema}: no property is shared by every oneOf branch, so there is no discriminant")]
    NoDiscriminantCandidate { schema: String },

    #[error("{schema}: multiple discriminant candidates shared by every branch: {candidates:?}")]
    AmbiguousDiscriminant { schema: String, candidates: Vec<String> },

    #[error("{schema}: discriminant property {property:?} must be required in oneOf branch #{branch}")]
    DiscriminantNotRequired { schema: String, branch: usize, property: String },

    #[error("{schema}: discriminant property {property:?} must be a string in oneOf branch #{branch}")]
    DiscriminantNotString { schema: String, branch: usize, property: String },

    #[error("{schema}: discriminant property {property:?} in oneOf branch #{branch} must have an enum with exactly 1 value (found {found})")]
    DiscriminantNotSingleEnum { schema: String, branch: usize, property: String, found: usize },

    #[error("{schema}: discriminant value {value:?} of property {property:?} is declared by more than one branch")]
    DuplicateTagValue { schema: String, property: String, value: String },

    #[error("{schema}: {source}")]
    Resolve {
        schema: String,
        #[source]
        source: ResolveError,
    },
}

/// The discriminant property plus a bijection tag literal ↔ branch, in branch order.
#[derive(Debug, Clone)]
pub struct DiscriminantResult<'s> {
    pub property: String,
    pub tags: IndexMap<String, &'s Schema>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl<'s> DiscriminantResult<'s> {
    /// Branches in source `oneOf` order.
    pub fn branches(&self) -> impl Iterator<Item = &'s Schema> + '_ {
        self.tags.values().copied()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tag_at(&self, index: usize) -> Option<&str> {
        self.tags.get_index(index).map(|(tag, _)| tag.as_str())
    }
}

pub fn analyze<'s, V>(view: &'s V, union: &'s Schema) -> Result<DiscriminantResult<'s>, AnalysisError>
where
    V: SchemaView + ?Sized,
{
    let schema = display_name(view, union);
    let resolve_err = |source| AnalysisError::Resolve { schema: schema.clone(), source };

    // 1) the union itself
    if !union.is_object() || union.one_of.is_empty() {
        return Err(AnalysisError::NotAUnion { schema });
    }

    // 2) every branch is an object with properties
    let branches = view.one_of(union).map_err(resolve_err)?;
    for (branch, node) in branches.iter().enumerate() {
        if !node.is_object() || !node.has_properties() {
            return Err(AnalysisError::BranchNotAnObject { schema, branch });
        }
    }

    // 3) exactly one property common to all branches
    let Some((first, rest)) = branches.split_first() else {
        return Err(AnalysisError::NotAUnion { schema });
    };
    let mut common: IndexSet<&str> = first.property_names().collect();
    for node in rest {
        common.retain(|name| node.property(name).is_some());
    }
    let property = match common.len() {
        0 => return Err(AnalysisError::NoDiscriminantCandidate { schema }),
        1 => common[0].to_string(),
        _ => {
            let candidates = common.iter().map(|s| s.to_string()).collect();
            return Err(AnalysisError::AmbiguousDiscriminant { schema, candidates });
        }
    };

    // 4) + 5) required, string, single literal, unique across branches
    let mut tags = IndexMap::<String, &'s Schema>::with_capacity(branches.len());
    for (branch, node) in branches.into_iter().enumerate() {
        if !node.is_required(&property) {
            return Err(AnalysisError::DiscriminantNotRequired { schema, branch, property });
        }
        let declared = node
            .property(&property)
            .ok_or_else(|| AnalysisError::NoDiscriminantCandidate { schema: schema.clone() })?;
        let prop = view.resolve(declared).map_err(resolve_err)?;

        if !prop.type_.is_exactly(Kind::String) {
            return Err(AnalysisError::DiscriminantNotString { schema, branch, property });
        }
        let literal = match prop.enum_.as_deref() {
            Some([only]) => only,
            other => {
                let found = other.map_or(0, <[Value]>::len);
                return Err(AnalysisError::DiscriminantNotSingleEnum { schema, branch, property, found });
            }
        };
        let Value::String(tag) = literal else {
            return Err(AnalysisError::DiscriminantNotString { schema, branch, property });
        };
        if tags.contains_key(tag) {
            return Err(AnalysisError::DuplicateTagValue { schema, property, value: tag.clone() });
        }
        tags.insert(tag.clone(), node);
    }

    Ok(DiscriminantResult { property, tags })
}

/// Definition name, else title, for error context.
pub(crate) fn display_name<V: SchemaView + ?Sized>(view: &V, node: &Schema) -> String {
    view.name_of(node)
        .or(node.title.as_deref())
        .unwrap_or("<anonymous schema>")
        .to_string()
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
