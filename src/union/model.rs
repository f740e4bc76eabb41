//! Union model construction: one named variant per `oneOf` branch.
//!
//! Names come from the [`NameDeriver`]; collisions are reported, never renamed away.

use std::collections::HashMap;

use thiserror::Error;

use crate::ir::{Slot, UnionDecl};
use crate::naming::{NameDeriver, NamingError};
use crate::resolve::SchemaView;
use crate::schema::Schema;

use super::analyze::{display_name, DiscriminantResult};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("{union}: variants #{first} and #{second} both derive the identifier {name:?}")]
    VariantNamingConflict { union: String, name: String, first: usize, second: usize },

    #[error("{union}: cannot name the union type: {source}")]
    UnionNaming {
        union: String,
        #[source]
        source: NamingError,
    },

    #[error("{union}: cannot name oneOf branch #{branch}: {source}")]
    VariantNaming {
        union: String,
        branch: usize,
        #[source]
        source: NamingError,
    },
}

#[derive(Debug, Clone)]
pub struct Variant<'s> {
    /// Type identifier, also the payload type.
    pub name: String,
    /// Slot identifier in the union record.
    pub field: String,
    pub payload: &'s Schema,
    pub tag: String,
}

/// Variants keep the source `oneOf` order: it is both field order and encode order.
#[derive(Debug, Clone)]
pub struct UnionModel<'s> {
    pub name: String,
    pub doc: Option<String>,
    pub discriminant: String,
    pub variants: Vec<Variant<'s>>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

pub fn build<'s, V, N>(
    view: &V,
    namer: &N,
    union: &'s Schema,
    result: &DiscriminantResult<'s>,
) -> Result<UnionModel<'s>, BuildError>
where
    V: SchemaView + ?Sized,
    N: NameDeriver + ?Sized,
{
    let union_label = display_name(view, union);

    let name = namer
        .type_name(union, view.name_of(union))
        .map_err(|source| BuildError::UnionNaming { union: union_label.clone(), source })?;

    let mut variants = Vec::<Variant<'s>>::with_capacity(result.len());
    let mut taken = HashMap::<String, usize>::new();
    for (index, (tag, payload)) in result.tags.iter().enumerate() {
        let naming = |source| BuildError::VariantNaming {
            union: union_label.clone(),
            branch: index,
            source,
        };
        let variant_name = namer.type_name(payload, view.name_of(payload)).map_err(naming)?;
        let field = namer.field_name(&variant_name).map_err(naming)?;

        for ident in [&variant_name, &field] {
            if let Some(&first) = taken.get(ident.as_str()) {
                if first != index {
                    return Err(BuildError::VariantNamingConflict {
                        union: union_label,
                        name: ident.clone(),
                        first,
                        second: index,
                    });
                }
            }
            taken.insert(ident.clone(), index);
        }

        variants.push(Variant {
            name: variant_name,
            field,
            payload,
            tag: tag.clone(),
        });
    }

    Ok(UnionModel {
        name,
        doc: union.description.clone().or_else(|| union.title.clone()),
        discriminant: result.property.clone(),
        variants,
    })
}

impl UnionModel<'_> {
    pub fn decl(&self) -> UnionDecl {
        UnionDecl {
            name: self.name.clone(),
            doc: self.doc.clone(),
            discriminant: self.discriminant.clone(),
            slots: self
                .variants
                .iter()
                .map(|v| Slot {
                    field: v.field.clone(),
                    payload_type: v.name.clone(),
                    tag: v.tag.clone(),
                })
                .collect(),
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.tag.as_str())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
