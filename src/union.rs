//! Discriminated-union inference and codec construction.
//!
//! Pipeline, each stage a pure function of its input:
//!
//! ```text
//! SchemaView ─> analyze ─> build ─> emit_encode / emit_decode ─> (codegen | runtime)
//! ```
//!
//! Nothing here logs or touches I/O; errors are returned to the caller, which decides
//! whether to skip the union or abort the run.
pub mod analyze;
pub mod model;
pub mod codec;

use serde::Serialize;
use thiserror::Error;

use crate::ir::{Procedure, UnionDecl};
use crate::naming::NameDeriver;
use crate::resolve::SchemaView;
use crate::schema::Schema;

pub use analyze::{analyze, AnalysisError, DiscriminantResult};
pub use codec::{emit_decode, emit_encode, emit_encode_with, EncodePolicy};
pub use model::{build, BuildError, UnionModel, Variant};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnionError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Owned output of the whole pipeline for one union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledUnion {
    pub decl: UnionDecl,
    pub encode: Procedure,
    pub decode: Procedure,
}

pub fn compile<V, N>(
    view: &V,
    namer: &N,
    union: &Schema,
    policy: EncodePolicy,
) -> Result<CompiledUnion, UnionError>
where
    V: SchemaView + ?Sized,
    N: NameDeriver + ?Sized,
{
    let result = analyze(view, union)?;
    let model = build(view, namer, union, &result)?;
    Ok(CompiledUnion {
        decl: model.decl(),
        encode: emit_encode_with(&model, policy),
        decode: emit_decode(&model, &result.property),
    })
}

impl CompiledUnion {
    pub fn codec(&self) -> crate::runtime::Codec<'_> {
        crate::runtime::Codec::new(&self.decl, &self.encode, &self.decode)
    }
}
