//! Discriminated-union inference and codec generation for JSON Schema `oneOf`s.
pub mod schema;
pub mod resolve;
pub mod naming;
pub mod ir;
pub mod union;
pub mod runtime;
pub mod codegen;
pub mod config;
pub mod path_de;
pub mod cli;
