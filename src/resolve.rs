//! Schema View and `$ref` resolution.
//!
//! The graph is loaded once per run. Every reference in the document is chased to its
//! canonical (non-reference) target up front and memoized, so lookups during union
//! analysis are plain table reads and never recurse. A reference that cannot be chased
//! is memoized as its error, which surfaces only when a lookup reaches it.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use thiserror::Error;

use crate::schema::Schema;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid schema document: {0}")]
    Parse(String),
    #[error("reference {0:?} does not point at a known definition")]
    Unresolved(String),
    #[error("reference {0:?} is not supported (only local `#/definitions/…` and `#/$defs/…` pointers are)")]
    Unsupported(String),
    #[error("reference cycle: {}", .0.join(" → "))]
    Cycle(Vec<String>),
}

/// Read-only accessor over a resolved schema graph.
///
/// This is the only capability the union core needs from the loader.
pub trait SchemaView {
    /// Follow `node`'s reference (if any) to its canonical schema.
    fn resolve<'s>(&'s self, node: &'s Schema) -> Result<&'s Schema, ResolveError>;

    /// Definition name of `node`, when `node` is a named definition of this graph.
    fn name_of(&self, node: &Schema) -> Option<&str>;

    /// `oneOf` branches of `node`, each already resolved.
    fn one_of<'s>(&'s self, node: &'s Schema) -> Result<Vec<&'s Schema>, ResolveError> {
        node.one_of.iter().map(|branch| self.resolve(branch)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct SchemaGraph {
    root: Schema,
    /// reference text → canonical pointer, or why there is none
    targets: HashMap<String, Result<String, ResolveError>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pointer {
    Root,
    Definitions(String),
    Defs(String),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaGraph {
    pub fn from_value(value: Value) -> Result<Self, ResolveError> {
        let root = Schema::from_value(value).map_err(ResolveError::Parse)?;
        Ok(Self::new(root))
    }

    pub fn new(root: Schema) -> Self {
        let mut refs = Vec::<&str>::new();
        collect_references(&root, &mut refs);

        let mut targets = HashMap::<String, Result<String, ResolveError>>::with_capacity(refs.len());
        for reference in refs {
            if targets.contains_key(reference) {
                continue;
            }
            let target = chase(&root, reference);
            if let Err(error) = &target {
                tracing::debug!(reference, %error, "reference left unresolved");
            }
            targets.insert(reference.to_string(), target);
        }
        tracing::debug!(references = targets.len(), "resolved schema references");

        Self { root, targets }
    }

    pub fn root(&self) -> &Schema {
        &self.root
    }

    /// Nodes marked `x-tagged-union`, root first, then definitions in document order.
    pub fn tagged_unions(&self) -> Vec<&Schema> {
        std::iter::once(&self.root)
            .chain(self.root.definitions.values())
            .chain(self.root.defs.values())
            .filter(|node| node.tagged_union)
            .collect()
    }

    /// Look up a definition by name in either `definitions` or `$defs`.
    pub fn definition(&self, name: &str) -> Option<&Schema> {
        self.root
            .definitions
            .get(name)
            .or_else(|| self.root.defs.get(name))
    }
}

impl SchemaView for SchemaGraph {
    fn resolve<'s>(&'s self, node: &'s Schema) -> Result<&'s Schema, ResolveError> {
        let Some(reference) = node.reference.as_deref() else {
            return Ok(node);
        };
        let canonical = match self.targets.get(reference) {
            Some(Ok(canonical)) => canonical,
            Some(Err(error)) => return Err(error.clone()),
            None => return Err(ResolveError::Unresolved(reference.to_string())),
        };
        let pointer = Pointer::parse(canonical)?;
        lookup(&self.root, &pointer).ok_or_else(|| ResolveError::Unresolved(reference.to_string()))
    }

    fn name_of(&self, node: &Schema) -> Option<&str> {
        self.root
            .definitions
            .iter()
            .chain(self.root.defs.iter())
            .find(|(_, def)| std::ptr::eq(*def, node))
            .map(|(name, _)| name.as_str())
    }
}

impl Pointer {
    fn parse(reference: &str) -> Result<Self, ResolveError> {
        let unsupported = || ResolveError::Unsupported(reference.to_string());
        let Some(path) = reference.strip_prefix('#') else {
            return Err(unsupported());
        };
        if path.is_empty() || path == "/" {
            return Ok(Pointer::Root);
        }
        let mut segments = path.strip_prefix('/').ok_or_else(unsupported)?.split('/');
        let (Some(section), Some(name), None) = (segments.next(), segments.next(), segments.next()) else {
            return Err(unsupported());
        };
        let name = unescape(name);
        match section {
            "definitions" => Ok(Pointer::Definitions(name)),
            "$defs" => Ok(Pointer::Defs(name)),
            _ => Err(unsupported()),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn lookup<'s>(root: &'s Schema, pointer: &Pointer) -> Option<&'s Schema> {
    match pointer {
        Pointer::Root => Some(root),
        Pointer::Definitions(name) => root.definitions.get(name),
        Pointer::Defs(name) => root.defs.get(name),
    }
}

/// Follow a reference through alias chains to the first non-reference node.
fn chase(root: &Schema, reference: &str) -> Result<String, ResolveError> {
    let mut seen = HashSet::<&str>::new();
    let mut trail = Vec::<String>::new();
    let mut current = reference;
    loop {
        if !seen.insert(current) {
            trail.push(current.to_string());
            return Err(ResolveError::Cycle(trail));
        }
        trail.push(current.to_string());
        let pointer = Pointer::parse(current)?;
        let target = lookup(root, &pointer)
            .ok_or_else(|| ResolveError::Unresolved(current.to_string()))?;
        match target.reference.as_deref() {
            Some(next) => current = next,
            None => return Ok(current.to_string()),
        }
    }
}

fn collect_references<'s>(node: &'s Schema, out: &mut Vec<&'s str>) {
    if let Some(reference) = node.reference.as_deref() {
        out.push(reference);
    }
    for branch in &node.one_of {
        collect_references(branch, out);
    }
    for prop in node.properties.iter().flat_map(|props| props.values()) {
        collect_references(prop, out);
    }
    for def in node.definitions.values().chain(node.defs.values()) {
        collect_references(def, out);
    }
}

/// JSON Pointer escapes (RFC 6901): `~1` → `/`, then `~0` → `~`.
fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_definitions_and_defs() {
        let graph = SchemaGraph::from_value(json!({
            "definitions": { "A": { "type": "object", "title": "Alpha" } },
            "$defs": { "B": { "type": "string" } },
            "oneOf": [ { "$ref": "#/definitions/A" }, { "$ref": "#/$defs/B" } ]
        }))
        .unwrap();
        let branches = graph.one_of(graph.root()).unwrap();
        assert_eq!(branches[0].title.as_deref(), Some("Alpha"));
        assert_eq!(graph.name_of(branches[0]), Some("A"));
        assert_eq!(graph.name_of(branches[1]), Some("B"));
    }

    #[test]
    fn follows_alias_chains() {
        let graph = SchemaGraph::from_value(json!({
            "definitions": {
                "Alias": { "$ref": "#/definitions/Target" },
                "Target": { "type": "object", "title": "T" }
            },
            "oneOf": [ { "$ref": "#/definitions/Alias" } ]
        }))
        .unwrap();
        let branches = graph.one_of(graph.root()).unwrap();
        assert_eq!(graph.name_of(branches[0]), Some("Target"));
    }

    #[test]
    fn alias_cycle_is_rejected_on_lookup() {
        let graph = SchemaGraph::from_value(json!({
            "definitions": {
                "A": { "$ref": "#/definitions/B" },
                "B": { "$ref": "#/definitions/A" }
            }
        }))
        .unwrap();
        let err = graph.resolve(graph.definition("B").unwrap()).unwrap_err();
        assert!(matches!(err, ResolveError::Cycle(ref trail) if trail.len() == 3), "{err:?}");
    }

    #[test]
    fn recursive_structure_through_properties_is_fine() {
        // Self-reference behind a property is not an alias cycle.
        let graph = SchemaGraph::from_value(json!({
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": { "next": { "$ref": "#/definitions/Node" } }
                }
            }
        }));
        assert!(graph.is_ok());
    }

    #[test]
    fn unknown_and_remote_references() {
        let graph = SchemaGraph::from_value(json!({ "oneOf": [ { "$ref": "#/definitions/Nope" } ] }))
            .unwrap();
        let err = graph.one_of(graph.root()).unwrap_err();
        assert_eq!(err, ResolveError::Unresolved("#/definitions/Nope".into()));

        let graph = SchemaGraph::from_value(json!({ "oneOf": [ { "$ref": "other.json#/x" } ] }))
            .unwrap();
        let err = graph.one_of(graph.root()).unwrap_err();
        assert_eq!(err, ResolveError::Unsupported("other.json#/x".into()));
    }

    #[test]
    fn bad_reference_does_not_spoil_the_rest_of_the_document() {
        let graph = SchemaGraph::from_value(json!({
            "properties": { "extra": { "$ref": "https://example.com/other.json" } },
            "definitions": {
                "Target": { "type": "object", "title": "T" },
                "Alias": { "$ref": "#/definitions/Target" }
            }
        }))
        .unwrap();
        let alias = graph.resolve(graph.definition("Alias").unwrap()).unwrap();
        assert_eq!(graph.name_of(alias), Some("Target"));

        let extra = graph.root().property("extra").unwrap();
        assert_eq!(
            graph.resolve(extra).unwrap_err(),
            ResolveError::Unsupported("https://example.com/other.json".into())
        );
    }

    #[test]
    fn pointer_segments_are_unescaped() {
        let graph = SchemaGraph::from_value(json!({
            "definitions": { "a/b": { "type": "object" } },
            "oneOf": [ { "$ref": "#/definitions/a~1b" } ]
        }))
        .unwrap();
        let branches = graph.one_of(graph.root()).unwrap();
        assert_eq!(graph.name_of(branches[0]), Some("a/b"));
    }

    #[test]
    fn tagged_unions_in_document_order() {
        let graph = SchemaGraph::from_value(json!({
            "definitions": {
                "Second": { "type": "object", "x-tagged-union": true },
                "Plain": { "type": "object" },
                "Third": { "type": "object", "x-tagged-union": true }
            }
        }))
        .unwrap();
        let names: Vec<_> = graph
            .tagged_unions()
            .into_iter()
            .filter_map(|node| graph.name_of(node))
            .collect();
        assert_eq!(names, ["Second", "Third"]);
    }
}
