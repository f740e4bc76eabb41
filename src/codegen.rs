//! Rust source emission for compiled unions.
//!
//! Walks the procedure IR statement by statement, so the emitted `Serialize` and
//! `Deserialize` impls take the same steps as [`crate::runtime::Codec`].

use thiserror::Error;

use crate::config::GenConfig;
use crate::ir::{Failure, ProcKind, Procedure, Stmt, UnionDecl};
use crate::union::CompiledUnion;

const HEADER: &str = "// Code generated by json-union. DO NOT EDIT.\n";
const BASE_DERIVES: &[&str] = &["Debug", "Clone", "Default", "PartialEq"];
const NOT_EXACTLY_ONE: &str = "tagged union type must have exactly 1 non-nil field value";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("{union}: procedure refers to slot #{slot}, but the union has {len} slots")]
    UnknownSlot { union: String, slot: usize, len: usize },
    #[error("{union}: {kind:?} procedure contains a step it cannot run")]
    MisplacedStep { union: String, kind: ProcKind },
}

pub struct Codegen {
    config: GenConfig,
    out: String,
}

impl Codegen {
    pub fn new(config: GenConfig) -> Self {
        Self { config, out: String::from(HEADER) }
    }

    pub fn emit(&mut self, union: &CompiledUnion) -> Result<(), CodegenError> {
        let mut src = String::new();
        self.emit_struct(&mut src, &union.decl);
        emit_serialize(&mut src, &union.decl, &union.encode)?;
        emit_deserialize(&mut src, &union.decl, &union.decode)?;
        self.out.push('\n');
        self.out.push_str(&src);
        Ok(())
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn emit_struct(&self, out: &mut String, decl: &UnionDecl) {
        if self.config.emit_docs {
            if let Some(doc) = &decl.doc {
                push_doc(out, "", doc);
            }
        }
        let derives = BASE_DERIVES
            .iter()
            .copied()
            .chain(self.config.derives.iter().map(String::as_str).filter(|d| !BASE_DERIVES.contains(d)))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("#[derive({derives})]\n"));
        out.push_str(&format!("pub struct {} {{\n", decl.name));
        for slot in &decl.slots {
            if self.config.emit_docs {
                push_doc(out, "    ", &format!("Set when `{}` is {:?}.", decl.discriminant, slot.tag));
            }
            out.push_str(&format!("    pub {}: Option<Box<{}>>,\n", slot.field, slot.payload_type));
        }
        out.push_str("}\n\n");
    }
}

fn emit_serialize(out: &mut String, decl: &UnionDecl, proc_: &Procedure) -> Result<(), CodegenError> {
    out.push_str(&format!("impl serde::Serialize for {} {{\n", decl.name));
    out.push_str("    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {\n");
    out.push_str("        use serde::ser::Error as _;\n");

    let last = proc_.body.len().saturating_sub(1);
    for (i, stmt) in proc_.body.iter().enumerate() {
        match stmt {
            Stmt::RequireAtMostOne => {
                let checks = decl
                    .slots
                    .iter()
                    .map(|s| format!("self.{}.is_some()", s.field))
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&format!(
                    "        let set = [{checks}].into_iter().filter(|set| *set).count();\n"
                ));
                out.push_str("        if set > 1 {\n");
                out.push_str(&format!(
                    "            return Err(S::Error::custom(format!(\"{{}} (found {{set}} set)\", {:?})));\n",
                    NOT_EXACTLY_ONE
                ));
                out.push_str("        }\n");
            }
            Stmt::ReturnIfSet { slot } => {
                let field = &slot_of(decl, *slot)?.field;
                out.push_str(&format!("        if let Some(payload) = &self.{field} {{\n"));
                out.push_str("            return serde::Serialize::serialize(payload, serializer);\n");
                out.push_str("        }\n");
            }
            Stmt::Fail { failure } => {
                let err = format!("Err(S::Error::custom({:?}))", failure_message(*failure));
                if i == last {
                    out.push_str(&format!("        {err}\n"));
                } else {
                    out.push_str(&format!("        return {err};\n"));
                }
            }
            Stmt::ReadDiscriminant { .. } | Stmt::Dispatch { .. } => {
                return Err(misplaced(decl, proc_.kind));
            }
        }
    }
    out.push_str("    }\n");
    out.push_str("}\n\n");
    Ok(())
}

fn emit_deserialize(out: &mut String, decl: &UnionDecl, proc_: &Procedure) -> Result<(), CodegenError> {
    out.push_str(&format!("impl<'de> serde::Deserialize<'de> for {} {{\n", decl.name));
    out.push_str("    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {\n");
    out.push_str("        use serde::de::Error as _;\n");
    out.push_str("        let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;\n");

    for stmt in &proc_.body {
        match stmt {
            Stmt::ReadDiscriminant { property } => {
                out.push_str("        #[derive(serde::Deserialize)]\n");
                out.push_str("        struct Discriminant {\n");
                out.push_str(&format!("            #[serde(rename = {property:?})]\n"));
                out.push_str("            value: String,\n");
                out.push_str("        }\n");
                out.push_str("        let discriminant = <Discriminant as serde::Deserialize>::deserialize(&value)\n");
                out.push_str("            .map_err(D::Error::custom)?;\n");
            }
            Stmt::Dispatch { property, arms, accepted } => {
                out.push_str("        let mut out = Self::default();\n");
                out.push_str("        match discriminant.value.as_str() {\n");
                for arm in arms {
                    let field = &slot_of(decl, arm.slot)?.field;
                    out.push_str(&format!("            {:?} => {{\n", arm.tag));
                    out.push_str(&format!(
                        "                out.{field} = Some(Box::new(serde_json::from_value(value).map_err(D::Error::custom)?));\n"
                    ));
                    out.push_str("            }\n");
                }
                let unknown = format!(
                    "tagged union type must have a {property:?} property whose value is one of {accepted:?}"
                );
                out.push_str("            other => {\n");
                out.push_str(&format!(
                    "                return Err(D::Error::custom(format!(\"{{}} (got {{other:?}})\", {unknown:?})));\n"
                ));
                out.push_str("            }\n");
                out.push_str("        }\n");
                out.push_str("        Ok(out)\n");
            }
            Stmt::Fail { failure } => {
                out.push_str(&format!(
                    "        return Err(D::Error::custom({:?}));\n",
                    failure_message(*failure)
                ));
            }
            Stmt::RequireAtMostOne | Stmt::ReturnIfSet { .. } => {
                return Err(misplaced(decl, proc_.kind));
            }
        }
    }
    out.push_str("    }\n");
    out.push_str("}\n");
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn slot_of(decl: &UnionDecl, slot: usize) -> Result<&crate::ir::Slot, CodegenError> {
    decl.slots.get(slot).ok_or_else(|| CodegenError::UnknownSlot {
        union: decl.name.clone(),
        slot,
        len: decl.slots.len(),
    })
}

fn misplaced(decl: &UnionDecl, kind: ProcKind) -> CodegenError {
    CodegenError::MisplacedStep { union: decl.name.clone(), kind }
}

fn failure_message(failure: Failure) -> &'static str {
    match failure {
        Failure::EmptyUnion | Failure::MultipleVariantsSet => NOT_EXACTLY_ONE,
    }
}

fn push_doc(out: &mut String, indent: &str, doc: &str) {
    for line in doc.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            out.push_str(&format!("{indent}///\n"));
        } else {
            out.push_str(&format!("{indent}/// {line}\n"));
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::DefaultNamer;
    use crate::resolve::SchemaGraph;
    use crate::union::{compile, EncodePolicy};

    fn render(config: GenConfig) -> String {
        let graph = SchemaGraph::from_value(
            serde_json::from_str(include_str!("../fixtures/auth-providers.schema.json")).unwrap(),
        )
        .unwrap();
        let union = graph.definition("AuthProviders").unwrap();
        let compiled = compile(&graph, &DefaultNamer, union, config.encode_policy).unwrap();
        let mut cg = Codegen::new(config);
        cg.emit(&compiled).unwrap();
        cg.into_string()
    }

    #[test]
    fn struct_has_one_boxed_slot_per_variant_in_order() {
        let src = render(GenConfig::default());
        assert!(src.starts_with(HEADER));
        assert!(src.contains("#[derive(Debug, Clone, Default, PartialEq)]\npub struct AuthProviders {\n"));
        let order = [
            "pub builtin_auth_provider: Option<Box<BuiltinAuthProvider>>,",
            "pub saml_auth_provider: Option<Box<SAMLAuthProvider>>,",
            "pub open_id_connect_auth_provider: Option<Box<OpenIDConnectAuthProvider>>,",
            "pub http_header_auth_provider: Option<Box<HTTPHeaderAuthProvider>>,",
        ];
        let positions: Vec<usize> = order.iter().map(|f| src.find(f).expect(f)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(src.contains("/// Set when `type` is \"http-header\"."));
        assert!(src.contains("/// An authentication provider; the \"type\" property selects which one."));
    }

    #[test]
    fn output_matches_checked_in_typed_models() {
        // dev-test-runner compiles and round-trips this file against the sample payloads
        let checked_in = include_str!("../dev-test-runner/src/models/auth_providers.rs");
        assert_eq!(render(GenConfig::default()), checked_in);
    }

    #[test]
    fn serialize_checks_slots_then_fails() {
        let src = render(GenConfig::default());
        assert!(src.contains("impl serde::Serialize for AuthProviders {"));
        assert!(src.contains("if let Some(payload) = &self.builtin_auth_provider {"));
        assert!(src.contains(
            "        Err(S::Error::custom(\"tagged union type must have exactly 1 non-nil field value\"))\n"
        ));
        assert!(!src.contains("let set = ["));
    }

    #[test]
    fn strict_policy_counts_set_slots() {
        let src = render(GenConfig { encode_policy: EncodePolicy::Strict, ..GenConfig::default() });
        assert!(src.contains("let set = [self.builtin_auth_provider.is_some(), "));
        assert!(src.contains("if set > 1 {"));
    }

    #[test]
    fn deserialize_dispatches_on_discriminant() {
        let src = render(GenConfig::default());
        assert!(src.contains("impl<'de> serde::Deserialize<'de> for AuthProviders {"));
        assert!(src.contains("#[serde(rename = \"type\")]"));
        assert!(src.contains("            \"http-header\" => {\n                out.http_header_auth_provider = Some(Box::new("));
        assert!(src.contains(
            r#"tagged union type must have a \"type\" property whose value is one of [\"builtin\", \"saml\", \"openidconnect\", \"http-header\"]"#
        ));
    }

    #[test]
    fn config_controls_docs_and_derives() {
        let src = render(GenConfig {
            emit_docs: false,
            derives: vec!["Eq".into(), "Debug".into()],
            ..GenConfig::default()
        });
        assert!(!src.contains("/// Set when"));
        assert!(src.contains("#[derive(Debug, Clone, Default, PartialEq, Eq)]"));
    }

    #[test]
    fn out_of_range_slot_is_an_error() {
        let decl = UnionDecl {
            name: "Broken".into(),
            doc: None,
            discriminant: "kind".into(),
            slots: Vec::new(),
        };
        let encode = Procedure { kind: ProcKind::Encode, body: vec![Stmt::ReturnIfSet { slot: 0 }] };
        let mut out = String::new();
        let err = emit_serialize(&mut out, &decl, &encode).unwrap_err();
        assert_eq!(err, CodegenError::UnknownSlot { union: "Broken".into(), slot: 0, len: 0 });
    }
}
