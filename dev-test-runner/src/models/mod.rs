//! Typed counterpart of `fixtures/auth-providers.schema.json`.
//!
//! `auth_providers.rs` is `json-union rust` output, checked in as-is; the payload
//! structs below are written by hand, since generating them is not this tool's job.
use serde::{Deserialize, Serialize};

include!("auth_providers.rs");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltinAuthProvider {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_signup: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SAMLAuthProvider {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "identityProviderMetadataURL", default, skip_serializing_if = "Option::is_none")]
    pub identity_provider_metadata_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_provider_metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_provider_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_provider_private_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenIDConnectAuthProvider {
    #[serde(rename = "type")]
    pub kind: String,
    pub issuer: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_email_domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HTTPHeaderAuthProvider {
    #[serde(rename = "type")]
    pub kind: String,
    pub username_header: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_union::cli::resolve_file_path_patterns;
    use json_union::naming::DefaultNamer;
    use json_union::resolve::SchemaGraph;
    use json_union::union::{compile, EncodePolicy};
    use serde_json::{json, Value};

    const SAMPLES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures/samples/auth-providers/*.json");

    fn samples() -> Vec<(String, String)> {
        resolve_file_path_patterns([SAMPLES])
            .unwrap()
            .into_iter()
            .map(|path| {
                let src = std::fs::read_to_string(&path).unwrap();
                (path.display().to_string(), src.trim().to_string())
            })
            .collect()
    }

    fn set_fields(value: &AuthProviders) -> usize {
        [
            value.builtin_auth_provider.is_some(),
            value.saml_auth_provider.is_some(),
            value.open_id_connect_auth_provider.is_some(),
            value.http_header_auth_provider.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    #[test]
    fn known_samples_round_trip_byte_for_byte() {
        let mut checked = 0;
        for (path, src) in samples() {
            if path.ends_with("unknown-tag.json") {
                continue;
            }
            let typed: AuthProviders = serde_json::from_str(&src).unwrap();
            assert_eq!(set_fields(&typed), 1, "{path}");
            assert_eq!(serde_json::to_string(&typed).unwrap(), src, "{path}");
            checked += 1;
        }
        assert_eq!(checked, 4);
    }

    #[test]
    fn typed_and_interpreted_codecs_agree() {
        let graph = SchemaGraph::from_value(
            serde_json::from_str(include_str!("../../../fixtures/auth-providers.schema.json")).unwrap(),
        )
        .unwrap();
        let union = graph.definition("AuthProviders").unwrap();
        let compiled = compile(&graph, &DefaultNamer, union, EncodePolicy::FirstMatch).unwrap();
        let codec = compiled.codec();

        for (path, src) in samples() {
            let input: Value = serde_json::from_str(&src).unwrap();
            match (serde_json::from_value::<AuthProviders>(input.clone()), codec.decode(&input)) {
                (Ok(typed), Ok(interpreted)) => {
                    assert_eq!(serde_json::to_value(&typed).unwrap(), codec.encode(&interpreted).unwrap(), "{path}");
                }
                (Err(typed), Err(interpreted)) => {
                    assert_eq!(typed.to_string(), interpreted.to_string(), "{path}");
                }
                (typed, interpreted) => panic!("{path}: typed {typed:?} vs interpreted {interpreted:?}"),
            }
        }
    }

    #[test]
    fn http_header_scenario() {
        let typed = AuthProviders {
            http_header_auth_provider: Some(Box::new(HTTPHeaderAuthProvider {
                kind: "http-header".into(),
                username_header: "X-User".into(),
            })),
            ..AuthProviders::default()
        };
        let encoded = serde_json::to_string(&typed).unwrap();
        assert_eq!(encoded, r#"{"type":"http-header","usernameHeader":"X-User"}"#);
        assert_eq!(serde_json::from_str::<AuthProviders>(&encoded).unwrap(), typed);
    }

    #[test]
    fn unknown_tag_names_accepted_values() {
        let err = serde_json::from_value::<AuthProviders>(json!({ "type": "github", "token": "t" })).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"tagged union type must have a "type" property whose value is one of ["builtin", "saml", "openidconnect", "http-header"] (got "github")"#
        );
    }

    #[test]
    fn missing_or_non_string_tag_is_rejected() {
        assert!(serde_json::from_value::<AuthProviders>(json!({ "usernameHeader": "X-User" })).is_err());
        assert!(serde_json::from_value::<AuthProviders>(json!({ "type": 7 })).is_err());
    }

    #[test]
    fn empty_union_does_not_serialize() {
        let err = serde_json::to_string(&AuthProviders::default()).unwrap_err();
        assert!(err.to_string().contains("exactly 1 non-nil field value"), "{err}");
    }

    #[test]
    fn bad_payload_is_rejected() {
        assert!(serde_json::from_value::<AuthProviders>(json!({ "type": "http-header" })).is_err());
    }
}
