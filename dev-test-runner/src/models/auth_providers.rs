// Code generated by json-union. DO NOT EDIT.

/// An authentication provider; the "type" property selects which one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthProviders {
    /// Set when `type` is "builtin".
    pub builtin_auth_provider: Option<Box<BuiltinAuthProvider>>,
    /// Set when `type` is "saml".
    pub saml_auth_provider: Option<Box<SAMLAuthProvider>>,
    /// Set when `type` is "openidconnect".
    pub open_id_connect_auth_provider: Option<Box<OpenIDConnectAuthProvider>>,
    /// Set when `type` is "http-header".
    pub http_header_auth_provider: Option<Box<HTTPHeaderAuthProvider>>,
}

impl serde::Serialize for AuthProviders {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as _;
        if let Some(payload) = &self.builtin_auth_provider {
            return serde::Serialize::serialize(payload, serializer);
        }
        if let Some(payload) = &self.saml_auth_provider {
            return serde::Serialize::serialize(payload, serializer);
        }
        if let Some(payload) = &self.open_id_connect_auth_provider {
            return serde::Serialize::serialize(payload, serializer);
        }
        if let Some(payload) = &self.http_header_auth_provider {
            return serde::Serialize::serialize(payload, serializer);
        }
        Err(S::Error::custom("tagged union type must have exactly 1 non-nil field value"))
    }
}

impl<'de> serde::Deserialize<'de> for AuthProviders {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;
        let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
        #[derive(serde::Deserialize)]
        struct Discriminant {
            #[serde(rename = "type")]
            value: String,
        }
        let discriminant = <Discriminant as serde::Deserialize>::deserialize(&value)
            .map_err(D::Error::custom)?;
        let mut out = Self::default();
        match discriminant.value.as_str() {
            "builtin" => {
                out.builtin_auth_provider = Some(Box::new(serde_json::from_value(value).map_err(D::Error::custom)?));
            }
            "saml" => {
                out.saml_auth_provider = Some(Box::new(serde_json::from_value(value).map_err(D::Error::custom)?));
            }
            "openidconnect" => {
                out.open_id_connect_auth_provider = Some(Box::new(serde_json::from_value(value).map_err(D::Error::custom)?));
            }
            "http-header" => {
                out.http_header_auth_provider = Some(Box::new(serde_json::from_value(value).map_err(D::Error::custom)?));
            }
            other => {
                return Err(D::Error::custom(format!("{} (got {other:?})", "tagged union type must have a \"type\" property whose value is one of [\"builtin\", \"saml\", \"openidconnect\", \"http-header\"]")));
            }
        }
        Ok(out)
    }
}
