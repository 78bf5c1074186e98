//! RDAP domain object model.
//!
//! `RdapRawObject` keeps the upstream JSON exactly as received. `RdapDomain`
//! is a typed view over it where every field is decoded leniently: a missing
//! field, a `null`, or a value of the wrong shape all read as "no value".
//! List fields drop individual malformed elements instead of failing.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The decoded top-level JSON object returned by an RDAP server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RdapRawObject(Map<String, Value>);

impl RdapRawObject {
    /// Wrap a JSON value; only objects are accepted.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Parse a response body. Fails when the body is not a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self, String> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| format!("invalid JSON: {}", e))?;
        let kind = json_kind(&value);
        Self::from_value(value)
            .ok_or_else(|| format!("expected a JSON object, got {}", kind))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Decode the typed, lenient view of this object.
    pub fn domain(&self) -> RdapDomain {
        RdapDomain::deserialize(Value::Object(self.0.clone())).unwrap_or_default()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Typed view of an RDAP domain object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdapDomain {
    #[serde(default, deserialize_with = "lenient")]
    pub ldh_name: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub handle: Option<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub status: Vec<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub events: Vec<RdapEvent>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub nameservers: Vec<RdapNameserver>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub entities: Vec<RdapEntity>,

    #[serde(default, rename = "secureDNS", deserialize_with = "lenient")]
    pub secure_dns: Option<SecureDns>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdapEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub event_action: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub event_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdapNameserver {
    #[serde(default, deserialize_with = "lenient")]
    pub ldh_name: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub unicode_name: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub ip_addresses: Option<IpAddresses>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpAddresses {
    #[serde(default, deserialize_with = "lenient_list")]
    pub v4: Vec<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub v6: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdapEntity {
    #[serde(default, deserialize_with = "lenient")]
    pub handle: Option<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub roles: Vec<String>,

    #[serde(default, deserialize_with = "lenient_vcard")]
    pub vcard_array: Vec<VcardProperty>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub public_ids: Vec<PublicId>,
}

impl RdapEntity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// First vCard property with the given name.
    pub fn vcard_property(&self, name: &str) -> Option<&VcardProperty> {
        self.vcard_array.iter().find(|p| p.name == name)
    }
}

/// `{"type": ..., "identifier": ...}` public identifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicId {
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub id_type: Option<String>,

    /// Some registries send the IANA id as a number.
    #[serde(default, deserialize_with = "lenient_scalar")]
    pub identifier: Option<String>,
}

/// One `[name, params, type, value]` entry of a jCard array.
#[derive(Debug, Clone, PartialEq)]
pub struct VcardProperty {
    pub name: String,
    pub value_type: Option<String>,
    pub value: VcardValue,
}

/// A jCard property value: a single string, a structured list, or anything else.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VcardValue {
    Text(String),
    Structured(Vec<Value>),
    Other(Value),
}

impl VcardValue {
    /// The value when it is a single string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureDns {
    #[serde(default, deserialize_with = "lenient")]
    pub delegation_signed: Option<bool>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub ds_data: Vec<DsData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsData {
    pub key_tag: u32,
    pub algorithm: u32,
    pub digest_type: u32,
    pub digest: String,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| T::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_vcard<'de, D>(deserializer: D) -> Result<Vec<VcardProperty>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_vcard(&value))
}

/// Parse `["vcard", [[name, params, type, value], ...]]`.
fn parse_vcard(value: &Value) -> Vec<VcardProperty> {
    let Some(items) = value
        .as_array()
        .and_then(|outer| outer.get(1))
        .and_then(|inner| inner.as_array())
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let parts = item.as_array()?;
            if parts.len() < 4 {
                return None;
            }
            let name = parts[0].as_str()?.to_lowercase();
            let value_type = parts[2].as_str().map(String::from);
            let value = VcardValue::deserialize(parts[3].clone()).ok()?;
            Some(VcardProperty {
                name,
                value_type,
                value,
            })
        })
        .collect()
}
