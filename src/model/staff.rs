use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// Staff member as returned by the portal on PIN login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StaffProfile {
    #[serde(deserialize_with = "string_or_number")]
    #[schema(example = "EMP42")]
    pub id: String,

    #[schema(example = "Vikki")]
    pub name: String,

    #[serde(default)]
    #[schema(example = "staff", nullable = true)]
    pub role: Option<String>,

    #[serde(default)]
    #[schema(example = "Store Manager", nullable = true)]
    pub designation: Option<String>,
}

impl StaffProfile {
    pub fn role(&self) -> Role {
        Role::from_portal(self.role.as_deref().or(self.designation.as_deref()))
    }
}

/// PHP backends are loose about ids; accept `42` as well as `"42"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
