use serde::{Deserialize, Serialize};

/// Placeholder first name when the backend reports none.
const DEFAULT_FIRST_NAME: &str = "User";

/// Profile of the signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Me {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Me {
    /// Build a profile from a single display name: the first word is the
    /// first name, the rest is the last name.
    pub fn from_display_name(id: impl Into<String>, name: &str) -> Self {
        let mut parts = name.split_whitespace();
        let first_name = parts.next().unwrap_or(DEFAULT_FIRST_NAME).to_string();
        let last_name = parts.collect::<Vec<_>>().join(" ");
        Self {
            id: id.into(),
            first_name,
            last_name,
        }
    }
}
