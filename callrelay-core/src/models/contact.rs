use serde::{Deserialize, Serialize};

/// Contact-creation request sent to the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub location_id: String,
    pub phone: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub source: String,
    pub tags: Vec<String>,
    pub custom_fields: Vec<CustomField>,
}

impl ContactRecord {
    pub fn custom_field(&self, key: &str) -> Option<&str> {
        self.custom_fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub key: String,
    #[serde(rename = "field_value")]
    pub value: String,
}
