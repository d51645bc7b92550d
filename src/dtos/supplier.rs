use serde::Deserialize;

fn default_category() -> String {
    "Tomato".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierRequest {
    pub name: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_category")]
    pub product_category: String,
    pub plant_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupplierRequest {
    pub name: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub product_category: Option<String>,
    pub plant_name: Option<String>,
}
