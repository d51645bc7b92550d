use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSellerRequest {
    pub name: String,
    #[serde(default)]
    pub mobile_number: String,
    pub address: String,
    pub shop_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSellerRequest {
    pub name: Option<String>,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub shop_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SellerQuery {
    pub search: Option<String>,
}
