use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub email: Option<String>,
    pub google_ads_id: Option<String>,
    pub meta_ads_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub google_ads_id: Option<String>,
    pub meta_ads_id: Option<String>,
}
