use serde::Deserialize;

/// Filters applied when listing pets
#[derive(Deserialize)]
pub struct PetFilter {
    #[validate(length(min = 1, max = 5))]
    pub kinds: Vec<models::Kind>,
    #[serde(rename = "nameLike", skip_serializing_if = "Option::is_none")]
    pub name_like: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub limit: i32, // @desc "Page size"
}
