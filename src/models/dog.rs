use serde::{Deserialize, Serialize};

use super::enums::DogSize;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dog {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub breed: Option<String>,
    pub size: DogSize,
    pub temperament: Option<String>,
    pub image_url: Option<String>,
}

/// Display fields denormalized into tracking responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogSummary {
    pub name: String,
    pub image_url: Option<String>,
}

impl From<&Dog> for DogSummary {
    fn from(dog: &Dog) -> Self {
        Self {
            name: dog.name.clone(),
            image_url: dog.image_url.clone(),
        }
    }
}
