use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub side_effects: String,
    pub usage_method: String,
}

#[derive(Debug, Clone)]
pub struct NewMedicine {
    pub name: String,
    pub description: String,
    pub side_effects: String,
    pub usage_method: String,
}
