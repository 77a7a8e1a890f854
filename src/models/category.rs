use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_CATEGORY_COLOR: &str = "#4F46E5";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub color: String,
    pub view_count: i64,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub color: Option<String>,
}
