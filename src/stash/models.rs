use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a, V> {
    pub query: &'a str,
    pub variables: V,
}

/// Every query aliases its root field to `result`, so one envelope fits all.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<Aliased<T>>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct Aliased<T> {
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entity {
    pub id: String,
}

/// `findStudios` / `findPerformers` result
#[derive(Debug, Deserialize)]
pub struct Found {
    pub count: u32,
    #[serde(alias = "studios", alias = "performers")]
    pub items: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
pub struct SqlResult {
    #[serde(default)]
    pub rows: Vec<MatchRow>,
}

/// `SELECT <object>.id, files.basename, files.size` row
#[derive(Debug, Deserialize)]
pub struct MatchRow(pub SqlId, pub String, pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SqlId {
    Int(i64),
    Text(String),
}

impl fmt::Display for SqlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlId::Int(id) => write!(f, "{}", id),
            SqlId::Text(id) => f.write_str(id),
        }
    }
}

/// A scene or image whose file matched a ledger record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatch {
    pub id: String,
    pub basename: String,
    pub size: u64,
}

impl From<MatchRow> for CatalogMatch {
    fn from(row: MatchRow) -> Self {
        Self {
            id: row.0.to_string(),
            basename: row.1,
            size: row.2,
        }
    }
}

/// Shared shape of `SceneUpdateInput` and `ImageUpdateInput`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateInput {
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio_id: Option<String>,
    pub details: String,
    pub performer_ids: Vec<String>,
}
