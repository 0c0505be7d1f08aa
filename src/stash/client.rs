use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::app::{PartyError, Result};
use crate::stash::models::{
    CatalogMatch, Entity, Found, GraphqlRequest, GraphqlResponse, SqlResult, UpdateInput,
};

const FIND_STUDIO: &str = r#"
query FindStudio($name: String!) {
  result: findStudios(filter: {q: ""}, studio_filter: {name: {value: $name, modifier: EQUALS}}) {
    count
    studios { id }
  }
}"#;

const FIND_PERFORMER: &str = r#"
query FindPerformer($name: String!) {
  result: findPerformers(filter: {q: $name}) {
    count
    performers { id }
  }
}"#;

const CREATE_STUDIO: &str = r#"
mutation CreateStudio($input: StudioCreateInput!) {
  result: studioCreate(input: $input) { id }
}"#;

const CREATE_PERFORMER: &str = r#"
mutation CreatePerformer($input: PerformerCreateInput!) {
  result: performerCreate(input: $input) { id }
}"#;

const QUERY_SQL: &str = r#"
mutation QuerySql($sql: String!, $args: [Any]) {
  result: querySQL(sql: $sql, args: $args) { rows }
}"#;

const UPDATE_SCENE: &str = r#"
mutation UpdateScene($input: SceneUpdateInput!) {
  result: sceneUpdate(input: $input) { id }
}"#;

const UPDATE_IMAGE: &str = r#"
mutation UpdateImage($input: ImageUpdateInput!) {
  result: imageUpdate(input: $input) { id }
}"#;

const SCENE_BY_FILE: &str = "SELECT scenes.id, files.basename, files.size FROM files \
     JOIN scenes_files ON files.id = scenes_files.file_id \
     JOIN scenes ON scenes.id = scenes_files.scene_id \
     WHERE files.basename LIKE ? AND files.size = ?";

const IMAGE_BY_FILE: &str = "SELECT images.id, files.basename, files.size FROM files \
     JOIN images_files ON files.id = images_files.file_id \
     JOIN images ON images.id = images_files.image_id \
     WHERE files.basename LIKE ? AND files.size = ?";

/// GraphQL client for a Stash instance
pub struct StashClient {
    client: Client,
    endpoint: String,
}

impl StashClient {
    pub fn new(host: &str) -> Result<Self> {
        Ok(Self::with_client(Client::builder().build()?, host))
    }

    pub fn with_client(client: Client, host: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/graphql", host.trim_end_matches('/')),
        }
    }

    async fn execute<V: Serialize, T: DeserializeOwned>(&self, query: &str, variables: V) -> Result<T> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PartyError::UnsupportedStatus {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let decoded: GraphqlResponse<T> = serde_json::from_str(&body)
            .map_err(|e| PartyError::Catalog(format!("unexpected response shape: {}", e)))?;

        if !decoded.errors.is_empty() {
            let messages: Vec<_> = decoded.errors.into_iter().map(|e| e.message).collect();
            return Err(PartyError::Catalog(messages.join("; ")));
        }

        decoded
            .data
            .map(|d| d.result)
            .ok_or_else(|| PartyError::Catalog("response carried no data".into()))
    }

    async fn find_or_create(&self, find: &str, create: &str, name: &str, url: &str) -> Result<String> {
        let found: Found = self.execute(find, json!({ "name": name })).await?;
        if found.count > 0 {
            if let Some(entity) = found.items.into_iter().next() {
                return Ok(entity.id);
            }
        }

        let created: Entity = self
            .execute(create, json!({ "input": { "name": name, "url": url } }))
            .await?;
        Ok(created.id)
    }

    pub async fn find_or_create_studio(&self, name: &str, url: &str) -> Result<String> {
        self.find_or_create(FIND_STUDIO, CREATE_STUDIO, name, url).await
    }

    pub async fn find_or_create_performer(&self, name: &str, url: &str) -> Result<String> {
        self.find_or_create(FIND_PERFORMER, CREATE_PERFORMER, name, url).await
    }

    async fn find_by_file(&self, sql: &str, basename: &str, size: u64) -> Result<Option<CatalogMatch>> {
        let pattern = format!("%{}%", basename);
        let result: SqlResult = self
            .execute(QUERY_SQL, json!({ "sql": sql, "args": [pattern, size] }))
            .await?;
        Ok(result.rows.into_iter().next().map(CatalogMatch::from))
    }

    /// Scene whose file name contains `basename` and has exactly `size` bytes
    pub async fn find_scene(&self, basename: &str, size: u64) -> Result<Option<CatalogMatch>> {
        self.find_by_file(SCENE_BY_FILE, basename, size).await
    }

    pub async fn find_image(&self, basename: &str, size: u64) -> Result<Option<CatalogMatch>> {
        self.find_by_file(IMAGE_BY_FILE, basename, size).await
    }

    pub async fn update_scene(&self, input: &UpdateInput) -> Result<String> {
        let updated: Entity = self.execute(UPDATE_SCENE, json!({ "input": input })).await?;
        Ok(updated.id)
    }

    pub async fn update_image(&self, input: &UpdateInput) -> Result<String> {
        let updated: Entity = self.execute(UPDATE_IMAGE, json!({ "input": input })).await?;
        Ok(updated.id)
    }
}
