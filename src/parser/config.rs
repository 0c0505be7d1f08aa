use serde::{Deserialize, Serialize};

/// CSS selectors used to pull structure out of creator, listing and post pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Anchor holding the creator's canonical profile link
    pub creator_link: String,

    /// Element whose text is the creator's display name
    pub creator_name: String,

    /// Paginator text; its last whitespace-separated token is the post count
    pub paginator: String,

    /// Container whose children are post cards on a listing page
    pub post_list: String,

    /// Post description text
    pub description: String,

    /// "Published: YYYY-MM-DD HH:MM:SS" line
    pub published: String,

    /// Containers whose children each carry one download link
    pub file_groups: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            creator_link: "#user-header__info-top > a".to_string(),
            creator_name: "#user-header__info-top > a > span:nth-child(2)".to_string(),
            paginator: "#paginator-top > small".to_string(),
            post_list: "#main > section > div.card-list.card-list--legacy > div.card-list__items"
                .to_string(),
            description: "#page > div > div.post__content > pre".to_string(),
            published: "#page > header > div.post__info > div.post__published".to_string(),
            file_groups: vec![
                "#page > div > div.post__files".to_string(),
                "#page > div > ul.post__attachments".to_string(),
            ],
        }
    }
}
