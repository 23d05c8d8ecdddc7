//! Board aggregation: items from several project boards merged into one list.
//!
//! Each board is fetched independently and concurrently. A board that fails
//! contributes nothing; the others still land. Merging always follows the
//! configured board order, whichever fetch finishes first.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::BoardConfig;
use crate::error::RelayError;
use crate::models::board::{AggregatedItems, BoardItem};

const ITEMS_QUERY: &str = "query ($ids: [ID!], $limit: Int!) { boards(ids: $ids) { items_page(limit: $limit) { items { id name created_at column_values { id text value } } } } }";

/// Anything that can return the items of one board.
#[async_trait]
pub trait BoardSource: Send + Sync {
    async fn fetch_items(&self, board_id: &str) -> Result<Vec<BoardItem>, RelayError>;
}

#[derive(Debug, Serialize)]
struct BoardQuery<'a> {
    query: &'a str,
    variables: Value,
}

/// Client for the board-query (GraphQL) API.
#[derive(Debug, Clone)]
pub struct BoardClient {
    client: Client,
    api_key: String,
    base_url: String,
    api_version: String,
    page_size: u32,
}

impl BoardClient {
    pub fn new(config: &BoardConfig, api_key: &str) -> Result<Self, RelayError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.clone(),
            api_version: config.api_version.clone(),
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl BoardSource for BoardClient {
    /// First page of items for one board. Missing data in the reply is an
    /// empty board, not an error.
    async fn fetch_items(&self, board_id: &str) -> Result<Vec<BoardItem>, RelayError> {
        let request = BoardQuery {
            query: ITEMS_QUERY,
            variables: json!({ "ids": [board_id], "limit": self.page_size }),
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", &self.api_key)
            .header("API-Version", &self.api_version)
            .json(&request)
            .send()
            .await?;

        let body: Value = response.json().await?;

        if let Some(errors) = body.get("errors") {
            tracing::warn!(board_id = board_id, errors = %errors, "Board query returned errors");
        }

        match body.pointer("/data/boards/0/items_page/items") {
            Some(Value::Array(items)) => Ok(collect_items(board_id, items)),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(RelayError::UnexpectedResponse(format!(
                "board {} items page is not a list: {}",
                board_id, other
            ))),
        }
    }
}

/// Keep every item that has an id; one bad item never costs the whole board.
fn collect_items(board_id: &str, items: &[Value]) -> Vec<BoardItem> {
    let mut kept = Vec::with_capacity(items.len());
    for raw in items {
        match BoardItem::from_value(raw.clone()) {
            Some(item) => kept.push(item),
            None => tracing::warn!(board_id = board_id, item = %raw, "Skipping board item without id"),
        }
    }
    kept
}

/// The board integration, configured or degraded.
#[derive(Clone)]
pub enum BoardAggregator {
    Configured {
        source: Arc<dyn BoardSource>,
        board_ids: Vec<String>,
    },
    Unconfigured,
}

impl BoardAggregator {
    /// Configured only with an API key and at least one board id.
    pub fn from_config(config: &BoardConfig) -> Result<Self, RelayError> {
        let board_ids = config.board_ids();
        match config.api_key() {
            Some(api_key) if !board_ids.is_empty() => {
                let client = BoardClient::new(config, api_key)?;
                Ok(Self::with_source(Arc::new(client), board_ids))
            }
            _ => {
                tracing::warn!("Board API key or board ids missing; board endpoint will be empty");
                Ok(Self::Unconfigured)
            }
        }
    }

    pub fn with_source(source: Arc<dyn BoardSource>, board_ids: Vec<String>) -> Self {
        if board_ids.is_empty() {
            return Self::Unconfigured;
        }
        Self::Configured { source, board_ids }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured { .. })
    }

    /// Fetch every board and merge the results. Never fails as a whole.
    pub async fn aggregate(&self) -> AggregatedItems {
        let (source, board_ids) = match self {
            Self::Configured { source, board_ids } => (source.as_ref(), board_ids),
            Self::Unconfigured => return AggregatedItems::default(),
        };

        let fetches = board_ids.iter().map(|board_id| async move {
            match source.fetch_items(board_id).await {
                Ok(items) => {
                    tracing::debug!(board_id = %board_id, items = items.len(), "Fetched board items");
                    items
                }
                Err(e) => {
                    tracing::warn!(board_id = %board_id, error = %e, "Board fetch failed");
                    Vec::new()
                }
            }
        });

        // join_all yields results in input order, not completion order
        let per_board = join_all(fetches).await;

        AggregatedItems {
            items: merge_board_items(per_board),
        }
    }
}

/// Concatenate per-board item lists and collapse duplicate ids.
///
/// A later occurrence of an id replaces the earlier one in place, so the
/// output keeps first-seen order while carrying last-seen content.
pub fn merge_board_items<I>(boards: I) -> Vec<BoardItem>
where
    I: IntoIterator<Item = Vec<BoardItem>>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<BoardItem> = Vec::new();

    for item in boards.into_iter().flatten() {
        match positions.get(item.id()) {
            Some(&pos) => merged[pos] = item,
            None => {
                positions.insert(item.id().to_string(), merged.len());
                merged.push(item);
            }
        }
    }

    merged
}
