use serde::{Serialize, Serializer};
use serde_json::Value;

/// One item from a project board, exactly as the board-query API sent it.
///
/// Only the id is interpreted (it drives deduplication). Every other field,
/// including ones this crate never asks for, is passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardItem {
    id: String,
    raw: Value,
}

impl BoardItem {
    /// Wrap a raw item. `None` if it carries no usable id: the id must be a
    /// non-empty string or a number.
    pub fn from_value(raw: Value) -> Option<Self> {
        let id = match raw.get("id")? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(Self { id, raw })
    }

    /// Id as a string, whichever form the API used.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.raw.get("name").and_then(Value::as_str)
    }

    /// Display text of one column, if present.
    pub fn column_text(&self, column_id: &str) -> Option<&str> {
        self.raw
            .get("column_values")?
            .as_array()?
            .iter()
            .find(|c| c.get("id").and_then(Value::as_str) == Some(column_id))?
            .get("text")
            .and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.raw
    }
}

impl Serialize for BoardItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// Deduplicated items from every queried board.
///
/// Serializes in the board-query API's own nesting so dashboard code can
/// consume it unchanged:
/// `{"data": {"boards": [{"items_page": {"items": [...]}}]}, "_count": n}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedItems {
    pub items: Vec<BoardItem>,
}

impl AggregatedItems {
    pub fn count(&self) -> usize {
        self.items.len()
    }
}

impl Serialize for AggregatedItems {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Envelope<'a> {
            data: Data<'a>,
            #[serde(rename = "_count")]
            count: usize,
        }
        #[derive(Serialize)]
        struct Data<'a> {
            boards: [Board<'a>; 1],
        }
        #[derive(Serialize)]
        struct Board<'a> {
            items_page: ItemsPage<'a>,
        }
        #[derive(Serialize)]
        struct ItemsPage<'a> {
            items: &'a [BoardItem],
        }

        Envelope {
            data: Data {
                boards: [Board {
                    items_page: ItemsPage { items: &self.items },
                }],
            },
            count: self.count(),
        }
        .serialize(serializer)
    }
}
