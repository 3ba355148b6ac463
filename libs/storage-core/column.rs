use crate::card::CardId;
use crate::workspace::WorkspaceId;
use derive_builder::Builder;
use serde_derive::{Deserialize, Serialize};

pub type ColumnId = String;

/// Ordered container of cards. `cards` is the denormalized membership
/// list; `column_id` on the cards themselves stays authoritative.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, Builder)]
pub struct Column {
    pub id: ColumnId,
    pub workspace_id: WorkspaceId,
    pub title: String,
    pub column_index: u32,
    #[builder(default)]
    pub cards: Vec<CardId>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct ColumnUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<CardId>>,
}

impl ColumnUpdate {
    pub fn set_title(mut self, value: String) -> Self {
        self.title = Some(value);
        self
    }

    pub fn set_column_index(mut self, value: u32) -> Self {
        self.column_index = Some(value);
        self
    }

    pub fn set_cards(mut self, value: Vec<CardId>) -> Self {
        self.cards = Some(value);
        self
    }

    pub fn merge_with_column(self, column: &Column) -> Column {
        Column {
            id: column.id.clone(),
            workspace_id: column.workspace_id.clone(),
            title: self.title.unwrap_or(column.title.clone()),
            column_index: self.column_index.unwrap_or(column.column_index),
            cards: self.cards.unwrap_or(column.cards.clone()),
        }
    }

    pub fn into_patch(self) -> eyre::Result<serde_json::Value> {
        serde_json::to_value(self).map_err(From::from)
    }
}
