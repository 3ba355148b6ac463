use crate::column::ColumnId;
use crate::profile::UserId;
use chrono::NaiveDate;
use derive_builder::Builder;
use serde_derive::{Deserialize, Serialize};

pub type CardId = String;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub content: String,
    pub done: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, Builder)]
pub struct Card {
    pub id: CardId,
    pub column_id: ColumnId,
    pub card_index: u32,
    pub content: String,
    #[builder(default)]
    pub due_date: Option<NaiveDate>,
    pub assignee_id: UserId,
    #[builder(default)]
    pub tasks: Vec<Subtask>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct CardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_id: Option<ColumnId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Outer None leaves the due date untouched, Some(None) clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Subtask>>,
}

impl CardUpdate {
    pub fn set_column_id(mut self, value: ColumnId) -> Self {
        self.column_id = Some(value);
        self
    }

    pub fn set_card_index(mut self, value: u32) -> Self {
        self.card_index = Some(value);
        self
    }

    pub fn set_content(mut self, value: String) -> Self {
        self.content = Some(value);
        self
    }

    pub fn set_due_date(mut self, value: Option<NaiveDate>) -> Self {
        self.due_date = Some(value);
        self
    }

    pub fn set_assignee_id(mut self, value: UserId) -> Self {
        self.assignee_id = Some(value);
        self
    }

    pub fn set_tasks(mut self, value: Vec<Subtask>) -> Self {
        self.tasks = Some(value);
        self
    }

    pub fn merge_with_card(self, card: &Card) -> Card {
        Card {
            id: card.id.clone(),
            column_id: self.column_id.unwrap_or(card.column_id.clone()),
            card_index: self.card_index.unwrap_or(card.card_index),
            content: self.content.unwrap_or(card.content.clone()),
            due_date: self.due_date.unwrap_or(card.due_date),
            assignee_id: self.assignee_id.unwrap_or(card.assignee_id.clone()),
            tasks: self.tasks.unwrap_or(card.tasks.clone()),
        }
    }

    pub fn into_patch(self) -> eyre::Result<serde_json::Value> {
        serde_json::to_value(self).map_err(From::from)
    }
}
