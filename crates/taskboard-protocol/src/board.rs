//! Board, task, and AI-suggestion wire types.
//!
//! These are plain data carriers for the CRUD endpoints. Unknown fields
//! are ignored on decode so a backend adding columns doesn't break us.

use serde::{Deserialize, Serialize};

use crate::Id;

// ---------------------------------------------------------------------------
// Boards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /boards`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBoard {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `PUT /boards/{id}`. Only the set fields are sent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Column the task sits in (`"todo"`, `"in-progress"`, ...). The set
    /// of columns is defined by the board, not by this client.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, alias = "board")]
    pub board_id: Option<Id>,
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub board_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Body of `PUT /tasks/{id}`. Only the set fields are sent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Body of `PUT /tasks/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

/// Pagination info some backends attach to list responses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// `GET /tasks` comes back in one of three shapes depending on the
/// backend: `{ items, meta }`, `{ tasks, pagination }`, or a bare array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TaskListBody {
    Items {
        items: Vec<Task>,
        #[serde(default, alias = "pagination")]
        meta: Option<PageMeta>,
    },
    Tasks {
        tasks: Vec<Task>,
        #[serde(default, alias = "pagination")]
        meta: Option<PageMeta>,
    },
    Bare(Vec<Task>),
}

/// A normalized page of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub meta: Option<PageMeta>,
}

impl From<TaskListBody> for TaskPage {
    fn from(body: TaskListBody) -> Self {
        match body {
            TaskListBody::Items { items, meta } => Self { tasks: items, meta },
            TaskListBody::Tasks { tasks, meta } => Self { tasks, meta },
            TaskListBody::Bare(tasks) => Self { tasks, meta: None },
        }
    }
}

// ---------------------------------------------------------------------------
// AI suggestions
// ---------------------------------------------------------------------------

/// Body of `POST /ai/suggestions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub suggestion: String,
}

/// Either `{ suggestions: [...] }` or a bare array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SuggestionListBody {
    Wrapped { suggestions: Vec<Suggestion> },
    Bare(Vec<Suggestion>),
}

impl SuggestionListBody {
    pub fn into_vec(self) -> Vec<Suggestion> {
        match self {
            Self::Wrapped { suggestions } => suggestions,
            Self::Bare(suggestions) => suggestions,
        }
    }
}
