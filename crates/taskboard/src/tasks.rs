//! Task CRUD on `/tasks`, plus moving a task between columns.

use taskboard_protocol::{
    Id, NewTask, RequestSpec, StatusChange, Task, TaskListBody, TaskPage, TaskPatch,
};
use taskboard_transport::HttpTransport;

use crate::boards::require_id;
use crate::{TaskboardClient, TaskboardError};

/// Which page of a task list to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }
}

impl<T: HttpTransport> TaskboardClient<T> {
    /// `GET /tasks?board=..&page=..&limit=..`.
    pub async fn list_tasks(&self, board_id: &Id, page: Page) -> Result<TaskPage, TaskboardError> {
        require_id(board_id, "board")?;
        let spec = RequestSpec::get("/tasks")
            .query("board", board_id)
            .query("page", page.page)
            .query("limit", page.limit);
        let response = self.dispatch(spec).await?;
        let body: TaskListBody = response.json()?;
        Ok(body.into())
    }

    pub async fn get_task(&self, id: &Id) -> Result<Task, TaskboardError> {
        require_id(id, "task")?;
        let response = self.dispatch(RequestSpec::get(format!("/tasks/{id}"))).await?;
        Ok(response.json()?)
    }

    /// Creates a task. Needs a non-blank title and a board id.
    pub async fn create_task(&self, task: NewTask) -> Result<Task, TaskboardError> {
        if task.title.trim().is_empty() {
            return Err(TaskboardError::Invalid("task title is required".into()));
        }
        require_id(&task.board_id, "board")?;
        let response = self
            .dispatch(RequestSpec::post("/tasks").json(&task)?)
            .await?;
        Ok(response.json()?)
    }

    pub async fn update_task(&self, id: &Id, patch: TaskPatch) -> Result<Task, TaskboardError> {
        require_id(id, "task")?;
        let response = self
            .dispatch(RequestSpec::put(format!("/tasks/{id}")).json(&patch)?)
            .await?;
        Ok(response.json()?)
    }

    pub async fn delete_task(&self, id: &Id) -> Result<(), TaskboardError> {
        require_id(id, "task")?;
        self.dispatch(RequestSpec::delete(format!("/tasks/{id}"))).await?;
        Ok(())
    }

    /// Moves a task to another column (`PUT /tasks/{id}/status`).
    pub async fn move_task(&self, id: &Id, status: impl Into<String>) -> Result<Task, TaskboardError> {
        require_id(id, "task")?;
        let status = status.into();
        if status.trim().is_empty() {
            return Err(TaskboardError::Invalid("status is required".into()));
        }
        let response = self
            .dispatch(RequestSpec::put(format!("/tasks/{id}/status")).json(&StatusChange { status })?)
            .await?;
        Ok(response.json()?)
    }
}
