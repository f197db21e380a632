//! Board CRUD on `/boards`.

use taskboard_protocol::{Board, BoardPatch, Id, NewBoard, RequestSpec};
use taskboard_transport::HttpTransport;

use crate::{TaskboardClient, TaskboardError};

impl<T: HttpTransport> TaskboardClient<T> {
    pub async fn list_boards(&self) -> Result<Vec<Board>, TaskboardError> {
        let response = self.dispatch(RequestSpec::get("/boards")).await?;
        Ok(response.json()?)
    }

    pub async fn get_board(&self, id: &Id) -> Result<Board, TaskboardError> {
        require_id(id, "board")?;
        let response = self.dispatch(RequestSpec::get(format!("/boards/{id}"))).await?;
        Ok(response.json()?)
    }

    /// Creates a board. The title must be non-blank; otherwise nothing
    /// is sent.
    pub async fn create_board(&self, board: NewBoard) -> Result<Board, TaskboardError> {
        if board.title.trim().is_empty() {
            return Err(TaskboardError::Invalid("board title is required".into()));
        }
        let response = self
            .dispatch(RequestSpec::post("/boards").json(&board)?)
            .await?;
        Ok(response.json()?)
    }

    pub async fn update_board(&self, id: &Id, patch: BoardPatch) -> Result<Board, TaskboardError> {
        require_id(id, "board")?;
        let response = self
            .dispatch(RequestSpec::put(format!("/boards/{id}")).json(&patch)?)
            .await?;
        Ok(response.json()?)
    }

    pub async fn delete_board(&self, id: &Id) -> Result<(), TaskboardError> {
        require_id(id, "board")?;
        self.dispatch(RequestSpec::delete(format!("/boards/{id}"))).await?;
        Ok(())
    }
}

/// Rejects blank string ids before they turn into `/boards/`.
pub(crate) fn require_id(id: &Id, what: &str) -> Result<(), TaskboardError> {
    match id {
        Id::Str(s) if s.trim().is_empty() => {
            Err(TaskboardError::Invalid(format!("{what} id is required")))
        }
        _ => Ok(()),
    }
}
