//! AI task suggestions, with a local fallback when the service is down.

use taskboard_protocol::{RequestSpec, Suggestion, SuggestionListBody, SuggestionRequest};
use taskboard_transport::HttpTransport;
use tracing::warn;

use crate::{TaskboardClient, TaskboardError};

impl<T: HttpTransport> TaskboardClient<T> {
    /// Suggestions for `prompt` from `POST /ai/suggestions`.
    ///
    /// Never fails: if the endpoint errors or answers with something
    /// unreadable, two generic suggestions built from the prompt are
    /// returned instead.
    pub async fn suggestions(&self, prompt: &str) -> Vec<Suggestion> {
        match self.fetch_suggestions(prompt).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %e, "suggestion service unavailable; using local suggestions");
                fallback_suggestions(prompt)
            }
        }
    }

    async fn fetch_suggestions(&self, prompt: &str) -> Result<Vec<Suggestion>, TaskboardError> {
        let spec = RequestSpec::post("/ai/suggestions").json(&SuggestionRequest {
            prompt: prompt.to_string(),
        })?;
        let body: SuggestionListBody = self.dispatch(spec).await?.json()?;
        Ok(body.into_vec())
    }
}

/// The suggestions offered when the service can't be reached.
pub fn fallback_suggestions(prompt: &str) -> Vec<Suggestion> {
    vec![
        Suggestion {
            id: "s1".into(),
            suggestion: format!("Try splitting the work: {prompt}, into smaller subtasks."),
        },
        Suggestion {
            id: "s2".into(),
            suggestion: format!("Add acceptance criteria for: {prompt}"),
        },
    ]
}
