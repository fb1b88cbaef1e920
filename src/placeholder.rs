//! Client for a JSONPlaceholder-style API, built on [`RequestExecutor`].

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::http::{RawResponse, ReqwestTransport, RequestError, RequestExecutor, Transport};

/// Body of a new post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub body: String,
}

pub struct PlaceholderClient<T: Transport = ReqwestTransport> {
    executor: RequestExecutor<T>,
}

impl<T: Transport> PlaceholderClient<T> {
    pub fn new(executor: RequestExecutor<T>) -> Self {
        Self { executor }
    }

    /// Returns all the comments.
    #[tracing::instrument(skip(self))]
    pub async fn get_comments(&self) -> Result<RawResponse, RequestError> {
        self.executor.get("/comments", &Value::Null, Some(&[200])).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_todo(&self, id: u64) -> Result<RawResponse, RequestError> {
        self.executor
            .get(&format!("/todos/{}", id), &Value::Null, Some(&[200]))
            .await
    }

    /// Creates a new post. Only `201 Created` counts as success.
    #[tracing::instrument(skip(self))]
    pub async fn new_post(&self, post: &NewPost) -> Result<RawResponse, RequestError> {
        let body = json!({
            "title": post.title,
            "body": post.body,
        });
        self.executor.post("/posts", &body, Some(&[201])).await
    }
}
