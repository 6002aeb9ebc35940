//! Stacks

use crate::client::{ResultsPage, StackPathClient};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A StackPath stack, the project every other resource belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub id: String,
    pub slug: String,
    pub name: String,
}

impl StackPathClient {
    /// Look a stack up by slug. `None` means no such stack.
    ///
    /// See: https://stackpath.dev/reference/stacks#getstacks
    pub async fn find_stack_by_slug(&self, slug: &str) -> Result<Option<Stack>> {
        let page: ResultsPage<Stack> = self
            .get_json(
                "/stack/v1/stacks",
                &[("page_request.filter", format!("slug=\"{}\"", slug))],
            )
            .await?;

        Ok(page.results.into_iter().next())
    }
}
