use async_trait::async_trait;
use crate::types::PageCapture;
use crate::Result;

#[async_trait]
pub trait ContentSource: Send + Sync {
    fn name(&self) -> &str;

    /// Render the page once, returning a full-page screenshot and its visible text
    async fn fetch(&self, url: &str) -> Result<PageCapture>;
}
