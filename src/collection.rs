use crate::condition::{self, CollectionCondition};
use crate::config::VerifyConfig;
use crate::driver::{Driver, ElementHandle};
use crate::error::Result;
use crate::wait::wait_until;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Where a collection's elements come from.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    fn driver(&self) -> &dyn Driver;

    /// Resolve the collection against the current DOM. Called once per poll
    /// attempt; handles are never reused between attempts.
    async fn elements(&self) -> Result<Vec<ElementHandle>>;

    /// Human-readable locator for error messages.
    fn description(&self) -> String;
}

/// All elements matching a CSS selector.
pub struct SelectorCollection {
    driver: Arc<dyn Driver>,
    selector: String,
}

impl SelectorCollection {
    pub fn new(driver: Arc<dyn Driver>, selector: impl Into<String>) -> Self {
        Self {
            driver,
            selector: selector.into(),
        }
    }
}

#[async_trait]
impl CollectionSource for SelectorCollection {
    fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    async fn elements(&self) -> Result<Vec<ElementHandle>> {
        self.driver.find_elements(&self.selector).await
    }

    fn description(&self) -> String {
        self.selector.clone()
    }
}

/// Lazy proxy over a collection; every assertion re-resolves it.
pub struct ElementsCollection {
    source: Box<dyn CollectionSource>,
    config: VerifyConfig,
}

impl fmt::Debug for ElementsCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementsCollection")
            .field("source", &self.source.description())
            .field("config", &self.config)
            .finish()
    }
}

impl ElementsCollection {
    pub fn new(source: Box<dyn CollectionSource>, config: VerifyConfig) -> Self {
        Self { source, config }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub fn description(&self) -> String {
        self.source.description()
    }

    /// Wait until `condition` holds, failing with its diagnostic on timeout.
    pub async fn should_have(&self, condition: &dyn CollectionCondition) -> Result<&Self> {
        info!("{} should have {}", self.source.description(), condition);
        wait_until(self.source.as_ref(), condition, &self.config).await?;
        Ok(self)
    }

    pub async fn should_have_attributes<I, S>(&self, attribute: &str, expected_values: I) -> Result<&Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let condition = condition::attributes(attribute, expected_values)?;
        self.should_have(&condition).await
    }
}
