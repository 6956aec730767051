use crate::element::WebElementSource;
use crate::error::Result;
use async_trait::async_trait;
use std::slice;
use tracing::debug;

/// Removes the current content of an input.
#[async_trait]
pub trait Clear: Send + Sync {
    async fn clear(&self, locator: &dyn WebElementSource) -> Result<()>;

    /// Clear and then fire `change` and `blur`, so listeners learn about the
    /// edit even when nothing is typed afterwards.
    async fn clear_and_trigger(&self, locator: &dyn WebElementSource) -> Result<()>;
}

const CLEAR: &str = r#"function(el) {
    el.focus();
    el.value = '';
    el.dispatchEvent(new Event('input', { bubbles: true }));
}"#;

const CLEAR_AND_TRIGGER: &str = r#"function(el) {
    el.focus();
    el.value = '';
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    el.blur();
}"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptClear;

#[async_trait]
impl Clear for ScriptClear {
    async fn clear(&self, locator: &dyn WebElementSource) -> Result<()> {
        debug!("Clearing {}", locator.description());
        let element = locator.find().await?;
        locator
            .driver()
            .call_function(CLEAR, &[], slice::from_ref(&element))
            .await?;
        Ok(())
    }

    async fn clear_and_trigger(&self, locator: &dyn WebElementSource) -> Result<()> {
        debug!("Clearing {} and triggering change", locator.description());
        let element = locator.find().await?;
        locator
            .driver()
            .call_function(CLEAR_AND_TRIGGER, &[], slice::from_ref(&element))
            .await?;
        Ok(())
    }
}
