use crate::commands::{Clear, ScriptClear, Type, TypeOptions};
use crate::driver::{Driver, ElementHandle};
use crate::error::{Result, VerifyError};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Where a single element comes from.
#[async_trait]
pub trait WebElementSource: Send + Sync {
    fn driver(&self) -> &dyn Driver;

    /// Resolve the element against the current DOM.
    async fn find(&self) -> Result<ElementHandle>;

    /// Resolve the element and check it is visible, enabled and not read-only.
    async fn find_and_assert_element_is_editable(&self) -> Result<ElementHandle>;

    fn description(&self) -> String;
}

const EDITABILITY: &str = r#"function(el) {
    const style = getComputedStyle(el);
    return {
        visible: !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length)
            && style.visibility !== 'hidden',
        enabled: !el.disabled,
        readOnly: !!el.readOnly || el.hasAttribute('readonly')
    };
}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Editability {
    visible: bool,
    enabled: bool,
    read_only: bool,
}

/// The `index`-th element matching a CSS selector.
pub struct SelectorElement {
    driver: Arc<dyn Driver>,
    selector: String,
    index: usize,
}

impl SelectorElement {
    pub fn new(driver: Arc<dyn Driver>, selector: impl Into<String>) -> Self {
        Self::nth(driver, selector, 0)
    }

    pub fn nth(driver: Arc<dyn Driver>, selector: impl Into<String>, index: usize) -> Self {
        Self {
            driver,
            selector: selector.into(),
            index,
        }
    }
}

#[async_trait]
impl WebElementSource for SelectorElement {
    fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    async fn find(&self) -> Result<ElementHandle> {
        let mut elements = self.driver.find_elements(&self.selector).await?;
        if self.index < elements.len() {
            Ok(elements.swap_remove(self.index))
        } else {
            Err(VerifyError::ElementNotFound {
                locator: self.description(),
                expected: "exist".to_string(),
                timeout_ms: 0,
                cause: None,
            })
        }
    }

    async fn find_and_assert_element_is_editable(&self) -> Result<ElementHandle> {
        let element = self.find().await?;
        let value = self
            .driver
            .call_function(EDITABILITY, &[], std::slice::from_ref(&element))
            .await?;
        let editability: Editability = serde_json::from_value(value)?;
        debug!("Editability of {}: {:?}", self.description(), editability);

        if !editability.visible {
            return Err(VerifyError::ElementNotInteractable {
                element: self.description(),
            });
        }
        if !editability.enabled {
            return Err(VerifyError::InvalidElementState {
                element: self.description(),
                reason: "Cannot change value of disabled element".to_string(),
            });
        }
        if editability.read_only {
            return Err(VerifyError::InvalidElementState {
                element: self.description(),
                reason: "Cannot change value of readonly element".to_string(),
            });
        }

        Ok(element)
    }

    fn description(&self) -> String {
        if self.index == 0 {
            self.selector.clone()
        } else {
            format!("{}[{}]", self.selector, self.index)
        }
    }
}

/// Lazy proxy over a single element; every command re-resolves it.
pub struct Element {
    source: Arc<dyn WebElementSource>,
    clear: Arc<dyn Clear>,
    type_command: Type,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("source", &self.source.description())
            .finish()
    }
}

impl Element {
    pub fn new(source: Arc<dyn WebElementSource>) -> Self {
        let clear: Arc<dyn Clear> = Arc::new(ScriptClear);
        Self {
            source,
            type_command: Type::new(clear.clone()),
            clear,
        }
    }

    pub fn description(&self) -> String {
        self.source.description()
    }

    /// Type text one character at a time. Accepts a plain string or
    /// `TypeOptions`.
    pub async fn type_text(&self, options: impl Into<TypeOptions>) -> Result<&Self> {
        self.type_command
            .execute(self, self.source.as_ref(), options)
            .await
    }

    pub async fn clear(&self) -> Result<&Self> {
        self.clear.clear(self.source.as_ref()).await?;
        Ok(self)
    }
}
