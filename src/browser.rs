use crate::cdp::{CdpClient, TabInfo};
use crate::collection::{ElementsCollection, SelectorCollection};
use crate::config::VerifyConfig;
use crate::driver::{CdpDriver, Driver};
use crate::element::{Element, SelectorElement};
use crate::error::{Result, VerifyError};
use std::sync::Arc;
use tracing::info;

/// Entry point: a DevTools session plus the assertion timing to use.
pub struct Browser {
    driver: Arc<dyn Driver>,
    config: VerifyConfig,
}

impl Browser {
    /// Connect to Chrome and attach to `tab_id`, or to the first page tab.
    pub async fn connect(
        chrome_host: &str,
        chrome_port: u16,
        tab_id: Option<&str>,
        config: VerifyConfig,
    ) -> Result<Self> {
        info!("Connecting to Chrome at {}:{}", chrome_host, chrome_port);

        let mut cdp = CdpClient::new(chrome_host, chrome_port);
        let tab = match tab_id {
            Some(id) => id.to_string(),
            None => first_tab(&cdp.list_tabs().await?)?,
        };
        cdp.connect_to_tab(&tab).await?;
        info!("Connected to tab: {}", tab);

        Ok(Self::with_driver(Arc::new(CdpDriver::new(cdp)), config))
    }

    /// Build on top of any `Driver` implementation.
    pub fn with_driver(driver: Arc<dyn Driver>, config: VerifyConfig) -> Self {
        Self { driver, config }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// First element matching `selector`.
    pub fn element(&self, selector: &str) -> Element {
        Element::new(Arc::new(SelectorElement::new(self.driver.clone(), selector)))
    }

    /// All elements matching `selector`.
    pub fn elements(&self, selector: &str) -> ElementsCollection {
        ElementsCollection::new(
            Box::new(SelectorCollection::new(self.driver.clone(), selector)),
            self.config.clone(),
        )
    }
}

fn first_tab(tabs: &[TabInfo]) -> Result<String> {
    tabs.iter()
        .find(|tab| tab.websocket_debugger_url.is_some())
        .map(|tab| tab.id.clone())
        .ok_or_else(|| VerifyError::tab_not_found("No debuggable tab available"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ElementHandle;
    use async_trait::async_trait;
    use serde_json::Value;

    struct EmptyPage;

    #[async_trait]
    impl Driver for EmptyPage {
        async fn find_elements(&self, _selector: &str) -> Result<Vec<ElementHandle>> {
            Ok(Vec::new())
        }

        async fn call_function(&self, _f: &str, _args: &[Value], _e: &[ElementHandle]) -> Result<Value> {
            Ok(Value::Null)
        }

        async fn send_keys(&self, _element: &ElementHandle, _text: &str) -> Result<()> {
            Ok(())
        }
    }

    fn tab(id: &str, ws: Option<&str>) -> TabInfo {
        TabInfo {
            id: id.to_string(),
            title: String::new(),
            url: "about:blank".to_string(),
            description: String::new(),
            websocket_debugger_url: ws.map(str::to_string),
        }
    }

    #[test]
    fn test_first_tab_skips_undebuggable() {
        let tabs = vec![tab("A", None), tab("B", Some("ws://localhost:9222/devtools/page/B"))];
        assert_eq!(first_tab(&tabs).unwrap(), "B");
        assert!(matches!(first_tab(&[]), Err(VerifyError::TabNotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_collection_fails_with_element_not_found() {
        let browser = Browser::with_driver(
            Arc::new(EmptyPage),
            VerifyConfig {
                timeout_ms: 20,
                polling_interval_ms: 5,
            },
        );

        let rows = browser.elements(".row");
        let result = rows.should_have_attributes("data-id", ["1"]).await;
        match result {
            Err(VerifyError::ElementNotFound { locator, expected, .. }) => {
                assert_eq!(locator, ".row");
                assert_eq!(expected, "Attribute: 'data-id' values [1]");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_typing_into_missing_element_fails_fast() {
        let browser = Browser::with_driver(Arc::new(EmptyPage), VerifyConfig::default());
        let search = browser.element("#q");
        let result = search.type_text("rust").await;
        assert!(matches!(result, Err(VerifyError::ElementNotFound { .. })));
    }
}
