use crate::cdp::CdpClient;
use crate::error::{Result, VerifyError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Opaque reference to a live DOM element.
///
/// Handles are only valid until the page re-renders the node; using one
/// after that yields `VerifyError::StaleElement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub object_id: String,
    pub index: usize,
}

impl ElementHandle {
    pub fn new(object_id: impl Into<String>, index: usize) -> Self {
        Self {
            object_id: object_id.into(),
            index,
        }
    }
}

/// Browser capability consumed by conditions and commands.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Resolve `selector` against the current DOM, in document order.
    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementHandle>>;

    /// Call `function_declaration` with `args` followed by one argument per
    /// element, returning the JSON result by value.
    async fn call_function(
        &self,
        function_declaration: &str,
        args: &[Value],
        elements: &[ElementHandle],
    ) -> Result<Value>;

    /// Send `text` as key input to `element`.
    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<()>;
}

const FOCUS: &str = "function() { this.focus(); }";

/// `Driver` backed by a Chrome DevTools session.
///
/// Every resolution places its remote objects in a fresh object group and
/// releases the previous group, so handles from one `find_elements` call
/// stay valid until the next one.
pub struct CdpDriver {
    cdp: CdpClient,
    resolutions: AtomicU64,
    object_group: Mutex<Option<String>>,
}

impl CdpDriver {
    pub fn new(cdp: CdpClient) -> Self {
        Self {
            cdp,
            resolutions: AtomicU64::new(0),
            object_group: Mutex::new(None),
        }
    }

    pub fn cdp(&self) -> &CdpClient {
        &self.cdp
    }

    /// Start a new object group, returning it and the group it replaces.
    async fn rotate_object_group(&self) -> (String, Option<String>) {
        let group = format!("chrome-verify-{}", self.resolutions.fetch_add(1, Ordering::SeqCst));
        let previous = self.object_group.lock().await.replace(group.clone());
        (group, previous)
    }
}

#[async_trait]
impl Driver for CdpDriver {
    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        debug!("Resolving elements: {}", selector);

        let expression = format!(
            "Array.from(document.querySelectorAll({}))",
            serde_json::to_string(selector)?
        );
        let (group, previous) = self.rotate_object_group().await;
        if let Some(previous) = previous {
            if let Err(e) = self.cdp.release_object_group(&previous).await {
                debug!("Could not release object group {}: {}", previous, e);
            }
        }

        let array = self.cdp.evaluate(&expression, false, Some(&group)).await?;
        let array_id = array
            .get("objectId")
            .and_then(|id| id.as_str())
            .ok_or_else(|| VerifyError::cdp_protocol("querySelectorAll returned no object"))?
            .to_string();

        let properties = self.cdp.get_properties(&array_id).await?;
        let mut elements: Vec<ElementHandle> = properties
            .iter()
            .filter_map(|property| {
                let index = property.get("name")?.as_str()?.parse::<usize>().ok()?;
                let object_id = property.get("value")?.get("objectId")?.as_str()?;
                Some(ElementHandle::new(object_id, index))
            })
            .collect();
        elements.sort_by_key(|element| element.index);

        trace!("Selector {} resolved to {} elements", selector, elements.len());
        Ok(elements)
    }

    async fn call_function(
        &self,
        function_declaration: &str,
        args: &[Value],
        elements: &[ElementHandle],
    ) -> Result<Value> {
        let this = elements
            .first()
            .ok_or_else(|| VerifyError::invalid_argument("call_function needs at least one element"))?;

        let arguments: Vec<Value> = args
            .iter()
            .map(|value| json!({ "value": value }))
            .chain(elements.iter().map(|e| json!({ "objectId": e.object_id })))
            .collect();

        let result = self
            .cdp
            .call_function_on(&this.object_id, function_declaration, arguments)
            .await?;

        Ok(result.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<()> {
        self.cdp
            .call_function_on(&element.object_id, FOCUS, Vec::new())
            .await?;
        for unit in text.chars() {
            self.cdp.dispatch_char(&unit.to_string()).await?;
        }
        Ok(())
    }
}
