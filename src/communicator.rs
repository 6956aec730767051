use crate::driver::{Driver, ElementHandle};
use crate::error::{Result, VerifyError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::trace;

/// Batched reads of element state.
#[async_trait]
pub trait ElementCommunicator: Send + Sync {
    /// Value of `attribute` for every element, same length and order as
    /// `elements`. `None` means the element has no such attribute.
    async fn attributes(
        &self,
        driver: &dyn Driver,
        elements: &[ElementHandle],
        attribute: &str,
    ) -> Result<Vec<Option<String>>>;
}

const READ_ATTRIBUTES: &str =
    "function(name, ...elements) { return elements.map(e => e.getAttribute(name)); }";

/// Reads attributes of all elements in one script round trip.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptCommunicator;

#[async_trait]
impl ElementCommunicator for ScriptCommunicator {
    async fn attributes(
        &self,
        driver: &dyn Driver,
        elements: &[ElementHandle],
        attribute: &str,
    ) -> Result<Vec<Option<String>>> {
        if elements.is_empty() {
            return Ok(Vec::new());
        }

        let value = driver
            .call_function(READ_ATTRIBUTES, &[json!(attribute)], elements)
            .await?;
        let values = parse_values(value)?;

        if values.len() != elements.len() {
            return Err(VerifyError::cdp_protocol(format!(
                "Read {} values of attribute '{}' for {} elements",
                values.len(),
                attribute,
                elements.len()
            )));
        }

        trace!("Attribute '{}' values: {:?}", attribute, values);
        Ok(values)
    }
}

fn parse_values(value: Value) -> Result<Vec<Option<String>>> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(VerifyError::cdp_protocol(format!(
                "Expected an array of attribute values, got {}",
                other
            )))
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(VerifyError::cdp_protocol(format!(
                "Unexpected attribute value {}",
                other
            ))),
        })
        .collect()
}
