use super::CollectionCondition;
use crate::check::{ActualValue, CheckResult, Verdict};
use crate::collection::CollectionSource;
use crate::communicator::ElementCommunicator;
use crate::driver::{Driver, ElementHandle};
use crate::error::{format_expected, Result, VerifyError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Every element of the collection has the given value of `attribute`, in order.
pub struct Attributes {
    communicator: Arc<dyn ElementCommunicator>,
    attribute: String,
    expected_values: Box<[String]>,
    explanation: Option<String>,
}

impl Attributes {
    pub fn new<I, S>(
        communicator: Arc<dyn ElementCommunicator>,
        attribute: impl Into<String>,
        expected_values: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attribute = attribute.into();
        if attribute.is_empty() {
            return Err(VerifyError::invalid_argument("Attribute name must not be empty"));
        }

        let expected_values: Box<[String]> = expected_values.into_iter().map(Into::into).collect();
        if expected_values.is_empty() {
            return Err(VerifyError::invalid_argument(format!(
                "No expected values given for attribute {}",
                attribute
            )));
        }

        Ok(Self {
            communicator,
            attribute,
            expected_values,
            explanation: None,
        })
    }

    /// Reason shown in the failure message.
    pub fn because(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn expected_values(&self) -> &[String] {
        &self.expected_values
    }

    fn not_found(
        &self,
        collection: &dyn CollectionSource,
        cause: Option<VerifyError>,
        timeout_ms: u64,
    ) -> VerifyError {
        VerifyError::ElementNotFound {
            locator: collection.description(),
            expected: self.to_string(),
            timeout_ms,
            cause: cause.map(Box::new),
        }
    }
}

#[async_trait]
impl CollectionCondition for Attributes {
    async fn check(&self, driver: &dyn Driver, elements: &[ElementHandle]) -> Result<CheckResult> {
        if elements.len() != self.expected_values.len() {
            return Ok(CheckResult::new(Verdict::Reject, ActualValue::Size(elements.len())));
        }

        let actual_values = self
            .communicator
            .attributes(driver, elements, &self.attribute)
            .await?;

        for (i, expected_value) in self.expected_values.iter().enumerate() {
            let actual_value = actual_values.get(i).and_then(|v| v.as_deref());
            if actual_value != Some(expected_value.as_str()) {
                let message = format!(
                    "Attribute \"{}\" values mismatch (#{} expected: \"{}\", actual: \"{}\")",
                    self.attribute,
                    i,
                    expected_value,
                    actual_value.unwrap_or("null")
                );
                trace!("{}", message);
                return Ok(CheckResult::rejected(message, ActualValue::Values(actual_values)));
            }
        }

        Ok(CheckResult::accepted())
    }

    fn fail(
        &self,
        collection: &dyn CollectionSource,
        last_check_result: &CheckResult,
        cause: Option<VerifyError>,
        timeout_ms: u64,
    ) -> VerifyError {
        match last_check_result.actual_value() {
            ActualValue::Size(0) | ActualValue::Absent => self.not_found(collection, cause, timeout_ms),
            ActualValue::Size(actual_size) => VerifyError::ListSizeMismatch {
                operator: "=".to_string(),
                expected: self.expected_values.len(),
                actual: *actual_size,
                explanation: self.explanation.clone(),
                locator: collection.description(),
                timeout_ms,
                cause: cause.map(Box::new),
            },
            ActualValue::Values(actual_values) if actual_values.is_empty() => {
                self.not_found(collection, cause, timeout_ms)
            }
            ActualValue::Values(actual_values) => VerifyError::AttributesMismatch {
                message: last_check_result
                    .message_or_else(|| format!("Attribute '{}' values mismatch", self.attribute)),
                locator: collection.description(),
                expected: self.expected_values.to_vec(),
                actual: actual_values.clone(),
                explanation: self.explanation.clone(),
                timeout_ms,
                cause: cause.map(Box::new),
            },
        }
    }

    fn missing_element_satisfies_condition(&self) -> bool {
        false
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attribute: '{}' values {}",
            self.attribute,
            format_expected(&self.expected_values)
        )
    }
}
