//! Predicates over a live element collection, re-evaluated by the poll loop.

mod attributes;

pub use attributes::Attributes;

use crate::check::CheckResult;
use crate::collection::CollectionSource;
use crate::communicator::ScriptCommunicator;
use crate::driver::{Driver, ElementHandle};
use crate::error::{Result, VerifyError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

#[async_trait]
pub trait CollectionCondition: fmt::Display + Send + Sync {
    /// Evaluate against one snapshot of the collection. Must be free of side
    /// effects; it is called once per poll attempt.
    async fn check(&self, driver: &dyn Driver, elements: &[ElementHandle]) -> Result<CheckResult>;

    /// Build the final diagnostic once polling has timed out.
    fn fail(
        &self,
        collection: &dyn CollectionSource,
        last_check_result: &CheckResult,
        cause: Option<VerifyError>,
        timeout_ms: u64,
    ) -> VerifyError;

    /// Whether a collection that cannot be resolved at all counts as a pass.
    fn missing_element_satisfies_condition(&self) -> bool;
}

/// `Attributes` condition reading values through a `ScriptCommunicator`.
pub fn attributes<I, S>(attribute: impl Into<String>, expected_values: I) -> Result<Attributes>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Attributes::new(Arc::new(ScriptCommunicator), attribute, expected_values)
}
