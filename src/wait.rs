use crate::check::CheckResult;
use crate::collection::CollectionSource;
use crate::condition::CollectionCondition;
use crate::config::VerifyConfig;
use crate::error::{Result, VerifyError};
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Re-evaluate `condition` against freshly resolved elements until it
/// accepts or `config.timeout_ms` has elapsed. At least one attempt runs.
///
/// Transient driver faults are retried and handed to `fail` as the cause;
/// any other error is returned immediately.
pub async fn wait_until(
    collection: &dyn CollectionSource,
    condition: &dyn CollectionCondition,
    config: &VerifyConfig,
) -> Result<()> {
    let start = Instant::now();
    let timeout = config.timeout();
    let mut last_check_result = CheckResult::not_checked();
    let mut cause: Option<VerifyError> = None;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match collection.elements().await {
            Ok(elements) => match condition.check(collection.driver(), &elements).await {
                Ok(result) if result.is_accepted() => {
                    debug!(
                        "{} satisfied {} after {} attempt(s)",
                        collection.description(),
                        condition,
                        attempt
                    );
                    return Ok(());
                }
                Ok(result) => {
                    debug!("Attempt {} rejected: {:?}", attempt, result.actual_value());
                    last_check_result = result;
                    cause = None;
                }
                Err(e) if e.is_transient() => {
                    warn!("Attempt {} failed: {}", attempt, e);
                    cause = Some(e);
                }
                Err(e) => return Err(e),
            },
            Err(e) if e.is_missing_element() && condition.missing_element_satisfies_condition() => {
                return Ok(());
            }
            Err(e) if e.is_transient() || e.is_missing_element() => {
                warn!("Attempt {} could not resolve {}: {}", attempt, collection.description(), e);
                cause = Some(e);
            }
            Err(e) => return Err(e),
        }

        if start.elapsed() >= timeout {
            break;
        }
        sleep(config.polling_interval()).await;
    }

    Err(condition.fail(collection, &last_check_result, cause, config.timeout_ms))
}
