use super::{Clear, ScriptClear};
use crate::driver::ElementHandle;
use crate::element::WebElementSource;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// How `Type` enters text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOptions {
    text_to_type: String,
    clear_first: bool,
    time_delay: Duration,
}

impl TypeOptions {
    /// Clear the field first, no delay between characters.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text_to_type: text.into(),
            clear_first: true,
            time_delay: Duration::ZERO,
        }
    }

    /// Minimum pause after each character.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.time_delay = delay;
        self
    }

    pub fn clear_first(mut self, clear_first: bool) -> Self {
        self.clear_first = clear_first;
        self
    }

    pub fn text_to_type(&self) -> &str {
        &self.text_to_type
    }

    pub fn should_clear_field_before_typing(&self) -> bool {
        self.clear_first
    }

    pub fn time_delay(&self) -> Duration {
        self.time_delay
    }
}

impl From<&str> for TypeOptions {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for TypeOptions {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

/// Types text character by character with optional pacing.
///
/// A failure aborts the remaining characters; whatever was already typed
/// stays in the field.
pub struct Type {
    clear: Arc<dyn Clear>,
}

impl Default for Type {
    fn default() -> Self {
        Self::new(Arc::new(ScriptClear))
    }
}

impl Type {
    pub fn new(clear: Arc<dyn Clear>) -> Self {
        Self { clear }
    }

    /// Returns `proxy` unchanged so calls can be chained.
    pub async fn execute<'a, P: ?Sized + Sync>(
        &self,
        proxy: &'a P,
        locator: &dyn WebElementSource,
        options: impl Into<TypeOptions>,
    ) -> Result<&'a P> {
        let options = options.into();
        info!(
            "Typing {} character(s) into {}",
            options.text_to_type().chars().count(),
            locator.description()
        );

        self.clear_field(locator, &options).await?;

        let element = locator.find_and_assert_element_is_editable().await?;
        type_into_field(locator, &element, &options).await?;
        Ok(proxy)
    }

    async fn clear_field(&self, locator: &dyn WebElementSource, options: &TypeOptions) -> Result<()> {
        if !options.should_clear_field_before_typing() {
            return Ok(());
        }
        if options.text_to_type().is_empty() {
            self.clear.clear_and_trigger(locator).await
        } else {
            self.clear.clear(locator).await
        }
    }
}

async fn type_into_field(
    locator: &dyn WebElementSource,
    element: &ElementHandle,
    options: &TypeOptions,
) -> Result<()> {
    let mut buffer = [0u8; 4];
    for character in options.text_to_type().chars() {
        locator
            .driver()
            .send_keys(element, character.encode_utf8(&mut buffer))
            .await?;
        sleep_at_least(options.time_delay()).await;
    }
    debug!("Finished typing into {}", locator.description());
    Ok(())
}

async fn sleep_at_least(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;
    use crate::error::VerifyError;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Clear,
        ClearAndTrigger,
        EditabilityCheck,
        Send(String),
    }

    #[derive(Default)]
    struct Log {
        events: Mutex<Vec<(Event, Instant)>>,
    }

    impl Log {
        fn push(&self, event: Event) {
            self.events.lock().unwrap().push((event, Instant::now()));
        }

        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
        }
    }

    struct FakeInput {
        log: Arc<Log>,
        fail_on: Option<char>,
    }

    #[async_trait]
    impl Driver for FakeInput {
        async fn find_elements(&self, _selector: &str) -> Result<Vec<ElementHandle>> {
            Ok(vec![ElementHandle::new("obj-0", 0)])
        }

        async fn call_function(&self, _f: &str, _args: &[Value], _e: &[ElementHandle]) -> Result<Value> {
            Ok(Value::Null)
        }

        async fn send_keys(&self, _element: &ElementHandle, text: &str) -> Result<()> {
            if self.fail_on.map(|c| text.starts_with(c)).unwrap_or(false) {
                return Err(VerifyError::stale_element("obj-0"));
            }
            self.log.push(Event::Send(text.to_string()));
            Ok(())
        }
    }

    struct FakeField {
        driver: FakeInput,
        log: Arc<Log>,
        editable: bool,
    }

    #[async_trait]
    impl WebElementSource for FakeField {
        fn driver(&self) -> &dyn Driver {
            &self.driver
        }

        async fn find(&self) -> Result<ElementHandle> {
            Ok(ElementHandle::new("obj-0", 0))
        }

        async fn find_and_assert_element_is_editable(&self) -> Result<ElementHandle> {
            self.log.push(Event::EditabilityCheck);
            if self.editable {
                Ok(ElementHandle::new("obj-0", 0))
            } else {
                Err(VerifyError::InvalidElementState {
                    element: self.description(),
                    reason: "Cannot change value of readonly element".to_string(),
                })
            }
        }

        fn description(&self) -> String {
            "#search".to_string()
        }
    }

    struct FakeClear {
        log: Arc<Log>,
    }

    #[async_trait]
    impl Clear for FakeClear {
        async fn clear(&self, _locator: &dyn WebElementSource) -> Result<()> {
            self.log.push(Event::Clear);
            Ok(())
        }

        async fn clear_and_trigger(&self, _locator: &dyn WebElementSource) -> Result<()> {
            self.log.push(Event::ClearAndTrigger);
            Ok(())
        }
    }

    fn setup(editable: bool, fail_on: Option<char>) -> (Type, FakeField, Arc<Log>) {
        let log = Arc::new(Log::default());
        let command = Type::new(Arc::new(FakeClear { log: log.clone() }));
        let field = FakeField {
            driver: FakeInput {
                log: log.clone(),
                fail_on,
            },
            log: log.clone(),
            editable,
        };
        (command, field, log)
    }

    #[test]
    fn test_plain_text_defaults() {
        let options: TypeOptions = "abc".into();
        assert_eq!(options.text_to_type(), "abc");
        assert!(options.should_clear_field_before_typing());
        assert_eq!(options.time_delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_clear_check_then_paced_characters() {
        let (command, field, log) = setup(true, None);
        let delay = Duration::from_millis(10);
        let started = Instant::now();

        let proxy = "element";
        let returned = command
            .execute(proxy, &field, TypeOptions::text("ab").with_delay(delay))
            .await
            .unwrap();

        assert!(std::ptr::eq(returned, proxy));
        assert_eq!(
            log.events(),
            vec![
                Event::Clear,
                Event::EditabilityCheck,
                Event::Send("a".to_string()),
                Event::Send("b".to_string()),
            ]
        );

        let events = log.events.lock().unwrap();
        assert!(events[3].1.duration_since(events[2].1) >= delay);
        assert!(started.elapsed() >= delay * 2);
    }

    #[tokio::test]
    async fn test_empty_text_clears_and_triggers_change() {
        let (command, field, log) = setup(true, None);

        command.execute("element", &field, "").await.unwrap();
        assert_eq!(log.events(), vec![Event::ClearAndTrigger, Event::EditabilityCheck]);
    }

    #[tokio::test]
    async fn test_no_clear_appends() {
        let (command, field, log) = setup(true, None);

        command
            .execute("element", &field, TypeOptions::text("x").clear_first(false))
            .await
            .unwrap();
        assert_eq!(
            log.events(),
            vec![Event::EditabilityCheck, Event::Send("x".to_string())]
        );

        let (command, field, log) = setup(true, None);
        command
            .execute("element", &field, TypeOptions::text("").clear_first(false))
            .await
            .unwrap();
        assert_eq!(log.events(), vec![Event::EditabilityCheck]);
    }

    #[tokio::test]
    async fn test_not_editable_sends_nothing() {
        let (command, field, log) = setup(false, None);

        let result = command.execute("element", &field, "abc").await;
        assert!(matches!(result, Err(VerifyError::InvalidElementState { .. })));
        assert_eq!(log.events(), vec![Event::Clear, Event::EditabilityCheck]);
    }

    #[tokio::test]
    async fn test_send_failure_keeps_partial_text() {
        let (command, field, log) = setup(true, Some('c'));

        let result = command.execute("element", &field, "abcd").await;
        assert!(matches!(result, Err(VerifyError::StaleElement(_))));
        assert_eq!(
            log.events(),
            vec![
                Event::Clear,
                Event::EditabilityCheck,
                Event::Send("a".to_string()),
                Event::Send("b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_multibyte_characters_sent_individually() {
        let (command, field, log) = setup(true, None);

        command
            .execute("element", &field, TypeOptions::text("ü€").clear_first(false))
            .await
            .unwrap();
        assert_eq!(
            log.events(),
            vec![
                Event::EditabilityCheck,
                Event::Send("ü".to_string()),
                Event::Send("€".to_string()),
            ]
        );
    }
}
