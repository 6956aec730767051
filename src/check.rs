/// Outcome of one evaluation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

/// What a condition actually observed on its last attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActualValue {
    /// The collection had this many elements (size gate fired).
    Size(usize),
    /// Attribute values read from the collection, in element order.
    Values(Vec<Option<String>>),
    /// Nothing was observed.
    Absent,
}

/// Immutable result of a single `check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    verdict: Verdict,
    actual_value: ActualValue,
    message: Option<String>,
}

impl CheckResult {
    pub fn new(verdict: Verdict, actual_value: ActualValue) -> Self {
        Self {
            verdict,
            actual_value,
            message: None,
        }
    }

    pub fn accepted() -> Self {
        Self::new(Verdict::Accept, ActualValue::Absent)
    }

    pub fn rejected(message: impl Into<String>, actual_value: ActualValue) -> Self {
        Self {
            verdict: Verdict::Reject,
            actual_value,
            message: Some(message.into()),
        }
    }

    /// Initial "last result" of a poll loop before any attempt completed.
    pub fn not_checked() -> Self {
        Self::new(Verdict::Reject, ActualValue::Absent)
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accept
    }

    pub fn actual_value(&self) -> &ActualValue {
        &self.actual_value
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn message_or_else(&self, fallback: impl FnOnce() -> String) -> String {
        self.message.clone().unwrap_or_else(fallback)
    }
}
