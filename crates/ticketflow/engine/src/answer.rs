//! Answer sources for the WAIT stage
//!
//! WAIT represents the customer answering a clarifying question. The
//! executor does not block on I/O; it asks an injected source for the
//! answer synchronously.

use ticketflow_types::CaseRecord;

/// Supplies the customer's answer to a clarifying question
pub trait AnswerSource: Send + Sync {
    fn answer(&self, question: &str, record: &CaseRecord) -> String;
}

/// Returns the same configured answer for every question
#[derive(Clone, Debug)]
pub struct CannedAnswer(String);

impl CannedAnswer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self(answer.into())
    }
}

impl AnswerSource for CannedAnswer {
    fn answer(&self, _question: &str, _record: &CaseRecord) -> String {
        self.0.clone()
    }
}

impl<F> AnswerSource for F
where
    F: Fn(&str, &CaseRecord) -> String + Send + Sync,
{
    fn answer(&self, question: &str, record: &CaseRecord) -> String {
        self(question, record)
    }
}
