//! Rule table entries and the handle returned when registering one.

use super::core::RecordingEngine;
use super::types::RecordedRequest;
use crate::predicate::{evaluate, RequestPredicate};
use std::sync::Arc;
use tracing::debug;

/// Procedure that writes a stubbed response through a transport writer.
pub type ResponseFactory<W> = Arc<dyn Fn(&RecordedRequest, &mut W) + Send + Sync>;

/// One entry of the rule table: a conjunctive predicate set and a factory.
pub(crate) struct Rule<W> {
    pub(crate) id: u64,
    pub(crate) predicates: Vec<RequestPredicate>,
    pub(crate) factory: ResponseFactory<W>,
}

impl<W> Rule<W> {
    pub(crate) fn new(id: u64, factory: ResponseFactory<W>) -> Self {
        Self {
            id,
            predicates: Vec::new(),
            factory,
        }
    }

    /// A rule without predicates is a catch-all.
    pub(crate) fn matches(&self, request: &RecordedRequest) -> bool {
        evaluate(request, &self.predicates)
    }
}

/// Handle to a rule that was just registered.
///
/// The handle is bound to the rule it was created for, not to whatever rule
/// happens to be last in the table when [`RuleHandle::for_requests`] runs.
pub struct RuleHandle<'a, W> {
    engine: &'a RecordingEngine<W>,
    rule_id: u64,
}

impl<'a, W> RuleHandle<'a, W> {
    pub(crate) fn new(engine: &'a RecordingEngine<W>, rule_id: u64) -> Self {
        Self { engine, rule_id }
    }

    /// Restrict the rule to requests that satisfy every given predicate.
    ///
    /// Calling this more than once accumulates predicates. If the rule was
    /// removed by `clear` in the meantime, nothing is attached.
    pub fn for_requests(self, predicates: impl IntoIterator<Item = RequestPredicate>) -> Self {
        let attached = self.engine.attach_predicates(self.rule_id, predicates);
        if !attached {
            debug!(
                "Rule {} no longer exists, predicates were not attached",
                self.rule_id
            );
        }
        self
    }
}
