//! Core recording engine shared by the HTTP and TCP recorders.
//!
//! The engine owns the request log and the rule table behind a single lock.
//! Appending a request and selecting/invoking its response factory happen in
//! one critical section, so a concurrent `clear` lands either strictly before
//! or strictly after a given request's record+respond step.

use super::rules::{ResponseFactory, Rule, RuleHandle};
use super::types::RecordedRequest;
use crate::predicate::{find_in, unmatched_in, RequestPredicate};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Outcome of dispatching one recorded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The rule at this position in the table produced the response
    Matched { rule_index: usize },
    /// No rule matched; the transport's default response applies
    Fallback,
}

struct ServerState<W> {
    requests: Vec<RecordedRequest>,
    rules: Vec<Rule<W>>,
}

/// Request log plus rule table for one recorder.
///
/// The log is unbounded. Callers are expected to `clear` between test cases.
pub struct RecordingEngine<W> {
    state: Mutex<ServerState<W>>,
    next_rule_id: AtomicU64,
}

impl<W> RecordingEngine<W> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ServerState {
                requests: Vec::new(),
                rules: Vec::new(),
            }),
            next_rule_id: AtomicU64::new(0),
        }
    }

    /// Append a request and answer it from the rule table.
    ///
    /// The first rule whose predicates all hold writes into `writer`; later
    /// rules are not evaluated. On [`Dispatch::Fallback`] the writer is left
    /// untouched.
    pub fn record_and_dispatch(&self, request: RecordedRequest, writer: &mut W) -> Dispatch {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.requests.push(request);
        let Some(request) = state.requests.last() else {
            return Dispatch::Fallback;
        };

        for (rule_index, rule) in state.rules.iter().enumerate() {
            if rule.matches(request) {
                debug!("Request matched rule {} (id={})", rule_index, rule.id);
                (rule.factory)(request, writer);
                return Dispatch::Matched { rule_index };
            }
        }

        debug!(
            "No rule matched among {} rules, using default response",
            state.rules.len()
        );
        Dispatch::Fallback
    }

    /// Append a request without dispatching it.
    pub fn record(&self, request: RecordedRequest) {
        self.state.lock().requests.push(request);
    }

    /// Ordered snapshot of the request log.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Discard recorded requests and rules together.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.requests.clear();
        state.rules.clear();
    }

    /// Register a rule that initially matches every request.
    pub fn use_response<F>(&self, factory: F) -> RuleHandle<'_, W>
    where
        F: Fn(&RecordedRequest, &mut W) + Send + Sync + 'static,
    {
        self.push_rule(Arc::new(factory))
    }

    /// Register a rule and its predicates in one call.
    pub fn add_rule<F>(
        &self,
        factory: F,
        predicates: impl IntoIterator<Item = RequestPredicate>,
    ) -> RuleHandle<'_, W>
    where
        F: Fn(&RecordedRequest, &mut W) + Send + Sync + 'static,
    {
        self.use_response(factory).for_requests(predicates)
    }

    /// Register an already shared factory.
    pub fn push_rule(&self, factory: ResponseFactory<W>) -> RuleHandle<'_, W> {
        let id = self.next_rule_id.fetch_add(1, Ordering::Relaxed);
        self.state.lock().rules.push(Rule::new(id, factory));
        RuleHandle::new(self, id)
    }

    pub(crate) fn attach_predicates(
        &self,
        rule_id: u64,
        predicates: impl IntoIterator<Item = RequestPredicate>,
    ) -> bool {
        let mut state = self.state.lock();
        match state.rules.iter_mut().find(|rule| rule.id == rule_id) {
            Some(rule) => {
                rule.predicates.extend(predicates);
                true
            }
            None => false,
        }
    }

    /// True if any single recorded request satisfies all predicates.
    pub fn find(&self, predicates: &[RequestPredicate]) -> bool {
        find_in(&self.state.lock().requests, predicates)
    }

    /// Descriptions of predicates that no recorded request satisfies.
    pub fn unmatched(&self, predicates: &[RequestPredicate]) -> Vec<String> {
        unmatched_in(&self.state.lock().requests, predicates)
    }

    pub fn rule_count(&self) -> usize {
        self.state.lock().rules.len()
    }
}

impl<W> Default for RecordingEngine<W> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    type Engine = RecordingEngine<Vec<String>>;

    fn get(path: &str) -> RecordedRequest {
        RecordedRequest::http(
            "127.0.0.1:50000".parse().unwrap(),
            "GET",
            path,
            "",
            [],
            Bytes::new(),
        )
    }

    fn reply(text: &'static str) -> impl Fn(&RecordedRequest, &mut Vec<String>) + Send + Sync {
        move |_, out: &mut Vec<String>| out.push(text.to_string())
    }

    #[test]
    fn test_no_rules_falls_back_and_records() {
        let engine = Engine::new();
        let mut out = Vec::new();

        assert_eq!(engine.record_and_dispatch(get("/a"), &mut out), Dispatch::Fallback);
        assert_eq!(engine.record_and_dispatch(get("/b"), &mut out), Dispatch::Fallback);

        assert!(out.is_empty());
        let paths: Vec<_> = engine
            .requests()
            .iter()
            .map(|r| r.path().to_string())
            .collect();
        assert_eq!(paths, vec!["/a", "/b"]);
    }

    #[test]
    fn test_first_match_wins() {
        let engine = Engine::new();
        engine
            .use_response(reply("specific"))
            .for_requests([RequestPredicate::path("/talula")]);
        engine.use_response(reply("catch-all"));

        let mut out = Vec::new();
        let outcome = engine.record_and_dispatch(get("/talula"), &mut out);
        assert_eq!(outcome, Dispatch::Matched { rule_index: 0 });
        assert_eq!(out, vec!["specific"]);

        let mut out = Vec::new();
        let outcome = engine.record_and_dispatch(get("/other"), &mut out);
        assert_eq!(outcome, Dispatch::Matched { rule_index: 1 });
        assert_eq!(out, vec!["catch-all"]);
    }

    #[test]
    fn test_early_catch_all_shadows_later_rules() {
        let engine = Engine::new();
        engine.use_response(reply("catch-all"));
        engine.add_rule(reply("specific"), [RequestPredicate::path("/talula")]);

        let mut out = Vec::new();
        engine.record_and_dispatch(get("/talula"), &mut out);
        assert_eq!(out, vec!["catch-all"]);
    }

    #[test]
    fn test_unmatched_rule_falls_back() {
        let engine = Engine::new();
        engine.add_rule(
            reply("post only"),
            [RequestPredicate::path("/talula"), RequestPredicate::method("POST")],
        );

        let mut out = Vec::new();
        assert_eq!(
            engine.record_and_dispatch(get("/talula"), &mut out),
            Dispatch::Fallback
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_factory_sees_the_recorded_request() {
        let engine = RecordingEngine::<String>::new();
        engine.use_response(|request: &RecordedRequest, out: &mut String| {
            out.push_str(request.path());
        });

        let mut out = String::new();
        engine.record_and_dispatch(get("/echo"), &mut out);
        assert_eq!(out, "/echo");
    }

    #[test]
    fn test_for_requests_targets_its_own_rule() {
        let engine = Engine::new();
        let first = engine.use_response(reply("first"));
        engine.use_response(reply("second"));
        first.for_requests([RequestPredicate::path("/first")]);

        let mut out = Vec::new();
        engine.record_and_dispatch(get("/elsewhere"), &mut out);
        assert_eq!(out, vec!["second"]);
    }

    #[test]
    fn test_for_requests_after_clear_does_not_leak_into_new_rules() {
        let engine = Engine::new();
        let stale = engine.use_response(reply("stale"));
        engine.clear();
        engine.use_response(reply("fresh"));
        stale.for_requests([RequestPredicate::path("/never")]);

        let mut out = Vec::new();
        engine.record_and_dispatch(get("/anything"), &mut out);
        assert_eq!(out, vec!["fresh"]);
    }

    #[test]
    fn test_clear_is_idempotent_and_resets_everything() {
        let engine = Engine::new();
        engine.use_response(reply("stub"));
        engine.record_and_dispatch(get("/a"), &mut Vec::new());

        engine.clear();
        engine.clear();

        assert!(engine.requests().is_empty());
        assert_eq!(engine.rule_count(), 0);
        assert!(!engine.find(&[]));
        assert!(!engine.find(&[RequestPredicate::path("/a")]));

        let mut out = Vec::new();
        assert_eq!(engine.record_and_dispatch(get("/a"), &mut out), Dispatch::Fallback);
        assert!(out.is_empty());
    }

    #[test]
    fn test_find_and_unmatched() {
        let engine = Engine::new();
        engine.record(get("/Fubar"));

        assert!(engine.find(&[RequestPredicate::path("/Fubar")]));
        assert!(!engine.find(&[RequestPredicate::path("/talula")]));
        assert_eq!(
            engine.unmatched(&[RequestPredicate::path("/talula")]),
            vec!["Path: '/talula'"]
        );
    }

    #[test]
    fn test_concurrent_recording_keeps_every_request() {
        let engine = Arc::new(Engine::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        engine.record_and_dispatch(get(&format!("/{i}/{j}")), &mut Vec::new());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.requests().len(), 200);
    }

    #[test]
    fn test_clear_is_atomic_with_dispatch() {
        // Requests dispatched before the clear were answered by the rule and are
        // gone from the log; requests after it fell back and are still logged.
        let engine = Arc::new(Engine::new());
        engine.use_response(reply("before clear"));

        let workers: Vec<_> = (0..4)
            .map(|i| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    (0..500)
                        .map(|j| {
                            let path = format!("/{i}/{j}");
                            let outcome = engine.record_and_dispatch(get(&path), &mut Vec::new());
                            (path, outcome)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let clearer = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                while engine.requests().len() < 100 {
                    std::thread::yield_now();
                }
                engine.clear();
            })
        };

        let mut outcomes = Vec::new();
        for worker in workers {
            outcomes.extend(worker.join().unwrap());
        }
        clearer.join().unwrap();

        let logged: std::collections::HashSet<String> = engine
            .requests()
            .iter()
            .map(|r| r.path().to_string())
            .collect();
        for (path, outcome) in outcomes {
            match outcome {
                Dispatch::Matched { .. } => assert!(!logged.contains(&path), "{path}"),
                Dispatch::Fallback => assert!(logged.contains(&path), "{path}"),
            }
        }
    }
}
