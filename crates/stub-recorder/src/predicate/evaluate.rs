//! Conjunctive predicate evaluation over single requests and request logs.

use super::request::RequestPredicate;
use crate::recorder::RecordedRequest;

/// True iff every predicate holds for the request. An empty set always matches.
pub fn evaluate(request: &RecordedRequest, predicates: &[RequestPredicate]) -> bool {
    predicates.iter().all(|predicate| predicate.matches(request))
}

/// True iff a single request in the log satisfies all predicates at once.
pub fn find_in<'a>(
    requests: impl IntoIterator<Item = &'a RecordedRequest>,
    predicates: &[RequestPredicate],
) -> bool {
    requests
        .into_iter()
        .any(|request| evaluate(request, predicates))
}

/// Descriptions of the predicates that no request in the log satisfies on its own.
///
/// Each predicate is checked independently, so an empty result does not imply
/// that [`find_in`] would succeed for the whole set.
pub fn unmatched_in(requests: &[RecordedRequest], predicates: &[RequestPredicate]) -> Vec<String> {
    predicates
        .iter()
        .filter(|predicate| !requests.iter().any(|request| predicate.matches(request)))
        .map(ToString::to_string)
        .collect()
}
