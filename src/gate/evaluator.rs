use super::{Allowances, Breach, EntryPointLatencies, EvaluationResult, IssueCounters};

/// Decide pass/fail for one build. Pure, total over its inputs.
///
/// Counts fail when they strictly exceed their allowance. The SLA gate is
/// inclusive: a slowest latency equal to the limit fails. With no latency
/// samples the slowest value is 0, so a positive limit never trips.
pub fn evaluate(
    counters: &IssueCounters,
    latencies: &EntryPointLatencies,
    allowances: &Allowances,
) -> EvaluationResult {
    let slowest_duration = latencies.slowest().unwrap_or(0);
    let mut breaches = Vec::new();

    if counters.slow_request_count > allowances.slow_requests_allowed {
        breaches.push(Breach::SlowRequests {
            observed: counters.slow_request_count,
            allowed: allowances.slow_requests_allowed,
        });
    }
    if counters.excessive_io_count > allowances.excessive_io_allowed {
        breaches.push(Breach::ExcessiveIo {
            observed: counters.excessive_io_count,
            allowed: allowances.excessive_io_allowed,
        });
    }
    if counters.exception_count > allowances.exceptions_allowed {
        breaches.push(Breach::Exceptions {
            observed: counters.exception_count,
            allowed: allowances.exceptions_allowed,
        });
    }
    if sla_limit_exceeded(allowances.sla_global_limit, slowest_duration) {
        breaches.push(Breach::SlaGlobalLimit {
            limit: allowances.sla_global_limit,
            slowest: slowest_duration,
        });
    }

    EvaluationResult {
        failed: !breaches.is_empty(),
        breaches,
        slowest_duration,
    }
}

fn sla_limit_exceeded(limit: u64, slowest: u64) -> bool {
    limit > 0 && limit <= slowest
}
