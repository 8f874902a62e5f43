use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    // ── Upstream traffic ────────────────────────────────────────────────────
    pub static ref UPSTREAM_REQUESTS_COUNTER: CounterVec = register_counter_vec!(
        "uncmorfi_upstream_requests_total",
        "Upstream requests by method and outcome",
        &["endpoint", "outcome"]
    ).unwrap();

    // ── Normalization ───────────────────────────────────────────────────────
    pub static ref USER_FETCH_FAILURES_COUNTER: CounterVec = register_counter_vec!(
        "uncmorfi_user_fetch_failures_total",
        "Account codes dropped from a batch, by failure reason",
        &["reason"]
    ).unwrap();

    pub static ref PARSE_FAILURES_COUNTER: CounterVec = register_counter_vec!(
        "uncmorfi_parse_failures_total",
        "Menu and servings fetches that failed, by view and reason",
        &["view", "reason"]
    ).unwrap();
}
