//! Span builder helpers for portal-client instrumentation.

/// Create a tracing span covering one end-to-end login attempt.
///
/// Usage: `let span = login_attempt_span!(attempt_id, "cas", username);`
///
/// Fields recorded at completion:
/// - `user`: the user the server actually returned
/// - `outcome`: `established` or `failed`
#[macro_export]
macro_rules! login_attempt_span {
    ($attempt_id:expr, $strategy:expr, $username:expr) => {
        tracing::info_span!(
            "login_attempt",
            attempt_id = %$attempt_id,
            strategy = %$strategy,
            username = %$username,
            user = tracing::field::Empty,
            outcome = tracing::field::Empty,
        )
    };
}

/// Create a tracing span for a single HTTP exchange with a portal or CAS
/// endpoint. Nested under the login-attempt span; `status` and `latency_ms`
/// are recorded once the response lands.
#[macro_export]
macro_rules! servlet_exchange_span {
    ($target:expr) => {
        tracing::info_span!(
            "servlet_exchange",
            target = %$target,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}
