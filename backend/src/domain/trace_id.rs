//! Request-scoped trace identifier for correlating merge logs and errors.
//!
//! The identifier lives in task-local storage so the merge pipeline can tag
//! errors without threading it through every call. Blocking filesystem work
//! runs on Tokio's blocking pool, where task-locals are not visible; use
//! [`TraceId::in_blocking_scope`] to carry the identifier across.

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

/// Response header carrying the request trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    /// Task-local storage for the current trace identifier.
    pub(crate) static TRACE_ID: TraceId;
}

/// Per-request trace identifier exposed via task-local storage.
///
/// # Examples
/// ```
/// use csvmerge::TraceId;
///
/// async fn handler() -> Option<String> {
///     TraceId::current().map(|id| id.to_string())
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generate a new random trace identifier.
    #[must_use]
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the current trace identifier if one is in scope.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Execute the provided future with the supplied trace identifier in scope.
    ///
    /// # Examples
    /// ```
    /// use csvmerge::TraceId;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let trace_id: TraceId = "00000000-0000-0000-0000-000000000000"
    ///     .parse()
    ///     .expect("valid UUID");
    /// let observed = TraceId::scope(trace_id, async move { TraceId::current() }).await;
    /// assert_eq!(observed, Some(trace_id));
    /// # });
    /// ```
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }

    /// Wrap a blocking closure so it observes the caller's trace identifier.
    ///
    /// Capture happens when this function is called, so call it on the async
    /// task before handing the returned closure to `spawn_blocking`.
    pub fn in_blocking_scope<F, R>(f: F) -> impl FnOnce() -> R + Send + 'static
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let captured = Self::current();
        move || match captured {
            Some(trace_id) => TRACE_ID.sync_scope(trace_id, f),
            None => f(),
        }
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for trace identifier scoping.
    use super::*;

    #[tokio::test]
    async fn current_reflects_scope() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async move { TraceId::current() }).await;
        assert_eq!(observed, Some(expected));
    }

    #[tokio::test]
    async fn current_is_none_out_of_scope() {
        assert!(TraceId::current().is_none());
    }

    #[test]
    fn from_str_round_trips() {
        let trace_id: TraceId = Uuid::nil().to_string().parse().expect("parse uuid");
        assert_eq!(trace_id.to_string(), Uuid::nil().to_string());
    }

    #[tokio::test]
    async fn blocking_scope_carries_identifier_to_blocking_pool() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async move {
            let work = TraceId::in_blocking_scope(TraceId::current);
            tokio::task::spawn_blocking(work).await.expect("blocking task")
        })
        .await;
        assert_eq!(observed, Some(expected));
    }

    #[tokio::test]
    async fn blocking_scope_without_identifier_stays_empty() {
        let work = TraceId::in_blocking_scope(TraceId::current);
        let observed = tokio::task::spawn_blocking(work).await.expect("blocking task");
        assert!(observed.is_none());
    }
}
