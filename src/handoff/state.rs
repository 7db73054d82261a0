//! Handoff binding state machine.
//!
//! # States
//! - Unbound: initial, no handler chain captured yet
//! - Bound: terminal for the lifetime of the state
//!
//! # State Transitions
//! ```text
//! Unbound → Bound: first successful capture (exactly once)
//! Unbound → Unbound: capture failed (missing ambient context)
//! ```
//!
//! # Design Decisions
//! - Single-assignment cell: concurrent first callers serialize on the cell,
//!   one capture wins, the rest wait and read the frozen binding
//! - Reads after binding are lock-free
//! - A failed capture writes nothing, so no half-bound state is observable

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::OnceCell;

use crate::handoff::context::{Ambient, BindError};

type DispatchFn = dyn Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync;

/// The remainder of a handler chain, callable any number of times.
#[derive(Clone)]
pub struct Downstream(Arc<DispatchFn>);

impl Downstream {
    /// Capture the rest of a middleware stack.
    pub fn from_next(next: Next) -> Self {
        Self(Arc::new(move |request| next.clone().run(request).boxed()))
    }

    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self(Arc::new(move |request| f(request).boxed()))
    }

    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        (self.0)(request).await
    }
}

impl fmt::Debug for Downstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Downstream")
    }
}

/// A captured handler chain plus the ambient context it was captured with.
#[derive(Debug, Clone)]
pub struct Binding {
    pub downstream: Downstream,
    pub ambient: Ambient,
}

/// Whether a `bind_with` call performed the capture itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    Captured,
    AlreadyBound,
}

/// Write-once handoff state shared by the local middleware and the tunnel.
#[derive(Debug, Default)]
pub struct HandoffState {
    cell: OnceCell<Binding>,
}

impl HandoffState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.cell.initialized()
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.cell.get()
    }

    /// Run `capture` and store its binding unless the state is already bound.
    ///
    /// Callers racing an in-flight capture wait for it. If the capture fails
    /// the state stays unbound and the next caller gets to try.
    pub async fn bind_with<F>(&self, capture: F) -> Result<(&Binding, BindOutcome), BindError>
    where
        F: FnOnce() -> Result<Binding, BindError>,
    {
        let mut outcome = BindOutcome::AlreadyBound;
        let outcome_ref = &mut outcome;

        let binding = self
            .cell
            .get_or_try_init(move || async move {
                let binding = capture()?;
                *outcome_ref = BindOutcome::Captured;
                Ok::<_, BindError>(binding)
            })
            .await?;

        Ok((binding, outcome))
    }
}
