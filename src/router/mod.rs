//! Router (§4.D): per-subprotocol action-handler registry and the inbound
//! message lifecycle.

pub mod context;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use context::{CallCapability, HandlerContext, RouterContext, Scope};

use crate::codec::{self, Frame};
use crate::correlation;
use crate::error::{ErrorKind, HandlerError, OcppError};
use crate::version::{Direction, VersionAdapter};

/// Future returned by a registered handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, OcppError>> + Send>>;

/// A registered `on` handler or `after` hook.
pub type HandlerFn = Arc<dyn Fn(Value, HandlerContext) -> HandlerFuture + Send + Sync>;

/// Whether an `after` hook runs detached from the response path or is
/// awaited inline before `route_message` returns (§5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterMode {
    /// Spawn the hook as a detached task (the default): a server-originated
    /// Call inside it cannot deadlock against the just-finished response.
    Detached,
    /// Await the hook inline. In this mode the hook must not itself invoke
    /// `call(...)` on the same session.
    Inline,
}

struct RouteEntry {
    on: HandlerFn,
    after: Option<HandlerFn>,
    skip_schema_validation: bool,
}

/// Owns one subprotocol's action table and drives the inbound frame
/// lifecycle (§4.D).
pub struct Router {
    subprotocol: crate::version::Subprotocol,
    handlers: HashMap<String, RouteEntry>,
    version_adapter: Arc<VersionAdapter>,
    after_mode: AfterMode,
}

impl Router {
    /// Build an empty router for `subprotocol`, looking up payload shapes
    /// from `version_adapter`.
    #[must_use]
    pub fn new(subprotocol: crate::version::Subprotocol, version_adapter: Arc<VersionAdapter>) -> Self {
        Self {
            subprotocol,
            handlers: HashMap::new(),
            version_adapter,
            after_mode: AfterMode::Detached,
        }
    }

    /// Configure whether `after` hooks run detached (default) or inline.
    #[must_use]
    pub const fn with_after_mode(mut self, mode: AfterMode) -> Self {
        self.after_mode = mode;
        self
    }

    /// The subprotocol this router serves.
    #[must_use]
    pub const fn subprotocol(&self) -> crate::version::Subprotocol {
        self.subprotocol
    }

    /// Register the primary handler for `action`.
    pub fn on<F, Fut>(&mut self, action: impl Into<String>, skip_schema_validation: bool, handler: F) -> &mut Self
    where
        F: Fn(Value, HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, OcppError>> + Send + 'static,
    {
        let action = action.into();
        let boxed: HandlerFn = Arc::new(move |payload, ctx| Box::pin(handler(payload, ctx)));
        let after = self.handlers.remove(&action).and_then(|entry| entry.after);
        self.handlers.insert(
            action,
            RouteEntry {
                on: boxed,
                after,
                skip_schema_validation,
            },
        );
        self
    }

    /// Register the post-response `after` hook for `action`. `on` must
    /// already be registered for this action.
    pub fn after<F, Fut>(&mut self, action: &str, handler: F) -> &mut Self
    where
        F: Fn(Value, HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, OcppError>> + Send + 'static,
    {
        if let Some(entry) = self.handlers.get_mut(action) {
            entry.after = Some(Arc::new(move |payload, ctx| Box::pin(handler(payload, ctx))));
        } else {
            warn!(action, "after() called before on(); ignoring");
        }
        self
    }

    /// Process one inbound wire-text frame (§4.D inbound lifecycle).
    ///
    /// Takes `self` by `Arc` so the handler-facing call capability (built in
    /// [`Router::handler_context`]) can close over a fresh reference to this
    /// router without the router type itself holding a back-pointer to
    /// anything (§9 design note).
    pub async fn route_message(self: Arc<Self>, text: &str, ctx: &RouterContext) {
        let frame = match codec::decode(text) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "dropping undecodable inbound frame");
                return;
            }
        };

        match frame {
            Frame::Call { .. } => self.handle_call(frame, ctx).await,
            Frame::CallResult { .. } | Frame::CallError { .. } => {
                let unique_id = frame.unique_id().to_owned();
                if !ctx.pending.deliver(frame) {
                    warn!(unique_id, "dropping reply with unknown or late unique_id");
                }
            }
        }
    }

    async fn handle_call(self: Arc<Self>, frame: Frame, ctx: &RouterContext) {
        let Frame::Call {
            unique_id,
            action,
            payload,
        } = &frame
        else {
            return;
        };

        let Some(entry_on_skip) = self.handlers.get(action).map(|e| (e.on.clone(), e.skip_schema_validation)) else {
            self.reply_error(&frame, ErrorKind::NotImplemented, format!("no handler for action {action}"), ctx)
                .await;
            return;
        };
        let (on_handler, skip_schema_validation) = entry_on_skip;

        if !skip_schema_validation {
            if let Some(shape) = self.version_adapter.shape_for(action, Direction::Request) {
                if let Err(violation) = shape.validate(payload) {
                    self.reply_error(&frame, violation.kind, violation.description, ctx)
                        .await;
                    return;
                }
            }
        }

        let handler_ctx = Arc::clone(&self).handler_context(ctx);
        let outcome = on_handler(payload.clone(), handler_ctx.clone()).await;

        match outcome {
            Ok(response_payload) => {
                let response_payload = if skip_schema_validation {
                    response_payload
                } else if let Some(shape) = self.version_adapter.shape_for(action, Direction::Response) {
                    match shape.validate(&response_payload) {
                        Ok(()) => response_payload,
                        Err(violation) => {
                            self.reply_error(&frame, violation.kind, violation.description, ctx)
                                .await;
                            return;
                        }
                    }
                } else {
                    response_payload
                };
                let reply = Frame::CallResult {
                    unique_id: unique_id.clone(),
                    payload: response_payload,
                };
                self.send(&reply, true, ctx).await;
            }
            Err(err) => {
                self.reply_error(&frame, err.kind(), err.to_string(), ctx).await;
                // Propagation policy (ii): handler failures never reach the
                // transport as a connection fault, and no further processing
                // happens on this frame — skip the `after` hook.
                return;
            }
        }

        if let Some(entry) = self.handlers.get(action) {
            if let Some(after) = entry.after.clone() {
                let request_payload = payload.clone();
                let after_ctx = handler_ctx;
                match self.after_mode {
                    AfterMode::Detached => {
                        tokio::spawn(async move {
                            if let Err(err) = after(request_payload, after_ctx).await {
                                warn!(error = %err, "after hook failed");
                            }
                        });
                    }
                    AfterMode::Inline => {
                        if let Err(err) = after(request_payload, after_ctx).await {
                            warn!(error = %err, "after hook failed");
                        }
                    }
                }
            }
        }
    }

    fn handler_context(self: Arc<Self>, ctx: &RouterContext) -> HandlerContext {
        let router = self;
        let session = ctx.clone();
        let call: CallCapability = Arc::new(move |action, payload| {
            let router = Arc::clone(&router);
            let session = session.clone();
            Box::pin(async move { router.call(&action, payload, &session).await })
        });
        HandlerContext::new(ctx.charging_station_id.clone(), ctx.subprotocol, call)
    }

    async fn reply_error(
        &self,
        call: &Frame,
        kind: ErrorKind,
        description: impl Into<String>,
        ctx: &RouterContext,
    ) {
        let description = description.into();
        #[expect(
            clippy::unwrap_used,
            reason = "reply_error is only ever invoked with a Call frame, by construction"
        )]
        let error_frame = codec::make_call_error_from(call, &kind, description).unwrap();
        self.send(&error_frame, true, ctx).await;
    }

    async fn send(&self, frame: &Frame, is_response: bool, ctx: &RouterContext) {
        let text = codec::encode(frame);
        if let Err(err) = ctx.transport.send(text, is_response).await {
            warn!(error = %err, unique_id = frame.unique_id(), "failed to send frame");
        }
    }

    /// Originate an outbound Call for `action` and await its matched reply
    /// (§4.D outbound `call`).
    ///
    /// # Errors
    ///
    /// Returns [`OcppError::Correlation`] on timeout or connection closure,
    /// or [`OcppError::Handler`] translated from a returned `CallError`.
    pub async fn call(
        self: Arc<Self>,
        action: &str,
        request_payload: Value,
        ctx: &RouterContext,
    ) -> Result<Value, OcppError> {
        let _guard = ctx.call_lock.lock().await;

        let unique_id = Uuid::new_v4().to_string();
        if let Some(shape) = self.version_adapter.shape_for(action, Direction::Request) {
            if let Err(violation) = shape.validate(&request_payload) {
                return Err(HandlerError::new(violation.kind, violation.description).into());
            }
        }
        let call_frame = Frame::Call {
            unique_id: unique_id.clone(),
            action: action.to_owned(),
            payload: request_payload,
        };

        let rx = ctx.pending.insert(unique_id.clone())?;
        *ctx.outstanding_call.lock().await = Some(unique_id.clone());
        debug!(action, unique_id, "sending outbound call");
        self.send(&call_frame, false, ctx).await;

        let reply = correlation::await_reply(&ctx.pending, &unique_id, rx, ctx.response_timeout).await;
        *ctx.outstanding_call.lock().await = None;
        let reply = reply?;

        match reply {
            Frame::CallError {
                error_code,
                error_description,
                ..
            } => Err(HandlerError::new(ErrorKind::from_wire_code(&error_code), error_description).into()),
            Frame::CallResult { payload, .. } => {
                if let Some(shape) = self.version_adapter.shape_for(action, Direction::Response) {
                    shape
                        .validate(&payload)
                        .map_err(|violation| OcppError::from(HandlerError::new(violation.kind, violation.description)))?;
                }
                info!(action, unique_id, "outbound call completed");
                Ok(payload)
            }
            Frame::Call { .. } => {
                // The Correlation Engine only ever delivers CallResult/CallError
                // frames (see route_message); a Call can never reach here.
                Err(HandlerError::new(ErrorKind::ProtocolError, "unexpected Call delivered as a reply").into())
            }
        }
    }
}
