//! Application Shell (§4.G): composes routers, negotiates subprotocols on
//! accept, and surfaces lifecycle callbacks to the host process.
//!
//! Registration mirrors the Router's explicit-method style (§9) rather than
//! a subclassing/decorator-based override: a host supplies plain closures
//! via [`ApplicationShell::on_connect`] etc. instead of overriding virtual
//! methods on an `ASGIApplication` subclass (the source's shape).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::correlation::{DEFAULT_RESPONSE_TIMEOUT, PendingCallTable};
use crate::router::{Router, RouterContext, Scope};
use crate::transport::SessionTransport;
use crate::version::Subprotocol;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Invoked once a session's [`RouterContext`] exists, before it starts
/// receiving frames. Returning `false` rejects the session.
pub type ConnectHook = Arc<dyn Fn(RouterContext) -> BoxFuture<bool> + Send + Sync>;
/// Invoked once a session ends, with its identity, subprotocol, and close code.
pub type DisconnectHook = Arc<dyn Fn(String, Subprotocol, u16) -> BoxFuture<()> + Send + Sync>;
/// Invoked once at process startup or shutdown.
pub type LifecycleHook = Arc<dyn Fn() -> BoxFuture<()> + Send + Sync>;

async fn default_connect(_ctx: RouterContext) -> bool {
    true
}

async fn default_disconnect(charging_station_id: String, subprotocol: Subprotocol, code: u16) {
    info!(charging_station_id, subprotocol = subprotocol.wire_tag(), code, "session disconnected");
}

async fn default_lifecycle() {}

/// Holds one [`Router`] per negotiable subprotocol, the process-wide
/// Pending-Call Table they all share, and the host's lifecycle hooks (§4.G).
pub struct ApplicationShell {
    routers: HashMap<Subprotocol, Arc<Router>>,
    pending: Arc<PendingCallTable>,
    response_timeout: Duration,
    on_connect_hook: ConnectHook,
    on_disconnect_hook: DisconnectHook,
    on_startup_hook: LifecycleHook,
    on_shutdown_hook: LifecycleHook,
}

impl ApplicationShell {
    /// Build a shell from a fixed `subprotocol → Router` mapping, installed
    /// once at process start (§3: "the set is fixed at process start").
    #[must_use]
    pub fn new(routers: HashMap<Subprotocol, Arc<Router>>) -> Self {
        Self {
            routers,
            pending: Arc::new(PendingCallTable::new()),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            on_connect_hook: Arc::new(|ctx| Box::pin(default_connect(ctx))),
            on_disconnect_hook: Arc::new(|id, subprotocol, code| {
                Box::pin(default_disconnect(id, subprotocol, code))
            }),
            on_startup_hook: Arc::new(|| Box::pin(default_lifecycle())),
            on_shutdown_hook: Arc::new(|| Box::pin(default_lifecycle())),
        }
    }

    /// Override the default `response_timeout` every session gets.
    #[must_use]
    pub const fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Register the `on_connect` hook; may reject a session by returning `false`.
    #[must_use]
    pub fn on_connect<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(RouterContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.on_connect_hook = Arc::new(move |ctx| Box::pin(hook(ctx)));
        self
    }

    /// Register the `on_disconnect` hook.
    #[must_use]
    pub fn on_disconnect_hook<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(String, Subprotocol, u16) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_disconnect_hook = Arc::new(move |id, subprotocol, code| Box::pin(hook(id, subprotocol, code)));
        self
    }

    /// Register the `on_startup` hook.
    #[must_use]
    pub fn on_startup<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_startup_hook = Arc::new(move || Box::pin(hook()));
        self
    }

    /// Register the `on_shutdown` hook.
    #[must_use]
    pub fn on_shutdown<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_shutdown_hook = Arc::new(move || Box::pin(hook()));
        self
    }

    /// Run the registered `on_startup` hook.
    pub async fn startup(&self) {
        (self.on_startup_hook)().await;
    }

    /// Run the registered `on_shutdown` hook.
    pub async fn shutdown(&self) {
        (self.on_shutdown_hook)().await;
    }

    /// Pick the highest-ranked subprotocol present in both `offered` and the
    /// installed router set (§4.G, §6). Returns `None` if disjoint.
    #[must_use]
    pub fn negotiate(&self, offered: &[String]) -> Option<Subprotocol> {
        Subprotocol::ranked_order()
            .into_iter()
            .find(|candidate| self.routers.contains_key(candidate) && offered.iter().any(|tag| tag == candidate.wire_tag()))
    }

    /// Build a session context for `charging_station_id` on `subprotocol`
    /// and run `on_connect`. Returns `None` if the hook rejects the session.
    pub async fn accept(
        &self,
        charging_station_id: impl Into<String>,
        subprotocol: Subprotocol,
        transport: Arc<dyn SessionTransport>,
        scope: Scope,
    ) -> Option<(Arc<Router>, RouterContext)> {
        let router = Arc::clone(self.routers.get(&subprotocol)?);
        let ctx = RouterContext::new(charging_station_id, subprotocol, transport, Arc::clone(&self.pending), scope)
            .with_response_timeout(self.response_timeout);

        if !(self.on_connect_hook)(ctx.clone()).await {
            info!(
                charging_station_id = %ctx.charging_station_id,
                subprotocol = subprotocol.wire_tag(),
                "session rejected by on_connect hook"
            );
            return None;
        }
        info!(
            charging_station_id = %ctx.charging_station_id,
            subprotocol = subprotocol.wire_tag(),
            "session accepted"
        );
        Some((router, ctx))
    }

    /// Run the registered `on_disconnect` hook.
    pub async fn on_disconnect(&self, charging_station_id: impl Into<String>, subprotocol: Subprotocol, code: u16) {
        (self.on_disconnect_hook)(charging_station_id.into(), subprotocol, code).await;
    }

    /// Number of calls currently in flight across every session, exposed for
    /// tests asserting invariant 5 at the shell level.
    #[must_use]
    pub fn pending_call_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::transport::TransportError;
    use crate::version::VersionAdapter;

    struct NullTransport;

    #[async_trait]
    impl SessionTransport for NullTransport {
        async fn send(&self, _text: String, _is_response: bool) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn shell_with(subprotocols: &[Subprotocol]) -> ApplicationShell {
        let mut routers = HashMap::new();
        for subprotocol in subprotocols {
            routers.insert(*subprotocol, Arc::new(Router::new(*subprotocol, Arc::new(VersionAdapter::new(*subprotocol)))));
        }
        ApplicationShell::new(routers)
    }

    #[rstest]
    fn negotiate_prefers_highest_ranked_shared_subprotocol() {
        let shell = shell_with(&[Subprotocol::V16, Subprotocol::V201]);
        let offered = vec!["ocpp1.6".to_owned(), "ocpp2.0.1".to_owned()];
        assert_eq!(shell.negotiate(&offered), Some(Subprotocol::V201));
    }

    #[rstest]
    fn negotiate_rejects_disjoint_offer() {
        let shell = shell_with(&[Subprotocol::V201]);
        let offered = vec!["ocpp1.6".to_owned()];
        assert_eq!(shell.negotiate(&offered), None);
    }

    #[rstest]
    #[tokio::test]
    async fn accept_runs_on_connect_hook() {
        let invoked = Arc::new(AtomicBool::new(false));
        let invoked_clone = Arc::clone(&invoked);
        let shell = shell_with(&[Subprotocol::V16]).on_connect(move |_ctx| {
            let invoked = Arc::clone(&invoked_clone);
            async move {
                invoked.store(true, Ordering::SeqCst);
                true
            }
        });

        let accepted = shell
            .accept("cs-1", Subprotocol::V16, Arc::new(NullTransport), Scope::new())
            .await;

        assert!(accepted.is_some());
        assert!(invoked.load(Ordering::SeqCst));
    }

    #[rstest]
    #[tokio::test]
    async fn accept_honours_rejection() {
        let shell = shell_with(&[Subprotocol::V16]).on_connect(|_ctx| async { false });
        let accepted = shell
            .accept("cs-1", Subprotocol::V16, Arc::new(NullTransport), Scope::new())
            .await;
        assert!(accepted.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn accept_rejects_unnegotiated_subprotocol() {
        let shell = shell_with(&[Subprotocol::V16]);
        let accepted = shell
            .accept("cs-1", Subprotocol::V201, Arc::new(NullTransport), Scope::new())
            .await;
        assert!(accepted.is_none());
    }
}
