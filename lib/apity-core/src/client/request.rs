use std::fmt::Debug;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::response::parse_response;
use super::{ApiClientError, ApiResponse, Fetch, FetchParams, Middleware, Next};

/// One assembled request together with the transport and the middleware used to send it.
///
/// Reloading replays the same exchange.
#[derive(Clone)]
pub(crate) struct Exchange {
    params: FetchParams,
    fetch: Arc<dyn Fetch>,
    middleware: Arc<[Arc<dyn Middleware>]>,
}

impl Exchange {
    pub(crate) fn new(
        params: FetchParams,
        fetch: Arc<dyn Fetch>,
        middleware: Arc<[Arc<dyn Middleware>]>,
    ) -> Self {
        Self {
            params,
            fetch,
            middleware,
        }
    }

    /// Sends the request and parses the response, never failing.
    async fn run<R>(self) -> ApiResponse<R>
    where
        R: DeserializeOwned,
    {
        let Self {
            params,
            fetch,
            middleware,
        } = self;
        let url = params.url.clone();

        match Next::new(fetch, middleware).run(params).await {
            Ok(response) => parse_response(response).await.decode::<R>(),
            Err(error) => {
                warn!(%url, %error, "transport failure");
                ApiResponse::transport_failure()
            }
        }
    }
}

impl Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("params", &self.params)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

/// The single-resolution result of one invocation.
///
/// A settlement is resolved once, with the response of the invocation that created it,
/// and then keeps that response. It can be polled with [`try_get`](Self::try_get) or
/// awaited, directly or through [`wait`](Self::wait).
pub struct Settlement<R> {
    rx: watch::Receiver<Option<ApiResponse<R>>>,
}

impl<R> Settlement<R>
where
    R: Clone + Send + Sync + 'static,
{
    fn pending() -> (watch::Sender<Option<ApiResponse<R>>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self { rx })
    }

    /// Returns `true` once the invocation has completed.
    pub fn is_settled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Returns the response if the invocation has completed.
    pub fn try_get(&self) -> Option<ApiResponse<R>> {
        self.rx.borrow().clone()
    }

    /// Waits for the invocation to complete.
    ///
    /// An invocation dropped before completing (its runtime shut down) settles as a
    /// transport failure.
    pub async fn wait(mut self) -> ApiResponse<R> {
        let response = self
            .rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|settled| settled.clone());

        match response {
            Some(response) => response,
            None => {
                warn!("invocation dropped before settling");
                ApiResponse::transport_failure()
            }
        }
    }
}

impl<R> Clone for Settlement<R> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<R> Debug for Settlement<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settlement")
            .field("settled", &self.rx.borrow().is_some())
            .finish()
    }
}

impl<R> IntoFuture for Settlement<R>
where
    R: Clone + Send + Sync + 'static,
{
    type Output = ApiResponse<R>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

/// The reactive handle of one typed call invocation.
///
/// The first request is sent as soon as the handle is created. The handle exposes:
///
/// - [`resp`](Self::resp): an observable of the current [`ApiResponse`], `None` until the
///   first response
/// - [`ready`](Self::ready): an observable of the latest invocation [`Settlement`]
/// - [`reload`](Self::reload): sends the same request again
/// - [`on_data`](Self::on_data): waits for the latest invocation
///
/// Only the latest invocation publishes its response: the result of an invocation
/// superseded by a [`reload`](Self::reload) only resolves its own settlement.
///
/// Clones share the same state.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example(request: apity_core::ApiRequest<serde_json::Value>) {
/// let mut resp = request.resp();
///
/// let response = request.on_data().await;
/// assert_eq!(resp.borrow_and_update().as_ref(), Some(&response));
///
/// let reloaded = request.reload().await;
/// # }
/// ```
pub struct ApiRequest<R> {
    inner: Arc<Inner<R>>,
}

struct Inner<R> {
    exchange: Exchange,
    handle: Handle,
    generation: AtomicU64,
    resp: watch::Sender<Option<ApiResponse<R>>>,
    ready: watch::Sender<Settlement<R>>,
}

impl<R> ApiRequest<R>
where
    R: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Creates the handle and starts the first invocation on the current tokio runtime.
    pub(crate) fn start(exchange: Exchange) -> Result<Self, ApiClientError> {
        let handle = Handle::try_current()?;
        let (_, pending) = Settlement::pending();
        let (resp, _) = watch::channel(None);
        let (ready, _) = watch::channel(pending);

        let result = Self {
            inner: Arc::new(Inner {
                exchange,
                handle,
                generation: AtomicU64::new(0),
                resp,
                ready,
            }),
        };
        result.invoke();
        Ok(result)
    }

    fn invoke(&self) -> Settlement<R> {
        let (tx, settlement) = Settlement::pending();

        // The bump and the publish check of a completing invocation share the `resp` lock.
        let mut generation = 0;
        self.inner.resp.send_if_modified(|_| {
            generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            self.inner.ready.send_replace(settlement.clone());
            false
        });
        debug!(generation, url = %self.inner.exchange.params.url, "invoking");

        let inner = Arc::clone(&self.inner);
        self.inner.handle.spawn(async move {
            let response = inner.exchange.clone().run::<R>().await;

            let published = inner.resp.send_if_modified(|current| {
                if inner.generation.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *current = Some(response.clone());
                true
            });
            if !published {
                debug!(generation, "superseded response not published");
            }

            tx.send_replace(Some(response));
        });

        settlement
    }

    /// Returns an observable of the current response, `None` until the first one.
    pub fn resp(&self) -> watch::Receiver<Option<ApiResponse<R>>> {
        self.inner.resp.subscribe()
    }

    /// Returns the current response, `None` until the first one.
    pub fn current(&self) -> Option<ApiResponse<R>> {
        self.inner.resp.borrow().clone()
    }

    /// Returns an observable of the latest invocation settlement.
    pub fn ready(&self) -> watch::Receiver<Settlement<R>> {
        self.inner.ready.subscribe()
    }

    /// Returns `true` while the latest invocation is in flight.
    pub fn is_loading(&self) -> bool {
        !self.inner.ready.borrow().is_settled()
    }

    /// Waits for the latest invocation and returns its response.
    pub async fn on_data(&self) -> ApiResponse<R> {
        let settlement = self.inner.ready.borrow().clone();
        settlement.wait().await
    }

    /// Sends the request again.
    ///
    /// The returned settlement resolves with the response of this invocation, even if
    /// another reload supersedes it.
    pub fn reload(&self) -> Settlement<R> {
        debug!("reloading");
        self.invoke()
    }
}

impl<R> Clone for ApiRequest<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> Debug for ApiRequest<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequest")
            .field("exchange", &self.inner.exchange)
            .field("generation", &self.inner.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
