use {
    std::pin::Pin,
    tracing::error,
    hyper::{Response, body::Bytes, header::HeaderValue},
    http_body_util::Full,
    futures::{future::BoxFuture, FutureExt},
    tally_core::{HttpResponse, VisitorCount},
    crate::{
        error::HandlerError,
        metrics::Metrics,
        store::{BoxedStore, CounterStore},
    },
};

/// Fixed identifier of the counter record. One record per table.
pub const VISITOR_COUNT_KEY: &str = "visitor_count";

#[derive(Clone)]
pub struct CounterHandler {
    store: BoxedStore,
    metrics: Metrics,
}

impl CounterHandler {
    pub fn new(store: BoxedStore, metrics: Metrics) -> Self {
        Self {
            store,
            metrics,
        }
    }
}

// generic over the body: the request only triggers the invocation and is
// never inspected
impl<B> hyper::service::Service<hyper::Request<B>> for CounterHandler {
    type Response = Response<Full<Bytes>>;
    type Error = HandlerError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, _req: hyper::Request<B>) -> Self::Future {
        Box::pin(CounterHandlerFuture::new(self.store.clone(), self.metrics.clone()))
    }
}

struct CounterHandlerFuture<'a> {
    inner: BoxFuture<'a, Result<Response<Full<Bytes>>, HandlerError>>,
}

impl<'a> CounterHandlerFuture<'a> {
    fn new(store: BoxedStore, metrics: Metrics) -> Self {
        metrics.http_requests_in_flight.inc();
        let metric_guard_http_requests_in_flight = MetricGaugeDecreaseGuard::wrap(metrics.http_requests_in_flight.clone());

        let inner = Box::pin(async move {
            // exactly one durable mutation per invocation, no retries
            let quantity = match store.add(VISITOR_COUNT_KEY, 1).await {
                Ok(v) => v,
                Err(err) => {
                    error!("failed to increment visitor count: {err:?}");
                    return Err(HandlerError::Store { error: err });
                }
            };
            metrics.store_increments_total.inc();

            let body = serde_json::to_vec(&VisitorCount::from_quantity(quantity))
                .map_err(|err| HandlerError::SerializationError { reason: format!("{err:?}") })?;

            let counter_response = HttpResponse::new()
                .with_header("Access-Control-Allow-Origin", HeaderValue::from_static("*"))
                .with_header("Access-Control-Allow-Headers", HeaderValue::from_static("Content-Type"))
                .with_header("Access-Control-Allow-Methods", HeaderValue::from_static("GET"))
                .with_body(body);

            let mut response = Response::new(Full::new(Bytes::from(counter_response.body)));
            *response.status_mut() = counter_response.status;
            *response.headers_mut() = counter_response.headers;
            drop(metric_guard_http_requests_in_flight);
            metrics.http_requests_total.inc();

            Ok(response)
        });

        Self {
            inner,
        }
    }
}

impl<'a> Future for CounterHandlerFuture<'a> {
    type Output = Result<Response<Full<Bytes>>, HandlerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> std::task::Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

struct MetricGaugeDecreaseGuard {
    gauge: prometheus::core::GenericGauge<prometheus::core::AtomicI64>,
}

impl MetricGaugeDecreaseGuard {
    fn wrap(gauge: prometheus::core::GenericGauge<prometheus::core::AtomicI64>) -> Self {
        Self { gauge }
    }
}

impl Drop for MetricGaugeDecreaseGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}
