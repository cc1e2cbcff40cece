use {
    std::{net::SocketAddr, pin::Pin},
    tracing::error,
    tokio::net::TcpListener,
    hyper::{Request, body::{Incoming, Bytes}, Response, server::conn::http1, http::StatusCode},
    hyper_util::rt::{TokioIo, TokioTimer},
    http_body_util::Full,
    thiserror::Error,
    prometheus::{
        TextEncoder,
        Registry,
        IntGauge,
        IntCounter,
        register_int_gauge_with_registry,
        register_int_counter_with_registry,
    },
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    pub(crate) http_requests_total: IntCounter,
    pub(crate) http_requests_in_flight: IntGauge,
    pub(crate) store_increments_total: IntCounter,
}

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("failed to collect: {reason}")]
    FailedToCollect {
        reason: String
    },
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = register_int_counter_with_registry!("http_requests_total", "total http requests processed", registry).unwrap();
        let http_requests_in_flight = register_int_gauge_with_registry!("http_requests_in_flight", "http requests being processed", registry).unwrap();
        let store_increments_total = register_int_counter_with_registry!("store_increments_total", "total increments applied to the counter store", registry).unwrap();

        Self {
            http_requests_total,
            http_requests_in_flight,
            store_increments_total,

            registry,
        }
    }

    pub fn encode(&self) -> Result<String, MetricsError> {
        let metrics = self.registry.gather();
        let encoder = TextEncoder::new();
        encoder.encode_to_string(&metrics)
            .map_err(|err| MetricsError::FailedToCollect { reason: format!("{err:?}") })
    }
}

pub async fn run_metrics_server(metrics: Metrics, port: u16) {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let listener = match TcpListener::bind(addr).await {
        Ok(v) => v,
        Err(err) => {
            error!("failed to create TcpListener for metrics server: {err:?}");
            return;
        }
    };

    println!("running metrics server on {addr:?}");

    let metrics_server = MetricsServer::new(metrics);

    loop {
        let (tcp, _) = match listener.accept().await {
            Ok(v) => v,
            Err(err) => {
                error!("failed to accept connection in metrics server: {err:?}");
                continue;
            }
        };
        let io = TokioIo::new(tcp);
        let metrics_server = metrics_server.clone();
        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .serve_connection(io, metrics_server)
                .await {
                    error!("error while handling metrics request: {err:?}");
                }
        });
    }
}

#[derive(Clone)]
struct MetricsServer {
    metrics: Metrics,
}

impl MetricsServer {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics,
        }
    }
}

impl hyper::service::Service<Request<Incoming>> for MetricsServer {
    type Response = Response<Full<Bytes>>;
    type Error = MetricsError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, _req: Request<Incoming>) -> Self::Future {
        let metrics = match self.metrics.encode() {
            Ok(v) => v,
            Err(err) => {
                error!("failed to encode metrics: {err:?}");
                return Box::pin(async move {
                    let mut response = Response::new(Full::new(Bytes::from("internal server error.\n")));
                    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    Ok(response)
                });
            }
        };
        Box::pin(async move { Ok(Response::new(Full::new(Bytes::from(metrics)))) })
    }
}
