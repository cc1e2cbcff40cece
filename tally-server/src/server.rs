use {
    std::net::SocketAddr,
    tokio::{net::TcpListener, signal},
    hyper::server::conn::http1,
    hyper_util::{rt::{TokioIo, TokioTimer}, server::graceful::GracefulShutdown},
    tracing::{info, error},
    crate::{
        handler::CounterHandler,
        metrics::{Metrics, run_metrics_server},
        store::BoxedStore,
    },
};

pub struct TallyServer {
    handler: CounterHandler,
    metrics: Metrics,
    port: u16,
    metrics_port: u16,
}

impl TallyServer {
    pub fn new(store: BoxedStore, port: u16, metrics_port: u16) -> Self {
        let metrics = Metrics::new();
        Self {
            handler: CounterHandler::new(store, metrics.clone()),
            metrics,
            port,
            metrics_port,
        }
    }

    pub async fn serve(&self) {
        info!("starting tally server");

        tokio::select! {
            _ = self.run_http_listener() => {},
            _ = run_metrics_server(self.metrics.clone(), self.metrics_port) => {},
        }
    }

    async fn run_http_listener(&self) {
        let addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let listener = match TcpListener::bind(addr).await {
            Ok(v) => v,
            Err(err) => {
                error!("failed to bind tcp listener for http server: {err:?}");
                return;
            }
        };
        let graceful = GracefulShutdown::new();

        info!("started http server on {addr:?}");
        loop {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("shutdown signal received - stopping http server.");
                    break;
                },
                connection = listener.accept() => {
                    let (tcp, _) = match connection {
                        Ok(v) => v,
                        Err(err) => {
                            error!("failed to accept http connection: {err:?}");
                            continue;
                        }
                    };
                    let io = TokioIo::new(tcp);

                    let handler = self.handler.clone();
                    let conn = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .serve_connection(io, handler);
                    let fut = graceful.watch(conn);
                    tokio::task::spawn(async move {
                        if let Err(err) = fut.await {
                            if err.is_timeout() {
                                // ignore timeouts, because those can be caused by client
                            } else if err.is_incomplete_message() {
                                // ignore incomplete messages, because those are caused by client
                            } else {
                                // this is also where a failed invocation surfaces: the
                                // handler produces no error body, the connection reports it
                                error!("error while handling http request: {err:?}");
                            }
                        }
                    });
                }
            }
        }

        drop(listener);
        graceful.shutdown().await;
        info!("stopped http server.");
    }
}
