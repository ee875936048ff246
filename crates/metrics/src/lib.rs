use anyhow::Result;
use hyper::{
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::net::SocketAddr;
use tracing::{info, warn};

#[derive(Clone)]
pub struct MetricsHandle {
    registry: Registry,
    requests: IntCounter,
    request_errors: IntCounter,
    predictions_submitted: IntCounter,
    votes: IntCounter,
    watchlist_toggles: IntCounter,
}

impl MetricsHandle {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let counter = |name: &str, help: &str| -> Result<IntCounter> {
            let counter = IntCounter::new(name, help)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let requests = counter("dashboard_requests_total", "dashboard requests handled")?;
        let request_errors = counter(
            "dashboard_request_errors_total",
            "dashboard requests answered with an error",
        )?;
        let predictions_submitted =
            counter("predictions_submitted_total", "price predictions accepted")?;
        let votes = counter("prediction_votes_total", "votes recorded on predictions")?;
        let watchlist_toggles = counter("watchlist_toggles_total", "watchlist star toggles")?;

        Ok(Self {
            registry,
            requests,
            request_errors,
            predictions_submitted,
            votes,
            watchlist_toggles,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn requests(&self) -> &IntCounter {
        &self.requests
    }

    pub fn request_errors(&self) -> &IntCounter {
        &self.request_errors
    }

    pub fn predictions_submitted(&self) -> &IntCounter {
        &self.predictions_submitted
    }

    pub fn votes(&self) -> &IntCounter {
        &self.votes
    }

    pub fn watchlist_toggles(&self) -> &IntCounter {
        &self.watchlist_toggles
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> Result<Vec<u8>> {
        encode(&self.registry)
    }

    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        let registry = self.registry.clone();
        let make_svc = make_service_fn(move |_| {
            let registry = registry.clone();
            async move {
                Ok::<_, hyper::Error>(service_fn(move |_req: Request<Body>| {
                    let registry = registry.clone();
                    async move { Ok::<_, hyper::Error>(exposition(&registry)) }
                }))
            }
        });

        let server = Server::bind(&addr).serve(make_svc);
        info!(%addr, "metrics exporter listening");
        server.await?;
        Ok(())
    }
}

fn encode(registry: &Registry) -> Result<Vec<u8>> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok(buffer)
}

fn exposition(registry: &Registry) -> Response<Body> {
    let encoder = TextEncoder::new();
    let mut response = match encode(registry) {
        Ok(buffer) => Response::new(Body::from(buffer)),
        Err(err) => {
            warn!(error = ?err, "failed to encode metrics");
            let mut response = Response::new(Body::from("metrics encoding failed"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return response;
        }
    };
    if let Ok(value) = encoder.format_type().parse::<hyper::header::HeaderValue>() {
        response
            .headers_mut()
            .insert(hyper::header::CONTENT_TYPE, value);
    }
    response
}
