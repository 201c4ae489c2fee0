use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::models::{InRouteResponse, Restaurant, RouteMutation, RouteResponse, RouteStopRequest, Stop, StopId};
use crate::route_store::{RouteStore, RouteStoreError};
use crate::search::{TourSearchQuery, TourSearchResponse};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Route store reached over the backend's JSON API.
#[derive(Debug, Clone)]
pub struct HttpRouteStore {
    base_url: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpRouteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpRouteStore {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Per-request timeout, enforced on native and browser targets alike.
    /// `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        build_url(&self.base_url, path)
    }

    /// Full restaurant catalog, for building a route.
    pub async fn restaurants(&self) -> Result<Vec<Restaurant>, RouteStoreError> {
        self.send(self.client.get(self.url("restaurants"))).await
    }

    pub async fn search(&self, query: &TourSearchQuery) -> Result<TourSearchResponse, RouteStoreError> {
        self.send(self.client.post(self.url("search")).json(query)).await
    }

    async fn mutate(&self, path: &str, id: Option<StopId>) -> Result<RouteMutation, RouteStoreError> {
        let body = RouteStopRequest { restaurant_id: id };
        self.send(self.client.post(self.url(path)).json(&body)).await
    }

    fn with_deadline(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.timeout {
            Some(t) => req.timeout(t),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, RouteStoreError> {
        let resp = self.with_deadline(req).send().await.map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RouteStoreError::Rejected(format!("{status}: {body}")));
        }

        resp.json::<T>()
            .await
            .map_err(|e| RouteStoreError::Decode(e.to_string()))
    }
}

impl RouteStore for HttpRouteStore {
    async fn fetch_route(&self) -> Result<Vec<Stop>, RouteStoreError> {
        let resp: RouteResponse<Stop> = self.send(self.client.get(self.url("route/get"))).await?;
        Ok(resp.route)
    }

    async fn add_stop(&self, id: StopId) -> Result<RouteMutation, RouteStoreError> {
        self.mutate("route/add", Some(id)).await
    }

    async fn remove_stop(&self, id: StopId) -> Result<RouteMutation, RouteStoreError> {
        self.mutate("route/remove", Some(id)).await
    }

    async fn clear(&self) -> Result<RouteMutation, RouteStoreError> {
        self.mutate("route/clear", None).await
    }

    async fn contains(&self, id: StopId) -> Result<bool, RouteStoreError> {
        let resp: InRouteResponse = self
            .send(self.client.get(self.url(&format!("route/check/{id}"))))
            .await?;
        Ok(resp.in_route)
    }
}

pub fn build_url(base_url: &str, path: &str) -> String {
    format!("{}/api/tour/{}", base_url.trim_end_matches('/'), path)
}

fn classify(e: reqwest::Error) -> RouteStoreError {
    if e.is_timeout() {
        RouteStoreError::Timeout
    } else if is_connect(&e) {
        RouteStoreError::Connect(e.to_string())
    } else if e.is_decode() {
        RouteStoreError::Decode(e.to_string())
    } else {
        RouteStoreError::Rejected(e.to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn is_connect(e: &reqwest::Error) -> bool {
    e.is_connect()
}

#[cfg(target_arch = "wasm32")]
fn is_connect(e: &reqwest::Error) -> bool {
    e.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_joins_without_double_slash() {
        assert_eq!(
            build_url("http://localhost:3000/", "route/get"),
            "http://localhost:3000/api/tour/route/get"
        );
        assert_eq!(
            build_url("https://food.example.vn", "route/check/4"),
            "https://food.example.vn/api/tour/route/check/4"
        );
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let store = HttpRouteStore::new("http://localhost:3000/");
        assert_eq!(store.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_requests_carry_the_timeout() {
        let store = HttpRouteStore::new("http://localhost:3000");
        assert_eq!(store.timeout(), Some(DEFAULT_TIMEOUT));
        let req = store
            .with_deadline(store.client.get(store.url("route/get")))
            .build()
            .unwrap();
        assert_eq!(req.timeout(), Some(&DEFAULT_TIMEOUT));

        let patient = store.with_timeout(None);
        let req = patient
            .with_deadline(patient.client.get(patient.url("route/get")))
            .build()
            .unwrap();
        assert_eq!(req.timeout(), None);
    }

    #[test]
    fn test_stop_request_body_shape() {
        let body = serde_json::to_value(RouteStopRequest { restaurant_id: Some(12) }).unwrap();
        assert_eq!(body, serde_json::json!({ "restaurant_id": 12 }));
    }
}
