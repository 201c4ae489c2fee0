use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use foodtour_shared::models::{
    InRouteResponse, Restaurant, RouteMutation, RouteResponse, RouteStopRequest, StopId,
};
use foodtour_shared::search::{search_catalog, TourSearchQuery, TourSearchResponse};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::AppError;
use crate::storage::RouteStorage;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub storage: Arc<RouteStorage>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub restaurants: usize,
    pub route_length: usize,
    pub db_size_bytes: u64,
    pub checked_at: DateTime<Utc>,
}

/// JSON API consumed by the route store client.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/tour/restaurants", get(restaurants))
        .route("/api/tour/search", post(search))
        .route("/api/tour/route/get", get(get_route))
        .route("/api/tour/route/add", post(add_stop))
        .route("/api/tour/route/remove", post(remove_stop))
        .route("/api/tour/route/clear", post(clear_route))
        .route("/api/tour/route/check/{id}", get(check_stop))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    Ok(Json(HealthResponse {
        status: "Food tour API is running!",
        restaurants: state.catalog.len(),
        route_length: state.storage.route()?.len(),
        db_size_bytes: state.storage.db_size_bytes()?,
        checked_at: Utc::now(),
    }))
}

async fn restaurants(State(state): State<AppState>) -> Json<Vec<Restaurant>> {
    Json(state.catalog.all().to_vec())
}

async fn search(
    State(state): State<AppState>,
    Json(query): Json<TourSearchQuery>,
) -> Json<TourSearchResponse> {
    let results = search_catalog(state.catalog.all(), &query);
    tracing::debug!(query = %query.query_text, hits = results.len(), "Catalog search");
    Json(TourSearchResponse {
        query: query.query_text,
        search_by: query.search_by,
        count: results.len(),
        results,
    })
}

async fn get_route(State(state): State<AppState>) -> Result<Json<RouteResponse<Restaurant>>, AppError> {
    let route = state.catalog.resolve(&state.storage.route()?);
    Ok(Json(RouteResponse {
        count: route.len(),
        route,
    }))
}

async fn add_stop(
    State(state): State<AppState>,
    payload: Result<Json<RouteStopRequest>, JsonRejection>,
) -> Result<Json<RouteMutation>, AppError> {
    let id = restaurant_id(payload)?;
    if state.catalog.find(id).is_none() {
        return Err(AppError::UnknownRestaurant(id));
    }
    Ok(Json(state.storage.add(id)?))
}

async fn remove_stop(
    State(state): State<AppState>,
    payload: Result<Json<RouteStopRequest>, JsonRejection>,
) -> Result<Json<RouteMutation>, AppError> {
    let id = restaurant_id(payload)?;
    Ok(Json(state.storage.remove(id)?))
}

async fn clear_route(State(state): State<AppState>) -> Result<Json<RouteMutation>, AppError> {
    Ok(Json(state.storage.clear()?))
}

async fn check_stop(
    State(state): State<AppState>,
    Path(id): Path<StopId>,
) -> Result<Json<InRouteResponse>, AppError> {
    Ok(Json(InRouteResponse {
        restaurant_id: id,
        in_route: state.storage.contains(id)?,
    }))
}

fn restaurant_id(payload: Result<Json<RouteStopRequest>, JsonRejection>) -> Result<StopId, AppError> {
    let Json(body) = payload.map_err(|e| AppError::MalformedPayload(e.body_text()))?;
    body.restaurant_id.ok_or(AppError::MissingRestaurantId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use foodtour_shared::models::RouteMutationStatus;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    fn test_app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let storage = RouteStorage::open(&dir.path().join("route.redb")).unwrap();
        let state = AppState {
            catalog: Arc::new(catalog::tests::sample()),
            storage,
        };
        (dir, api_router(state))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> T {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_get_returns_full_entries_in_order() {
        let (_dir, app) = test_app();
        send(&app, "POST", "/api/tour/route/add", Some(r#"{"restaurant_id":3}"#)).await;
        let resp = send(&app, "POST", "/api/tour/route/add", Some(r#"{"restaurant_id":1}"#)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let added: RouteMutation = json(resp).await;
        assert_eq!(added.status, RouteMutationStatus::Added);
        assert_eq!(added.route, vec![3, 1]);

        let resp = send(&app, "GET", "/api/tour/route/get", None).await;
        let route: RouteResponse<Restaurant> = json(resp).await;
        assert_eq!(route.count, 2);
        assert_eq!(route.route[0].name, "Cơm Tấm Ba Ghiền");
        assert_eq!(route.route[1].id, 1);
    }

    #[tokio::test]
    async fn test_add_twice_reports_already_exists() {
        let (_dir, app) = test_app();
        send(&app, "POST", "/api/tour/route/add", Some(r#"{"restaurant_id":2}"#)).await;
        let resp = send(&app, "POST", "/api/tour/route/add", Some(r#"{"restaurant_id":2}"#)).await;
        let again: RouteMutation = json(resp).await;
        assert_eq!(again.status, RouteMutationStatus::AlreadyExists);
        assert_eq!(again.route, vec![2]);
    }

    #[tokio::test]
    async fn test_missing_restaurant_id_is_bad_request() {
        let (_dir, app) = test_app();
        let resp = send(&app, "POST", "/api/tour/route/add", Some("{}")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = json(resp).await;
        assert_eq!(body["error"], "Missing restaurant_id");

        let resp = send(&app, "POST", "/api/tour/route/remove", Some(r#"{"restaurant_id":null}"#)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_restaurant_cannot_be_added() {
        let (_dir, app) = test_app();
        let resp = send(&app, "POST", "/api/tour/route/add", Some(r#"{"restaurant_id":404}"#)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_remove_and_check() {
        let (_dir, app) = test_app();
        send(&app, "POST", "/api/tour/route/add", Some(r#"{"restaurant_id":1}"#)).await;

        let resp = send(&app, "GET", "/api/tour/route/check/1", None).await;
        let check: InRouteResponse = json(resp).await;
        assert!(check.in_route);

        let resp = send(&app, "POST", "/api/tour/route/remove", Some(r#"{"restaurant_id":1}"#)).await;
        let removed: RouteMutation = json(resp).await;
        assert_eq!(removed.status, RouteMutationStatus::Removed);

        let resp = send(&app, "POST", "/api/tour/route/remove", Some(r#"{"restaurant_id":1}"#)).await;
        let missing: RouteMutation = json(resp).await;
        assert_eq!(missing.status, RouteMutationStatus::NotFound);

        let resp = send(&app, "GET", "/api/tour/route/check/1", None).await;
        let check: InRouteResponse = json(resp).await;
        assert_eq!(check.restaurant_id, 1);
        assert!(!check.in_route);
    }

    #[tokio::test]
    async fn test_clear_empties_route() {
        let (_dir, app) = test_app();
        send(&app, "POST", "/api/tour/route/add", Some(r#"{"restaurant_id":1}"#)).await;
        let resp = send(&app, "POST", "/api/tour/route/clear", None).await;
        let cleared: RouteMutation = json(resp).await;
        assert_eq!(cleared.status, RouteMutationStatus::Cleared);

        let resp = send(&app, "GET", "/api/tour/route/get", None).await;
        let route: RouteResponse<Restaurant> = json(resp).await;
        assert_eq!(route.count, 0);
    }

    #[tokio::test]
    async fn test_restaurants_and_search() {
        let (_dir, app) = test_app();
        let resp = send(&app, "GET", "/api/tour/restaurants", None).await;
        let all: Vec<Restaurant> = json(resp).await;
        assert_eq!(all.len(), 3);

        let resp = send(
            &app,
            "POST",
            "/api/tour/search",
            Some(r#"{"queryText":"bánh mì","searchBy":"name"}"#),
        )
        .await;
        let found: TourSearchResponse = json(resp).await;
        assert_eq!(found.count, 1);
        assert_eq!(found.results[0].restaurant.id, 2);
        assert_eq!(found.results[0].match_field, "name");
    }

    #[tokio::test]
    async fn test_health_reports_counts() {
        let (_dir, app) = test_app();
        send(&app, "POST", "/api/tour/route/add", Some(r#"{"restaurant_id":1}"#)).await;
        let resp = send(&app, "GET", "/api/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = json(resp).await;
        assert_eq!(body["restaurants"], 3);
        assert_eq!(body["route_length"], 1);
    }
}
