use foodtour_shared::client::HttpRouteStore;

/// API origin baked in at build time, for deployments where the frontend
/// is served from a different host than the route service.
const COMPILED_API_URL: Option<&str> = option_env!("FOODTOUR_API_URL");

/// Pick the API origin: the build-time override if set, else the page origin.
pub fn resolve_api_base(compiled: Option<&str>, page_origin: Option<String>) -> String {
    match compiled.map(str::trim).filter(|s| !s.is_empty()) {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => page_origin.unwrap_or_default(),
    }
}

fn page_origin() -> Option<String> {
    web_sys::window()?.location().origin().ok()
}

pub fn api_base() -> String {
    resolve_api_base(COMPILED_API_URL, page_origin())
}

/// Client for the route store service.
pub fn route_store() -> HttpRouteStore {
    HttpRouteStore::new(api_base())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiled_url_wins_over_page_origin() {
        assert_eq!(
            resolve_api_base(Some("https://api.foodtour.vn/"), Some("http://localhost:8080".into())),
            "https://api.foodtour.vn"
        );
    }

    #[test]
    fn test_blank_compiled_url_falls_back_to_origin() {
        assert_eq!(
            resolve_api_base(Some("  "), Some("http://localhost:8080".into())),
            "http://localhost:8080"
        );
        assert_eq!(resolve_api_base(None, Some("https://foodtour.vn".into())), "https://foodtour.vn");
    }

    #[test]
    fn test_no_origin_means_relative_urls() {
        assert_eq!(resolve_api_base(None, None), "");
    }
}
