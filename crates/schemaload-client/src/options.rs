use std::time::Duration;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Path of the configuration load endpoint, relative to the base URL.
pub const LOAD_PATH: &str = "/api/config/load";

/// Options that control how the HTTP client reaches the backend.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    /// Whole-request timeout; expiry surfaces as a network error.
    pub timeout: Duration,
}

impl ClientOptions {
    /// Full URL of the load endpoint.
    pub fn load_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), LOAD_PATH)
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_url_tolerates_trailing_slash() {
        let options = ClientOptions {
            base_url: "http://backend:9000/".to_string(),
            ..ClientOptions::default()
        };
        assert_eq!(options.load_url(), "http://backend:9000/api/config/load");
    }
}
