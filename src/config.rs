/// Placeholder credential shipped with the service. Live weather lookups are
/// skipped while this (or an empty key) is configured.
pub const WEATHER_API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Base URL of the hourly position snapshots (`{base}/{HH}.json`).
    pub treasure_base_url: String,
    pub weather_api_url: String,
    /// OpenWeatherMap API key; must be supplied by the operator.
    pub weather_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            treasure_base_url: std::env::var("TREASURE_BASE_URL")
                .unwrap_or_else(|_| "https://a.windbornesystems.com/treasure".to_string()),
            weather_api_url: std::env::var("WEATHER_API_URL").unwrap_or_else(|_| {
                "https://api.openweathermap.org/data/2.5/weather".to_string()
            }),
            weather_api_key: std::env::var("OPENWEATHERMAP_API_KEY")
                .unwrap_or_else(|_| WEATHER_API_KEY_PLACEHOLDER.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        // NOTE: set_var/remove_var is unsafe when tests run in parallel. No
        // other test in this binary touches these variables.
        unsafe {
            std::env::remove_var("PORT");
            std::env::remove_var("TREASURE_BASE_URL");
            std::env::remove_var("WEATHER_API_URL");
            std::env::remove_var("OPENWEATHERMAP_API_KEY");
        }

        let config = AppConfig::from_env();

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.treasure_base_url,
            "https://a.windbornesystems.com/treasure"
        );
        assert!(config.weather_api_url.contains("openweathermap.org"));
        assert_eq!(config.weather_api_key, WEATHER_API_KEY_PLACEHOLDER);
    }
}
