//! wttr.in weather client backing `get_weather` and `get_forecast`.
//!
//! Current conditions are cached per city; forecasts are always fetched.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::IntegrationsConfig;

/// Conditions, temperature, humidity and wind on one line
const CURRENT_FORMAT: &str = "%C+%t+%h+%w";

/// Days included in a forecast
const FORECAST_DAYS: usize = 3;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Weather service returned {status}: {message}")]
    ApiError { status: u16, message: String },
}

/// Client for the wttr.in plain-text and JSON endpoints
pub struct WeatherClient {
    client: Client,
    cache: DashMap<String, (String, Instant)>,
}

impl WeatherClient {
    pub fn new() -> Result<Self, WeatherError> {
        let client = Client::builder()
            .user_agent("Majordomo/1.0")
            .build()?;

        Ok(Self {
            client,
            cache: DashMap::new(),
        })
    }

    /// Current conditions for a city, served from cache when fresh
    pub async fn current(
        &self,
        settings: &IntegrationsConfig,
        city: &str,
    ) -> Result<String, WeatherError> {
        let key = city.to_lowercase();
        if let Some(hit) = self.cached(&key, settings.weather_cache_ttl()) {
            debug!(city = %city, "Weather cache hit");
            return Ok(hit);
        }

        let url = format!(
            "{}/{}?format={}",
            settings.weather_base_url.trim_end_matches('/'),
            urlencoding::encode(city),
            CURRENT_FORMAT
        );

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(settings.weather_timeout_secs))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(WeatherError::ApiError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let text = response.text().await?;
        let result = format!("Weather in {}: {}", city, text.trim());
        self.store(key, result.clone(), settings.weather_cache_ttl());
        Ok(result)
    }

    /// Three-day forecast for a city
    pub async fn forecast(
        &self,
        settings: &IntegrationsConfig,
        city: &str,
    ) -> Result<String, WeatherError> {
        let url = format!(
            "{}/{}?format=j1",
            settings.weather_base_url.trim_end_matches('/'),
            urlencoding::encode(city)
        );

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(settings.weather_timeout_secs))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(WeatherError::ApiError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let report: ForecastReport = response.json().await?;
        Ok(format_forecast(city, &report))
    }

    /// Insert a fresh entry, evicting every expired one
    fn store(&self, key: String, text: String, ttl: Duration) {
        self.cache.retain(|_, (_, stored_at)| stored_at.elapsed() < ttl);
        self.cache.insert(key, (text, Instant::now()));
    }

    fn cached(&self, key: &str, ttl: Duration) -> Option<String> {
        let entry = self.cache.get(key)?;
        let (text, stored_at) = entry.value();
        (stored_at.elapsed() < ttl).then(|| text.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastReport {
    #[serde(default)]
    pub weather: Vec<ForecastDay>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    #[serde(default)]
    pub date: String,
    #[serde(default, rename = "maxtempC")]
    pub max_temp_c: String,
    #[serde(default, rename = "mintempC")]
    pub min_temp_c: String,
    #[serde(default)]
    pub hourly: Vec<HourlyForecast>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    #[serde(default)]
    pub weather_desc: Vec<DescValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DescValue {
    #[serde(default)]
    pub value: String,
}

fn format_forecast(city: &str, report: &ForecastReport) -> String {
    let mut out = format!("{}-Day Forecast for {}:", FORECAST_DAYS, city);
    for day in report.weather.iter().take(FORECAST_DAYS) {
        let desc = day
            .hourly
            .first()
            .and_then(|h| h.weather_desc.first())
            .map(|d| d.value.trim())
            .filter(|d| !d.is_empty())
            .unwrap_or("N/A");
        out.push_str(&format!(
            "\n- {}: {}, {}°C - {}°C",
            day.date, desc, day.min_temp_c, day.max_temp_c
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_formatting_takes_three_days() {
        let report: ForecastReport = serde_json::from_value(serde_json::json!({
            "weather": [
                {"date": "2026-01-01", "maxtempC": "31", "mintempC": "22",
                 "hourly": [{"weatherDesc": [{"value": "Sunny"}]}]},
                {"date": "2026-01-02", "maxtempC": "30", "mintempC": "21", "hourly": []},
                {"date": "2026-01-03", "maxtempC": "29", "mintempC": "20",
                 "hourly": [{"weatherDesc": [{"value": "Haze "}]}]},
                {"date": "2026-01-04", "maxtempC": "28", "mintempC": "19", "hourly": []}
            ]
        }))
        .unwrap();

        let text = format_forecast("Mumbai", &report);
        assert!(text.starts_with("3-Day Forecast for Mumbai:"));
        assert!(text.contains("- 2026-01-01: Sunny, 22°C - 31°C"));
        assert!(text.contains("- 2026-01-02: N/A, 21°C - 30°C"));
        assert!(text.contains("Haze,"));
        assert!(!text.contains("2026-01-04"));
    }

    #[test]
    fn test_cache_respects_ttl() {
        let client = WeatherClient::new().unwrap();
        client.cache.insert(
            "pune".to_string(),
            ("Weather in Pune: Clear".to_string(), Instant::now()),
        );

        assert_eq!(
            client.cached("pune", Duration::from_secs(600)).as_deref(),
            Some("Weather in Pune: Clear")
        );
        assert!(client.cached("pune", Duration::ZERO).is_none());
        assert!(client.cached("delhi", Duration::from_secs(600)).is_none());
    }

    #[test]
    fn test_store_evicts_expired_entries() {
        let client = WeatherClient::new().unwrap();
        let ttl = Duration::from_secs(600);
        let stale = Instant::now()
            .checked_sub(Duration::from_secs(3600))
            .unwrap();
        for city in ["asdf", "qwer", "zxcv"] {
            client
                .cache
                .insert(city.to_string(), (format!("Weather in {city}: ?"), stale));
        }
        client.cache.insert(
            "pune".to_string(),
            ("Weather in Pune: Clear".to_string(), Instant::now()),
        );

        client.store("delhi".to_string(), "Weather in Delhi: Haze".to_string(), ttl);

        let mut keys: Vec<String> = client.cache.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        assert_eq!(keys, vec!["delhi", "pune"]);
    }

    #[tokio::test]
    async fn test_fresh_cache_entry_skips_network() {
        let client = WeatherClient::new().unwrap();
        let settings = IntegrationsConfig {
            weather_base_url: "http://127.0.0.1:9".to_string(),
            ..crate::config::DynamicConfig::default().integrations
        };
        client.cache.insert(
            "mumbai".to_string(),
            ("Weather in Mumbai: Rain".to_string(), Instant::now()),
        );

        let text = client.current(&settings, "Mumbai").await.unwrap();
        assert_eq!(text, "Weather in Mumbai: Rain");
    }
}
