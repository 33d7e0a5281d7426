//! Weather capabilities.

use super::{BuiltinContext, require_endpoint};
use crate::error::CapabilityError;
use crate::tools::{Arguments, CapabilityOutput};

impl BuiltinContext {
    pub(super) async fn get_weather(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let dynamic = self.runtime_config.dynamic();
        let settings = &dynamic.integrations;
        let city = args.str("city").unwrap_or(&settings.default_city);
        require_endpoint(&settings.weather_base_url, "integrations.weather_base_url")?;

        let report = self
            .weather
            .current(settings, city)
            .await
            .map_err(|e| CapabilityError::backend(format!("Weather lookup failed: {}", e)))?;
        Ok(CapabilityOutput::Text(report))
    }

    pub(super) async fn get_forecast(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let dynamic = self.runtime_config.dynamic();
        let settings = &dynamic.integrations;
        let city = args.str("city").unwrap_or(&settings.default_city);
        require_endpoint(&settings.weather_base_url, "integrations.weather_base_url")?;

        let report = self
            .weather
            .forecast(settings, city)
            .await
            .map_err(|e| CapabilityError::backend(format!("Forecast lookup failed: {}", e)))?;
        Ok(CapabilityOutput::Text(report))
    }
}
