//! Calculator, clock and conversion capabilities.

use serde_json::json;

use super::BuiltinContext;
use crate::error::CapabilityError;
use crate::tools::calculator::{evaluate, format_number};
use crate::tools::conversions::{convert_currency, convert_units};
use crate::tools::{Arguments, CapabilityOutput, truncate};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl BuiltinContext {
    pub(super) fn calculate(&self, args: &Arguments) -> Result<CapabilityOutput, CapabilityError> {
        let expression = args.required_str("expression")?;
        let value = evaluate(expression).map_err(|e| {
            CapabilityError::argument(format!("cannot evaluate '{}': {}", truncate(expression, 80), e))
        })?;
        Ok(CapabilityOutput::Json(json!({ "result": format_number(value) })))
    }

    pub(super) fn get_time_now(&self) -> Result<CapabilityOutput, CapabilityError> {
        let dynamic = self.runtime_config.dynamic();
        let now = dynamic.assistant.now();
        Ok(CapabilityOutput::Json(json!({
            "result": format!(
                "{} {}",
                now.format("%Y-%m-%d %H:%M:%S"),
                dynamic.assistant.timezone_label
            )
        })))
    }

    pub(super) fn convert_currency(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let amount = args.required_f64("amount")?;
        let from = args.required_str("from_currency")?;
        let to = args.required_str("to_currency")?;

        let converted = convert_currency(amount, from, to)
            .map_err(|e| CapabilityError::argument(e.to_string()))?;
        Ok(CapabilityOutput::Json(json!({ "result": round2(converted) })))
    }

    pub(super) fn convert_units(&self, args: &Arguments) -> Result<CapabilityOutput, CapabilityError> {
        let value = args.required_f64("value")?;
        let from = args.required_str("from_unit")?;
        let to = args.required_str("to_unit")?;

        let converted =
            convert_units(value, from, to).map_err(|e| CapabilityError::argument(e.to_string()))?;
        Ok(CapabilityOutput::Json(json!({ "result": round2(converted) })))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::tests::{json_output, run, unlinked_context};
    use crate::tools::registry::BuiltinName;

    #[tokio::test]
    async fn test_calculate() {
        let ctx = unlinked_context();
        let output = json_output(
            run(&ctx, BuiltinName::Calculate, json!({"expression": "10 * (5 - 3)"}))
                .await
                .unwrap(),
        );
        assert_eq!(output, json!({"result": "20"}));

        let err = run(&ctx, BuiltinName::Calculate, json!({"expression": "__import__('os')"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_arguments");
    }

    #[tokio::test]
    async fn test_time_uses_assistant_label() {
        let ctx = unlinked_context();
        let output = json_output(run(&ctx, BuiltinName::GetTimeNow, json!({})).await.unwrap());
        assert!(output["result"].as_str().unwrap().ends_with(" IST"));
    }

    #[tokio::test]
    async fn test_conversions() {
        let ctx = unlinked_context();

        let usd = json_output(
            run(
                &ctx,
                BuiltinName::ConvertCurrency,
                json!({"amount": "100", "from_currency": "usd", "to_currency": "INR"}),
            )
            .await
            .unwrap(),
        );
        assert_eq!(usd, json!({"result": 8312.0}));

        let err = run(
            &ctx,
            BuiltinName::ConvertCurrency,
            json!({"amount": 1, "from_currency": "XYZ", "to_currency": "USD"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_arguments");

        let km = json_output(
            run(
                &ctx,
                BuiltinName::ConvertUnits,
                json!({"value": 1500, "from_unit": "m", "to_unit": "km"}),
            )
            .await
            .unwrap(),
        );
        assert_eq!(km, json!({"result": 1.5}));
    }
}
