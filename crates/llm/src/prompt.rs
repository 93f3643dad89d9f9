use carwatch_core::Reading;

/// Details the model is asked to return when nothing looks unusual.
pub const NO_ANOMALY_DETAILS: &str = "No unusual patterns detected.";

/// Render the anomaly-analysis prompt for one reading.
pub fn build_prompt(reading: &Reading) -> String {
    let codes = if reading.error_codes.is_empty() {
        "None".to_string()
    } else {
        reading.error_codes.join(", ")
    };

    format!(
        r#"Analyze the following car sensor data and determine if there is an unforeseen anomaly or a "new problem" not covered by standard error codes. Respond with a JSON object.
Current Car Data:
- Engine Temperature: {temp}°C
- Error Codes: {codes}
- Gear Change Smoothness: {gear}/10
- Acceleration Sound Level: {sound} dB
- Transmission Oil Level: {trans}/10
- Engine Oil Level: {oil}/10
- Coolant Level: {coolant}/10
- Leakage Detected: {leak}

Consider if the combination of these parameters suggests something unusual or a developing issue.
Output JSON schema:
{{
  "anomalyDetected": boolean,
  "details": string
}}
If no anomaly, set anomalyDetected to false and details to "{none}"
"#,
        temp = reading.engine_temp_c,
        codes = codes,
        gear = reading.gear_smoothness,
        sound = reading.accel_sound_db,
        trans = reading.transmission_oil,
        oil = reading.engine_oil,
        coolant = reading.coolant,
        leak = if reading.leak_detected { "Yes" } else { "No" },
        none = NO_ANOMALY_DETAILS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_value() {
        let reading = Reading::nominal()
            .with_engine_temp(112)
            .with_error_codes(["P0301", "U0100"])
            .with_coolant(2)
            .with_leak(true);
        let prompt = build_prompt(&reading);

        assert!(prompt.contains("Engine Temperature: 112°C"));
        assert!(prompt.contains("Error Codes: P0301, U0100"));
        assert!(prompt.contains("Gear Change Smoothness: 5/10"));
        assert!(prompt.contains("Acceleration Sound Level: 60 dB"));
        assert!(prompt.contains("Coolant Level: 2/10"));
        assert!(prompt.contains("Leakage Detected: Yes"));
        assert!(prompt.contains(r#""anomalyDetected": boolean"#));
    }

    #[test]
    fn prompt_says_none_without_codes() {
        let prompt = build_prompt(&Reading::nominal());
        assert!(prompt.contains("Error Codes: None"));
        assert!(prompt.contains("Leakage Detected: No"));
        assert!(prompt.contains(NO_ANOMALY_DETAILS));
    }
}
