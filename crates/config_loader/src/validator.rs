//! Configuration validation
//!
//! Rules:
//! - server host non-empty, reconnect interval and queue capacity > 0
//! - target_fps in (0, 1000], capture size > 0, jpeg_quality in 1..=100
//! - model layout dimensions > 0, thresholds in [0, 1]
//! - metrics window, store capacity, display interval and benchmark duration > 0

use contracts::{
    CaptureConfig, ContractError, MetricsConfig, ModelConfig, ServerConfig, SessionConfig,
};

/// Upper bound on the capture rate; the capture timer needs a period of at least 1 ms
pub const MAX_TARGET_FPS: f64 = 1000.0;

/// Validate a SessionConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &SessionConfig) -> Result<(), ContractError> {
    validate_server(&config.server)?;
    validate_capture(&config.capture)?;
    validate_model(&config.inference.model)?;
    validate_metrics(&config.metrics)?;
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ContractError> {
    if server.host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "server.host",
            "host cannot be empty",
        ));
    }
    if server.reconnect_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "server.reconnect_interval_ms",
            "reconnect_interval_ms must be > 0",
        ));
    }
    positive("server.queue_capacity", server.queue_capacity)
}

fn validate_capture(capture: &CaptureConfig) -> Result<(), ContractError> {
    if !capture.target_fps.is_finite() || capture.target_fps <= 0.0 {
        return Err(ContractError::config_validation(
            "capture.target_fps",
            format!("target_fps must be > 0, got {}", capture.target_fps),
        ));
    }
    if capture.target_fps > MAX_TARGET_FPS {
        return Err(ContractError::config_validation(
            "capture.target_fps",
            format!(
                "target_fps must be <= {MAX_TARGET_FPS}, got {}",
                capture.target_fps
            ),
        ));
    }
    positive("capture.width", capture.width as usize)?;
    positive("capture.height", capture.height as usize)?;
    if !(1..=100).contains(&capture.jpeg_quality) {
        return Err(ContractError::config_validation(
            "capture.jpeg_quality",
            format!(
                "jpeg_quality must be within 1..=100, got {}",
                capture.jpeg_quality
            ),
        ));
    }
    Ok(())
}

fn validate_model(model: &ModelConfig) -> Result<(), ContractError> {
    positive("inference.model.input_size", model.input_size as usize)?;
    positive("inference.model.rows", model.rows)?;
    positive("inference.model.num_classes", model.num_classes)?;
    unit_interval(
        "inference.model.objectness_threshold",
        model.objectness_threshold,
    )?;
    unit_interval("inference.model.score_threshold", model.score_threshold)
}

fn validate_metrics(metrics: &MetricsConfig) -> Result<(), ContractError> {
    positive("metrics.latency_window", metrics.latency_window)?;
    positive("metrics.store_capacity", metrics.store_capacity)?;
    positive(
        "metrics.display_interval_ms",
        metrics.display_interval_ms as usize,
    )?;
    positive(
        "metrics.benchmark_seconds",
        metrics.benchmark_seconds as usize,
    )
}

fn positive(field: &str, value: usize) -> Result<(), ContractError> {
    if value == 0 {
        return Err(ContractError::config_validation(
            field,
            format!("{} must be > 0", field.rsplit('.').next().unwrap_or(field)),
        ));
    }
    Ok(())
}

fn unit_interval(field: &str, value: f32) -> Result<(), ContractError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ContractError::config_validation(
            field,
            format!("threshold must be within [0, 1], got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate(&SessionConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_fps() {
        let mut config = SessionConfig::default();
        config.capture.target_fps = 0.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("target_fps must be > 0"), "got: {err}");

        config.capture.target_fps = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_fps_upper_bound() {
        let mut config = SessionConfig::default();
        config.capture.target_fps = MAX_TARGET_FPS;
        assert!(validate(&config).is_ok());

        config.capture.target_fps = 1e10;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("target_fps must be <= 1000"), "got: {err}");

        // tiny but positive rates are accepted; the capture timer clamps them
        config.capture.target_fps = 1e-20;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_capture_size() {
        let mut config = SessionConfig::default();
        config.capture.height = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("capture.height"), "got: {err}");
    }

    #[test]
    fn test_jpeg_quality_range() {
        let mut config = SessionConfig::default();
        config.capture.jpeg_quality = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("jpeg_quality"), "got: {err}");
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = SessionConfig::default();
        config.inference.model.score_threshold = 1.5;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("score_threshold"), "got: {err}");
    }

    #[test]
    fn test_zero_reconnect_interval() {
        let mut config = SessionConfig::default();
        config.server.reconnect_interval_ms = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("reconnect_interval_ms"), "got: {err}");
    }

    #[test]
    fn test_empty_host() {
        let mut config = SessionConfig::default();
        config.server.host = "  ".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_zero_window() {
        let mut config = SessionConfig::default();
        config.metrics.latency_window = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("latency_window must be > 0"), "got: {err}");
    }
}
