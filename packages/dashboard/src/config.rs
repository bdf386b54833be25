//! Loading [`DashboardConfig`] from TOML.

use std::path::Path;

use conflict_map_dashboard_models::DashboardConfig;

use crate::DashboardError;

/// Parses a config from TOML. Missing keys take their defaults.
///
/// # Errors
///
/// Returns [`DashboardError::Toml`] if the TOML is malformed or a value has
/// the wrong type.
pub fn parse_config(toml_str: &str) -> Result<DashboardConfig, DashboardError> {
    Ok(toml::de::from_str(toml_str)?)
}

/// Reads and parses a config file.
///
/// # Errors
///
/// Returns [`DashboardError`] if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<DashboardConfig, DashboardError> {
    let contents = std::fs::read_to_string(path)?;
    let config = parse_config(&contents)?;
    log::debug!("Loaded dashboard config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_settings() {
        let config = parse_config(
            r"
            [hex]
            radius_m = 5000.0
            percentile_range = [10.0, 90.0]
            coverage = 0.8
            ",
        )
        .unwrap();

        assert!((config.hex.radius_m - 5_000.0).abs() < f64::EPSILON);
        assert_eq!(config.hex.percentile_range, [10.0, 90.0]);
        assert!((config.hex.coverage - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(matches!(
            parse_config("[brushing]\nenabled = \"yes\""),
            Err(DashboardError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_config(Path::new("/definitely/not/here.toml")),
            Err(DashboardError::Io(_))
        ));
    }
}
