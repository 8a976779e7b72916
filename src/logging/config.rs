use std::path::PathBuf;

/// Logging settings read from the environment
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `ENVIRONMENT`; "production" switches every layer to JSON output.
    pub environment: String,
    /// `LOG_LEVEL` for this crate's targets when `RUST_LOG` is unset.
    pub level: String,
    /// `LOG_DIR` holding the daily rolling `app.log` and `error.log`.
    pub directory: PathBuf,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if environment == "production" {
                "info".to_string()
            } else {
                "debug".to_string()
            }
        });
        let directory = std::env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        Self {
            environment,
            level,
            directory,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Default filter directive when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> String {
        format!(
            "blog_backend={},blog_sync={},tower_http=debug,axum=debug",
            self.level, self.level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_targets_crate() {
        let config = LogConfig {
            environment: "development".to_string(),
            level: "warn".to_string(),
            directory: PathBuf::from("logs"),
        };
        assert!(!config.is_production());
        assert!(config.default_directive().starts_with("blog_backend=warn"));
    }
}
