//! Coordinator configuration loaded from environment variables.

/// Coordinator configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `ORDERS_NOTIFICATION_TITLE` — title of status-update notifications
///   (default: `"📦 Mise à jour commande"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub notification_title: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            notification_title: std::env::var("ORDERS_NOTIFICATION_TITLE")
                .unwrap_or_else(|_| default_title()),
        }
    }
}

fn default_title() -> String {
    "📦 Mise à jour commande".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notification_title: default_title(),
        }
    }
}
