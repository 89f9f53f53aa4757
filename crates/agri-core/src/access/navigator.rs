// ============================================================================
// Navigator - where redirects go
// ============================================================================
// Core code never decides how a redirect is shown. The CLI prints it; tests
// record it.
// ============================================================================

use std::sync::Mutex;
use tracing::debug;

/// Sink for client-side navigation
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator that remembers every path it was sent to
#[derive(Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.history.lock().ok().and_then(|h| h.last().cloned())
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        debug!("Navigate -> {}", path);
        if let Ok(mut history) = self.history.lock() {
            history.push(path.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let navigator = RecordingNavigator::new();
        assert!(navigator.last().is_none());

        navigator.navigate("/login");
        navigator.navigate("/farmer/dashboard");

        assert_eq!(navigator.history(), vec!["/login", "/farmer/dashboard"]);
        assert_eq!(navigator.last().as_deref(), Some("/farmer/dashboard"));
    }
}
