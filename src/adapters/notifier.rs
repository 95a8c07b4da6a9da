use crate::domain::ports::Notifier;

/// Prints notifications to the terminal, the CLI counterpart of a browser alert.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        tracing::info!("🔔 {}", message);
        println!("🔔 {}", message);
    }
}
