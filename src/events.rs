use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

/// Acknowledgements surfaced to whatever displays toasts or alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    UploadCompleted {
        document_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        document_id: Option<String>,
    },
    NotificationsCleared {
        count: usize,
    },
    LoginSucceeded {
        email: String,
    },
    AccountCreated {
        email: String,
    },
}

impl AppEvent {
    pub fn title(&self) -> &'static str {
        match self {
            AppEvent::UploadCompleted { .. } => "Upload complete",
            AppEvent::NotificationsCleared { .. } => "Notifications cleared",
            AppEvent::LoginSucceeded { .. } => "Login successful",
            AppEvent::AccountCreated { .. } => "Account created",
        }
    }

    pub fn description(&self) -> String {
        match self {
            AppEvent::UploadCompleted { .. } => {
                "Your document has been submitted for approval".to_string()
            }
            AppEvent::NotificationsCleared { .. } => {
                "All notifications have been cleared".to_string()
            }
            AppEvent::LoginSucceeded { .. } | AppEvent::AccountCreated { .. } => {
                "Welcome to BuildSmart".to_string()
            }
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: AppEvent) {
        if let Err(err) = self.sender.send(event) {
            debug!(event = ?err.0, "event dropped, no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(AppEvent::NotificationsCleared { count: 2 });

        let event = rx.recv().await.unwrap();
        assert_eq!(event, AppEvent::NotificationsCleared { count: 2 });
        assert_eq!(event.title(), "Notifications cleared");
    }

    #[test]
    fn emitting_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.emit(AppEvent::LoginSucceeded {
            email: "john@buildsmart.com".into(),
        });
    }
}
