use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted after a successful write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProductCreated {
        product_id: Uuid,
        name: String,
    },
    IssueCreated {
        record_id: Uuid,
        issue_id: String,
        operator_id: Uuid,
        line_count: usize,
        total_amount: Decimal,
    },
    DiscountApplied {
        issue_id: String,
        discount_percent: Decimal,
        discount_amount: Decimal,
    },
    ProductRestocked {
        product_id: Uuid,
        restocker_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
        at: DateTime<Utc>,
    },
    OperatorCreated {
        user_id: Uuid,
        email: String,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ProductCreated { .. } => "product_created",
            Event::IssueCreated { .. } => "issue_created",
            Event::DiscountApplied { .. } => "discount_applied",
            Event::ProductRestocked { .. } => "product_restocked",
            Event::OperatorCreated { .. } => "operator_created",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends without failing the caller; delivery problems are only logged.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "dropping domain event");
            counter!("stockroom.events.dropped", 1);
        }
    }
}

/// Creates the event channel with the configured capacity
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Consumes events until every sender is dropped
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("stockroom.events.processed", 1, "event" => event.name());

        match &event {
            Event::IssueCreated {
                issue_id,
                operator_id,
                line_count,
                total_amount,
                ..
            } => {
                info!(%issue_id, %operator_id, line_count, %total_amount, "issue recorded");
            }
            Event::ProductRestocked {
                product_id,
                restocker_id,
                old_quantity,
                new_quantity,
                ..
            } => {
                info!(%product_id, %restocker_id, old_quantity, new_quantity, "product restocked");
            }
            other => info!(event = other.name(), payload = ?other, "domain event"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (sender, rx) = channel(4);
        drop(rx);
        let result = sender
            .send(Event::OperatorCreated {
                user_id: Uuid::new_v4(),
                email: "x@example.com".into(),
            })
            .await;
        assert!(result.is_err());
        // never panics or errors for the caller
        sender
            .send_or_log(Event::ProductCreated {
                product_id: Uuid::new_v4(),
                name: "Bolt".into(),
            })
            .await;
    }

    #[tokio::test]
    async fn processor_drains_and_stops_when_senders_drop() {
        let (sender, rx) = channel(4);
        let handle = tokio::spawn(process_events(rx));
        sender
            .send(Event::ProductCreated {
                product_id: Uuid::new_v4(),
                name: "Bolt".into(),
            })
            .await
            .unwrap();
        drop(sender);
        handle.await.unwrap();
    }
}
