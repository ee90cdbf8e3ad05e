//! Order lifecycle events, published best-effort to NATS when configured.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::order::OrderStatus;
use crate::domain::payment::PaymentStatus;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    OrderPlaced {
        order_id: Uuid,
        order_number: String,
        user_id: Uuid,
        total_amount: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    },
    PaymentUpdated {
        transaction_id: String,
        status: PaymentStatus,
    },
    ReturnRequested {
        return_id: Uuid,
        order_item_id: Uuid,
    },
}

/// Publishing never fails the request: failures are logged and dropped.
pub async fn publish(nats: &Option<async_nats::Client>, subject: &str, event: &Event) {
    let Some(client) = nats else { return };
    let payload = match serde_json::to_vec(event) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, subject, "failed to serialize event");
            return;
        }
    };
    if let Err(e) = client.publish(subject.to_string(), payload.into()).await {
        tracing::warn!(error = %e, subject, "failed to publish event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let e = Event::OrderStatusChanged {
            order_id: Uuid::nil(),
            from: OrderStatus::Pending,
            to: OrderStatus::Confirmed,
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "order_status_changed");
        assert_eq!(json["from"], "Pending");
        assert_eq!(json["to"], "Confirmed");
    }
}
