//! Conversion tracking.
//!
//! Handlers build a [`ConversionEvent`] and hand it to [`dispatch`], which
//! runs the tracker on a spawned task so tracking never delays or fails a
//! request. Personal data is only ever carried as SHA-256 hashes of the
//! trimmed, lowercased value.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};

use gadzilla_core::{OrderId, ProductId};

/// Currency of every tracked value.
pub const CURRENCY: &str = "BDT";

/// Hashed customer identifiers attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HashedCustomer {
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl HashedCustomer {
    #[must_use]
    pub fn new(email: Option<&str>, phone: Option<&str>) -> Self {
        Self {
            email: email.and_then(hash_identifier),
            phone: phone.and_then(hash_identifier),
            ..Self::default()
        }
    }

    /// Add a full name, split at the first space into first and last name.
    #[must_use]
    pub fn with_name(mut self, full_name: &str) -> Self {
        let (first, last) = full_name
            .trim()
            .split_once(' ')
            .unwrap_or((full_name.trim(), ""));
        self.first_name = hash_identifier(first);
        self.last_name = hash_identifier(last);
        self
    }
}

/// A trackable customer action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum ConversionEvent {
    Purchase {
        order_id: OrderId,
        value: Decimal,
        content_ids: Vec<ProductId>,
        num_items: i32,
        customer: HashedCustomer,
    },
    AddToCart {
        product_id: ProductId,
        value: Decimal,
        quantity: i32,
    },
    AddToWishlist {
        product_id: ProductId,
        value: Decimal,
    },
    Contact {
        customer: HashedCustomer,
    },
    InitiateCheckout {
        customer: HashedCustomer,
    },
    AddPaymentInfo {
        customer: HashedCustomer,
    },
    Search {
        query: String,
    },
    ViewContent {
        product_id: ProductId,
        value: Decimal,
    },
}

impl ConversionEvent {
    /// Event name as conversion APIs spell it.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Purchase { .. } => "Purchase",
            Self::AddToCart { .. } => "AddToCart",
            Self::AddToWishlist { .. } => "AddToWishlist",
            Self::Contact { .. } => "Contact",
            Self::InitiateCheckout { .. } => "InitiateCheckout",
            Self::AddPaymentInfo { .. } => "AddPaymentInfo",
            Self::Search { .. } => "Search",
            Self::ViewContent { .. } => "ViewContent",
        }
    }
}

/// Destination for conversion events.
pub trait ConversionTracker: Send + Sync {
    fn track(&self, event: &ConversionEvent);
}

/// Tracker that records events in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracker;

impl ConversionTracker for LogTracker {
    fn track(&self, event: &ConversionEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => tracing::info!(
                target: "conversions",
                event = event.name(),
                currency = CURRENCY,
                %payload,
                "Conversion event"
            ),
            Err(e) => tracing::warn!(error = %e, event = event.name(), "Unserializable event"),
        }
    }
}

/// Run `tracker` for `event` on a background task.
pub fn dispatch(tracker: &Arc<dyn ConversionTracker>, event: ConversionEvent) {
    let tracker = Arc::clone(tracker);
    tokio::spawn(async move {
        tracker.track(&event);
    });
}

/// SHA-256 hex of the trimmed, lowercased value; `None` when blank.
#[must_use]
pub fn hash_identifier(value: &str) -> Option<String> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    Some(hex::encode(Sha256::digest(normalized.as_bytes())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recording(Mutex<Vec<&'static str>>);

    impl ConversionTracker for Recording {
        fn track(&self, event: &ConversionEvent) {
            self.0.lock().unwrap().push(event.name());
        }
    }

    #[test]
    fn test_hash_normalizes_input() {
        let a = hash_identifier("  Customer@Example.COM ").unwrap();
        let b = hash_identifier("customer@example.com").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_known_value() {
        assert_eq!(
            hash_identifier("abc").as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn test_hash_blank_is_none() {
        assert_eq!(hash_identifier("   "), None);
        assert_eq!(HashedCustomer::new(Some(""), None), HashedCustomer::default());
    }

    #[test]
    fn test_name_is_split_and_hashed() {
        let customer = HashedCustomer::new(None, Some("01712345678")).with_name(" Rahim  Uddin ");
        assert_eq!(customer.first_name, hash_identifier("rahim"));
        assert_eq!(customer.last_name, hash_identifier("uddin"));

        let single = HashedCustomer::default().with_name("Karim");
        assert_eq!(single.first_name, hash_identifier("karim"));
        assert_eq!(single.last_name, None);
    }

    #[test]
    fn test_checkout_funnel_event_names() {
        let initiate = ConversionEvent::InitiateCheckout {
            customer: HashedCustomer::default(),
        };
        let payment = ConversionEvent::AddPaymentInfo {
            customer: HashedCustomer::new(Some("a@b.co"), None),
        };
        assert_eq!(initiate.name(), "InitiateCheckout");
        assert_eq!(payment.name(), "AddPaymentInfo");

        let json = serde_json::to_value(&payment).unwrap();
        assert_eq!(json["event"], "AddPaymentInfo");
        assert!(json["customer"].get("first_name").is_none());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = ConversionEvent::Search {
            query: "earbuds".to_owned(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "Search");
        assert_eq!(json["query"], "earbuds");
    }

    #[tokio::test]
    async fn test_dispatch_runs_tracker() {
        let recording = Arc::new(Recording::default());
        let tracker: Arc<dyn ConversionTracker> = recording.clone();
        dispatch(
            &tracker,
            ConversionEvent::Contact {
                customer: HashedCustomer::default(),
            },
        );

        for _ in 0..50 {
            if !recording.0.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(*recording.0.lock().unwrap(), vec!["Contact"]);
    }
}
