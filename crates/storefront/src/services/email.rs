//! Email service for staff notifications.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::Order;

/// One rendered order line.
struct EmailLine {
    name: String,
    size: String,
    quantity: i32,
    price: String,
    line_total: String,
}

/// HTML template for the new-order email.
#[derive(Template)]
#[template(path = "email/order_notification.html")]
struct OrderNotificationHtml<'a> {
    o: &'a OrderNotification,
}

/// Plain text template for the new-order email.
#[derive(Template)]
#[template(path = "email/order_notification.txt")]
struct OrderNotificationText<'a> {
    o: &'a OrderNotification,
}

/// Template fields for a placed order, already formatted.
struct OrderNotification {
    order_id: String,
    short_id: String,
    placed_at: String,
    customer_name: String,
    phone: String,
    email: String,
    shipping_address: String,
    district: String,
    delivery_area: Option<&'static str>,
    lines: Vec<EmailLine>,
    subtotal: String,
    shipping_cost: Option<String>,
    total: String,
}

impl OrderNotification {
    fn new(order: &Order) -> Self {
        let order_id = order.id.to_string();
        Self {
            short_id: order_id.chars().take(8).collect(),
            order_id,
            placed_at: order.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            customer_name: order.shipping_name.clone(),
            phone: order.phone.clone(),
            email: order.email.clone(),
            shipping_address: order.shipping_address.clone(),
            district: order.district.clone(),
            delivery_area: order.delivery_area.map(|a| a.label()),
            lines: order
                .items
                .iter()
                .map(|item| EmailLine {
                    name: item.product.name.clone(),
                    size: item.size.clone(),
                    quantity: item.quantity,
                    price: money(item.price),
                    line_total: money(item.line_total()),
                })
                .collect(),
            subtotal: money(order.subtotal()),
            shipping_cost: (!order.shipping_cost.is_zero()).then(|| money(order.shipping_cost)),
            total: money(order.total),
        }
    }
}

fn money(amount: Decimal) -> String {
    format!("৳{:.2}", amount.round_dp(2))
}

/// Subject line for the new-order email.
#[must_use]
pub fn order_subject(order: &Order) -> String {
    let short: String = order.id.to_string().chars().take(8).collect();
    format!("New Order #{short} - {}", order.shipping_name)
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if SMTP connection fails.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the new-order email to the shop admin.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_notification(&self, to: &str, order: &Order) -> Result<(), EmailError> {
        let (text, html) = render_order_notification(order)?;
        self.send_multipart_email(to, &order_subject(order), &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Render the (text, html) bodies of the new-order email.
fn render_order_notification(order: &Order) -> Result<(String, String), EmailError> {
    let fields = OrderNotification::new(order);
    let text = OrderNotificationText { o: &fields }.render()?;
    let html = OrderNotificationHtml { o: &fields }.render()?;
    Ok((text, html))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gadzilla_core::UserId;

    use super::*;
    use crate::models::order::tests::sample_order;

    #[test]
    fn test_subject_uses_short_id_and_name() {
        let order = sample_order(Some(UserId::new(1)), "a@b.co");
        let subject = order_subject(&order);
        let short: String = order.id.to_string().chars().take(8).collect();
        assert_eq!(subject, format!("New Order #{short} - Rahim Uddin"));
    }

    #[test]
    fn test_render_lists_items_and_totals() {
        let order = sample_order(None, "guest@example.com");
        let (text, html) = render_order_notification(&order).unwrap();

        assert!(text.contains("Pixel Buds x 1 @ ৳100.00 = ৳100.00"));
        assert!(text.contains("Shipping: ৳40.00"));
        assert!(text.contains("Total: ৳140.00"));
        assert!(text.contains("Phone: 01712345678"));
        assert!(text.contains("Delivery: Inside Dhaka City"));
        assert!(html.contains("Pixel Buds"));
        assert!(html.contains("৳140.00"));
    }

    #[test]
    fn test_render_omits_zero_shipping() {
        let mut order = sample_order(None, "guest@example.com");
        order.shipping_cost = Decimal::ZERO;
        order.total = Decimal::new(10000, 2);
        let (text, _) = render_order_notification(&order).unwrap();
        assert!(!text.contains("Shipping:"));
        assert!(text.contains("Total: ৳100.00"));
    }
}
