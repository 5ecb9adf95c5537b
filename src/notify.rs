use std::future::Future;

use serde::Serialize;

use crate::checkout::format_cents;
use crate::config::NotifyConfig;

/// Flattened order row for the spreadsheet backup.
#[derive(Debug, Clone, Serialize)]
pub struct OrderBackupRow {
    pub reference: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub item_count: usize,
    pub pricing_flow: String,
    pub subtotal: i64,
    pub total: i64,
    pub status: String,
    pub created_at: String,
}

/// Summary lines for the confirmation email.
#[derive(Debug, Clone)]
pub struct ConfirmationSummary {
    pub subtotal: i64,
    /// ("Tax", cents) or ("Deposit due", cents) depending on the flow.
    pub charge_label: String,
    pub charge_amount: i64,
    pub total: i64,
}

/// Best-effort side channels fired after an order is placed. Every failure
/// is logged and swallowed; nothing here may block or fail the checkout
/// path.
pub struct Notifier {
    http: reqwest::Client,
    config: NotifyConfig,
}

impl Notifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn send_order_confirmation(
        &self,
        reference: &str,
        email: &str,
        summary: &ConfirmationSummary,
    ) -> anyhow::Result<()> {
        let (Some(api_key), Some(from)) = (
            self.config.sendgrid_api_key.as_deref(),
            self.config.mail_from.as_deref(),
        ) else {
            tracing::debug!(reference, "mail not configured, skipping confirmation");
            return Ok(());
        };

        let body = serde_json::json!({
            "personalizations": [{ "to": [{ "email": email }] }],
            "from": { "email": from },
            "subject": format!("Order {reference} received"),
            "content": [{
                "type": "text/html",
                "value": render_confirmation_html(reference, summary),
            }],
        });

        let resp = self
            .http
            .post("https://api.sendgrid.com/v3/mail/send")
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("mail provider returned {}", resp.status());
        }
        Ok(())
    }

    pub async fn backup_order(&self, row: &OrderBackupRow) -> anyhow::Result<()> {
        let Some(url) = self.config.order_sheet_webhook_url.as_deref() else {
            tracing::debug!(reference = %row.reference, "sheet webhook not configured, skipping backup");
            return Ok(());
        };

        let resp = self.http.post(url).json(row).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("sheet webhook returned {}", resp.status());
        }
        Ok(())
    }
}

/// Run a side effect off the critical path. Errors are logged, never
/// propagated.
pub fn spawn_logged<F>(label: &'static str, fut: F)
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = fut.await {
            tracing::warn!(error = %err, task = label, "background task failed");
        }
    });
}

fn render_confirmation_html(reference: &str, summary: &ConfirmationSummary) -> String {
    format!(
        "<h1>Thank you for your order</h1>\
         <p>Your order <strong>{reference}</strong> has been received and is now pending.</p>\
         <table>\
         <tr><td>Subtotal</td><td>${}</td></tr>\
         <tr><td>{}</td><td>${}</td></tr>\
         <tr><td><strong>Total</strong></td><td><strong>${}</strong></td></tr>\
         </table>\
         <p>We will reach out when your order moves to preparation.</p>",
        format_cents(summary.subtotal),
        summary.charge_label,
        format_cents(summary.charge_amount),
        format_cents(summary.total),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_html_carries_reference_and_amounts() {
        let summary = ConfirmationSummary {
            subtotal: 29999,
            charge_label: "Tax".into(),
            charge_amount: 2400,
            total: 32399,
        };
        let html = render_confirmation_html("FAF-1-AAAA", &summary);
        assert!(html.contains("FAF-1-AAAA"));
        assert!(html.contains("$299.99"));
        assert!(html.contains("$24.00"));
        assert!(html.contains("$323.99"));
    }

    #[tokio::test]
    async fn unconfigured_channels_are_silent_successes() {
        let notifier = Notifier::new(NotifyConfig::default());
        let summary = ConfirmationSummary {
            subtotal: 100,
            charge_label: "Deposit due".into(),
            charge_amount: 50,
            total: 100,
        };
        notifier
            .send_order_confirmation("FAF-1-AAAA", "a@b.co", &summary)
            .await
            .unwrap();
        notifier
            .backup_order(&OrderBackupRow {
                reference: "FAF-1-AAAA".into(),
                customer_name: "Abel Mengistu".into(),
                customer_email: "a@b.co".into(),
                customer_phone: "0911234567".into(),
                item_count: 1,
                pricing_flow: "deposit".into(),
                subtotal: 100,
                total: 100,
                status: "pending".into(),
                created_at: "2026-01-01T00:00:00Z".into(),
            })
            .await
            .unwrap();
    }
}
