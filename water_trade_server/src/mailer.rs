//! Counterparty notification dispatch.
//!
//! The server subscribes to trade transition events and emails the party whose move it now is (or who should hear
//! the outcome). Dispatch is best-effort by contract: a failure here is logged and dropped, and must never surface
//! to the user whose transition already committed.
use log::*;
use serde_json::json;
use water_trade_engine::{
    db_types::{EventKind, TradeRole},
    events::TradeTransitionEvent,
};
use wtg_common::Secret;

use crate::config::MailerConfig;

/// A rendered notification email, addressed and ready to hand to a provider.
#[derive(Debug, Clone)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[allow(async_fn_in_trait)]
pub trait Mailer {
    async fn send(&self, notification: Notification) -> Result<(), MailerError>;
}

#[derive(Debug, thiserror::Error)]
#[error("Could not send notification email. {0}")]
pub struct MailerError(pub String);

//----------------------------------------------   HttpMailer  ----------------------------------------------------
/// Sends email through a transactional provider's HTTP API.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Secret<String>,
    sender: String,
}

impl HttpMailer {
    pub fn new(config: &MailerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            sender: config.sender.clone(),
        }
    }
}

impl Mailer for HttpMailer {
    async fn send(&self, notification: Notification) -> Result<(), MailerError> {
        let payload = json!({
            "from": self.sender,
            "to": notification.to,
            "subject": notification.subject,
            "html": notification.body,
        });
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.reveal())
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailerError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MailerError(format!("Provider returned {status}: {body}")));
        }
        Ok(())
    }
}

//----------------------------------------------   LogMailer  ----------------------------------------------------
/// Writes notifications to the log instead of sending them. Used when the mailer is disabled and in tests.
#[derive(Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, notification: Notification) -> Result<(), MailerError> {
        info!("📧️ [not sent] To: {}. Subject: {}", notification.to, notification.subject);
        debug!("📧️ [not sent] Body: {}", notification.body);
        Ok(())
    }
}

//----------------------------------------------   NotificationMailer  -----------------------------------------------
/// The mailer the server actually installs, picked from configuration at startup.
///
/// The notification hook boxes its future as `dyn Future + Send`, which requires a concrete mailer type rather
/// than a generic parameter, so the choice between sending and logging is made here instead.
#[derive(Clone)]
pub enum NotificationMailer {
    Http(HttpMailer),
    Log(LogMailer),
}

impl NotificationMailer {
    pub fn from_config(config: &MailerConfig) -> Self {
        if config.enabled {
            Self::Http(HttpMailer::new(config))
        } else {
            Self::Log(LogMailer)
        }
    }
}

impl Mailer for NotificationMailer {
    async fn send(&self, notification: Notification) -> Result<(), MailerError> {
        match self {
            Self::Http(mailer) => mailer.send(notification).await,
            Self::Log(mailer) => mailer.send(notification).await,
        }
    }
}

//----------------------------------------------   Rendering  ----------------------------------------------------
/// Render the notification for a transition, addressed to the counterparty of the actor.
///
/// The magic link embeds the *recipient's* token, and only theirs. Accept and decline shortcuts are included where
/// the recipient is actually entitled to make that move.
pub fn render_notification(event: &TradeTransitionEvent, recipient_email: &str, base_url: &str) -> Notification {
    let trade = &event.trade;
    let recipient = event.counterparty();
    let token = trade.token_for(recipient);
    let link = format!("{base_url}/t/{}?token={token}", trade.id.as_str());
    let terms = format!(
        "{} of {} water in {} at {} per acre-foot",
        trade.volume_af,
        trade.water_type.as_deref().unwrap_or("surface"),
        trade.district,
        trade.price_per_af
    );
    let (subject, intro, actions) = match event.kind {
        EventKind::Offer => (
            format!("New offer on your {} listing", trade.district),
            format!("A buyer has offered to purchase {terms}."),
            seller_action_links(&link),
        ),
        EventKind::Counter => match recipient {
            TradeRole::Seller => (
                format!("The buyer countered on trade {}", trade.id),
                format!("The buyer proposes new terms: {terms}."),
                seller_action_links(&link),
            ),
            TradeRole::Buyer => (
                format!("The seller countered on trade {}", trade.id),
                format!("The seller proposes new terms: {terms}."),
                format!(
                    "<p><a href=\"{link}\">Review the counteroffer</a>, <a href=\"{link}&action=counter\">counter \
                     again</a> or <a href=\"{link}&action=decline\">decline</a>.</p>"
                ),
            ),
        },
        EventKind::Accept => (
            format!("Your offer was accepted ({})", trade.district),
            format!("The seller accepted {terms}. The trade now awaits your signature."),
            format!("<p><a href=\"{link}\">Review and sign</a></p>"),
        ),
        EventKind::Decline => (
            format!("Trade {} was declined", trade.id),
            format!("Your counterparty declined the trade for {terms}. No further action is possible."),
            format!("<p><a href=\"{link}\">View the final state</a></p>"),
        ),
    };
    let body = format!(
        "<html><body><p>{intro}</p><p>Round {round}.</p>{actions}</body></html>",
        round = trade.round
    );
    Notification { to: recipient_email.to_string(), subject, body }
}

fn seller_action_links(link: &str) -> String {
    format!(
        "<p><a href=\"{link}&action=accept\">Accept</a> | <a href=\"{link}&action=counter\">Counter</a> | \
         <a href=\"{link}&action=decline\">Decline</a></p>"
    )
}
