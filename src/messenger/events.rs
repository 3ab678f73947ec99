//! Inbound webhook payloads and the activities derived from them.
//!
//! The platform delivers batches: one entry per page, each with a list of
//! messaging events. [`WebhookBatch::into_activities`] flattens them into
//! [`Activity`] values with typed channel data.

use serde::{Deserialize, Serialize};

/// A participant in a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    /// Page id or page-scoped user id. Empty when the platform omitted it.
    #[serde(default)]
    pub id: String,
    /// Display name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    /// An account with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Messenger-specific fields of an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessengerChannelData {
    /// The platform's copy of a message this page sent. Sender and
    /// recipient are swapped relative to a normal inbound message.
    #[serde(default)]
    pub is_echo: bool,
    /// Delivered on the `standby` channel (this app is not thread owner).
    #[serde(default)]
    pub standby: bool,
    /// Page the webhook entry belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    /// App that sent an echoed message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<u64>,
    /// Postback payload, when the event is a button press.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postback_payload: Option<String>,
}

/// An inbound conversational event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Platform message id, when the event carries a message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Who sent the event.
    #[serde(default)]
    pub from: ChannelAccount,
    /// Who received the event.
    #[serde(default)]
    pub recipient: ChannelAccount,
    /// Message text, or the postback payload for button presses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Event time in milliseconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Messenger-specific fields.
    #[serde(default)]
    pub channel_data: MessengerChannelData,
}

impl Activity {
    /// Whether this activity echoes a message the page itself sent.
    pub fn is_echo(&self) -> bool {
        self.channel_data.is_echo
    }
}

/// Top-level webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBatch {
    /// Subscription object, `page` for Messenger.
    pub object: String,
    /// One entry per page.
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

/// Events for a single page.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    /// Page id.
    #[serde(default)]
    pub id: String,
    /// Batch time in milliseconds since the epoch.
    #[serde(default)]
    pub time: Option<u64>,
    /// Events for which this app is the thread owner.
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
    /// Events observed while another app owns the thread.
    #[serde(default)]
    pub standby: Vec<MessagingEvent>,
}

/// Id-only participant reference used by the webhook wire format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Participant {
    /// Page id or page-scoped user id.
    #[serde(default)]
    pub id: String,
}

/// A single messaging event.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingEvent {
    /// Event sender.
    #[serde(default)]
    pub sender: Participant,
    /// Event recipient.
    #[serde(default)]
    pub recipient: Participant,
    /// Event time in milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: Option<u64>,
    /// Message content, for `messages` and `message_echoes`.
    #[serde(default)]
    pub message: Option<InboundMessage>,
    /// Button press, for `messaging_postbacks`.
    #[serde(default)]
    pub postback: Option<Postback>,
}

/// Message fields of a messaging event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    /// Message id.
    #[serde(default)]
    pub mid: Option<String>,
    /// Text content.
    #[serde(default)]
    pub text: Option<String>,
    /// Set on echoes of messages sent by the page.
    #[serde(default)]
    pub is_echo: bool,
    /// App that sent an echoed message.
    #[serde(default)]
    pub app_id: Option<u64>,
}

/// Postback fields of a messaging event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Postback {
    /// Button title.
    #[serde(default)]
    pub title: Option<String>,
    /// Developer-defined payload.
    #[serde(default)]
    pub payload: Option<String>,
}

impl WebhookBatch {
    /// Parse a webhook body. Call only after the signature has been verified.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the body is not a webhook batch.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Flatten all entries into activities, skipping events without a sender.
    pub fn into_activities(self) -> Vec<Activity> {
        let mut activities = Vec::new();
        for entry in self.entry {
            let page_id = (!entry.id.is_empty()).then_some(entry.id);
            let owned = entry.messaging.into_iter().map(|event| (event, false));
            let standby = entry.standby.into_iter().map(|event| (event, true));
            for (event, is_standby) in owned.chain(standby) {
                if let Some(activity) = to_activity(event, page_id.as_deref(), is_standby) {
                    activities.push(activity);
                }
            }
        }
        activities
    }
}

fn to_activity(event: MessagingEvent, page_id: Option<&str>, standby: bool) -> Option<Activity> {
    if event.sender.id.trim().is_empty() {
        return None;
    }

    let message = event.message.unwrap_or_default();
    let postback_payload = event.postback.and_then(|p| p.payload);
    let text = message.text.or_else(|| postback_payload.clone());

    Some(Activity {
        id: message.mid,
        from: ChannelAccount::new(event.sender.id),
        recipient: ChannelAccount::new(event.recipient.id),
        text,
        timestamp: event.timestamp,
        channel_data: MessengerChannelData {
            is_echo: message.is_echo,
            standby,
            page_id: page_id.map(str::to_owned),
            app_id: message.app_id,
            postback_payload,
        },
    })
}
