//! Webhook batch parsing and activity flattening.

use messenger_gateway::messenger::WebhookBatch;

const BATCH: &str = r#"{
  "object": "page",
  "entry": [
    {
      "id": "PAGE1",
      "time": 1458692752478,
      "messaging": [
        {
          "sender": { "id": "USER1" },
          "recipient": { "id": "PAGE1" },
          "timestamp": 1458692752478,
          "message": { "mid": "mid.1", "text": "hello" }
        },
        {
          "sender": { "id": "PAGE1" },
          "recipient": { "id": "USER1" },
          "timestamp": 1458692752479,
          "message": { "mid": "mid.2", "text": "hi back", "is_echo": true, "app_id": 1517776481860111 }
        },
        {
          "sender": { "id": "USER1" },
          "recipient": { "id": "PAGE1" },
          "timestamp": 1458692752480,
          "postback": { "title": "Get Started", "payload": "GET_STARTED" }
        },
        {
          "recipient": { "id": "PAGE1" },
          "timestamp": 1458692752481,
          "message": { "mid": "mid.orphan", "text": "no sender" }
        }
      ],
      "standby": [
        {
          "sender": { "id": "USER2" },
          "recipient": { "id": "PAGE1" },
          "timestamp": 1458692752482,
          "message": { "mid": "mid.3", "text": "while another app owns the thread" }
        }
      ]
    }
  ]
}"#;

#[test]
fn parses_batch_object_and_entries() {
    let parsed = WebhookBatch::from_slice(BATCH.as_bytes());
    assert!(parsed.is_ok());
    let batch = match parsed {
        Ok(batch) => batch,
        Err(err) => panic!("batch should parse: {err}"),
    };
    assert_eq!(batch.object, "page");
    assert_eq!(batch.entry.len(), 1);
    assert_eq!(batch.entry[0].messaging.len(), 4);
    assert_eq!(batch.entry[0].standby.len(), 1);
}

#[test]
fn flattens_events_and_skips_missing_sender() {
    let batch = WebhookBatch::from_slice(BATCH.as_bytes()).expect("batch should parse");
    let activities = batch.into_activities();
    let ids: Vec<Option<&str>> = activities.iter().map(|a| a.id.as_deref()).collect();
    assert_eq!(ids, vec![Some("mid.1"), Some("mid.2"), None, Some("mid.3")]);
}

#[test]
fn regular_message_maps_fields() {
    let activities = WebhookBatch::from_slice(BATCH.as_bytes())
        .expect("batch should parse")
        .into_activities();
    let first = &activities[0];
    assert_eq!(first.from.id, "USER1");
    assert_eq!(first.recipient.id, "PAGE1");
    assert_eq!(first.text.as_deref(), Some("hello"));
    assert_eq!(first.timestamp, Some(1_458_692_752_478));
    assert!(!first.is_echo());
    assert_eq!(first.channel_data.page_id.as_deref(), Some("PAGE1"));
    assert!(!first.channel_data.standby);
}

#[test]
fn echo_flag_is_typed_channel_data() {
    let activities = WebhookBatch::from_slice(BATCH.as_bytes())
        .expect("batch should parse")
        .into_activities();
    let echo = &activities[1];
    assert!(echo.is_echo());
    assert!(echo.channel_data.is_echo);
    assert_eq!(echo.from.id, "PAGE1");
    assert_eq!(echo.channel_data.app_id, Some(1_517_776_481_860_111));
}

#[test]
fn postback_payload_becomes_text() {
    let activities = WebhookBatch::from_slice(BATCH.as_bytes())
        .expect("batch should parse")
        .into_activities();
    let postback = &activities[2];
    assert_eq!(postback.text.as_deref(), Some("GET_STARTED"));
    assert_eq!(
        postback.channel_data.postback_payload.as_deref(),
        Some("GET_STARTED")
    );
}

#[test]
fn standby_events_are_marked() {
    let activities = WebhookBatch::from_slice(BATCH.as_bytes())
        .expect("batch should parse")
        .into_activities();
    let standby = &activities[3];
    assert!(standby.channel_data.standby);
    assert_eq!(standby.from.id, "USER2");
}

#[test]
fn activity_channel_data_round_trips_through_json() {
    let activities = WebhookBatch::from_slice(BATCH.as_bytes())
        .expect("batch should parse")
        .into_activities();
    let json = serde_json::to_value(&activities[1]).expect("activity should serialize");
    assert_eq!(json["channel_data"]["is_echo"], true);
}

#[test]
fn rejects_non_batch_json() {
    assert!(WebhookBatch::from_slice(br#"{"entry": []}"#).is_err());
    assert!(WebhookBatch::from_slice(b"not json").is_err());
}

#[test]
fn empty_entry_list_yields_no_activities() {
    let batch = WebhookBatch::from_slice(br#"{"object":"page"}"#).expect("batch should parse");
    assert!(batch.into_activities().is_empty());
}
