use super::{CHANNEL_ID, CURSOR, list_text, unix_time};
use serde_json::Value;
use unrelated_api_tools::render::{collection, field, scalar};
use unrelated_api_tools::{Arguments, Handler, HttpMethod, Literal, OperationSpec, ParamKind, ParameterSpec};

const TEXT: ParameterSpec = ParameterSpec::new("text", ParamKind::String)
    .required()
    .non_empty()
    .in_body()
    .doc("Message text (Slack mrkdwn)");

pub(super) static OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        name: "slack_post_message",
        description: "Post a new message to a channel.",
        handler: Handler::Endpoint {
            method: HttpMethod::Post,
            path: "/chat.postMessage",
        },
        params: &[CHANNEL_ID.in_body(), TEXT],
        render: render_posted,
    },
    OperationSpec {
        name: "slack_reply_to_thread",
        description: "Reply in the thread of an existing message.",
        handler: Handler::Endpoint {
            method: HttpMethod::Post,
            path: "/chat.postMessage",
        },
        params: &[
            CHANNEL_ID.in_body(),
            ParameterSpec::new("thread_ts", ParamKind::String)
                .required()
                .non_empty()
                .in_body()
                .doc("Timestamp of the parent message (e.g. 1234567890.123456)"),
            TEXT,
        ],
        render: render_reply,
    },
    OperationSpec {
        name: "slack_add_reaction",
        description: "Add an emoji reaction to a message.",
        handler: Handler::Endpoint {
            method: HttpMethod::Post,
            path: "/reactions.add",
        },
        params: &[
            CHANNEL_ID.in_body(),
            ParameterSpec::new("timestamp", ParamKind::String)
                .required()
                .non_empty()
                .in_body()
                .doc("Timestamp of the message to react to"),
            ParameterSpec::new("reaction", ParamKind::String)
                .required()
                .non_empty()
                .in_body()
                .wire("name")
                .doc("Emoji name without colons (e.g. thumbsup)"),
        ],
        render: render_reaction,
    },
    OperationSpec {
        name: "schedule_message",
        description: "Schedule a message to be posted to a channel at a future time.",
        handler: Handler::Endpoint {
            method: HttpMethod::Post,
            path: "/chat.scheduleMessage",
        },
        params: &[
            CHANNEL_ID.in_body(),
            TEXT,
            ParameterSpec::new("post_at", ParamKind::Integer)
                .required()
                .in_body()
                .doc("Unix timestamp (seconds) at which to post"),
        ],
        render: render_scheduled,
    },
    OperationSpec {
        name: "list_scheduled_messages",
        description: "List messages scheduled in a channel that have not been posted yet.",
        handler: Handler::Endpoint {
            method: HttpMethod::Post,
            path: "/chat.scheduledMessages.list",
        },
        params: &[
            CHANNEL_ID.in_body(),
            ParameterSpec::new("limit", ParamKind::Integer)
                .with_default(Literal::Integer(100))
                .clamped(1, 1000)
                .in_body()
                .doc("Messages per page (max 1000)"),
            CURSOR.in_body(),
        ],
        render: render_scheduled_list,
    },
    OperationSpec {
        name: "delete_scheduled_message",
        description: "Cancel a scheduled message before it is posted.",
        handler: Handler::Endpoint {
            method: HttpMethod::Post,
            path: "/chat.deleteScheduledMessage",
        },
        params: &[
            CHANNEL_ID.in_body(),
            ParameterSpec::new("scheduled_message_id", ParamKind::String)
                .required()
                .non_empty()
                .in_body()
                .doc("ID returned by schedule_message"),
        ],
        render: render_unscheduled,
    },
];

fn channel(body: &Value, args: &Arguments) -> String {
    scalar(body, "/channel")
        .or_else(|| args.display("channel_id"))
        .unwrap_or_default()
}

fn render_posted(body: &Value, args: &Arguments) -> String {
    format!("Message posted to {} (ts {}).", channel(body, args), field(body, "/ts"))
}

fn render_reply(body: &Value, args: &Arguments) -> String {
    format!(
        "Reply posted to thread {} in {} (ts {}).",
        args.display("thread_ts").unwrap_or_default(),
        channel(body, args),
        field(body, "/ts")
    )
}

fn render_reaction(_body: &Value, args: &Arguments) -> String {
    format!(
        "Added :{}: to message {} in {}.",
        args.display("reaction").unwrap_or_default(),
        args.display("timestamp").unwrap_or_default(),
        args.display("channel_id").unwrap_or_default()
    )
}

fn render_scheduled(body: &Value, args: &Arguments) -> String {
    let post_at = body
        .get("post_at")
        .and_then(Value::as_i64)
        .or_else(|| args.integer("post_at"))
        .unwrap_or_default();
    format!(
        "Scheduled message {} in {} for {}.",
        field(body, "/scheduled_message_id"),
        channel(body, args),
        unix_time(post_at)
    )
}

fn render_scheduled_list(body: &Value, args: &Arguments) -> String {
    let channel = args.display("channel_id").unwrap_or_default();
    let lines = collection(body, "scheduled_messages")
        .iter()
        .map(|m| {
            let when = m
                .get("post_at")
                .and_then(Value::as_i64)
                .map_or_else(|| "n/a".to_string(), unix_time);
            format!(
                "- {} at {when}: {}",
                field(m, "/id"),
                scalar(m, "/text").unwrap_or_default()
            )
        })
        .collect();
    list_text(
        &format!("Scheduled messages in {channel}"),
        &format!("No scheduled messages in {channel}."),
        body,
        lines,
    )
}

fn render_unscheduled(_body: &Value, args: &Arguments) -> String {
    format!(
        "Deleted scheduled message {} from {}.",
        args.display("scheduled_message_id").unwrap_or_default(),
        args.display("channel_id").unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use unrelated_api_tools::ErrorKind;
    use unrelated_api_tools::args::coerce_arguments;
    use unrelated_api_tools::schema::ParamLocation;

    fn op(name: &str) -> &'static OperationSpec {
        OPERATIONS.iter().find(|o| o.name == name).expect("operation")
    }

    fn coerce(name: &str, v: Value) -> Result<Arguments, unrelated_api_tools::Failure> {
        let raw = serde_json::from_value(v).expect("object");
        coerce_arguments(op(name).params, &raw)
    }

    #[test]
    fn write_operations_send_everything_in_the_body() {
        for spec in OPERATIONS {
            assert!(
                spec.params.iter().all(|p| p.location == ParamLocation::Body),
                "{}",
                spec.name
            );
        }
    }

    #[test]
    fn post_at_accepts_numeric_strings() {
        let args = coerce(
            "schedule_message",
            json!({"channel_id": "C1", "text": "hi", "post_at": "1562180400"}),
        )
        .expect("valid");
        assert_eq!(args.integer("post_at"), Some(1_562_180_400));

        let err = coerce(
            "schedule_message",
            json!({"channel_id": "C1", "text": "hi", "post_at": "tomorrow"}),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidParameterType);
    }

    #[test]
    fn blank_text_is_rejected() {
        let err = coerce("slack_post_message", json!({"channel_id": "C1", "text": "  "})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidParameterValue);
    }

    #[test]
    fn posted_message_reports_channel_and_ts() {
        let args = coerce("slack_post_message", json!({"channel_id": "C1", "text": "hi"})).expect("valid");
        let body = json!({"ok": true, "channel": "C1", "ts": "1503435956.000247"});
        assert_eq!(render_posted(&body, &args), "Message posted to C1 (ts 1503435956.000247).");
    }

    #[test]
    fn scheduled_message_shows_utc_time() {
        let args = coerce(
            "schedule_message",
            json!({"channel_id": "C1", "text": "hi", "post_at": 1_562_180_400}),
        )
        .expect("valid");
        let body = json!({"ok": true, "channel": "C1", "scheduled_message_id": "Q1298393284", "post_at": 1_562_180_400});
        assert_eq!(
            render_scheduled(&body, &args),
            "Scheduled message Q1298393284 in C1 for 2019-07-03 19:00:00 UTC."
        );
    }

    #[test]
    fn scheduled_list_renders_each_message() {
        let args = coerce("list_scheduled_messages", json!({"channel_id": "C1"})).expect("valid");
        assert_eq!(args.integer("limit"), Some(100));
        let body = json!({"ok": true, "scheduled_messages": [
            {"id": "Q1", "channel_id": "C1", "post_at": 1_562_180_400, "text": "standup"}
        ], "response_metadata": {"next_cursor": ""}});
        assert_eq!(
            render_scheduled_list(&body, &args),
            "Scheduled messages in C1 (1):\n- Q1 at 2019-07-03 19:00:00 UTC: standup"
        );
    }

    #[test]
    fn reaction_confirmation_uses_arguments() {
        let args = coerce(
            "slack_add_reaction",
            json!({"channel_id": "C1", "timestamp": "1.0", "reaction": "thumbsup"}),
        )
        .expect("valid");
        assert_eq!(render_reaction(&json!({"ok": true}), &args), "Added :thumbsup: to message 1.0 in C1.");
    }
}
