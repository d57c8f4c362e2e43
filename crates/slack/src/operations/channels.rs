use super::{CHANNEL_ID, CURSOR, list_text, message_line};
use serde_json::Value;
use unrelated_api_tools::render::{collection, field, flag, scalar};
use unrelated_api_tools::{Arguments, Handler, HttpMethod, Literal, OperationSpec, ParamKind, ParameterSpec};

pub(super) static OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        name: "slack_list_channels",
        description: "List channels in the workspace the bot can see, with pagination.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/conversations.list",
        },
        params: &[
            ParameterSpec::new("limit", ParamKind::Integer)
                .with_default(Literal::Integer(100))
                .clamped(1, 200)
                .doc("Channels per page (max 200)"),
            CURSOR,
            ParameterSpec::new("types", ParamKind::String)
                .with_default(Literal::Str("public_channel,private_channel"))
                .doc("Comma-separated conversation types"),
            ParameterSpec::new("exclude_archived", ParamKind::Boolean)
                .with_default(Literal::Boolean(true))
                .doc("Leave archived channels out"),
        ],
        render: render_channels,
    },
    OperationSpec {
        name: "slack_get_channel_history",
        description: "Recent messages from a channel, newest first.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/conversations.history",
        },
        params: &[
            CHANNEL_ID,
            ParameterSpec::new("limit", ParamKind::Integer)
                .with_default(Literal::Integer(10))
                .clamped(1, 1000)
                .doc("Number of messages (max 1000)"),
        ],
        render: render_history,
    },
    OperationSpec {
        name: "slack_get_thread_replies",
        description: "All messages in a thread, starting with the parent message.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/conversations.replies",
        },
        params: &[
            CHANNEL_ID,
            ParameterSpec::new("thread_ts", ParamKind::String)
                .required()
                .non_empty()
                .wire("ts")
                .doc("Timestamp of the parent message (e.g. 1234567890.123456)"),
        ],
        render: render_replies,
    },
];

fn render_channels(body: &Value, _args: &Arguments) -> String {
    let lines = collection(body, "channels")
        .iter()
        .map(|c| {
            let mut details = vec![field(c, "/id")];
            if let Some(members) = scalar(c, "/num_members") {
                details.push(format!("{members} members"));
            }
            if flag(c, "/is_private") {
                details.push("private".to_string());
            }
            if flag(c, "/is_archived") {
                details.push("archived".to_string());
            }
            let mut line = format!("- #{} ({})", field(c, "/name"), details.join(", "));
            if let Some(purpose) = scalar(c, "/purpose/value") {
                line.push_str(&format!(" - {purpose}"));
            }
            line
        })
        .collect();
    list_text("Channels", "No channels found.", body, lines)
}

fn render_history(body: &Value, args: &Arguments) -> String {
    let channel = args.display("channel_id").unwrap_or_default();
    let lines = collection(body, "messages").iter().map(message_line).collect();
    list_text(
        &format!("Messages in {channel}"),
        &format!("No messages in {channel}."),
        body,
        lines,
    )
}

fn render_replies(body: &Value, args: &Arguments) -> String {
    let channel = args.display("channel_id").unwrap_or_default();
    let thread = args.display("thread_ts").unwrap_or_default();
    let lines = collection(body, "messages").iter().map(message_line).collect();
    list_text(
        &format!("Thread {thread} in {channel}"),
        &format!("No messages found in thread {thread}."),
        body,
        lines,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use unrelated_api_tools::args::coerce_arguments;

    fn coerce(op: usize, v: Value) -> Arguments {
        let raw = serde_json::from_value(v).expect("object");
        coerce_arguments(OPERATIONS[op].params, &raw).expect("valid")
    }

    #[test]
    fn channel_limit_is_clamped_not_rejected() {
        assert_eq!(coerce(0, json!({"limit": 500})).integer("limit"), Some(200));
        assert_eq!(coerce(0, json!({"limit": 0})).integer("limit"), Some(1));
        assert_eq!(coerce(1, json!({"channel_id": "C1", "limit": 5000})).integer("limit"), Some(1000));
    }

    #[test]
    fn channel_list_defaults() {
        let args = coerce(0, json!({}));
        assert_eq!(args.integer("limit"), Some(100));
        assert_eq!(args.str("types"), Some("public_channel,private_channel"));
        assert_eq!(args.boolean("exclude_archived"), Some(true));
    }

    #[test]
    fn channels_render_with_members_and_purpose() {
        let body = json!({
            "ok": true,
            "channels": [
                {"id": "C1", "name": "general", "is_private": false, "num_members": 4,
                 "purpose": {"value": "Company-wide"}},
                {"id": "C2", "name": "secret", "is_private": true, "purpose": {"value": ""}}
            ],
            "response_metadata": {"next_cursor": ""}
        });
        assert_eq!(
            render_channels(&body, &Arguments::default()),
            "Channels (2):\n- #general (C1, 4 members) - Company-wide\n- #secret (C2, private)"
        );
    }

    #[test]
    fn empty_history_names_the_channel() {
        let args = coerce(1, json!({"channel_id": "C1"}));
        assert_eq!(render_history(&json!({"ok": true, "messages": []}), &args), "No messages in C1.");
    }

    #[test]
    fn thread_replies_list_each_message() {
        let args = coerce(2, json!({"channel_id": "C1", "thread_ts": "1.000"}));
        let body = json!({"ok": true, "messages": [
            {"user": "U1", "text": "question", "ts": "1.000", "reply_count": 1},
            {"user": "U2", "text": "answer", "ts": "1.500"}
        ]});
        assert_eq!(
            render_replies(&body, &args),
            "Thread 1.000 in C1 (2):\n- 1.000 U1: question (1 reply)\n- 1.500 U2: answer"
        );
    }
}
