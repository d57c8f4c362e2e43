use super::{CURSOR, list_text};
use serde_json::Value;
use unrelated_api_tools::render::{collection, detail_lines, field, flag, scalar};
use unrelated_api_tools::{Arguments, Handler, HttpMethod, Literal, OperationSpec, ParamKind, ParameterSpec};

pub(super) static OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        name: "slack_get_users",
        description: "List workspace members with their basic profile information.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/users.list",
        },
        params: &[
            ParameterSpec::new("limit", ParamKind::Integer)
                .with_default(Literal::Integer(100))
                .clamped(1, 200)
                .doc("Users per page (max 200)"),
            CURSOR,
        ],
        render: render_users,
    },
    OperationSpec {
        name: "slack_get_user_profile",
        description: "Detailed profile of one user, including custom profile fields.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/users.profile.get",
        },
        params: &[
            ParameterSpec::new("user_id", ParamKind::String)
                .required()
                .non_empty()
                .wire("user")
                .doc("User ID (e.g. U0123456789)"),
            ParameterSpec::new("include_labels", ParamKind::Boolean)
                .with_default(Literal::Boolean(true))
                .doc("Include labels for custom profile fields"),
        ],
        render: render_profile,
    },
];

fn render_users(body: &Value, _args: &Arguments) -> String {
    let lines = collection(body, "members")
        .iter()
        .map(|u| {
            let mut line = format!("- {} ({})", field(u, "/name"), field(u, "/id"));
            if let Some(real_name) = scalar(u, "/real_name").or_else(|| scalar(u, "/profile/real_name")) {
                line.push_str(&format!(" {real_name}"));
            }
            if flag(u, "/is_bot") {
                line.push_str(" [bot]");
            }
            if flag(u, "/deleted") {
                line.push_str(" [deactivated]");
            }
            line
        })
        .collect();
    list_text("Users", "No users found.", body, lines)
}

const PROFILE_FIELDS: &[(&str, &str)] = &[
    ("Real name", "/real_name"),
    ("Display name", "/display_name"),
    ("Title", "/title"),
    ("Email", "/email"),
    ("Phone", "/phone"),
    ("Status", "/status_text"),
    ("Status emoji", "/status_emoji"),
];

fn render_profile(body: &Value, args: &Arguments) -> String {
    let user = args.display("user_id").unwrap_or_default();
    let Some(profile) = body.get("profile").filter(|p| p.is_object()) else {
        return format!("No profile found for {user}.");
    };

    let mut out = format!("Profile of {user}:");
    let details = detail_lines(profile, PROFILE_FIELDS);
    if !details.is_empty() {
        out.push('\n');
        out.push_str(&details);
    }

    // {"Xf01": {"value": "...", "label": "..."}}; no label unless include_labels was set.
    if let Some(fields) = profile.get("fields").and_then(Value::as_object) {
        for (id, custom) in fields {
            let Some(value) = scalar(custom, "/value") else {
                continue;
            };
            let label = scalar(custom, "/label").unwrap_or_else(|| id.clone());
            out.push_str(&format!("\n  {label}: {value}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use unrelated_api_tools::args::coerce_arguments;

    fn profile_args() -> Arguments {
        let raw = serde_json::from_value(json!({"user_id": "U1"})).expect("object");
        coerce_arguments(OPERATIONS[1].params, &raw).expect("valid")
    }

    #[test]
    fn users_show_flags() {
        let body = json!({"ok": true, "members": [
            {"id": "U1", "name": "egon", "real_name": "Egon Spengler", "is_bot": false, "deleted": false},
            {"id": "B1", "name": "helper", "is_bot": true, "deleted": true}
        ]});
        assert_eq!(
            render_users(&body, &Arguments::default()),
            "Users (2):\n- egon (U1) Egon Spengler\n- helper (B1) [bot] [deactivated]"
        );
    }

    #[test]
    fn profile_lists_known_and_custom_fields() {
        let body = json!({"ok": true, "profile": {
            "real_name": "Egon Spengler",
            "display_name": "spengler",
            "title": "",
            "email": "spengler@ghostbusters.example.com",
            "fields": {"Xf06054BBB": {"value": "Ghostbusters", "label": "Team"}}
        }});
        assert_eq!(
            render_profile(&body, &profile_args()),
            "Profile of U1:\n  Real name: Egon Spengler\n  Display name: spengler\n  \
             Email: spengler@ghostbusters.example.com\n  Team: Ghostbusters"
        );
    }

    #[test]
    fn include_labels_defaults_to_true() {
        assert_eq!(profile_args().boolean("include_labels"), Some(true));
    }

    #[test]
    fn missing_profile_is_reported() {
        assert_eq!(render_profile(&json!({"ok": true}), &profile_args()), "No profile found for U1.");
    }
}
