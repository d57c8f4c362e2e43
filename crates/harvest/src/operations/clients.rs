use super::{PAGE, PER_PAGE, UPDATED_SINCE, list_text};
use serde_json::Value;
use unrelated_api_tools::render::{collection, detail_lines, field, flag, scalar};
use unrelated_api_tools::{Arguments, Handler, HttpMethod, OperationSpec, ParamKind, ParameterSpec};

const CLIENT_ID: ParameterSpec = ParameterSpec::new("client_id", ParamKind::Integer)
    .required()
    .in_path()
    .doc("Client ID");

const IS_ACTIVE: ParameterSpec = ParameterSpec::new("is_active", ParamKind::Boolean).in_body();
const ADDRESS: ParameterSpec = ParameterSpec::new("address", ParamKind::String)
    .in_body()
    .doc("Physical address, may span lines");
const CURRENCY: ParameterSpec = ParameterSpec::new("currency", ParamKind::String)
    .in_body()
    .doc("ISO 4217 currency code, e.g. USD");

pub(super) static OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        name: "list_clients",
        description: "List clients, optionally only active ones.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/clients",
        },
        params: &[
            ParameterSpec::new("is_active", ParamKind::Boolean)
                .doc("true for active clients, false for archived ones"),
            UPDATED_SINCE,
            PAGE,
            PER_PAGE,
        ],
        render: render_list,
    },
    OperationSpec {
        name: "get_client",
        description: "Retrieve a single client.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/clients/{client_id}",
        },
        params: &[CLIENT_ID],
        render: render_client,
    },
    OperationSpec {
        name: "create_client",
        description: "Create a client.",
        handler: Handler::Endpoint {
            method: HttpMethod::Post,
            path: "/clients",
        },
        params: &[
            ParameterSpec::new("name", ParamKind::String)
                .required()
                .non_empty()
                .in_body(),
            IS_ACTIVE,
            ADDRESS,
            CURRENCY,
        ],
        render: render_created,
    },
    OperationSpec {
        name: "update_client",
        description: "Update fields of an existing client.",
        handler: Handler::Endpoint {
            method: HttpMethod::Patch,
            path: "/clients/{client_id}",
        },
        params: &[
            CLIENT_ID,
            ParameterSpec::new("name", ParamKind::String).non_empty().in_body(),
            IS_ACTIVE,
            ADDRESS,
            CURRENCY,
        ],
        render: render_updated,
    },
    OperationSpec {
        name: "delete_client",
        description: "Delete a client. Only clients without projects or invoices can be deleted.",
        handler: Handler::Endpoint {
            method: HttpMethod::Delete,
            path: "/clients/{client_id}",
        },
        params: &[CLIENT_ID],
        render: render_deleted,
    },
];

fn client_line(client: &Value) -> String {
    let status = if flag(client, "/is_active") { "active" } else { "archived" };
    match scalar(client, "/currency") {
        Some(currency) => format!(
            "- {} (id: {}, {status}, {currency})",
            field(client, "/name"),
            field(client, "/id")
        ),
        None => format!("- {} (id: {}, {status})", field(client, "/name"), field(client, "/id")),
    }
}

fn client_view(title: &str, client: &Value) -> String {
    let details = detail_lines(
        client,
        &[
            ("ID", "/id"),
            ("Name", "/name"),
            ("Active", "/is_active"),
            ("Currency", "/currency"),
            ("Address", "/address"),
            ("Updated", "/updated_at"),
        ],
    );
    format!("{title}:\n{details}")
}

fn render_list(body: &Value, _args: &Arguments) -> String {
    let lines = collection(body, "clients").iter().map(client_line).collect();
    list_text("Clients", "No clients found.", body, lines)
}

fn render_client(body: &Value, _args: &Arguments) -> String {
    client_view("Client", body)
}

fn render_created(body: &Value, _args: &Arguments) -> String {
    client_view("Created client", body)
}

fn render_updated(body: &Value, _args: &Arguments) -> String {
    client_view("Updated client", body)
}

fn render_deleted(_body: &Value, args: &Arguments) -> String {
    format!("Deleted client {}.", args.display("client_id").unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_accepts_bare_array() {
        let body = json!([{"id": 1, "name": "Acme", "is_active": true}]);
        assert_eq!(
            render_list(&body, &Arguments::default()),
            "Clients (1):\n- Acme (id: 1, active)"
        );
    }

    #[test]
    fn list_accepts_envelope_with_currency() {
        let body = json!({
            "clients": [{"id": 5, "name": "Globex", "is_active": false, "currency": "EUR"}],
            "page": 1, "total_pages": 1, "total_entries": 1
        });
        let text = render_list(&body, &Arguments::default());
        assert!(text.contains("- Globex (id: 5, archived, EUR)"));
        assert!(text.ends_with("Page 1 of 1 (1 total)"));
    }

    #[test]
    fn client_view_lists_present_fields() {
        let text = render_client(&json!({"id": 1, "name": "Acme", "is_active": true}), &Arguments::default());
        assert_eq!(text, "Client:\n  ID: 1\n  Name: Acme\n  Active: true");
    }
}
