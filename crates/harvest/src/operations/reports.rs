use super::{PAGE, PER_PAGE, list_text};
use serde_json::Value;
use unrelated_api_tools::render::{collection, field, scalar};
use unrelated_api_tools::{Arguments, Handler, HttpMethod, OperationSpec, ParamKind, ParameterSpec};

const PARAMS: &[ParameterSpec] = &[
    ParameterSpec::new("from_date", ParamKind::Date)
        .required()
        .wire("from")
        .doc("Start of the reporting period (YYYY-MM-DD)"),
    ParameterSpec::new("to_date", ParamKind::Date)
        .required()
        .wire("to")
        .doc("End of the reporting period (YYYY-MM-DD)"),
    ParameterSpec::new("include_fixed_fee", ParamKind::Boolean)
        .doc("Include fixed-fee projects in billable amounts"),
    PAGE,
    PER_PAGE,
];

pub(super) static OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        name: "get_clients_time_report",
        description: "Tracked hours and billable amounts per client for a date range.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/reports/time/clients",
        },
        params: PARAMS,
        render: render_clients,
    },
    OperationSpec {
        name: "get_projects_time_report",
        description: "Tracked hours and billable amounts per project for a date range.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/reports/time/projects",
        },
        params: PARAMS,
        render: render_projects,
    },
    OperationSpec {
        name: "get_tasks_time_report",
        description: "Tracked hours and billable amounts per task for a date range.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/reports/time/tasks",
        },
        params: PARAMS,
        render: render_tasks,
    },
    OperationSpec {
        name: "get_team_time_report",
        description: "Tracked hours and billable amounts per team member for a date range.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/reports/time/team",
        },
        params: PARAMS,
        render: render_team,
    },
];

fn report(subject: &str, label: fn(&Value) -> String, body: &Value, args: &Arguments) -> String {
    let lines = collection(body, "results")
        .iter()
        .map(|row| {
            let mut line = format!(
                "- {}: {}h total, {}h billable",
                label(row),
                field(row, "/total_hours"),
                field(row, "/billable_hours"),
            );
            if let Some(amount) = scalar(row, "/billable_amount") {
                line.push_str(&format!(", {amount} {}", field(row, "/currency")));
            }
            line
        })
        .collect();
    let period = format!(
        "{} to {}",
        args.display("from_date").unwrap_or_default(),
        args.display("to_date").unwrap_or_default()
    );
    list_text(
        &format!("Time report by {subject}, {period}"),
        &format!("No time tracked from {period}."),
        body,
        lines,
    )
}

fn render_clients(body: &Value, args: &Arguments) -> String {
    report("client", |r| field(r, "/client_name"), body, args)
}

fn render_projects(body: &Value, args: &Arguments) -> String {
    report(
        "project",
        |r| format!("{} ({})", field(r, "/project_name"), field(r, "/client_name")),
        body,
        args,
    )
}

fn render_tasks(body: &Value, args: &Arguments) -> String {
    report("task", |r| field(r, "/task_name"), body, args)
}

fn render_team(body: &Value, args: &Arguments) -> String {
    report("team member", |r| field(r, "/user_name"), body, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use unrelated_api_tools::args::coerce_arguments;

    fn period() -> Arguments {
        let raw = serde_json::from_value(json!({"from_date": "2023-01-01", "to_date": "2023-01-31"}))
            .expect("object");
        coerce_arguments(PARAMS, &raw).expect("valid")
    }

    #[test]
    fn clients_report_lists_hours_and_amounts() {
        let body = json!({
            "results": [
                {"client_id": 1, "client_name": "Acme", "total_hours": 12.5,
                 "billable_hours": 10.0, "currency": "USD", "billable_amount": 1250.0}
            ],
            "page": 1, "total_pages": 1, "total_entries": 1
        });
        let text = render_clients(&body, &period());
        assert!(text.starts_with("Time report by client, 2023-01-01 to 2023-01-31 (1):"));
        assert!(text.contains("- Acme: 12.5h total, 10.0h billable, 1250.0 USD"));
    }

    #[test]
    fn empty_report_names_the_period() {
        let text = render_team(&json!({"results": []}), &period());
        assert_eq!(text, "No time tracked from 2023-01-01 to 2023-01-31.");
    }

    #[test]
    fn dates_are_required() {
        let raw = serde_json::from_value(json!({"from_date": "2023-01-01"})).expect("object");
        let err = coerce_arguments(PARAMS, &raw).unwrap_err();
        assert_eq!(err.message, "to_date");
    }
}
