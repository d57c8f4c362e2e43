use super::{PAGE, PER_PAGE, UPDATED_SINCE, list_text};
use serde_json::Value;
use unrelated_api_tools::render::{collection, detail_lines, field, flag, scalar};
use unrelated_api_tools::{
    Arguments, Handler, HttpMethod, Literal, OperationSpec, ParamKind, ParameterSpec,
};

const BILL_BY: ParamKind = ParamKind::Enum(&["Project", "Tasks", "People", "none"]);
const BUDGET_BY: ParamKind =
    ParamKind::Enum(&["project", "project_cost", "task", "task_fees", "person", "none"]);

const PROJECT_ID: ParameterSpec = ParameterSpec::new("project_id", ParamKind::Integer)
    .required()
    .in_path()
    .doc("Project ID");

const fn body_param(name: &'static str, kind: ParamKind) -> ParameterSpec {
    ParameterSpec::new(name, kind).in_body()
}

pub(super) static OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        name: "list_projects",
        description: "List projects, optionally filtered by client or active state.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/projects",
        },
        params: &[
            ParameterSpec::new("is_active", ParamKind::Boolean),
            ParameterSpec::new("client_id", ParamKind::Integer),
            UPDATED_SINCE,
            PAGE,
            PER_PAGE,
        ],
        render: render_list,
    },
    OperationSpec {
        name: "get_project",
        description: "Retrieve a single project.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/projects/{project_id}",
        },
        params: &[PROJECT_ID],
        render: render_project,
    },
    OperationSpec {
        name: "create_project",
        description: "Create a project for a client.",
        handler: Handler::Endpoint {
            method: HttpMethod::Post,
            path: "/projects",
        },
        params: &[
            body_param("client_id", ParamKind::Integer).required(),
            body_param("name", ParamKind::String).required().non_empty(),
            body_param("code", ParamKind::String),
            body_param("is_active", ParamKind::Boolean),
            body_param("is_billable", ParamKind::Boolean),
            body_param("is_fixed_fee", ParamKind::Boolean),
            body_param("bill_by", BILL_BY).with_default(Literal::Str("Project")),
            body_param("hourly_rate", ParamKind::Float),
            body_param("budget", ParamKind::Float),
            body_param("budget_by", BUDGET_BY).with_default(Literal::Str("project")),
            body_param("budget_is_monthly", ParamKind::Boolean),
            body_param("notify_when_over_budget", ParamKind::Boolean),
            body_param("over_budget_notification_percentage", ParamKind::Float),
            body_param("show_budget_to_all", ParamKind::Boolean),
            body_param("cost_budget", ParamKind::Float),
            body_param("cost_budget_include_expenses", ParamKind::Boolean),
            body_param("fee", ParamKind::Float),
            body_param("notes", ParamKind::String),
            body_param("starts_on", ParamKind::Date),
            body_param("ends_on", ParamKind::Date),
        ],
        render: render_created,
    },
    OperationSpec {
        name: "update_project",
        description: "Update fields of an existing project.",
        handler: Handler::Endpoint {
            method: HttpMethod::Patch,
            path: "/projects/{project_id}",
        },
        params: &[
            PROJECT_ID,
            body_param("client_id", ParamKind::Integer),
            body_param("name", ParamKind::String).non_empty(),
            body_param("code", ParamKind::String),
            body_param("is_active", ParamKind::Boolean),
            body_param("is_billable", ParamKind::Boolean),
            body_param("is_fixed_fee", ParamKind::Boolean),
            body_param("bill_by", BILL_BY),
            body_param("hourly_rate", ParamKind::Float),
            body_param("budget", ParamKind::Float),
            body_param("budget_by", BUDGET_BY),
            body_param("budget_is_monthly", ParamKind::Boolean),
            body_param("notify_when_over_budget", ParamKind::Boolean),
            body_param("over_budget_notification_percentage", ParamKind::Float),
            body_param("show_budget_to_all", ParamKind::Boolean),
            body_param("cost_budget", ParamKind::Float),
            body_param("cost_budget_include_expenses", ParamKind::Boolean),
            body_param("fee", ParamKind::Float),
            body_param("notes", ParamKind::String),
            body_param("starts_on", ParamKind::Date),
            body_param("ends_on", ParamKind::Date),
        ],
        render: render_updated,
    },
    OperationSpec {
        name: "delete_project",
        description: "Delete a project and its time entries and expenses.",
        handler: Handler::Endpoint {
            method: HttpMethod::Delete,
            path: "/projects/{project_id}",
        },
        params: &[PROJECT_ID],
        render: render_deleted,
    },
];

fn project_line(project: &Value) -> String {
    let name = match scalar(project, "/code") {
        Some(code) => format!("{} [{code}]", field(project, "/name")),
        None => field(project, "/name"),
    };
    let mut tags = vec![format!("id: {}", field(project, "/id"))];
    if let Some(client) = scalar(project, "/client/name") {
        tags.push(format!("client: {client}"));
    }
    tags.push(if flag(project, "/is_active") { "active" } else { "archived" }.to_string());
    if flag(project, "/is_billable") {
        tags.push("billable".to_string());
    }
    format!("- {name} ({})", tags.join(", "))
}

fn project_view(title: &str, project: &Value) -> String {
    let details = detail_lines(
        project,
        &[
            ("ID", "/id"),
            ("Name", "/name"),
            ("Code", "/code"),
            ("Client", "/client/name"),
            ("Active", "/is_active"),
            ("Billable", "/is_billable"),
            ("Fixed fee", "/is_fixed_fee"),
            ("Bill by", "/bill_by"),
            ("Hourly rate", "/hourly_rate"),
            ("Budget", "/budget"),
            ("Budget by", "/budget_by"),
            ("Fee", "/fee"),
            ("Starts on", "/starts_on"),
            ("Ends on", "/ends_on"),
            ("Notes", "/notes"),
        ],
    );
    format!("{title}:\n{details}")
}

fn render_list(body: &Value, _args: &Arguments) -> String {
    let lines = collection(body, "projects").iter().map(project_line).collect();
    list_text("Projects", "No projects found.", body, lines)
}

fn render_project(body: &Value, _args: &Arguments) -> String {
    project_view("Project", body)
}

fn render_created(body: &Value, _args: &Arguments) -> String {
    project_view("Created project", body)
}

fn render_updated(body: &Value, _args: &Arguments) -> String {
    project_view("Updated project", body)
}

fn render_deleted(_body: &Value, args: &Arguments) -> String {
    format!("Deleted project {}.", args.display("project_id").unwrap_or_default())
}
