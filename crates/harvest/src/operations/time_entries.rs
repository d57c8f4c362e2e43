use super::{PAGE, PER_PAGE, UPDATED_SINCE, list_text};
use serde_json::Value;
use unrelated_api_tools::render::{collection, detail_lines, field, flag, scalar};
use unrelated_api_tools::{Arguments, Handler, HttpMethod, OperationSpec, ParamKind, ParameterSpec};

const TIME_ENTRY_ID: ParameterSpec = ParameterSpec::new("time_entry_id", ParamKind::Integer)
    .required()
    .in_path()
    .doc("Time entry ID");

const PROJECT_ID: ParameterSpec = ParameterSpec::new("project_id", ParamKind::Integer)
    .required()
    .in_body()
    .doc("Project ID");
const TASK_ID: ParameterSpec = ParameterSpec::new("task_id", ParamKind::Integer)
    .required()
    .in_body()
    .doc("Task ID");
const SPENT_DATE: ParameterSpec = ParameterSpec::new("spent_date", ParamKind::Date)
    .required()
    .in_body()
    .doc("Date of the entry (YYYY-MM-DD)");
const USER_ID: ParameterSpec = ParameterSpec::new("user_id", ParamKind::Integer)
    .in_body()
    .doc("User ID; defaults to the authenticated user");
const NOTES: ParameterSpec = ParameterSpec::new("notes", ParamKind::String).in_body();
const EXTERNAL_REFERENCE: ParameterSpec = ParameterSpec::new("external_reference", ParamKind::Object)
    .in_body()
    .doc("External reference object (id, group_id, account_id, permalink)");
const STARTED_TIME: ParameterSpec = ParameterSpec::new("started_time", ParamKind::String)
    .in_body()
    .doc("Start time, e.g. \"8:00am\"");
const ENDED_TIME: ParameterSpec = ParameterSpec::new("ended_time", ParamKind::String)
    .in_body()
    .doc("End time, e.g. \"5:00pm\"");
const HOURS: ParameterSpec = ParameterSpec::new("hours", ParamKind::Float)
    .in_body()
    .doc("Duration in decimal hours");

pub(super) static OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        name: "list_time_entries",
        description: "List time entries, newest first, with optional filters.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/time_entries",
        },
        params: &[
            ParameterSpec::new("user_id", ParamKind::Integer),
            ParameterSpec::new("client_id", ParamKind::Integer),
            ParameterSpec::new("project_id", ParamKind::Integer),
            ParameterSpec::new("task_id", ParamKind::Integer),
            ParameterSpec::new("external_reference_id", ParamKind::String),
            ParameterSpec::new("is_billed", ParamKind::Boolean),
            ParameterSpec::new("is_running", ParamKind::Boolean),
            UPDATED_SINCE,
            ParameterSpec::new("from_date", ParamKind::Date)
                .wire("from")
                .doc("Only entries spent on or after this date"),
            ParameterSpec::new("to_date", ParamKind::Date)
                .wire("to")
                .doc("Only entries spent on or before this date"),
            PAGE,
            PER_PAGE,
        ],
        render: render_list,
    },
    OperationSpec {
        name: "get_time_entry",
        description: "Retrieve a single time entry.",
        handler: Handler::Endpoint {
            method: HttpMethod::Get,
            path: "/time_entries/{time_entry_id}",
        },
        params: &[TIME_ENTRY_ID],
        render: render_entry,
    },
    OperationSpec {
        name: "create_time_entry_duration",
        description: "Create a time entry for a number of hours on a date.",
        handler: Handler::Endpoint {
            method: HttpMethod::Post,
            path: "/time_entries",
        },
        params: &[
            PROJECT_ID,
            TASK_ID,
            SPENT_DATE,
            USER_ID,
            HOURS,
            NOTES,
            EXTERNAL_REFERENCE,
        ],
        render: render_created,
    },
    OperationSpec {
        name: "create_time_entry_start_end",
        description: "Create a time entry from a start and end time.",
        handler: Handler::Endpoint {
            method: HttpMethod::Post,
            path: "/time_entries",
        },
        params: &[
            PROJECT_ID,
            TASK_ID,
            SPENT_DATE,
            USER_ID,
            STARTED_TIME,
            ENDED_TIME,
            NOTES,
            EXTERNAL_REFERENCE,
        ],
        render: render_created,
    },
    OperationSpec {
        name: "update_time_entry",
        description: "Update fields of an existing time entry.",
        handler: Handler::Endpoint {
            method: HttpMethod::Patch,
            path: "/time_entries/{time_entry_id}",
        },
        params: &[
            TIME_ENTRY_ID,
            ParameterSpec::new("project_id", ParamKind::Integer).in_body(),
            ParameterSpec::new("task_id", ParamKind::Integer).in_body(),
            ParameterSpec::new("spent_date", ParamKind::Date).in_body(),
            STARTED_TIME,
            ENDED_TIME,
            HOURS,
            NOTES,
            EXTERNAL_REFERENCE,
        ],
        render: render_updated,
    },
    OperationSpec {
        name: "delete_time_entry_external_reference",
        description: "Remove the external reference from a time entry.",
        handler: Handler::Endpoint {
            method: HttpMethod::Delete,
            path: "/time_entries/{time_entry_id}/external_reference",
        },
        params: &[TIME_ENTRY_ID],
        render: render_reference_deleted,
    },
    OperationSpec {
        name: "delete_time_entry",
        description: "Delete a time entry.",
        handler: Handler::Endpoint {
            method: HttpMethod::Delete,
            path: "/time_entries/{time_entry_id}",
        },
        params: &[TIME_ENTRY_ID],
        render: render_deleted,
    },
    OperationSpec {
        name: "restart_time_entry",
        description: "Restart a stopped time entry's timer.",
        handler: Handler::Endpoint {
            method: HttpMethod::Patch,
            path: "/time_entries/{time_entry_id}/restart",
        },
        params: &[TIME_ENTRY_ID],
        render: render_restarted,
    },
    OperationSpec {
        name: "stop_time_entry",
        description: "Stop a running time entry's timer.",
        handler: Handler::Endpoint {
            method: HttpMethod::Patch,
            path: "/time_entries/{time_entry_id}/stop",
        },
        params: &[TIME_ENTRY_ID],
        render: render_stopped,
    },
];

fn entry_line(entry: &Value) -> String {
    let mut line = format!(
        "- #{} {} {}h {} / {}",
        field(entry, "/id"),
        field(entry, "/spent_date"),
        field(entry, "/hours"),
        field(entry, "/project/name"),
        field(entry, "/task/name"),
    );
    if let Some(notes) = scalar(entry, "/notes") {
        line.push_str(" - ");
        line.push_str(&notes);
    }
    if flag(entry, "/is_running") {
        line.push_str(" [running]");
    }
    line
}

fn entry_view(title: &str, entry: &Value) -> String {
    let details = detail_lines(
        entry,
        &[
            ("ID", "/id"),
            ("Date", "/spent_date"),
            ("Hours", "/hours"),
            ("Client", "/client/name"),
            ("Project", "/project/name"),
            ("Task", "/task/name"),
            ("User", "/user/name"),
            ("Started", "/started_time"),
            ("Ended", "/ended_time"),
            ("Running", "/is_running"),
            ("Billable", "/billable"),
            ("Billed", "/is_billed"),
            ("Notes", "/notes"),
            ("External reference", "/external_reference/permalink"),
        ],
    );
    format!("{title}:\n{details}")
}

fn render_list(body: &Value, _args: &Arguments) -> String {
    let lines = collection(body, "time_entries").iter().map(entry_line).collect();
    list_text("Time entries", "No time entries found.", body, lines)
}

fn render_entry(body: &Value, _args: &Arguments) -> String {
    entry_view("Time entry", body)
}

fn render_created(body: &Value, _args: &Arguments) -> String {
    entry_view("Created time entry", body)
}

fn render_updated(body: &Value, _args: &Arguments) -> String {
    entry_view("Updated time entry", body)
}

fn render_restarted(body: &Value, _args: &Arguments) -> String {
    entry_view("Restarted time entry", body)
}

fn render_stopped(body: &Value, _args: &Arguments) -> String {
    entry_view("Stopped time entry", body)
}

fn render_deleted(_body: &Value, args: &Arguments) -> String {
    format!(
        "Deleted time entry {}.",
        args.display("time_entry_id").unwrap_or_default()
    )
}

fn render_reference_deleted(_body: &Value, args: &Arguments) -> String {
    format!(
        "Removed the external reference from time entry {}.",
        args.display("time_entry_id").unwrap_or_default()
    )
}
