use serde_json::{Value, json};
use unrelated_api_tools::runtime::RuntimeArgs;
use unrelated_api_tools::{Dispatcher, ErrorKind, InvocationResult, ParamKind, ParameterSpec};
use unrelated_harvest_mcp::{HarvestConfig, build_dispatcher};
use unrelated_test_support::MockUpstream;

fn dispatcher(mock: &MockUpstream) -> Dispatcher {
    let config = HarvestConfig {
        account_id: "12345".to_string(),
        access_token: "test-token".to_string(),
        base_url: mock.url("/v2"),
        user_agent: "Smart Harvest Tool".to_string(),
    };
    build_dispatcher(&config, &RuntimeArgs::default()).expect("dispatcher")
}

fn args(v: Value) -> serde_json::Map<String, Value> {
    serde_json::from_value(v).expect("object arguments")
}

fn sample_value(param: &ParameterSpec) -> Value {
    match param.kind {
        ParamKind::String => json!("x"),
        ParamKind::Integer => json!(1),
        ParamKind::Float => json!(1.5),
        ParamKind::Boolean => json!(true),
        ParamKind::Date => json!("2023-01-15"),
        ParamKind::DateTime => json!("2023-01-15T10:00:00Z"),
        ParamKind::Url => json!("https://example.com"),
        ParamKind::Object => json!({}),
        ParamKind::Enum(values) => json!(values[0]),
    }
}

#[tokio::test]
async fn list_clients_mentions_name_and_id() {
    let mock = MockUpstream::builder()
        .json(
            "GET",
            "/v2/clients",
            200,
            json!([{"id": 1, "name": "Acme", "is_active": true}]),
        )
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock);

    let result = d.invoke("list_clients", &args(json!({"is_active": true}))).await;
    let InvocationResult::Success { text } = result else {
        panic!("expected success, got {result:?}");
    };
    assert!(text.contains("Acme"), "{text}");
    assert!(text.contains("id: 1"), "{text}");

    let sent = &mock.recorded()[0];
    assert_eq!(sent.header("authorization"), Some("Bearer test-token"));
    assert_eq!(sent.header("harvest-account-id"), Some("12345"));
    assert_eq!(sent.header("user-agent"), Some("Smart Harvest Tool"));
    assert_eq!(sent.query_value("is_active"), Some("true"));
    assert_eq!(sent.query_value("page"), Some("1"));
    assert_eq!(sent.query_value("per_page"), Some("2000"));
}

#[tokio::test]
async fn create_time_entry_duration_succeeds_on_201() {
    let mock = MockUpstream::builder()
        .json(
            "POST",
            "/v2/time_entries",
            201,
            json!({
                "id": 636_709_355,
                "spent_date": "2023-01-15",
                "hours": 2.5,
                "project": {"id": 456, "name": "Website"},
                "task": {"id": 789, "name": "Design"},
                "is_running": false
            }),
        )
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock);

    let result = d
        .invoke(
            "create_time_entry_duration",
            &args(json!({"project_id": 456, "task_id": 789, "spent_date": "2023-01-15", "hours": 2.5})),
        )
        .await;
    assert!(result.is_success(), "{result:?}");
    assert!(result.text().contains("636709355"));

    let sent = &mock.recorded()[0];
    assert_eq!(sent.method, "POST");
    assert_eq!(
        sent.body,
        Some(json!({"project_id": 456, "task_id": 789, "spent_date": "2023-01-15", "hours": 2.5}))
    );
}

#[tokio::test]
async fn create_time_entry_duration_reports_422_detail() {
    let mock = MockUpstream::builder()
        .json(
            "POST",
            "/v2/time_entries",
            422,
            json!({"message": "Task is not assigned to the project"}),
        )
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock);

    let result = d
        .invoke(
            "create_time_entry_duration",
            &args(json!({"project_id": 456, "task_id": 789, "spent_date": "2023-01-15", "hours": 2.5})),
        )
        .await;
    let InvocationResult::Failure(failure) = result else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind, ErrorKind::UpstreamError);
    assert!(failure.message.contains("422"), "{}", failure.message);
    assert!(failure.message.contains("Task is not assigned to the project"));
}

#[tokio::test]
async fn non_numeric_project_id_is_a_type_error() {
    let mock = MockUpstream::builder().start().await.expect("mock");
    let d = dispatcher(&mock);

    let result = d
        .invoke("get_project", &args(json!({"project_id": "not-a-number"})))
        .await;
    assert_eq!(result.kind(), Some(ErrorKind::InvalidParameterType));
    assert!(mock.recorded().is_empty());
}

#[tokio::test]
async fn unknown_operation_makes_no_request() {
    let mock = MockUpstream::builder().start().await.expect("mock");
    let d = dispatcher(&mock);

    let result = d.invoke("list_invoices", &args(json!({}))).await;
    assert_eq!(result.kind(), Some(ErrorKind::UnknownOperation));
    assert!(mock.recorded().is_empty());
}

#[tokio::test]
async fn invalid_bill_by_is_rejected_before_dispatch() {
    let mock = MockUpstream::builder().start().await.expect("mock");
    let d = dispatcher(&mock);

    let result = d
        .invoke(
            "create_project",
            &args(json!({"client_id": 1, "name": "Website", "bill_by": "Hourly"})),
        )
        .await;
    assert_eq!(result.kind(), Some(ErrorKind::InvalidEnumValue));
    assert!(mock.recorded().is_empty());
}

#[tokio::test]
async fn each_required_parameter_is_reported_by_name() {
    let mock = MockUpstream::builder().start().await.expect("mock");
    let d = dispatcher(&mock);

    for op in d.registry().operations() {
        let full: serde_json::Map<String, Value> = op
            .params
            .iter()
            .map(|p| (p.name.to_string(), sample_value(p)))
            .collect();

        for required in op.params.iter().filter(|p| p.required) {
            let mut partial = full.clone();
            partial.remove(required.name);
            let result = d.invoke(op.name, &partial).await;
            assert_eq!(
                result.kind(),
                Some(ErrorKind::MissingParameter),
                "{} without {}",
                op.name,
                required.name
            );
            let InvocationResult::Failure(f) = result else {
                unreachable!()
            };
            assert_eq!(f.message, required.name);
        }
    }
    assert!(mock.recorded().is_empty());
}

#[tokio::test]
async fn date_filters_use_harvest_wire_names() {
    let mock = MockUpstream::builder()
        .json(
            "GET",
            "/v2/time_entries",
            200,
            json!({"time_entries": [], "page": 1, "total_pages": 0, "total_entries": 0}),
        )
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock);

    let result = d
        .invoke(
            "list_time_entries",
            &args(json!({"from_date": "2023-01-01", "to_date": "2023-01-31", "project_id": "42"})),
        )
        .await;
    assert_eq!(result.text(), "No time entries found.");

    let sent = &mock.recorded()[0];
    assert_eq!(sent.query_value("from"), Some("2023-01-01"));
    assert_eq!(sent.query_value("to"), Some("2023-01-31"));
    assert_eq!(sent.query_value("project_id"), Some("42"));
    assert_eq!(sent.query_value("from_date"), None);
}

#[tokio::test]
async fn delete_confirms_from_arguments_on_empty_body() {
    let mock = MockUpstream::builder()
        .empty("DELETE", "/v2/time_entries/5", 200)
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock);

    let result = d.invoke("delete_time_entry", &args(json!({"time_entry_id": 5}))).await;
    assert_eq!(
        result,
        InvocationResult::Success {
            text: "Deleted time entry 5.".to_string()
        }
    );
}

#[tokio::test]
async fn stop_time_entry_patches_the_stop_path() {
    let mock = MockUpstream::builder()
        .json(
            "PATCH",
            "/v2/time_entries/77/stop",
            200,
            json!({"id": 77, "hours": 1.25, "is_running": false}),
        )
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock);

    let result = d.invoke("stop_time_entry", &args(json!({"time_entry_id": 77}))).await;
    assert!(result.text().starts_with("Stopped time entry:"), "{}", result.text());
    assert_eq!(mock.recorded()[0].body, None);
}

#[tokio::test]
async fn reads_are_idempotent() {
    let mock = MockUpstream::builder()
        .json(
            "GET",
            "/v2/clients/1",
            200,
            json!({"id": 1, "name": "Acme", "is_active": true, "currency": "USD"}),
        )
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock);

    let first = d.invoke("get_client", &args(json!({"client_id": 1}))).await;
    let second = d.invoke("get_client", &args(json!({"client_id": 1}))).await;
    assert!(first.is_success());
    assert_eq!(first, second);
}
