use crate::html::strip_tags;
use serde_json::Value;
use unrelated_api_tools::{Arguments, Handler, HttpMethod, Literal, OperationSpec, ParamKind, ParameterSpec};

pub(crate) const MAX_RESULTS_PER_REQUEST: i64 = 20;

const NO_RESULTS: &str = "No search results found for your query.";

pub(super) static OPERATIONS: &[OperationSpec] = &[OperationSpec {
    name: "brave_web_search",
    description: "Search the web with Brave Search. Returns numbered results with title, URL and \
                  description. Use offset for pagination.",
    handler: Handler::Endpoint {
        method: HttpMethod::Get,
        path: "/web/search",
    },
    params: &[
        ParameterSpec::new("query", ParamKind::String)
            .required()
            .non_empty()
            .wire("q")
            .doc("Search query"),
        ParameterSpec::new("count", ParamKind::Integer)
            .with_default(Literal::Integer(10))
            .bounded(1, MAX_RESULTS_PER_REQUEST)
            .doc("Number of results (1-20)"),
        ParameterSpec::new("offset", ParamKind::Integer)
            .with_default(Literal::Integer(0))
            .bounded(0, i64::MAX)
            .doc("Results to skip, for pagination"),
        ParameterSpec::new("search_lang", ParamKind::String)
            .with_default(Literal::Str("en"))
            .doc("Search language code"),
    ],
    render: render_results,
}];

fn render_results(body: &Value, args: &Arguments) -> String {
    let results = body
        .pointer("/web/results")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }

    let first = args.integer("offset").unwrap_or(0) + 1;
    results
        .iter()
        .zip(first..)
        .map(|(result, n)| {
            let text = |key: &str, fallback: &str| {
                result
                    .get(key)
                    .and_then(Value::as_str)
                    .map_or_else(|| fallback.to_string(), strip_tags)
            };
            format!(
                "[Result {n}]\n  Title: {}\n  URL: {}\n  Description: {}",
                text("title", "No title available"),
                text("url", "No URL available"),
                text("description", "No description available"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
