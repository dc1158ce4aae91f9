//! Canned requests and API payloads

use serde_json::{json, Value};
use shared::{ModuleSlug, ReportRequest};

pub fn search_analytics_request() -> ReportRequest {
    ReportRequest::new(ModuleSlug::SearchConsole, "searchanalytics")
        .param("startDate", "2024-01-01")
        .param("endDate", "2024-01-31")
        .param("dimensions", "query")
        .param("limit", 10)
}

pub fn analytics_report_request() -> ReportRequest {
    ReportRequest::new(ModuleSlug::Analytics4, "report")
        .param("startDate", "2024-01-01")
        .param("endDate", "2024-01-31")
        .param("metrics", "sessions")
}

pub fn search_analytics_payload() -> Value {
    json!([
        { "keys": ["site kit"], "clicks": 120, "impressions": 3400, "ctr": 0.035, "position": 4.2 },
        { "keys": ["wordpress analytics"], "clicks": 45, "impressions": 900, "ctr": 0.05, "position": 7.9 }
    ])
}

pub fn analytics_payload() -> Value {
    json!({
        "rows": [{ "metricValues": [{ "value": "1523" }] }],
        "rowCount": 1
    })
}

pub fn rest_forbidden() -> Value {
    json!({
        "code": "rest_forbidden",
        "message": "Sorry, you are not allowed to do that.",
        "data": { "status": 401 }
    })
}
