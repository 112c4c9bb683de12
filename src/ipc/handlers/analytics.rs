use serde::Deserialize;
use serde_json::json;

use crate::analytics;
use crate::ipc::error::ok;
use crate::ipc::helpers::{ok_model, parse_params, respond};
use crate::ipc::types::{AppState, Request};
use crate::records::{Exam, ExamResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryParams {
    #[serde(default)]
    results: Vec<ExamResult>,
    #[serde(default)]
    exams: Vec<Exam>,
}

fn handle_student_report(req: &Request) -> Result<serde_json::Value, serde_json::Value> {
    let p: HistoryParams = parse_params(req)?;
    let report = analytics::build_student_report(&p.results, &p.exams);
    tracing::debug!(
        exams = report.stats.exams_count,
        insights = report.insights.len(),
        "student report built"
    );
    Ok(ok_model(req, &report))
}

fn handle_student_trends(req: &Request) -> Result<serde_json::Value, serde_json::Value> {
    let p: HistoryParams = parse_params(req)?;
    let trends = analytics::calculate_subject_trends(&p.results, &p.exams);
    Ok(ok(&req.id, json!({ "subjectTrends": trends })))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "analytics.student.report" => handle_student_report(req),
        "analytics.student.trends" => handle_student_trends(req),
        _ => return None,
    };
    Some(respond(result))
}
