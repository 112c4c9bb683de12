use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ipc::helpers::{ok_model, parse_params, respond};
use crate::ipc::types::{AppState, Request};
use crate::records::{exam_status, Exam, ExamStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusParams {
    exams: Vec<Exam>,
    /// Defaults to the local date of the sidecar host.
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExamStatusRow {
    id: Uuid,
    name: String,
    status: ExamStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    today: NaiveDate,
    exams: Vec<ExamStatusRow>,
}

fn handle_status(req: &Request) -> Result<serde_json::Value, serde_json::Value> {
    let p: StatusParams = parse_params(req)?;
    let today = p.today.unwrap_or_else(|| Local::now().date_naive());
    let exams = p
        .exams
        .iter()
        .map(|e| ExamStatusRow {
            id: e.id,
            name: e.name.clone(),
            status: exam_status(e, today),
        })
        .collect();
    Ok(ok_model(req, &StatusResponse { today, exams }))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exams.status" => Some(respond(handle_status(req))),
        _ => None,
    }
}
