use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::grading::{self, MeanGrade, PointsSummary, SubjectResult};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{ok_model, parse_params, respond};
use crate::ipc::types::{AppState, Request};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategorizeParams {
    subject_title: String,
    #[serde(default)]
    sub_subject: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassParams {
    class_name: String,
}

/// A subject result as the grid sends it; `points` may be left for the
/// configured grading scale to fill in from `marks`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubjectResult {
    subject_title: String,
    #[serde(default)]
    sub_subject: Option<String>,
    #[serde(default)]
    points: Option<f64>,
    marks: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsParams {
    #[serde(default)]
    class_name: Option<String>,
    results: Vec<RawSubjectResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PointsResponse<'a> {
    #[serde(flatten)]
    summary: &'a PointsSummary,
    mean_grade: MeanGrade,
}

fn handle_categorize(req: &Request) -> Result<serde_json::Value, serde_json::Value> {
    let p: CategorizeParams = parse_params(req)?;
    let category = grading::categorize(&p.subject_title, p.sub_subject.as_deref());
    Ok(ok(&req.id, json!({ "category": category })))
}

fn handle_class_system(req: &Request) -> Result<serde_json::Value, serde_json::Value> {
    let p: ClassParams = parse_params(req)?;
    Ok(ok(
        &req.id,
        json!({
            "is844": grading::is_844_class(&p.class_name),
            "isCbc": grading::is_cbc_class(&p.class_name),
            "usesSevenSubjectCalculation": grading::uses_seven_subject_calculation(&p.class_name),
        }),
    ))
}

fn handle_points_844(
    state: &AppState,
    req: &Request,
) -> Result<serde_json::Value, serde_json::Value> {
    let p: PointsParams = parse_params(req)?;
    if let Some(class_name) = p.class_name.as_deref() {
        if !grading::uses_seven_subject_calculation(class_name) {
            return Err(err(
                &req.id,
                "not_applicable",
                format!("{class_name} is not graded on the best-seven rule"),
                Some(json!({ "className": class_name })),
            ));
        }
    }

    let results: Vec<SubjectResult> = p
        .results
        .into_iter()
        .map(|r| SubjectResult {
            points: r
                .points
                .unwrap_or_else(|| grading::points_for_marks(&state.scale, r.marks)),
            subject_title: r.subject_title,
            sub_subject: r.sub_subject,
            marks: r.marks,
        })
        .collect();

    let summary = grading::calculate_844_points(&results);
    let mean = grading::mean_grade(&summary, &state.scale);
    Ok(ok_model(
        req,
        &PointsResponse {
            summary: &summary,
            mean_grade: mean,
        },
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "grades.categorize" => handle_categorize(req),
        "grades.classSystem" => handle_class_system(req),
        "grades.points844" => handle_points_844(state, req),
        _ => return None,
    };
    Some(respond(result))
}
