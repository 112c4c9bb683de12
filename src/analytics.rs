//! Student performance analytics over historical exam results: per-exam
//! averages, subject trends, an overall trend with a naive next-exam
//! prediction, rule-based insights and chart series.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::calc::{
    cmp_desc, mean, population_std_dev, round_off_1_decimal, round_off_2_decimals,
    split_half_means,
};
use crate::records::{Exam, ExamResult};

/// Relative change (percent) beyond which a trend is called.
pub const TREND_THRESHOLD: f64 = 2.0;
/// Share of the trend percentage applied to the last average when predicting.
pub const PREDICTION_DAMPING: f64 = 0.5;
pub const STRONG_SUBJECT_AVERAGE: f64 = 70.0;
pub const WEAK_SUBJECT_AVERAGE: f64 = 50.0;
pub const SUBJECT_ALERT_PERCENTAGE: f64 = 5.0;
pub const CONSISTENT_STD_DEV: f64 = 5.0;
pub const INCONSISTENT_STD_DEV: f64 = 15.0;
pub const CHART_SUBJECTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    fn direction(self) -> f64 {
        match self {
            Trend::Improving => 1.0,
            Trend::Declining => -1.0,
            Trend::Stable => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendReading {
    pub trend: Trend,
    /// Absolute size of the change, in percent.
    pub percentage: f64,
}

impl TrendReading {
    pub const STABLE: TrendReading = TrendReading {
        trend: Trend::Stable,
        percentage: 0.0,
    };
}

pub fn calculate_average(results: &[ExamResult]) -> f64 {
    let marks: Vec<f64> = results.iter().map(|r| r.marks).collect();
    round_off_2_decimals(mean(&marks))
}

pub fn calculate_trend(previous_avg: f64, current_avg: f64) -> TrendReading {
    if previous_avg == 0.0 {
        return TrendReading::STABLE;
    }
    let percentage = round_off_1_decimal((current_avg - previous_avg) / previous_avg * 100.0);
    let trend = if percentage > TREND_THRESHOLD {
        Trend::Improving
    } else if percentage < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    };
    TrendReading {
        trend,
        percentage: percentage.abs(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamWithResults {
    #[serde(flatten)]
    pub exam: Exam,
    pub results: Vec<ExamResult>,
    pub average: f64,
}

/// Exams that have at least one result, oldest first.
pub fn group_results_by_exam(results: &[ExamResult], exams: &[Exam]) -> Vec<ExamWithResults> {
    let mut grouped: Vec<ExamWithResults> = exams
        .iter()
        .filter_map(|exam| {
            let own: Vec<ExamResult> = results
                .iter()
                .filter(|r| r.exam_id == exam.id)
                .cloned()
                .collect();
            if own.is_empty() {
                return None;
            }
            let average = calculate_average(&own);
            Some(ExamWithResults {
                exam: exam.clone(),
                results: own,
                average,
            })
        })
        .collect();
    grouped.sort_by_key(|e| e.exam.start_date);
    grouped
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub exam_name: String,
    pub marks: f64,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectTrend {
    pub subject: String,
    pub average: f64,
    pub trend: Trend,
    pub trend_percentage: f64,
    pub points: Vec<TrendPoint>,
}

/// One trend per subject, strongest average first.
///
/// Results whose exam is not in `exams` still count toward the average but
/// sort after every dated point.
pub fn calculate_subject_trends(results: &[ExamResult], exams: &[Exam]) -> Vec<SubjectTrend> {
    let exam_by_id: HashMap<Uuid, &Exam> = exams.iter().map(|e| (e.id, e)).collect();

    let mut order: Vec<&str> = Vec::new();
    let mut by_subject: HashMap<&str, Vec<TrendPoint>> = HashMap::new();
    for r in results {
        let subject = r.subject.trim();
        let exam = exam_by_id.get(&r.exam_id);
        let point = TrendPoint {
            exam_name: exam.map(|e| e.name.clone()).unwrap_or_default(),
            marks: r.marks,
            date: exam.map(|e| e.start_date),
        };
        by_subject
            .entry(subject)
            .or_insert_with(|| {
                order.push(subject);
                Vec::new()
            })
            .push(point);
    }

    let mut trends: Vec<SubjectTrend> = order
        .into_iter()
        .map(|subject| {
            let mut points = by_subject.remove(subject).unwrap_or_default();
            // Undated points go last; the sort is stable within equal dates.
            points.sort_by_key(|p| (p.date.is_none(), p.date));

            let marks: Vec<f64> = points.iter().map(|p| p.marks).collect();
            let reading = split_half_means(&marks)
                .map(|(first, second)| calculate_trend(first, second))
                .unwrap_or(TrendReading::STABLE);

            SubjectTrend {
                subject: subject.to_string(),
                average: round_off_2_decimals(mean(&marks)),
                trend: reading.trend,
                trend_percentage: reading.percentage,
                points,
            }
        })
        .collect();
    trends.sort_by(|a, b| cmp_desc(a.average, b.average));
    trends
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStanding {
    pub subject: String,
    pub average: f64,
}

impl From<&SubjectTrend> for SubjectStanding {
    fn from(t: &SubjectTrend) -> Self {
        Self {
            subject: t.subject.clone(),
            average: t.average,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub overall_average: f64,
    pub best_subject: Option<SubjectStanding>,
    pub weakest_subject: Option<SubjectStanding>,
    pub overall_trend: Trend,
    pub trend_percentage: f64,
    pub exams_count: usize,
    pub predicted_next_average: Option<f64>,
}

pub fn calculate_overall_stats(results: &[ExamResult], exams: &[Exam]) -> OverallStats {
    let subject_trends = calculate_subject_trends(results, exams);
    let exams_with_results = group_results_by_exam(results, exams);

    let best_subject = subject_trends.first().map(SubjectStanding::from);
    // A lone subject is best, never also weakest.
    let weakest_subject = match (subject_trends.first(), subject_trends.last()) {
        (Some(best), Some(weakest)) if best.subject != weakest.subject => {
            Some(SubjectStanding::from(weakest))
        }
        _ => None,
    };

    let exam_averages: Vec<f64> = exams_with_results.iter().map(|e| e.average).collect();
    let (reading, predicted_next_average) = match split_half_means(&exam_averages) {
        Some((first, second)) => {
            let reading = calculate_trend(first, second);
            let last = exam_averages.last().copied().unwrap_or(0.0);
            let projected =
                last + reading.trend.direction() * reading.percentage * PREDICTION_DAMPING;
            (
                reading,
                Some(round_off_1_decimal(projected.clamp(0.0, 100.0))),
            )
        }
        None => (TrendReading::STABLE, None),
    };

    OverallStats {
        overall_average: calculate_average(results),
        best_subject,
        weakest_subject,
        overall_trend: reading.trend,
        trend_percentage: reading.percentage,
        exams_count: exams_with_results.len(),
        predicted_next_average,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Warning,
    Info,
    Prediction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Insights in fixed rule order: overall trend, strongest subject, weakest
/// subject, each steeply declining subject, prediction, consistency, then
/// the combined list of steadily improving subjects.
pub fn generate_insights(
    results: &[ExamResult],
    exams: &[Exam],
    stats: &OverallStats,
    subject_trends: &[SubjectTrend],
) -> Vec<Insight> {
    let mut out = Vec::new();

    match stats.overall_trend {
        Trend::Improving => out.push(Insight::new(
            InsightKind::Positive,
            "Improving performance",
            format!(
                "Overall performance has improved by {}% across recent exams.",
                stats.trend_percentage
            ),
        )),
        Trend::Declining => out.push(Insight::new(
            InsightKind::Warning,
            "Declining performance",
            format!(
                "Overall performance has dropped by {}% across recent exams.",
                stats.trend_percentage
            ),
        )),
        Trend::Stable => {}
    }

    if let Some(best) = stats
        .best_subject
        .as_ref()
        .filter(|b| b.average >= STRONG_SUBJECT_AVERAGE)
    {
        out.push(Insight::new(
            InsightKind::Positive,
            "Strong subject",
            format!(
                "{} is the strongest subject with an average of {}%.",
                best.subject, best.average
            ),
        ));
    }

    if let Some(weakest) = stats
        .weakest_subject
        .as_ref()
        .filter(|w| w.average < WEAK_SUBJECT_AVERAGE)
    {
        out.push(Insight::new(
            InsightKind::Warning,
            "Needs attention",
            format!(
                "{} needs more focus with an average of {}%.",
                weakest.subject, weakest.average
            ),
        ));
    }

    for t in subject_trends
        .iter()
        .filter(|t| t.trend == Trend::Declining && t.trend_percentage > SUBJECT_ALERT_PERCENTAGE)
    {
        out.push(Insight::new(
            InsightKind::Warning,
            format!("{} declining", t.subject),
            format!("Marks in {} have dropped by {}%.", t.subject, t.trend_percentage),
        ));
    }

    if let Some(predicted) = stats.predicted_next_average {
        out.push(Insight::new(
            InsightKind::Prediction,
            "Next exam prediction",
            format!(
                "Based on the current trend, the predicted average for the next exam is {predicted}%."
            ),
        ));
    }

    if stats.exams_count >= 3 {
        let exam_averages: Vec<f64> = group_results_by_exam(results, exams)
            .iter()
            .map(|e| e.average)
            .collect();
        let std_dev = population_std_dev(&exam_averages, stats.overall_average);
        if std_dev < CONSISTENT_STD_DEV {
            out.push(Insight::new(
                InsightKind::Info,
                "Consistent performance",
                format!("Exam averages are steady (standard deviation {std_dev:.1})."),
            ));
        } else if std_dev > INCONSISTENT_STD_DEV {
            out.push(Insight::new(
                InsightKind::Warning,
                "Inconsistent results",
                format!("Exam averages vary widely (standard deviation {std_dev:.1})."),
            ));
        }
    }

    let improving: Vec<&str> = subject_trends
        .iter()
        .filter(|t| t.trend == Trend::Improving && t.trend_percentage > SUBJECT_ALERT_PERCENTAGE)
        .map(|t| t.subject.as_str())
        .collect();
    if !improving.is_empty() {
        out.push(Insight::new(
            InsightKind::Positive,
            "Improving subjects",
            format!("Steady improvement in: {}.", improving.join(", ")),
        ));
    }

    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallPoint {
    pub exam: String,
    pub average: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRow {
    pub exam: String,
    pub date: NaiveDate,
    /// Marks per charted subject; `None` when the subject was not sat.
    pub marks: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub overall_data: Vec<OverallPoint>,
    pub subject_data: Vec<SubjectRow>,
    pub subjects: Vec<String>,
}

pub fn prepare_chart_data(
    exams_with_results: &[ExamWithResults],
    subject_trends: &[SubjectTrend],
) -> ChartData {
    let subjects: Vec<String> = subject_trends
        .iter()
        .take(CHART_SUBJECTS)
        .map(|t| t.subject.clone())
        .collect();

    let overall_data = exams_with_results
        .iter()
        .map(|e| OverallPoint {
            exam: e.exam.name.clone(),
            average: e.average,
            date: e.exam.start_date,
        })
        .collect();

    let subject_data = exams_with_results
        .iter()
        .map(|e| {
            let marks = subjects
                .iter()
                .map(|s| {
                    let sat = e
                        .results
                        .iter()
                        .find(|r| r.subject.trim() == s)
                        .map(|r| r.marks);
                    (s.clone(), sat)
                })
                .collect();
            SubjectRow {
                exam: e.exam.name.clone(),
                date: e.exam.start_date,
                marks,
            }
        })
        .collect();

    ChartData {
        overall_data,
        subject_data,
        subjects,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub exams_with_results: Vec<ExamWithResults>,
    pub subject_trends: Vec<SubjectTrend>,
    pub stats: OverallStats,
    pub insights: Vec<Insight>,
    pub chart: ChartData,
}

/// Everything the performance dashboard renders for one student.
pub fn build_student_report(results: &[ExamResult], exams: &[Exam]) -> StudentReport {
    let exams_with_results = group_results_by_exam(results, exams);
    let subject_trends = calculate_subject_trends(results, exams);
    let stats = calculate_overall_stats(results, exams);
    let insights = generate_insights(results, exams, &stats, &subject_trends);
    let chart = prepare_chart_data(&exams_with_results, &subject_trends);
    StudentReport {
        exams_with_results,
        subject_trends,
        stats,
        insights,
        chart,
    }
}
