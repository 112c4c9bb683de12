//! Record shapes supplied by the hosted backend. Field names follow the
//! backend's camelCase API, with the raw snake_case column names accepted as
//! aliases.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Terms arrive as `1` or `"1"` depending on the table; they are always
/// compared in their string form.
pub fn de_term<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Int(n) => n.to_string(),
        NumberOrText::Float(f) if f.fract() == 0.0 => format!("{}", f as i64),
        NumberOrText::Float(f) => f.to_string(),
        NumberOrText::Text(s) => s.trim().to_string(),
    })
}

pub fn de_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Int(n) => i32::try_from(n).map_err(D::Error::custom),
        NumberOrText::Float(f) if f.fract() == 0.0 => {
            i32::try_from(f as i64).map_err(|_| D::Error::custom(format!("year out of range: {f}")))
        }
        NumberOrText::Float(f) => Err(D::Error::custom(format!("year must be whole: {f}"))),
        NumberOrText::Text(s) => s
            .trim()
            .parse::<i32>()
            .map_err(|_| D::Error::custom(format!("year must be numeric: {s:?}"))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeStructure {
    #[serde(alias = "class_name")]
    pub class_name: String,
    #[serde(deserialize_with = "de_year")]
    pub year: i32,
    #[serde(deserialize_with = "de_term")]
    pub term: String,
    #[serde(default, alias = "total_fee")]
    pub total_fee: Option<Decimal>,
    #[serde(default, alias = "tuition_fee")]
    pub tuition_fee: Option<Decimal>,
    #[serde(default, alias = "boarding_fee")]
    pub boarding_fee: Option<Decimal>,
    #[serde(default, alias = "activity_fee")]
    pub activity_fee: Option<Decimal>,
    #[serde(default, alias = "other_fees")]
    pub other_fees: Option<Decimal>,
}

impl FeeStructure {
    /// Explicit total when given, otherwise the sum of the component fees.
    pub fn effective_fee(&self) -> Decimal {
        if let Some(total) = self.total_fee {
            return total;
        }
        [
            self.tuition_fee,
            self.boarding_fee,
            self.activity_fee,
            self.other_fees,
        ]
        .into_iter()
        .flatten()
        .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(deserialize_with = "de_term")]
    pub term: String,
    #[serde(deserialize_with = "de_year")]
    pub year: i32,
    #[serde(default, alias = "student_id")]
    pub student_id: String,
    #[serde(alias = "amount_paid")]
    pub amount_paid: Decimal,
    #[serde(default, alias = "payment_date")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: Uuid,
    pub name: String,
    #[serde(default, alias = "class_name")]
    pub class_name: String,
    #[serde(default, deserialize_with = "de_term")]
    pub term: String,
    #[serde(default, deserialize_with = "de_year")]
    pub year: i32,
    #[serde(alias = "start_date")]
    pub start_date: NaiveDate,
    #[serde(alias = "end_date")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    #[serde(alias = "exam_id")]
    pub exam_id: Uuid,
    #[serde(alias = "subject_name")]
    pub subject: String,
    pub marks: f64,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "de_term")]
    pub term: String,
    #[serde(default, deserialize_with = "de_year")]
    pub year: i32,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Upcoming,
    Ongoing,
    Completed,
}

/// Status of an exam on `today`. Start and end days both count as ongoing.
pub fn exam_status(exam: &Exam, today: NaiveDate) -> ExamStatus {
    if today < exam.start_date {
        ExamStatus::Upcoming
    } else if today > exam.end_date {
        ExamStatus::Completed
    } else {
        ExamStatus::Ongoing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn midterm() -> Exam {
        serde_json::from_value(json!({
            "id": "6f1c1f5e-4d3b-4a8e-9c63-0b9d2c7f0a11",
            "name": "Mid Term",
            "className": "Form 3",
            "term": 2,
            "year": "2025",
            "startDate": "2025-06-02",
            "endDate": "2025-06-06"
        }))
        .expect("parse exam")
    }

    #[test]
    fn term_accepts_number_or_string() {
        let a: FeeStructure = serde_json::from_value(json!({
            "className": "Form 2", "year": 2025, "term": 1, "totalFee": 50000
        }))
        .expect("numeric term");
        let b: FeeStructure = serde_json::from_value(json!({
            "class_name": "Form 2", "year": "2025", "term": " 1 ", "total_fee": 50000
        }))
        .expect("string term");
        assert_eq!(a.term, "1");
        assert_eq!(a, b);
    }

    #[test]
    fn effective_fee_prefers_explicit_total() {
        let explicit: FeeStructure = serde_json::from_value(json!({
            "className": "Form 1", "year": 2025, "term": 1,
            "totalFee": 42000, "tuitionFee": 1
        }))
        .expect("parse");
        assert_eq!(explicit.effective_fee(), dec!(42000));

        let components: FeeStructure = serde_json::from_value(json!({
            "className": "Form 1", "year": 2025, "term": 1,
            "tuitionFee": 30000, "boardingFee": 12000.5, "activityFee": null
        }))
        .expect("parse");
        assert_eq!(components.effective_fee(), dec!(42000.5));
    }

    #[test]
    fn bad_year_is_rejected() {
        let parsed: Result<Payment, _> = serde_json::from_value(json!({
            "term": 1, "year": "twenty", "studentId": "S1", "amountPaid": 10
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn out_of_range_year_is_rejected_on_both_number_paths() {
        for year in [json!(10_000_000_000i64), json!(1e10), json!(-1e10)] {
            let parsed: Result<Payment, _> = serde_json::from_value(json!({
                "term": 1, "year": year, "studentId": "S1", "amountPaid": 10
            }));
            assert!(parsed.is_err(), "accepted year {year}");
        }
        let whole: Payment = serde_json::from_value(json!({
            "term": 1, "year": 2025.0, "studentId": "S1", "amountPaid": 10
        }))
        .expect("whole float year");
        assert_eq!(whole.year, 2025);
    }

    #[test]
    fn exam_status_boundaries_are_inclusive() {
        let exam = midterm();
        let day = |d: &str| NaiveDate::parse_from_str(d, "%Y-%m-%d").expect("date");
        assert_eq!(exam_status(&exam, day("2025-06-01")), ExamStatus::Upcoming);
        assert_eq!(exam_status(&exam, day("2025-06-02")), ExamStatus::Ongoing);
        assert_eq!(exam_status(&exam, day("2025-06-06")), ExamStatus::Ongoing);
        assert_eq!(exam_status(&exam, day("2025-06-07")), ExamStatus::Completed);
    }
}
