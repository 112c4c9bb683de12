//! 8-4-4 / CBC examination points: subject categorisation, per-category
//! caps and the best-seven rule.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::calc::{cmp_desc, round_off_2_decimals};

pub const COUNTED_SUBJECTS: usize = 7;
/// A capped pool keeps this many subjects...
pub const POOL_KEEP: usize = 2;
/// ...once it holds at least this many.
pub const POOL_CAP_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectCategory {
    Core,
    Sciences,
    Technical,
    Humanities,
    Religious,
    Other,
}

/// Checked in order; the first list containing a match wins.
const CATEGORY_NAMES: &[(SubjectCategory, &[&str])] = &[
    (SubjectCategory::Core, &["english", "kiswahili", "mathematics"]),
    (SubjectCategory::Sciences, &["biology", "chemistry", "physics"]),
    (
        SubjectCategory::Technical,
        &[
            "agriculture",
            "home science",
            "home-science",
            "computer studies",
            "business studies",
            "computer",
        ],
    ),
    (SubjectCategory::Humanities, &["history", "geography"]),
    (
        SubjectCategory::Religious,
        &[
            "christian religious education",
            "islamic religious education",
            "hindu religious education",
            "cre",
            "ire",
            "hre",
        ],
    ),
];

pub fn categorize(subject_title: &str, sub_subject: Option<&str>) -> SubjectCategory {
    let name = sub_subject
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(subject_title)
        .trim()
        .to_lowercase();

    CATEGORY_NAMES
        .iter()
        .find(|(_, names)| names.iter().any(|n| name.contains(n)))
        .map(|(category, _)| *category)
        .unwrap_or(SubjectCategory::Other)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub subject_title: String,
    #[serde(default)]
    pub sub_subject: Option<String>,
    pub points: f64,
    pub marks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedSubject {
    #[serde(flatten)]
    pub result: SubjectResult,
    pub category: SubjectCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsSummary {
    pub counting_points: f64,
    pub counting_subjects: Vec<CategorizedSubject>,
    pub dropped_subjects: Vec<CategorizedSubject>,
    pub total_subjects_with_results: usize,
}

type Ranked = (usize, CategorizedSubject);

/// Highest points first; equal points keep their input order.
fn rank(pool: &mut [Ranked]) {
    pool.sort_by(|(ia, a), (ib, b)| {
        cmp_desc(a.result.points, b.result.points).then(ia.cmp(ib))
    });
}

fn cap_pool(mut pool: Vec<Ranked>) -> (Vec<Ranked>, Vec<Ranked>) {
    if pool.len() < POOL_CAP_THRESHOLD {
        return (pool, Vec::new());
    }
    rank(&mut pool);
    let dropped = pool.split_off(POOL_KEEP);
    (pool, dropped)
}

fn strip(pool: Vec<Ranked>) -> impl Iterator<Item = CategorizedSubject> {
    pool.into_iter().map(|(_, s)| s)
}

/// Best-seven points total. Sciences, technical and humanities+religious
/// are each capped at two subjects once three or more were sat; core
/// subjects always count and the remaining slots go to the highest-scoring
/// survivors. `points` must already be derived from marks.
pub fn calculate_844_points(results: &[SubjectResult]) -> PointsSummary {
    let mut core: Vec<Ranked> = Vec::new();
    let mut sciences: Vec<Ranked> = Vec::new();
    let mut technical: Vec<Ranked> = Vec::new();
    let mut humanities: Vec<Ranked> = Vec::new();
    let mut other: Vec<Ranked> = Vec::new();

    for (idx, r) in results.iter().enumerate() {
        let category = categorize(&r.subject_title, r.sub_subject.as_deref());
        let entry = (
            idx,
            CategorizedSubject {
                result: r.clone(),
                category,
            },
        );
        match category {
            SubjectCategory::Core => core.push(entry),
            SubjectCategory::Sciences => sciences.push(entry),
            SubjectCategory::Technical => technical.push(entry),
            SubjectCategory::Humanities | SubjectCategory::Religious => humanities.push(entry),
            SubjectCategory::Other => other.push(entry),
        }
    }

    let mut candidates: Vec<Ranked> = Vec::new();
    let mut dropped: Vec<Ranked> = Vec::new();
    for pool in [sciences, technical, humanities] {
        let (kept, cut) = cap_pool(pool);
        candidates.extend(kept);
        dropped.extend(cut);
    }
    candidates.extend(other);
    rank(&mut candidates);

    if core.len() > COUNTED_SUBJECTS {
        rank(&mut core);
        dropped.extend(core.split_off(COUNTED_SUBJECTS));
        dropped.append(&mut candidates);
    } else {
        let slots = COUNTED_SUBJECTS - core.len();
        if candidates.len() > slots {
            dropped.extend(candidates.split_off(slots));
        }
    }

    let counting: Vec<CategorizedSubject> = strip(core).chain(strip(candidates)).collect();
    let counting_points = counting.iter().map(|s| s.result.points).sum();

    PointsSummary {
        counting_points,
        counting_subjects: counting,
        dropped_subjects: strip(dropped).collect(),
        total_subjects_with_results: results.len(),
    }
}

static FORM_844: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)form\s*[34]\s*(?:\D|$)").expect("valid 8-4-4 class pattern")
});
static GRADE_CBC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)grade\s*1[0-2]\s*(?:\D|$)").expect("valid CBC class pattern")
});

/// Form 3 and Form 4 (streams such as "Form 3 East" or "Form 4B" included).
pub fn is_844_class(class_name: &str) -> bool {
    FORM_844.is_match(class_name)
}

/// Grade 10, 11 and 12.
pub fn is_cbc_class(class_name: &str) -> bool {
    GRADE_CBC.is_match(class_name)
}

pub fn uses_seven_subject_calculation(class_name: &str) -> bool {
    is_844_class(class_name) || is_cbc_class(class_name)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBand {
    #[serde(alias = "min_marks")]
    pub min_marks: f64,
    pub grade: String,
    pub points: u32,
}

impl GradeBand {
    fn new(min_marks: f64, grade: &str, points: u32) -> Self {
        Self {
            min_marks,
            grade: grade.to_string(),
            points,
        }
    }
}

/// Marks-to-points lookup. Kept apart from [`calculate_844_points`] so a
/// curriculum change only swaps the scale.
pub trait GradingScale {
    fn grade(&self, marks: f64) -> Option<&GradeBand>;

    /// Band whose points value is the largest one not above `points`.
    fn grade_for_points(&self, points: f64) -> Option<&GradeBand>;
}

/// Threshold table, highest `min_marks` first.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    bands: Vec<GradeBand>,
}

impl BandScale {
    pub fn new(mut bands: Vec<GradeBand>) -> Self {
        bands.sort_by(|a, b| cmp_desc(a.min_marks, b.min_marks));
        Self { bands }
    }

    /// The 12-point KCSE scale.
    pub fn kcse() -> Self {
        Self::new(vec![
            GradeBand::new(80.0, "A", 12),
            GradeBand::new(75.0, "A-", 11),
            GradeBand::new(70.0, "B+", 10),
            GradeBand::new(65.0, "B", 9),
            GradeBand::new(60.0, "B-", 8),
            GradeBand::new(55.0, "C+", 7),
            GradeBand::new(50.0, "C", 6),
            GradeBand::new(45.0, "C-", 5),
            GradeBand::new(40.0, "D+", 4),
            GradeBand::new(35.0, "D", 3),
            GradeBand::new(30.0, "D-", 2),
            GradeBand::new(0.0, "E", 1),
        ])
    }

    pub fn bands(&self) -> &[GradeBand] {
        &self.bands
    }
}

impl Default for BandScale {
    fn default() -> Self {
        Self::kcse()
    }
}

impl GradingScale for BandScale {
    fn grade(&self, marks: f64) -> Option<&GradeBand> {
        self.bands.iter().find(|b| marks >= b.min_marks)
    }

    fn grade_for_points(&self, points: f64) -> Option<&GradeBand> {
        self.bands
            .iter()
            .filter(|b| f64::from(b.points) <= points)
            .max_by(|a, b| a.points.cmp(&b.points))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeanGrade {
    pub mean_points: f64,
    pub grade: Option<String>,
}

/// KCSE-style mean grade: mean points over the counted subjects, graded
/// at the nearest whole point.
pub fn mean_grade(summary: &PointsSummary, scale: &dyn GradingScale) -> MeanGrade {
    let counted = summary.counting_subjects.len();
    if counted == 0 {
        return MeanGrade {
            mean_points: 0.0,
            grade: None,
        };
    }
    let mean_points = round_off_2_decimals(summary.counting_points / counted as f64);
    let grade = scale
        .grade_for_points((mean_points + 0.5).floor())
        .map(|b| b.grade.clone());
    MeanGrade { mean_points, grade }
}

/// Points for a result that arrived with marks only.
pub fn points_for_marks(scale: &dyn GradingScale, marks: f64) -> f64 {
    scale
        .grade(marks)
        .map(|b| f64::from(b.points))
        .unwrap_or(0.0)
}
