pub mod analytics;
pub mod core;
pub mod exams;
pub mod fees;
pub mod grades;
