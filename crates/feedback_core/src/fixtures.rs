//! Fixed literal datasets.
//!
//! # Responsibility
//! - Provide the mock datasets returned in local mode and used as the read
//!   fallback in remote mode.
//! - Provide the seed datasets written by the administrative `seed` command.
//!
//! # Invariants
//! - Datasets are built once per process and never mutated; callers always
//!   receive owned copies.

use crate::model::category::Category;
use crate::model::feedback::FeedbackItem;
use once_cell::sync::Lazy;

static MOCK_CATEGORIES: Lazy<Vec<Category>> = Lazy::new(|| {
    vec![
        Category::new("student-engagement", "Student Engagement"),
        Category::new("teaching-strategies", "Teaching Strategies"),
        Category::new("classroom-management", "Classroom Management"),
        Category::new("lesson-planning", "Lesson Planning"),
        Category::new("time-management", "Time Management"),
        Category::new("differentiation", "Differentiation"),
    ]
});

static MOCK_FEEDBACK: Lazy<Vec<FeedbackItem>> = Lazy::new(|| {
    vec![
        FeedbackItem::new(
            "mock-1",
            "Try calling on students by name more often to increase engagement. This helps students feel noticed and valued.",
            ids(&["student-engagement", "teaching-strategies"]),
        ),
        FeedbackItem::new(
            "mock-2",
            "Consider breaking large activities into smaller chunks with transitions in between to help maintain student focus and energy levels.",
            ids(&["classroom-management", "lesson-planning"]),
        ),
        FeedbackItem::new(
            "mock-3",
            "The student work time seemed to run a bit long. Consider setting a timer to help everyone stay on track with the lesson plan.",
            ids(&["time-management", "classroom-management"]),
        ),
        FeedbackItem::new(
            "mock-4",
            "Providing extension activities for students who finish early would help maintain classroom engagement and allow for differentiation.",
            ids(&["differentiation", "student-engagement"]),
        ),
    ]
});

static SEED_CATEGORIES: Lazy<Vec<Category>> = Lazy::new(|| {
    vec![
        Category::new("student-engagement", "Student Engagement"),
        Category::new("teaching-strategies", "Teaching Strategies"),
        Category::new("classroom-management", "Classroom Management"),
        Category::new("lesson-planning", "Lesson Planning"),
        Category::new("time-management", "Time Management"),
        Category::new("differentiation", "Differentiation"),
        Category::new("technology-integration", "Technology Integration"),
        Category::new("assessment", "Assessment & Feedback"),
        Category::new("student-motivation", "Student Motivation"),
    ]
});

/// Seed feedback as `(text, categories)`; document keys are assigned by the
/// seeding routine.
static SEED_FEEDBACK: &[(&str, &[&str])] = &[
    (
        "Calling on students by name has dramatically improved classroom engagement. I've noticed significantly higher participation rates since implementing this strategy.",
        &["student-engagement", "teaching-strategies"],
    ),
    (
        "Breaking complex activities into smaller timed segments has helped maintain student focus throughout longer lessons. Students report feeling less overwhelmed by difficult material.",
        &["classroom-management", "lesson-planning", "time-management"],
    ),
    (
        "Implementing digital exit tickets through Google Forms has provided valuable immediate feedback while reducing paper waste. This has helped me adjust lessons for the next day.",
        &["assessment", "technology-integration"],
    ),
    (
        "Creating a tiered assignment system with required and optional components has allowed advanced students to push themselves while ensuring all students meet core requirements.",
        &["differentiation", "student-motivation"],
    ),
    (
        "Using the 'think-pair-share' technique has dramatically improved participation from typically quiet students. The structured approach gives them confidence to contribute.",
        &["student-engagement", "teaching-strategies"],
    ),
    (
        "Implementing a digital reward system has positively impacted classroom behavior. Students are more motivated to follow procedures and participate actively.",
        &["classroom-management", "student-motivation", "technology-integration"],
    ),
    (
        "Providing exemplars of high-quality work has clarified expectations and improved overall assignment quality. Students appreciate seeing concrete examples of success.",
        &["teaching-strategies", "assessment"],
    ),
    (
        "Using cooperative learning structures has increased engagement while developing critical social skills. Students report enjoying class more when collaboration is built in.",
        &["student-engagement", "teaching-strategies"],
    ),
    (
        "Implementing student choice in project formats has increased motivation and creativity. Students take more ownership when they can play to their strengths.",
        &["differentiation", "student-motivation"],
    ),
    (
        "Using quick formative assessments with digital tools has allowed me to identify and address misconceptions in real-time rather than discovering them on major assessments.",
        &["assessment", "technology-integration"],
    ),
];

/// Mock categories (6 entries).
pub fn mock_categories() -> Vec<Category> {
    MOCK_CATEGORIES.clone()
}

/// Mock feedback items (4 entries, ids `mock-1`..`mock-4`).
pub fn mock_feedback() -> Vec<FeedbackItem> {
    MOCK_FEEDBACK.clone()
}

/// Categories written by the seed command (9 entries).
pub fn seed_categories() -> Vec<Category> {
    SEED_CATEGORIES.clone()
}

/// Feedback written by the seed command as `(text, categories)` pairs.
pub fn seed_feedback() -> Vec<(String, Vec<String>)> {
    SEED_FEEDBACK
        .iter()
        .map(|(text, categories)| ((*text).to_string(), ids(categories)))
        .collect()
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}
