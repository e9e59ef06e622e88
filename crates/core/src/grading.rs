//! Answer checking shared by the test flow, results and review.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{OptionKey, Question, QuestionId};

/// Compare a raw answer against the correct option.
///
/// Both sides are trimmed and compared case-insensitively. A missing or blank
/// answer is never correct.
#[must_use]
pub fn is_correct(user_answer: Option<&str>, correct: &str) -> bool {
    let Some(user) = user_answer.map(str::trim).filter(|s| !s.is_empty()) else {
        return false;
    };
    let correct = correct.trim();
    !correct.is_empty() && user.eq_ignore_ascii_case(correct)
}

/// Outcome for a single question of a graded test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerDetail {
    pub id: QuestionId,
    pub user_answer: Option<OptionKey>,
    pub correct_answer: OptionKey,
    pub is_correct: bool,
    pub prompt: String,
}

/// Aggregate result of grading a set of answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestGrade {
    pub correct: u32,
    pub total: u32,
    /// Percentage of correct answers, rounded to the nearest integer.
    pub score: u8,
    pub details: Vec<AnswerDetail>,
}

/// Grade `answers` against `questions`. Unanswered questions count as wrong.
#[must_use]
pub fn grade_test(questions: &[Question], answers: &BTreeMap<QuestionId, OptionKey>) -> TestGrade {
    let details: Vec<AnswerDetail> = questions
        .iter()
        .map(|q| {
            let user_answer = answers.get(&q.id()).copied();
            AnswerDetail {
                id: q.id(),
                user_answer,
                correct_answer: q.correct(),
                is_correct: user_answer.is_some_and(|a| q.is_correct_choice(a)),
                prompt: q.prompt().to_string(),
            }
        })
        .collect();

    let correct =
        u32::try_from(details.iter().filter(|d| d.is_correct).count()).unwrap_or(u32::MAX);
    let total = u32::try_from(details.len()).unwrap_or(u32::MAX);

    TestGrade {
        correct,
        total,
        score: score_percent(correct, total),
        details,
    }
}

/// `round(correct / total * 100)`, or 0 for an empty test.
#[must_use]
pub fn score_percent(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (f64::from(correct.min(total)) / f64::from(total) * 100.0).round();
    // bounded to [0, 100] above
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pct = pct as u8;
    pct
}

/// Review filter over a finished or in-progress test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerFilter {
    #[default]
    All,
    Correct,
    /// Answered, but wrong.
    Incorrect,
    Unanswered,
}

impl AnswerFilter {
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "correct" => Some(Self::Correct),
            "incorrect" => Some(Self::Incorrect),
            "unanswered" => Some(Self::Unanswered),
            _ => None,
        }
    }
}

/// Keep the questions matching `filter`, preserving order.
#[must_use]
pub fn filter_questions<'a>(
    questions: &'a [Question],
    answers: &BTreeMap<QuestionId, OptionKey>,
    filter: AnswerFilter,
) -> Vec<&'a Question> {
    questions
        .iter()
        .filter(|q| {
            let answer = answers.get(&q.id()).copied();
            match filter {
                AnswerFilter::All => true,
                AnswerFilter::Correct => answer.is_some_and(|a| q.is_correct_choice(a)),
                AnswerFilter::Incorrect => answer.is_some_and(|a| !q.is_correct_choice(a)),
                AnswerFilter::Unanswered => answer.is_none(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    fn question(id: u64, correct: OptionKey) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            OptionKey::ALL.iter().map(|k| (*k, format!("opt {k}"))),
            correct,
            Category::Other,
        )
        .unwrap()
    }

    #[test]
    fn raw_answers_compare_loosely() {
        assert!(is_correct(Some(" B "), "b"));
        assert!(is_correct(Some("c"), "C "));
        assert!(!is_correct(Some("a"), "b"));
        assert!(!is_correct(None, "b"));
        assert!(!is_correct(Some("  "), "b"));
        assert!(!is_correct(Some("a"), ""));
    }

    #[test]
    fn grading_counts_and_rounds() {
        let questions = vec![
            question(1, OptionKey::A),
            question(2, OptionKey::B),
            question(3, OptionKey::C),
        ];
        let answers = BTreeMap::from([
            (QuestionId::new(1), OptionKey::A),
            (QuestionId::new(2), OptionKey::D),
        ]);
        let grade = grade_test(&questions, &answers);
        assert_eq!(grade.correct, 1);
        assert_eq!(grade.total, 3);
        assert_eq!(grade.score, 33);
        assert_eq!(grade.details[2].user_answer, None);
        assert!(!grade.details[2].is_correct);
    }

    #[test]
    fn empty_test_scores_zero() {
        let grade = grade_test(&[], &BTreeMap::new());
        assert_eq!(grade.score, 0);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(3, 3), 100);
    }

    #[test]
    fn filters_split_answers() {
        let questions = vec![
            question(1, OptionKey::A),
            question(2, OptionKey::B),
            question(3, OptionKey::C),
        ];
        let answers = BTreeMap::from([
            (QuestionId::new(1), OptionKey::A),
            (QuestionId::new(2), OptionKey::D),
        ]);
        let ids = |f| {
            filter_questions(&questions, &answers, f)
                .iter()
                .map(|q| q.id().value())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(AnswerFilter::All), vec![1, 2, 3]);
        assert_eq!(ids(AnswerFilter::Correct), vec![1]);
        assert_eq!(ids(AnswerFilter::Incorrect), vec![2]);
        assert_eq!(ids(AnswerFilter::Unanswered), vec![3]);
        assert_eq!(AnswerFilter::from_label("Incorrect"), Some(AnswerFilter::Incorrect));
    }
}
