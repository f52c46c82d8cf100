use std::collections::HashMap;

use crate::core::time::format_primitive;
use crate::db::models::{Answer, Attempt, QuestionWithOptions, Quiz};
use crate::repositories::GradedAnswer;
use crate::schemas::attempt::{
    AttemptResultResponse, QuestionResultView, ResultOptionView, UserAnswerView,
};
use crate::services::grader;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Grading {
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) graded: Vec<GradedAnswer>,
}

/// Grades every recorded answer. Only answered questions count toward
/// `total_points`; answers whose question no longer exists are skipped.
pub(crate) fn grade_answers(questions: &[QuestionWithOptions], answers: &[Answer]) -> Grading {
    let by_id: HashMap<&str, &QuestionWithOptions> =
        questions.iter().map(|item| (item.question.id.as_str(), item)).collect();

    let mut grading =
        Grading { score: 0, total_points: 0, graded: Vec::with_capacity(answers.len()) };
    for answer in answers {
        let Some(question) = by_id.get(answer.question_id.as_str()) else {
            tracing::warn!(
                attempt_id = %answer.attempt_id,
                question_id = %answer.question_id,
                "Answer references a question outside the quiz; skipping"
            );
            continue;
        };

        let grade = grader::grade(question, Some(answer));
        grading.score += grade.points_earned;
        grading.total_points += question.question.points;
        grading.graded.push(GradedAnswer {
            answer_id: answer.id.clone(),
            is_correct: grade.is_correct,
            points_earned: grade.points_earned,
        });
    }

    grading
}

/// `score * 100 / total`; 0 when nothing is at stake.
fn raw_percentage(score: i32, total_points: i32) -> f64 {
    if total_points <= 0 {
        return 0.0;
    }
    f64::from(score) * 100.0 / f64::from(total_points)
}

/// Display value, rounded to two decimals. Pass/fail uses the raw value.
pub(crate) fn percentage(score: i32, total_points: i32) -> f64 {
    (raw_percentage(score, total_points) * 100.0).round() / 100.0
}

/// Rebuilds the result view from persisted, already graded state.
pub(crate) fn build(
    quiz: &Quiz,
    attempt: &Attempt,
    questions: &[QuestionWithOptions],
    answers: &[Answer],
) -> AttemptResultResponse {
    let by_question: HashMap<&str, &Answer> =
        answers.iter().map(|answer| (answer.question_id.as_str(), answer)).collect();

    let question_results: Vec<QuestionResultView> = questions
        .iter()
        .map(|item| {
            let answer = by_question.get(item.question.id.as_str()).copied();
            QuestionResultView {
                question_id: item.question.id.clone(),
                question_type: item.question.question_type,
                question_text: item.question.question_text.clone(),
                explanation: item.question.explanation.clone(),
                order_index: item.question.order_index,
                points: item.question.points,
                points_earned: answer.and_then(|answer| answer.points_earned).unwrap_or(0),
                is_correct: answer.and_then(|answer| answer.is_correct).unwrap_or(false),
                user_answer: answer.map(UserAnswerView::from),
                accepted_value: grader::reported_accepted_value(item),
                options: item.options.iter().map(ResultOptionView::from).collect(),
            }
        })
        .collect();

    let score = attempt.score.unwrap_or(0);
    let total_points = attempt.total_points.unwrap_or(0);
    let raw = raw_percentage(score, total_points);

    AttemptResultResponse {
        attempt_id: attempt.id.clone(),
        quiz_id: quiz.id.clone(),
        quiz_title: quiz.title.clone(),
        status: attempt.status,
        score,
        total_points,
        percentage: percentage(score, total_points),
        passed: raw >= f64::from(quiz.passing_score),
        passing_score: quiz.passing_score,
        started_at: format_primitive(attempt.started_at),
        submitted_at: attempt.submitted_at.map(format_primitive),
        correct_answers: question_results.iter().filter(|result| result.is_correct).count(),
        total_questions: question_results.len(),
        question_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::QuestionType;
    use crate::test_support;

    #[test]
    fn percentage_handles_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 15), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(10, 10), 100.0);
    }

    #[test]
    fn grading_counts_only_answered_questions() {
        let five = test_support::choice_question(
            "q5",
            QuestionType::MultipleChoice,
            5,
            &[("right", true), ("wrong", false)],
        );
        let ten = test_support::numerical_question("q10", 10, &[("42", true)]);
        let unanswered = test_support::numerical_question("q7", 7, &[("1", true)]);

        let mut correct = test_support::blank_answer("q5");
        correct.id = "ans-5".to_string();
        correct.selected_option_id = Some(five.options[0].id.clone());
        let mut wrong = test_support::blank_answer("q10");
        wrong.id = "ans-10".to_string();
        wrong.numerical_value = Some(41.0);

        let grading = grade_answers(&[five, ten, unanswered], &[correct, wrong]);

        assert_eq!(grading.score, 5);
        assert_eq!(grading.total_points, 15);
        assert_eq!(grading.graded.len(), 2);
        assert!(grading.graded[0].is_correct);
        assert_eq!(grading.graded[1].points_earned, 0);
    }

    #[test]
    fn passed_uses_unrounded_percentage() {
        let mut quiz = test_support::quiz(test_support::QUIZ_ID);
        quiz.passing_score = 70;
        let attempt = Attempt {
            id: "a1".to_string(),
            user_id: "u1".to_string(),
            quiz_id: quiz.id.clone(),
            status: crate::db::types::AttemptStatus::Submitted,
            started_at: test_support::base_time(),
            expires_at: test_support::base_time(),
            submitted_at: Some(test_support::base_time()),
            score: Some(17499),
            total_points: Some(25000),
            current_question_index: 0,
        };

        let view = build(&quiz, &attempt, &[], &[]);
        assert_eq!(view.percentage, 70.0);
        assert!(!view.passed);

        let exact = Attempt { score: Some(17500), ..attempt };
        assert!(build(&quiz, &exact, &[], &[]).passed);
    }
}
