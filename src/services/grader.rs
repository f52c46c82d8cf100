use crate::db::models::{Answer, QuestionWithOptions};
use crate::db::types::QuestionType;

/// Absolute tolerance for numerical answers (strict `<`).
pub(crate) const NUMERICAL_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Grade {
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
}

impl Grade {
    fn for_question(question: &QuestionWithOptions, is_correct: bool) -> Self {
        let points_earned = if is_correct { question.question.points } else { 0 };
        Self { is_correct, points_earned }
    }
}

pub(crate) fn grade(question: &QuestionWithOptions, answer: Option<&Answer>) -> Grade {
    let is_correct = match question.question.question_type {
        QuestionType::MultipleChoice | QuestionType::TrueFalse => answer
            .and_then(|answer| answer.selected_option_id.as_deref())
            .and_then(|option_id| question.option(option_id))
            .is_some_and(|option| option.is_correct),
        QuestionType::Numerical => answer.and_then(|answer| answer.numerical_value).is_some_and(
            |value| accepted_values(question).any(|accepted| within_tolerance(value, accepted)),
        ),
    };

    Grade::for_question(question, is_correct)
}

/// Parseable values of the options flagged correct, in option order.
fn accepted_values(question: &QuestionWithOptions) -> impl Iterator<Item = f64> + '_ {
    question
        .options
        .iter()
        .filter(|option| option.is_correct)
        .filter_map(|option| option.option_text.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// The value reported as "the" accepted answer: first correct option by order index that parses.
pub(crate) fn reported_accepted_value(question: &QuestionWithOptions) -> Option<f64> {
    match question.question.question_type {
        QuestionType::Numerical => accepted_values(question).next(),
        QuestionType::MultipleChoice | QuestionType::TrueFalse => None,
    }
}

fn within_tolerance(submitted: f64, accepted: f64) -> bool {
    submitted.is_finite() && (submitted - accepted).abs() < NUMERICAL_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn numerical_answer(value: Option<f64>) -> Answer {
        let mut answer = test_support::blank_answer("q-num");
        answer.numerical_value = value;
        answer
    }

    fn choice_answer(option_id: &str) -> Answer {
        let mut answer = test_support::blank_answer("q-mc");
        answer.selected_option_id = Some(option_id.to_string());
        answer
    }

    #[test]
    fn numerical_within_tolerance_is_correct() {
        let question = test_support::numerical_question("q-num", 3, &[("5.0", true)]);

        let grade = grade(&question, Some(&numerical_answer(Some(4.995))));
        assert_eq!(grade, Grade { is_correct: true, points_earned: 3 });

        let grade = super::grade(&question, Some(&numerical_answer(Some(4.98))));
        assert_eq!(grade, Grade { is_correct: false, points_earned: 0 });
    }

    #[test]
    fn numerical_missing_or_unparseable_is_incorrect() {
        let question = test_support::numerical_question("q-num", 3, &[("five", true)]);
        assert!(!grade(&question, Some(&numerical_answer(Some(5.0)))).is_correct);

        let question = test_support::numerical_question("q-num", 3, &[("5", true)]);
        assert!(!grade(&question, Some(&numerical_answer(None))).is_correct);
        assert!(!grade(&question, None).is_correct);
        assert!(!grade(&question, Some(&numerical_answer(Some(f64::NAN)))).is_correct);
    }

    #[test]
    fn numerical_any_correct_option_matches() {
        let question = test_support::numerical_question(
            "q-num",
            1,
            &[("abc", true), ("3.14", true), ("2.71", false), ("3.1416", true)],
        );

        assert!(grade(&question, Some(&numerical_answer(Some(3.1415)))).is_correct);
        assert!(!grade(&question, Some(&numerical_answer(Some(2.71)))).is_correct);
        assert_eq!(reported_accepted_value(&question), Some(3.14));
    }

    #[test]
    fn choice_uses_selected_option_flag() {
        let question = test_support::choice_question(
            "q-mc",
            QuestionType::MultipleChoice,
            5,
            &[("A", false), ("B", true), ("C", false)],
        );
        let correct_id = question.options[1].id.clone();
        let wrong_id = question.options[0].id.clone();

        assert_eq!(
            grade(&question, Some(&choice_answer(&correct_id))),
            Grade { is_correct: true, points_earned: 5 }
        );
        assert_eq!(
            grade(&question, Some(&choice_answer(&wrong_id))),
            Grade { is_correct: false, points_earned: 0 }
        );
        assert!(!grade(&question, Some(&choice_answer("not-an-option"))).is_correct);
        assert!(!grade(&question, None).is_correct);
    }
}
