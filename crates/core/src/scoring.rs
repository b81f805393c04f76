//! Answer evaluation and the speed-based points curve.

use serde::Serialize;

use crate::model::{GameResult, Question};

/// Accuracy required to unlock the "next level" action.
pub const PASS_ACCURACY: f64 = 0.70;

/// Points awarded to a correct answer, by bracket of elapsed seconds.
///
/// Each entry is `(upper_bound_exclusive, points)`; anything slower than the
/// last bound earns `SLOWEST_POINTS`.
const POINT_BRACKETS: [(f64, u32); 9] = [
    (2.0, 100),
    (4.0, 90),
    (6.0, 80),
    (8.0, 70),
    (10.0, 60),
    (12.0, 50),
    (14.0, 40),
    (16.0, 30),
    (18.0, 20),
];

const SLOWEST_POINTS: u32 = 10;

//
// ─── POINTS ────────────────────────────────────────────────────────────────────
//

/// Points for a correct answer given `elapsed` seconds.
///
/// Bounds are strict: 1.999 s earns 100, 2.0 s earns 90, 18.0 s and slower
/// earn 10. Non-finite input is treated as the slowest bracket.
///
/// # Examples
///
/// ```
/// # use quiz_core::scoring::points_for_elapsed;
/// assert_eq!(points_for_elapsed(0.5), 100);
/// assert_eq!(points_for_elapsed(2.0), 90);
/// assert_eq!(points_for_elapsed(19.9), 10);
/// ```
#[must_use]
pub fn points_for_elapsed(elapsed: f64) -> u32 {
    if !elapsed.is_finite() {
        return SLOWEST_POINTS;
    }
    let elapsed = elapsed.max(0.0);
    POINT_BRACKETS
        .iter()
        .find(|(bound, _)| elapsed < *bound)
        .map_or(SLOWEST_POINTS, |(_, points)| *points)
}

/// Exact comparison against the question's correct answer.
///
/// The empty string stands for a timeout and is never correct.
#[must_use]
pub fn is_correct(answer: &str, question: &Question) -> bool {
    !answer.is_empty() && answer == question.correct_answer()
}

/// Evaluate an answer and build its immutable result record.
///
/// Incorrect answers and timeouts always score 0.
#[must_use]
pub fn score_answer(question: &Question, answer: &str, elapsed: f64) -> GameResult {
    let correct = is_correct(answer, question);
    let points = if correct {
        points_for_elapsed(elapsed)
    } else {
        0
    };
    let time_spent = if elapsed.is_finite() {
        elapsed.max(0.0)
    } else {
        0.0
    };
    GameResult::new(question.id().clone(), time_spent, points, correct)
}

//
// ─── AGGREGATES ────────────────────────────────────────────────────────────────
//

/// How the results screen should phrase the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceBand {
    /// 80% accuracy or better.
    Excellent,
    /// 60% up to 80%.
    Good,
    KeepPracticing,
}

/// Aggregate statistics over a completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStats {
    pub total_points: u32,
    pub correct_count: usize,
    pub total_count: usize,
    /// Fraction of correct answers, in `0.0..=1.0`.
    pub accuracy: f64,
    /// Mean seconds spent per question.
    pub average_time: f64,
}

impl AttemptStats {
    /// Aggregate a results list. Returns `None` when `results` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use quiz_core::scoring::AttemptStats;
    /// assert!(AttemptStats::from_results(&[]).is_none());
    /// ```
    #[must_use]
    pub fn from_results(results: &[GameResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }

        let total_points = results
            .iter()
            .fold(0_u32, |acc, r| acc.saturating_add(r.points_earned()));
        let correct_count = results.iter().filter(|r| r.is_correct()).count();
        let total_count = results.len();
        let total_time: f64 = results.iter().map(GameResult::time_spent).sum();

        #[allow(clippy::cast_precision_loss)]
        let (accuracy, average_time) = (
            correct_count as f64 / total_count as f64,
            total_time / total_count as f64,
        );

        Some(Self {
            total_points,
            correct_count,
            total_count,
            accuracy,
            average_time,
        })
    }

    /// Accuracy rounded to a whole percent, as shown to players.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = (self.accuracy * 100.0).round() as u32;
        percent
    }

    #[must_use]
    pub fn performance_band(&self) -> PerformanceBand {
        let percent = self.accuracy * 100.0;
        if percent >= 80.0 {
            PerformanceBand::Excellent
        } else if percent >= 60.0 {
            PerformanceBand::Good
        } else {
            PerformanceBand::KeepPracticing
        }
    }

    #[must_use]
    pub fn passes(&self, pass_accuracy: f64) -> bool {
        self.accuracy >= pass_accuracy
    }
}

/// Whether the attempt is good enough to move on to the next level.
///
/// An empty results list never advances.
#[must_use]
pub fn can_advance(results: &[GameResult]) -> bool {
    can_advance_with(results, PASS_ACCURACY)
}

/// Like [`can_advance`], with a custom accuracy threshold.
#[must_use]
pub fn can_advance_with(results: &[GameResult], pass_accuracy: f64) -> bool {
    AttemptStats::from_results(results).is_some_and(|stats| stats.passes(pass_accuracy))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionDraft, QuestionKind};

    fn question(id: &str) -> Question {
        QuestionDraft {
            id: id.into(),
            level: 1,
            kind: QuestionKind::MultipleChoice,
            sentence: "Mi hermana __ muy inteligente.".into(),
            correct_answer: "es".into(),
            options: vec!["es".into(), "está".into(), "son".into()],
            translation: None,
        }
        .validate()
        .unwrap()
    }

    fn results(correct: usize, total: usize) -> Vec<GameResult> {
        (0..total)
            .map(|i| {
                let q = question(&i.to_string());
                let answer = if i < correct { "es" } else { "son" };
                score_answer(&q, answer, 3.0)
            })
            .collect()
    }

    #[test]
    fn first_bracket_is_half_open() {
        assert_eq!(points_for_elapsed(0.0), 100);
        assert_eq!(points_for_elapsed(1.999), 100);
        assert_eq!(points_for_elapsed(2.0), 90);
    }

    #[test]
    fn every_bracket_boundary_drops_ten_points() {
        let expected = [90, 80, 70, 60, 50, 40, 30, 20, 10];
        for (i, points) in expected.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let boundary = 2.0 * (i as f64 + 1.0);
            assert_eq!(points_for_elapsed(boundary), *points, "at {boundary}s");
        }
        assert_eq!(points_for_elapsed(18.0), 10);
        assert_eq!(points_for_elapsed(20.0), 10);
    }

    #[test]
    fn points_never_increase_with_time() {
        let mut last = u32::MAX;
        for tenth in 0..250 {
            let points = points_for_elapsed(f64::from(tenth) / 10.0);
            assert!(points <= last);
            assert_eq!(points % 10, 0);
            last = points;
        }
    }

    #[test]
    fn non_finite_elapsed_is_slowest() {
        assert_eq!(points_for_elapsed(f64::NAN), 10);
        assert_eq!(points_for_elapsed(f64::INFINITY), 10);
    }

    #[test]
    fn empty_answer_is_never_correct() {
        let q = question("1");
        assert!(!is_correct("", &q));
        assert!(is_correct("es", &q));
        assert!(!is_correct("Es", &q));
    }

    #[test]
    fn wrong_or_timed_out_answers_score_zero() {
        let q = question("1");
        assert_eq!(score_answer(&q, "son", 0.5).points_earned(), 0);
        let timeout = score_answer(&q, "", 20.0);
        assert_eq!(timeout.points_earned(), 0);
        assert!(!timeout.is_correct());
        assert!((timeout.time_spent() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn correct_answer_scores_by_speed() {
        let q = question("1");
        let result = score_answer(&q, "es", 5.2);
        assert!(result.is_correct());
        assert_eq!(result.points_earned(), 80);
        assert_eq!(result.question_id().as_str(), "1");
    }

    #[test]
    fn seven_of_ten_advances() {
        let res = results(7, 10);
        let stats = AttemptStats::from_results(&res).unwrap();
        assert!((stats.accuracy - 0.7).abs() < f64::EPSILON);
        assert_eq!(stats.accuracy_percent(), 70);
        assert!(can_advance(&res));
    }

    #[test]
    fn six_of_ten_does_not_advance() {
        let res = results(6, 10);
        let stats = AttemptStats::from_results(&res).unwrap();
        assert!((stats.accuracy - 0.6).abs() < f64::EPSILON);
        assert!(!can_advance(&res));
        assert_eq!(stats.performance_band(), PerformanceBand::Good);
    }

    #[test]
    fn aggregate_sums_points_and_averages_time() {
        let res = results(2, 4);
        let stats = AttemptStats::from_results(&res).unwrap();
        assert_eq!(stats.total_points, 180);
        assert_eq!(stats.correct_count, 2);
        assert_eq!(stats.total_count, 4);
        assert!((stats.average_time - 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.performance_band(), PerformanceBand::KeepPracticing);
    }

    #[test]
    fn empty_results_have_no_stats_and_never_advance() {
        assert!(AttemptStats::from_results(&[]).is_none());
        assert!(!can_advance(&[]));
    }

    #[test]
    fn custom_threshold() {
        let res = results(9, 10);
        assert!(can_advance_with(&res, 0.9));
        assert!(!can_advance_with(&res, 0.95));
        let stats = AttemptStats::from_results(&res).unwrap();
        assert_eq!(stats.performance_band(), PerformanceBand::Excellent);
    }
}
