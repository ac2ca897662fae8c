//! Structured quiz: ten timed multiple-choice questions
//!
//! Runs outside the arcade engine but shares its generator, summary record and
//! score sink. A question left unanswered when its timer runs out is recorded
//! as "no answer".

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::difficulty::{Difficulty, DifficultyConfig};
use crate::error::ConfigError;
use crate::highscores::ScoreSink;
use crate::numeral::NumeralBase;
use crate::question::{self, AnswerOption, DIVIDE_MAX_DIVISOR, Operator, Question};
use crate::rng::RandomSource;
use crate::sim::{FinalSummary, Phase, StatValue, TerminalReason};

/// Questions per quiz
pub const QUIZ_LENGTH: usize = 10;

/// Options shown per question
pub const QUIZ_OPTIONS: usize = 4;

/// Operator family a quiz drills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    #[default]
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Equation,
    Area,
    Linear,
    Quadratic,
}

impl QuizMode {
    pub const ALL: [QuizMode; 8] = [
        QuizMode::Addition,
        QuizMode::Subtraction,
        QuizMode::Multiplication,
        QuizMode::Division,
        QuizMode::Equation,
        QuizMode::Area,
        QuizMode::Linear,
        QuizMode::Quadratic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuizMode::Addition => "addition",
            QuizMode::Subtraction => "subtraction",
            QuizMode::Multiplication => "multiplication",
            QuizMode::Division => "division",
            QuizMode::Equation => "equation",
            QuizMode::Area => "area",
            QuizMode::Linear => "linear",
            QuizMode::Quadratic => "quadratic",
        }
    }

    pub fn operator(&self) -> Operator {
        match self {
            QuizMode::Addition => Operator::Add,
            QuizMode::Subtraction => Operator::Subtract,
            QuizMode::Multiplication => Operator::Multiply,
            QuizMode::Division => Operator::Divide,
            QuizMode::Equation => Operator::Equation,
            QuizMode::Area => Operator::Area,
            QuizMode::Linear => Operator::Linear,
            QuizMode::Quadratic => Operator::Quadratic,
        }
    }

    /// Operand snapshot for this mode
    ///
    /// Binary shrinks the maximum to a third so answers stay readable;
    /// multiplication halves the range (rounding up) and division keeps
    /// both divisor and quotient within `[2, 12]`.
    pub fn config(&self, base: NumeralBase, difficulty: Difficulty) -> DifficultyConfig {
        let (mut min, mut max): (u64, u64) = match difficulty {
            Difficulty::Easy => (1, 10),
            Difficulty::Medium => (10, 50),
            Difficulty::Hard => (50, 150),
        };
        if base == NumeralBase::Binary {
            max = max.div_ceil(3);
            min = min.min(max);
        }
        match self {
            QuizMode::Multiplication => {
                min = min.div_ceil(2);
                max = max.div_ceil(2).max(2);
            }
            QuizMode::Division => {
                min = 2;
                max = max.clamp(2, DIVIDE_MAX_DIVISOR);
            }
            _ => {}
        }
        DifficultyConfig {
            min_value: min,
            max_value: max,
            operators: vec![self.operator()],
            multiply_limit: max.max(2),
            distractor_spread: (max / 4).max(3),
            speed_multiplier: 1.0,
            score_multiplier: 1.0,
        }
    }
}

/// Per-question time limit
pub fn time_limit_ms(difficulty: Difficulty) -> f32 {
    match difficulty {
        Difficulty::Easy => 60_000.0,
        Difficulty::Medium => 40_000.0,
        Difficulty::Hard => 20_000.0,
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        QuizMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or(ConfigError::UnknownQuizMode(s))
    }
}

/// One answered (or timed out) question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRecord {
    pub question: Question,
    /// `None` when the timer ran out
    pub submitted: Option<String>,
    pub correct: bool,
    pub elapsed_ms: f32,
}

/// The question on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizPrompt {
    pub number: usize,
    pub question: Question,
    pub options: Vec<AnswerOption>,
    pub remaining_ms: f32,
}

pub struct QuizSession<R: RandomSource = Pcg32> {
    mode: QuizMode,
    base: NumeralBase,
    difficulty: Difficulty,
    config: DifficultyConfig,
    time_limit_ms: f32,
    rng: R,
    phase: Phase,
    prompt: Option<QuizPrompt>,
    history: Vec<QuizRecord>,
    score: u64,
    sink: Option<Box<dyn ScoreSink>>,
    summary: Option<FinalSummary>,
}

impl QuizSession<Pcg32> {
    pub fn seeded(
        mode: QuizMode,
        base: NumeralBase,
        difficulty: Difficulty,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::new(mode, base, difficulty, Pcg32::seed_from_u64(seed))
    }
}

impl<R: RandomSource> QuizSession<R> {
    pub fn new(
        mode: QuizMode,
        base: NumeralBase,
        difficulty: Difficulty,
        rng: R,
    ) -> Result<Self, ConfigError> {
        let config = mode.config(base, difficulty);
        config.validate()?;
        Ok(Self {
            mode,
            base,
            difficulty,
            config,
            time_limit_ms: time_limit_ms(difficulty),
            rng,
            phase: Phase::Idle,
            prompt: None,
            history: Vec::with_capacity(QUIZ_LENGTH),
            score: 0,
            sink: None,
            summary: None,
        })
    }

    pub fn set_sink(&mut self, sink: Box<dyn ScoreSink>) {
        self.sink = Some(sink);
    }

    /// Reset and show the first question
    pub fn start(&mut self) {
        self.history.clear();
        self.score = 0;
        self.summary = None;
        self.phase = Phase::Running;
        log::info!("quiz '{}' started ({}, {})", self.mode, self.base, self.difficulty);
        self.next_prompt();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn prompt(&self) -> Option<&QuizPrompt> {
        self.prompt.as_ref()
    }

    pub fn history(&self) -> &[QuizRecord] {
        &self.history
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn summary(&self) -> Option<&FinalSummary> {
        self.summary.as_ref()
    }

    /// Answer the current question; `None` when no question is showing
    pub fn answer(&mut self, text: &str) -> Option<bool> {
        if self.phase != Phase::Running {
            return None;
        }
        let prompt = self.prompt.take()?;
        let correct = prompt.question.is_answer(text);
        self.record(prompt, Some(text.trim().to_string()), correct);
        Some(correct)
    }

    /// Answer with one of the shown options
    pub fn choose(&mut self, index: usize) -> Option<bool> {
        let label = self.prompt.as_ref()?.options.get(index)?.label.clone();
        self.answer(&label)
    }

    /// Run the question timer
    pub fn tick(&mut self, dt_ms: f32) {
        if self.phase != Phase::Running {
            return;
        }
        let expired = match self.prompt.as_mut() {
            Some(prompt) => {
                prompt.remaining_ms = (prompt.remaining_ms - dt_ms).max(0.0);
                prompt.remaining_ms <= 0.0
            }
            None => false,
        };
        if expired {
            if let Some(prompt) = self.prompt.take() {
                log::debug!("quiz question {} timed out", prompt.number);
                self.record(prompt, None, false);
            }
        }
    }

    /// Abandon the quiz without a summary
    pub fn quit(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Terminal;
            self.prompt = None;
        }
    }

    fn record(&mut self, prompt: QuizPrompt, submitted: Option<String>, correct: bool) {
        if correct {
            self.score += 1;
        }
        self.history.push(QuizRecord {
            elapsed_ms: self.time_limit_ms - prompt.remaining_ms,
            question: prompt.question,
            submitted,
            correct,
        });

        if self.history.len() >= QUIZ_LENGTH {
            self.finish();
        } else {
            self.next_prompt();
        }
    }

    fn next_prompt(&mut self) {
        let question = question::generate_with(self.mode.operator(), self.base, &self.config, &mut self.rng);
        let options = question::answer_options(
            &question,
            QUIZ_OPTIONS,
            self.config.distractor_spread,
            &mut self.rng,
        );
        self.prompt = Some(QuizPrompt {
            number: self.history.len() + 1,
            question,
            options,
            remaining_ms: self.time_limit_ms,
        });
    }

    fn finish(&mut self) {
        self.phase = Phase::Terminal;
        self.prompt = None;

        let correct = self.history.iter().filter(|r| r.correct).count() as i64;
        let unanswered = self.history.iter().filter(|r| r.submitted.is_none()).count() as i64;
        let stats = BTreeMap::from([
            ("correct".to_string(), StatValue::Int(correct)),
            ("total".to_string(), StatValue::Int(self.history.len() as i64)),
            ("unanswered".to_string(), StatValue::Int(unanswered)),
        ]);
        let summary = FinalSummary {
            mode: format!("quiz-{}", self.mode),
            score: self.score,
            base: self.base,
            difficulty: self.difficulty,
            reason: TerminalReason::Completed,
            stats,
        };
        log::info!("quiz finished: {}/{}", correct, self.history.len());

        if summary.score > 0 {
            if let Some(sink) = self.sink.as_mut() {
                if let Err(e) = sink.submit(&summary) {
                    log::warn!("score sink failed: {e}");
                }
            }
        }
        self.summary = Some(summary);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::session::tests::CountingSink;

    #[test]
    fn test_ranges_by_base_and_mode() {
        let c = QuizMode::Addition.config(NumeralBase::Decimal, Difficulty::Medium);
        assert_eq!((c.min_value, c.max_value), (10, 50));
        let c = QuizMode::Addition.config(NumeralBase::Binary, Difficulty::Hard);
        assert_eq!((c.min_value, c.max_value), (50, 50));
        let c = QuizMode::Addition.config(NumeralBase::Binary, Difficulty::Easy);
        assert_eq!((c.min_value, c.max_value), (1, 4));
        let c = QuizMode::Multiplication.config(NumeralBase::Hex, Difficulty::Hard);
        assert_eq!((c.min_value, c.max_value), (25, 75));
        let c = QuizMode::Multiplication.config(NumeralBase::Decimal, Difficulty::Easy);
        assert_eq!((c.min_value, c.max_value), (1, 5));
        let c = QuizMode::Multiplication.config(NumeralBase::Binary, Difficulty::Medium);
        assert_eq!((c.min_value, c.max_value), (5, 9));
        let c = QuizMode::Division.config(NumeralBase::Decimal, Difficulty::Hard);
        assert_eq!((c.min_value, c.max_value), (2, 12));
        let c = QuizMode::Division.config(NumeralBase::Binary, Difficulty::Easy);
        assert_eq!((c.min_value, c.max_value), (2, 4));
        for mode in QuizMode::ALL {
            for base in NumeralBase::ALL {
                for difficulty in Difficulty::ALL {
                    assert!(mode.config(base, difficulty).validate().is_ok());
                }
            }
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Division".parse::<QuizMode>(), Ok(QuizMode::Division));
        assert_eq!("quadratic".parse::<QuizMode>(), Ok(QuizMode::Quadratic));
        for mode in QuizMode::ALL {
            assert_eq!(mode.as_str().parse::<QuizMode>(), Ok(mode));
        }
        assert!(matches!("calculus".parse::<QuizMode>(), Err(ConfigError::UnknownQuizMode(_))));
    }

    #[test]
    fn test_perfect_quiz_completes_and_submits() {
        let mut quiz = QuizSession::seeded(QuizMode::Division, NumeralBase::Octal, Difficulty::Easy, 4).unwrap();
        let submitted = Rc::new(RefCell::new(Vec::new()));
        quiz.set_sink(Box::new(CountingSink(submitted.clone())));
        quiz.start();

        for n in 1..=QUIZ_LENGTH {
            let prompt = quiz.prompt().unwrap();
            assert_eq!(prompt.number, n);
            assert_eq!(prompt.options.len(), QUIZ_OPTIONS);
            assert_eq!(prompt.options.iter().filter(|o| o.is_correct).count(), 1);
            let answer = prompt.question.correct_answer();
            assert_eq!(quiz.answer(&answer), Some(true));
        }

        assert_eq!(quiz.phase(), Phase::Terminal);
        assert_eq!(quiz.score(), 10);
        assert!(quiz.prompt().is_none());
        assert_eq!(quiz.answer("1"), None);

        let summary = quiz.summary().unwrap();
        assert_eq!(summary.mode, "quiz-division");
        assert_eq!(summary.reason, TerminalReason::Completed);
        assert_eq!(summary.stats.get("correct"), Some(&StatValue::Int(10)));
        assert_eq!(submitted.borrow().len(), 1);
    }

    #[test]
    fn test_division_answers_stay_small() {
        for difficulty in Difficulty::ALL {
            for seed in 0..20 {
                let mut quiz =
                    QuizSession::seeded(QuizMode::Division, NumeralBase::Decimal, difficulty, seed).unwrap();
                quiz.start();
                while let Some(prompt) = quiz.prompt() {
                    let q = prompt.question.clone();
                    assert!((2..=12).contains(&q.correct_value()), "{}", q.display());
                    assert!((2..=12).contains(&q.operands().1), "{}", q.display());
                    quiz.answer(&q.correct_answer());
                }
            }
        }
    }

    #[test]
    fn test_quadratic_quiz_picks_root_pairs() {
        let mut quiz = QuizSession::seeded(QuizMode::Quadratic, NumeralBase::Octal, Difficulty::Medium, 6).unwrap();
        quiz.start();
        while let Some(prompt) = quiz.prompt() {
            let (lo, hi) = prompt.question.roots().unwrap();
            assert!(lo <= hi && (1..=5).contains(&lo) && (1..=5).contains(&hi));
            let index = prompt.options.iter().position(|o| o.is_correct).unwrap();
            assert_eq!(quiz.choose(index), Some(true));
        }
        assert_eq!(quiz.score(), QUIZ_LENGTH as u64);
        let record = &quiz.history()[0];
        assert_eq!(record.submitted.as_deref(), Some(record.question.correct_answer().as_str()));
        assert_eq!(quiz.summary().map(|s| s.mode.as_str()), Some("quiz-quadratic"));
    }

    #[test]
    fn test_timeout_records_no_answer() {
        let mut quiz = QuizSession::seeded(QuizMode::Addition, NumeralBase::Hex, Difficulty::Hard, 9).unwrap();
        quiz.start();
        quiz.tick(19_999.0);
        assert_eq!(quiz.history().len(), 0);
        quiz.tick(1.0);
        assert_eq!(quiz.history().len(), 1);
        let record = &quiz.history()[0];
        assert_eq!(record.submitted, None);
        assert!(!record.correct);
        assert_eq!(record.elapsed_ms, 20_000.0);
        assert_eq!(quiz.prompt().map(|p| p.number), Some(2));
    }

    #[test]
    fn test_wrong_choices_score_nothing() {
        let mut quiz = QuizSession::seeded(QuizMode::Equation, NumeralBase::Binary, Difficulty::Medium, 2).unwrap();
        let submitted = Rc::new(RefCell::new(Vec::new()));
        quiz.set_sink(Box::new(CountingSink(submitted.clone())));
        quiz.start();
        while quiz.phase() == Phase::Running {
            let wrong = quiz
                .prompt()
                .and_then(|p| p.options.iter().position(|o| !o.is_correct))
                .unwrap();
            assert_eq!(quiz.choose(wrong), Some(false));
        }
        assert_eq!(quiz.score(), 0);
        assert_eq!(quiz.history().len(), QUIZ_LENGTH);
        assert!(quiz.summary().is_some());
        assert!(submitted.borrow().is_empty());
    }

    #[test]
    fn test_history_keeps_submissions() {
        let mut quiz = QuizSession::seeded(QuizMode::Subtraction, NumeralBase::Decimal, Difficulty::Easy, 5).unwrap();
        quiz.start();
        quiz.tick(1_500.0);
        quiz.answer("  999 ");
        let record = &quiz.history()[0];
        assert_eq!(record.submitted.as_deref(), Some("999"));
        assert_eq!(record.elapsed_ms, 1_500.0);
    }
}
