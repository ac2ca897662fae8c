//! Arithmetic question generator
//!
//! Pure functions: every call takes the base, the difficulty snapshot and a
//! random source, and returns a fresh immutable `Question`. The correct answer
//! string is always derived from `correct_value`, never stored.

use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyConfig;
use crate::error::ConfigError;
use crate::numeral::NumeralBase;
use crate::rng::RandomSource;

/// Random distractor draws before falling back to deterministic increments
pub const DISTRACTOR_ATTEMPTS: usize = 50;

/// Divisor range for the modulo operator
pub const MODULO_DIVISOR_RANGE: (u64, u64) = (2, 10);

/// Largest divisor for the divide operator
pub const DIVIDE_MAX_DIVISOR: u64 = 12;

/// Range of each root in quadratic questions
pub const QUADRATIC_ROOT_RANGE: (u64, u64) = (1, 5);

/// Arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// `a·x + b = c`, solve for `x`
    Equation,
    /// Rectangle area from width and length
    Area,
    /// `y = m·x + c` evaluated at a given `x`
    Linear,
    /// `x² - s·x + p = 0`, answered with both roots
    Quadratic,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "×",
            Operator::Divide => "÷",
            Operator::Modulo => "%",
            Operator::Equation | Operator::Linear | Operator::Quadratic => "x",
            Operator::Area => "×",
        }
    }
}

/// One generated challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    operator: Operator,
    operand_a: u64,
    operand_b: u64,
    rhs: Option<u64>,
    base: NumeralBase,
    correct_value: u64,
    display: String,
}

impl Question {
    /// Build a question from operands; `None` when the operands have no
    /// non-negative integral answer (e.g. `2 - 5`, division by zero)
    pub fn new(
        operator: Operator,
        operand_a: u64,
        operand_b: u64,
        rhs: Option<u64>,
        base: NumeralBase,
    ) -> Option<Self> {
        let value = evaluate(operator, operand_a, operand_b, rhs)?;
        Some(Self::assemble(operator, operand_a, operand_b, rhs, base, value))
    }

    fn assemble(
        operator: Operator,
        operand_a: u64,
        operand_b: u64,
        rhs: Option<u64>,
        base: NumeralBase,
        correct_value: u64,
    ) -> Self {
        let display = match (operator, rhs) {
            (Operator::Equation, Some(c)) => format!(
                "{}x + {} = {}",
                base.format(operand_a),
                base.format(operand_b),
                base.format(c)
            ),
            (Operator::Linear, Some(x)) => format!(
                "y = {}x + {}, x = {}, y = ?",
                base.format(operand_a),
                base.format(operand_b),
                base.format(x)
            ),
            (Operator::Area, _) => format!(
                "width {}, length {}, area = ?",
                base.format(operand_a),
                base.format(operand_b)
            ),
            (Operator::Quadratic, _) => format!(
                "x² - {}x + {} = 0",
                base.format(operand_a),
                base.format(operand_b)
            ),
            _ => format!(
                "{} {} {} = ?",
                base.format(operand_a),
                operator.symbol(),
                base.format(operand_b)
            ),
        };
        Self {
            operator,
            operand_a,
            operand_b,
            rhs,
            base,
            correct_value,
            display,
        }
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operands(&self) -> (u64, u64) {
        (self.operand_a, self.operand_b)
    }

    /// Right-hand side of an equation question
    pub fn rhs(&self) -> Option<u64> {
        self.rhs
    }

    pub fn base(&self) -> NumeralBase {
        self.base
    }

    pub fn correct_value(&self) -> u64 {
        self.correct_value
    }

    /// Both roots of a quadratic question, smaller first
    pub fn roots(&self) -> Option<(u64, u64)> {
        if self.operator != Operator::Quadratic {
            return None;
        }
        Some((self.correct_value, self.operand_a - self.correct_value))
    }

    /// `correct_value` rendered in the display base; quadratics list both
    /// roots as `"r1, r2"`
    pub fn correct_answer(&self) -> String {
        match self.roots() {
            Some((lo, hi)) => pair_label(self.base, lo, hi),
            None => self.base.format(self.correct_value),
        }
    }

    /// Full challenge text, e.g. `"1010 + 11 = ?"`
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Challenge text without the trailing `= ?`
    pub fn expression(&self) -> &str {
        self.display
            .strip_suffix(" = ?")
            .unwrap_or(self.display.as_str())
    }

    /// Recompute the answer from the operands
    pub fn evaluate(&self) -> Option<u64> {
        evaluate(self.operator, self.operand_a, self.operand_b, self.rhs)
    }

    /// Exact match after case/whitespace normalization; root pairs match in
    /// either order
    pub fn is_answer(&self, submitted: &str) -> bool {
        let Some((lo, hi)) = self.roots() else {
            return NumeralBase::normalize(submitted) == self.correct_answer();
        };
        let parts: Vec<String> = submitted.split(',').map(NumeralBase::normalize).collect();
        let (lo, hi) = (self.base.format(lo), self.base.format(hi));
        match parts.as_slice() {
            [a, b] => (*a == lo && *b == hi) || (*a == hi && *b == lo),
            _ => false,
        }
    }
}

fn pair_label(base: NumeralBase, a: u64, b: u64) -> String {
    format!("{}, {}", base.format(a.min(b)), base.format(a.max(b)))
}

fn evaluate(operator: Operator, a: u64, b: u64, rhs: Option<u64>) -> Option<u64> {
    match operator {
        Operator::Add => a.checked_add(b),
        Operator::Subtract => a.checked_sub(b),
        Operator::Multiply => a.checked_mul(b),
        Operator::Divide => {
            if b == 0 || a % b != 0 {
                None
            } else {
                Some(a / b)
            }
        }
        Operator::Modulo => a.checked_rem(b),
        Operator::Equation => {
            let c = rhs?;
            let diff = c.checked_sub(b)?;
            if a == 0 || diff % a != 0 {
                None
            } else {
                Some(diff / a)
            }
        }
        Operator::Area => a.checked_mul(b),
        Operator::Linear => a.checked_mul(rhs?)?.checked_add(b),
        Operator::Quadratic => (0..=a / 2).find(|&r| r.checked_mul(a - r) == Some(b)),
    }
}

/// Generate a question using an operator picked uniformly from the difficulty
pub fn generate<R: RandomSource>(
    base: NumeralBase,
    config: &DifficultyConfig,
    rng: &mut R,
) -> Result<Question, ConfigError> {
    if config.operators.is_empty() {
        return Err(ConfigError::EmptyOperatorSet);
    }
    let operator = config.operators[rng.index(config.operators.len())];
    Ok(generate_with(operator, base, config, rng))
}

/// Generate a question for a fixed operator
pub fn generate_with<R: RandomSource>(
    operator: Operator,
    base: NumeralBase,
    config: &DifficultyConfig,
    rng: &mut R,
) -> Question {
    let (min, max) = (config.min_value, config.max_value.max(config.min_value));

    match operator {
        Operator::Add => {
            let a = rng.int_in(min, max);
            let b = rng.int_in(min, max);
            Question::assemble(operator, a, b, None, base, a + b)
        }
        Operator::Subtract => {
            let mut a = rng.int_in(min, max);
            let mut b = rng.int_in(min, max);
            if b > a {
                std::mem::swap(&mut a, &mut b);
            }
            Question::assemble(operator, a, b, None, base, a - b)
        }
        Operator::Multiply => {
            let lo = min.max(2);
            let hi = config.multiply_limit.max(lo);
            let a = rng.int_in(lo, hi);
            let b = rng.int_in(lo, hi);
            Question::assemble(operator, a, b, None, base, a * b)
        }
        Operator::Divide => {
            let divisor = rng.int_in(2, DIVIDE_MAX_DIVISOR.min(max).max(2));
            let quotient = rng.int_in(min, max);
            Question::assemble(operator, divisor * quotient, divisor, None, base, quotient)
        }
        Operator::Modulo => {
            let a = rng.int_in(min, max);
            let b = rng.int_in(MODULO_DIVISOR_RANGE.0, MODULO_DIVISOR_RANGE.1);
            Question::assemble(operator, a, b, None, base, a % b)
        }
        Operator::Equation => {
            let x = rng.int_in(1, 15);
            let a = rng.int_in(2, 5);
            let b = rng.int_in(1, max.max(1));
            Question::assemble(operator, a, b, Some(a * x + b), base, x)
        }
        Operator::Area => {
            let w = rng.int_in(min, max);
            let h = rng.int_in(min, max);
            Question::assemble(operator, w, h, None, base, w * h)
        }
        Operator::Linear => {
            let m = rng.int_in(1, 5);
            let c = rng.int_in(1, 10);
            let x = rng.int_in(1, 5);
            Question::assemble(operator, m, c, Some(x), base, m * x + c)
        }
        Operator::Quadratic => {
            let (lo, hi) = QUADRATIC_ROOT_RANGE;
            let r1 = rng.int_in(lo, hi);
            let r2 = rng.int_in(lo, hi);
            Question::assemble(operator, r1 + r2, r1 * r2, None, base, r1.min(r2))
        }
    }
}

/// One multiple-choice option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,
    pub is_correct: bool,
}

/// `count` unique wrong answers near the correct value.
///
/// Random offsets in `[1, spread]` (either sign, floored at zero) are tried a
/// bounded number of times; the remainder is filled with
/// `correct + set_size + k` for increasing `k`, so this always terminates.
pub fn distractors<R: RandomSource>(
    question: &Question,
    count: usize,
    spread: u64,
    rng: &mut R,
) -> Vec<String> {
    if let Some(roots) = question.roots() {
        return root_pair_distractors(question.base(), roots, count);
    }
    let base = question.base();
    let correct_value = question.correct_value();
    let mut seen = vec![question.correct_answer()];
    let mut out = Vec::with_capacity(count);

    let spread = spread.max(1);
    let mut attempts = 0;
    while out.len() < count && attempts < DISTRACTOR_ATTEMPTS {
        attempts += 1;
        let offset = rng.int_in(1, spread);
        let value = if rng.sign() > 0 {
            correct_value.saturating_add(offset)
        } else {
            correct_value.saturating_sub(offset)
        };
        let label = base.format(value);
        if !seen.contains(&label) {
            seen.push(label.clone());
            out.push(label);
        }
    }

    let mut k: u64 = 1;
    while out.len() < count {
        let value = correct_value.wrapping_add(seen.len() as u64 + k);
        k += 1;
        let label = base.format(value);
        if !seen.contains(&label) {
            seen.push(label.clone());
            out.push(label);
        }
    }

    if attempts >= DISTRACTOR_ATTEMPTS {
        log::debug!(
            "distractor fallback used for {} (spread {})",
            question.display(),
            spread
        );
    }
    out
}

/// Nearby wrong root pairs: both shifted, one shifted, then a widening gap
fn root_pair_distractors(base: NumeralBase, (lo, hi): (u64, u64), count: usize) -> Vec<String> {
    let mut seen = vec![pair_label(base, lo, hi)];
    let mut out = Vec::with_capacity(count);
    let nearby = [
        (lo + 1, hi + 1),
        (lo.saturating_sub(1), hi),
        (lo, hi + 1),
        (lo + 1, hi),
    ];
    let widening = (1..).map(|k| (lo, hi + k + 1));
    for (a, b) in nearby.into_iter().chain(widening) {
        if out.len() >= count {
            break;
        }
        let label = pair_label(base, a, b);
        if !seen.contains(&label) {
            seen.push(label.clone());
            out.push(label);
        }
    }
    out
}

/// The correct answer plus `total - 1` distractors, shuffled
pub fn answer_options<R: RandomSource>(
    question: &Question,
    total: usize,
    spread: u64,
    rng: &mut R,
) -> Vec<AnswerOption> {
    let total = total.max(1);
    let mut options = Vec::with_capacity(total);
    options.push(AnswerOption {
        label: question.correct_answer(),
        is_correct: true,
    });
    options.extend(
        distractors(question, total - 1, spread, rng)
            .into_iter()
            .map(|label| AnswerOption {
                label,
                is_correct: false,
            }),
    );
    rng.shuffle(&mut options);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;
    use crate::rng::ScriptedSource;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_hex_addition_scenario() {
        let config = Difficulty::Easy.config();
        let mut rng = ScriptedSource::new(&[10, 5]);
        let q = generate(NumeralBase::Hex, &config, &mut rng).unwrap();
        assert_eq!(q.display(), "A + 5 = ?");
        assert_eq!(q.correct_answer(), "F");
        assert_eq!(q.correct_value(), 15);
    }

    #[test]
    fn test_binary_subtraction_swaps_operands() {
        let config = DifficultyConfig {
            operators: vec![Operator::Subtract],
            ..Difficulty::Easy.config()
        };
        let mut rng = ScriptedSource::new(&[2, 5]);
        let q = generate(NumeralBase::Binary, &config, &mut rng).unwrap();
        assert_eq!(q.operands(), (5, 2));
        assert_eq!(q.correct_value(), 3);
        assert_eq!(q.display(), "101 - 10 = ?");
        assert_eq!(q.correct_answer(), "11");
    }

    #[test]
    fn test_modulo_divisor_never_zero() {
        let config = DifficultyConfig {
            operators: vec![Operator::Modulo],
            ..Difficulty::Hard.config()
        };
        // Scripted zero is clamped into the divisor range
        let mut scripted = ScriptedSource::new(&[100, 0]);
        let q = generate(NumeralBase::Decimal, &config, &mut scripted).unwrap();
        assert_eq!(q.operands(), (100, 2));

        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..1000 {
            let q = generate(NumeralBase::Decimal, &config, &mut rng).unwrap();
            let (_, divisor) = q.operands();
            assert!((2..=10).contains(&divisor));
        }
    }

    #[test]
    fn test_multiply_uses_sub_range() {
        let config = DifficultyConfig {
            operators: vec![Operator::Multiply],
            ..Difficulty::Hard.config()
        };
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..200 {
            let (a, b) = generate(NumeralBase::Hex, &config, &mut rng).unwrap().operands();
            assert!((2..=12).contains(&a) && (2..=12).contains(&b));
        }
    }

    #[test]
    fn test_equation_display_and_answer() {
        let config = DifficultyConfig {
            operators: vec![Operator::Equation],
            ..Difficulty::Easy.config()
        };
        // x = 3, a = 2, b = 4 -> 2x + 4 = 10
        let mut rng = ScriptedSource::new(&[3, 2, 4]);
        let q = generate(NumeralBase::Decimal, &config, &mut rng).unwrap();
        assert_eq!(q.display(), "2x + 4 = 10");
        assert_eq!(q.correct_answer(), "3");
        assert_eq!(q.evaluate(), Some(3));
    }

    #[test]
    fn test_equation_constant_spans_whole_range() {
        let config = DifficultyConfig {
            operators: vec![Operator::Equation],
            ..Difficulty::Hard.config()
        };
        // Scripted constant below the difficulty minimum is kept
        let mut rng = ScriptedSource::new(&[1, 2, 1]);
        let q = generate(NumeralBase::Decimal, &config, &mut rng).unwrap();
        assert_eq!(q.display(), "2x + 1 = 3");
        assert_eq!(q.correct_value(), 1);
    }

    #[test]
    fn test_area_and_linear_display() {
        let area = DifficultyConfig {
            operators: vec![Operator::Area],
            ..Difficulty::Easy.config()
        };
        let mut rng = ScriptedSource::new(&[3, 7]);
        let q = generate(NumeralBase::Hex, &area, &mut rng).unwrap();
        assert_eq!(q.display(), "width 3, length 7, area = ?");
        assert_eq!(q.correct_answer(), "15");
        assert_eq!(q.expression(), "width 3, length 7, area");

        let linear = DifficultyConfig {
            operators: vec![Operator::Linear],
            ..Difficulty::Easy.config()
        };
        // m = 2, c = 5, x = 3
        let mut rng = ScriptedSource::new(&[2, 5, 3]);
        let q = generate(NumeralBase::Binary, &linear, &mut rng).unwrap();
        assert_eq!(q.display(), "y = 10x + 101, x = 11, y = ?");
        assert_eq!(q.correct_answer(), "1011");
        assert_eq!(q.evaluate(), Some(11));
    }

    #[test]
    fn test_quadratic_roots_answer() {
        let config = DifficultyConfig {
            operators: vec![Operator::Quadratic],
            ..Difficulty::Easy.config()
        };
        let mut rng = ScriptedSource::new(&[4, 1]);
        let q = generate(NumeralBase::Binary, &config, &mut rng).unwrap();
        assert_eq!(q.display(), "x² - 101x + 100 = 0");
        assert_eq!(q.roots(), Some((1, 4)));
        assert_eq!(q.correct_answer(), "1, 100");
        assert_eq!(q.evaluate(), Some(1));
        assert!(q.is_answer("1,100"));
        assert!(q.is_answer(" 100 , 1 "));
        assert!(!q.is_answer("1"));
        assert!(!q.is_answer("1, 11"));
        assert!(Question::new(Operator::Quadratic, 5, 5, None, NumeralBase::Decimal).is_none());
    }

    #[test]
    fn test_quadratic_options_are_root_pairs() {
        let q = Question::new(Operator::Quadratic, 2, 1, None, NumeralBase::Decimal).unwrap();
        assert_eq!(q.correct_answer(), "1, 1");
        let mut rng = Pcg32::seed_from_u64(4);
        let options = answer_options(&q, 4, 3, &mut rng);
        assert_eq!(options.len(), 4);
        assert_eq!(options.iter().filter(|o| o.is_correct).count(), 1);
        for option in &options {
            assert!(option.label.contains(", "), "{}", option.label);
            assert_eq!(q.is_answer(&option.label), option.is_correct);
        }
        let wrong = distractors(&q, 7, 3, &mut rng);
        let mut sorted = wrong.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 7);
    }

    #[test]
    fn test_empty_operator_set_fails_fast() {
        let config = DifficultyConfig {
            operators: vec![],
            ..Difficulty::Easy.config()
        };
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(
            generate(NumeralBase::Decimal, &config, &mut rng),
            Err(ConfigError::EmptyOperatorSet)
        );
    }

    #[test]
    fn test_is_answer_normalizes_case() {
        let q = Question::new(Operator::Add, 10, 5, None, NumeralBase::Hex).unwrap();
        assert!(q.is_answer("f"));
        assert!(q.is_answer(" F "));
        assert!(!q.is_answer("E"));
        assert_eq!(q.expression(), "A + 5");
    }

    #[test]
    fn test_question_new_rejects_negative() {
        assert!(Question::new(Operator::Subtract, 2, 5, None, NumeralBase::Decimal).is_none());
        assert!(Question::new(Operator::Divide, 7, 2, None, NumeralBase::Decimal).is_none());
        assert!(Question::new(Operator::Modulo, 7, 0, None, NumeralBase::Decimal).is_none());
    }

    #[test]
    fn test_distractor_fallback_terminates() {
        // Answer 0 in binary with spread 1: random offsets can only ever produce "1"
        let q = Question::new(Operator::Subtract, 3, 3, None, NumeralBase::Binary).unwrap();
        let mut rng = Pcg32::seed_from_u64(9);
        let wrong = distractors(&q, 6, 1, &mut rng);
        assert_eq!(wrong.len(), 6);
        assert!(!wrong.contains(&"0".to_string()));
        let mut sorted = wrong.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 6);
    }

    #[test]
    fn test_answer_options_have_one_correct() {
        let q = Question::new(Operator::Add, 7, 8, None, NumeralBase::Octal).unwrap();
        let mut rng = Pcg32::seed_from_u64(2);
        let options = answer_options(&q, 4, 3, &mut rng);
        assert_eq!(options.len(), 4);
        let correct: Vec<_> = options.iter().filter(|o| o.is_correct).collect();
        assert_eq!(correct.len(), 1);
        assert_eq!(correct[0].label, "17");
    }

    fn operator_strategy() -> impl Strategy<Value = Operator> {
        prop_oneof![
            Just(Operator::Add),
            Just(Operator::Subtract),
            Just(Operator::Multiply),
            Just(Operator::Divide),
            Just(Operator::Modulo),
            Just(Operator::Equation),
            Just(Operator::Area),
            Just(Operator::Linear),
        ]
    }

    proptest! {
        #[test]
        fn prop_generated_answers_are_consistent(
            seed in any::<u64>(),
            op in operator_strategy(),
            base_idx in 0usize..4,
            difficulty_idx in 0usize..3,
        ) {
            let base = NumeralBase::ALL[base_idx];
            let config = DifficultyConfig {
                operators: vec![op],
                ..Difficulty::ALL[difficulty_idx].config()
            };
            let mut rng = Pcg32::seed_from_u64(seed);
            let q = generate(base, &config, &mut rng).unwrap();
            prop_assert_eq!(q.evaluate(), Some(q.correct_value()));
            prop_assert_eq!(q.correct_answer(), base.format(q.correct_value()));
            if op == Operator::Subtract {
                let (a, b) = q.operands();
                prop_assert!(a >= b);
            }
        }

        #[test]
        fn prop_distractors_unique_and_wrong(
            seed in any::<u64>(),
            a in 0u64..300,
            b in 0u64..300,
            count in 3usize..8,
            spread in 1u64..16,
            base_idx in 0usize..4,
        ) {
            let q = Question::new(Operator::Add, a, b, None, NumeralBase::ALL[base_idx]).unwrap();
            let mut rng = Pcg32::seed_from_u64(seed);
            let wrong = distractors(&q, count, spread, &mut rng);
            prop_assert_eq!(wrong.len(), count);
            let correct = q.correct_answer();
            prop_assert!(wrong.iter().all(|w| *w != correct));
            for (i, x) in wrong.iter().enumerate() {
                for y in &wrong[i + 1..] {
                    prop_assert_ne!(x, y);
                }
            }
        }
    }
}
