//! A scientific calculator.
//!
//! Expressions are tokenized and evaluated by a recursive-descent parser over a
//! fixed grammar; nothing is ever handed to a general-purpose interpreter.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := postfix ('^' unary)?
//! postfix := primary '!'*
//! primary := number | 'π' | 'pi' | 'e' | func '(' expr ')' | '√' primary | '(' expr ')'
//! func    := sin | cos | tan | sqrt | log | ln
//! ```
//!
//! `×`, `÷` and `−` are accepted as aliases for `*`, `/` and `-`.

use std::f64::consts::{E, PI};

/// The number of entries kept in the calculator history.
pub const HISTORY_LEN: usize = 10;

/// The largest integer whose factorial is finite in an `f64`.
const MAX_FACTORIAL: f64 = 170.0;

/// Errors raised while evaluating an expression.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CalcError {
    /// The expression is blank.
    #[error("nothing to evaluate")]
    Empty,

    /// A character that is not part of the grammar.
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    /// A malformed numeric literal.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// An identifier that is neither a constant nor a function.
    #[error("unknown name '{0}'")]
    UnknownName(String),

    /// The expression ended where more input was required.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A token in a position where the grammar does not allow it.
    #[error("unexpected '{0}'")]
    UnexpectedToken(String),

    /// Factorial of something other than a whole number in `0..=170`.
    #[error("factorial is only defined for whole numbers from 0 to 170, not {0}")]
    InvalidFactorial(f64),

    /// Division by zero, or a function evaluated outside its domain.
    #[error("the result is not a finite number")]
    NotFinite,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Name(String),
    Op(char),
    Sqrt,
    Bang,
    Open,
    Close,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
            Self::Op(op) => write!(f, "{op}"),
            Self::Sqrt => f.write_str("√"),
            Self::Bang => f.write_str("!"),
            Self::Open => f.write_str("("),
            Self::Close => f.write_str(")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '0'..='9' | '.' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !(next.is_ascii_digit() || next == '.') {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                let literal = &input[start..end];
                let value = literal
                    .parse()
                    .map_err(|_| CalcError::InvalidNumber(literal.to_string()))?;
                Token::Number(value)
            }
            c if c.is_alphabetic() && c != 'π' => {
                let mut name = c.to_string();
                while let Some(&(_, next)) = chars.peek() {
                    if !next.is_alphabetic() || next == 'π' {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                Token::Name(name.to_lowercase())
            }
            'π' => Token::Name("pi".to_string()),
            '+' => Token::Op('+'),
            '-' | '−' => Token::Op('-'),
            '*' | '×' => Token::Op('*'),
            '/' | '÷' => Token::Op('/'),
            '^' => Token::Op('^'),
            '√' => Token::Sqrt,
            '!' => Token::Bang,
            '(' => Token::Open,
            ')' => Token::Close,
            other => return Err(CalcError::UnexpectedChar(other)),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect_close(&mut self) -> Result<(), CalcError> {
        match self.advance() {
            Some(Token::Close) => Ok(()),
            Some(token) => Err(CalcError::UnexpectedToken(token.to_string())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/']) {
            let rhs = self.unary()?;
            value = if op == '*' { value * rhs } else { value / rhs };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.eat_op(&['+', '-']) {
            Some('-') => Ok(-self.unary()?),
            Some(_) => self.unary(),
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.postfix()?;
        if self.eat_op(&['^']).is_some() {
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<f64, CalcError> {
        let mut value = self.primary()?;
        while self.peek() == Some(&Token::Bang) {
            self.pos += 1;
            value = factorial(value)?;
        }
        Ok(value)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.advance().ok_or(CalcError::UnexpectedEnd)? {
            Token::Number(n) => Ok(n),
            Token::Sqrt => Ok(self.primary()?.sqrt()),
            Token::Open => {
                let value = self.expr()?;
                self.expect_close()?;
                Ok(value)
            }
            Token::Name(name) => match name.as_str() {
                "pi" => Ok(PI),
                "e" => Ok(E),
                _ => {
                    let function = function(&name)?;
                    match self.advance() {
                        Some(Token::Open) => {}
                        Some(token) => return Err(CalcError::UnexpectedToken(token.to_string())),
                        None => return Err(CalcError::UnexpectedEnd),
                    }
                    let argument = self.expr()?;
                    self.expect_close()?;
                    Ok(function(argument))
                }
            },
            token => Err(CalcError::UnexpectedToken(token.to_string())),
        }
    }
}

fn function(name: &str) -> Result<fn(f64) -> f64, CalcError> {
    Ok(match name {
        "sin" => f64::sin,
        "cos" => f64::cos,
        "tan" => f64::tan,
        "sqrt" => f64::sqrt,
        "log" => f64::log10,
        "ln" => f64::ln,
        _ => return Err(CalcError::UnknownName(name.to_string())),
    })
}

fn factorial(n: f64) -> Result<f64, CalcError> {
    if n < 0.0 || n > MAX_FACTORIAL || n.fract() != 0.0 {
        return Err(CalcError::InvalidFactorial(n));
    }
    let mut product = 1.0;
    let mut k = 2.0;
    while k <= n {
        product *= k;
        k += 1.0;
    }
    Ok(product)
}

/// Evaluate `expression`.
///
/// Missing closing parentheses are appended before evaluation.
///
/// # Errors
///
/// Returns a [`CalcError`] if the expression is blank, does not follow the
/// grammar, or evaluates to something other than a finite number.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let mut tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let open = tokens.iter().filter(|t| **t == Token::Open).count();
    let close = tokens.iter().filter(|t| **t == Token::Close).count();
    tokens.extend(std::iter::repeat_n(Token::Close, open.saturating_sub(close)));

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(CalcError::UnexpectedToken(token.to_string()));
    }

    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NotFinite)
    }
}

/// Format a result for display.
///
/// Whole numbers are shown without a fractional part; anything else is
/// rounded to six decimal places with trailing zeros removed.
#[must_use]
pub fn format_result(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }
    let fixed = format!("{value:.6}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// A key on the calculator keypad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcKey {
    /// Clear the input and the result.
    Clear,
    /// Remove the last character of the input.
    Delete,
    /// Evaluate the input.
    Equals,
    /// Forget all past calculations.
    ClearHistory,
    /// Append to the input.
    Insert(String),
}

/// Calculator state: the expression being typed, the last result and a
/// history of past calculations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Calculator {
    input: String,
    result: String,
    history: Vec<String>,
}

impl Calculator {
    /// The expression being typed.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The last result, or `Error` if the last evaluation failed.
    #[must_use]
    pub fn result(&self) -> &str {
        &self.result
    }

    /// Past calculations as `"{input} = {result}"`, newest first.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// React to a key press.
    pub fn press(&mut self, key: CalcKey) {
        match key {
            CalcKey::Clear => {
                self.input.clear();
                self.result.clear();
            }
            CalcKey::Delete => {
                self.input.pop();
            }
            CalcKey::ClearHistory => self.history.clear(),
            CalcKey::Insert(text) => self.input.push_str(&text),
            CalcKey::Equals => self.equals(),
        }
    }

    fn equals(&mut self) {
        if self.input.is_empty() {
            return;
        }
        match evaluate(&self.input) {
            Ok(value) => {
                self.result = format_result(value);
                self.history
                    .insert(0, format!("{} = {}", self.input, self.result));
                self.history.truncate(HISTORY_LEN);
            }
            Err(e) => {
                tracing::debug!("failed to evaluate '{}': {e}", self.input);
                self.result = "Error".to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("1 + 2 * 3", 7.0; "precedence")]
    #[test_case("(1 + 2) * 3", 9.0; "parentheses")]
    #[test_case("8 ÷ 2 × 3", 12.0; "display operators")]
    #[test_case("10 − 4", 6.0; "unicode minus")]
    #[test_case("2 ^ 3 ^ 2", 512.0; "power is right associative")]
    #[test_case("-2 ^ 2", -4.0; "power binds tighter than negation")]
    #[test_case("2 ^ -1", 0.5; "negative exponent")]
    #[test_case("--3", 3.0; "double negation")]
    #[test_case("5!", 120.0; "factorial")]
    #[test_case("3!!", 720.0; "repeated factorial")]
    #[test_case("√16", 4.0; "root of number")]
    #[test_case("√(9 + 16)", 5.0; "root of group")]
    #[test_case("sqrt(2 * 8)", 4.0; "sqrt function")]
    #[test_case("log(1000)", 3.0; "common log")]
    #[test_case("ln(e)", 1.0; "natural log")]
    #[test_case("cos(0)", 1.0; "cosine")]
    #[test_case("(1 + 2", 3.0; "auto closes parentheses")]
    #[test_case("sin(0", 0.0; "auto closes function call")]
    fn evaluates(expression: &str, expected: f64) {
        let value = evaluate(expression).unwrap();
        assert!((value - expected).abs() < 1e-9, "{expression} = {value}");
    }

    #[test]
    fn pi_has_two_spellings() {
        assert_eq!(evaluate("π").unwrap(), PI);
        assert_eq!(evaluate("2 * pi").unwrap(), 2.0 * PI);
    }

    #[test_case("", CalcError::Empty; "blank")]
    #[test_case("   ", CalcError::Empty; "whitespace")]
    #[test_case("1 / 0", CalcError::NotFinite; "division by zero")]
    #[test_case("sqrt(-1)", CalcError::NotFinite; "domain error")]
    #[test_case("171!", CalcError::InvalidFactorial(171.0); "factorial overflow")]
    #[test_case("2.5!", CalcError::InvalidFactorial(2.5); "fractional factorial")]
    #[test_case("1 +", CalcError::UnexpectedEnd; "dangling operator")]
    #[test_case("1 2", CalcError::UnexpectedToken("2".to_string()); "missing operator")]
    #[test_case("1)", CalcError::UnexpectedToken(")".to_string()); "stray close")]
    #[test_case("foo(1)", CalcError::UnknownName("foo".to_string()); "unknown function")]
    #[test_case("sin 1", CalcError::UnexpectedToken("1".to_string()); "function without parentheses")]
    #[test_case("1.2.3", CalcError::InvalidNumber("1.2.3".to_string()); "malformed number")]
    #[test_case("2 % 3", CalcError::UnexpectedChar('%'); "unsupported operator")]
    fn rejects(expression: &str, expected: CalcError) {
        assert_eq!(evaluate(expression).unwrap_err(), expected);
    }

    #[test_case(4.0, "4"; "integer")]
    #[test_case(-12.0, "-12"; "negative integer")]
    #[test_case(0.5, "0.5"; "short fraction")]
    #[test_case(1.0 / 3.0, "0.333333"; "rounded fraction")]
    #[test_case(2.000_000_1, "2"; "rounds to whole")]
    #[test_case(-0.0, "0"; "negative zero")]
    fn formats(value: f64, expected: &str) {
        assert_eq!(format_result(value), expected);
    }

    fn type_in(calculator: &mut Calculator, expression: &str) {
        calculator.press(CalcKey::Insert(expression.to_string()));
        calculator.press(CalcKey::Equals);
    }

    #[test]
    fn keypad_evaluates_and_records_history() {
        let mut calculator = Calculator::default();
        type_in(&mut calculator, "2×3");
        assert_eq!(calculator.result(), "6");
        assert_eq!(calculator.history(), &["2×3 = 6"]);

        calculator.press(CalcKey::Clear);
        type_in(&mut calculator, "1+1");
        assert_eq!(calculator.history(), &["1+1 = 2", "2×3 = 6"]);
    }

    #[test]
    fn errors_display_without_touching_history() {
        let mut calculator = Calculator::default();
        type_in(&mut calculator, "1/0");
        assert_eq!(calculator.result(), "Error");
        assert!(calculator.history().is_empty());
        assert_eq!(calculator.input(), "1/0");
    }

    #[test]
    fn history_is_bounded() {
        let mut calculator = Calculator::default();
        for i in 0..15 {
            calculator.press(CalcKey::Clear);
            type_in(&mut calculator, &i.to_string());
        }
        assert_eq!(calculator.history().len(), HISTORY_LEN);
        assert_eq!(calculator.history()[0], "14 = 14");
    }

    #[test]
    fn delete_removes_last_character() {
        let mut calculator = Calculator::default();
        calculator.press(CalcKey::Insert("√(".to_string()));
        calculator.press(CalcKey::Delete);
        assert_eq!(calculator.input(), "√");
    }

    #[test]
    fn equals_on_empty_input_does_nothing() {
        let mut calculator = Calculator::default();
        calculator.press(CalcKey::Equals);
        assert_eq!(calculator, Calculator::default());
    }
}
