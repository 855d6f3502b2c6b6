//! Value expressions of normalisation rules.
//!
//! `Value`, `Change-Type`, `Freq`, `Quant` and `Mod` fields hold a small
//! expression language, parsed once at load time into [`Expr`]:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | primary
//! primary := NUMBER | STRING | '{#' N '}' | IDENT '(' args ')' | IDENT | '(' expr ')'
//! ```
//!
//! `+` adds numbers and concatenates anything else. Captures render as text;
//! word-level functions strip the `<surface~POS>` token rendering first, so
//! `month_to_num({#1})` works whether or not the rule is tokenised.

use crate::document::{Direction, TagKind};
use crate::engine::Diagnostics;
use crate::temporal::calendar::holiday_date;
use crate::temporal::words::{
    date_to_iso, day_to_num, decade, month_to_num, ordinal_to_num, season, words_to_num,
};
use crate::temporal::{
    Anchoring, PointError, PreNormal, PreNormalised, ReferenceTracker, TimePoint, Unit, duration_value, prenormalise,
    resolve,
};
use std::fmt;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Str(String),
    /// `{#n}`: capture group `n` of the primary pattern.
    Capture(usize),
    Var(Var),
    Call(Func, Vec<Expr>),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Var {
    /// The current reference point.
    Context,
    /// The document timestamp.
    Dct,
    /// Surface words of the tag body.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Lower,
    Upper,
    Words,
    Pad,
    MonthToNum,
    DayToNum,
    OrdinalToNum,
    WordsToNum,
    Season,
    Decade,
    Duration,
    DateToIso,
    Holiday,
    Absolute,
    Deictic,
    Anaphoric,
    Demonstrative,
    Ambiguous,
    Offset,
    OffsetAnaphoric,
    RelativeWeekday,
    Prenormalise,
}

const FUNCS: &[(&str, Func)] = &[
    ("lower", Func::Lower),
    ("upper", Func::Upper),
    ("words", Func::Words),
    ("pad", Func::Pad),
    ("month_to_num", Func::MonthToNum),
    ("day_to_num", Func::DayToNum),
    ("ordinal_to_num", Func::OrdinalToNum),
    ("words_to_num", Func::WordsToNum),
    ("season", Func::Season),
    ("decade", Func::Decade),
    ("duration", Func::Duration),
    ("date_to_iso", Func::DateToIso),
    ("holiday", Func::Holiday),
    ("absolute", Func::Absolute),
    ("deictic", Func::Deictic),
    ("anaphoric", Func::Anaphoric),
    ("demonstrative", Func::Demonstrative),
    ("ambiguous", Func::Ambiguous),
    ("offset", Func::Offset),
    ("offset_anaphoric", Func::OffsetAnaphoric),
    ("relative_weekday", Func::RelativeWeekday),
    ("prenormalise", Func::Prenormalise),
];

impl Func {
    pub fn from_name(name: &str) -> Option<Func> {
        FUNCS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
    }

    pub fn name(self) -> &'static str {
        FUNCS.iter().find(|(_, f)| *f == self).map_or("?", |(n, _)| n)
    }

    pub fn arity(self) -> RangeInclusive<usize> {
        match self {
            Func::Prenormalise => 0..=1,
            Func::Pad | Func::Duration | Func::Offset | Func::OffsetAnaphoric | Func::RelativeWeekday => 2..=2,
            Func::Holiday | Func::Deictic | Func::Anaphoric | Func::Demonstrative | Func::Ambiguous => 1..=2,
            _ => 1..=1,
        }
    }

    fn anchoring(self) -> Option<Anchoring> {
        match self {
            Func::Deictic | Func::Offset => Some(Anchoring::Deictic),
            Func::Anaphoric | Func::OffsetAnaphoric => Some(Anchoring::Anaphoric),
            Func::Demonstrative => Some(Anchoring::Demonstrative),
            Func::Ambiguous => Some(Anchoring::Ambiguous),
            _ => None,
        }
    }
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("unexpected character `{0}` at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("malformed capture reference at offset {0}")]
    BadCapture(usize),
    #[error("unexpected {0}")]
    Unexpected(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("`{name}` takes {min}..={max} argument(s), got {got}")]
    Arity { name: &'static str, min: usize, max: usize, got: usize },
    #[error("capture {{#{index}}} does not exist (the pattern has {groups} group(s))")]
    MissingCapture { index: usize, groups: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("expected a number, got `{0}`")]
    NotANumber(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("`{func}` cannot convert `{input}`")]
    Conversion { func: &'static str, input: String },
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),
    #[error("no reference time available")]
    NoReference,
    #[error(transparent)]
    Point(#[from] PointError),
    /// Resolution failed; the reason is already in the diagnostics.
    #[error("point could not be resolved")]
    Unresolved,
}

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Text(String),
}

impl Value {
    pub fn as_num(&self) -> Result<f64, EvalError> {
        match self {
            Value::Num(n) => Ok(*n),
            Value::Text(text) => words_to_num(&plain(text)).ok_or_else(|| EvalError::NotANumber(text.clone())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Num(n) => write!(f, "{n}"),
            Value::Text(text) => f.write_str(text),
        }
    }
}

/// Everything an expression can see while it is evaluated.
pub struct EvalContext<'a> {
    pub captures: &'a [String],
    /// Surface words of the tag body, space separated.
    pub text: &'a str,
    pub kind: TagKind,
    pub context: &'a ReferenceTracker,
    pub direction: Option<Direction>,
    pub diagnostics: &'a mut Diagnostics,
}

impl Expr {
    pub fn parse(source: &str) -> Result<Expr, ExprError> {
        let lexemes = lex(source)?;
        let mut parser = Parser { lexemes, pos: 0 };
        let expr = parser.expr()?;
        match parser.peek() {
            Lexeme::End => Ok(expr),
            other => Err(ExprError::Unexpected(other.describe())),
        }
    }

    /// Fail if the expression refers to a capture group beyond `groups`.
    pub fn check_captures(&self, groups: usize) -> Result<(), ExprError> {
        match self {
            Expr::Capture(index) if *index > groups => Err(ExprError::MissingCapture { index: *index, groups }),
            Expr::Neg(inner) => inner.check_captures(groups),
            Expr::Binary(_, lhs, rhs) => {
                lhs.check_captures(groups)?;
                rhs.check_captures(groups)
            }
            Expr::Call(_, args) => args.iter().try_for_each(|arg| arg.check_captures(groups)),
            _ => Ok(()),
        }
    }

    pub fn eval(&self, cx: &mut EvalContext<'_>) -> Result<Value, EvalError> {
        match self {
            Expr::Num(n) => Ok(Value::Num(*n)),
            Expr::Str(text) => Ok(Value::Text(text.clone())),
            Expr::Capture(index) => Ok(Value::Text(cx.captures.get(*index).cloned().unwrap_or_default())),
            Expr::Var(Var::Text) => Ok(Value::Text(cx.text.to_string())),
            Expr::Var(Var::Context) => {
                cx.context.current().map(|p| Value::Text(p.to_string())).ok_or(EvalError::NoReference)
            }
            Expr::Var(Var::Dct) => cx.context.dct().map(|p| Value::Text(p.to_string())).ok_or(EvalError::NoReference),
            Expr::Neg(inner) => Ok(Value::Num(-inner.eval(cx)?.as_num()?)),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = lhs.eval(cx)?;
                let rhs = rhs.eval(cx)?;
                binary(*op, lhs, rhs)
            }
            Expr::Call(func, args) => {
                let values = args.iter().map(|arg| arg.eval(cx)).collect::<Result<Vec<_>, _>>()?;
                call(*func, &values, cx)
            }
        }
    }
}

fn binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    match (op, &lhs, &rhs) {
        (BinOp::Add, Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
        (BinOp::Add, _, _) => Ok(Value::Text(format!("{lhs}{rhs}"))),
        (BinOp::Sub, _, _) => Ok(Value::Num(lhs.as_num()? - rhs.as_num()?)),
        (BinOp::Mul, _, _) => Ok(Value::Num(lhs.as_num()? * rhs.as_num()?)),
        (BinOp::Div, _, _) => {
            let divisor = rhs.as_num()?;
            if divisor == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Num(lhs.as_num()? / divisor))
        }
    }
}

/// Strip the `<surface~POS>` rendering, leaving space-separated surfaces.
pub fn plain(text: &str) -> String {
    let re = regex!(r"<([^<>~]*)~[^<>]*>");
    if !re.is_match(text) {
        return text.trim().to_string();
    }
    re.captures_iter(text).map(|caps| caps[1].to_string()).collect::<Vec<_>>().join(" ")
}

/// Widest field `pad` will produce; TIMEX components are at most four digits.
const MAX_PAD_WIDTH: usize = 16;

fn call(func: Func, args: &[Value], cx: &mut EvalContext<'_>) -> Result<Value, EvalError> {
    let text = |idx: usize| args.get(idx).map(|v| plain(&v.to_string())).unwrap_or_default();
    let num = |idx: usize| args.get(idx).map_or(Err(EvalError::NotANumber(String::new())), Value::as_num);
    let conversion = |input: String| EvalError::Conversion { func: func.name(), input };

    match func {
        Func::Lower => Ok(Value::Text(args.first().map(|v| v.to_string().to_lowercase()).unwrap_or_default())),
        Func::Upper => Ok(Value::Text(args.first().map(|v| v.to_string().to_uppercase()).unwrap_or_default())),
        Func::Words => Ok(Value::Text(text(0))),
        Func::Pad => {
            let width = num(1)?;
            if !(0.0..=MAX_PAD_WIDTH as f64).contains(&width) {
                return Err(conversion(width.to_string()));
            }
            let width = width as usize;
            Ok(Value::Text(format!("{:0>width$}", text(0))))
        }
        Func::MonthToNum => month_to_num(&text(0)).map(|n| Value::Num(n.into())).ok_or_else(|| conversion(text(0))),
        Func::DayToNum => day_to_num(&text(0)).map(|n| Value::Num(n.into())).ok_or_else(|| conversion(text(0))),
        Func::OrdinalToNum => {
            ordinal_to_num(&text(0)).map(|n| Value::Num(n as f64)).ok_or_else(|| conversion(text(0)))
        }
        Func::WordsToNum => words_to_num(&text(0)).map(Value::Num).ok_or_else(|| conversion(text(0))),
        Func::Season => season(&text(0)).map(|s| Value::Text(s.to_string())).ok_or_else(|| conversion(text(0))),
        Func::Decade => decade(&text(0)).map(Value::Text).ok_or_else(|| conversion(text(0))),
        Func::DateToIso => date_to_iso(&text(0)).map(Value::Text).ok_or_else(|| conversion(text(0))),
        Func::Duration => {
            let (unit, multiple) = unit_of(&text(1))?;
            Ok(Value::Text(duration_value(unit, num(0)? * multiple as f64, cx.diagnostics)))
        }
        Func::Holiday => {
            let year = if args.len() > 1 {
                num(1)? as i32
            } else {
                cx.context.anchor(Anchoring::Deictic).and_then(|p| p.year.value()).ok_or(EvalError::NoReference)?
            };
            holiday_date(&text(0), year)
                .map(|date| Value::Text(TimePoint::from_date(date).to_string()))
                .ok_or_else(|| conversion(text(0)))
        }
        Func::Absolute => resolve_point(&PreNormal::absolute(literal(&text(0))?), cx),
        Func::Deictic | Func::Anaphoric | Func::Demonstrative | Func::Ambiguous => {
            let anchor = func.anchoring().unwrap_or(Anchoring::Ambiguous);
            let unit = if args.len() > 1 { Some(unit_of(&text(1))?.0) } else { None };
            let pre = PreNormal::reference(anchor, unit, literal(&text(0))?).with_direction(cx.direction);
            resolve_point(&pre, cx)
        }
        Func::Offset | Func::OffsetAnaphoric => {
            let anchor = func.anchoring().unwrap_or(Anchoring::Deictic);
            let (unit, multiple) = unit_of(&text(1))?;
            resolve_point(&PreNormal::offset(anchor, unit, num(0)? * multiple as f64), cx)
        }
        Func::RelativeWeekday => {
            let weekday = match args.first() {
                Some(Value::Num(n)) => *n as u32,
                _ => day_to_num(&text(0)).ok_or_else(|| conversion(text(0)))?,
            };
            let n = num(1)? as i64;
            resolve_point(&PreNormal::relative_weekday(Anchoring::Deictic, weekday, n), cx)
        }
        Func::Prenormalise => {
            let input = if args.is_empty() { cx.text.to_string() } else { text(0) };
            match prenormalise(cx.kind, &input, cx.diagnostics) {
                Some(PreNormalised::Point(pre)) => {
                    let pre = if pre.direction.is_none() { pre.with_direction(cx.direction) } else { pre };
                    resolve_point(&pre, cx)
                }
                Some(PreNormalised::Value(value)) => Ok(Value::Text(value)),
                None => Err(conversion(input)),
            }
        }
    }
}

fn unit_of(word: &str) -> Result<(Unit, i64), EvalError> {
    Unit::from_word(word).ok_or_else(|| EvalError::UnknownUnit(word.to_string()))
}

fn literal(text: &str) -> Result<TimePoint, EvalError> {
    if text.is_empty() {
        return Ok(TimePoint::default());
    }
    Ok(TimePoint::parse(text)?)
}

fn resolve_point(pre: &PreNormal, cx: &mut EvalContext<'_>) -> Result<Value, EvalError> {
    resolve(pre, cx.context, cx.diagnostics).map(|p| Value::Text(p.to_string())).ok_or(EvalError::Unresolved)
}

// --- Lexer -------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Num(f64),
    Str(String),
    Capture(usize),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    End,
}

impl Lexeme {
    fn describe(&self) -> String {
        match self {
            Lexeme::Num(n) => format!("number {n}"),
            Lexeme::Str(s) => format!("string \"{s}\""),
            Lexeme::Capture(i) => format!("capture {{#{i}}}"),
            Lexeme::Ident(name) => format!("identifier `{name}`"),
            Lexeme::LParen => "`(`".to_string(),
            Lexeme::RParen => "`)`".to_string(),
            Lexeme::Comma => "`,`".to_string(),
            Lexeme::Plus => "`+`".to_string(),
            Lexeme::Minus => "`-`".to_string(),
            Lexeme::Star => "`*`".to_string(),
            Lexeme::Slash => "`/`".to_string(),
            Lexeme::End => "end of expression".to_string(),
        }
    }
}

fn lex(source: &str) -> Result<Vec<Lexeme>, ExprError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' | ')' | ',' | '+' | '-' | '*' | '/' => {
                out.push(match c {
                    '(' => Lexeme::LParen,
                    ')' => Lexeme::RParen,
                    ',' => Lexeme::Comma,
                    '+' => Lexeme::Plus,
                    '-' => Lexeme::Minus,
                    '*' => Lexeme::Star,
                    _ => Lexeme::Slash,
                });
                i += 1;
            }
            '"' | '\'' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    let Some(&(_, next)) = chars.get(i) else {
                        return Err(ExprError::UnterminatedString);
                    };
                    i += 1;
                    match next {
                        '\\' => {
                            let Some(&(_, escaped)) = chars.get(i) else {
                                return Err(ExprError::UnterminatedString);
                            };
                            text.push(escaped);
                            i += 1;
                        }
                        n if n == quote => break,
                        n => text.push(n),
                    }
                }
                out.push(Lexeme::Str(text));
            }
            '{' => {
                let end = chars[i..].iter().position(|(_, c)| *c == '}').map(|p| i + p).ok_or(ExprError::BadCapture(offset))?;
                let inner: String = chars[i + 1..end].iter().map(|(_, c)| c).collect();
                let index = inner
                    .trim()
                    .strip_prefix('#')
                    .and_then(|n| n.trim().parse().ok())
                    .ok_or(ExprError::BadCapture(offset))?;
                out.push(Lexeme::Capture(index));
                i = end + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().map(|(_, c)| c).collect();
                let n = text.parse().map_err(|_| ExprError::Unexpected(format!("number `{text}`")))?;
                out.push(Lexeme::Num(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_alphanumeric() || chars[i].1 == '_') {
                    i += 1;
                }
                out.push(Lexeme::Ident(chars[start..i].iter().map(|(_, c)| c).collect()));
            }
            other => return Err(ExprError::UnexpectedChar(other, offset)),
        }
    }
    out.push(Lexeme::End);
    Ok(out)
}

// --- Parser ------------------------------------------------------------------

struct Parser {
    lexemes: Vec<Lexeme>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Lexeme {
        self.lexemes.get(self.pos).unwrap_or(&Lexeme::End)
    }

    fn bump(&mut self) -> Lexeme {
        let lexeme = self.peek().clone();
        self.pos += 1;
        lexeme
    }

    fn expect(&mut self, wanted: Lexeme) -> Result<(), ExprError> {
        let found = self.bump();
        if found == wanted { Ok(()) } else { Err(ExprError::Unexpected(found.describe())) }
    }

    fn expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Lexeme::Plus => BinOp::Add,
                Lexeme::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.bump();
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(self.term()?));
        }
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Lexeme::Star => BinOp::Mul,
                Lexeme::Slash => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.bump();
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(self.unary()?));
        }
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if *self.peek() == Lexeme::Minus {
            self.bump();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.bump() {
            Lexeme::Num(n) => Ok(Expr::Num(n)),
            Lexeme::Str(s) => Ok(Expr::Str(s)),
            Lexeme::Capture(i) => Ok(Expr::Capture(i)),
            Lexeme::LParen => {
                let inner = self.expr()?;
                self.expect(Lexeme::RParen)?;
                Ok(inner)
            }
            Lexeme::Ident(name) if *self.peek() == Lexeme::LParen => {
                self.bump();
                let func = Func::from_name(&name).ok_or(ExprError::UnknownFunction(name))?;
                let mut args = Vec::new();
                if *self.peek() != Lexeme::RParen {
                    loop {
                        args.push(self.expr()?);
                        if *self.peek() == Lexeme::Comma {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(Lexeme::RParen)?;
                let arity = func.arity();
                if !arity.contains(&args.len()) {
                    return Err(ExprError::Arity {
                        name: func.name(),
                        min: *arity.start(),
                        max: *arity.end(),
                        got: args.len(),
                    });
                }
                Ok(Expr::Call(func, args))
            }
            Lexeme::Ident(name) => match name.as_str() {
                "context" => Ok(Expr::Var(Var::Context)),
                "dct" => Ok(Expr::Var(Var::Dct)),
                "text" => Ok(Expr::Var(Var::Text)),
                _ => Err(ExprError::UnknownVariable(name)),
            },
            other => Err(ExprError::Unexpected(other.describe())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_with(source: &str, captures: &[&str], text: &str, kind: TagKind, dct: Option<&str>) -> Result<String, EvalError> {
        let expr = Expr::parse(source).unwrap();
        let captures: Vec<String> = captures.iter().map(|c| c.to_string()).collect();
        let context = ReferenceTracker::new(dct.map(|d| TimePoint::parse(d).unwrap()));
        let mut diagnostics = Diagnostics::default();
        let mut cx = EvalContext {
            captures: &captures,
            text,
            kind,
            context: &context,
            direction: None,
            diagnostics: &mut diagnostics,
        };
        expr.eval(&mut cx).map(|v| v.to_string())
    }

    fn eval(source: &str, captures: &[&str]) -> Result<String, EvalError> {
        eval_with(source, captures, "", TagKind::Date, Some("2010-08-04"))
    }

    #[test]
    fn precedence_and_concatenation() {
        assert_eq!(eval("1 + 2 * 3", &[]).unwrap(), "7");
        assert_eq!(eval("(1 + 2) * 3", &[]).unwrap(), "9");
        assert_eq!(eval("-2 + 5", &[]).unwrap(), "3");
        assert_eq!(eval("7 / 2", &[]).unwrap(), "3.5");
        assert_eq!(eval("\"XXXX-\" + pad(month_to_num({#1}), 2)", &["", "<August~NNP>"]).unwrap(), "XXXX-08");
    }

    #[test]
    fn pad_rejects_unreasonable_widths() {
        assert_eq!(eval("pad({#1}, 4)", &["", "7"]).unwrap(), "0007");
        assert!(matches!(
            eval("pad('7', {#1})", &["", "99999999999999999999"]),
            Err(EvalError::Conversion { func: "pad", .. })
        ));
        assert!(matches!(eval("pad('7', -1)", &[]), Err(EvalError::Conversion { func: "pad", .. })));
    }

    #[test]
    fn word_functions_strip_token_rendering() {
        assert_eq!(plain("<twenty-first~JJ><of~IN>"), "twenty-first of");
        assert_eq!(eval("ordinal_to_num({#1})", &["", "<twenty-first~JJ>"]).unwrap(), "21");
        assert_eq!(eval("words_to_num({#1}) * 2", &["", "three"]).unwrap(), "6");
        assert_eq!(eval("season({#1})", &["", "<autumn~NN>"]).unwrap(), "FA");
        assert_eq!(eval("duration({#1}, {#2})", &["", "<two~CD>", "<weeks~NNS>"]).unwrap(), "P2W");
        assert_eq!(eval("upper(lower('Abc'))", &[]).unwrap(), "ABC");
    }

    #[test]
    fn point_functions_resolve_against_the_context() {
        assert_eq!(eval("offset(-1, 'day')", &[]).unwrap(), "2010-08-03");
        assert_eq!(eval("deictic('XXXX-08-15')", &[]).unwrap(), "2010-08-15");
        assert_eq!(eval("relative_weekday('Friday', -1)", &[]).unwrap(), "2010-07-30");
        assert_eq!(eval("holiday('christmas')", &[]).unwrap(), "2010-12-25");
        assert_eq!(eval("holiday('thanksgiving', 2011)", &[]).unwrap(), "2011-11-24");
        assert_eq!(eval("absolute('20100804')", &[]).unwrap(), "2010-08-04");
        assert_eq!(eval("dct", &[]).unwrap(), "2010-08-04");
    }

    #[test]
    fn prenormalise_defaults_to_the_tag_text() {
        let value = eval_with("prenormalise()", &[], "three days ago", TagKind::Date, Some("2010-08-04"));
        assert_eq!(value.unwrap(), "2010-08-01");
        let value = eval_with("prenormalise()", &[], "three years", TagKind::Duration, None);
        assert_eq!(value.unwrap(), "P3Y");
    }

    #[test]
    fn evaluation_failures() {
        assert_eq!(eval("1 / 0", &[]), Err(EvalError::DivisionByZero));
        assert!(matches!(eval("month_to_num('Smarch')", &[]), Err(EvalError::Conversion { func: "month_to_num", .. })));
        assert_eq!(eval_with("offset(1, 'day')", &[], "", TagKind::Date, None), Err(EvalError::Unresolved));
        assert_eq!(eval("offset(1, 'eon')", &[]), Err(EvalError::UnknownUnit("eon".to_string())));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Expr::parse("frobnicate(1)"), Err(ExprError::UnknownFunction("frobnicate".to_string())));
        assert!(matches!(Expr::parse("pad(1)"), Err(ExprError::Arity { name: "pad", got: 1, .. })));
        assert_eq!(Expr::parse("'open"), Err(ExprError::UnterminatedString));
        assert_eq!(Expr::parse("nowhere"), Err(ExprError::UnknownVariable("nowhere".to_string())));
        assert!(matches!(Expr::parse("1 +"), Err(ExprError::Unexpected(_))));
        assert!(matches!(Expr::parse("1 2"), Err(ExprError::Unexpected(_))));
        assert_eq!(Expr::parse("{1}"), Err(ExprError::BadCapture(0)));
    }

    #[test]
    fn capture_references_are_checked() {
        let expr = Expr::parse("pad({#1}, 2) + {#3}").unwrap();
        assert_eq!(expr.check_captures(3), Ok(()));
        assert_eq!(expr.check_captures(2), Err(ExprError::MissingCapture { index: 3, groups: 2 }));
    }
}
