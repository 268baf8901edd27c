use std::fmt;

use csscolorparser::Color;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};

use crate::{error::Result, DesignTokens};

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?[0-9]+(?:\.[0-9]+)?)([a-zA-Z%]*)$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Color(Color),
    Any(String),
}
impl Value {
    pub fn to_css(&self) -> String {
        match self {
            Value::Color(val) => val.to_hex_string(),
            Value::Any(val) => val.to_string(),
        }
    }
    /// Numeric magnitude and unit suffix, e.g. `16px` -> `(16.0, "px")`.
    pub(crate) fn as_number(&self) -> Option<(f64, &str)> {
        match self {
            Value::Any(val) => {
                let caps = NUMBER.captures(val.trim())?;
                let number = caps.get(1)?.as_str().parse().ok()?;
                Some((number, caps.get(2).map_or("", |unit| unit.as_str())))
            }
            Value::Color(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Mul,
    Div,
}

#[derive(Debug, PartialEq)]
pub enum Expression {
    Ref(Vec<String>),
    Mul(Box<Expression>, Box<Expression>),
    Div(Box<Expression>, Box<Expression>),
    Value(Value),
}
impl Expression {
    pub fn parse(source: &str) -> Expression {
        expr_parser::expr(source)
            .unwrap_or_else(|_| Expression::Value(Value::Any(source.trim().to_string())))
    }
    pub fn get_value(&self, tokens: &DesignTokens, stack: &mut Vec<String>) -> Result<Value> {
        match self {
            Expression::Ref(path) => tokens.resolve(path, stack),
            Expression::Mul(a, b) => Ok(arithmetic(
                Operator::Mul,
                a.get_value(tokens, stack)?,
                b.get_value(tokens, stack)?,
            )),
            Expression::Div(a, b) => Ok(arithmetic(
                Operator::Div,
                a.get_value(tokens, stack)?,
                b.get_value(tokens, stack)?,
            )),
            Expression::Value(value) => Ok(value.clone()),
        }
    }
}

fn arithmetic(op: Operator, a: Value, b: Value) -> Value {
    let computed = match (a.as_number(), b.as_number()) {
        (Some((x, unit_x)), Some((y, unit_y))) => match op {
            Operator::Mul if unit_x.is_empty() || unit_y.is_empty() => {
                Some((x * y, if unit_x.is_empty() { unit_y } else { unit_x }))
            }
            Operator::Div if y != 0.0 && unit_y.is_empty() => Some((x / y, unit_x)),
            Operator::Div if y != 0.0 && unit_x == unit_y => Some((x / y, "")),
            _ => None,
        },
        _ => None,
    };
    match computed {
        Some((number, unit)) => Value::Any(format!("{}{unit}", format_number(number))),
        None => {
            let sign = match op {
                Operator::Mul => "*",
                Operator::Div => "/",
            };
            Value::Any(format!("calc({} {sign} {})", a.to_css(), b.to_css()))
        }
    }
}

pub(crate) fn format_number(number: f64) -> String {
    let rounded = (number * 10_000.0).round() / 10_000.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

peg::parser! {
  grammar expr_parser() for str {
    rule _ = quiet!{[' ' | '\n' | '\t']*}


    pub(crate) rule expr() -> Expression = _ e:term() _ { e }

    rule term() -> Expression = precedence!{
        x:(@) _ "*" _ y:@ { Expression::Mul(Box::new(x), Box::new(y)) }
        x:(@) _ "/" _ y:@ { Expression::Div(Box::new(x), Box::new(y)) }
        --
        "{" v:($((!"}" !"." [_])*) ** ".") "}" { Expression::Ref(v.iter().map(|x| x.to_string()).collect()) }
        c:color() { c }
        v:$(['a'..='z' | 'A'..='Z' | '0'..='9' | '#' | '%' | '-' | '.' | ' ']+) { Expression::Value(Value::Any(v.trim().to_string())) }
    }

    rule color() -> Expression = v:$("#" ['a'..='z' | 'A'..='Z' | '0'..='9']+) {?
        csscolorparser::parse(v).map(|c| Expression::Value(Value::Color(c))).or(Err("color"))
    }
  }
}

#[test]
fn test() {
    assert_eq!(
        expr_parser::expr("{hello.world}").unwrap(),
        Expression::Ref(vec!["hello".to_string(), "world".to_string()])
    );
    assert_eq!(
        expr_parser::expr("#ff00ff").unwrap(),
        Expression::Value(Value::Color(csscolorparser::parse("#ff00ff").unwrap()))
    );
    assert_eq!(
        expr_parser::expr("90%").unwrap(),
        Expression::Value(Value::Any("90%".to_string()))
    );
    assert_eq!(
        expr_parser::expr("-90%").unwrap(),
        Expression::Value(Value::Any("-90%".to_string()))
    );
    assert_eq!(
        expr_parser::expr("ABC Diatype Variable").unwrap(),
        Expression::Value(Value::Any("ABC Diatype Variable".to_string()))
    );
    assert_eq!(
        expr_parser::expr("{x} * {y}").unwrap(),
        Expression::Mul(
            Box::new(Expression::Ref(vec!["x".to_string()])),
            Box::new(Expression::Ref(vec!["y".to_string()])),
        )
    );
    assert_eq!(
        expr_parser::expr("{x}/5").unwrap(),
        Expression::Div(
            Box::new(Expression::Ref(vec!["x".to_string()])),
            Box::new(Expression::Value(Value::Any("5".to_string()))),
        )
    );
    assert_eq!(
        Expression::parse("0 2px 4px rgba(0, 0, 0, 0.2)"),
        Expression::Value(Value::Any("0 2px 4px rgba(0, 0, 0, 0.2)".to_string()))
    );
}

#[test]
fn arithmetic_keeps_single_unit() {
    let px = |s: &str| Value::Any(s.to_string());
    assert_eq!(arithmetic(Operator::Mul, px("4px"), px("2")), px("8px"));
    assert_eq!(arithmetic(Operator::Div, px("16px"), px("3")), px("5.3333px"));
    assert_eq!(arithmetic(Operator::Div, px("16px"), px("8px")), px("2"));
    assert_eq!(
        arithmetic(Operator::Mul, px("4px"), px("2rem")),
        px("calc(4px * 2rem)")
    );
    assert_eq!(arithmetic(Operator::Div, px("4"), px("0")), px("calc(4 / 0)"));
}

struct ExpressionVisitor;

impl<'de> Visitor<'de> for ExpressionVisitor {
    type Value = Expression;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a token expression or number")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Expression::parse(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Expression::Value(Value::Any(value.to_string())))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Expression::Value(Value::Any(value.to_string())))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Expression::Value(Value::Any(value.to_string())))
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D>(deserializer: D) -> Result<Expression, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ExpressionVisitor)
    }
}
