// ABOUTME: nom parser from expression source to the AST
// ABOUTME: Grammar: ternary, logical, equality, relational, additive, multiplicative, unary, postfix

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{anychar, char, digit0, digit1, multispace0, one_of, satisfy},
    combinator::{all_consuming, cut, map, map_res, opt, recognize, value},
    error::{context, VerboseError, VerboseErrorKind},
    multi::{fold_many0, separated_list0},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::error::{EvalError, Result};
use crate::value::Value;

pub(crate) type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub fn parse(source: &str) -> Result<Expr> {
    match all_consuming(delimited(multispace0, conditional, multispace0))(source) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(syntax_error(source, e)),
        Err(nom::Err::Incomplete(_)) => Err(EvalError::Syntax {
            expr: source.to_string(),
            offset: source.len(),
            message: "unexpected end of input".to_string(),
        }),
    }
}

fn syntax_error(source: &str, error: VerboseError<&str>) -> EvalError {
    let (offset, message) = describe_error(source, &error);
    EvalError::Syntax {
        expr: source.to_string(),
        offset,
        message,
    }
}

/// Offset and readable message of the innermost nom error
pub(crate) fn describe_error(source: &str, error: &VerboseError<&str>) -> (usize, String) {
    let remaining = error.errors.first().map(|(rest, _)| *rest).unwrap_or("");
    let found = match remaining.chars().next() {
        Some(c) => format!("'{}'", c),
        None => "end of input".to_string(),
    };
    let expected = error.errors.iter().find_map(|(_, kind)| match kind {
        VerboseErrorKind::Context(label) => Some(*label),
        _ => None,
    });

    let message = match expected {
        Some(label) => format!("expected {}, found {}", label, found),
        None => format!("unexpected {}", found),
    };
    (source.len().saturating_sub(remaining.len()), message)
}

pub(crate) fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

// Literals, shared with the binding DSL

pub(crate) fn number(input: &str) -> PResult<'_, f64> {
    map_res(
        recognize(pair(
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        )),
        |text: &str| text.parse::<f64>(),
    )(input)
}

pub(crate) fn string_literal(input: &str) -> PResult<'_, String> {
    alt((quoted('\''), quoted('"')))(input)
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> PResult<'a, String> {
    move |input| {
        delimited(
            char(quote),
            fold_many0(
                alt((
                    preceded(char('\\'), map(anychar, unescape)),
                    satisfy(move |c| c != quote && c != '\\'),
                )),
                String::new,
                |mut text, c| {
                    text.push(c);
                    text
                },
            ),
            context("closing quote", cut(char(quote))),
        )(input)
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

pub(crate) fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    ))(input)
}

fn keyword_or_variable(name: &str) -> Expr {
    match name {
        "true" => Expr::Literal(Value::Bool(true)),
        "false" => Expr::Literal(Value::Bool(false)),
        "null" | "undefined" => Expr::Literal(Value::Null),
        name => Expr::Variable(name.to_string()),
    }
}

// Operators, lowest precedence first

fn conditional(input: &str) -> PResult<'_, Expr> {
    let (input, test) = logical_or(input)?;
    let (input, branches) = opt(tuple((
        ws(char('?')),
        conditional,
        context("':' of conditional", cut(ws(char(':')))),
        conditional,
    )))(input)?;

    Ok(match branches {
        Some((_, consequent, _, alternate)) => (
            input,
            Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
        ),
        None => (input, test),
    })
}

fn logical(op: LogicalOp) -> impl Fn(Expr, Expr) -> Expr {
    move |left, right| Expr::Logical {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn binary(left: Expr, (op, right): (BinaryOp, Expr)) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn logical_or(input: &str) -> PResult<'_, Expr> {
    let (input, first) = logical_and(input)?;
    let join = logical(LogicalOp::Or);
    fold_many0(
        preceded(ws(tag("||")), logical_and),
        move || first.clone(),
        move |left, right| join(left, right),
    )(input)
}

fn logical_and(input: &str) -> PResult<'_, Expr> {
    let (input, first) = equality(input)?;
    let join = logical(LogicalOp::And);
    fold_many0(
        preceded(ws(tag("&&")), equality),
        move || first.clone(),
        move |left, right| join(left, right),
    )(input)
}

fn equality(input: &str) -> PResult<'_, Expr> {
    let (input, first) = relational(input)?;
    fold_many0(
        pair(
            ws(alt((
                value(BinaryOp::StrictEqual, tag("===")),
                value(BinaryOp::StrictNotEqual, tag("!==")),
                value(BinaryOp::Equal, tag("==")),
                value(BinaryOp::NotEqual, tag("!=")),
            ))),
            relational,
        ),
        move || first.clone(),
        binary,
    )(input)
}

fn relational(input: &str) -> PResult<'_, Expr> {
    let (input, first) = additive(input)?;
    fold_many0(
        pair(
            ws(alt((
                value(BinaryOp::LessEqual, tag("<=")),
                value(BinaryOp::GreaterEqual, tag(">=")),
                value(BinaryOp::Less, char('<')),
                value(BinaryOp::Greater, char('>')),
            ))),
            additive,
        ),
        move || first.clone(),
        binary,
    )(input)
}

fn additive(input: &str) -> PResult<'_, Expr> {
    let (input, first) = multiplicative(input)?;
    fold_many0(
        pair(
            ws(alt((
                value(BinaryOp::Add, char('+')),
                value(BinaryOp::Sub, char('-')),
            ))),
            multiplicative,
        ),
        move || first.clone(),
        binary,
    )(input)
}

fn multiplicative(input: &str) -> PResult<'_, Expr> {
    let (input, first) = unary(input)?;
    fold_many0(
        pair(
            ws(alt((
                value(BinaryOp::Mul, char('*')),
                value(BinaryOp::Div, char('/')),
                value(BinaryOp::Rem, char('%')),
            ))),
            unary,
        ),
        move || first.clone(),
        binary,
    )(input)
}

fn unary(input: &str) -> PResult<'_, Expr> {
    let (input, _) = multispace0(input)?;
    let (input, op) = opt(alt((
        value(UnaryOp::Not, char('!')),
        value(UnaryOp::Negate, char('-')),
        value(UnaryOp::Plus, char('+')),
    )))(input)?;

    match op {
        Some(op) => {
            let (input, operand) = unary(input)?;
            Ok((
                input,
                Expr::Unary {
                    op,
                    operand: Box::new(operand),
                },
            ))
        }
        None => postfix(input),
    }
}

/// Member access and calls. Only a variable or member path can be called;
/// the dotted path becomes the callee name (`classList.add`).
fn postfix(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut expr) = primary(input)?;
    loop {
        let (rest, field) = opt(preceded(
            ws(char('.')),
            context("field name", cut(identifier)),
        ))(input)?;
        if let Some(field) = field {
            expr = Expr::Member {
                object: Box::new(expr),
                field: field.to_string(),
            };
            input = rest;
            continue;
        }

        let (rest, args) = opt(preceded(multispace0, arguments))(input)?;
        let Some(args) = args else {
            return Ok((input, expr));
        };
        let Some(callee) = expr.as_path() else {
            return Err(nom::Err::Failure(VerboseError {
                errors: vec![(input.trim_start(), VerboseErrorKind::Context("a named function"))],
            }));
        };
        expr = Expr::Call { callee, args };
        input = rest;
    }
}

fn arguments(input: &str) -> PResult<'_, Vec<Expr>> {
    delimited(
        char('('),
        separated_list0(char(','), ws(conditional)),
        context("closing parenthesis", cut(preceded(multispace0, char(')')))),
    )(input)
}

fn primary(input: &str) -> PResult<'_, Expr> {
    alt((
        map(number, |n| Expr::Literal(Value::Number(n))),
        map(string_literal, |s| Expr::Literal(Value::String(s))),
        delimited(
            char('('),
            ws(conditional),
            context("closing parenthesis", cut(char(')'))),
        ),
        map(identifier, keyword_or_variable),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. })),
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn test_operators_are_left_associative() {
        let expr = parse("10 - 4 - 3").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Sub,
                left,
                right,
            } => {
                assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
                assert_eq!(*right, Expr::Literal(Value::Number(3.0)));
            }
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn test_longest_operator_wins() {
        assert!(matches!(
            parse("a === b").unwrap(),
            Expr::Binary { op: BinaryOp::StrictEqual, .. }
        ));
        assert!(matches!(
            parse("a!=b").unwrap(),
            Expr::Binary { op: BinaryOp::NotEqual, .. }
        ));
        assert!(matches!(
            parse("n+k>=4 && ok").unwrap(),
            Expr::Logical { op: LogicalOp::And, .. }
        ));
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("1.5e3").unwrap(), Expr::Literal(Value::Number(1500.0)));
        assert_eq!(parse(".5").unwrap(), Expr::Literal(Value::Number(0.5)));
        assert_eq!(parse(r#""a\"b""#).unwrap(), Expr::Literal(Value::from("a\"b")));
        assert_eq!(parse("''").unwrap(), Expr::Literal(Value::from("")));
        assert_eq!(parse("undefined").unwrap(), Expr::Literal(Value::Null));
        assert_eq!(parse("trueish").unwrap(), Expr::Variable("trueish".into()));
    }

    #[test]
    fn test_member_and_call() {
        assert_eq!(
            parse("classList.add('x')").unwrap(),
            Expr::Call {
                callee: "classList.add".to_string(),
                args: vec![Expr::Literal(Value::from("x"))],
            }
        );
        assert_eq!(
            parse("text( )").unwrap(),
            Expr::Call {
                callee: "text".to_string(),
                args: vec![],
            }
        );
        assert!(matches!(parse("a.b").unwrap(), Expr::Member { .. }));
    }

    #[test]
    fn test_ternary_is_right_associative() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        match expr {
            Expr::Conditional { alternate, .. } => {
                assert!(matches!(*alternate, Expr::Conditional { .. }))
            }
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse("1 +").is_err());
        assert!(parse("(1").is_err());
        assert!(parse("1 2").is_err());
        assert!(parse("(1)(2)").is_err());
        assert!(parse("").is_err());
        assert!(parse("'open").is_err());
        assert!(parse("f(1,").is_err());
        assert!(parse("a ? b").is_err());
    }

    #[test]
    fn test_error_offset_points_at_problem() {
        match parse("a # b").unwrap_err() {
            EvalError::Syntax { offset, message, .. } => {
                assert_eq!(offset, 2);
                assert!(message.contains("'#'"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        match parse("(1 + 2").unwrap_err() {
            EvalError::Syntax { message, .. } => {
                assert!(message.contains("closing parenthesis"), "{}", message)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
