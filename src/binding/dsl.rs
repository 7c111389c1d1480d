// ABOUTME: Parser for the call-like binding DSL, e.g. classRegex('iedib-(.*)-border', '.box')
// ABOUTME: Shares the expression literal parsers; arguments are string, number and boolean literals

use std::fmt;

use nom::{
    branch::alt,
    character::complete::{char, multispace0},
    combinator::{all_consuming, cut, map, map_opt, opt},
    error::context,
    multi::separated_list0,
    sequence::{delimited, pair, preceded, terminated},
};

use super::error::{BindingError, Result};
use crate::expr::parser::{describe_error, identifier, number, string_literal, ws, PResult};
use crate::value::CastKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    HasClass,
    NotHasClass,
    ClassRegex,
    Attr,
    AttrBs,
    HasAttr,
    HasAttrBs,
    NotHasAttr,
    AttrRegex,
    HasStyle,
    NotHasStyle,
    StyleRegex,
}

impl BindingKind {
    pub const ALL: [BindingKind; 12] = [
        BindingKind::HasClass,
        BindingKind::NotHasClass,
        BindingKind::ClassRegex,
        BindingKind::Attr,
        BindingKind::AttrBs,
        BindingKind::HasAttr,
        BindingKind::HasAttrBs,
        BindingKind::NotHasAttr,
        BindingKind::AttrRegex,
        BindingKind::HasStyle,
        BindingKind::NotHasStyle,
        BindingKind::StyleRegex,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BindingKind::HasClass => "hasClass",
            BindingKind::NotHasClass => "notHasClass",
            BindingKind::ClassRegex => "classRegex",
            BindingKind::Attr => "attr",
            BindingKind::AttrBs => "attrBS",
            BindingKind::HasAttr => "hasAttr",
            BindingKind::HasAttrBs => "hasAttrBS",
            BindingKind::NotHasAttr => "notHasAttr",
            BindingKind::AttrRegex => "attrRegex",
            BindingKind::HasStyle => "hasStyle",
            BindingKind::NotHasStyle => "notHasStyle",
            BindingKind::StyleRegex => "styleRegex",
        }
    }

    /// Kinds whose value is a presence flag rather than a cast value
    pub fn is_presence(&self) -> bool {
        matches!(
            self,
            BindingKind::HasClass
                | BindingKind::NotHasClass
                | BindingKind::HasAttr
                | BindingKind::HasAttrBs
                | BindingKind::NotHasAttr
                | BindingKind::HasStyle
                | BindingKind::NotHasStyle
        )
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DslArg {
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
}

/// A parsed `kind(arg, ...)` binding descriptor.
///
/// Positional arguments: primary selector argument, descendant query,
/// cast type, then the negate flag or Bootstrap version. Presence kinds may
/// also put the negate flag directly in the third position.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingCall {
    pub kind: BindingKind,
    pub args: Vec<DslArg>,
}

impl BindingCall {
    pub fn primary(&self) -> Result<String> {
        match self.args.first() {
            Some(DslArg::Str(s)) if !s.is_empty() => Ok(s.clone()),
            Some(DslArg::Number(n)) => Ok(crate::value::format_number(*n)),
            _ => Err(BindingError::MissingArgument {
                kind: self.kind.to_string(),
                index: 0,
                expected: "non-empty string".to_string(),
            }),
        }
    }

    pub fn query(&self) -> Option<String> {
        match self.args.get(1) {
            Some(DslArg::Str(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    pub fn cast(&self) -> Option<CastKind> {
        match self.args.get(2) {
            Some(DslArg::Str(s)) => CastKind::parse_optional(Some(s.as_str())),
            _ => None,
        }
    }

    /// First boolean after the query argument
    pub fn negate(&self) -> bool {
        self.args
            .iter()
            .skip(2)
            .find_map(|arg| match arg {
                DslArg::Bool(b) => Some(*b),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Bootstrap generation from the first number after the query argument
    /// (or a numeric string in the version position). Only 4 and 5 are
    /// accepted.
    pub fn bs_version(&self) -> Result<Option<u8>> {
        let requested = self
            .args
            .iter()
            .skip(2)
            .find_map(|arg| match arg {
                DslArg::Number(n) => Some(*n),
                _ => None,
            })
            .or_else(|| match self.args.get(3) {
                Some(DslArg::Str(s)) => s.trim().parse::<f64>().ok(),
                _ => None,
            });

        match requested {
            None => Ok(None),
            Some(n) if SUPPORTED_BS_VERSIONS.iter().any(|v| f64::from(*v) == n) => Ok(Some(n as u8)),
            Some(n) => Err(BindingError::InvalidArgument {
                kind: self.kind.to_string(),
                reason: format!(
                    "Bootstrap version must be one of {:?}, got {}",
                    SUPPORTED_BS_VERSIONS,
                    crate::value::format_number(n)
                ),
            }),
        }
    }
}

pub const SUPPORTED_BS_VERSIONS: [u8; 2] = [4, 5];

pub fn parse_binding_call(text: &str) -> Result<BindingCall> {
    let (name, args) = match all_consuming(ws(call))(text) {
        Ok((_, parsed)) => parsed,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let (offset, message) = describe_error(text, &e);
            return Err(BindingError::Parse {
                spec: text.to_string(),
                message: format!("{} at offset {}", message, offset),
            });
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(BindingError::Parse {
                spec: text.to_string(),
                message: "unexpected end of input".to_string(),
            })
        }
    };

    let kind = BindingKind::from_name(name).ok_or_else(|| BindingError::UnknownKind(name.to_string()))?;
    Ok(BindingCall { kind, args })
}

fn call(input: &str) -> PResult<'_, (&str, Vec<DslArg>)> {
    pair(
        terminated(identifier, multispace0),
        delimited(
            context("'('", char('(')),
            separated_list0(char(','), ws(argument)),
            context("',' or ')'", cut(preceded(multispace0, char(')')))),
        ),
    )(input)
}

fn argument(input: &str) -> PResult<'_, DslArg> {
    alt((
        map(string_literal, DslArg::Str),
        map(pair(opt(char('-')), number), |(sign, n)| {
            DslArg::Number(if sign.is_some() { -n } else { n })
        }),
        map_opt(identifier, |word| match word {
            "true" => Some(DslArg::Bool(true)),
            "false" => Some(DslArg::Bool(false)),
            "null" | "undefined" => Some(DslArg::Null),
            _ => None,
        }),
    ))(input)
}
