//! Parser for the field declaration mini-language.
//!
//! One field per line, `name: Kind(key=value, ...)`:
//!
//! ```text
//! id: IntegerField(primary_key=True)
//! name: CharField(max_length=100, words_count=3)
//! prices: FloatField(min_value=1, max_value=1000)
//! menu_id: ForeignKey(to=Menu)
//! tags: ManyToManyField(to='Tag')
//! ```
//!
//! Blank lines and `#` comments are skipped; anything else that does not
//! match the grammar is rejected.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::field::{
    CharField, DEFAULT_MAX_LENGTH, FieldDescriptor, FloatField, ForeignKeyField, IntegerField,
};
use crate::schema::{Column, ManyToMany, is_identifier};

/// Columns and relations read from a declaration, in line order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFields {
    pub columns: Vec<Column>,
    pub many_to_many: Vec<ManyToMany>,
}

fn field_line() -> &'static Regex {
    static FIELD_LINE: OnceLock<Regex> = OnceLock::new();
    FIELD_LINE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*:\s*([A-Za-z_][A-Za-z0-9_]*)\s*\((.*)\)$")
            .expect("field line pattern compiles")
    })
}

/// Parse every declaration line of `entity`.
pub fn parse_fields(entity: &str, declaration: &str) -> Result<ParsedFields> {
    let mut parsed = ParsedFields::default();

    for (index, raw) in declaration.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let ctx = LineContext {
            entity,
            number: index + 1,
            text: line,
        };
        let captures = field_line()
            .captures(line)
            .ok_or_else(|| ctx.error("expected `name: Kind(arguments)`"))?;
        let name = captures[1].to_string();
        let kind = &captures[2];
        let mut args = Arguments::parse(&ctx, &captures[3])?;

        match kind {
            "IntegerField" => {
                let field = IntegerField {
                    primary_key: args.flag("primary_key")?,
                    auto_increment: args.flag("auto_increment")?,
                    min_value: args.integer("min_value")?,
                    max_value: args.integer("max_value")?,
                };
                args.finish()?;
                parsed.columns.push(Column {
                    name,
                    field: FieldDescriptor::Integer(field),
                });
            }
            "CharField" => {
                let field = CharField {
                    primary_key: args.flag("primary_key")?,
                    max_length: args.count("max_length")?.unwrap_or(DEFAULT_MAX_LENGTH),
                    words_count: args.count("words_count")?,
                };
                args.finish()?;
                parsed.columns.push(Column {
                    name,
                    field: FieldDescriptor::Char(field),
                });
            }
            "FloatField" => {
                let field = FloatField {
                    primary_key: args.flag("primary_key")?,
                    min_value: args.number("min_value")?,
                    max_value: args.number("max_value")?,
                };
                args.finish()?;
                parsed.columns.push(Column {
                    name,
                    field: FieldDescriptor::Float(field),
                });
            }
            "ForeignKey" => {
                let to = args.target()?;
                args.finish()?;
                parsed.columns.push(Column {
                    name,
                    field: FieldDescriptor::ForeignKey(ForeignKeyField { to }),
                });
            }
            "ManyToManyField" => {
                let to = args.target()?;
                args.finish()?;
                parsed.many_to_many.push(ManyToMany { field: name, to });
            }
            other => return Err(ctx.error(format!("unknown field kind `{other}`"))),
        }
    }

    Ok(parsed)
}

struct LineContext<'a> {
    entity: &'a str,
    number: usize,
    text: &'a str,
}

impl LineContext<'_> {
    fn error(&self, message: impl AsRef<str>) -> Error {
        Error::schema(
            self.entity,
            format!(
                "line {}: {} in `{}`",
                self.number,
                message.as_ref(),
                self.text
            ),
        )
    }
}

/// `key=value` pairs of one declaration; every pair must be consumed.
struct Arguments<'a> {
    ctx: &'a LineContext<'a>,
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Arguments<'a> {
    fn parse(ctx: &'a LineContext<'a>, raw: &'a str) -> Result<Self> {
        let mut pairs: Vec<(&str, &str)> = Vec::new();

        for item in raw.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| ctx.error(format!("argument `{item}` is not `key=value`")))?;
            let key = key.trim();
            if pairs.iter().any(|(seen, _)| *seen == key) {
                return Err(ctx.error(format!("duplicate argument `{key}`")));
            }
            pairs.push((key, value.trim()));
        }

        Ok(Self { ctx, pairs })
    }

    fn take(&mut self, key: &str) -> Option<&'a str> {
        let position = self.pairs.iter().position(|(name, _)| *name == key)?;
        Some(self.pairs.remove(position).1)
    }

    fn flag(&mut self, key: &str) -> Result<bool> {
        match self.take(key) {
            None => Ok(false),
            Some("True" | "true") => Ok(true),
            Some("False" | "false") => Ok(false),
            Some(other) => Err(self.invalid(key, other, "a boolean")),
        }
    }

    fn integer(&mut self, key: &str) -> Result<Option<i64>> {
        self.take(key)
            .map(|value| {
                value
                    .parse::<i64>()
                    .map_err(|_| self.invalid(key, value, "an integer"))
            })
            .transpose()
    }

    fn count(&mut self, key: &str) -> Result<Option<usize>> {
        self.take(key)
            .map(|value| {
                value
                    .parse::<usize>()
                    .map_err(|_| self.invalid(key, value, "a non-negative integer"))
            })
            .transpose()
    }

    fn number(&mut self, key: &str) -> Result<Option<f64>> {
        self.take(key)
            .map(|value| {
                value
                    .parse::<f64>()
                    .ok()
                    .filter(|number| number.is_finite())
                    .ok_or_else(|| self.invalid(key, value, "a number"))
            })
            .transpose()
    }

    /// The required `to=Entity` argument, quotes stripped.
    fn target(&mut self) -> Result<String> {
        let raw = self
            .take("to")
            .ok_or_else(|| self.ctx.error("missing `to` argument"))?;
        let target = unquote(raw);
        if !is_identifier(target) {
            return Err(self.invalid("to", raw, "an entity name"));
        }
        Ok(target.to_string())
    }

    fn finish(self) -> Result<()> {
        match self.pairs.first() {
            Some((key, _)) => Err(self.ctx.error(format!("unknown argument `{key}`"))),
            None => Ok(()),
        }
    }

    fn invalid(&self, key: &str, value: &str, expected: &str) -> Error {
        self.ctx
            .error(format!("`{key}` expects {expected}, got `{value}`"))
    }
}

fn unquote(value: &str) -> &str {
    ['\'', '"']
        .iter()
        .find_map(|quote| {
            value
                .strip_prefix(*quote)
                .and_then(|rest| rest.strip_suffix(*quote))
        })
        .unwrap_or(value)
}
