//! SQL templates with `${...}` references.
//!
//! Field, metric, join and filter SQL may embed three kinds of reference:
//!
//! | Token           | Meaning                                   |
//! |-----------------|-------------------------------------------|
//! | `${TABLE}`      | the owning table, as a quoted identifier  |
//! | `${field}`      | a field of the owning table               |
//! | `${table.field}`| a field of another table in the explore   |
//!
//! Names are `[A-Za-z0-9_]+`. A `$` not followed by `{` is plain text.
//!
//! [`Template::parse`] splits the SQL into [`Segment`]s once;
//! [`Template::render`] substitutes every reference through a resolver and
//! returns the resolved SQL together with the tables the resolver reported.

use std::fmt;

/// Placeholder name for the owning table.
pub const TABLE_REFERENCE: &str = "TABLE";

/// Error raised for a malformed template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unterminated reference at position {position} in \"{sql}\"")]
    Unterminated { sql: String, position: usize },

    #[error("invalid reference \"${{{reference}}}\" in \"{sql}\"")]
    InvalidReference { sql: String, reference: String },
}

/// A `${field}` or `${table.field}` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef<'a> {
    pub table: Option<&'a str>,
    pub name: &'a str,
}

impl<'a> FieldRef<'a> {
    /// Owning table of the reference, `current` when unqualified.
    pub fn table_or(&self, current: &'a str) -> &'a str {
        self.table.unwrap_or(current)
    }
}

impl fmt::Display for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table {
            Some(table) => write!(f, "${{{}.{}}}", table, self.name),
            None => write!(f, "${{{}}}", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Table,
    Field(FieldRef<'a>),
}

/// A parsed SQL template borrowing from its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

fn is_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

impl<'a> Template<'a> {
    pub fn parse(sql: &'a str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = sql;
        let mut offset = 0;

        while let Some(start) = rest.find("${") {
            if start > 0 {
                segments.push(Segment::Text(&rest[..start]));
            }
            let body = &rest[start + 2..];
            let Some(end) = body.find('}') else {
                return Err(TemplateError::Unterminated {
                    sql: sql.to_string(),
                    position: offset + start,
                });
            };
            let reference = &body[..end];
            segments.push(Self::parse_reference(sql, reference)?);

            let consumed = start + 2 + end + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest));
        }

        Ok(Self { segments })
    }

    fn parse_reference(sql: &str, reference: &'a str) -> Result<Segment<'a>, TemplateError> {
        let invalid = || TemplateError::InvalidReference {
            sql: sql.to_string(),
            reference: reference.to_string(),
        };
        if reference == TABLE_REFERENCE {
            return Ok(Segment::Table);
        }
        match reference.split_once('.') {
            None if is_name(reference) => Ok(Segment::Field(FieldRef {
                table: None,
                name: reference,
            })),
            Some((table, name)) if is_name(table) && is_name(name) => {
                Ok(Segment::Field(FieldRef {
                    table: Some(table),
                    name,
                }))
            }
            _ => Err(invalid()),
        }
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Every field reference, in order of appearance.
    pub fn field_refs(&self) -> impl Iterator<Item = FieldRef<'a>> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(field) => Some(*field),
            _ => None,
        })
    }

    /// Substitute every reference.
    ///
    /// `resolve` returns the SQL for a reference plus the tables it reads
    /// from. Referenced tables are collected without duplicates in order of
    /// first appearance.
    pub fn render<E>(
        &self,
        mut resolve: impl FnMut(Segment<'a>) -> Result<Rendered, E>,
    ) -> Result<Rendered, E> {
        let mut out = Rendered::default();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.sql.push_str(text),
                reference => {
                    let rendered = resolve(*reference)?;
                    out.sql.push_str(&rendered.sql);
                    out.add_tables(rendered.tables);
                }
            }
        }
        Ok(out)
    }
}

/// Resolved SQL plus the tables it reads from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub sql: String,
    pub tables: Vec<String>,
}

impl Rendered {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            tables: Vec::new(),
        }
    }

    pub fn with_tables(mut self, tables: impl IntoIterator<Item = String>) -> Self {
        self.add_tables(tables);
        self
    }

    pub fn add_tables(&mut self, tables: impl IntoIterator<Item = String>) {
        for table in tables {
            if !self.tables.contains(&table) {
                self.tables.push(table);
            }
        }
    }
}
