// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! The relational filter language of the entity store.
//!
//! Filters render to the store's query syntax (`field==value`,
//! `field=='*wild*'`, `field=in=(a,b)`, `and`/`or`) and can also be
//! evaluated against a record's JSON form, which is what the in-memory
//! store does.

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `field==value`; `*` in the value matches any run of characters.
    Eq { field: String, value: String },
    /// `field=in=(a,b,...)`
    In { field: String, values: Vec<String> },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl fmt::Display) -> Filter {
        Filter::Eq {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Filter
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn and(self, other: Filter) -> Filter {
        match self {
            Filter::And(mut parts) => {
                parts.push(other);
                Filter::And(parts)
            }
            this => Filter::And(vec![this, other]),
        }
    }

    pub fn or(self, other: Filter) -> Filter {
        match self {
            Filter::Or(mut parts) => {
                parts.push(other);
                Filter::Or(parts)
            }
            this => Filter::Or(vec![this, other]),
        }
    }

    /// Evaluates the filter against the JSON form of a record.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Filter::Eq { field, value } => {
                field_values(record, field).any(|candidate| wildcard_match(value, &candidate))
            }
            Filter::In { field, values } => {
                field_values(record, field).any(|candidate| values.contains(&candidate))
            }
            Filter::And(parts) => parts.iter().all(|f| f.matches(record)),
            Filter::Or(parts) => parts.iter().any(|f| f.matches(record)),
        }
    }
}

/// Scalar values found at a dotted path; arrays contribute every element.
fn field_values<'a>(record: &'a Value, path: &str) -> impl Iterator<Item = String> + 'a {
    let mut current = vec![record];
    for segment in path.split('.') {
        current = current
            .into_iter()
            .filter_map(|v| v.get(segment))
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .collect();
    }
    current.into_iter().filter_map(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn wildcard_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();
    let (mut p, mut c) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while c < candidate.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, c));
            p += 1;
        } else if p < pattern.len() && pattern[p] == candidate[c] {
            p += 1;
            c += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            c = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&ch| ch == '*')
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '/' | '@'));
    if plain {
        f.write_str(value)
    } else {
        write!(f, "'{}'", value.replace('\'', "\\'"))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Eq { field, value } => {
                write!(f, "{field}==")?;
                write_value(f, value)
            }
            Filter::In { field, values } => {
                write!(f, "{field}=in=(")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_value(f, value)?;
                }
                f.write_str(")")
            }
            Filter::And(parts) | Filter::Or(parts) => {
                let joiner = if matches!(self, Filter::And(_)) { " and " } else { " or " };
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    if matches!(part, Filter::And(_) | Filter::Or(_)) {
                        write!(f, "({part})")?;
                    } else {
                        write!(f, "{part}")?;
                    }
                }
                Ok(())
            }
        }
    }
}
