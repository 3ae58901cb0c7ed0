//! Segment routes: `/album[/:action[/:id]]`.
//!
//! A pattern is made of literal text, `:name` placeholders and optional
//! groups in square brackets, which may nest. Each placeholder matches one
//! path segment unless a constraint regex is given for it.

use std::collections::HashMap;

use regex::Regex;

use super::Route;
use crate::error::{RouterError, RouterResult};

const DEFAULT_CONSTRAINT: &str = "[^/]+";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param(String),
    Optional(Vec<Part>),
}

/// A route compiled from a segment pattern.
#[derive(Debug, Clone)]
pub struct SegmentRoute {
    name: String,
    parts: Vec<Part>,
    regex: Regex,
    param_names: Vec<String>,
    defaults: HashMap<String, String>,
}

impl SegmentRoute {
    /// Compiles `pattern` with per-parameter `constraints` and `defaults`.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        constraints: &HashMap<String, String>,
        defaults: HashMap<String, String>,
    ) -> RouterResult<Self> {
        let name = name.into();
        let parts = parse(&name, pattern)?;

        let mut param_names = Vec::new();
        let mut source = String::from("^");
        build_regex(&parts, constraints, &mut source, &mut param_names);
        source.push('$');

        let regex = Regex::new(&source).map_err(|err| RouterError::InvalidPattern {
            route: name.clone(),
            reason: err.to_string(),
        })?;

        Ok(Self {
            name,
            parts,
            regex,
            param_names,
            defaults,
        })
    }
}

impl Route for SegmentRoute {
    fn name(&self) -> &str {
        &self.name
    }

    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;
        let mut params = self.defaults.clone();
        for name in &self.param_names {
            if let Some(value) = captures.name(name) {
                params.insert(name.clone(), value.as_str().to_string());
            }
        }
        Some(params)
    }

    fn assemble(&self, params: &HashMap<String, String>) -> RouterResult<String> {
        let assembled = assemble_parts(self, &self.parts, params, false)?;
        Ok(assembled.map(|(path, _)| path).unwrap_or_default())
    }
}

// ─── Parsing ───

fn parse(route: &str, pattern: &str) -> RouterResult<Vec<Part>> {
    let invalid = |reason: &str| RouterError::InvalidPattern {
        route: route.to_string(),
        reason: reason.to_string(),
    };

    let mut stack: Vec<Vec<Part>> = vec![Vec::new()];
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            ':' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(invalid("empty parameter name"));
                }
                flush_literal(&mut literal, &mut stack);
                push_part(&mut stack, Part::Param(name));
            }
            '[' => {
                flush_literal(&mut literal, &mut stack);
                stack.push(Vec::new());
            }
            ']' => {
                flush_literal(&mut literal, &mut stack);
                if stack.len() < 2 {
                    return Err(invalid("unbalanced ']'"));
                }
                let group = stack.pop().unwrap_or_default();
                push_part(&mut stack, Part::Optional(group));
            }
            other => literal.push(other),
        }
    }

    flush_literal(&mut literal, &mut stack);
    if stack.len() != 1 {
        return Err(invalid("unclosed '['"));
    }
    Ok(stack.pop().unwrap_or_default())
}

fn flush_literal(literal: &mut String, stack: &mut [Vec<Part>]) {
    if !literal.is_empty() {
        push_part(stack, Part::Literal(std::mem::take(literal)));
    }
}

fn push_part(stack: &mut [Vec<Part>], part: Part) {
    if let Some(current) = stack.last_mut() {
        current.push(part);
    }
}

fn build_regex(
    parts: &[Part],
    constraints: &HashMap<String, String>,
    source: &mut String,
    names: &mut Vec<String>,
) {
    for part in parts {
        match part {
            Part::Literal(text) => source.push_str(&regex::escape(text)),
            Part::Param(name) => {
                let constraint = constraints
                    .get(name)
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_CONSTRAINT);
                source.push_str(&format!("(?P<{name}>{constraint})"));
                names.push(name.clone());
            }
            Part::Optional(inner) => {
                source.push_str("(?:");
                build_regex(inner, constraints, source, names);
                source.push_str(")?");
            }
        }
    }
}

// ─── Assembly ───

/// Returns the assembled text and whether any parameter in it was given
/// explicitly with a non-default value. `None` means an optional group could
/// not be filled and is dropped.
fn assemble_parts(
    route: &SegmentRoute,
    parts: &[Part],
    params: &HashMap<String, String>,
    optional: bool,
) -> RouterResult<Option<(String, bool)>> {
    let mut path = String::new();
    let mut explicit = false;

    for part in parts {
        match part {
            Part::Literal(text) => path.push_str(text),
            Part::Param(name) => {
                let given = params.get(name);
                let Some(value) = given.or_else(|| route.defaults.get(name)) else {
                    if optional {
                        return Ok(None);
                    }
                    return Err(RouterError::MissingParameter {
                        route: route.name.clone(),
                        parameter: name.clone(),
                    });
                };
                if given.is_some() && route.defaults.get(name) != given {
                    explicit = true;
                }
                path.push_str(value);
            }
            Part::Optional(inner) => {
                if let Some((text, true)) = assemble_parts(route, inner, params, true)? {
                    path.push_str(&text);
                    explicit = true;
                }
            }
        }
    }

    Ok(Some((path, explicit)))
}
