//! PHPDoc comments: description plus `@param`, `@return` and `@var` tags.

use crate::symbol::{TypeComposite, TypeName};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    pub description: Option<String>,
    /// `(name without $, types)` per `@param`
    pub params: Vec<(String, TypeComposite)>,
    pub returns: TypeComposite,
    /// `@var Type [$name]`
    pub var: Option<(Option<String>, TypeComposite)>,
}

impl DocBlock {
    pub fn is_doc_comment(text: &str) -> bool {
        text.starts_with("/**") && text != "/**/"
    }

    pub fn parse(text: &str) -> Self {
        let mut doc = DocBlock::default();
        let mut description = Vec::new();
        let mut in_tags = false;

        for line in clean_lines(text) {
            if let Some(tag_line) = line.strip_prefix('@') {
                in_tags = true;
                doc.apply_tag(tag_line);
            } else if !in_tags {
                description.push(line);
            }
        }

        let description = description.join("\n").trim().to_string();
        if !description.is_empty() {
            doc.description = Some(description);
        }
        doc
    }

    fn apply_tag(&mut self, line: &str) {
        let mut words = line.split_whitespace();
        let Some(tag) = words.next() else {
            return;
        };
        let rest: Vec<&str> = words.collect();

        match tag {
            "param" => {
                let (types, name) = match rest.as_slice() {
                    [name, ..] if name.starts_with('$') => (TypeComposite::new(), *name),
                    [ty, name, ..] if name.trim_start_matches('&').starts_with('$') => {
                        (parse_types(ty), *name)
                    }
                    _ => return,
                };
                let name = name.trim_start_matches('&').trim_start_matches("...");
                let name = name.trim_start_matches('$').trim_end_matches(',');
                self.params.push((name.to_string(), types));
            }
            "return" => {
                if let Some(ty) = rest.first() {
                    self.returns.merge(&parse_types(ty));
                }
            }
            "var" => {
                let (types, name) = match rest.as_slice() {
                    [name, ty, ..] if name.starts_with('$') => (parse_types(ty), Some(*name)),
                    [ty, name, ..] if name.starts_with('$') => (parse_types(ty), Some(*name)),
                    [ty, ..] => (parse_types(ty), None),
                    [] => return,
                };
                self.var = Some((name.map(str::to_string), types));
            }
            _ => {}
        }
    }

    /// `@param` types for `name` (without `$`).
    pub fn param_types(&self, name: &str) -> Option<&TypeComposite> {
        self.params
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, types)| types)
    }
}

fn clean_lines(text: &str) -> impl Iterator<Item = &str> {
    let body = text.trim();
    let body = body.strip_prefix("/**").unwrap_or(body);
    let body = body.strip_suffix("*/").unwrap_or(body);
    body.lines().map(|line| {
        let line = line.trim();
        line.strip_prefix('*').unwrap_or(line).trim()
    })
}

/// `?Foo|Bar[]|array<int, X>` -> `Foo|null|array`
pub fn parse_types(text: &str) -> TypeComposite {
    let mut types = TypeComposite::new();
    for part in split_union(text) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (part, nullable) = match part.strip_prefix('?') {
            Some(rest) => (rest, true),
            None => (part, false),
        };
        let name = if part.ends_with("[]") || part.contains('<') || part.contains('{') {
            "array"
        } else {
            part.trim_matches(|c: char| c == '(' || c == ')')
        };
        if !name.is_empty() {
            types.push(TypeName::new(name));
        }
        if nullable {
            types.push(TypeName::new("null"));
        }
    }
    types
}

/// Splits on `|` outside of `<...>` and `{...}`.
fn split_union(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' | '{' => depth += 1,
            '>' | '}' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
