//! S-expression reader with byte span tracking.

use super::CodecError;

/// Byte-level source span for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A parsed s-expression.
#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    Atom { text: String, span: Span },
    List { items: Vec<SExpr>, span: Span },
}

impl SExpr {
    pub fn span(&self) -> Span {
        match self {
            SExpr::Atom { span, .. } | SExpr::List { span, .. } => *span,
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExpr::Atom { text, .. } => Some(text),
            SExpr::List { .. } => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExpr]> {
        match self {
            SExpr::List { items, .. } => Some(items),
            SExpr::Atom { .. } => None,
        }
    }

    /// The leading atom of a list, e.g. `and` in `(and …)`.
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_atom()
    }
}

impl std::fmt::Display for SExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SExpr::Atom { text, .. } => f.write_str(text),
            SExpr::List { items, .. } => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Drop `;` comments up to the end of each line.
pub fn remove_comments(text: &str) -> String {
    text.lines()
        .map(|line| match line.find(';') {
            Some(pos) => &line[..pos],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse every top-level form in `text`.
pub fn parse(text: &str) -> Result<Vec<SExpr>, CodecError> {
    let mut stack: Vec<(usize, Vec<SExpr>)> = Vec::new();
    let mut top = Vec::new();
    let mut atom_start: Option<usize> = None;

    let flush = |start: &mut Option<usize>, end: usize, out: &mut Vec<SExpr>| {
        if let Some(s) = start.take() {
            out.push(SExpr::Atom {
                text: text[s..end].to_string(),
                span: Span { start: s, end },
            });
        }
    };

    for (pos, ch) in text.char_indices() {
        match ch {
            '(' | ')' => {
                let out = match stack.last_mut() {
                    Some((_, items)) => items,
                    None => &mut top,
                };
                flush(&mut atom_start, pos, out);
                if ch == '(' {
                    stack.push((pos, Vec::new()));
                    continue;
                }
                let Some((start, items)) = stack.pop() else {
                    return Err(CodecError::Syntax {
                        offset: pos,
                        message: "unexpected `)`".into(),
                    });
                };
                let list = SExpr::List {
                    items,
                    span: Span { start, end: pos + 1 },
                };
                match stack.last_mut() {
                    Some((_, parent)) => parent.push(list),
                    None => top.push(list),
                }
            }
            c if c.is_whitespace() => {
                let out = match stack.last_mut() {
                    Some((_, items)) => items,
                    None => &mut top,
                };
                flush(&mut atom_start, pos, out);
            }
            _ => {
                if atom_start.is_none() {
                    atom_start = Some(pos);
                }
            }
        }
    }

    let out = match stack.last_mut() {
        Some((_, items)) => items,
        None => &mut top,
    };
    flush(&mut atom_start, text.len(), out);

    if let Some((start, _)) = stack.last() {
        return Err(CodecError::Syntax {
            offset: *start,
            message: "unclosed `(`".into(),
        });
    }
    Ok(top)
}

/// Parse exactly one form.
pub fn parse_one(text: &str) -> Result<SExpr, CodecError> {
    let mut forms = parse(text)?;
    match forms.len() {
        1 => Ok(forms.remove(0)),
        0 => Err(CodecError::Structure {
            message: "expected one expression, found none".into(),
        }),
        n => Err(CodecError::Structure {
            message: format!("expected one expression, found {n}"),
        }),
    }
}
