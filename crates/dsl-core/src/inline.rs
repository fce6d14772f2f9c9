//! Recognises the inline comparison and arithmetic shorthands inside plain
//! strings, e.g. `"$.count >= 3"` or `"$.total * 2"`.
//!
//! Programs rely on these shapes to tell expressions apart from ordinary
//! literals, so the accepted shapes are deliberately narrow:
//!
//! - comparison: `left OP right`, `OP` one of `<= >= < >`. `left` is the
//!   shortest space-free run that makes the rest match; both operands start
//!   with `-`, `$`, `~` or an ASCII digit; spaces around `OP` are optional.
//! - arithmetic: `left OP right`, `OP` one of `+ - * / %`, at least one space
//!   on each side of `OP`, no brackets anywhere, `left` space-free.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Le,
    Ge,
    Lt,
    Gt,
}

impl CompareOp {
    // Two-character operators first so `<=` is not read as `<` followed by `=`.
    const ALL: [CompareOp; 4] = [CompareOp::Le, CompareOp::Ge, CompareOp::Lt, CompareOp::Gt];

    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
        }
    }

    pub fn parse(s: &str) -> Option<CompareOp> {
        CompareOp::ALL.into_iter().find(|op| op.as_str() == s)
    }

    pub fn holds(self, left: i64, right: i64) -> bool {
        match self {
            CompareOp::Le => left <= right,
            CompareOp::Ge => left >= right,
            CompareOp::Lt => left < right,
            CompareOp::Gt => left > right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    Mod,
}

impl ArithOp {
    fn from_char(c: char) -> Option<ArithOp> {
        match c {
            '+' => Some(ArithOp::Plus),
            '-' => Some(ArithOp::Minus),
            '*' => Some(ArithOp::Multiply),
            '/' => Some(ArithOp::Divide),
            '%' => Some(ArithOp::Mod),
            _ => None,
        }
    }

    /// Name of the operator the shorthand is rewritten to.
    pub fn operator_name(self) -> &'static str {
        match self {
            ArithOp::Plus => "plus",
            ArithOp::Minus => "minus",
            ArithOp::Multiply => "multiply",
            ArithOp::Divide => "divide",
            ArithOp::Mod => "mod",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison<'a> {
    pub op: CompareOp,
    pub left: &'a str,
    pub right: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arithmetic<'a> {
    pub op: ArithOp,
    pub left: &'a str,
    pub right: &'a str,
}

fn is_operand_start(c: char) -> bool {
    matches!(c, '-' | '$' | '~') || c.is_ascii_digit()
}

pub fn comparison(s: &str) -> Option<Comparison<'_>> {
    let first = s.chars().next()?;
    if !is_operand_start(first) {
        return None;
    }
    let ends = s
        .char_indices()
        .map(|(i, _)| i)
        .skip(1)
        .chain(std::iter::once(s.len()));
    for end in ends {
        let left = &s[..end];
        if left.ends_with(' ') {
            break;
        }
        let rest = s[end..].trim_start_matches(' ');
        for op in CompareOp::ALL {
            let Some(after) = rest.strip_prefix(op.as_str()) else {
                continue;
            };
            let right = after.trim_start_matches(' ');
            let starts_ok = right.chars().next().is_some_and(is_operand_start);
            if starts_ok && !right.contains('\n') {
                return Some(Comparison { op, left, right });
            }
        }
    }
    None
}

pub fn arithmetic(s: &str) -> Option<Arithmetic<'_>> {
    if s.contains(['[', ']']) {
        return None;
    }
    let space = s.find(' ')?;
    let left = &s[..space];
    if left.is_empty() {
        return None;
    }
    let rest = s[space..].trim_start_matches(' ');
    let op = ArithOp::from_char(rest.chars().next()?)?;
    let after = &rest[1..];
    if !after.starts_with(' ') {
        return None;
    }
    let mut right = after.trim_start_matches(' ');
    if right.is_empty() {
        // Only spaces follow the operator: the last one is the operand.
        if after.len() < 2 {
            return None;
        }
        right = &after[after.len() - 1..];
    }
    Some(Arithmetic { op, left, right })
}
