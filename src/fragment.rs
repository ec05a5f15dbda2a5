//! Synthesized program structure, detached from any source positions. The printer turns
//! it into text.

/// An expression in a synthesized fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A single token-like piece of text: `0`, `""`, `nil`, `q.Name`, `uintptr(0)`.
    Atom(String),
    /// Source text carried over from the edited file. May span lines.
    Verbatim(String),
    /// `T{...}`, or `{...}` when the type is implied by the enclosing literal.
    Composite {
        ty: Option<String>,
        elems: Vec<Element>,
    },
    AddrOf(Box<Expr>),
    /// `make(T)`.
    Make(String),
    /// A function literal of the given signature whose body panics.
    FuncStub {
        sig: String,
    },
    Call {
        func: String,
        args: Vec<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: &'static str,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn atom(text: impl Into<String>) -> Self {
        Expr::Atom(text.into())
    }

    pub fn string_lit(s: &str) -> Self {
        Expr::Atom(format!("{s:?}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Value(Expr),
    Keyed { key: Expr, value: Expr },
}

impl Element {
    pub fn value(&self) -> &Expr {
        match self {
            Element::Value(v) | Element::Keyed { value: v, .. } => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    If { cond: Expr, body: Vec<Stmt> },
    Return(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Expr(Expr),
    Stmt(Stmt),
}

/// A synthesized node and an estimate of how many lines it takes once printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub node: Node,
    pub lines: usize,
}
