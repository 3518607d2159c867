use crate::token::Token;

/// Expression AST of the restricted evaluation language.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    Integer(i64),
    Float(f64),
    Str(String),
    Boolean(bool),
    NoneLit,
    Identifier(String),

    // Complex
    Property {
        target: String,
        name: String,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Prefix {
        op: Token,
        right: Box<Expr>,
    },
    Infix {
        op: Token,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Which value a failed right-hand-side evaluation falls back to after the
/// quoted-string and variable-lookup attempts are exhausted. `let` keeps the
/// raw text; `uhmath` gives up and stores nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignFallback {
    RawText,
    Nothing,
}

/// One arm of a `maybeif`/`ormaybe` chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub cond: String,
    pub body: Vec<Stmt>,
}

/// The `catch VAR:` clause of a try block.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub var: String,
    pub body: Vec<Stmt>,
}

/// A linked program statement. Sibling-position constructs (conditional
/// chains, try/catch pairs) are already resolved into structure by the
/// linker, so the execution engine dispatches on shape alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line_number: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `# ...` lines survive parsing as no-ops.
    Comment,

    Say {
        parts: Vec<String>,
    },
    Yell {
        parts: Vec<String>,
    },
    Whisper {
        parts: Vec<String>,
    },
    /// With probability one half, say the parts.
    Maybe {
        parts: Vec<String>,
    },
    /// Yell one comma-separated option at random.
    ShoutRandom {
        options: Vec<String>,
    },
    /// Dump every variable of the current scope.
    ListVars,
    /// Report the expression with a random "result".
    TrashMath {
        expr: String,
    },
    /// Sleep a random half-to-two seconds.
    BrainFreeze,
    /// Stop the whole program.
    RageQuit,

    /// `let`/`set`/`now`/`uhmath` and bare `name = expr` assignments.
    /// The right-hand side may also be a `new Class args...` instantiation
    /// or a `yo`/`do` call whose result is captured.
    Assign {
        name: String,
        rhs: String,
        fallback: AssignFallback,
    },
    MathLikeAnIdiot {
        expr: String,
    },
    Giveback {
        expr: String,
    },
    /// `yo`/`do` free-function or `obj.method` invocation.
    Call {
        target: String,
        args: Vec<String>,
    },

    Random {
        var: String,
        low: String,
        high: String,
    },
    Wait {
        seconds: String,
    },

    Steal {
        name: String,
    },
    StealFromInternet {
        target: String,
    },
    Scribble {
        path: String,
        content: String,
        append: bool,
    },
    Fetch {
        path: String,
        var: String,
    },

    /// `oops` with an optional message; the block form runs `body` first
    /// and raises afterwards.
    Oops {
        message: Option<String>,
        body: Vec<Stmt>,
    },

    DoThing {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    Thingy {
        name: String,
        body: Vec<Stmt>,
    },

    Conditional {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Stmt>>,
    },
    RepeatUntil {
        cond: String,
        body: Vec<Stmt>,
    },
    KeepDoing {
        cond: String,
        body: Vec<Stmt>,
    },
    LoopForever {
        body: Vec<Stmt>,
    },
    DoSoMany {
        var: String,
        start: String,
        end: String,
        body: Vec<Stmt>,
    },
    TryCatch {
        body: Vec<Stmt>,
        catch: Option<CatchClause>,
    },

    Unknown {
        text: String,
    },
}
