use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{AssignFallback, Branch, CatchClause, Stmt, StmtKind};
use crate::block::Node;

static CATCH_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^catch\s+(\w+)\s*:$").unwrap());
static DOSOMANY_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^dosomany\s+(\w+)\s+in\s+(.+?)\s+to\s+(.+?):?$").unwrap());
static RANDOM_STMT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^random\s+(\w+)\s+(\S+)\s+to\s+(\S+)").unwrap());
static SCRIBBLE_STMT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^scribble\s+("[^"]*"|'[^']*'|\S+)\s+with\s+(.+)$"#).unwrap());
static SCRIBBLEMORE_STMT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^scribblemore\s+("[^"]*"|'[^']*'|\S+)\s+with\s+(.+)$"#).unwrap());
static FETCH_STMT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^fetch\s+("[^"]*"|'[^']*'|\S+)\s+into\s+(\w+)"#).unwrap());

/// Turn a block-parsed node forest into linked statements. Constructs the
/// block parser left as positional siblings (`maybeif`/`ormaybe`/`otherwise`
/// chains, `try:`/`catch v:` pairs) are resolved into explicit structure
/// here, so the execution engine never inspects siblings.
pub fn link(nodes: &[Node]) -> Vec<Stmt> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < nodes.len() {
        let node = &nodes[i];
        i += 1;
        let kind = match classify(node) {
            Classified::Done(kind) => kind,
            Classified::Conditional(first_cond) => {
                let mut branches = vec![Branch {
                    cond: first_cond,
                    body: link(&node.children),
                }];
                while i < nodes.len() && nodes[i].text.starts_with("ormaybe") {
                    let cond = strip_marker(nodes[i].text.trim_start_matches("ormaybe").trim());
                    branches.push(Branch {
                        cond: cond.to_string(),
                        body: link(&nodes[i].children),
                    });
                    i += 1;
                }
                let mut otherwise = None;
                if i < nodes.len() && nodes[i].text.starts_with("otherwise") {
                    otherwise = Some(link(&nodes[i].children));
                    i += 1;
                }
                StmtKind::Conditional {
                    branches,
                    otherwise,
                }
            }
            Classified::Try => {
                let mut catch = None;
                if i < nodes.len() && nodes[i].text.starts_with("catch ") {
                    if let Some(caps) = CATCH_HEADER.captures(&nodes[i].text) {
                        catch = Some(CatchClause {
                            var: caps[1].to_string(),
                            body: link(&nodes[i].children),
                        });
                    }
                    i += 1;
                }
                StmtKind::TryCatch {
                    body: link(&node.children),
                    catch,
                }
            }
        };
        out.push(Stmt {
            kind,
            line_number: node.line_number,
        });
    }
    out
}

enum Classified {
    Done(StmtKind),
    /// `maybeif COND:` opening a chain; sibling consumption happens in `link`.
    Conditional(String),
    /// `try:` whose catch sibling is resolved in `link`.
    Try,
}

fn classify(node: &Node) -> Classified {
    use Classified::Done;

    let line = node.text.as_str();
    if line.is_empty() || line.starts_with('#') {
        return Done(StmtKind::Comment);
    }

    if let Some(rest) = line.strip_prefix("oops") {
        let rest = strip_marker(rest.trim()).trim();
        return Done(StmtKind::Oops {
            message: if rest.is_empty() {
                None
            } else {
                Some(rest.to_string())
            },
            body: link(&node.children),
        });
    }

    if line == "try:" {
        return Classified::Try;
    }

    if let Some(rest) = line.strip_prefix("maybeif ") {
        return Classified::Conditional(strip_marker(rest.trim()).to_string());
    }
    if let Some(rest) = line.strip_prefix("ormaybe") {
        // a stray `ormaybe` with no preceding chain still runs on its own
        return Done(StmtKind::Conditional {
            branches: vec![Branch {
                cond: strip_marker(rest.trim()).to_string(),
                body: link(&node.children),
            }],
            otherwise: None,
        });
    }
    if line.starts_with("otherwise") {
        return Done(StmtKind::Conditional {
            branches: Vec::new(),
            otherwise: Some(link(&node.children)),
        });
    }

    if let Some(rest) = line.strip_prefix("repeatuntil ") {
        return Done(StmtKind::RepeatUntil {
            cond: strip_marker(rest.trim()).to_string(),
            body: link(&node.children),
        });
    }
    if let Some(rest) = line.strip_prefix("keepdoing ") {
        return Done(StmtKind::KeepDoing {
            cond: strip_marker(rest.trim()).to_string(),
            body: link(&node.children),
        });
    }
    if line.starts_with("loopforever") {
        return Done(StmtKind::LoopForever {
            body: link(&node.children),
        });
    }
    if line.starts_with("dosomany ") {
        return match DOSOMANY_HEADER.captures(line) {
            Some(caps) => Done(StmtKind::DoSoMany {
                var: caps[1].to_string(),
                start: caps[2].to_string(),
                end: caps[3].to_string(),
                body: link(&node.children),
            }),
            None => Done(StmtKind::Comment),
        };
    }

    if let Some(rest) = line.strip_prefix("do_thing ") {
        let head = strip_marker(rest.trim());
        let mut parts = head.split_whitespace();
        return match parts.next() {
            Some(name) => Done(StmtKind::DoThing {
                name: name.to_string(),
                params: parts.map(str::to_string).collect(),
                body: link(&node.children),
            }),
            None => Done(StmtKind::Unknown {
                text: line.to_string(),
            }),
        };
    }
    if let Some(rest) = line.strip_prefix("thingy ") {
        return Done(StmtKind::Thingy {
            name: strip_marker(rest.trim()).to_string(),
            body: link(&node.children),
        });
    }

    // a `catch` that lost its `try:` is skipped
    if line.starts_with("catch ") {
        return Done(StmtKind::Comment);
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let cmd = tokens[0];

    match cmd {
        "let" | "set" | "now" => {
            if tokens.len() >= 4 && tokens[2] == "=" {
                Done(StmtKind::Assign {
                    name: tokens[1].to_string(),
                    rhs: rhs_of(line),
                    fallback: AssignFallback::RawText,
                })
            } else {
                Done(StmtKind::Comment)
            }
        }
        "uhmath" if tokens.len() >= 4 && tokens[2] == "=" => Done(StmtKind::Assign {
            name: tokens[1].to_string(),
            rhs: rhs_of(line),
            fallback: AssignFallback::Nothing,
        }),
        "giveback" => Done(StmtKind::Giveback {
            expr: line["giveback".len()..].trim().to_string(),
        }),
        "mathlikeanidiot" => Done(StmtKind::MathLikeAnIdiot {
            expr: line["mathlikeanidiot".len()..].trim().to_string(),
        }),
        "random" => match RANDOM_STMT.captures(line) {
            Some(caps) => Done(StmtKind::Random {
                var: caps[1].to_string(),
                low: caps[2].to_string(),
                high: caps[3].to_string(),
            }),
            None => Done(StmtKind::Unknown {
                text: line.to_string(),
            }),
        },
        "wait" => Done(StmtKind::Wait {
            seconds: tokens.get(1).unwrap_or(&"").to_string(),
        }),
        "maybe" => Done(StmtKind::Maybe {
            parts: split_args(line["maybe".len()..].trim()),
        }),
        "yo" | "do" => {
            if tokens.len() >= 2 {
                let rest = line[cmd.len()..].trim_start();
                let args_text = rest[tokens[1].len()..].trim_start();
                Done(StmtKind::Call {
                    target: tokens[1].to_string(),
                    args: split_args(args_text),
                })
            } else {
                Done(StmtKind::Comment)
            }
        }
        "say" | "sayit" => Done(StmtKind::Say {
            parts: split_args(line[cmd.len()..].trim()),
        }),
        "yell" => Done(StmtKind::Yell {
            parts: split_args(line["yell".len()..].trim()),
        }),
        "whisper" => Done(StmtKind::Whisper {
            parts: split_args(line["whisper".len()..].trim()),
        }),
        "steal" => {
            if tokens.len() >= 2 {
                Done(StmtKind::Steal {
                    name: unquote(tokens[1]).to_string(),
                })
            } else {
                Done(StmtKind::Comment)
            }
        }
        "stealfrominternet" => {
            if tokens.len() >= 2 {
                Done(StmtKind::StealFromInternet {
                    target: unquote(tokens[1]).to_string(),
                })
            } else {
                Done(StmtKind::Comment)
            }
        }
        "scribble" => match SCRIBBLE_STMT.captures(line) {
            Some(caps) => Done(StmtKind::Scribble {
                path: caps[1].to_string(),
                content: caps[2].trim().to_string(),
                append: false,
            }),
            None => Done(StmtKind::Comment),
        },
        "scribblemore" => match SCRIBBLEMORE_STMT.captures(line) {
            Some(caps) => Done(StmtKind::Scribble {
                path: caps[1].to_string(),
                content: caps[2].trim().to_string(),
                append: true,
            }),
            None => Done(StmtKind::Comment),
        },
        "fetch" => match FETCH_STMT.captures(line) {
            Some(caps) => Done(StmtKind::Fetch {
                path: caps[1].to_string(),
                var: caps[2].to_string(),
            }),
            None => Done(StmtKind::Comment),
        },
        "ragequit" => Done(StmtKind::RageQuit),
        "shoutrandom" => Done(StmtKind::ShoutRandom {
            options: line["shoutrandom".len()..]
                .trim()
                .split(',')
                .map(|opt| opt.trim().to_string())
                .filter(|opt| !opt.is_empty())
                .collect(),
        }),
        "listvars" => Done(StmtKind::ListVars),
        "trashmath" => Done(StmtKind::TrashMath {
            expr: line["trashmath".len()..].trim().to_string(),
        }),
        "brainfreeze" => Done(StmtKind::BrainFreeze),
        _ => {
            // best-effort bare assignment, e.g. `self.n = start`
            if tokens.len() >= 3 && tokens[1] == "=" {
                Done(StmtKind::Assign {
                    name: tokens[0].to_string(),
                    rhs: rhs_of(line),
                    fallback: AssignFallback::RawText,
                })
            } else {
                Done(StmtKind::Unknown {
                    text: line.to_string(),
                })
            }
        }
    }
}

fn strip_marker(header: &str) -> &str {
    header.strip_suffix(':').unwrap_or(header)
}

fn rhs_of(line: &str) -> String {
    match line.splitn(2, '=').nth(1) {
        Some(rhs) => rhs.trim().to_string(),
        None => String::new(),
    }
}

fn unquote(token: &str) -> &str {
    let token = token.trim();
    if token.len() >= 2
        && ((token.starts_with('"') && token.ends_with('"'))
            || (token.starts_with('\'') && token.ends_with('\'')))
    {
        &token[1..token.len() - 1]
    } else {
        token
    }
}

/// Split statement arguments on whitespace, keeping quoted strings (and
/// their quotes) together as single tokens.
pub fn split_args(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for ch in text.chars() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                    current.push(ch);
                } else if ch.is_whitespace() {
                    if !current.is_empty() {
                        args.push(std::mem::take(&mut current));
                    }
                } else {
                    current.push(ch);
                }
            }
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}
