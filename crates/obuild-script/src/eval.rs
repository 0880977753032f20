//! Statement evaluation over a host-provided command table.

use async_recursion::async_recursion;

use crate::error::Result;
use crate::lexer::{Word, statements};

/// What the evaluator needs from its embedder.
///
/// Variables live host-side so the same scope stack serves configuration,
/// rule-body aliases, and nested `invoke` runs. Every non-builtin word of
/// a statement is handed to [`Host::command`] already substituted.
#[allow(async_fn_in_trait)]
pub trait Host {
    /// Look up a variable, innermost scope first.
    fn get_var(&self, name: &str) -> Option<String>;

    /// Dispatch a command invocation; the return value becomes the
    /// statement's result (and the substitution text for `(...)` groups).
    async fn command(&mut self, name: &str, args: &[String]) -> Result<String>;
}

/// Evaluate a piece of script, returning the last statement's result.
#[async_recursion(?Send)]
pub async fn run<H: Host>(host: &mut H, code: &str) -> Result<String> {
    let mut last = String::new();
    for stmt in statements(code)? {
        let mut parts = Vec::with_capacity(stmt.words.len());
        for word in &stmt.words {
            parts.push(eval_word(host, word).await?);
        }
        let Some((name, args)) = parts.split_first() else {
            continue;
        };
        tracing::trace!(command = %name, ?args, "dispatching");
        last = host.command(name, args).await?;
    }
    Ok(last)
}

async fn eval_word<H: Host>(host: &mut H, word: &Word) -> Result<String> {
    match word {
        Word::Bare(text) => Ok(expand(host, text, false)),
        Word::Quoted(raw) => Ok(expand(host, raw, true)),
        // Blocks stay raw: substitution happens if and when the block text
        // is itself run, which is what gives rule bodies late-bound aliases.
        Word::Block(raw) => Ok(raw.clone()),
        Word::Paren(inner) => run(host, inner).await,
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Expand `$var` references and, for quoted words, backslash escapes.
///
/// Unknown variables expand to the empty string. A `$` not followed by an
/// identifier stays literal; `\$` in a quoted word suppresses substitution.
fn expand<H: Host>(host: &H, raw: &str, quoted: bool) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quoted && i + 1 < bytes.len() => {
                match bytes[i + 1] {
                    b'n' => out.push('\n'),
                    b't' => out.push('\t'),
                    b'"' => out.push('"'),
                    b'\\' => out.push('\\'),
                    b'$' => out.push('$'),
                    other => {
                        out.push('\\');
                        out.push(other as char);
                    }
                }
                i += 2;
            }
            b'$' if i + 1 < bytes.len() && is_ident_start(bytes[i + 1]) => {
                let start = i + 1;
                let mut end = start + 1;
                while end < bytes.len() && is_ident(bytes[end]) {
                    end += 1;
                }
                let name = &raw[start..end];
                if let Some(value) = host.get_var(name) {
                    out.push_str(&value);
                } else {
                    tracing::trace!(var = name, "unset variable expands empty");
                }
                i = end;
            }
            _ => {
                // raw is valid UTF-8; copy whole code points through
                let ch_len = utf8_len(bytes[i]);
                out.push_str(&raw[i..i + ch_len]);
                i += ch_len;
            }
        }
    }
    out
}

fn utf8_len(first: u8) -> usize {
    match first {
        b if b < 0x80 => 1,
        b if b >= 0xF0 => 4,
        b if b >= 0xE0 => 3,
        _ => 2,
    }
}
