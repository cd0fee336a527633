//! Quote- and escape-aware tokenizer for command lines.

/// One whitespace-delimited token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub text: String,
    /// First character came from a quote or an escape, so markers are not special
    pub literal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Tokenized {
    pub tokens: Vec<Token>,
    /// Input ended while a quote was still open
    pub unterminated_quote: bool,
    /// Input ended on unquoted whitespace (cursor sits on a fresh token)
    pub trailing_space: bool,
}

/// Split `input` into tokens.
///
/// Single and double quotes group whitespace and are dropped from the output;
/// only one quote kind is active at a time. A backslash makes the next
/// character literal, inside quotes too. An unterminated quote runs to the
/// end of input.
pub(crate) fn tokenize(input: &str) -> Tokenized {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut literal = false;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut trailing_space = false;

    for ch in input.chars() {
        trailing_space = false;

        if escaped {
            if !in_token {
                literal = true;
                in_token = true;
            }
            current.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '"' | '\'' if quote.is_none() => {
                quote = Some(ch);
                if !in_token {
                    literal = true;
                    in_token = true;
                }
            }
            c if Some(c) == quote => quote = None,
            c if c.is_whitespace() && quote.is_none() => {
                if in_token {
                    tokens.push(Token {
                        text: std::mem::take(&mut current),
                        literal,
                    });
                    in_token = false;
                }
                trailing_space = true;
            }
            c => {
                if !in_token {
                    literal = false;
                    in_token = true;
                }
                current.push(c);
            }
        }
    }

    // A dangling backslash has nothing to escape; keep it as typed.
    if escaped {
        if !in_token {
            literal = true;
            in_token = true;
        }
        current.push('\\');
    }

    if in_token {
        tokens.push(Token {
            text: current,
            literal,
        });
    }

    Tokenized {
        tokens,
        unterminated_quote: quote.is_some(),
        trailing_space,
    }
}
