//! Raw argv tokenizing.
//!
//! Turns `["mw", "--foo", "99"]` into an [`Arguments`] object. Values that
//! parse as numbers are coerced to JSON numbers; a flag with no value is
//! `true`; `--no-flag` is `false`; repeated options collect into arrays.

use crate::arguments::Arguments;
use serde_json::{Number, Value};

/// Converts raw argv into an argument object.
pub trait Tokenizer: Send + Sync + 'static {
    /// Tokenizes `argv` (program name already stripped).
    fn tokenize(&self, argv: &[String]) -> Arguments;
}

/// The built-in tokenizer.
///
/// # Example
///
/// ```
/// use argmill_core::{DefaultTokenizer, Tokenizer};
/// use serde_json::json;
///
/// let argv: Vec<String> = ["mw", "--foo", "99", "-v"].iter().map(|s| s.to_string()).collect();
/// let args = DefaultTokenizer::new().tokenize(&argv);
///
/// assert_eq!(args.positionals(), &[json!("mw")]);
/// assert_eq!(args.get_i64("foo"), Some(99));
/// assert_eq!(args.get_bool("v"), Some(true));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DefaultTokenizer {
    camel_case_expansion: bool,
}

impl DefaultTokenizer {
    /// Creates a tokenizer with camel-case expansion enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            camel_case_expansion: true,
        }
    }

    /// Enables or disables mirroring `--foo-bar` into `fooBar`.
    #[must_use]
    pub const fn camel_case_expansion(mut self, enabled: bool) -> Self {
        self.camel_case_expansion = enabled;
        self
    }

    fn store(&self, args: &mut Arguments, key: &str, value: Value) {
        if self.camel_case_expansion && key.contains('-') {
            args.append(camel_case(key), value.clone());
        }
        args.append(key, value);
    }
}

impl Default for DefaultTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for DefaultTokenizer {
    fn tokenize(&self, argv: &[String]) -> Arguments {
        let mut args = Arguments::new();
        let mut tokens = argv.iter().peekable();

        while let Some(token) = tokens.next() {
            if token == "--" {
                for rest in tokens.by_ref() {
                    args.push_positional(coerce(rest));
                }
                break;
            }

            if let Some(body) = token.strip_prefix("--") {
                if let Some((key, value)) = body.split_once('=') {
                    self.store(&mut args, key, coerce(value));
                } else if let Some(negated) = body.strip_prefix("no-") {
                    self.store(&mut args, negated, Value::Bool(false));
                } else if let Some(value) = tokens.next_if(|next| takes_value(next)) {
                    self.store(&mut args, body, coerce(value));
                } else {
                    self.store(&mut args, body, Value::Bool(true));
                }
                continue;
            }

            if let Some(flags) = token.strip_prefix('-').filter(|f| is_short_flags(f)) {
                if let Some((key, value)) = flags.split_once('=') {
                    self.store(&mut args, key, coerce(value));
                    continue;
                }
                let mut chars: Vec<char> = flags.chars().collect();
                let last = chars.pop();
                for flag in chars {
                    self.store(&mut args, &flag.to_string(), Value::Bool(true));
                }
                if let Some(last) = last {
                    let key = last.to_string();
                    if let Some(value) = tokens.next_if(|next| takes_value(next)) {
                        self.store(&mut args, &key, coerce(value));
                    } else {
                        self.store(&mut args, &key, Value::Bool(true));
                    }
                }
                continue;
            }

            args.push_positional(coerce(token));
        }

        args
    }
}

fn is_short_flags(flags: &str) -> bool {
    !flags.is_empty() && parse_number(flags).is_none()
}

fn takes_value(token: &str) -> bool {
    !token.starts_with('-') || parse_number(token).is_some()
}

fn coerce(raw: &str) -> Value {
    parse_number(raw).map_or_else(|| Value::String(raw.to_string()), Value::Number)
}

fn parse_number(raw: &str) -> Option<Number> {
    // Leading zeros are kept as strings so identifiers like "007" survive.
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.") {
        return None;
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Number::from(int));
    }
    if raw.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return raw.parse::<f64>().ok().and_then(Number::from_f64);
    }
    None
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
