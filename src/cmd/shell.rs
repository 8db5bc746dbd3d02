//! Shell tokenization
//!
//! Splits a single build command into positional arguments and options. The
//! lexing itself is POSIX-style (single quotes literal, double quotes with
//! escapes, whitespace separated); `$$(...)` subcommand blocks are protected
//! beforehand so they survive as one token.

use regex::Regex;

/// A matched command parser rejected its input.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CmdParseError(pub String);

/// One classified token of a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Opt {
        name: String,
        /// `None` means a flag without a value.
        value: Option<String>,
    },
    Positional(String),
}

impl Token {
    /// Canonical textual form: `name=value` for valued options, the bare
    /// name for flags and positionals.
    pub fn canonical(&self) -> String {
        match self {
            Self::Opt {
                name,
                value: Some(value),
            } => format!("{}={}", name, value),
            Self::Opt { name, value: None } => name.clone(),
            Self::Positional(value) => value.clone(),
        }
    }
}

pub struct Tokenizer {
    /// `$$(...)` subcommand blocks
    subcommand: Regex,
}

impl Tokenizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            subcommand: Regex::new(r"\$\$\(([^()]*)\)")?,
        })
    }

    /// Parse a shell command into options and positionals.
    ///
    /// Value-less options are recognized either by lookahead (the next token
    /// also starts with `-`) or by membership in `flag_options`. Options take
    /// their value from an `=` suffix or from the following token.
    pub fn tokenize(&self, command: &str, flag_options: &[&str]) -> Result<Vec<Token>, CmdParseError> {
        // Wrap $$(...) blocks in double quotes so the lexer keeps them whole.
        let protected = self.subcommand.replace_all(command, r#""$$$$(${1})""#);
        let tokens = shell_words::split(&protected)
            .map_err(|e| CmdParseError(format!("{} in command {}", e, command)))?;

        let mut parsed = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];

            if !token.starts_with('-') {
                parsed.push(Token::Positional(token.clone()));
                i += 1;
                continue;
            }

            // flag without value
            let next_is_option = tokens.get(i + 1).is_some_and(|next| next.starts_with('-'));
            if next_is_option || flag_options.contains(&token.as_str()) {
                parsed.push(Token::Opt {
                    name: token.clone(),
                    value: None,
                });
                i += 1;
                continue;
            }

            // --opt=val
            if let Some((name, value)) = token.split_once('=') {
                parsed.push(Token::Opt {
                    name: name.to_string(),
                    value: Some(value.to_string()),
                });
                i += 1;
                continue;
            }

            // --opt val
            if let Some(next) = tokens.get(i + 1) {
                parsed.push(Token::Opt {
                    name: token.clone(),
                    value: Some(next.clone()),
                });
                i += 2;
                continue;
            }

            return Err(CmdParseError(format!(
                "Unrecognized token: {} in command {}",
                token, command
            )));
        }

        Ok(parsed)
    }

    /// Like [`tokenize`](Self::tokenize) but fails if any option appeared.
    pub fn positionals_only(&self, command: &str) -> Result<Vec<String>, CmdParseError> {
        let tokens = self.tokenize(command, &[])?;
        let expected = tokens.len();
        let positionals: Vec<String> = tokens
            .into_iter()
            .filter_map(|token| match token {
                Token::Positional(value) => Some(value),
                Token::Opt { .. } => None,
            })
            .collect();
        if positionals.len() != expected {
            return Err(CmdParseError(format!(
                "Invalid command format: expected positional arguments only but got options in command {}.",
                command
            )));
        }
        Ok(positionals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new().unwrap()
    }

    #[test]
    fn positionals_and_options() {
        let tokens = tokenizer()
            .tokenize("objcopy --remove-section='.rel*' -O binary in.o out.bin", &[])
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Positional("objcopy".into()),
                // followed by another option, so the whole token is a flag
                Token::Opt {
                    name: "--remove-section=.rel*".into(),
                    value: None,
                },
                Token::Opt {
                    name: "-O".into(),
                    value: Some("binary".into()),
                },
                Token::Positional("in.o".into()),
                Token::Positional("out.bin".into()),
            ]
        );
    }

    #[test]
    fn equals_value_when_followed_by_a_positional() {
        let tokens = tokenizer().tokenize("ld --build-id=sha1 a.o", &[]).unwrap();
        assert_eq!(
            tokens[1],
            Token::Opt {
                name: "--build-id".into(),
                value: Some("sha1".into()),
            }
        );
    }

    #[test]
    fn flag_by_lookahead() {
        let tokens = tokenizer().tokenize("ld -r -o out.o in.o", &[]).unwrap();
        assert_eq!(
            tokens[1],
            Token::Opt {
                name: "-r".into(),
                value: None,
            }
        );
    }

    #[test]
    fn flag_by_known_list() {
        let tokens = tokenizer().tokenize("strip --strip-debug in.o", &["--strip-debug"]).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Positional("strip".into()),
                Token::Opt {
                    name: "--strip-debug".into(),
                    value: None,
                },
                Token::Positional("in.o".into()),
            ]
        );
    }

    #[test]
    fn subcommand_blocks_stay_whole() {
        let tokens = tokenizer()
            .tokenize("ar mPiT $$(ar t vmlinux.a | sed -n 1p) vmlinux.a", &[])
            .unwrap();
        assert_eq!(tokens[2], Token::Positional("$$(ar t vmlinux.a | sed -n 1p)".into()));
    }

    #[test]
    fn quoting_is_honored() {
        let tokens = tokenizer().tokenize("sh 'a b.sh' \"c d\"", &[]).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Positional("sh".into()),
                Token::Positional("a b.sh".into()),
                Token::Positional("c d".into()),
            ]
        );
    }

    #[test]
    fn unmatched_quote_is_an_error() {
        assert!(tokenizer().tokenize("echo 'oops", &[]).is_err());
    }

    #[test]
    fn trailing_valueless_unknown_option_is_an_error() {
        assert!(tokenizer().tokenize("ld in.o -r", &[]).is_err());
    }

    #[test]
    fn positionals_only_rejects_options() {
        let t = tokenizer();
        assert_eq!(
            t.positionals_only("ar cDPrST out.a a.o b.o").unwrap(),
            vec!["ar", "cDPrST", "out.a", "a.o", "b.o"]
        );
        assert!(t.positionals_only("ar -v out.a a.o").is_err());
    }

    #[test]
    fn canonical_form_reparses_identically() {
        let t = tokenizer();
        let flags = ["-r", "--whole-archive"];
        let cmd = "ld -r --whole-archive -o out.o a.o b.o";
        let tokens = t.tokenize(cmd, &flags).unwrap();
        let rejoined = tokens.iter().map(Token::canonical).collect::<Vec<_>>().join(" ");
        assert_eq!(t.tokenize(&rejoined, &flags).unwrap(), tokens);
    }
}
