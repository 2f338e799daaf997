//! Regex-driven tokenizer.

use std::sync::LazyLock;

use regex::Regex;

use super::token::{Token, TokenKind};

const NONASCII: &str = r"[^\x00-\x7F]";
const NUM: &str = r"-?[0-9]*\.?[0-9]+";
const WC: &str = r"[\t\n\x0C\r ]";

/// Compiled token productions.
struct Productions {
    ident: Regex,
    at_keyword: Regex,
    string: Regex,
    hash: Regex,
    attachment: Regex,
    class: Regex,
    instance: Regex,
    number: Regex,
    percentage: Regex,
    dimension: Regex,
    uri: Regex,
    unicode_range: Regex,
    whitespace: Regex,
    comment: Regex,
    function: Regex,
    comp: Regex,
}

impl Productions {
    fn build() -> Result<Self, regex::Error> {
        let escape = format!(r"(?:\\[0-9a-fA-F]{{1,6}}{WC}?|\\[^\x00-\x1F\x7F])");
        let nmstart = format!("(?:[a-zA-Z_]|{NONASCII}|{escape})");
        let nmchar = format!("(?:[a-zA-Z0-9_-]|{NONASCII}|{escape})");
        let ident = format!("-?{nmstart}{nmchar}*");
        let name = format!("{nmchar}+");
        let urlchar = format!(r"(?:[\x09\x21\x23-\x26\x28-\x7E]|{NONASCII}|{escape})");
        let stringchar = format!(r"(?:{urlchar}|[ ]|\\(?:\n|\r\n|\r|\x0C))");
        let string = format!(r#"(?:"(?:{stringchar}|')*"|'(?:{stringchar}|")*')"#);

        let anchored = |pattern: &str| Regex::new(&format!("^(?:{pattern})"));

        Ok(Self {
            ident: anchored(&ident)?,
            at_keyword: anchored(&format!("@{ident}"))?,
            string: anchored(&string)?,
            hash: anchored(&format!("#{name}"))?,
            attachment: anchored(&format!("::{name}"))?,
            class: anchored(&format!(r"\.{name}"))?,
            instance: anchored(&format!("{ident}/"))?,
            number: anchored(NUM)?,
            percentage: anchored(&format!("{NUM}%"))?,
            dimension: anchored(&format!("{NUM}{ident}"))?,
            uri: anchored(&format!(r"url\({WC}*(?:{string}|{urlchar}*){WC}*\)"))?,
            unicode_range: anchored(r"U\+[0-9A-F?]{1,6}(?:-[0-9A-F]{1,6})?")?,
            whitespace: anchored(&format!("{WC}+"))?,
            comment: anchored(r"/\*[^*]*\*+(?:[^/][^*]*\*+)*/")?,
            function: anchored(&format!(r"{ident}\("))?,
            comp: anchored(r">=|<=|>|<|!=|=~|=")?,
        })
    }

    /// Productions tried, in order, when no single-character rule applies.
    fn ordered(&self) -> [(TokenKind, &Regex); 9] {
        [
            (TokenKind::Uri, &self.uri),
            (TokenKind::Function, &self.function),
            (TokenKind::UnicodeRange, &self.unicode_range),
            (TokenKind::Instance, &self.instance),
            (TokenKind::Ident, &self.ident),
            (TokenKind::Dimension, &self.dimension),
            (TokenKind::Percentage, &self.percentage),
            (TokenKind::Number, &self.number),
            (TokenKind::Comp, &self.comp),
        ]
    }
}

static PRODUCTIONS: LazyLock<Productions> = LazyLock::new(|| {
    // The patterns are fixed; a failure here is a bug in the table above.
    Productions::build().unwrap_or_else(|err| panic!("invalid token production: {err}"))
});

/// Tokenizer over a single input text.
///
/// Emits every token including whitespace and comments. Once an error or
/// end of input is reached, the same token is returned forever.
#[derive(Debug, Clone)]
pub struct Scanner {
    input: String,
    pos: usize,
    line: u32,
    column: u32,
    sticky: Option<Token>,
}

impl Scanner {
    /// Create a scanner. `\r\n` line endings are normalized to `\n`.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.replace("\r\n", "\n"),
            pos: 0,
            line: 1,
            column: 1,
            sticky: None,
        }
    }

    /// Return the next token.
    pub fn next_token(&mut self) -> Token {
        if let Some(tok) = &self.sticky {
            return tok.clone();
        }
        if self.pos >= self.input.len() {
            return self.stick(TokenKind::Eof, "");
        }

        let p = &*PRODUCTIONS;
        let rest = &self.input[self.pos..];

        if self.pos == 0 && rest.starts_with('\u{FEFF}') {
            return self.emit(TokenKind::Bom, "\u{FEFF}");
        }

        let first = rest.as_bytes()[0];
        match first {
            b'\t' | b'\n' | b'\x0C' | b'\r' | b' ' => {
                return self.emit_match(TokenKind::Whitespace, &p.whitespace);
            }
            b'.' if rest.len() > 1 && !rest.as_bytes()[1].is_ascii_digit() => {
                if p.class.is_match(rest) {
                    return self.emit_match(TokenKind::Class, &p.class);
                }
                return self.emit(TokenKind::Char, ".");
            }
            b'#' => {
                if p.hash.is_match(rest) {
                    return self.emit_match(TokenKind::Hash, &p.hash);
                }
                return self.emit(TokenKind::Char, "#");
            }
            b'@' => {
                if p.at_keyword.is_match(rest) {
                    return self.emit_match(TokenKind::AtKeyword, &p.at_keyword);
                }
                return self.emit(TokenKind::Char, "@");
            }
            b':' => {
                if p.attachment.is_match(rest) {
                    return self.emit_match(TokenKind::Attachment, &p.attachment);
                }
                return self.emit(TokenKind::Colon, ":");
            }
            b',' => return self.emit(TokenKind::Comma, ","),
            b';' => return self.emit(TokenKind::Semicolon, ";"),
            b'(' => return self.emit(TokenKind::LParen, "("),
            b')' => return self.emit(TokenKind::RParen, ")"),
            b'[' => return self.emit(TokenKind::LBracket, "["),
            b']' => return self.emit(TokenKind::RBracket, "]"),
            b'{' => return self.emit(TokenKind::LBrace, "{"),
            b'}' => return self.emit(TokenKind::RBrace, "}"),
            b'+' => return self.emit(TokenKind::Plus, "+"),
            b'*' => return self.emit(TokenKind::Multiply, "*"),
            b'%' => return self.emit(TokenKind::Char, "%"),
            b'&' => return self.emit(TokenKind::Char, "&"),
            b'-' => {
                if p.number.is_match(rest) {
                    return self.emit_match(TokenKind::Number, &p.number);
                }
                if p.function.is_match(rest) {
                    return self.emit_match(TokenKind::Function, &p.function);
                }
                return self.emit(TokenKind::Minus, "-");
            }
            b'"' | b'\'' => {
                if p.string.is_match(rest) {
                    return self.emit_match(TokenKind::String, &p.string);
                }
                return self.stick(TokenKind::Error, "unclosed quotation mark");
            }
            b'/' => match rest.as_bytes().get(1) {
                Some(b'*') => {
                    if p.comment.is_match(rest) {
                        return self.emit_match(TokenKind::Comment, &p.comment);
                    }
                    return self.stick(TokenKind::Error, "unclosed comment");
                }
                Some(b'/') => {
                    let end = rest.find('\n').unwrap_or(rest.len());
                    let text = rest[..end].to_string();
                    return self.emit(TokenKind::Comment, &text);
                }
                _ => return self.emit(TokenKind::Divide, "/"),
            },
            _ => {}
        }

        for (kind, regex) in p.ordered() {
            if let Some(m) = regex.find(rest) {
                let text = m.as_str().to_string();
                return self.emit(kind, &text);
            }
        }

        let ch = rest.chars().next().map(String::from).unwrap_or_default();
        self.emit(TokenKind::Char, &ch)
    }

    fn emit_match(&mut self, kind: TokenKind, regex: &Regex) -> Token {
        let text = regex
            .find(&self.input[self.pos..])
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        self.emit(kind, &text)
    }

    fn emit(&mut self, kind: TokenKind, text: &str) -> Token {
        let token = Token::new(kind, text, self.line, self.column);
        self.advance(text);
        token
    }

    fn stick(&mut self, kind: TokenKind, text: &str) -> Token {
        let token = Token::new(kind, text, self.line, self.column);
        self.sticky = Some(token.clone());
        token
    }

    fn advance(&mut self, text: &str) {
        match text.rfind('\n') {
            Some(last) => {
                self.line += text.matches('\n').count() as u32;
                self.column = text[last..].chars().count() as u32;
            }
            None => self.column += text.chars().count() as u32,
        }
        self.pos += text.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn assert_tokens(text: &str, expected: &[(TokenKind, &str)]) {
        let mut scanner = Scanner::new(text);
        for (kind, value) in expected {
            let tok = scanner.next_token();
            assert_eq!((tok.kind, tok.text.as_str()), (*kind, *value), "in {text:?}");
        }
        assert_eq!(scanner.next_token().kind, Eof, "in {text:?}");
    }

    #[test]
    fn variable_assignment() {
        assert_tokens(
            "@foo: 1 + 2",
            &[
                (AtKeyword, "@foo"),
                (Colon, ":"),
                (Whitespace, " "),
                (Number, "1"),
                (Whitespace, " "),
                (Plus, "+"),
                (Whitespace, " "),
                (Number, "2"),
            ],
        );
    }

    #[test]
    fn selector_with_attachment_and_filter() {
        assert_tokens(
            "#bar::foo[type= 'foo'] {}",
            &[
                (Hash, "#bar"),
                (Attachment, "::foo"),
                (LBracket, "["),
                (Ident, "type"),
                (Comp, "="),
                (Whitespace, " "),
                (String, "'foo'"),
                (RBracket, "]"),
                (Whitespace, " "),
                (LBrace, "{"),
                (RBrace, "}"),
            ],
        );
    }

    #[test]
    fn function_with_percentage() {
        assert_tokens(
            "lighten(a, 30%)",
            &[
                (Function, "lighten("),
                (Ident, "a"),
                (Comma, ","),
                (Whitespace, " "),
                (Percentage, "30%"),
                (RParen, ")"),
            ],
        );
    }

    #[test]
    fn comments() {
        assert_tokens("//comment", &[(Comment, "//comment")]);
        assert_tokens("// comment", &[(Comment, "// comment")]);
        assert_tokens("/* comment\n comment */", &[(Comment, "/* comment\n comment */")]);
        assert_tokens("/* a **/", &[(Comment, "/* a **/")]);
    }

    #[test]
    fn class_instance_and_numbers() {
        assert_tokens(
            ".road a/line-width .5 -2",
            &[
                (Class, ".road"),
                (Whitespace, " "),
                (Instance, "a/"),
                (Ident, "line-width"),
                (Whitespace, " "),
                (Number, ".5"),
                (Whitespace, " "),
                (Number, "-2"),
            ],
        );
    }

    #[test]
    fn minus_and_divide() {
        assert_tokens(
            "4 - -mc-set-hue( 8/2",
            &[
                (Number, "4"),
                (Whitespace, " "),
                (Minus, "-"),
                (Whitespace, " "),
                (Function, "-mc-set-hue("),
                (Whitespace, " "),
                (Number, "8"),
                (Divide, "/"),
                (Number, "2"),
            ],
        );
    }

    #[test]
    fn comparison_operators() {
        assert_tokens(
            "[a>=1][b!=2][c=~'x']",
            &[
                (LBracket, "["),
                (Ident, "a"),
                (Comp, ">="),
                (Number, "1"),
                (RBracket, "]"),
                (LBracket, "["),
                (Ident, "b"),
                (Comp, "!="),
                (Number, "2"),
                (RBracket, "]"),
                (LBracket, "["),
                (Ident, "c"),
                (Comp, "=~"),
                (String, "'x'"),
                (RBracket, "]"),
            ],
        );
    }

    #[test]
    fn url_and_dimension() {
        assert_tokens(
            "url('img/a.png') 10px",
            &[(Uri, "url('img/a.png')"), (Whitespace, " "), (Dimension, "10px")],
        );
    }

    #[test]
    fn string_continuation() {
        assert_tokens("\"a\\\nb\"", &[(String, "\"a\\\nb\"")]);
    }

    #[test]
    fn unclosed_string_is_sticky_error() {
        let mut scanner = Scanner::new("'foo");
        let tok = scanner.next_token();
        assert_eq!(tok.kind, Error);
        assert_eq!(tok.text, "unclosed quotation mark");
        assert_eq!(scanner.next_token(), tok);
    }

    #[test]
    fn unclosed_comment() {
        let mut scanner = Scanner::new("a /* foo");
        assert_eq!(scanner.next_token().kind, Ident);
        assert_eq!(scanner.next_token().kind, Whitespace);
        let tok = scanner.next_token();
        assert_eq!(tok.kind, Error);
        assert_eq!(tok.text, "unclosed comment");
        assert_eq!((tok.line, tok.column), (1, 3));
    }

    #[test]
    fn positions() {
        let mut scanner = Scanner::new("a\r\n  bb\n\u{FEFF}");
        let a = scanner.next_token();
        assert_eq!((a.line, a.column), (1, 1));
        scanner.next_token();
        let bb = scanner.next_token();
        assert_eq!((bb.kind, bb.line, bb.column), (Ident, 2, 3));
    }

    #[test]
    fn byte_order_mark() {
        assert_tokens("\u{FEFF}a", &[(Bom, "\u{FEFF}"), (Ident, "a")]);
    }
}
