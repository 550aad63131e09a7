//! Tokenization of statement text.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::char as tag_char,
    combinator::map,
    sequence::preceded,
    IResult,
};
use nom_locate::LocatedSpan;
use num_bigint::BigUint;

use crate::format;
use crate::functions::Function;
use crate::ops::Constructor;
use crate::wallet::{Address, Secret};
use crate::workspace::{Error, Name};

#[cfg(test)]
mod tests;

type Span<'a> = LocatedSpan<&'a str>;
type NomResult<'a, T> = IResult<Span<'a>, T>;

/// Lexical unit of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Statement separator `;`.
    Separator,
    /// Argument separator `,`.
    Comma,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// Assignment operator `=`.
    Set,
    /// Addition operator `+`.
    Plus,
    /// Multiplication operator `*`.
    Times,
    /// Concatenation operator `<>`.
    Concat,
    /// Decimal number literal.
    Number(BigUint),
    /// Even-length hexadecimal literal.
    Hex(Vec<u8>),
    /// `$`-prefixed workspace name.
    Name(Name),
    /// Base58Check address literal.
    Address(Address),
    /// WIF secret key literal.
    Secret(Secret),
    /// Function keyword.
    Function(Function),
    /// Constructor keyword.
    Constructor(Constructor),
    /// End of input.
    Eof,
}

/// Token together with its byte offset in the tokenized text.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// The token.
    pub token: Token,
    /// Byte offset of the token's first character.
    pub offset: usize,
}

fn ws(input: Span) -> NomResult<Span> {
    take_while(|c: char| c.is_ascii_whitespace())(input)
}

/// Punctuation and operators; `<>` is matched before any single character.
fn punct(input: Span) -> NomResult<Token> {
    alt((
        map(tag("<>"), |_| Token::Concat),
        map(tag_char(';'), |_| Token::Separator),
        map(tag_char(','), |_| Token::Comma),
        map(tag_char('{'), |_| Token::OpenBrace),
        map(tag_char('}'), |_| Token::CloseBrace),
        map(tag_char('('), |_| Token::OpenParen),
        map(tag_char(')'), |_| Token::CloseParen),
        map(tag_char('='), |_| Token::Set),
        map(tag_char('+'), |_| Token::Plus),
        map(tag_char('*'), |_| Token::Times),
    ))(input)
}

fn name_token(input: Span) -> NomResult<Token> {
    map(
        preceded(
            tag_char('$'),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        ),
        |span: Span| Token::Name(Name::new(span.fragment)),
    )(input)
}

fn word(input: Span) -> NomResult<Span> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

/// Classifies a bare word. Priority: keyword, decimal number, hex literal
/// (even length, at least one hex letter), WIF secret, Base58Check address.
fn classify(word: &str) -> Option<Token> {
    if let Some(function) = Function::from_keyword(word) {
        return Some(Token::Function(function));
    }
    if let Some(constructor) = Constructor::from_keyword(word) {
        return Some(Token::Constructor(constructor));
    }
    if word.bytes().all(|b| b.is_ascii_digit()) {
        return format::read_number(word).map(Token::Number);
    }
    if word.len() % 2 == 0
        && word.bytes().all(|b| b.is_ascii_hexdigit())
        && word.bytes().any(|b| b.is_ascii_alphabetic())
    {
        return format::read_bytes(word).map(Token::Hex);
    }
    if let Some(secret) = Secret::from_wif(word) {
        return Some(Token::Secret(secret));
    }
    if let Some(address) = Address::from_base58check(word) {
        return Some(Token::Address(address));
    }
    None
}

/// Splits statement text into tokens, ending with [`Token::Eof`].
///
/// Tokenization is pure: the same text always yields the same sequence. An
/// unrecognized character run fails the whole text with [`Error::Lex`]
/// carrying the offending byte offset; no partial token list is produced.
pub fn tokenize(text: &str) -> Result<Vec<SpannedToken>, Error> {
    let mut tokens = Vec::new();
    let mut rest = Span::new(text);
    loop {
        if let Ok((skipped, _)) = ws(rest) {
            rest = skipped;
        }
        let offset = rest.offset;
        if rest.fragment.is_empty() {
            tokens.push(SpannedToken {
                token: Token::Eof,
                offset,
            });
            return Ok(tokens);
        }
        if let Ok((remaining, token)) = punct(rest) {
            tokens.push(SpannedToken { token, offset });
            rest = remaining;
            continue;
        }
        if let Ok((remaining, token)) = name_token(rest) {
            tokens.push(SpannedToken { token, offset });
            rest = remaining;
            continue;
        }
        if let Ok((remaining, span)) = word(rest) {
            match classify(span.fragment) {
                Some(token) => {
                    tokens.push(SpannedToken { token, offset });
                    rest = remaining;
                    continue;
                }
                None => return Err(Error::Lex(offset)),
            }
        }
        return Err(Error::Lex(offset));
    }
}
