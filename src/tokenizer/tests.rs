use super::*;
use assert_matches::assert_matches;
use rand::thread_rng;

fn kinds(text: &str) -> Vec<Token> {
    tokenize(text)
        .unwrap()
        .into_iter()
        .map(|spanned| spanned.token)
        .collect()
}

#[test]
fn empty_input_is_just_eof() {
    assert_eq!(
        tokenize("").unwrap(),
        vec![SpannedToken {
            token: Token::Eof,
            offset: 0,
        }]
    );
    assert_eq!(kinds("  \t \n "), vec![Token::Eof]);
}

#[test]
fn punctuation_and_operators() {
    assert_eq!(
        kinds("; , { } ( ) = + *"),
        vec![
            Token::Separator,
            Token::Comma,
            Token::OpenBrace,
            Token::CloseBrace,
            Token::OpenParen,
            Token::CloseParen,
            Token::Set,
            Token::Plus,
            Token::Times,
            Token::Eof,
        ]
    );
}

#[test]
fn concat_wins_longest_match() {
    assert_eq!(kinds("<>"), vec![Token::Concat, Token::Eof]);
    assert_eq!(
        kinds("01ab<>02cd"),
        vec![
            Token::Hex(vec![0x01, 0xab]),
            Token::Concat,
            Token::Hex(vec![0x02, 0xcd]),
            Token::Eof,
        ]
    );
    // A lone `<` is not a token.
    assert_matches!(tokenize("01ab < 02cd"), Err(Error::Lex(5)));
}

#[test]
fn numbers_and_hex_literals() {
    assert_eq!(
        kinds("0 42 1234"),
        vec![
            Token::Number(BigUint::from(0_u32)),
            Token::Number(BigUint::from(42_u32)),
            Token::Number(BigUint::from(1234_u32)),
            Token::Eof,
        ]
    );
    // All-decimal words are numbers even when they would parse as hex.
    assert_eq!(
        kinds("1234567890123456789012345678901234567890"),
        vec![
            Token::Number(
                "1234567890123456789012345678901234567890"
                    .parse::<BigUint>()
                    .unwrap()
            ),
            Token::Eof,
        ]
    );
    // A hex literal needs even length and at least one letter digit.
    assert_eq!(kinds("00ff"), vec![Token::Hex(vec![0x00, 0xff]), Token::Eof]);
    assert_eq!(
        kinds("DEADBEEF"),
        vec![Token::Hex(vec![0xde, 0xad, 0xbe, 0xef]), Token::Eof]
    );
    assert_matches!(tokenize("abc"), Err(Error::Lex(0)));
}

#[test]
fn names() {
    assert_eq!(
        kinds("$x $foo_1"),
        vec![
            Token::Name(Name::new("x")),
            Token::Name(Name::new("foo_1")),
            Token::Eof,
        ]
    );
    // `$` must be followed by an identifier.
    assert_matches!(tokenize("$ x"), Err(Error::Lex(0)));
}

#[test]
fn keywords() {
    assert_eq!(
        kinds("SHA256 public_key"),
        vec![
            Token::Function(Function::Sha256),
            Token::Function(Function::PublicKey),
            Token::Eof,
        ]
    );
    assert_eq!(
        kinds("wallet outpoint"),
        vec![
            Token::Constructor(Constructor::Wallet),
            Token::Constructor(Constructor::Outpoint),
            Token::Eof,
        ]
    );
    // Keywords are case-sensitive; `sha256` is not recognized as anything.
    assert_matches!(tokenize("sha256"), Err(Error::Lex(0)));
}

#[test]
fn wif_and_address_literals() {
    let secret = Secret::random(&mut thread_rng());
    let tokens = kinds(&secret.to_wif());
    assert_eq!(tokens, vec![Token::Secret(secret), Token::Eof]);

    let address = secret.pubkey().address();
    let tokens = kinds(&address.to_base58check());
    assert_eq!(tokens, vec![Token::Address(address), Token::Eof]);
}

#[test]
fn corrupted_base58_is_a_lex_error() {
    let secret = Secret::random(&mut thread_rng());
    let mut wif = secret.to_wif();
    // Flipping a digit breaks the checksum.
    let flipped = if wif.ends_with('2') { '3' } else { '2' };
    wif.pop();
    wif.push(flipped);
    assert_matches!(tokenize(&wif), Err(Error::Lex(0)));
}

#[test]
fn offsets_are_byte_positions() {
    let tokens = tokenize("12 + $x").unwrap();
    let offsets: Vec<_> = tokens.iter().map(|spanned| spanned.offset).collect();
    assert_eq!(offsets, vec![0, 3, 5, 7]);
}

#[test]
fn lex_error_reports_first_bad_offset() {
    assert_matches!(tokenize("1 + %"), Err(Error::Lex(4)));
    assert_matches!(tokenize("#"), Err(Error::Lex(0)));
    // Nothing before the bad run is reported as a partial token list.
    assert_matches!(tokenize("1 ? 2"), Err(Error::Lex(2)));
}

#[test]
fn tokenization_is_pure() {
    let text = "$x = 2 + 3 * 4; SHA256 00ff";
    assert_eq!(tokenize(text).unwrap(), tokenize(text).unwrap());
}
