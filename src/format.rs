//! Printable expression form of items and pending operations, plus the
//! literal readers shared with the tokenizer.
//!
//! Expressions are write-only artifacts: the interpreter never re-parses
//! them. Atomic literal syntax round-trips through the paired readers.

use num_bigint::BigUint;
use std::fmt;

use crate::functions::Function;
use crate::ops::{Constructor, Op};
use crate::wallet::{Address, Secret};
use crate::workspace::{Item, Name, Value};

/// Structured, printable form of an item or a pending operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Number literal.
    Number(BigUint),
    /// Hexadecimal byte literal.
    Bytes(Vec<u8>),
    /// Base58Check address literal.
    Address(Address),
    /// WIF secret literal.
    Secret(Secret),
    /// `$`-prefixed name.
    Name(Name),
    /// Brace list.
    List(Vec<Expression>),
    /// Binary operation.
    Operation {
        /// Left operand.
        lhs: Box<Expression>,
        /// Operator.
        op: Op,
        /// Right operand.
        rhs: Box<Expression>,
    },
    /// Constructor application.
    Construction {
        /// Constructor keyword.
        constructor: Constructor,
        /// Ordered arguments.
        args: Vec<Expression>,
    },
    /// Function application.
    Application {
        /// Function keyword.
        function: Function,
        /// The single argument.
        arg: Box<Expression>,
    },
}

impl fmt::Display for Expression {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(n) => write!(formatter, "{}", n),
            Expression::Bytes(bytes) => formatter.write_str(&hex::encode(bytes)),
            Expression::Address(address) => formatter.write_str(&address.to_base58check()),
            Expression::Secret(secret) => formatter.write_str(&secret.to_wif()),
            Expression::Name(name) => write!(formatter, "{}", name),

            Expression::List(items) => {
                formatter.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        formatter.write_str(", ")?;
                    }
                    fmt::Display::fmt(item, formatter)?;
                }
                formatter.write_str("}")
            }

            Expression::Operation { lhs, op, rhs } => {
                write!(formatter, "({} {} {})", lhs, op, rhs)
            }

            Expression::Construction { constructor, args } => {
                write!(formatter, "{}(", constructor)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        formatter.write_str(", ")?;
                    }
                    fmt::Display::fmt(arg, formatter)?;
                }
                formatter.write_str(")")
            }

            Expression::Application { function, arg } => {
                write!(formatter, "{} {}", function, arg)
            }
        }
    }
}

impl Item {
    /// The printable expression form of this item.
    pub fn express(&self) -> Expression {
        match self {
            Item::Number(n) => Expression::Number(n.clone()),
            Item::Bytes(bytes) => Expression::Bytes(bytes.clone()),
            Item::Address(address) => Expression::Address(*address),
            Item::Secret(secret) => Expression::Secret(*secret),
            Item::Pubkey(pubkey) => Expression::Bytes(pubkey.to_bytes()),
            Item::Script(script) => Expression::Bytes(script.bytes().to_vec()),

            Item::Outpoint(outpoint) => Expression::Construction {
                constructor: Constructor::Outpoint,
                args: vec![
                    Expression::Bytes(outpoint.txid.to_vec()),
                    Expression::Number(BigUint::from(outpoint.index)),
                ],
            },

            Item::Input(input) => Expression::Construction {
                constructor: Constructor::Input,
                args: vec![
                    Item::Outpoint(input.outpoint).express(),
                    Expression::Bytes(input.script.bytes().to_vec()),
                ],
            },

            Item::Output(output) => Expression::Construction {
                constructor: Constructor::Output,
                args: vec![
                    Expression::Number(BigUint::from(output.value)),
                    Expression::Bytes(output.script.bytes().to_vec()),
                ],
            },

            Item::Transaction(transaction) => Expression::Construction {
                constructor: Constructor::Transaction,
                args: vec![
                    Expression::List(
                        transaction
                            .inputs
                            .iter()
                            .map(|input| Item::Input(input.clone()).express())
                            .collect(),
                    ),
                    Expression::List(
                        transaction
                            .outputs
                            .iter()
                            .map(|output| Item::Output(output.clone()).express())
                            .collect(),
                    ),
                ],
            },

            Item::Wallet(wallet) => Expression::Construction {
                constructor: Constructor::Wallet,
                args: vec![Expression::Address(wallet.next_address())],
            },

            // Key sources render as the address they would derive next;
            // their seed stays private.
            Item::KeySource(source) => Expression::Address(source.address()),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.express(), formatter)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Item(item) => fmt::Display::fmt(item, formatter),
            Value::List(items) => {
                let list = Expression::List(items.iter().map(Item::express).collect());
                fmt::Display::fmt(&list, formatter)
            }
        }
    }
}

/// Reads a decimal number literal.
pub fn read_number(text: &str) -> Option<BigUint> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(text.as_bytes(), 10)
}

/// Reads an even-length hexadecimal byte literal.
pub fn read_bytes(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    hex::decode(text).ok()
}

/// Reads a `$`-prefixed name.
pub fn read_name(text: &str) -> Option<Name> {
    if !text.starts_with('$') {
        return None;
    }
    let identifier = &text[1..];
    if identifier.is_empty()
        || !identifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    {
        return None;
    }
    Some(Name::new(identifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::KeySource;

    #[test]
    fn atomic_literals_round_trip() {
        let number = read_number("12345").unwrap();
        assert_eq!(Expression::Number(number.clone()).to_string(), "12345");
        assert_eq!(read_number(&number.to_string()), Some(number));
        assert!(read_number("12a5").is_none());

        let bytes = read_bytes("deadbeef").unwrap();
        assert_eq!(Expression::Bytes(bytes.clone()).to_string(), "deadbeef");
        assert_eq!(read_bytes("deadbee"), None);

        let name = read_name("$change_key").unwrap();
        assert_eq!(name.to_string(), "$change_key");
        assert_eq!(read_name(&name.to_string()), Some(name));
        assert!(read_name("change_key").is_none());

        let secret = KeySource::new([5_u8; 32]).secret();
        let wif = Expression::Secret(secret).to_string();
        assert_eq!(Secret::from_wif(&wif), Some(secret));

        let address = secret.pubkey().address();
        let encoded = Expression::Address(address).to_string();
        assert_eq!(Address::from_base58check(&encoded), Some(address));
    }

    #[test]
    fn compound_items_render_as_constructions() {
        use crate::wallet::{Outpoint, Output, Script};

        let outpoint = Item::Outpoint(Outpoint {
            txid: [0xab; 32],
            index: 3,
        });
        let rendered = outpoint.to_string();
        assert!(rendered.starts_with("outpoint("));
        assert!(rendered.ends_with(", 3)"));

        let output = Item::Output(Output {
            value: 40,
            script: Script::new(vec![1, 1]),
        });
        assert_eq!(output.to_string(), "output(40, 0101)");
    }

    #[test]
    fn operations_render_parenthesized() {
        let expression = Expression::Operation {
            lhs: Box::new(Expression::Number(BigUint::from(2_u32))),
            op: Op::Plus,
            rhs: Box::new(Expression::Operation {
                lhs: Box::new(Expression::Number(BigUint::from(3_u32))),
                op: Op::Times,
                rhs: Box::new(Expression::Name(Name::new("x"))),
            }),
        };
        assert_eq!(expression.to_string(), "(2 + (3 * $x))");
    }
}
