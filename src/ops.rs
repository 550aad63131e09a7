//! Closed operator and constructor tables.
//!
//! Both tables are total functions: an unregistered combination is a lookup
//! failure reported as an error value, never a panic.

use num_traits::ToPrimitive;
use std::fmt;

use crate::wallet::{Input, Outpoint, Output, Transaction, Wallet};
use crate::workspace::{Error, Item, ItemType, Value};

/// Binary operator of the command language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Assignment (`=`). Not part of the operator table proper; handled as
    /// an interpreter transition because it replaces the workspace.
    Set,
    /// Concatenation (`<>`).
    Concat,
    /// Addition (`+`).
    Plus,
    /// Multiplication (`*`).
    Times,
}

impl Op {
    /// Binding strength; higher binds tighter.
    pub fn priority(self) -> usize {
        match self {
            Op::Set => 0,
            Op::Concat => 1,
            Op::Plus => 2,
            Op::Times => 3,
        }
    }

    /// Operator symbol as written in statements.
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Set => "=",
            Op::Concat => "<>",
            Op::Plus => "+",
            Op::Times => "*",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.symbol())
    }
}

/// Applies a registered operator to two items.
///
/// The registered triples are exactly:
/// number `+`/`*` number, secret `+`/`*` secret, pubkey `+` pubkey,
/// pubkey `*` secret, and script `<>` script. Every other combination
/// fails with an invalid-operation error.
pub fn apply(op: Op, lhs: Item, rhs: Item) -> Result<Item, Error> {
    match (lhs, op, rhs) {
        (Item::Number(a), Op::Plus, Item::Number(b)) => Ok(Item::Number(a + b)),
        (Item::Number(a), Op::Times, Item::Number(b)) => Ok(Item::Number(a * b)),
        (Item::Secret(a), Op::Plus, Item::Secret(b)) => Ok(Item::Secret(a + b)),
        (Item::Secret(a), Op::Times, Item::Secret(b)) => Ok(Item::Secret(a * b)),
        (Item::Pubkey(a), Op::Plus, Item::Pubkey(b)) => Ok(Item::Pubkey(a + b)),
        (Item::Pubkey(a), Op::Times, Item::Secret(b)) => Ok(Item::Pubkey(a * b)),
        (Item::Script(a), Op::Concat, Item::Script(b)) => Ok(Item::Script(a.concat(&b))),
        (lhs, op, rhs) => Err(Error::InvalidOperation {
            op: op.symbol(),
            lhs: lhs.ty(),
            rhs: rhs.ty(),
        }),
    }
}

/// The result type of a registered operator triple, or `None` if the triple
/// is not in the table. Mirrors [`apply`].
pub fn result_type(lhs: ItemType, op: Op, rhs: ItemType) -> Option<ItemType> {
    match (lhs, op, rhs) {
        (ItemType::Number, Op::Plus, ItemType::Number)
        | (ItemType::Number, Op::Times, ItemType::Number) => Some(ItemType::Number),
        (ItemType::Secret, Op::Plus, ItemType::Secret)
        | (ItemType::Secret, Op::Times, ItemType::Secret) => Some(ItemType::Secret),
        (ItemType::Pubkey, Op::Plus, ItemType::Pubkey)
        | (ItemType::Pubkey, Op::Times, ItemType::Secret) => Some(ItemType::Pubkey),
        (ItemType::Script, Op::Concat, ItemType::Script) => Some(ItemType::Script),
        _ => None,
    }
}

/// Compound builder keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constructor {
    /// `outpoint(txid, index)`
    Outpoint,
    /// `input(outpoint, script)`
    Input,
    /// `output(value, script)`
    Output,
    /// `transaction({inputs}, {outputs})`
    Transaction,
    /// `wallet(keysource)`
    Wallet,
}

/// Expected shape of a constructor argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// A single item of the given type.
    Item(ItemType),
    /// A brace list of items of the given type.
    List(ItemType),
}

impl Constructor {
    /// Keyword as written in statements.
    pub fn keyword(self) -> &'static str {
        match self {
            Constructor::Outpoint => "outpoint",
            Constructor::Input => "input",
            Constructor::Output => "output",
            Constructor::Transaction => "transaction",
            Constructor::Wallet => "wallet",
        }
    }

    /// Resolves a keyword to its constructor.
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "outpoint" => Constructor::Outpoint,
            "input" => Constructor::Input,
            "output" => Constructor::Output,
            "transaction" => Constructor::Transaction,
            "wallet" => Constructor::Wallet,
            _ => return None,
        })
    }

    /// Number of arguments the constructor requires.
    pub fn arity(self) -> usize {
        match self {
            Constructor::Wallet => 1,
            _ => 2,
        }
    }

    /// Expected argument shape at the given position.
    pub fn expected(self, position: usize) -> Expected {
        match (self, position) {
            (Constructor::Outpoint, 0) => Expected::Item(ItemType::Bytes),
            (Constructor::Outpoint, _) => Expected::Item(ItemType::Number),
            (Constructor::Input, 0) => Expected::Item(ItemType::Outpoint),
            (Constructor::Input, _) => Expected::Item(ItemType::Script),
            (Constructor::Output, 0) => Expected::Item(ItemType::Number),
            (Constructor::Output, _) => Expected::Item(ItemType::Script),
            (Constructor::Transaction, 0) => Expected::List(ItemType::Input),
            (Constructor::Transaction, _) => Expected::List(ItemType::Output),
            (Constructor::Wallet, _) => Expected::Item(ItemType::KeySource),
        }
    }

    fn mistyped(self, position: usize) -> Error {
        Error::InvalidConstruction {
            constructor: self.keyword(),
            reason: format!(
                "argument {} must be {}",
                position + 1,
                match self.expected(position) {
                    Expected::Item(ty) => format!("a {}", ty),
                    Expected::List(ty) => format!("a list of {}s", ty),
                },
            ),
        }
    }
}

impl fmt::Display for Constructor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.keyword())
    }
}

/// Builds a compound item from an ordered argument list, checking arity and
/// per-position types.
pub fn construct(constructor: Constructor, args: Vec<Value>) -> Result<Item, Error> {
    if args.len() != constructor.arity() {
        return Err(Error::InvalidConstruction {
            constructor: constructor.keyword(),
            reason: format!(
                "expected {} arguments, got {}",
                constructor.arity(),
                args.len()
            ),
        });
    }

    let mut args = args.into_iter();
    // Arity was checked above, so `next` calls below cannot miss; positions
    // are tracked for error reporting only.
    match constructor {
        Constructor::Outpoint => {
            let txid = match args.next() {
                Some(Value::Item(Item::Bytes(bytes))) if bytes.len() == 32 => {
                    let mut txid = [0_u8; 32];
                    txid.copy_from_slice(&bytes);
                    txid
                }
                _ => return Err(constructor.mistyped(0)),
            };
            let index = match args.next() {
                Some(Value::Item(Item::Number(n))) => match n.to_u32() {
                    Some(index) => index,
                    None => return Err(constructor.mistyped(1)),
                },
                _ => return Err(constructor.mistyped(1)),
            };
            Ok(Item::Outpoint(Outpoint { txid, index }))
        }

        Constructor::Input => {
            let outpoint = match args.next() {
                Some(Value::Item(Item::Outpoint(outpoint))) => outpoint,
                _ => return Err(constructor.mistyped(0)),
            };
            let script = match args.next() {
                Some(Value::Item(Item::Script(script))) => script,
                _ => return Err(constructor.mistyped(1)),
            };
            Ok(Item::Input(Input { outpoint, script }))
        }

        Constructor::Output => {
            let value = match args.next() {
                Some(Value::Item(Item::Number(n))) => match n.to_u64() {
                    Some(value) => value,
                    None => return Err(constructor.mistyped(0)),
                },
                _ => return Err(constructor.mistyped(0)),
            };
            let script = match args.next() {
                Some(Value::Item(Item::Script(script))) => script,
                _ => return Err(constructor.mistyped(1)),
            };
            Ok(Item::Output(Output { value, script }))
        }

        Constructor::Transaction => {
            let inputs = match args.next() {
                Some(Value::List(items)) => items
                    .into_iter()
                    .map(|item| match item {
                        Item::Input(input) => Ok(input),
                        _ => Err(constructor.mistyped(0)),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                _ => return Err(constructor.mistyped(0)),
            };
            let outputs = match args.next() {
                Some(Value::List(items)) => items
                    .into_iter()
                    .map(|item| match item {
                        Item::Output(output) => Ok(output),
                        _ => Err(constructor.mistyped(1)),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                _ => return Err(constructor.mistyped(1)),
            };
            Ok(Item::Transaction(Transaction { inputs, outputs }))
        }

        Constructor::Wallet => match args.next() {
            Some(Value::Item(Item::KeySource(source))) => {
                Ok(Item::Wallet(Wallet::empty(source)))
            }
            _ => Err(constructor.mistyped(0)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Script;
    use assert_matches::assert_matches;
    use num_bigint::BigUint;

    const ALL_TYPES: [ItemType; 12] = [
        ItemType::Number,
        ItemType::Bytes,
        ItemType::Address,
        ItemType::Pubkey,
        ItemType::Secret,
        ItemType::Script,
        ItemType::Outpoint,
        ItemType::Input,
        ItemType::Output,
        ItemType::Transaction,
        ItemType::Wallet,
        ItemType::KeySource,
    ];

    #[test]
    fn registered_triples() {
        assert_eq!(
            result_type(ItemType::Number, Op::Plus, ItemType::Number),
            Some(ItemType::Number)
        );
        assert_eq!(
            result_type(ItemType::Pubkey, Op::Times, ItemType::Secret),
            Some(ItemType::Pubkey)
        );
        assert_eq!(
            result_type(ItemType::Script, Op::Concat, ItemType::Script),
            Some(ItemType::Script)
        );
        // Registration is not symmetric.
        assert_eq!(
            result_type(ItemType::Secret, Op::Times, ItemType::Pubkey),
            None
        );
    }

    #[test]
    fn unregistered_triples_fail_without_panicking() {
        let registered = 7;
        let mut hits = 0;
        for &lhs in &ALL_TYPES {
            for &op in &[Op::Concat, Op::Plus, Op::Times] {
                for &rhs in &ALL_TYPES {
                    if result_type(lhs, op, rhs).is_some() {
                        hits += 1;
                    }
                }
            }
        }
        assert_eq!(hits, registered);

        // A representative miss carries the operand types in its error.
        let error = apply(
            Op::Concat,
            Item::Number(BigUint::from(1_u32)),
            Item::Number(BigUint::from(2_u32)),
        )
        .unwrap_err();
        assert_eq!(
            error,
            Error::InvalidOperation {
                op: "<>",
                lhs: ItemType::Number,
                rhs: ItemType::Number,
            }
        );
    }

    #[test]
    fn numbers_do_not_overflow() {
        let big = BigUint::from(u64::max_value());
        let result = apply(Op::Times, Item::Number(big.clone()), Item::Number(big)).unwrap();
        assert_matches!(result, Item::Number(ref n) if n.bits() > 64);
    }

    #[test]
    fn outpoint_arity_and_types() {
        let txid = Value::Item(Item::Bytes(vec![0xab; 32]));
        let index = Value::Item(Item::Number(BigUint::from(1_u32)));

        let built = construct(Constructor::Outpoint, vec![txid.clone(), index.clone()]);
        assert_matches!(built, Ok(Item::Outpoint(_)));

        let too_few = construct(Constructor::Outpoint, vec![txid.clone()]);
        assert_matches!(too_few, Err(Error::InvalidConstruction { .. }));

        let short_txid = Value::Item(Item::Bytes(vec![0xab; 16]));
        let mistyped = construct(Constructor::Outpoint, vec![short_txid, index.clone()]);
        assert_matches!(mistyped, Err(Error::InvalidConstruction { .. }));

        let swapped = construct(Constructor::Outpoint, vec![index, txid]);
        assert_matches!(swapped, Err(Error::InvalidConstruction { .. }));
    }

    #[test]
    fn transaction_takes_lists() {
        let input = Item::Input(Input {
            outpoint: Outpoint {
                txid: [1; 32],
                index: 0,
            },
            script: Script::default(),
        });
        let output = Item::Output(Output {
            value: 10,
            script: Script::default(),
        });

        let built = construct(
            Constructor::Transaction,
            vec![Value::List(vec![input.clone()]), Value::List(vec![output.clone()])],
        );
        assert_matches!(built, Ok(Item::Transaction(_)));

        // A bare item where a list is expected is rejected.
        let bare = construct(
            Constructor::Transaction,
            vec![Value::Item(input), Value::List(vec![output.clone()])],
        );
        assert_matches!(bare, Err(Error::InvalidConstruction { .. }));

        // A mistyped list element is rejected, too.
        let mixed = construct(
            Constructor::Transaction,
            vec![Value::List(vec![output.clone()]), Value::List(vec![output])],
        );
        assert_matches!(mixed, Err(Error::InvalidConstruction { .. }));
    }
}
