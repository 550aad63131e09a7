//! Persistent workspace of named items and the statement response type.

use failure_derive::*;
use im::OrdMap;
use num_bigint::BigUint;
use std::fmt;

use crate::wallet::{
    Address, Input, KeySource, Outpoint, Output, Pubkey, Script, Secret, Transaction, Wallet,
};

/// Identifier under which an item is stored in a workspace.
///
/// Names are written with a `$` sigil in statement text; the sigil is not
/// part of the stored key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(String);

impl Name {
    /// Creates a name from its bare identifier (without the `$` sigil).
    pub fn new(identifier: &str) -> Self {
        Name(identifier.to_owned())
    }

    /// The bare identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "${}", self.0)
    }
}

/// Value stored in a workspace.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Arbitrary-precision natural number.
    Number(BigUint),
    /// Raw byte string.
    Bytes(Vec<u8>),
    /// Payment address.
    Address(Address),
    /// Public key.
    Pubkey(Pubkey),
    /// Secret key.
    Secret(Secret),
    /// Script.
    Script(Script),
    /// Reference to a transaction output.
    Outpoint(Outpoint),
    /// Transaction input.
    Input(Input),
    /// Transaction output.
    Output(Output),
    /// Transaction.
    Transaction(Transaction),
    /// Wallet.
    Wallet(Wallet),
    /// Deterministic key sequence.
    KeySource(KeySource),
}

impl Item {
    /// The type tag of this item.
    pub fn ty(&self) -> ItemType {
        match self {
            Item::Number(_) => ItemType::Number,
            Item::Bytes(_) => ItemType::Bytes,
            Item::Address(_) => ItemType::Address,
            Item::Pubkey(_) => ItemType::Pubkey,
            Item::Secret(_) => ItemType::Secret,
            Item::Script(_) => ItemType::Script,
            Item::Outpoint(_) => ItemType::Outpoint,
            Item::Input(_) => ItemType::Input,
            Item::Output(_) => ItemType::Output,
            Item::Transaction(_) => ItemType::Transaction,
            Item::Wallet(_) => ItemType::Wallet,
            Item::KeySource(_) => ItemType::KeySource,
        }
    }

    /// Validity of the underlying payload.
    pub fn valid(&self) -> bool {
        match self {
            Item::Number(_) | Item::Bytes(_) | Item::Script(_) => true,
            Item::Address(a) => a.valid(),
            Item::Pubkey(p) => p.valid(),
            Item::Secret(s) => s.valid(),
            Item::Outpoint(o) => o.valid(),
            Item::Input(i) => i.valid(),
            Item::Output(o) => o.valid(),
            Item::Transaction(t) => t.valid(),
            Item::Wallet(w) => w.valid(),
            Item::KeySource(k) => k.valid(),
        }
    }
}

/// Type tag of an [`Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// Natural number.
    Number,
    /// Byte string.
    Bytes,
    /// Payment address.
    Address,
    /// Public key.
    Pubkey,
    /// Secret key.
    Secret,
    /// Script.
    Script,
    /// Outpoint.
    Outpoint,
    /// Transaction input.
    Input,
    /// Transaction output.
    Output,
    /// Transaction.
    Transaction,
    /// Wallet.
    Wallet,
    /// Key source.
    KeySource,
}

impl fmt::Display for ItemType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            ItemType::Number => "number",
            ItemType::Bytes => "bytes",
            ItemType::Address => "address",
            ItemType::Pubkey => "pubkey",
            ItemType::Secret => "secret",
            ItemType::Script => "script",
            ItemType::Outpoint => "outpoint",
            ItemType::Input => "input",
            ItemType::Output => "output",
            ItemType::Transaction => "transaction",
            ItemType::Wallet => "wallet",
            ItemType::KeySource => "keysource",
        })
    }
}

/// A completed evaluation product: a single item, or a brace list of items
/// on its way into a constructor or function.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single item.
    Item(Item),
    /// A brace list, e.g. `{$a, $b}`.
    List(Vec<Item>),
}

impl Value {
    /// Extracts the single item, failing on a list.
    pub fn into_item(self) -> Result<Item, Error> {
        match self {
            Value::Item(item) => Ok(item),
            Value::List(_) => Err(Error::Format(
                "a list cannot be used as a single value".to_owned(),
            )),
        }
    }
}

/// Error terminating evaluation of a statement.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum Error {
    /// The tokenizer hit a character run it does not recognize.
    #[fail(display = "unrecognized character sequence at position {}", _0)]
    Lex(usize),

    /// The statement is malformed: wrong arity, incomplete expression,
    /// dangling operator, and the like.
    #[fail(display = "badly formatted statement: {}", _0)]
    Format(String),

    /// A name is not bound in the workspace.
    #[fail(display = "unrecognized name {}", _0)]
    UnrecognizedName(Name),

    /// The operator table has no entry for this type combination.
    #[fail(display = "invalid operation: {} {} {}", lhs, op, rhs)]
    InvalidOperation {
        /// Operator symbol.
        op: &'static str,
        /// Type of the left operand.
        lhs: ItemType,
        /// Type of the right operand.
        rhs: ItemType,
    },

    /// A named function was applied to an argument it does not accept.
    #[fail(display = "invalid operation: bad argument for {}", _0)]
    InvalidArgument(&'static str),

    /// A constructor was applied to a malformed argument list.
    #[fail(display = "cannot construct {}: {}", constructor, reason)]
    InvalidConstruction {
        /// Constructor keyword.
        constructor: &'static str,
        /// What went wrong.
        reason: String,
    },
}

/// Persistent mapping from names to items.
///
/// `set` returns a new workspace sharing unmodified structure with the
/// receiver; older snapshots are never affected by later assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    contents: OrdMap<Name, Item>,
}

impl Default for Workspace {
    fn default() -> Self {
        Workspace::new()
    }
}

impl Workspace {
    /// Creates an empty, valid workspace.
    pub fn new() -> Self {
        Workspace {
            contents: OrdMap::new(),
        }
    }

    /// Looks up an item by name.
    pub fn lookup(&self, name: &Name) -> Result<&Item, Error> {
        self.contents
            .get(name)
            .ok_or_else(|| Error::UnrecognizedName(name.clone()))
    }

    /// Returns a new workspace in which `name` is bound to `item`.
    pub fn set(&self, name: Name, item: Item) -> Workspace {
        Workspace {
            contents: self.contents.update(name, item),
        }
    }

    /// A workspace is valid iff every item bound in it is valid.
    pub fn valid(&self) -> bool {
        self.contents.values().all(Item::valid)
    }

    /// Iterates over the bindings in name order.
    pub fn items(&self) -> impl Iterator<Item = (&Name, &Item)> {
        self.contents.iter()
    }
}

/// Outcome of evaluating statement text against a workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Workspace after evaluation. On error this is the workspace as it
    /// stood before the failing statement began.
    pub workspace: Workspace,
    /// Value of the last non-void statement.
    pub value: Option<Value>,
    /// Error that terminated evaluation, if any.
    pub error: Option<Error>,
}

impl Response {
    pub(crate) fn success(workspace: Workspace, value: Option<Value>) -> Self {
        Response {
            workspace,
            value,
            error: None,
        }
    }

    pub(crate) fn failure(workspace: Workspace, error: Error) -> Self {
        Response {
            workspace,
            value: None,
            error: Some(error),
        }
    }

    /// A response is valid iff its workspace is valid and it carries no error.
    pub fn valid(&self) -> bool {
        self.error.is_none() && self.workspace.valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: u64) -> Item {
        Item::Number(BigUint::from(value))
    }

    #[test]
    fn set_leaves_older_snapshots_unchanged() {
        let empty = Workspace::new();
        let x = Name::new("x");
        let first = empty.set(x.clone(), number(1));
        let second = first.set(x.clone(), number(2));

        assert!(empty.lookup(&x).is_err());
        assert_eq!(first.lookup(&x).unwrap(), &number(1));
        assert_eq!(second.lookup(&x).unwrap(), &number(2));
    }

    #[test]
    fn lookup_miss_names_the_offender() {
        let workspace = Workspace::new();
        let missing = Name::new("missing");
        assert_eq!(
            workspace.lookup(&missing).unwrap_err(),
            Error::UnrecognizedName(missing)
        );
    }

    #[test]
    fn validity_requires_all_items_valid() {
        let workspace = Workspace::new();
        assert!(workspace.valid());

        let with_number = workspace.set(Name::new("n"), number(5));
        assert!(with_number.valid());

        let zero_output = Item::Output(crate::wallet::Output {
            value: 0,
            script: crate::wallet::Script::default(),
        });
        assert!(!zero_output.valid());
        let broken = with_number.set(Name::new("o"), zero_output);
        assert!(!broken.valid());
        // The older snapshot is untouched.
        assert!(with_number.valid());
    }

    #[test]
    fn names_render_with_sigil() {
        assert_eq!(Name::new("x").to_string(), "$x");
    }
}
