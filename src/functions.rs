//! Named functions of the command language.
//!
//! Functions are unary; forms that logically take several arguments receive
//! them as a brace list, e.g. `spend {$wallet, output(40, $script)}`.

use num_bigint::BigUint;
use sha2::{Digest, Sha256, Sha512};

use crate::workspace::{Error, Item, Value};

/// Function keyword of the command language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// `identity x` — returns its argument unchanged.
    Identity,
    /// `SHA256 x` — digest of bytes or a script.
    Sha256,
    /// `SHA512 x` — digest of bytes or a script.
    Sha512,
    /// `address p` — payment address of a public key.
    Address,
    /// `public_key s` — public key of a secret.
    PublicKey,
    /// `update k` — advances a key source; `update {w, op, out}` adds a
    /// fund to a wallet.
    Update,
    /// `spend {w, out}` — transaction spending a wallet's funds.
    Spend,
    /// `next_address k` — receiving address of a key source or wallet.
    NextAddress,
    /// `evaluate_script s` — 1 if the script evaluates truthy, else 0.
    EvaluateScript,
}

impl Function {
    /// Keyword as written in statements.
    pub fn keyword(self) -> &'static str {
        match self {
            Function::Identity => "identity",
            Function::Sha256 => "SHA256",
            Function::Sha512 => "SHA512",
            Function::Address => "address",
            Function::PublicKey => "public_key",
            Function::Update => "update",
            Function::Spend => "spend",
            Function::NextAddress => "next_address",
            Function::EvaluateScript => "evaluate_script",
        }
    }

    /// Resolves a keyword to its function.
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "identity" => Function::Identity,
            "SHA256" => Function::Sha256,
            "SHA512" => Function::Sha512,
            "address" => Function::Address,
            "public_key" => Function::PublicKey,
            "update" => Function::Update,
            "spend" => Function::Spend,
            "next_address" => Function::NextAddress,
            "evaluate_script" => Function::EvaluateScript,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.keyword())
    }
}

fn digestible(item: &Item) -> Option<&[u8]> {
    match item {
        Item::Bytes(bytes) => Some(bytes),
        Item::Script(script) => Some(script.bytes()),
        _ => None,
    }
}

/// Applies a named function to its completed argument.
///
/// Argument shapes outside the function's domain fail with an
/// invalid-operation class error; the table is total.
pub fn apply(function: Function, arg: Value) -> Result<Item, Error> {
    let mistyped = || Error::InvalidArgument(function.keyword());

    match (function, arg) {
        (Function::Identity, Value::Item(item)) => Ok(item),

        (Function::Sha256, Value::Item(ref item)) => {
            let data = digestible(item).ok_or_else(mistyped)?;
            Ok(Item::Bytes(Sha256::digest(data).to_vec()))
        }
        (Function::Sha512, Value::Item(ref item)) => {
            let data = digestible(item).ok_or_else(mistyped)?;
            Ok(Item::Bytes(Sha512::digest(data).to_vec()))
        }

        (Function::Address, Value::Item(Item::Pubkey(pubkey))) => {
            Ok(Item::Address(pubkey.address()))
        }
        (Function::PublicKey, Value::Item(Item::Secret(secret))) => {
            Ok(Item::Pubkey(secret.pubkey()))
        }

        (Function::Update, Value::Item(Item::KeySource(source))) => {
            Ok(Item::KeySource(source.increment()))
        }
        (Function::Update, Value::List(items)) => match items.as_slice() {
            [Item::Wallet(wallet), Item::Outpoint(outpoint), Item::Output(output)] => {
                Ok(Item::Wallet(wallet.receive(*outpoint, output.clone())))
            }
            _ => Err(mistyped()),
        },

        (Function::NextAddress, Value::Item(Item::KeySource(source))) => {
            Ok(Item::Address(source.address()))
        }
        (Function::NextAddress, Value::Item(Item::Wallet(wallet))) => {
            Ok(Item::Address(wallet.next_address()))
        }

        (Function::Spend, Value::List(items)) => match items.as_slice() {
            [Item::Wallet(wallet), Item::Output(output)] => wallet
                .spend(output)
                .map(Item::Transaction)
                .ok_or_else(mistyped),
            _ => Err(mistyped()),
        },

        (Function::EvaluateScript, Value::Item(Item::Script(script))) => {
            Ok(Item::Number(BigUint::from(script.evaluate() as u8)))
        }

        _ => Err(mistyped()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::{KeySource, Script};
    use assert_matches::assert_matches;

    #[test]
    fn digests_cover_bytes_and_scripts() {
        let bytes = Item::Bytes(vec![1, 2, 3]);
        let digest = apply(Function::Sha256, Value::Item(bytes.clone())).unwrap();
        assert_matches!(digest, Item::Bytes(ref d) if d.len() == 32);

        let script = Item::Script(Script::new(vec![1, 2, 3]));
        let script_digest = apply(Function::Sha256, Value::Item(script)).unwrap();
        // A script digests the same as its underlying bytes.
        assert_eq!(digest, script_digest);

        let wide = apply(Function::Sha512, Value::Item(bytes)).unwrap();
        assert_matches!(wide, Item::Bytes(ref d) if d.len() == 64);
    }

    #[test]
    fn update_advances_a_key_source() {
        let source = KeySource::new([9_u8; 32]);
        let updated = apply(Function::Update, Value::Item(Item::KeySource(source))).unwrap();
        assert_eq!(updated, Item::KeySource(source.increment()));
    }

    #[test]
    fn mistyped_arguments_are_rejected() {
        let number = Item::Number(num_bigint::BigUint::from(5_u32));
        assert_matches!(
            apply(Function::Address, Value::Item(number.clone())),
            Err(Error::InvalidArgument("address"))
        );
        assert_matches!(
            apply(Function::Spend, Value::Item(number.clone())),
            Err(Error::InvalidArgument("spend"))
        );
        // `identity` alone accepts every single item...
        assert_matches!(apply(Function::Identity, Value::Item(number)), Ok(_));
        // ...but not a bare list.
        assert_matches!(
            apply(Function::Identity, Value::List(vec![])),
            Err(Error::InvalidArgument("identity"))
        );
    }
}
