//! Command language for first-class Bitcoin wallet primitives.
//!
//! Statements over keys, addresses, scripts, transactions and wallets are
//! tokenized and evaluated in a single pass against a persistent workspace
//! of named items. Every statement either commits a new workspace or fails
//! as a whole, leaving the previous workspace untouched.
//!
//! # Examples
//!
//! ```
//! use rand::thread_rng;
//! use wallet_calc::{
//!     evaluate, wallet::Secret, Item, Name, Value, Workspace,
//! };
//!
//! // Arithmetic follows the usual precedence; `;` separates statements and
//! // each assignment produces a *new* workspace.
//! let empty = Workspace::new();
//! let response = evaluate(&empty, "$x = 2 + 3 * 4; $y = $x * $x");
//! assert!(response.valid());
//! assert_eq!(response.value.unwrap().to_string(), "196");
//! // The workspace we started from still knows nothing.
//! assert!(empty.lookup(&Name::new("x")).is_err());
//!
//! // Key arithmetic works the same way. Secrets add and multiply, and the
//! // operations commute with public key derivation.
//! let (a, b) = (
//!     Secret::random(&mut thread_rng()),
//!     Secret::random(&mut thread_rng()),
//! );
//! let workspace = response
//!     .workspace
//!     .set(Name::new("a"), Item::Secret(a))
//!     .set(Name::new("b"), Item::Secret(b));
//! let response = evaluate(&workspace, "public_key ($a + $b)");
//! assert_eq!(
//!     response.value,
//!     Some(Value::Item(Item::Pubkey((a + b).pubkey()))),
//! );
//! ```

#![deny(missing_docs, missing_debug_implementations)]

pub mod format;
pub mod functions;
mod interpreter;
pub mod ops;
pub mod tokenizer;
pub mod wallet;
mod workspace;

pub use crate::{
    interpreter::evaluate,
    workspace::{Error, Item, ItemType, Name, Response, Value, Workspace},
};
