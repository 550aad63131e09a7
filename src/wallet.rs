//! Opaque wallet primitives consumed by the command language.
//!
//! The interpreter core treats these types as black boxes: each one exposes
//! equality, a `valid` predicate and the few algebraic operations the
//! operator table names. Key arithmetic is performed over the Ed25519 group.

use curve25519::{
    constants::ED25519_BASEPOINT_POINT,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
    traits::IsIdentity,
};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256, Sha512};
use std::{fmt, ops};

const WIF_VERSION: u8 = 0x80;
const ADDRESS_VERSION: u8 = 0x00;

const BASE58_ALPHABET: &[u8; 58] =
    b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn double_sha256(data: &[u8]) -> Vec<u8> {
    let first = Sha256::digest(data);
    Sha256::digest(&first).to_vec()
}

/// Encodes a versioned payload in Base58Check.
pub fn base58check_encode(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + 5);
    data.push(version);
    data.extend_from_slice(payload);
    let checksum = double_sha256(&data);
    data.extend_from_slice(&checksum[..4]);

    let zeros = data.iter().take_while(|&&b| b == 0).count();
    let mut number = BigUint::from_bytes_be(&data);
    let base = BigUint::from(58_u8);
    let mut encoded = Vec::new();
    while !number.is_zero() {
        let digit = (&number % &base).to_usize().unwrap_or(0);
        encoded.push(BASE58_ALPHABET[digit]);
        number = &number / &base;
    }
    encoded.extend(std::iter::repeat(b'1').take(zeros));
    encoded.reverse();
    String::from_utf8(encoded).unwrap_or_default()
}

/// Decodes a Base58Check string into its version byte and payload.
///
/// Returns `None` on an invalid character, a checksum mismatch, or an input
/// too short to carry a checksum.
pub fn base58check_decode(text: &str) -> Option<(u8, Vec<u8>)> {
    let mut number = BigUint::zero();
    let base = BigUint::from(58_u8);
    for ch in text.bytes() {
        let digit = BASE58_ALPHABET.iter().position(|&b| b == ch)?;
        number = number * &base + BigUint::from(digit);
    }
    let zeros = text.bytes().take_while(|&b| b == b'1').count();
    let mut data = vec![0; zeros];
    if !number.is_zero() {
        data.extend_from_slice(&number.to_bytes_be());
    }
    if data.len() < 5 {
        return None;
    }
    let (payload, checksum) = data.split_at(data.len() - 4);
    if double_sha256(payload)[..4] != *checksum {
        return None;
    }
    Some((payload[0], payload[1..].to_vec()))
}

/// Secret key: a scalar of the key group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Secret(Scalar);

impl Secret {
    /// Generates a random secret key.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Secret(Scalar::random(rng))
    }

    pub(crate) fn from_hash(hash: Sha512) -> Self {
        Secret(Scalar::from_hash(hash))
    }

    /// A secret key is valid unless it is the zero scalar.
    pub fn valid(&self) -> bool {
        self.0 != Scalar::zero()
    }

    /// Renders the key in Wallet Import Format.
    pub fn to_wif(&self) -> String {
        base58check_encode(WIF_VERSION, self.0.as_bytes())
    }

    /// Reads a key from Wallet Import Format text.
    pub fn from_wif(text: &str) -> Option<Self> {
        let (version, payload) = base58check_decode(text)?;
        if version != WIF_VERSION || payload.len() != 32 {
            return None;
        }
        let mut bytes = [0_u8; 32];
        bytes.copy_from_slice(&payload);
        Scalar::from_canonical_bytes(bytes).map(Secret)
    }

    /// Derives the public key corresponding to this secret.
    pub fn pubkey(&self) -> Pubkey {
        Pubkey(ED25519_BASEPOINT_POINT * self.0)
    }
}

impl ops::Add for Secret {
    type Output = Secret;

    fn add(self, rhs: Self) -> Self::Output {
        Secret(self.0 + rhs.0)
    }
}

impl ops::Mul for Secret {
    type Output = Secret;

    fn mul(self, rhs: Self) -> Self::Output {
        Secret(self.0 * rhs.0)
    }
}

/// Public key: an element of the key group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pubkey(EdwardsPoint);

impl Pubkey {
    /// A public key is valid unless it is the identity element.
    pub fn valid(&self) -> bool {
        !self.0.is_identity()
    }

    /// Compressed 32-byte encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.compress().as_bytes().to_vec()
    }

    /// Reads a compressed public key.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 32 {
            return None;
        }
        CompressedEdwardsY::from_slice(bytes).decompress().map(Pubkey)
    }

    /// Derives the payment address for this key.
    pub fn address(&self) -> Address {
        let digest = Sha256::digest(&self.to_bytes());
        let mut hash = [0_u8; 20];
        hash.copy_from_slice(&digest[..20]);
        Address(hash)
    }
}

impl ops::Add for Pubkey {
    type Output = Pubkey;

    fn add(self, rhs: Self) -> Self::Output {
        Pubkey(self.0 + rhs.0)
    }
}

impl ops::Mul<Secret> for Pubkey {
    type Output = Pubkey;

    fn mul(self, rhs: Secret) -> Self::Output {
        Pubkey(self.0 * rhs.0)
    }
}

/// Payment address: a 20-byte key hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address([u8; 20]);

impl Address {
    /// An address is valid unless its hash is all zero.
    pub fn valid(&self) -> bool {
        self.0 != [0_u8; 20]
    }

    /// Base58Check rendering of the address.
    pub fn to_base58check(&self) -> String {
        base58check_encode(ADDRESS_VERSION, &self.0)
    }

    /// Reads an address from Base58Check text.
    pub fn from_base58check(text: &str) -> Option<Self> {
        let (version, payload) = base58check_decode(text)?;
        if version != ADDRESS_VERSION || payload.len() != 20 {
            return None;
        }
        let mut hash = [0_u8; 20];
        hash.copy_from_slice(&payload);
        Some(Address(hash))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.to_base58check())
    }
}

/// Script: a byte program attached to inputs and outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script(Vec<u8>);

impl Script {
    /// Wraps raw script bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }

    /// Raw script bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the concatenation of two scripts.
    pub fn concat(&self, other: &Script) -> Script {
        let mut bytes = self.0.clone();
        bytes.extend_from_slice(&other.0);
        Script(bytes)
    }

    /// Locking script paying to the given address.
    pub fn pay_to(address: &Address) -> Script {
        let mut bytes = vec![20];
        bytes.extend_from_slice(&address.0);
        Script(bytes)
    }

    /// Unlocking script revealing the given public key.
    pub fn unlock(pubkey: &Pubkey) -> Script {
        let mut bytes = vec![32];
        bytes.extend_from_slice(&pubkey.to_bytes());
        Script(bytes)
    }

    /// Runs the push-only fragment of the script machine.
    ///
    /// Each opcode `0x01..=0x4b` pushes that many following bytes; `0x00`
    /// pushes an empty datum. The script succeeds if it runs to completion
    /// and the top of the stack is nonzero. Anything beyond pushes fails.
    pub fn evaluate(&self) -> bool {
        let mut stack: Vec<&[u8]> = Vec::new();
        let mut position = 0;
        while position < self.0.len() {
            let opcode = self.0[position] as usize;
            position += 1;
            match opcode {
                0 => stack.push(&[]),
                1..=0x4b => {
                    if position + opcode > self.0.len() {
                        return false;
                    }
                    stack.push(&self.0[position..position + opcode]);
                    position += opcode;
                }
                _ => return false,
            }
        }
        stack
            .last()
            .map(|top| top.iter().any(|&b| b != 0))
            .unwrap_or(false)
    }
}

/// Reference to an output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outpoint {
    /// Identifier of the referenced transaction.
    pub txid: [u8; 32],
    /// Index of the referenced output.
    pub index: u32,
}

impl Outpoint {
    /// An outpoint is valid unless its txid is all zero.
    pub fn valid(&self) -> bool {
        self.txid != [0_u8; 32]
    }
}

/// Transaction input: an outpoint plus its unlocking script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Spent outpoint.
    pub outpoint: Outpoint,
    /// Unlocking script.
    pub script: Script,
}

impl Input {
    /// Validity of the spent outpoint.
    pub fn valid(&self) -> bool {
        self.outpoint.valid()
    }
}

/// Transaction output: an amount locked by a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Amount in satoshis.
    pub value: u64,
    /// Locking script.
    pub script: Script,
}

impl Output {
    /// An output is valid if it carries a nonzero amount.
    pub fn valid(&self) -> bool {
        self.value > 0
    }
}

/// Transaction: lists of inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Spent inputs.
    pub inputs: Vec<Input>,
    /// Created outputs.
    pub outputs: Vec<Output>,
}

impl Transaction {
    /// A transaction is valid if it spends and creates at least one output.
    pub fn valid(&self) -> bool {
        !self.inputs.is_empty()
            && !self.outputs.is_empty()
            && self.inputs.iter().all(Input::valid)
            && self.outputs.iter().all(Output::valid)
    }

    /// Byte serialization of the transaction.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1_u32.to_le_bytes());
        bytes.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            bytes.extend_from_slice(&input.outpoint.txid);
            bytes.extend_from_slice(&input.outpoint.index.to_le_bytes());
            bytes.extend_from_slice(&(input.script.0.len() as u32).to_le_bytes());
            bytes.extend_from_slice(&input.script.0);
        }
        bytes.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            bytes.extend_from_slice(&output.value.to_le_bytes());
            bytes.extend_from_slice(&(output.script.0.len() as u32).to_le_bytes());
            bytes.extend_from_slice(&output.script.0);
        }
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        bytes
    }

    /// Transaction identifier: double SHA-256 of the serialization.
    pub fn txid(&self) -> [u8; 32] {
        let digest = double_sha256(&self.serialize());
        let mut txid = [0_u8; 32];
        txid.copy_from_slice(&digest);
        txid
    }
}

/// Deterministic sequence of secret keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySource {
    seed: [u8; 32],
    index: u32,
}

impl KeySource {
    /// Creates a key source over the given seed, starting at index 0.
    pub fn new(seed: [u8; 32]) -> Self {
        KeySource { seed, index: 0 }
    }

    /// The secret key at the current index.
    pub fn secret(&self) -> Secret {
        let mut hash = Sha512::default();
        hash.input(&self.seed);
        hash.input(&self.index.to_le_bytes());
        Secret::from_hash(hash)
    }

    /// The payment address of the current key.
    pub fn address(&self) -> Address {
        self.secret().pubkey().address()
    }

    /// Advances the source to its next key.
    pub fn increment(&self) -> KeySource {
        KeySource {
            seed: self.seed,
            index: self.index + 1,
        }
    }

    /// Key sources derive nonzero scalars, so this holds in practice.
    pub fn valid(&self) -> bool {
        self.secret().valid()
    }
}

/// Wallet: a key source plus the spendable funds it controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    source: KeySource,
    funds: Vec<(Outpoint, Output)>,
}

impl Wallet {
    /// Creates an empty wallet around a key source.
    pub fn empty(source: KeySource) -> Self {
        Wallet {
            source,
            funds: Vec::new(),
        }
    }

    /// Returns a wallet with the given fund appended.
    pub fn receive(&self, outpoint: Outpoint, output: Output) -> Wallet {
        let mut funds = self.funds.clone();
        funds.push((outpoint, output));
        Wallet {
            source: self.source,
            funds,
        }
    }

    /// Total spendable amount.
    pub fn balance(&self) -> u64 {
        self.funds.iter().map(|(_, output)| output.value).sum()
    }

    /// Address at which the wallet can next receive funds.
    pub fn next_address(&self) -> Address {
        self.source.address()
    }

    /// The wallet's key source.
    pub fn source(&self) -> &KeySource {
        &self.source
    }

    /// Builds a transaction spending all funds to `output`, returning change
    /// to the wallet's own next address. `None` if the wallet has no funds or
    /// the balance does not cover the amount.
    pub fn spend(&self, output: &Output) -> Option<Transaction> {
        if self.funds.is_empty() || self.balance() < output.value {
            return None;
        }
        let unlock = Script::unlock(&self.source.secret().pubkey());
        let inputs = self
            .funds
            .iter()
            .map(|(outpoint, _)| Input {
                outpoint: *outpoint,
                script: unlock.clone(),
            })
            .collect();
        let mut outputs = vec![output.clone()];
        let change = self.balance() - output.value;
        if change > 0 {
            outputs.push(Output {
                value: change,
                script: Script::pay_to(&self.next_address()),
            });
        }
        Some(Transaction { inputs, outputs })
    }

    /// A wallet is valid if all of its funds are.
    pub fn valid(&self) -> bool {
        self.source.valid()
            && self
                .funds
                .iter()
                .all(|(outpoint, output)| outpoint.valid() && output.valid())
    }
}
