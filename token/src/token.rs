//! # Fungible Token
//!
//! An in-memory fungible asset: per-address balances plus an ERC-20-style
//! allowance table so a contract account can pull funds that a holder has
//! pre-approved. The staking ledger is bound to two of these — one it pulls
//! principal from, one it pays rewards out of.
//!
//! Token IDs are deterministic BLAKE3 hashes of the token's canonical
//! properties (name, symbol, issuer). The same token always gets the same
//! ID regardless of when or where it is registered.
//!
//! All supply and balance mutations use checked arithmetic — wrapping
//! arithmetic and money do not mix.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::address::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Attempted to move more than the holder's available balance.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The holder's current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// A delegated pull exceeds what the holder approved for the spender.
    #[error("insufficient allowance: approved {approved}, requested {requested}")]
    InsufficientAllowance {
        /// The spender's current allowance from the holder.
        approved: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// A mint or credit would overflow `u64`.
    #[error("supply overflow: crediting {amount} would exceed u64::MAX")]
    SupplyOverflow {
        /// The amount that caused the overflow.
        amount: u64,
    },
}

// ---------------------------------------------------------------------------
// TokenId
// ---------------------------------------------------------------------------

/// A unique, content-addressed identifier for a token type.
///
/// Computed as `BLAKE3(name || symbol || issuer_address)` with `0x00`
/// separators between fields. Two tokens with identical properties always
/// produce the same ID. The all-zero ID is the null identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId([u8; 32]);

impl TokenId {
    /// The null token identity. No real token hashes to this.
    pub const ZERO: TokenId = TokenId([0u8; 32]);

    /// Creates a `TokenId` from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 32-byte identifier.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the hex-encoded token ID.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex-encoded token ID.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Derives a `TokenId` from the canonical token properties.
    ///
    /// The hash input is `name || 0x00 || symbol || 0x00 || issuer`. The
    /// separator bytes prevent ambiguity when one field's suffix matches
    /// another field's prefix.
    pub fn derive(name: &str, symbol: &str, issuer: &Address) -> Self {
        let mut preimage = Vec::with_capacity(name.len() + symbol.len() + 34);
        preimage.extend_from_slice(name.as_bytes());
        preimage.push(0x00);
        preimage.extend_from_slice(symbol.as_bytes());
        preimage.push(0x00);
        preimage.extend_from_slice(issuer.as_bytes());

        Self(*blake3::hash(&preimage).as_bytes())
    }

    /// Returns `true` for the null identity.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for TokenId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Serde helper: serialize HashMap<(Address, Address), u64> with string keys
// ---------------------------------------------------------------------------

/// Serde helper module for the allowance map.
///
/// JSON requires map keys to be strings, but the allowance table is keyed
/// by an `(Address, Address)` tuple. This module flattens the key to
/// `"<holder_hex>:<spender_hex>"` so the map serializes correctly.
mod allowance_map {
    use super::Address;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S>(
        map: &HashMap<(Address, Address), u64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        let mut ser_map = serializer.serialize_map(Some(map.len()))?;
        for ((holder, spender), amount) in map {
            ser_map.serialize_entry(&format!("{}:{}", holder.to_hex(), spender.to_hex()), amount)?;
        }
        ser_map.end()
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<HashMap<(Address, Address), u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string_map: HashMap<String, u64> = HashMap::deserialize(deserializer)?;
        string_map
            .into_iter()
            .map(|(key, amount)| {
                let (holder, spender) = key
                    .split_once(':')
                    .ok_or_else(|| serde::de::Error::custom("allowance key missing ':'"))?;
                let holder = Address::from_hex(holder).map_err(serde::de::Error::custom)?;
                let spender = Address::from_hex(spender).map_err(serde::de::Error::custom)?;
                Ok(((holder, spender), amount))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// An in-memory fungible token ledger.
///
/// In production this state would live in the host's state trie; the
/// in-memory representation carries the same semantics for contract logic
/// and testing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Content-addressed token identity.
    id: TokenId,
    /// Human-readable token name (e.g., "Stake Token").
    name: String,
    /// Ticker symbol (e.g., "STK").
    symbol: String,
    /// Number of decimal places in the smallest denomination.
    decimals: u8,
    /// Current total supply in the smallest denomination.
    total_supply: u64,
    /// Per-address balances. Absent address == zero balance.
    balances: HashMap<Address, u64>,
    /// `(holder, spender) -> approved amount` for delegated pulls.
    #[serde(with = "allowance_map")]
    allowances: HashMap<(Address, Address), u64>,
}

impl Token {
    /// Creates a new token with zero supply.
    ///
    /// The ID is derived from `(name, symbol, issuer)`, so the same triple
    /// always yields the same token identity.
    pub fn new(name: &str, symbol: &str, decimals: u8, issuer: &Address) -> Self {
        Self {
            id: TokenId::derive(name, symbol, issuer),
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    /// The token's content-addressed identity.
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// Human-readable token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Decimal places of the smallest denomination.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Current total supply.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Returns the balance of `account`, or 0 if it has never held funds.
    pub fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Returns what `spender` may still pull from `holder`, or 0.
    pub fn allowance(&self, holder: &Address, spender: &Address) -> u64 {
        self.allowances
            .get(&(*holder, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Mints new supply to `to`.
    ///
    /// Supply creation is the host's concern (issuer gating, signatures);
    /// here it exists so tests and demo setups can fund accounts and the
    /// reward pool.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::SupplyOverflow`] if total supply or the
    /// recipient's balance would overflow `u64`.
    pub fn mint(&mut self, to: &Address, amount: u64) -> Result<(), TokenError> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow { amount })?;

        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow { amount })?;

        self.total_supply = new_supply;
        Ok(())
    }

    /// Moves `amount` from `from` to `to`.
    ///
    /// A zero-amount transfer is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientBalance`] if `from` holds less
    /// than `amount`. No state changes on failure.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), TokenError> {
        if amount == 0 {
            return Ok(());
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }

        // Both sides validated before either is written, so a failure
        // cannot leave the transfer half-applied.
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow { amount })?;

        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }

    /// Sets `spender`'s allowance from `holder` to exactly `amount`.
    ///
    /// Overwrites any previous approval; approving 0 revokes.
    pub fn approve(&mut self, holder: &Address, spender: &Address, amount: u64) {
        if amount == 0 {
            self.allowances.remove(&(*holder, *spender));
        } else {
            self.allowances.insert((*holder, *spender), amount);
        }
    }

    /// Pulls `amount` from `from` to `to` on behalf of `spender`.
    ///
    /// Requires `spender` to have a sufficient allowance from `from`; the
    /// allowance is consumed by the pulled amount. Atomic: a failed balance
    /// check leaves the allowance untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientAllowance`] if the approval does
    /// not cover `amount`, or [`TokenError::InsufficientBalance`] if `from`
    /// holds less than `amount`.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), TokenError> {
        if amount == 0 {
            return Ok(());
        }

        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(TokenError::InsufficientAllowance {
                approved,
                requested: amount,
            });
        }

        // Balance moves first; a failed move leaves the allowance intact.
        self.transfer(from, to, amount)?;
        self.approve(from, spender, approved - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    fn stk() -> Token {
        Token::new("Stake Token", "STK", 8, &Address::from_label("issuer"))
    }

    #[test]
    fn id_is_deterministic() {
        let issuer = Address::from_label("issuer");
        let a = Token::new("Stake Token", "STK", 8, &issuer);
        let b = Token::new("Stake Token", "STK", 8, &issuer);
        assert_eq!(a.id(), b.id());
        assert!(!a.id().is_zero());
    }

    #[test]
    fn different_properties_different_id() {
        let issuer = Address::from_label("issuer");
        let a = Token::new("Stake Token", "STK", 8, &issuer);
        let b = Token::new("Reward Token", "RWD", 8, &issuer);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn mint_increases_supply_and_balance() {
        let mut t = stk();
        t.mint(&alice(), 1_000_000).unwrap();
        assert_eq!(t.total_supply(), 1_000_000);
        assert_eq!(t.balance_of(&alice()), 1_000_000);
    }

    #[test]
    fn transfer_moves_balance() {
        let mut t = stk();
        t.mint(&alice(), 1_000).unwrap();
        t.transfer(&alice(), &bob(), 400).unwrap();
        assert_eq!(t.balance_of(&alice()), 600);
        assert_eq!(t.balance_of(&bob()), 400);
    }

    #[test]
    fn transfer_more_than_balance_rejected() {
        let mut t = stk();
        t.mint(&alice(), 100).unwrap();
        let result = t.transfer(&alice(), &bob(), 200);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientBalance {
                available: 100,
                requested: 200
            })
        ));
        assert_eq!(t.balance_of(&alice()), 100);
    }

    #[test]
    fn zero_transfer_is_noop() {
        let mut t = stk();
        t.transfer(&alice(), &bob(), 0).unwrap();
        assert_eq!(t.balance_of(&bob()), 0);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let mut t = stk();
        let custody = Address::from_label("custody");
        t.mint(&alice(), 1_000).unwrap();
        t.approve(&alice(), &custody, 700);

        t.transfer_from(&custody, &alice(), &custody, 500).unwrap();
        assert_eq!(t.balance_of(&custody), 500);
        assert_eq!(t.allowance(&alice(), &custody), 200);
    }

    #[test]
    fn transfer_from_without_allowance_rejected() {
        let mut t = stk();
        let custody = Address::from_label("custody");
        t.mint(&alice(), 1_000).unwrap();
        let result = t.transfer_from(&custody, &alice(), &custody, 500);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn failed_pull_leaves_allowance_intact() {
        let mut t = stk();
        let custody = Address::from_label("custody");
        t.mint(&alice(), 100).unwrap();
        t.approve(&alice(), &custody, 500);

        // Allowance covers it, balance does not.
        let result = t.transfer_from(&custody, &alice(), &custody, 300);
        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
        assert_eq!(t.allowance(&alice(), &custody), 500);
        assert_eq!(t.balance_of(&alice()), 100);
    }

    #[test]
    fn serializes_with_outstanding_allowances() {
        let mut t = stk();
        let custody = Address::from_label("custody");
        t.mint(&alice(), 1_000).unwrap();
        t.approve(&alice(), &custody, 700);

        // Tuple keys flatten to "holder:spender" strings in JSON.
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains(&format!("{}:{}", alice().to_hex(), custody.to_hex())));

        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), t.id());
        assert_eq!(back.balance_of(&alice()), 1_000);
        assert_eq!(back.allowance(&alice(), &custody), 700);
    }

    #[test]
    fn malformed_allowance_key_rejected() {
        let json = r#"{
            "id": "0101010101010101010101010101010101010101010101010101010101010101",
            "name": "X", "symbol": "X", "decimals": 0, "total_supply": 0,
            "balances": {},
            "allowances": { "not-a-key": 5 }
        }"#;
        assert!(serde_json::from_str::<Token>(json).is_err());
    }

    #[test]
    fn mint_overflow_rejected() {
        let mut t = stk();
        t.mint(&alice(), u64::MAX).unwrap();
        assert!(matches!(
            t.mint(&bob(), 1),
            Err(TokenError::SupplyOverflow { amount: 1 })
        ));
    }
}
