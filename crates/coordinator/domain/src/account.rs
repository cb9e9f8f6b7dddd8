//! Multisig account domain models and signer-set state management.

use core::{fmt, num::NonZeroU8};

use alloc::{string::String, vec::Vec};

use bon::Builder;
use dissolve_derive::Dissolve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Timestamps;

/// The weight assigned to a signer added through a signer update.
///
/// Accounts registered through this coordinator use one-signer-one-vote
/// semantics; ledgers with native per-signer weights may report other values
/// when the live account state is fetched.
pub const DEFAULT_SIGNER_WEIGHT: u8 = 1;

/// The public address of a ledger account.
///
/// This is a wrapper around the ledger's string address form that provides
/// type safety and seamless conversion to/from plain strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct AccountAddress(String);

/// The public key identifying one authorized signer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct SignerKey(String);

/// One entry in an account's signer set.
///
/// Each signer is identified by its public key and carries the weight the
/// ledger attributes to its signature when evaluating thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccountSigner {
    /// The signer's public key.
    key: SignerKey,

    /// The signature weight counted towards the account threshold.
    #[builder(default = DEFAULT_SIGNER_WEIGHT)]
    weight: u8,
}

/// A multisig account with type-state tracking of its signer set.
///
/// The registry stores account metadata (address, label, threshold) separately
/// from the signer set, so an account is first materialized without signers
/// and promoted via [`with_signers`](Self::with_signers) once the set is
/// loaded. The type parameter makes it impossible to run signer-dependent
/// logic against an account whose set was never attached.
///
/// # Type Parameters
///
/// * `S` - Signer-set state: [`WithSigners`] or [`WithoutSigners`]
/// * `AUX` - Auxiliary data type, defaults to [`Timestamps`]
///
/// # Examples
///
/// ```ignore
/// let account = MultisigAccount::builder()
///     .address(address)
///     .label("ops treasury")
///     .threshold(threshold)
///     .aux(())
///     .build();
///
/// // Attach the signer set (validates uniqueness and threshold coverage).
/// let account = account.with_signers(signers)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultisigAccount<S = WithoutSigners, AUX = Timestamps> {
    /// The account's public address.
    address: AccountAddress,

    /// A human-readable label for display purposes.
    label: String,

    /// The minimum signature weight required to execute proposals.
    threshold: NonZeroU8,

    /// The signer set (type-state: present or absent).
    signers: S,

    /// Auxiliary metadata associated with this account.
    aux: AUX,
}

/// Type-state marker indicating that the signer set has been attached.
///
/// This type wraps the validated signer entries and is used as a type
/// parameter in [`MultisigAccount`] to enforce compile-time checks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WithSigners(Vec<AccountSigner>);

/// Type-state marker indicating that the signer set has not been attached.
///
/// Used as a type parameter in [`MultisigAccount`] to enforce compile-time
/// checks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WithoutSigners;

#[bon::bon]
impl<AUX> MultisigAccount<WithoutSigners, AUX> {
    /// Creates a new multisig account without an attached signer set.
    ///
    /// Use the builder pattern to construct the account. After creation, use
    /// [`with_signers`](Self::with_signers) to attach and validate the signer
    /// set.
    #[builder]
    pub fn new(
        address: AccountAddress,
        label: String,
        threshold: NonZeroU8,
        aux: AUX,
    ) -> Self {
        Self {
            address,
            label,
            threshold,
            signers: WithoutSigners,
            aux,
        }
    }
}

impl<S, AUX1> MultisigAccount<S, AUX1> {
    /// Replaces the auxiliary data with a new value, returning both the
    /// updated account and the old auxiliary data.
    ///
    /// This is useful for transforming metadata while preserving the
    /// account's core state.
    ///
    /// # Returns
    ///
    /// A tuple of (new account with `AUX2`, old `AUX1` value)
    pub fn with_aux<AUX2>(self, aux: AUX2) -> (MultisigAccount<S, AUX2>, AUX1) {
        let account = MultisigAccount {
            address: self.address,
            label: self.label,
            threshold: self.threshold,
            signers: self.signers,
            aux,
        };

        (account, self.aux)
    }
}

impl<AUX> MultisigAccount<WithoutSigners, AUX> {
    /// Attaches the signer set to the account.
    ///
    /// This transitions the account from [`WithoutSigners`] to
    /// [`WithSigners`] state when the set is valid: non-empty, free of
    /// duplicate keys, and carrying enough total weight to ever satisfy the
    /// threshold.
    ///
    /// # Returns
    ///
    /// * `Some(account)` if the signer set is valid for this threshold
    /// * `None` if the set is empty, contains a duplicate key, or its total
    ///   weight is below the threshold
    pub fn with_signers(
        self,
        signers: Vec<AccountSigner>,
    ) -> Option<MultisigAccount<WithSigners, AUX>> {
        if signers.is_empty() || has_duplicate_keys(&signers) {
            return None;
        }

        let total_weight: u32 = signers.iter().map(|signer| u32::from(signer.weight())).sum();

        (total_weight >= u32::from(self.threshold.get())).then(|| MultisigAccount {
            address: self.address,
            label: self.label,
            threshold: self.threshold,
            signers: WithSigners(signers),
            aux: self.aux,
        })
    }
}

impl<S, AUX> MultisigAccount<S, AUX> {
    /// Returns the account address.
    pub fn address(&self) -> &AccountAddress {
        &self.address
    }

    /// Returns the human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the signature threshold required for proposal execution.
    pub fn threshold(&self) -> NonZeroU8 {
        self.threshold
    }

    /// Returns a reference to the auxiliary metadata.
    pub fn aux(&self) -> &AUX {
        &self.aux
    }
}

impl<AUX> MultisigAccount<WithSigners, AUX> {
    /// Returns the attached signer set.
    pub fn signers(&self) -> &[AccountSigner] {
        self.signers.get()
    }

    /// Returns the signer entry for `key`, if the key belongs to the set.
    pub fn signer(&self, key: &SignerKey) -> Option<&AccountSigner> {
        self.signers.get().iter().find(|signer| signer.key() == key)
    }

    /// Returns whether `key` belongs to the signer set.
    pub fn is_signer(&self, key: &SignerKey) -> bool {
        self.signer(key).is_some()
    }

    /// Returns the combined weight of every signer in the set.
    pub fn total_weight(&self) -> u32 {
        self.signers
            .get()
            .iter()
            .map(|signer| u32::from(signer.weight()))
            .sum()
    }
}

impl<AUX> MultisigAccount<WithoutSigners, AUX> {
    /// Dissolves the account, extracting the auxiliary data and returning a
    /// bare account.
    pub fn dissolve(self) -> (MultisigAccount<WithoutSigners, ()>, AUX) {
        self.with_aux(())
    }
}

impl<AUX> MultisigAccount<WithSigners, AUX> {
    /// Dissolves the account, extracting the signer set and auxiliary data.
    ///
    /// Returns a tuple of:
    /// 1. A bare account (no signer set, `()` as auxiliary data)
    /// 2. The signer entries
    /// 3. The original auxiliary data
    pub fn dissolve(self) -> (MultisigAccount<WithoutSigners, ()>, Vec<AccountSigner>, AUX) {
        let account = MultisigAccount {
            address: self.address,
            label: self.label,
            threshold: self.threshold,
            signers: WithoutSigners,
            aux: (),
        };

        (account, self.signers.into_inner(), self.aux)
    }
}

impl WithSigners {
    fn get(&self) -> &[AccountSigner] {
        &self.0
    }

    fn into_inner(self) -> Vec<AccountSigner> {
        self.0
    }
}

impl<AUX> From<MultisigAccount<WithSigners, AUX>> for MultisigAccount<WithoutSigners, AUX> {
    /// Converts an account with an attached signer set to a bare account,
    /// discarding the signers.
    fn from(account: MultisigAccount<WithSigners, AUX>) -> Self {
        let (account, _, aux) = account.dissolve();
        account.with_aux(aux).0
    }
}

impl AccountSigner {
    /// Returns the signer's public key.
    pub fn key(&self) -> &SignerKey {
        &self.key
    }

    /// Returns the signature weight counted towards the account threshold.
    pub fn weight(&self) -> u8 {
        self.weight
    }
}

fn has_duplicate_keys(signers: &[AccountSigner]) -> bool {
    let mut keys: Vec<&SignerKey> = signers.iter().map(AccountSigner::key).collect();
    keys.sort_unstable();
    keys.windows(2).any(|pair| pair[0] == pair[1])
}

impl AccountAddress {
    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AccountAddress {
    /// Wraps a plain string address.
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl From<&str> for AccountAddress {
    /// Wraps a plain string address.
    fn from(address: &str) -> Self {
        Self(address.into())
    }
}

impl From<AccountAddress> for String {
    /// Unwraps the underlying string address.
    fn from(AccountAddress(address): AccountAddress) -> Self {
        address
    }
}

impl fmt::Display for AccountAddress {
    /// Formats the address as its underlying string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SignerKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SignerKey {
    /// Wraps a plain string key.
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for SignerKey {
    /// Wraps a plain string key.
    fn from(key: &str) -> Self {
        Self(key.into())
    }
}

impl From<SignerKey> for String {
    /// Unwraps the underlying string key.
    fn from(SignerKey(key): SignerKey) -> Self {
        key
    }
}

impl fmt::Display for SignerKey {
    /// Formats the key as its underlying string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
