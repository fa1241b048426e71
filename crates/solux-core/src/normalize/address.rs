//! Address record normalization.
//!
//! Merges `getBalance` + `getAccountInfo` (and optionally
//! `getTokenAccountsByOwner` and a `getSignaturesForAddress` activity
//! summary) into one record. Secondary lookups are best-effort: their
//! failure leaves the corresponding fields at their defaults.

use serde::Serialize;
use serde_json::Value;

use crate::providers::programs::{SPL_TOKEN_PROGRAM, SYSTEM_PROGRAM};

use super::tokens::{parse_token_accounts, NftHolding, TokenHolding};
use super::{bool_at, opt_i64_at, str_at, u64_at, unwrap_context, TxStatus};

/// Inferred account classification.
///
/// Derivation: executable accounts are programs; accounts owned by the SPL
/// Token program are token accounts; accounts owned by the System program
/// are wallets; anything else is program-owned state, reported as `system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Wallet,
    Program,
    Token,
    System,
}

/// On-chain account fields from `getAccountInfo`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    pub lamports: u64,
    pub owner: String,
    pub executable: bool,
    pub rent_epoch: u64,
    pub data: AccountData,
}

/// Program-owned data attached to the account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    /// Owning program, duplicated here for UI convenience.
    pub program: String,
    pub parsed: Option<Value>,
}

/// Recent-activity summary from `getSignaturesForAddress`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressStats {
    pub transaction_count: usize,
    pub first_transaction: Option<String>,
    pub last_transaction: Option<String>,
    pub successful_transactions: usize,
    pub failed_transactions: usize,
}

/// The stable external address record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    pub address: String,
    pub exists: bool,
    pub account: Option<AccountDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<TokenHolding>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nfts: Option<Vec<NftHolding>>,
    pub stats: AddressStats,
    #[serde(rename = "type")]
    pub account_type: AccountType,
}

/// Extracts lamports from a `getBalance` result, which may be a bare number
/// or a `{context, value}` wrapper. `None` when the account does not exist.
#[must_use]
pub fn lamports_of(balance_raw: &Value) -> Option<u64> {
    let value = unwrap_context(balance_raw);
    value.as_u64()
}

/// Unwraps a `getAccountInfo` result into account details. `None` when the
/// account does not exist.
#[must_use]
pub fn account_details(account_raw: &Value, lamports: Option<u64>) -> Option<AccountDetails> {
    let account = unwrap_context(account_raw);
    if account.is_null() {
        return None;
    }
    let owner = str_at(account, "owner");
    Some(AccountDetails {
        lamports: lamports.unwrap_or_else(|| u64_at(account, "lamports")),
        executable: bool_at(account, "executable"),
        rent_epoch: u64_at(account, "rentEpoch"),
        data: AccountData {
            program: owner.clone(),
            parsed: account
                .get("data")
                .and_then(|data| data.get("parsed"))
                .filter(|parsed| !parsed.is_null())
                .cloned(),
        },
        owner,
    })
}

/// Classifies an account per the derivation table on [`AccountType`].
#[must_use]
pub fn derive_account_type(account: Option<&AccountDetails>) -> AccountType {
    let Some(account) = account else { return AccountType::Wallet };
    if account.executable {
        AccountType::Program
    } else if account.owner == SPL_TOKEN_PROGRAM {
        AccountType::Token
    } else if account.owner == SYSTEM_PROGRAM {
        AccountType::Wallet
    } else {
        AccountType::System
    }
}

fn rfc3339_of_unix(seconds: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(seconds, 0).map(|ts| ts.to_rfc3339())
}

/// Summarizes `getSignaturesForAddress` output. Signatures arrive newest
/// first, so the first entry is the most recent activity.
#[must_use]
pub fn address_stats(signatures_raw: Option<&Value>) -> AddressStats {
    let Some(raw) = signatures_raw else { return AddressStats::default() };
    let signatures = match raw.as_array() {
        Some(list) => list.as_slice(),
        None => return AddressStats::default(),
    };

    let successful = signatures
        .iter()
        .filter(|sig| TxStatus::from_meta(sig).is_success())
        .count();

    AddressStats {
        transaction_count: signatures.len(),
        last_transaction: signatures
            .first()
            .and_then(|sig| opt_i64_at(sig, "blockTime"))
            .and_then(rfc3339_of_unix),
        first_transaction: signatures
            .last()
            .and_then(|sig| opt_i64_at(sig, "blockTime"))
            .and_then(rfc3339_of_unix),
        successful_transactions: successful,
        failed_transactions: signatures.len() - successful,
    }
}

/// Assembles the full address record from its constituent lookups.
#[must_use]
pub fn normalize_address(
    address: &str,
    balance_raw: &Value,
    account_raw: &Value,
    token_accounts_raw: Option<&Value>,
    signatures_raw: Option<&Value>,
    include_tokens: bool,
) -> AddressRecord {
    let lamports = lamports_of(balance_raw);
    let account = account_details(account_raw, lamports);
    let account_type = derive_account_type(account.as_ref());
    let exists = lamports.is_some() || account.is_some();

    let (tokens, nfts) = if include_tokens {
        let parsed = token_accounts_raw.map(parse_token_accounts).unwrap_or_default();
        let (fungible, nft): (Vec<_>, Vec<_>) =
            parsed.into_iter().partition(|account| !account.is_nft());
        (
            Some(fungible.into_iter().map(|account| account.into_holding(None, None)).collect()),
            Some(nft.into_iter().map(NftHolding::from_account).collect()),
        )
    } else {
        (None, None)
    };

    AddressRecord {
        address: address.to_string(),
        exists,
        account,
        tokens,
        nfts,
        stats: address_stats(signatures_raw),
        account_type,
    }
}
