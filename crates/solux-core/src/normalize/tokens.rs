//! Token account, holdings page, and token record normalization.
//!
//! Metadata and market fields come exclusively from the configured
//! [`TokenMetadataProvider`]; unknown tokens are reported as unknown rather
//! than filled with plausible-looking values.

use serde::Serialize;
use serde_json::Value;

use crate::params::{AddressTokensQuery, SortOrder, TokenSort};
use crate::providers::{TokenMetadata, TokenMetadataProvider, TokenPrice};
use crate::types::Pagination;

use super::{at_path, f64_at, str_at, u64_at, unwrap_context};

/// One SPL token account, decoded from `jsonParsed` encoding.
#[derive(Debug, Clone)]
pub struct ParsedTokenAccount {
    pub pubkey: String,
    pub mint: String,
    pub amount: u64,
    pub amount_raw: String,
    pub decimals: u64,
    pub ui_amount: f64,
    pub ui_amount_string: String,
    pub frozen: bool,
}

impl ParsedTokenAccount {
    /// NFT heuristic: a supply of exactly one with zero decimals.
    #[must_use]
    pub fn is_nft(&self) -> bool {
        self.amount == 1 && self.decimals == 0
    }

    /// Converts into a fungible holding with whatever metadata and market
    /// data the provider produced.
    #[must_use]
    pub fn into_holding(
        self,
        metadata: Option<TokenMetadata>,
        price: Option<TokenPrice>,
    ) -> TokenHolding {
        TokenHolding {
            token_info: TokenInfoOut::from_metadata(&self.mint, metadata),
            balance: TokenBalance {
                amount: self.amount_raw,
                decimals: self.decimals,
                ui_amount: self.ui_amount,
                ui_amount_string: self.ui_amount_string,
            },
            mint: self.mint,
            token_account: self.pubkey,
            price,
            value: None,
            frozen: self.frozen,
        }
    }
}

/// Decodes a `getTokenAccountsByOwner` result. Accounts that are not
/// `jsonParsed` token accounts are skipped.
#[must_use]
pub fn parse_token_accounts(raw: &Value) -> Vec<ParsedTokenAccount> {
    unwrap_context(raw)
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| {
            let info = at_path(entry, &["account", "data", "parsed", "info"]);
            if info.is_null() {
                return None;
            }
            let token_amount = at_path(info, &["tokenAmount"]);
            let amount_raw = str_at(token_amount, "amount");
            Some(ParsedTokenAccount {
                pubkey: str_at(entry, "pubkey"),
                mint: str_at(info, "mint"),
                amount: amount_raw.parse().unwrap_or(0),
                amount_raw,
                decimals: u64_at(token_amount, "decimals"),
                ui_amount: f64_at(token_amount, "uiAmount"),
                ui_amount_string: str_at(token_amount, "uiAmountString"),
                frozen: info.get("state").and_then(Value::as_str) == Some("frozen"),
            })
        })
        .collect()
}

/// Token identity as exposed to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfoOut {
    pub name: String,
    pub symbol: String,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl TokenInfoOut {
    /// Falls back to an explicit unknown-token identity: the mint prefix as
    /// symbol, unverified.
    #[must_use]
    pub fn from_metadata(mint: &str, metadata: Option<TokenMetadata>) -> Self {
        match metadata {
            Some(meta) => Self {
                name: meta.name,
                symbol: meta.symbol,
                verified: meta.verified,
                logo_uri: meta.logo_uri,
                website: meta.website,
            },
            None => Self {
                name: "Unknown Token".to_string(),
                symbol: mint.chars().take(8).collect(),
                verified: false,
                logo_uri: None,
                website: None,
            },
        }
    }
}

/// Raw and UI-scaled balance of one token account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub amount: String,
    pub decimals: u64,
    pub ui_amount: f64,
    pub ui_amount_string: String,
}

/// Portfolio share of one holding, present only when a price source exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingValue {
    pub usd: f64,
    pub percentage: f64,
}

/// One fungible token position.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHolding {
    pub mint: String,
    pub token_account: String,
    pub balance: TokenBalance,
    pub token_info: TokenInfoOut,
    pub price: Option<TokenPrice>,
    pub value: Option<HoldingValue>,
    pub frozen: bool,
}

/// One NFT position. Metadata fields stay null until an NFT metadata
/// provider exists; they are never guessed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NftHolding {
    pub mint: String,
    pub token_account: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub image: Option<String>,
    pub collection: Option<String>,
    pub attributes: Vec<Value>,
    pub frozen: bool,
}

impl NftHolding {
    #[must_use]
    pub fn from_account(account: ParsedTokenAccount) -> Self {
        Self {
            mint: account.mint,
            token_account: account.pubkey,
            name: None,
            symbol: None,
            image: None,
            collection: None,
            attributes: Vec::new(),
            frozen: account.frozen,
        }
    }
}

/// A top holding in the portfolio summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopHolding {
    pub symbol: String,
    pub percentage: f64,
    pub value: f64,
}

/// Portfolio rollup across all returned holdings.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensSummary {
    pub total_tokens: usize,
    pub total_nfts: usize,
    pub total_value_usd: f64,
    pub top_holdings: Vec<TopHolding>,
}

/// The `/addresses/{address}/tokens` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressTokensPage {
    pub address: String,
    pub tokens: TokensGroup,
    pub summary: TokensSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensGroup {
    pub fungible: Vec<TokenHolding>,
    pub nfts: Vec<NftHolding>,
}

/// Builds the holdings page: zero-balance filter, NFT partition, provider
/// lookups, portfolio percentages, and the requested sort.
#[must_use]
pub fn build_holdings_page(
    address: &str,
    raw: &Value,
    provider: &dyn TokenMetadataProvider,
    query: &AddressTokensQuery,
) -> AddressTokensPage {
    let mut fungible: Vec<TokenHolding> = Vec::new();
    let mut nfts: Vec<NftHolding> = Vec::new();

    for account in parse_token_accounts(raw) {
        if !query.include_zero_balance && account.amount == 0 {
            continue;
        }
        if account.is_nft() {
            if query.include_nfts {
                nfts.push(NftHolding::from_account(account));
            }
            continue;
        }
        let metadata = provider.metadata(&account.mint);
        let price = query.include_prices.then(|| provider.price(&account.mint)).flatten();
        fungible.push(account.into_holding(metadata, price));
    }

    // Portfolio value and per-holding share, computable only where a price
    // source exists.
    let total_value_usd: f64 = fungible
        .iter()
        .filter_map(|holding| {
            holding.price.as_ref().map(|price| price.usd * holding.balance.ui_amount)
        })
        .sum();

    for holding in &mut fungible {
        if let Some(price) = &holding.price {
            let usd = price.usd * holding.balance.ui_amount;
            let percentage =
                if total_value_usd > 0.0 { usd / total_value_usd * 100.0 } else { 0.0 };
            holding.value = Some(HoldingValue { usd, percentage });
        }
    }

    fungible.sort_by(|a, b| {
        let ordering = match query.sort_by {
            TokenSort::Balance => a
                .balance
                .ui_amount
                .partial_cmp(&b.balance.ui_amount)
                .unwrap_or(std::cmp::Ordering::Equal),
            TokenSort::Value => {
                let a_value = a.value.as_ref().map_or(0.0, |value| value.usd);
                let b_value = b.value.as_ref().map_or(0.0, |value| value.usd);
                a_value.partial_cmp(&b_value).unwrap_or(std::cmp::Ordering::Equal)
            }
            TokenSort::Name => a.token_info.name.cmp(&b.token_info.name),
        };
        if query.sort_order == SortOrder::Desc {
            ordering.reverse()
        } else {
            ordering
        }
    });

    let mut top_holdings: Vec<TopHolding> = fungible
        .iter()
        .filter_map(|holding| {
            let value = holding.value.as_ref()?;
            (value.usd > 0.0).then(|| TopHolding {
                symbol: holding.token_info.symbol.clone(),
                percentage: value.percentage,
                value: value.usd,
            })
        })
        .collect();
    top_holdings.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    top_holdings.truncate(5);

    AddressTokensPage {
        address: address.to_string(),
        summary: TokensSummary {
            total_tokens: fungible.len(),
            total_nfts: nfts.len(),
            total_value_usd,
            top_holdings,
        },
        tokens: TokensGroup { fungible, nfts },
    }
}

/// The `/addresses/{address}/nfts` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressNftsPage {
    pub address: String,
    pub nfts: Vec<NftHolding>,
    pub pagination: Pagination,
}

/// Builds the NFT page from token accounts: NFT-heuristic filter, name
/// sort, offset/limit slice.
#[must_use]
pub fn build_nfts_page(
    address: &str,
    raw: &Value,
    limit: usize,
    offset: usize,
) -> AddressNftsPage {
    let mut nfts: Vec<NftHolding> = parse_token_accounts(raw)
        .into_iter()
        .filter(ParsedTokenAccount::is_nft)
        .map(NftHolding::from_account)
        .collect();

    // Metadata is all-null until a provider exists, so every sort key
    // degenerates to the mint.
    nfts.sort_by(|a, b| a.mint.cmp(&b.mint));

    let total = nfts.len();
    let page: Vec<NftHolding> = nfts.into_iter().skip(offset).take(limit).collect();

    AddressNftsPage {
        address: address.to_string(),
        nfts: page,
        pagination: Pagination::page(total, limit, offset),
    }
}

/// Supply figures from `getTokenSupply`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyInfo {
    pub total: String,
    pub decimals: u64,
    pub total_ui: f64,
}

/// Mint authority status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintAuthority {
    pub address: Option<String>,
    pub can_mint: bool,
}

/// Freeze authority status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreezeAuthority {
    pub address: Option<String>,
    pub can_freeze: bool,
}

/// One of the largest token accounts for a mint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderEntry {
    pub address: String,
    pub balance: String,
    pub balance_ui: f64,
}

/// Largest-accounts view, present when requested and resolvable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHolders {
    pub top: Vec<HolderEntry>,
}

/// The stable external token record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub mint: String,
    pub token_info: TokenInfoOut,
    pub supply: SupplyInfo,
    pub mint_authority: MintAuthority,
    pub freeze_authority: FreezeAuthority,
    /// Market data from the provider; `null` when no real source exists.
    pub market: Option<TokenPrice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holders: Option<TokenHolders>,
}

/// Combines `getTokenSupply` + mint `getAccountInfo` with provider-sourced
/// metadata. `None` when the mint account does not exist.
#[must_use]
pub fn normalize_token(
    mint: &str,
    supply_raw: &Value,
    account_raw: &Value,
    metadata: Option<TokenMetadata>,
    price: Option<TokenPrice>,
    holders_raw: Option<&Value>,
) -> Option<TokenRecord> {
    let account = unwrap_context(account_raw);
    if account.is_null() {
        return None;
    }
    let mint_info = at_path(account, &["data", "parsed", "info"]);
    let supply = unwrap_context(supply_raw);

    let mint_authority = mint_info.get("mintAuthority").and_then(Value::as_str).map(str::to_string);
    let freeze_authority =
        mint_info.get("freezeAuthority").and_then(Value::as_str).map(str::to_string);

    let holders = holders_raw.map(|raw| TokenHolders {
        top: unwrap_context(raw)
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|entry| HolderEntry {
                address: str_at(entry, "address"),
                balance: str_at(entry, "amount"),
                balance_ui: f64_at(entry, "uiAmount"),
            })
            .collect(),
    });

    Some(TokenRecord {
        mint: mint.to_string(),
        token_info: TokenInfoOut::from_metadata(mint, metadata),
        supply: SupplyInfo {
            total: str_at(supply, "amount"),
            decimals: u64_at(supply, "decimals").max(u64_at(mint_info, "decimals")),
            total_ui: f64_at(supply, "uiAmount"),
        },
        mint_authority: MintAuthority { can_mint: mint_authority.is_some(), address: mint_authority },
        freeze_authority: FreezeAuthority {
            can_freeze: freeze_authority.is_some(),
            address: freeze_authority,
        },
        market: price,
        holders,
    })
}
