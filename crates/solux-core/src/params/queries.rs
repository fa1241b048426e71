//! Per-endpoint query records.
//!
//! Field inventories, defaults, and bounds mirror the public API contract;
//! see the individual `parse` constructors for the accepted fields.

use std::collections::HashMap;

use crate::types::Commitment;

use super::{
    BlockTxSort, DirectionFilter, FieldParser, NftSort, ParamIssue, SearchType, SortOrder,
    StatusFilter, Timeframe, TokenSort, TransactionDetails,
};

const COMMITMENT_VALUES: &str = "one of processed|confirmed|finalized";

/// `GET /search?q=&type=`
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub q: String,
    pub search_type: SearchType,
}

impl SearchQuery {
    /// # Errors
    /// Returns all accumulated [`ParamIssue`]s.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, Vec<ParamIssue>> {
        let mut p = FieldParser::new(query);
        let q = p.required("q");
        let search_type =
            p.enumerated("type", SearchType::Auto, "one of auto|transaction|block|address");
        p.finish(Self { q, search_type })
    }
}

/// `GET /transactions/{signature}`
#[derive(Debug, Clone)]
pub struct TransactionQuery {
    pub commitment: Commitment,
    pub max_supported_transaction_version: usize,
}

impl TransactionQuery {
    /// # Errors
    /// Returns all accumulated [`ParamIssue`]s.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, Vec<ParamIssue>> {
        let mut p = FieldParser::new(query);
        let commitment = p.enumerated("commitment", Commitment::Confirmed, COMMITMENT_VALUES);
        let max_supported_transaction_version =
            p.bounded("maxSupportedTransactionVersion", 0, 0, usize::MAX);
        p.finish(Self { commitment, max_supported_transaction_version })
    }
}

/// `GET /blocks/{slot}`
#[derive(Debug, Clone)]
pub struct BlockQuery {
    pub commitment: Commitment,
    pub transaction_details: TransactionDetails,
    pub rewards: bool,
}

impl BlockQuery {
    /// # Errors
    /// Returns all accumulated [`ParamIssue`]s.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, Vec<ParamIssue>> {
        let mut p = FieldParser::new(query);
        let commitment = p.enumerated("commitment", Commitment::Confirmed, COMMITMENT_VALUES);
        let transaction_details = p.enumerated(
            "transactionDetails",
            TransactionDetails::Signatures,
            "one of full|signatures|none",
        );
        let rewards = p.flag("rewards", true);
        p.finish(Self { commitment, transaction_details, rewards })
    }
}

/// `GET /blocks/{slot}/transactions`
#[derive(Debug, Clone)]
pub struct BlockTransactionsQuery {
    pub limit: usize,
    pub offset: usize,
    pub status: StatusFilter,
    pub sort_by: BlockTxSort,
    pub sort_order: SortOrder,
    pub include_details: bool,
}

impl BlockTransactionsQuery {
    /// # Errors
    /// Returns all accumulated [`ParamIssue`]s.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, Vec<ParamIssue>> {
        let mut p = FieldParser::new(query);
        let limit = p.bounded("limit", 100, 1, 1000);
        let offset = p.bounded("offset", 0, 0, usize::MAX);
        let status = p.enumerated("status", StatusFilter::All, "one of all|success|failed");
        let sort_by = p.enumerated("sortBy", BlockTxSort::Index, "one of index|fee|compute");
        let sort_order = p.enumerated("sortOrder", SortOrder::Asc, "one of asc|desc");
        let include_details = p.flag("includeDetails", false);
        p.finish(Self { limit, offset, status, sort_by, sort_order, include_details })
    }
}

/// `GET /addresses/{address}`
#[derive(Debug, Clone)]
pub struct AddressQuery {
    pub commitment: Commitment,
    pub include_tokens: bool,
}

impl AddressQuery {
    /// # Errors
    /// Returns all accumulated [`ParamIssue`]s.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, Vec<ParamIssue>> {
        let mut p = FieldParser::new(query);
        let commitment = p.enumerated("commitment", Commitment::Confirmed, COMMITMENT_VALUES);
        let include_tokens = p.flag("includeTokens", false);
        p.finish(Self { commitment, include_tokens })
    }
}

/// `GET /addresses/{address}/transactions`
#[derive(Debug, Clone)]
pub struct AddressTransactionsQuery {
    pub limit: usize,
    pub before: Option<String>,
    pub until: Option<String>,
    pub commitment: Commitment,
    pub filter: DirectionFilter,
    pub program: Option<String>,
}

impl AddressTransactionsQuery {
    /// # Errors
    /// Returns all accumulated [`ParamIssue`]s.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, Vec<ParamIssue>> {
        let mut p = FieldParser::new(query);
        let limit = p.bounded("limit", 50, 1, 1000);
        let before = p.optional("before");
        let until = p.optional("until");
        let commitment = p.enumerated("commitment", Commitment::Confirmed, COMMITMENT_VALUES);
        let filter = p.enumerated(
            "filter",
            DirectionFilter::All,
            "one of all|sent|received|program",
        );
        let program = p.optional("program");
        p.finish(Self { limit, before, until, commitment, filter, program })
    }
}

/// `GET /addresses/{address}/tokens`
#[derive(Debug, Clone)]
pub struct AddressTokensQuery {
    pub include_nfts: bool,
    pub include_zero_balance: bool,
    pub include_prices: bool,
    pub sort_by: TokenSort,
    pub sort_order: SortOrder,
}

impl AddressTokensQuery {
    /// # Errors
    /// Returns all accumulated [`ParamIssue`]s.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, Vec<ParamIssue>> {
        let mut p = FieldParser::new(query);
        let include_nfts = p.flag("includeNFTs", false);
        let include_zero_balance = p.flag("includeZeroBalance", false);
        let include_prices = p.flag("includePrices", true);
        let sort_by = p.enumerated("sortBy", TokenSort::Value, "one of balance|value|name");
        let sort_order = p.enumerated("sortOrder", SortOrder::Desc, "one of asc|desc");
        p.finish(Self { include_nfts, include_zero_balance, include_prices, sort_by, sort_order })
    }
}

/// `GET /addresses/{address}/nfts`
#[derive(Debug, Clone)]
pub struct AddressNftsQuery {
    pub limit: usize,
    pub offset: usize,
    pub include_metadata: bool,
    pub sort_by: NftSort,
}

impl AddressNftsQuery {
    /// # Errors
    /// Returns all accumulated [`ParamIssue`]s.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, Vec<ParamIssue>> {
        let mut p = FieldParser::new(query);
        let limit = p.bounded("limit", 100, 1, 1000);
        let offset = p.bounded("offset", 0, 0, usize::MAX);
        let include_metadata = p.flag("includeMetadata", true);
        let sort_by =
            p.enumerated("sortBy", NftSort::Name, "one of name|collection|rarity|floorPrice");
        p.finish(Self { limit, offset, include_metadata, sort_by })
    }
}

/// `GET /tokens/{mint}`
#[derive(Debug, Clone)]
pub struct TokenQuery {
    pub include_holders: bool,
    pub include_history: bool,
    pub timeframe: Timeframe,
}

impl TokenQuery {
    /// # Errors
    /// Returns all accumulated [`ParamIssue`]s.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, Vec<ParamIssue>> {
        let mut p = FieldParser::new(query);
        let include_holders = p.flag("includeHolders", false);
        let include_history = p.flag("includeHistory", true);
        let timeframe = p.enumerated("timeframe", Timeframe::Week, "one of 24h|7d|30d");
        p.finish(Self { include_holders, include_history, timeframe })
    }
}

/// `GET /analytics/overview`
#[derive(Debug, Clone)]
pub struct AnalyticsOverviewQuery {
    pub timeframe: Timeframe,
    pub include_history: bool,
}

impl AnalyticsOverviewQuery {
    /// # Errors
    /// Returns all accumulated [`ParamIssue`]s.
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, Vec<ParamIssue>> {
        let mut p = FieldParser::new(query);
        let timeframe = p.enumerated("timeframe", Timeframe::Day, "one of 24h|7d|30d");
        let include_history = p.flag("includeHistory", true);
        p.finish(Self { timeframe, include_history })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn search_requires_q() {
        let issues = SearchQuery::parse(&query(&[])).unwrap_err();
        assert!(issues.iter().any(|issue| issue.field == "q"));

        let parsed = SearchQuery::parse(&query(&[("q", "12345")])).unwrap();
        assert_eq!(parsed.search_type, SearchType::Auto);
    }

    #[test]
    fn transaction_defaults() {
        let parsed = TransactionQuery::parse(&query(&[])).unwrap();
        assert_eq!(parsed.commitment, Commitment::Confirmed);
        assert_eq!(parsed.max_supported_transaction_version, 0);
    }

    #[test]
    fn block_query_defaults_and_overrides() {
        let parsed = BlockQuery::parse(&query(&[])).unwrap();
        assert_eq!(parsed.transaction_details, TransactionDetails::Signatures);
        assert!(parsed.rewards);

        let parsed = BlockQuery::parse(&query(&[
            ("transactionDetails", "full"),
            ("rewards", "false"),
            ("commitment", "finalized"),
        ]))
        .unwrap();
        assert_eq!(parsed.transaction_details, TransactionDetails::Full);
        assert!(!parsed.rewards);
        assert_eq!(parsed.commitment, Commitment::Finalized);
    }

    #[test]
    fn block_transactions_bounds() {
        let parsed = BlockTransactionsQuery::parse(&query(&[])).unwrap();
        assert_eq!(parsed.limit, 100);
        assert_eq!(parsed.offset, 0);
        assert_eq!(parsed.status, StatusFilter::All);

        let issues =
            BlockTransactionsQuery::parse(&query(&[("limit", "1001")])).unwrap_err();
        assert_eq!(issues[0].field, "limit");
    }

    #[test]
    fn address_transactions_defaults() {
        let parsed = AddressTransactionsQuery::parse(&query(&[])).unwrap();
        assert_eq!(parsed.limit, 50);
        assert_eq!(parsed.filter, DirectionFilter::All);
        assert!(parsed.before.is_none());

        let parsed = AddressTransactionsQuery::parse(&query(&[
            ("limit", "10"),
            ("filter", "sent"),
            ("before", "someSignature"),
        ]))
        .unwrap();
        assert_eq!(parsed.limit, 10);
        assert_eq!(parsed.filter, DirectionFilter::Sent);
        assert_eq!(parsed.before.as_deref(), Some("someSignature"));
    }

    #[test]
    fn address_tokens_defaults() {
        let parsed = AddressTokensQuery::parse(&query(&[])).unwrap();
        assert!(!parsed.include_nfts);
        assert!(!parsed.include_zero_balance);
        assert!(parsed.include_prices);
        assert_eq!(parsed.sort_by, TokenSort::Value);
        assert_eq!(parsed.sort_order, SortOrder::Desc);
    }

    #[test]
    fn token_query_timeframe_membership() {
        let parsed = TokenQuery::parse(&query(&[("timeframe", "30d")])).unwrap();
        assert_eq!(parsed.timeframe, Timeframe::Month);

        let issues = TokenQuery::parse(&query(&[("timeframe", "90d")])).unwrap_err();
        assert_eq!(issues[0].field, "timeframe");
    }

    #[test]
    fn malformed_fields_all_reported() {
        let issues = BlockTransactionsQuery::parse(&query(&[
            ("limit", "zero"),
            ("status", "maybe"),
            ("sortBy", "gas"),
        ]))
        .unwrap_err();
        assert_eq!(issues.len(), 3);
    }
}
