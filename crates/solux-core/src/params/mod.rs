//! Declarative parsing and validation of request parameters.
//!
//! Each endpoint declares a typed query record with a `parse` constructor
//! that runs the raw string map through a [`FieldParser`]: type coercion,
//! defaulting, bounds checks, and enum membership. Parsing is total — every
//! malformed field produces a [`ParamIssue`] and all issues are collected
//! before failing, so a client sees its mistakes in one round trip.
//!
//! Once `parse` succeeds, downstream code may assume types and ranges are
//! correct; no further defensive checks are performed.

use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

pub mod path;
pub mod queries;

pub use queries::*;

/// A single validation failure: which field and which constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamIssue {
    pub field: &'static str,
    pub message: String,
}

impl ParamIssue {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Collects typed values out of a raw query-string map, accumulating issues
/// instead of failing on the first bad field.
///
/// Absent fields take their declared defaults; present fields must coerce
/// and satisfy their constraints. All helpers are pure over the input map.
pub struct FieldParser<'a> {
    query: &'a HashMap<String, String>,
    issues: Vec<ParamIssue>,
}

impl<'a> FieldParser<'a> {
    #[must_use]
    pub fn new(query: &'a HashMap<String, String>) -> Self {
        Self { query, issues: Vec::new() }
    }

    fn raw(&self, field: &str) -> Option<&str> {
        self.query.get(field).map(String::as_str)
    }

    /// A required non-empty string field.
    pub fn required(&mut self, field: &'static str) -> String {
        match self.raw(field) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => {
                self.issues.push(ParamIssue::new(field, "is required"));
                String::new()
            }
        }
    }

    /// An optional string field; empty values count as absent.
    pub fn optional(&mut self, field: &'static str) -> Option<String> {
        self.raw(field).filter(|value| !value.is_empty()).map(str::to_string)
    }

    /// An integer field constrained to `[min, max]`, defaulting when absent.
    pub fn bounded(&mut self, field: &'static str, default: usize, min: usize, max: usize) -> usize {
        let Some(raw) = self.raw(field) else { return default };
        match raw.parse::<usize>() {
            Ok(value) if (min..=max).contains(&value) => value,
            Ok(value) => {
                self.issues.push(ParamIssue::new(
                    field,
                    format!("must be between {min} and {max}, got {value}"),
                ));
                default
            }
            Err(_) => {
                self.issues.push(ParamIssue::new(field, format!("must be a number, got {raw:?}")));
                default
            }
        }
    }

    /// A boolean field accepting `true`/`false`/`1`/`0`, defaulting when absent.
    pub fn flag(&mut self, field: &'static str, default: bool) -> bool {
        let Some(raw) = self.raw(field) else { return default };
        match raw {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                self.issues
                    .push(ParamIssue::new(field, format!("must be a boolean, got {other:?}")));
                default
            }
        }
    }

    /// An enum field parsed via `FromStr`, defaulting when absent.
    ///
    /// `expected` names the accepted values for the issue message.
    pub fn enumerated<T>(&mut self, field: &'static str, default: T, expected: &str) -> T
    where
        T: FromStr<Err = ()>,
    {
        let Some(raw) = self.raw(field) else { return default };
        match raw.parse::<T>() {
            Ok(value) => value,
            Err(()) => {
                self.issues
                    .push(ParamIssue::new(field, format!("must be {expected}, got {raw:?}")));
                default
            }
        }
    }

    /// Finishes parsing: the value if no issues accumulated, the issue list
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns every [`ParamIssue`] collected while parsing.
    pub fn finish<T>(self, value: T) -> Result<T, Vec<ParamIssue>> {
        if self.issues.is_empty() {
            Ok(value)
        } else {
            Err(self.issues)
        }
    }
}

macro_rules! query_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

query_enum! {
    /// Requested search interpretation; `auto` triggers format detection.
    SearchType { Auto => "auto", Transaction => "transaction", Block => "block", Address => "address" }
}

query_enum! {
    /// Transaction detail level for `getBlock`.
    TransactionDetails { Full => "full", Signatures => "signatures", None => "none" }
}

query_enum! {
    /// Status filter for block transaction pages.
    StatusFilter { All => "all", Success => "success", Failed => "failed" }
}

query_enum! {
    /// Sort key for block transaction pages.
    BlockTxSort { Index => "index", Fee => "fee", Compute => "compute" }
}

query_enum! {
    SortOrder { Asc => "asc", Desc => "desc" }
}

query_enum! {
    /// Direction filter for address transaction history.
    DirectionFilter { All => "all", Sent => "sent", Received => "received", Program => "program" }
}

query_enum! {
    /// Sort key for address token holdings.
    TokenSort { Balance => "balance", Value => "value", Name => "name" }
}

query_enum! {
    /// Sort key for address NFT holdings.
    NftSort { Name => "name", Collection => "collection", Rarity => "rarity", FloorPrice => "floorPrice" }
}

query_enum! {
    /// Reporting window for token and analytics endpoints.
    Timeframe { Day => "24h", Week => "7d", Month => "30d" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn required_rejects_missing_and_empty() {
        let empty = query(&[]);
        let mut parser = FieldParser::new(&empty);
        parser.required("q");
        let err = parser.finish(()).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err[0].field, "q");

        let blank = query(&[("q", "")]);
        let mut parser = FieldParser::new(&blank);
        parser.required("q");
        assert!(parser.finish(()).is_err());
    }

    #[test]
    fn bounded_defaults_and_limits() {
        let empty = query(&[]);
        let mut parser = FieldParser::new(&empty);
        assert_eq!(parser.bounded("limit", 50, 1, 1000), 50);
        assert!(parser.finish(()).is_ok());

        let over = query(&[("limit", "5000")]);
        let mut parser = FieldParser::new(&over);
        parser.bounded("limit", 50, 1, 1000);
        let err = parser.finish(()).unwrap_err();
        assert!(err[0].message.contains("between 1 and 1000"));

        let not_a_number = query(&[("limit", "ten")]);
        let mut parser = FieldParser::new(&not_a_number);
        parser.bounded("limit", 50, 1, 1000);
        assert!(parser.finish(()).is_err());
    }

    #[test]
    fn flag_coercion() {
        let raw = query(&[("a", "true"), ("b", "0"), ("c", "yes")]);
        let mut parser = FieldParser::new(&raw);
        assert!(parser.flag("a", false));
        assert!(!parser.flag("b", true));
        parser.flag("c", false);
        assert_eq!(parser.finish(()).unwrap_err().len(), 1);
    }

    #[test]
    fn enumerated_membership() {
        let raw = query(&[("type", "block")]);
        let mut parser = FieldParser::new(&raw);
        let value = parser.enumerated("type", SearchType::Auto, "a search type");
        assert_eq!(value, SearchType::Block);
        assert!(parser.finish(()).is_ok());

        let raw = query(&[("type", "nonsense")]);
        let mut parser = FieldParser::new(&raw);
        parser.enumerated("type", SearchType::Auto, "a search type");
        assert!(parser.finish(()).is_err());
    }

    #[test]
    fn issues_accumulate_across_fields() {
        let raw = query(&[("limit", "0"), ("status", "bogus")]);
        let mut parser = FieldParser::new(&raw);
        parser.bounded("limit", 100, 1, 1000);
        parser.enumerated("status", StatusFilter::All, "one of all|success|failed");
        let issues = parser.finish(()).unwrap_err();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn nft_sort_uses_camel_case_wire_form() {
        assert_eq!("floorPrice".parse::<NftSort>(), Ok(NftSort::FloorPrice));
        assert!("floorprice".parse::<NftSort>().is_err());
    }
}
