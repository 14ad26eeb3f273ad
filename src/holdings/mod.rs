// src/holdings/mod.rs

pub mod ascii;
pub mod xml;

use std::collections::BTreeMap;
use std::fmt;

pub use ascii::{extract_table_lines, parse_ascii_table, split_columns};
pub use xml::parse_info_table;

/// Written in place of a field the filing did not report.
pub const MISSING: &str = "n/a";

/// The per-holding fields of a 13F information table, in output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HoldingField {
    NameOfIssuer,
    TitleOfClass,
    Cusip,
    Value,
    SshPrnamt,
    SshPrnamtType,
    PutCall,
    InvestmentDiscretion,
    OtherManager,
    VotingAuthoritySole,
    VotingAuthorityShared,
    VotingAuthorityNone,
}

impl HoldingField {
    pub const ALL: [HoldingField; 12] = [
        HoldingField::NameOfIssuer,
        HoldingField::TitleOfClass,
        HoldingField::Cusip,
        HoldingField::Value,
        HoldingField::SshPrnamt,
        HoldingField::SshPrnamtType,
        HoldingField::PutCall,
        HoldingField::InvestmentDiscretion,
        HoldingField::OtherManager,
        HoldingField::VotingAuthoritySole,
        HoldingField::VotingAuthorityShared,
        HoldingField::VotingAuthorityNone,
    ];

    /// Column header used in the output file.
    pub fn column_name(self) -> &'static str {
        match self {
            HoldingField::NameOfIssuer => "nameOfIssuer",
            HoldingField::TitleOfClass => "titleOfClass",
            HoldingField::Cusip => "cusip",
            HoldingField::Value => "value",
            HoldingField::SshPrnamt => "sshPrnamt",
            HoldingField::SshPrnamtType => "sshPrnamtType",
            HoldingField::PutCall => "putCall",
            HoldingField::InvestmentDiscretion => "investmentDiscretion",
            HoldingField::OtherManager => "otherManager",
            HoldingField::VotingAuthoritySole => "votingAuthoritySole",
            HoldingField::VotingAuthorityShared => "votingAuthorityShared",
            HoldingField::VotingAuthorityNone => "votingAuthorityNone",
        }
    }
}

impl fmt::Display for HoldingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// One line item of a filing's holdings table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Holding {
    fields: BTreeMap<HoldingField, String>,
}

impl Holding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: HoldingField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn insert(&mut self, field: HoldingField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub fn contains(&self, field: HoldingField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Values for `columns`, with [`MISSING`] for fields this holding lacks.
    pub fn row(&self, columns: &[HoldingField]) -> Vec<&str> {
        columns
            .iter()
            .map(|c| self.get(*c).unwrap_or(MISSING))
            .collect()
    }
}

/// Fields reported by at least one holding, in column order.
pub fn columns_for(holdings: &[Holding]) -> Vec<HoldingField> {
    HoldingField::ALL
        .into_iter()
        .filter(|f| holdings.iter().any(|h| h.contains(*f)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_union_in_canonical_order() {
        let mut a = Holding::new();
        a.insert(HoldingField::Value, "100");
        a.insert(HoldingField::NameOfIssuer, "APPLE INC");

        let mut b = Holding::new();
        b.insert(HoldingField::PutCall, "Put");
        b.insert(HoldingField::Cusip, "037833100");

        let cols = columns_for(&[a.clone(), b]);
        assert_eq!(
            cols,
            vec![
                HoldingField::NameOfIssuer,
                HoldingField::Cusip,
                HoldingField::Value,
                HoldingField::PutCall
            ]
        );
        assert_eq!(a.row(&cols), vec!["APPLE INC", "n/a", "100", "n/a"]);
    }

    #[test]
    fn empty_holdings_have_no_columns() {
        assert!(columns_for(&[]).is_empty());
        assert!(Holding::new().is_empty());
    }
}
