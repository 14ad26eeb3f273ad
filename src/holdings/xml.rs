//! Holdings from a 2013+ 13F information table (`infoTable` elements).

use anyhow::{anyhow, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, trace};

use super::{Holding, HoldingField};

/// Map an element (with its parent) to the field it carries. Top-level fields
/// are taken wherever they sit inside the `infoTable`; the share and voting
/// splits only count under their grouping element.
fn field_for(parent: Option<&str>, name: &str) -> Option<HoldingField> {
    let field = match (parent, name) {
        (_, "nameofissuer") => HoldingField::NameOfIssuer,
        (_, "titleofclass") => HoldingField::TitleOfClass,
        (_, "cusip") => HoldingField::Cusip,
        (_, "value") => HoldingField::Value,
        (_, "putcall") => HoldingField::PutCall,
        (_, "investmentdiscretion") => HoldingField::InvestmentDiscretion,
        (_, "othermanager") => HoldingField::OtherManager,
        (Some("shrsorprnamt"), "sshprnamt") => HoldingField::SshPrnamt,
        (Some("shrsorprnamt"), "sshprnamttype") => HoldingField::SshPrnamtType,
        (Some("votingauthority"), "sole") => HoldingField::VotingAuthoritySole,
        (Some("votingauthority"), "shared") => HoldingField::VotingAuthorityShared,
        (Some("votingauthority"), "none") => HoldingField::VotingAuthorityNone,
        _ => return None,
    };
    Some(field)
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn record(holding: &mut Holding, stack: &[String], value: &str) {
    let Some((name, rest)) = stack.split_last() else {
        return;
    };
    let parent = rest.last().map(String::as_str);
    if let Some(field) = field_for(parent, name) {
        // first occurrence wins
        if !holding.contains(field) {
            holding.insert(field, value.trim());
        }
    }
}

/// Parse every `infoTable` in `xml` into a [`Holding`]. Fields are looked up
/// independently, so a missing element only leaves that field empty.
pub fn parse_info_table(xml: &str) -> Result<Vec<Holding>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut holdings = Vec::new();
    let mut buf = Vec::new();
    // element names below the current infoTable
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<Holding> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(e.local_name().as_ref());
                if current.is_some() {
                    stack.push(name);
                    text.clear();
                } else if name == "infotable" {
                    current = Some(Holding::new());
                    stack.clear();
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(holding) = current.as_mut() {
                    stack.push(local_name(e.local_name().as_ref()));
                    record(holding, &stack, "");
                    stack.pop();
                }
            }
            Ok(Event::Text(e)) => {
                if current.is_some() {
                    match e.unescape() {
                        Ok(s) => text.push_str(&s),
                        Err(_) => text.push_str(&String::from_utf8_lossy(&e)),
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if current.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(holding) = current.as_mut() {
                    if stack.is_empty() {
                        // closing the infoTable itself
                        trace!(fields = holding.len(), "infoTable");
                        holdings.extend(current.take());
                    } else {
                        record(holding, &stack, &text);
                        stack.pop();
                        text.clear();
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow!(
                    "XML parse error at byte {}: {e}",
                    reader.buffer_position()
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    debug!(count = holdings.len(), "parsed information table");
    Ok(holdings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO_TABLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<informationTable xmlns="http://www.sec.gov/edgar/document/thirteenf/informationtable" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <infoTable>
    <nameOfIssuer>AT&amp;T INC</nameOfIssuer>
    <titleOfClass>COM</titleOfClass>
    <cusip>00206R102</cusip>
    <value>66280</value>
    <shrsOrPrnAmt>
      <sshPrnamt>1971500</sshPrnamt>
      <sshPrnamtType>SH</sshPrnamtType>
    </shrsOrPrnAmt>
    <investmentDiscretion>SOLE</investmentDiscretion>
    <votingAuthority>
      <Sole>1971500</Sole>
      <Shared>0</Shared>
      <None>0</None>
    </votingAuthority>
  </infoTable>
  <infoTable>
    <nameOfIssuer>BERKSHIRE HATHAWAY INC DEL</nameOfIssuer>
    <titleOfClass>CL B NEW</titleOfClass>
    <cusip>084670702</cusip>
    <value>9123</value>
    <shrsOrPrnAmt>
      <sshPrnamt>76877</sshPrnamt>
      <sshPrnamtType>SH</sshPrnamtType>
    </shrsOrPrnAmt>
    <putCall>Call</putCall>
    <investmentDiscretion>DFND</investmentDiscretion>
    <otherManager>1</otherManager>
    <votingAuthority>
      <Sole>0</Sole>
      <Shared>76877</Shared>
      <None>0</None>
    </votingAuthority>
  </infoTable>
</informationTable>"#;

    #[test]
    fn parses_every_info_table() -> Result<()> {
        let holdings = parse_info_table(INFO_TABLE)?;
        assert_eq!(holdings.len(), 2);

        let att = &holdings[0];
        assert_eq!(att.get(HoldingField::NameOfIssuer), Some("AT&T INC"));
        assert_eq!(att.get(HoldingField::Cusip), Some("00206R102"));
        assert_eq!(att.get(HoldingField::SshPrnamt), Some("1971500"));
        assert_eq!(att.get(HoldingField::SshPrnamtType), Some("SH"));
        assert_eq!(att.get(HoldingField::VotingAuthoritySole), Some("1971500"));
        assert_eq!(att.get(HoldingField::VotingAuthorityNone), Some("0"));
        assert_eq!(att.get(HoldingField::PutCall), None);
        assert_eq!(att.get(HoldingField::OtherManager), None);
        assert_eq!(att.len(), 10);

        let brk = &holdings[1];
        assert_eq!(brk.get(HoldingField::PutCall), Some("Call"));
        assert_eq!(brk.get(HoldingField::OtherManager), Some("1"));
        assert_eq!(brk.get(HoldingField::VotingAuthorityShared), Some("76877"));
        assert_eq!(brk.len(), 12);
        Ok(())
    }

    #[test]
    fn prefixed_tags_and_empty_elements() -> Result<()> {
        let xml = r#"<ns1:informationTable xmlns:ns1="http://www.sec.gov/edgar/document/thirteenf/informationtable">
  <ns1:infoTable>
    <ns1:nameOfIssuer>APPLE INC</ns1:nameOfIssuer>
    <ns1:cusip>037833100</ns1:cusip>
    <ns1:putCall/>
  </ns1:infoTable>
</ns1:informationTable>"#;
        let holdings = parse_info_table(xml)?;
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].get(HoldingField::NameOfIssuer), Some("APPLE INC"));
        assert_eq!(holdings[0].get(HoldingField::PutCall), Some(""));
        assert_eq!(holdings[0].get(HoldingField::Value), None);
        Ok(())
    }

    #[test]
    fn share_fields_need_their_parent() -> Result<()> {
        // a stray <Sole> outside votingAuthority is not a voting split
        let xml = "<infoTable><cusip>X</cusip><Sole>5</Sole></infoTable>";
        let holdings = parse_info_table(xml)?;
        assert_eq!(holdings[0].get(HoldingField::VotingAuthoritySole), None);
        assert_eq!(holdings[0].get(HoldingField::Cusip), Some("X"));
        Ok(())
    }

    #[test]
    fn first_occurrence_wins_any_case() -> Result<()> {
        let xml = "<INFOTABLE><CUSIP>A</CUSIP><cusip>B</cusip>\
                   <votingauthority><SOLE>1</SOLE></votingauthority></INFOTABLE>";
        let holdings = parse_info_table(xml)?;
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].get(HoldingField::Cusip), Some("A"));
        assert_eq!(holdings[0].get(HoldingField::VotingAuthoritySole), Some("1"));
        Ok(())
    }

    #[test]
    fn no_info_tables_and_malformed_xml() {
        assert!(parse_info_table("<html><body>not here</body></html>")
            .unwrap()
            .is_empty());
        assert!(parse_info_table("<infoTable><cusip>1</value></infoTable>").is_err());
    }
}
