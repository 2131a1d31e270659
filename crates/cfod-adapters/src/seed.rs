//! Hand-authored seed dataset: a small set of Chicago-focused programs that
//! never appear in any export, maintained directly in code and already in
//! canonical shape.

use cfod_core::{FundingOpportunity, OpportunityType};

pub fn seed_opportunities() -> Vec<FundingOpportunity> {
    let mut records = Vec::new();

    let mut opp = FundingOpportunity::new("Chicago Small Business Improvement Fund", OpportunityType::Grant);
    opp.description = Some(
        "City grant reimbursing building improvements for small businesses | Up to $150k".to_string(),
    );
    opp.sectors = vec!["Small Business".to_string(), "Retail".to_string()];
    opp.website = Some("https://www.chicago.gov/sbif".to_string());
    opp.featured = true;
    opp.chicago_focused = true;
    records.push(opp);

    let mut opp = FundingOpportunity::new("World Business Chicago Venture Summit", OpportunityType::Competition);
    opp.description = Some("Annual pitch event connecting founders with local investors".to_string());
    opp.sectors = vec!["General".to_string()];
    opp.stage = vec!["Pre-seed".to_string(), "Seed".to_string()];
    opp.website = Some("https://worldbusinesschicago.com/venture-summit".to_string());
    opp.chicago_focused = true;
    records.push(opp);

    let mut opp = FundingOpportunity::new("mHUB Hardtech Accelerator", OpportunityType::Accelerator);
    opp.description =
        Some("Six-month product accelerator for manufacturing startups | $75k investment".to_string());
    opp.sectors = vec!["Hardware".to_string(), "Manufacturing".to_string()];
    opp.stage = vec!["Pre-seed".to_string()];
    opp.website = Some("https://mhubchicago.com".to_string());
    opp.application_url = Some("https://mhubchicago.com/apply".to_string());
    opp.featured = true;
    opp.chicago_focused = true;
    records.push(opp);

    let mut opp = FundingOpportunity::new("P33 Tech Rise Fellowship", OpportunityType::Fellowship);
    opp.description = Some("Fellowship placing technologists with Chicago civic projects".to_string());
    opp.sectors = vec!["Civic".to_string(), "Workforce".to_string()];
    opp.website = Some("https://www.p33chicago.com".to_string());
    opp.chicago_focused = true;
    records.push(opp);

    let mut opp = FundingOpportunity::new("Chicago Early Growth Ventures", OpportunityType::Vc);
    opp.description = Some("Seed checks for companies headquartered in Cook County".to_string());
    opp.sectors = vec!["B2B SaaS".to_string(), "Logistics".to_string()];
    opp.stage = vec!["Seed".to_string()];
    opp.check_size_min = Some(250_000.0);
    opp.check_size_max = Some(1_000_000.0);
    opp.website = Some("https://cegv.example.com".to_string());
    opp.chicago_focused = true;
    records.push(opp);

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_records_are_chicago_focused_and_named() {
        let records = seed_opportunities();
        assert!(!records.is_empty());
        for record in &records {
            assert!(!record.name.trim().is_empty());
            assert!(record.chicago_focused);
        }
    }

    #[test]
    fn seed_names_are_distinct_case_insensitively() {
        let records = seed_opportunities();
        let mut keys: Vec<String> = records.iter().map(|r| r.dedup_key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), records.len());
    }
}
