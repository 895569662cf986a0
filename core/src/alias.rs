//! Identifier canonicalization.
//!
//! RULE: alias remaps are applied at the single point where rows are read
//! from the store — never in the engines, so no call site can forget one.
//! Every function here is total (identity fallback) and idempotent.

/// Canonical bank account for claim rows. One hardcoded rule: the STAR_DANA
/// settlement account is booked under NDTL.
pub fn canonical_account(raw: &str) -> String {
    match raw {
        "STAR_DANA" => "NDTL".to_string(),
        other => other.to_string(),
    }
}

/// Canonical lender label for report breakdowns.
pub fn canonical_lender(raw: &str) -> String {
    match raw {
        "SEABANK_V2" => "SEABANK".to_string(),
        "STAR_DANA" => "STARDANA".to_string(),
        other => other.to_string(),
    }
}

/// Canonical repayment channel label for report breakdowns.
pub fn canonical_channel(raw: &str) -> String {
    match raw {
        "INSTAMONEY_V2" => "INSTAMONEY".to_string(),
        "VIRTUAL_CHNNEL" => "UPFRONT FEE".to_string(),
        "FASPAY_V2" => "FASPAY".to_string(),
        "FASPAY_EWALLET" => "FASPAY E-WALLET".to_string(),
        "AYO_DD" => "AYO".to_string(),
        "XENDIT" => "WAIVE".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_alias_is_total_and_idempotent() {
        assert_eq!(canonical_account("STAR_DANA"), "NDTL");
        assert_eq!(canonical_account("NDTL"), "NDTL");
        assert_eq!(canonical_account("BANK_A"), "BANK_A");
        // Applying twice changes nothing.
        assert_eq!(
            canonical_account(&canonical_account("STAR_DANA")),
            "NDTL"
        );
    }

    #[test]
    fn lender_and_channel_aliases_fall_back_to_identity() {
        assert_eq!(canonical_lender("SEABANK_V2"), "SEABANK");
        assert_eq!(canonical_lender("ADAPUNDI"), "ADAPUNDI");
        assert_eq!(canonical_channel("VIRTUAL_CHNNEL"), "UPFRONT FEE");
        assert_eq!(canonical_channel("BANK_TRANSFER"), "BANK_TRANSFER");
    }
}
