//! Committee designation codes
//!
//! FEC marks each candidate-linked committee with a one-letter designation
//! (`P` principal, `A` authorized, `J` joint fundraiser, ...). Only principal
//! and authorized committees count toward a candidate's money.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitteeRole {
    Principal,
    Authorized,
    Other,
}

impl CommitteeRole {
    pub fn is_campaign(self) -> bool {
        matches!(self, CommitteeRole::Principal | CommitteeRole::Authorized)
    }
}

/// Designation code first, then the long-form designation text
pub fn classify_designation(designation: Option<&str>, designation_full: Option<&str>) -> CommitteeRole {
    let code = designation.unwrap_or("").trim();
    let full = designation_full.unwrap_or("").to_ascii_lowercase();

    if code == "P" || full.contains("principal") {
        CommitteeRole::Principal
    } else if code == "A" || full.contains("authorized") {
        CommitteeRole::Authorized
    } else {
        CommitteeRole::Other
    }
}

/// Role of a raw candidate-committee row
pub fn role_of(row: &serde_json::Value) -> CommitteeRole {
    classify_designation(
        row.get("designation").and_then(|v| v.as_str()),
        row.get("designation_full").and_then(|v| v.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_designation_code_wins() {
        assert_eq!(classify_designation(Some("P"), None), CommitteeRole::Principal);
        assert_eq!(classify_designation(Some("A"), None), CommitteeRole::Authorized);
        assert_eq!(classify_designation(Some("J"), Some("Joint fundraiser")), CommitteeRole::Other);
        assert_eq!(classify_designation(None, None), CommitteeRole::Other);
    }

    #[test]
    fn test_designation_full_text_fallback() {
        assert_eq!(
            classify_designation(None, Some("Principal campaign committee")),
            CommitteeRole::Principal
        );
        assert_eq!(
            classify_designation(Some("U"), Some("Authorized by a candidate")),
            CommitteeRole::Authorized
        );
    }

    #[test]
    fn test_role_of_raw_row() {
        assert!(role_of(&json!({"designation": "P"})).is_campaign());
        assert!(!role_of(&json!({"designation": "D"})).is_campaign());
    }
}
