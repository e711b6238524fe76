use super::{Trade, TradeStatus};
use serde::{Deserialize, Serialize};

/// Wizard tab shown on the trade screen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    StepOne,
    StepTwo,
    StepThree,
}

impl WizardStep {
    /// Authoritative step for a status. Total over every status.
    pub fn for_status(status: TradeStatus) -> Self {
        match status {
            TradeStatus::Pending => WizardStep::StepOne,
            TradeStatus::Paid | TradeStatus::Disputed => WizardStep::StepTwo,
            TradeStatus::Completed | TradeStatus::Cancelled => WizardStep::StepThree,
        }
    }

    /// Steps strictly before this one
    pub fn preceding(&self) -> &'static [WizardStep] {
        match self {
            WizardStep::StepOne => &[],
            WizardStep::StepTwo => &[WizardStep::StepOne],
            WizardStep::StepThree => &[WizardStep::StepOne, WizardStep::StepTwo],
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardStep::StepOne => write!(f, "step-one"),
            WizardStep::StepTwo => write!(f, "step-two"),
            WizardStep::StepThree => write!(f, "step-three"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeRole {
    Buyer,
    Seller,
}

impl TradeRole {
    /// Derived from the buyer id only; any role field on the payload is ignored.
    pub fn derive(trade: &Trade, local_user_id: &str) -> Self {
        if trade.buyer.id == local_user_id {
            TradeRole::Buyer
        } else {
            TradeRole::Seller
        }
    }
}

impl std::fmt::Display for TradeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeRole::Buyer => write!(f, "buyer"),
            TradeRole::Seller => write!(f, "seller"),
        }
    }
}
