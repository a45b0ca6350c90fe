use core::str::FromStr;

use serde::{Deserialize, Serialize};

use ledgersync_core::DomainError;

/// Legal form of the company, as far as the forecast cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanyType {
    /// Liberal profession; no trade tax, no corporate tax.
    Freelancer,
    /// Small-business regime; no corporate tax.
    Kleinunternehmer,
    /// Sole proprietorship.
    Einzelunternehmen,
    #[serde(rename = "GmbH")]
    Gmbh,
    #[serde(rename = "UG")]
    Ug,
}

impl CompanyType {
    pub fn pays_trade_tax(&self) -> bool {
        !matches!(self, CompanyType::Freelancer)
    }

    pub fn pays_corporate_tax(&self) -> bool {
        !matches!(self, CompanyType::Freelancer | CompanyType::Kleinunternehmer)
    }
}

impl FromStr for CompanyType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "freelancer" => Ok(CompanyType::Freelancer),
            "kleinunternehmer" => Ok(CompanyType::Kleinunternehmer),
            "einzelunternehmen" => Ok(CompanyType::Einzelunternehmen),
            "gmbh" => Ok(CompanyType::Gmbh),
            "ug" => Ok(CompanyType::Ug),
            other => Err(DomainError::validation(format!("unknown company type {other:?}"))),
        }
    }
}

/// Rates and flags the forecast needs for one company. All rates are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxProfile {
    pub company_type: CompanyType,
    /// Small-business VAT exemption; no output VAT is charged.
    pub small_business: bool,
    pub vat_rate: f64,
    pub trade_tax_multiplier: f64,
    pub corp_tax_rate: f64,
    pub solidarity_rate: f64,
    pub payroll_base_rate: f64,
}

impl TaxProfile {
    pub fn validate(&self) -> Result<(), DomainError> {
        let rates = [
            ("vat_rate", self.vat_rate),
            ("trade_tax_multiplier", self.trade_tax_multiplier),
            ("corp_tax_rate", self.corp_tax_rate),
            ("solidarity_rate", self.solidarity_rate),
            ("payroll_base_rate", self.payroll_base_rate),
        ];
        for (name, rate) in rates {
            if !rate.is_finite() || rate < 0.0 {
                return Err(DomainError::validation(format!(
                    "{name} must be a non-negative number, got {rate}"
                )));
            }
        }
        Ok(())
    }
}
