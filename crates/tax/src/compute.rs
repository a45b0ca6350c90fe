//! The four tax computations. Each is independent of the others.

use serde::{Deserialize, Serialize};

use crate::profile::TaxProfile;

/// Ledger totals for one company-month.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub income: f64,
    pub expense: f64,
}

impl MonthlyTotals {
    pub fn profit(&self) -> f64 {
        self.income - self.expense
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vat {
    /// Output VAT charged on income.
    pub debit: f64,
    /// Input VAT contained in (tax-inclusive) expenses.
    pub credit: f64,
    pub payable: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorporateTax {
    pub base: f64,
    pub solidarity: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxFigures {
    pub vat: Vat,
    pub trade_tax: f64,
    pub corporate_tax: CorporateTax,
    pub payroll_tax: f64,
}

pub fn compute_vat(profile: &TaxProfile, totals: MonthlyTotals) -> Vat {
    let rate = profile.vat_rate;
    let debit = if profile.small_business {
        0.0
    } else {
        totals.income * rate / 100.0
    };
    // Expenses are booked gross; pull the contained VAT back out.
    let credit = totals.expense * rate / (100.0 + rate);
    Vat {
        debit,
        credit,
        payable: (debit - credit).max(0.0),
    }
}

pub fn compute_trade_tax(profile: &TaxProfile, totals: MonthlyTotals) -> f64 {
    if !profile.company_type.pays_trade_tax() {
        return 0.0;
    }
    (totals.profit() * profile.trade_tax_multiplier / 100.0).max(0.0)
}

pub fn compute_corporate_tax(profile: &TaxProfile, totals: MonthlyTotals) -> CorporateTax {
    if !profile.company_type.pays_corporate_tax() {
        return CorporateTax {
            base: 0.0,
            solidarity: 0.0,
            total: 0.0,
        };
    }
    let base = totals.profit() * profile.corp_tax_rate / 100.0;
    let solidarity = base * profile.solidarity_rate / 100.0;
    CorporateTax {
        base,
        solidarity,
        total: (base + solidarity).max(0.0),
    }
}

/// `real_salary_total` is the month's sum of gross salaries from payroll.
pub fn compute_payroll_tax(profile: &TaxProfile, real_salary_total: f64) -> f64 {
    (real_salary_total * profile.payroll_base_rate / 100.0).max(0.0)
}

pub fn compute_all(profile: &TaxProfile, totals: MonthlyTotals, real_salary_total: f64) -> TaxFigures {
    TaxFigures {
        vat: compute_vat(profile, totals),
        trade_tax: compute_trade_tax(profile, totals),
        corporate_tax: compute_corporate_tax(profile, totals),
        payroll_tax: compute_payroll_tax(profile, real_salary_total),
    }
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::CompanyType;
    use proptest::prelude::*;

    fn profile(company_type: CompanyType) -> TaxProfile {
        TaxProfile {
            company_type,
            small_business: false,
            vat_rate: 19.0,
            trade_tax_multiplier: 14.0,
            corp_tax_rate: 15.0,
            solidarity_rate: 5.5,
            payroll_base_rate: 20.0,
        }
    }

    fn totals(income: f64, expense: f64) -> MonthlyTotals {
        MonthlyTotals { income, expense }
    }

    #[test]
    fn vat_on_income_only() {
        let vat = compute_vat(&profile(CompanyType::Gmbh), totals(10_000.0, 0.0));
        assert!((vat.payable - 1_900.0).abs() < 0.01);
    }

    #[test]
    fn vat_credit_grosses_up_expenses() {
        let vat = compute_vat(&profile(CompanyType::Gmbh), totals(10_000.0, 2_000.0));
        let expected = 10_000.0 * 0.19 - 2_000.0 * (0.19 / 1.19);
        assert!((vat.payable - expected).abs() < 0.05);
        assert!((vat.payable - 1_580.67).abs() < 0.05);
    }

    #[test]
    fn small_business_charges_no_output_vat() {
        let mut p = profile(CompanyType::Kleinunternehmer);
        p.small_business = true;
        let vat = compute_vat(&p, totals(10_000.0, 2_000.0));
        assert_eq!(vat.debit, 0.0);
        assert_eq!(vat.payable, 0.0);
    }

    #[test]
    fn corporate_tax_includes_solidarity_surcharge() {
        let corp = compute_corporate_tax(&profile(CompanyType::Gmbh), totals(10_000.0, 0.0));
        assert!((corp.total - 1_582.50).abs() < 0.01);
    }

    #[test]
    fn freelancers_pay_neither_trade_nor_corporate_tax() {
        let p = profile(CompanyType::Freelancer);
        assert_eq!(compute_corporate_tax(&p, totals(10_000.0, 0.0)).total, 0.0);
        assert_eq!(compute_trade_tax(&p, totals(10_000.0, 0.0)), 0.0);
    }

    #[test]
    fn kleinunternehmer_pays_trade_but_not_corporate_tax() {
        let p = profile(CompanyType::Kleinunternehmer);
        assert_eq!(compute_corporate_tax(&p, totals(10_000.0, 0.0)).total, 0.0);
        assert!((compute_trade_tax(&p, totals(10_000.0, 0.0)) - 1_400.0).abs() < 0.01);
    }

    #[test]
    fn losses_floor_at_zero() {
        let p = profile(CompanyType::Gmbh);
        assert_eq!(compute_trade_tax(&p, totals(1_000.0, 5_000.0)), 0.0);
        assert_eq!(compute_corporate_tax(&p, totals(1_000.0, 5_000.0)).total, 0.0);
    }

    #[test]
    fn payroll_tax_applies_base_rate() {
        let p = profile(CompanyType::Gmbh);
        assert!((compute_payroll_tax(&p, 8_000.0) - 1_600.0).abs() < 0.01);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_cents(1_580.6723), 1_580.67);
        assert_eq!(round_cents(0.005), 0.01);
    }

    proptest! {
        /// Property: every figure is non-negative for any non-negative input.
        #[test]
        fn figures_are_never_negative(
            income in 0.0f64..1_000_000.0,
            expense in 0.0f64..1_000_000.0,
            salaries in 0.0f64..500_000.0,
        ) {
            let figures = compute_all(&profile(CompanyType::Gmbh), totals(income, expense), salaries);
            prop_assert!(figures.vat.payable >= 0.0);
            prop_assert!(figures.trade_tax >= 0.0);
            prop_assert!(figures.corporate_tax.total >= 0.0);
            prop_assert!(figures.payroll_tax >= 0.0);
        }
    }
}
