//! Rolling fee ledger: term-by-term balances with carry-forward of credit
//! and debt across the three terms of an academic year.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::records::{FeeStructure, Payment};

pub const TERMS: [u32; 3] = [1, 2, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    Credit,
    Due,
    Cleared,
}

impl BalanceStatus {
    pub fn from_amount(amount: Decimal) -> Self {
        if amount.is_zero() {
            BalanceStatus::Cleared
        } else if amount.is_sign_negative() {
            BalanceStatus::Credit
        } else {
            BalanceStatus::Due
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermBalance {
    pub term: u32,
    pub term_fee: Decimal,
    pub term_payments: Decimal,
    pub term_balance: Decimal,
    /// Net balance inherited from the previous term; negative is credit.
    pub carry_forward: Decimal,
    pub net_balance: Decimal,
    pub status: BalanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermNetDue {
    pub term: u32,
    pub term_fee: Decimal,
    pub previous_payments: Decimal,
    pub carry_forward: Decimal,
    pub carry_forward_credit: Decimal,
    pub net_due: Decimal,
    pub status: BalanceStatus,
}

impl TermNetDue {
    fn cleared(term: u32) -> Self {
        Self {
            term,
            term_fee: Decimal::ZERO,
            previous_payments: Decimal::ZERO,
            carry_forward: Decimal::ZERO,
            carry_forward_credit: Decimal::ZERO,
            net_due: Decimal::ZERO,
            status: BalanceStatus::Cleared,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyTotals {
    pub total_fees: Decimal,
    pub total_paid: Decimal,
    pub final_balance: Decimal,
    pub status: BalanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStatement {
    pub student_id: String,
    pub class_name: String,
    pub year: i32,
    pub terms: Vec<TermBalance>,
    pub totals: YearlyTotals,
}

fn term_fee(class_name: &str, year: i32, term: &str, fee_structures: &[FeeStructure]) -> Decimal {
    fee_structures
        .iter()
        .find(|f| f.class_name == class_name && f.year == year && f.term == term)
        .map(FeeStructure::effective_fee)
        .unwrap_or(Decimal::ZERO)
}

fn term_payments(year: i32, term: &str, payments: &[Payment]) -> Decimal {
    payments
        .iter()
        .filter(|p| p.year == year && p.term == term)
        .map(|p| p.amount_paid)
        .sum()
}

/// Balances for terms 1, 2 and 3 of `year`, always three entries.
///
/// `payments` are expected to be scoped to a single student already; see
/// [`payments_for_student`].
pub fn compute_yearly_balance(
    class_name: &str,
    year: i32,
    fee_structures: &[FeeStructure],
    payments: &[Payment],
) -> Vec<TermBalance> {
    let mut running = Decimal::ZERO;
    let mut out = Vec::with_capacity(TERMS.len());
    for term in TERMS {
        let key = term.to_string();
        let fee = term_fee(class_name, year, &key, fee_structures);
        let paid = term_payments(year, &key, payments);
        let term_balance = fee - paid;
        let carry_forward = running;
        let net_balance = term_balance + carry_forward;
        running = net_balance;
        out.push(TermBalance {
            term,
            term_fee: fee,
            term_payments: paid,
            term_balance,
            carry_forward,
            net_balance,
            status: BalanceStatus::from_amount(net_balance),
        });
    }
    out
}

/// What is owed for one term once earlier terms are carried in. Terms
/// outside 1..=3 come back cleared.
pub fn compute_term_net_due(
    class_name: &str,
    term: u32,
    year: i32,
    fee_structures: &[FeeStructure],
    payments: &[Payment],
) -> TermNetDue {
    let balances = compute_yearly_balance(class_name, year, fee_structures, payments);
    let Some(entry) = balances.iter().find(|b| b.term == term) else {
        return TermNetDue::cleared(term);
    };

    let previous_payments = term_payments(year, &term.to_string(), payments);
    let carry_forward_credit = if entry.carry_forward.is_sign_negative() {
        entry.carry_forward.abs()
    } else {
        Decimal::ZERO
    };

    TermNetDue {
        term,
        term_fee: entry.term_fee,
        previous_payments,
        carry_forward: entry.carry_forward,
        carry_forward_credit,
        net_due: entry.net_balance,
        status: entry.status,
    }
}

pub fn compute_yearly_totals(
    class_name: &str,
    year: i32,
    fee_structures: &[FeeStructure],
    payments: &[Payment],
) -> YearlyTotals {
    totals_from_balances(&compute_yearly_balance(
        class_name,
        year,
        fee_structures,
        payments,
    ))
}

fn totals_from_balances(balances: &[TermBalance]) -> YearlyTotals {
    let total_fees: Decimal = balances.iter().map(|b| b.term_fee).sum();
    let total_paid: Decimal = balances.iter().map(|b| b.term_payments).sum();
    let final_balance = total_fees - total_paid;
    YearlyTotals {
        total_fees,
        total_paid,
        final_balance,
        status: BalanceStatus::from_amount(final_balance),
    }
}

pub fn payments_for_student(payments: &[Payment], student_id: &str) -> Vec<Payment> {
    payments
        .iter()
        .filter(|p| p.student_id == student_id)
        .cloned()
        .collect()
}

/// Term balances and yearly totals for one student, from a snapshot that may
/// hold payments for the whole class.
pub fn compute_student_statement(
    class_name: &str,
    year: i32,
    student_id: &str,
    fee_structures: &[FeeStructure],
    payments: &[Payment],
) -> StudentStatement {
    let own = payments_for_student(payments, student_id);
    let terms = compute_yearly_balance(class_name, year, fee_structures, &own);
    let totals = totals_from_balances(&terms);
    StudentStatement {
        student_id: student_id.to_string(),
        class_name: class_name.to_string(),
        year,
        terms,
        totals,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceTone {
    Positive,
    Due,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceDisplay {
    pub text: String,
    pub tone: BalanceTone,
}

/// `KES 12,500`, with two decimals only when there is a fractional part.
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp(2);
    let abs = rounded.abs();
    let plain = if abs.fract().is_zero() {
        abs.trunc().to_string()
    } else {
        format!("{:.2}", abs)
    };
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(f) = frac_part {
        grouped.push('.');
        grouped.push_str(f);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{currency} {grouped}")
}

pub fn format_balance(amount: Decimal, currency: &str) -> BalanceDisplay {
    match BalanceStatus::from_amount(amount) {
        BalanceStatus::Credit => BalanceDisplay {
            text: format!("Credit: {}", format_amount(amount.abs(), currency)),
            tone: BalanceTone::Positive,
        },
        BalanceStatus::Due => BalanceDisplay {
            text: format!("Due: {}", format_amount(amount, currency)),
            tone: BalanceTone::Due,
        },
        BalanceStatus::Cleared => BalanceDisplay {
            text: "Cleared".to_string(),
            tone: BalanceTone::Neutral,
        },
    }
}

pub fn format_amount_with_sign(amount: Decimal, currency: &str) -> String {
    format_balance(amount, currency).text
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fee(class_name: &str, year: i32, term: u32, total: Decimal) -> FeeStructure {
        FeeStructure {
            class_name: class_name.to_string(),
            year,
            term: term.to_string(),
            total_fee: Some(total),
            tuition_fee: None,
            boarding_fee: None,
            activity_fee: None,
            other_fees: None,
        }
    }

    fn paid(term: u32, year: i32, student_id: &str, amount: Decimal) -> Payment {
        Payment {
            term: term.to_string(),
            year,
            student_id: student_id.to_string(),
            amount_paid: amount,
            payment_date: None,
            reference: None,
        }
    }

    fn scenario_a() -> (Vec<FeeStructure>, Vec<Payment>) {
        let fees = vec![
            fee("Form 2", 2025, 1, dec!(50000)),
            fee("Form 2", 2025, 2, dec!(45000)),
            fee("Form 2", 2025, 3, dec!(45000)),
            // Other classes and years must not leak in.
            fee("Form 3", 2025, 1, dec!(99999)),
            fee("Form 2", 2024, 1, dec!(88888)),
        ];
        let payments = vec![
            paid(1, 2025, "S1", dec!(30000)),
            paid(1, 2025, "S1", dec!(20000)),
            paid(2, 2025, "S1", dec!(20000)),
            paid(3, 2025, "S1", dec!(30000)),
            paid(3, 2024, "S1", dec!(5000)),
        ];
        (fees, payments)
    }

    #[test]
    fn yearly_balance_carries_debt_forward() {
        let (fees, payments) = scenario_a();
        let terms = compute_yearly_balance("Form 2", 2025, &fees, &payments);
        assert_eq!(terms.len(), 3);

        assert_eq!(terms[0].term_payments, dec!(50000));
        assert_eq!(terms[0].net_balance, dec!(0));
        assert_eq!(terms[0].status, BalanceStatus::Cleared);

        assert_eq!(terms[1].carry_forward, dec!(0));
        assert_eq!(terms[1].net_balance, dec!(25000));
        assert_eq!(terms[1].status, BalanceStatus::Due);

        assert_eq!(terms[2].carry_forward, dec!(25000));
        assert_eq!(terms[2].term_balance, dec!(15000));
        assert_eq!(terms[2].net_balance, dec!(40000));
        assert_eq!(terms[2].status, BalanceStatus::Due);

        let totals = compute_yearly_totals("Form 2", 2025, &fees, &payments);
        assert_eq!(totals.total_fees, dec!(140000));
        assert_eq!(totals.total_paid, dec!(100000));
        assert_eq!(totals.final_balance, dec!(40000));
        assert_eq!(totals.final_balance, terms[2].net_balance);
        assert_eq!(totals.status, BalanceStatus::Due);
    }

    #[test]
    fn overpayment_becomes_credit_in_next_term() {
        let fees = vec![
            fee("Form 1", 2025, 1, dec!(50000)),
            fee("Form 1", 2025, 2, dec!(40000)),
        ];
        let payments = vec![paid(1, 2025, "S9", dec!(60000))];
        let terms = compute_yearly_balance("Form 1", 2025, &fees, &payments);

        assert_eq!(terms[0].net_balance, dec!(-10000));
        assert_eq!(terms[0].status, BalanceStatus::Credit);
        assert_eq!(terms[1].carry_forward, dec!(-10000));
        assert_eq!(terms[1].net_balance, dec!(30000));
        assert_eq!(terms[1].status, BalanceStatus::Due);

        let due = compute_term_net_due("Form 1", 2, 2025, &fees, &payments);
        assert_eq!(due.carry_forward_credit, dec!(10000));
        assert_eq!(due.previous_payments, dec!(0));
        assert_eq!(due.net_due, dec!(30000));
    }

    #[test]
    fn empty_inputs_give_three_cleared_terms() {
        let terms = compute_yearly_balance("Form 4", 2025, &[], &[]);
        assert_eq!(terms.len(), 3);
        for (i, t) in terms.iter().enumerate() {
            assert_eq!(t.term, (i + 1) as u32);
            assert!(t.net_balance.is_zero());
            assert_eq!(t.status, BalanceStatus::Cleared);
        }
    }

    #[test]
    fn term_net_due_reports_only_that_terms_payments() {
        let (fees, payments) = scenario_a();
        let due = compute_term_net_due("Form 2", 3, 2025, &fees, &payments);
        assert_eq!(due.previous_payments, dec!(30000));
        assert_eq!(due.carry_forward, dec!(25000));
        assert_eq!(due.carry_forward_credit, dec!(0));
        assert_eq!(due.net_due, dec!(40000));
    }

    #[test]
    fn out_of_range_term_is_cleared() {
        let (fees, payments) = scenario_a();
        for term in [0, 4] {
            let due = compute_term_net_due("Form 2", term, 2025, &fees, &payments);
            assert_eq!(due, TermNetDue::cleared(term));
        }
    }

    #[test]
    fn statement_filters_to_one_student() {
        let fees = vec![fee("Form 2", 2025, 1, dec!(50000))];
        let payments = vec![
            paid(1, 2025, "S1", dec!(20000)),
            paid(1, 2025, "S2", dec!(50000)),
        ];
        let statement = compute_student_statement("Form 2", 2025, "S1", &fees, &payments);
        assert_eq!(statement.terms[0].term_payments, dec!(20000));
        assert_eq!(statement.totals.final_balance, dec!(30000));
        assert_eq!(statement.totals.final_balance, statement.terms[2].net_balance);
    }

    #[test]
    fn formatting_selects_text_by_sign() {
        assert_eq!(format_amount(dec!(1234567), "KES"), "KES 1,234,567");
        assert_eq!(format_amount(dec!(999), "KES"), "KES 999");
        assert_eq!(format_amount(dec!(12500.5), "KES"), "KES 12,500.50");
        assert_eq!(format_amount(dec!(-5000), "KES"), "-KES 5,000");

        let credit = format_balance(dec!(-10000), "KES");
        assert_eq!(credit.text, "Credit: KES 10,000");
        assert_eq!(credit.tone, BalanceTone::Positive);

        let due = format_balance(dec!(25000), "KES");
        assert_eq!(due.text, "Due: KES 25,000");
        assert_eq!(due.tone, BalanceTone::Due);

        assert_eq!(format_amount_with_sign(dec!(0), "KES"), "Cleared");
        assert_eq!(format_balance(dec!(0.00), "KES").tone, BalanceTone::Neutral);
    }
}
