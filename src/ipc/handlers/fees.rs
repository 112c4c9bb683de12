use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::fees;
use crate::ipc::error::ok;
use crate::ipc::helpers::{ok_model, parse_params, respond};
use crate::ipc::types::{AppState, Request};
use crate::records::{de_term, de_year, FeeStructure, Payment};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerParams {
    class_name: String,
    #[serde(deserialize_with = "de_year")]
    year: i32,
    #[serde(default)]
    fee_structures: Vec<FeeStructure>,
    #[serde(default)]
    payments: Vec<Payment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TermParams {
    #[serde(flatten)]
    ledger: LedgerParams,
    #[serde(deserialize_with = "de_term")]
    term: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementParams {
    #[serde(flatten)]
    ledger: LedgerParams,
    student_id: String,
}

#[derive(Debug, Deserialize)]
struct AmountParams {
    amount: Decimal,
}

fn handle_yearly_balance(req: &Request) -> Result<serde_json::Value, serde_json::Value> {
    let p: LedgerParams = parse_params(req)?;
    let terms = fees::compute_yearly_balance(&p.class_name, p.year, &p.fee_structures, &p.payments);
    Ok(ok(&req.id, json!({ "terms": terms })))
}

fn handle_term_net_due(req: &Request) -> Result<serde_json::Value, serde_json::Value> {
    let p: TermParams = parse_params(req)?;
    // Terms match the ledger's string form exactly ("01" is not term 1);
    // anything else comes back cleared.
    let term = fees::TERMS
        .into_iter()
        .find(|t| t.to_string() == p.term)
        .unwrap_or(0);
    let l = &p.ledger;
    let due = fees::compute_term_net_due(&l.class_name, term, l.year, &l.fee_structures, &l.payments);
    Ok(ok_model(req, &due))
}

fn handle_yearly_totals(req: &Request) -> Result<serde_json::Value, serde_json::Value> {
    let p: LedgerParams = parse_params(req)?;
    let totals = fees::compute_yearly_totals(&p.class_name, p.year, &p.fee_structures, &p.payments);
    Ok(ok_model(req, &totals))
}

fn handle_student_statement(req: &Request) -> Result<serde_json::Value, serde_json::Value> {
    let p: StatementParams = parse_params(req)?;
    let l = &p.ledger;
    let statement = fees::compute_student_statement(
        &l.class_name,
        l.year,
        &p.student_id,
        &l.fee_structures,
        &l.payments,
    );
    Ok(ok_model(req, &statement))
}

fn handle_format_balance(
    state: &AppState,
    req: &Request,
) -> Result<serde_json::Value, serde_json::Value> {
    let p: AmountParams = parse_params(req)?;
    let currency = &state.settings.currency;
    let display = fees::format_balance(p.amount, currency);
    Ok(ok(
        &req.id,
        json!({
            "text": display.text,
            "tone": display.tone,
            "signed": fees::format_amount_with_sign(p.amount, currency),
            "amount": fees::format_amount(p.amount, currency),
        }),
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "fees.yearlyBalance" => handle_yearly_balance(req),
        "fees.termNetDue" => handle_term_net_due(req),
        "fees.yearlyTotals" => handle_yearly_totals(req),
        "fees.studentStatement" => handle_student_statement(req),
        "fees.formatBalance" => handle_format_balance(state, req),
        _ => return None,
    };
    Some(respond(result))
}
