use std::str::FromStr;

use chrono::NaiveDate;
use pest::iterators::{Pair, Pairs};
use pest::{Parser, Span};
use pest_derive::Parser as PestParser;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use tif_core as tc;

use error::{ParseError, ParseResult};

pub mod error;

#[derive(PestParser)]
#[grammar = "tif.pest"]
pub struct TifParser;

/// A vacation range attached to one keyholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vacation {
    pub keyholder: String,
    pub range: tc::DateRange,
}

/// All persisted entries of one account, as listed in a credits or debits file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerLine {
    pub keyholder: String,
    pub entries: Vec<tc::Entry>,
}

fn optional_rule<'i>(rule: Rule, pairs: &mut Pairs<'i, Rule>) -> Option<Pair<'i, Rule>> {
    match pairs.peek() {
        Some(ref p) if p.as_rule() == rule => pairs.next(),
        _ => None,
    }
}

fn next_pair<'i>(
    pairs: &mut Pairs<'i, Rule>,
    expected: &str,
    span: &Span<'i>,
) -> ParseResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| ParseError::invalid_state_with_span(expected, span.clone()))
}

/// Parses `input` as `rule` and returns the lines below the file rule.
fn lines(rule: Rule, input: &str) -> ParseResult<Pairs<'_, Rule>> {
    let parsed = TifParser::parse(rule, input)?
        .next()
        .ok_or_else(|| ParseError::invalid_state("non-empty parse result"))?;
    Ok(parsed.into_inner())
}

/// Parses a keyholder roster.  A line is `ID`, `ID START` or `ID START END`.
pub fn parse_roster(input: &str) -> ParseResult<Vec<tc::Keyholder>> {
    let mut keyholders = Vec::new();
    for pair in lines(Rule::roster, input)? {
        match pair.as_rule() {
            Rule::roster_line => keyholders.push(roster_line(pair)?),
            Rule::EOI => break,
            _ => {
                return Err(ParseError::invalid_state_with_span(
                    "keyholder line",
                    pair.as_span(),
                ))
            }
        }
    }
    Ok(keyholders)
}

fn roster_line(pair: Pair<'_, Rule>) -> ParseResult<tc::Keyholder> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();
    let id = next_pair(&mut pairs, "keyholder id", &span)?.as_str();
    let start = optional_rule(Rule::date, &mut pairs).map(date).transpose()?;
    let end = optional_rule(Rule::date, &mut pairs).map(date).transpose()?;

    let activity = match (start, end) {
        (None, _) => tc::Activity::always(),
        (Some(start), None) => tc::Activity::starting(start),
        (Some(start), Some(end)) if start <= end => tc::Activity::between(start, end),
        (Some(start), Some(end)) => {
            return Err(ParseError::malformed_record(
                format!("{} leaves on {} before joining on {}", id, end, start),
                span,
            ))
        }
    };
    Ok(tc::Keyholder::new(id, activity))
}

/// Parses vacation ranges, one `ID START END` per line.
pub fn parse_vacations(input: &str) -> ParseResult<Vec<Vacation>> {
    let mut vacations = Vec::new();
    for pair in lines(Rule::vacations, input)? {
        match pair.as_rule() {
            Rule::vacation_line => vacations.push(vacation_line(pair)?),
            Rule::EOI => break,
            _ => {
                return Err(ParseError::invalid_state_with_span(
                    "vacation line",
                    pair.as_span(),
                ))
            }
        }
    }
    Ok(vacations)
}

fn vacation_line(pair: Pair<'_, Rule>) -> ParseResult<Vacation> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();
    let keyholder = next_pair(&mut pairs, "keyholder id", &span)?.as_str();
    let start = date(next_pair(&mut pairs, "vacation start", &span)?)?;
    let end = date(next_pair(&mut pairs, "vacation end", &span)?)?;
    if end < start {
        return Err(ParseError::malformed_record(
            format!("vacation of {} ends on {} before it starts on {}", keyholder, end, start),
            span,
        ));
    }
    Ok(Vacation {
        keyholder: keyholder.to_string(),
        range: tc::DateRange::new(start, end),
    })
}

/// Parses a credits or debits file.  Entries keep the order they are listed in.
pub fn parse_ledger(input: &str) -> ParseResult<Vec<LedgerLine>> {
    let mut accounts = Vec::new();
    for pair in lines(Rule::ledger, input)? {
        match pair.as_rule() {
            Rule::ledger_line => accounts.push(ledger_line(pair)?),
            Rule::EOI => break,
            _ => {
                return Err(ParseError::invalid_state_with_span(
                    "ledger line",
                    pair.as_span(),
                ))
            }
        }
    }
    Ok(accounts)
}

fn ledger_line(pair: Pair<'_, Rule>) -> ParseResult<LedgerLine> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();
    let keyholder = next_pair(&mut pairs, "keyholder id", &span)?
        .as_str()
        .to_string();
    let entries = pairs.map(ledger_entry).collect::<ParseResult<_>>()?;
    Ok(LedgerLine { keyholder, entries })
}

fn ledger_entry(pair: Pair<'_, Rule>) -> ParseResult<tc::Entry> {
    debug_assert!(pair.as_rule() == Rule::ledger_entry);
    let span = pair.as_span();
    let mut pairs = pair.into_inner();
    let date = date(next_pair(&mut pairs, "entry date", &span)?)?;
    let minutes = next_pair(&mut pairs, "entry minutes", &span)?;
    let amount = i64::from_str(minutes.as_str()).map_err(|e| {
        ParseError::invalid_input_with_span(
            format!("{} is not a number of minutes: {}", minutes.as_str(), e),
            minutes.as_span(),
        )
    })?;
    let flags = optional_rule(Rule::flags, &mut pairs)
        .map(|p| tc::Flags::from(p.as_str()))
        .unwrap_or_default();
    Ok(tc::Entry::builder()
        .date(date)
        .amount(amount)
        .flags(flags)
        .build())
}

/// Parses one daily hours file.
pub fn parse_hours(input: &str) -> ParseResult<tc::Days> {
    let mut days = tc::Days::new();
    parse_hours_into(input, &mut days)?;
    Ok(days)
}

/// Parses one daily hours file, appending its records to `days`.  Records for a date that is
/// already present are added after the ones already there.  Nothing is added if the file has
/// an error.
pub fn parse_hours_into(input: &str, days: &mut tc::Days) -> ParseResult<()> {
    let mut parsed = Vec::new();
    for pair in lines(Rule::hours_file, input)? {
        match pair.as_rule() {
            Rule::hours_line => parsed.push(hours_line(pair)?),
            Rule::schedule_note => {}
            Rule::EOI => break,
            _ => {
                return Err(ParseError::invalid_state_with_span(
                    "hours line",
                    pair.as_span(),
                ))
            }
        }
    }

    for (date, records) in parsed {
        if !records.is_empty() {
            days.entry(date).or_default().extend(records);
        }
    }
    Ok(())
}

fn hours_line(pair: Pair<'_, Rule>) -> ParseResult<(NaiveDate, Vec<tc::WorkRecord>)> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();
    let date = date(next_pair(&mut pairs, "date", &span)?)?;
    let records = pairs.map(work_record).collect::<ParseResult<_>>()?;
    Ok((date, records))
}

fn work_record(pair: Pair<'_, Rule>) -> ParseResult<tc::WorkRecord> {
    debug_assert!(pair.as_rule() == Rule::work_record);
    let span = pair.as_span();
    let mut negative = false;
    let mut keyholder = "";
    let mut hours = Decimal::from(1);
    let mut factor = Decimal::from(1);
    let mut flags = tc::Flags::new();

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::negative => negative = true,
            Rule::key => keyholder = p.as_str(),
            Rule::hours => hours = num(p)?,
            Rule::factor => factor = num(p)?,
            Rule::flags => flags = tc::Flags::from(p.as_str()),
            _ => return Err(ParseError::invalid_state_with_span("work record part", p.as_span())),
        }
    }

    let signed = if negative { -hours } else { hours };
    let minutes = Decimal::from(60)
        .checked_mul(signed)
        .and_then(|m| m.checked_div(factor))
        .and_then(|m| m.trunc().to_i64())
        .ok_or_else(|| {
            ParseError::malformed_record(
                format!("{} does not give a whole number of minutes", span.as_str()),
                span.clone(),
            )
        })?;

    Ok(tc::WorkRecord::builder()
        .keyholder(keyholder)
        .amount(minutes)
        .flags(flags)
        .build())
}

fn num(pair: Pair<'_, Rule>) -> ParseResult<Decimal> {
    Decimal::from_str(pair.as_str()).map_err(|e| ParseError::decimal_parse_error(e, pair.as_span()))
}

fn date(pair: Pair<'_, Rule>) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(pair.as_str(), "%Y-%m-%d").map_err(|e| {
        ParseError::invalid_input_with_span(
            format!("{} is not a calendar date: {}", pair.as_str(), e),
            pair.as_span(),
        )
    })
}
