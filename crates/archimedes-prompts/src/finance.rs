//! Three-year financial projection from a serviceable obtainable market.
//!
//! The market-research step is asked to state its SOM as a number of users.
//! [`extract_som`] pulls that figure back out of the text and [`project`]
//! applies the penetration schedule and unit economics to it.

use std::sync::LazyLock;

use archimedes_config::FinancialAssumptions;
use regex::Regex;
use serde::Serialize;

/// Share of the SOM captured in years one, two, and three.
pub const PENETRATION_SCHEDULE: [f64; 3] = [0.01, 0.03, 0.07];

/// Smallest figure without a unit that is read as a SOM. Smaller bare numbers
/// are usually years of a plan, step counts or the start of a range.
pub const MIN_BARE_SOM: f64 = 100.0;

static SOM_MARKER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\bSOM\b|serviceable\s+obtainable\s+market").expect("SOM marker regex is valid")
});

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?ix)
    (?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)? | \d+(?:\.\d+)?)
    (?P<range>\s*[-–]\s*(?:\d{1,3}(?:,\d{3})+ | \d+)(?:\.\d+)?)?
    (?:\s*(?P<scale>thousand|million|billion|mn|bn|k|m|b)\b)?
    (?P<unit>\s*(?:%|percent) | \s*(?:users|customers|subscribers|people|members|accounts|households|businesses|companies)\b)?
    ",
  )
  .expect("quantity regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearProjection {
  pub year: u32,
  pub penetration_rate: f64,
  pub users: f64,
  pub revenue: f64,
  pub cost: f64,
  pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
  pub som: f64,
  pub years: Vec<YearProjection>,
}

/// Project revenue, cost, and profit for each year of the schedule.
pub fn project(som: f64, assumptions: &FinancialAssumptions) -> Projection {
  let years = PENETRATION_SCHEDULE
    .iter()
    .zip(1u32..)
    .map(|(&rate, year)| {
      let revenue = rate * som * assumptions.price_per_user_per_year;
      let cost = rate * som * assumptions.cost_per_user_per_year;
      YearProjection {
        year,
        penetration_rate: rate,
        users: rate * som,
        revenue,
        cost,
        profit: revenue - cost,
      }
    })
    .collect();

  Projection { som, years }
}

impl Projection {
  /// Render the projection as a Markdown table.
  pub fn to_markdown(&self) -> String {
    let mut out = String::from(
      "| Year | Penetration of SOM | Paying users | Revenue | Cost | Profit |\n\
       |---|---|---|---|---|---|\n",
    );
    for y in &self.years {
      out.push_str(&format!(
        "| Year {} | {} | {} | {} | {} | {} |\n",
        y.year,
        format_rate(y.penetration_rate),
        group_thousands(y.users),
        format_money(y.revenue),
        format_money(y.cost),
        format_money(y.profit),
      ));
    }
    out
  }
}

/// Find the SOM user count stated in a market-research text.
///
/// Looks at lines mentioning SOM, reads the text after the last mention, and
/// prefers a figure followed by a unit such as "users" or "customers". Money
/// amounts, percentages and percentage ranges ("2-3%") are ignored. Without
/// a unit, the largest figure of at least [`MIN_BARE_SOM`] wins, and bare
/// four-digit years are skipped.
pub fn extract_som(text: &str) -> Option<f64> {
  for line in text.lines() {
    let Some(marker) = SOM_MARKER.find_iter(line).last() else {
      continue;
    };
    let tail = &line[marker.end()..];

    let mut fallback = None;
    for caps in QUANTITY.captures_iter(tail) {
      let Some(num) = caps.name("num") else {
        continue;
      };
      if tail[..num.start()].trim_end().ends_with(['$', '€', '£']) {
        continue;
      }
      let unit = caps.name("unit").map(|m| m.as_str().trim().to_ascii_lowercase());
      if unit
        .as_deref()
        .is_some_and(|u| u.starts_with('%') || u.starts_with("percent"))
      {
        continue;
      }

      let Some(value) = parse_quantity(num.as_str(), caps.name("scale").map(|m| m.as_str()))
      else {
        continue;
      };
      if unit.is_some() {
        return Some(value);
      }
      if is_bare_count(num.as_str(), caps.name("scale").is_some(), value) {
        fallback = Some(fallback.map_or(value, |f: f64| f.max(value)));
      }
    }

    if fallback.is_some() {
      return fallback;
    }
  }
  None
}

/// Whether a figure with no unit can stand for a user count.
fn is_bare_count(num: &str, scaled: bool, value: f64) -> bool {
  if value < MIN_BARE_SOM {
    return false;
  }
  let looks_like_year = !scaled
    && num.len() == 4
    && num.bytes().all(|b| b.is_ascii_digit())
    && (1900.0..=2100.0).contains(&value);
  !looks_like_year
}

fn parse_quantity(num: &str, scale: Option<&str>) -> Option<f64> {
  let base: f64 = num.replace(',', "").parse().ok()?;
  let multiplier = match scale.map(|s| s.to_ascii_lowercase()).as_deref() {
    None => 1.0,
    Some("k" | "thousand") => 1e3,
    Some("m" | "mn" | "million") => 1e6,
    Some("b" | "bn" | "billion") => 1e9,
    Some(_) => return None,
  };
  let value = base * multiplier;
  (value > 0.0).then_some(value)
}

pub(crate) fn format_rate(rate: f64) -> String {
  format!("{}%", trim_float(rate * 100.0))
}

pub(crate) fn format_money(value: f64) -> String {
  if value < 0.0 {
    format!("-${}", group_thousands(-value))
  } else {
    format!("${}", group_thousands(value))
  }
}

pub(crate) fn group_thousands(value: f64) -> String {
  let digits = format!("{:.0}", value.abs());
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(ch);
  }
  if value < 0.0 && grouped != "0" {
    format!("-{}", grouped)
  } else {
    grouped
  }
}

fn trim_float(value: f64) -> String {
  let s = format!("{:.2}", value);
  s.trim_end_matches('0').trim_end_matches('.').to_string()
}
