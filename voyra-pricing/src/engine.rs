use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;
use voyra_core::rules::{Commission, CommissionKind, PriceRule, RuleKind, RuleScope};

/// Inputs to a price resolution. `agency_id` present means an agency booking;
/// absent means a direct consumer.
#[derive(Debug, Clone)]
pub struct PricingRequest {
    pub base_price: f64,
    pub currency: String,
    pub hotel_code: String,
    pub board_type: String,
    pub agency_id: Option<String>,
    pub booking_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolvedCommission {
    pub commission_id: Uuid,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceResolution {
    pub final_price: f64,
    pub currency: String,
    pub applied_rule_id: Option<Uuid>,
    pub commission: Option<ResolvedCommission>,
}

/// Resolve the chargeable price and agency commission for a booking.
///
/// Pure and deterministic: same rule/commission snapshot and inputs always
/// yield the same result. Selection among matching rules is a total order —
/// highest `priority` wins; ties go to the most specific scope
/// (SpecificAgency over AllAgencies/AllCustomers); remaining ties to the most
/// recently created rule. The recency tie-break is a documented default
/// pending business confirmation, not an accident of iteration order.
///
/// Monetary semantics: two-decimal precision, round-half-up applied at the
/// final step only — intermediate arithmetic stays unrounded.
pub fn resolve_price(
    request: &PricingRequest,
    rules: &[PriceRule],
    commissions: &[Commission],
) -> PriceResolution {
    let winner = rules
        .iter()
        .filter(|rule| rule_matches(rule, request))
        .max_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| scope_specificity(&a.scope).cmp(&scope_specificity(&b.scope)))
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

    let adjusted = match winner {
        Some(rule) => {
            debug!(rule = %rule.name, priority = rule.priority, "Applying price rule");
            apply_rule(rule, request.base_price)
        }
        None => request.base_price,
    };
    let final_price = round_half_up(adjusted);

    let commission = request
        .agency_id
        .as_deref()
        .and_then(|agency_id| resolve_commission(agency_id, request, final_price, commissions));

    PriceResolution {
        final_price,
        currency: request.currency.clone(),
        applied_rule_id: winner.map(|r| r.id),
        commission,
    }
}

fn apply_rule(rule: &PriceRule, base_price: f64) -> f64 {
    match rule.kind {
        RuleKind::PercentageDiscount => base_price - base_price * rule.value / 100.0,
        RuleKind::FixedDiscount => (base_price - rule.value).max(0.0),
        RuleKind::Markup => base_price + base_price * rule.value / 100.0,
    }
}

fn rule_matches(rule: &PriceRule, request: &PricingRequest) -> bool {
    if !rule.is_active {
        return false;
    }

    let scope_matches = match (&rule.scope, request.agency_id.as_deref()) {
        (RuleScope::AllCustomers, None) => true,
        (RuleScope::AllAgencies, Some(_)) => true,
        (RuleScope::SpecificAgency(id), Some(agency_id)) => id == agency_id,
        _ => false,
    };
    if !scope_matches {
        return false;
    }

    filter_matches(rule.hotel_code.as_deref(), &request.hotel_code)
        && filter_matches(rule.board_type.as_deref(), &request.board_type)
        && window_contains(rule.valid_from, rule.valid_until, request.booking_date)
}

/// The single highest-priority commission under the same matching rules as
/// price rules. Commissions have no explicit priority field, so specificity
/// (number of set filters) decides first, then recency. The amount is
/// computed on the final charged price and reported to the agency ledger; it
/// is never subtracted from the customer-facing price.
fn resolve_commission(
    agency_id: &str,
    request: &PricingRequest,
    final_price: f64,
    commissions: &[Commission],
) -> Option<ResolvedCommission> {
    commissions
        .iter()
        .filter(|c| {
            c.is_active
                && c.agency_id == agency_id
                && filter_matches(c.hotel_code.as_deref(), &request.hotel_code)
                && filter_matches(c.board_type.as_deref(), &request.board_type)
                && window_contains(c.valid_from, c.valid_until, request.booking_date)
        })
        .max_by(|a, b| {
            commission_specificity(a)
                .cmp(&commission_specificity(b))
                .then_with(|| a.created_at.cmp(&b.created_at))
        })
        .map(|c| {
            let amount = match c.kind {
                CommissionKind::Percentage => final_price * c.value / 100.0,
                CommissionKind::Fixed => c.value,
            };
            ResolvedCommission {
                commission_id: c.id,
                amount: round_half_up(amount),
            }
        })
}

fn filter_matches(filter: Option<&str>, value: &str) -> bool {
    filter.map_or(true, |f| f == value)
}

/// Active window check, inclusive of both bounds.
fn window_contains(from: Option<NaiveDate>, until: Option<NaiveDate>, date: NaiveDate) -> bool {
    from.map_or(true, |f| date >= f) && until.map_or(true, |u| date <= u)
}

fn scope_specificity(scope: &RuleScope) -> u8 {
    match scope {
        RuleScope::SpecificAgency(_) => 2,
        RuleScope::AllAgencies | RuleScope::AllCustomers => 1,
    }
}

fn commission_specificity(commission: &Commission) -> u8 {
    commission.hotel_code.is_some() as u8 + commission.board_type.is_some() as u8
}

/// Round to two decimal places, half up. Applied once, at the final step.
fn round_half_up(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
