//! Product Payload Builder
//!
//! Turns loosely typed form input into a [`ProductPayload`] for
//! `POST /products/`. Pure and deterministic; rules run in a fixed order
//! (name, plan, price type, metered block, organization id) and the first
//! violation is returned.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use uuid::{Uuid, Variant};

use crate::error::ValidationError;
use crate::gateway::join_url;

/// Minimum trimmed product name length
pub const MIN_NAME_LEN: usize = 3;

/// Smallest chargeable amount in cents
pub const MIN_PRICE_CENTS: i64 = 50;

/// Billing plan selected on the form
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plan {
    OneTime,
    Month,
    Year,
}

impl Plan {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "one_time" => Ok(Self::OneTime),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(ValidationError::InvalidPlan(other.to_string())),
        }
    }

    pub const fn recurring_interval(self) -> Option<RecurringInterval> {
        match self {
            Self::OneTime => None,
            Self::Month => Some(RecurringInterval::Month),
            Self::Year => Some(RecurringInterval::Year),
        }
    }
}

/// Base price kind selected on the form
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceType {
    Fixed,
    Custom,
    Free,
}

impl PriceType {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "fixed" => Ok(Self::Fixed),
            "custom" => Ok(Self::Custom),
            "free" => Ok(Self::Free),
            other => Err(ValidationError::InvalidPriceType(other.to_string())),
        }
    }
}

/// Billing cadence of a subscription product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringInterval {
    Month,
    Year,
}

/// Price currency. Only USD is offered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Usd,
}

/// An amount as entered: integer, fractional number, or text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl AmountInput {
    /// Blank text counts as "not supplied"
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }

    /// Whole cents, truncated toward zero. `None` when unparsable.
    pub fn to_cents(&self) -> Option<i64> {
        let decimal = match self {
            Self::Integer(n) => return Some(*n),
            Self::Number(n) => Decimal::from_f64_retain(*n)?,
            Self::Text(s) => {
                let s = s.trim();
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .ok()?
            }
        };
        decimal.trunc().to_i64()
    }

    /// Amount as entered, kept as decimal text. `None` when blank or not finite.
    pub fn to_decimal_string(&self) -> Option<String> {
        match self {
            Self::Integer(n) => Some(n.to_string()),
            Self::Number(n) => Decimal::from_f64(*n).map(|d| d.normalize().to_string()),
            Self::Text(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        }
    }
}

impl From<i64> for AmountInput {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Raw product form fields
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPlanInput {
    pub name: String,
    pub description: Option<String>,

    /// `one_time`, `month` or `year`
    pub plan: String,

    /// `fixed`, `custom` or `free`
    pub price_type: String,

    pub fixed_amount: Option<AmountInput>,
    pub custom_min: Option<AmountInput>,
    pub custom_max: Option<AmountInput>,
    pub custom_preset: Option<AmountInput>,
    pub org_id: Option<String>,

    pub enable_metered: bool,
    pub meter_id: Option<String>,

    /// Per-unit price in cents; fractional values are kept
    pub unit_amount: Option<AmountInput>,
    pub cap_amount: Option<AmountInput>,
}

/// One entry of a product's `prices` list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "amount_type", rename_all = "snake_case")]
pub enum PriceSpec {
    Fixed {
        price_currency: Currency,
        price_amount: i64,
    },
    Custom {
        price_currency: Currency,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum_amount: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum_amount: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preset_amount: Option<i64>,
    },
    Free,
    MeteredUnit {
        meter_id: String,
        price_currency: Currency,
        unit_amount: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cap_amount: Option<i64>,
    },
}

impl PriceSpec {
    pub const fn is_metered(&self) -> bool {
        matches!(self, Self::MeteredUnit { .. })
    }
}

/// Request body for `POST /products/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    pub description: Option<String>,

    /// `None` for one-time products
    pub recurring_interval: Option<RecurringInterval>,

    /// Base price first, metered price second when present
    pub prices: Vec<PriceSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

impl ProductPayload {
    pub const fn is_recurring(&self) -> bool {
        self.recurring_interval.is_some()
    }

    pub fn has_metered_price(&self) -> bool {
        self.prices.iter().any(PriceSpec::is_metered)
    }

    /// Render the create call as a `curl` command. The token is left as a
    /// shell variable.
    pub fn to_curl(&self, base_url: &str) -> serde_json::Result<String> {
        let body = serde_json::to_string_pretty(self)?.replace('\'', r"'\''");
        Ok(format!(
            "curl -X POST '{}' \\\n  -H \"Authorization: Bearer $POLAR_ACCESS_TOKEN\" \\\n  -H 'Content-Type: application/json' \\\n  -H 'Accept: application/json' \\\n  -d '{}'",
            join_url(base_url, "/products/"),
            body
        ))
    }
}

/// UUID in 8-4-4-4-12 hex form, version 1-5, RFC 4122 variant
pub fn is_uuid(value: &str) -> bool {
    let value = value.trim();
    value.len() == 36
        && Uuid::parse_str(value).is_ok_and(|id| {
            matches!(id.get_version_num(), 1..=5) && id.get_variant() == Variant::RFC4122
        })
}

/// Validate form input and build the product payload
pub fn build_product_payload(input: &PricingPlanInput) -> Result<ProductPayload, ValidationError> {
    let name = input.name.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::NameTooShort);
    }

    let plan = Plan::parse(&input.plan)?;
    let price_type = PriceType::parse(&input.price_type)?;

    let mut prices = vec![base_price(price_type, input)?];
    if input.enable_metered {
        prices.push(metered_price(plan, input)?);
    }

    let organization_id = organization_id(input.org_id.as_deref())?;

    Ok(ProductPayload {
        name: name.to_string(),
        description: input.description.clone().filter(|d| !d.is_empty()),
        recurring_interval: plan.recurring_interval(),
        prices,
        organization_id,
    })
}

/// State of an optional amount field
enum Supplied {
    Missing,
    Invalid,
    Cents(i64),
}

fn supplied_cents(input: Option<&AmountInput>) -> Supplied {
    match input.filter(|amount| !amount.is_blank()) {
        None => Supplied::Missing,
        Some(amount) => amount.to_cents().map_or(Supplied::Invalid, Supplied::Cents),
    }
}

fn base_price(price_type: PriceType, input: &PricingPlanInput) -> Result<PriceSpec, ValidationError> {
    match price_type {
        PriceType::Fixed => match supplied_cents(input.fixed_amount.as_ref()) {
            Supplied::Cents(cents) if cents >= MIN_PRICE_CENTS => Ok(PriceSpec::Fixed {
                price_currency: Currency::Usd,
                price_amount: cents,
            }),
            _ => Err(ValidationError::InvalidFixedAmount),
        },
        PriceType::Custom => {
            let minimum = custom_bound("minimum", input.custom_min.as_ref())?;
            let maximum = custom_bound("maximum", input.custom_max.as_ref())?;
            let preset = custom_bound("preset", input.custom_preset.as_ref())?;

            if let (Some(minimum), Some(maximum)) = (minimum, maximum) {
                if minimum > maximum {
                    return Err(ValidationError::CustomMinExceedsMax { minimum, maximum });
                }
            }

            Ok(PriceSpec::Custom {
                price_currency: Currency::Usd,
                minimum_amount: minimum,
                maximum_amount: maximum,
                preset_amount: preset,
            })
        }
        PriceType::Free => Ok(PriceSpec::Free),
    }
}

fn custom_bound(field: &'static str, input: Option<&AmountInput>) -> Result<Option<i64>, ValidationError> {
    match supplied_cents(input) {
        Supplied::Missing => Ok(None),
        Supplied::Invalid => Err(ValidationError::InvalidCustomAmount(field)),
        Supplied::Cents(cents) if cents < MIN_PRICE_CENTS => Err(ValidationError::CustomAmountTooLow(field)),
        Supplied::Cents(cents) => Ok(Some(cents)),
    }
}

fn metered_price(plan: Plan, input: &PricingPlanInput) -> Result<PriceSpec, ValidationError> {
    if plan.recurring_interval().is_none() {
        return Err(ValidationError::MeteredOnOneTime);
    }

    let meter_id = input
        .meter_id
        .as_deref()
        .map(str::trim)
        .filter(|id| is_uuid(id))
        .ok_or(ValidationError::InvalidMeterId)?;

    let unit_amount = input
        .unit_amount
        .as_ref()
        .and_then(AmountInput::to_decimal_string)
        .ok_or(ValidationError::MissingUnitAmount)?;

    let cap_amount = match supplied_cents(input.cap_amount.as_ref()) {
        Supplied::Missing => None,
        Supplied::Cents(cents) if cents >= 0 => Some(cents),
        Supplied::Cents(_) | Supplied::Invalid => return Err(ValidationError::InvalidCapAmount),
    };

    Ok(PriceSpec::MeteredUnit {
        meter_id: meter_id.to_string(),
        price_currency: Currency::Usd,
        unit_amount,
        cap_amount,
    })
}

/// Blank ids are dropped; anything else must be a UUID
fn organization_id(org_id: Option<&str>) -> Result<Option<String>, ValidationError> {
    match org_id.map(str::trim).filter(|id| !id.is_empty()) {
        None => Ok(None),
        Some(id) if is_uuid(id) => Ok(Some(id.to_string())),
        Some(_) => Err(ValidationError::InvalidOrganizationId),
    }
}
