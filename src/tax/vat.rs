//! VAT decomposition for the fixed 10% Korean value-added tax

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Fixed VAT rate in percent
pub const VAT_RATE_PERCENT: i64 = 10;

/// How the VAT relates to a recorded gross amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxMode {
    /// Gross amount already contains the VAT
    #[serde(alias = "include")]
    Included,
    /// VAT is charged on top of the gross amount
    #[serde(alias = "exclude")]
    Excluded,
    /// No VAT applies
    #[default]
    None,
}

impl TaxMode {
    /// Parse a tax option as written by the collaborator layer.
    ///
    /// Case-insensitive; `include`/`included` and `exclude`/`excluded` are
    /// accepted. Anything else, including the empty string, is `None`.
    pub fn parse(value: &str) -> Self {
        Self::recognize(value).unwrap_or(TaxMode::None)
    }

    /// Like [`TaxMode::parse`] but reports whether the value was recognized
    pub fn recognize(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "include" | "included" => Some(TaxMode::Included),
            "exclude" | "excluded" => Some(TaxMode::Excluded),
            "none" => Some(TaxMode::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxMode::Included => "included",
            TaxMode::Excluded => "excluded",
            TaxMode::None => "none",
        }
    }
}

/// Supply/VAT split of a single amount. Arithmetic saturates at the `i64` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VatBreakdown {
    /// Pre-tax amount
    pub supply_amount: i64,
    /// VAT component
    pub vat_amount: i64,
}

impl VatBreakdown {
    pub fn new(supply_amount: i64, vat_amount: i64) -> Self {
        Self {
            supply_amount,
            vat_amount,
        }
    }

    /// Total is always recomputed; it may differ from the recorded gross in excluded mode
    pub fn total(&self) -> i64 {
        self.supply_amount.saturating_add(self.vat_amount)
    }

    pub fn is_zero(&self) -> bool {
        self.supply_amount == 0 && self.vat_amount == 0
    }
}

impl Add for VatBreakdown {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.supply_amount.saturating_add(rhs.supply_amount),
            self.vat_amount.saturating_add(rhs.vat_amount),
        )
    }
}

impl AddAssign for VatBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for VatBreakdown {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.supply_amount.saturating_sub(rhs.supply_amount),
            self.vat_amount.saturating_sub(rhs.vat_amount),
        )
    }
}

impl SubAssign for VatBreakdown {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for VatBreakdown {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(self.supply_amount.saturating_neg(), self.vat_amount.saturating_neg())
    }
}

/// Split a gross amount into supply and VAT.
///
/// - `Included`: supply = round(gross / 1.1), vat = gross - supply
/// - `Excluded`: supply = gross, vat = round(gross * 0.1)
/// - `None`: supply = gross, vat = 0
///
/// Rounding is half away from zero and happens exactly once.
pub fn decompose_vat(gross_amount: i64, tax_mode: TaxMode) -> VatBreakdown {
    match tax_mode {
        TaxMode::Included => {
            let supply_amount = reverse_supply(gross_amount);
            VatBreakdown::new(supply_amount, gross_amount.saturating_sub(supply_amount))
        }
        TaxMode::Excluded => VatBreakdown::new(gross_amount, vat_on(gross_amount)),
        TaxMode::None => VatBreakdown::new(gross_amount, 0),
    }
}

/// [`decompose_vat`] taking the raw tax option string
pub fn decompose_vat_str(gross_amount: i64, tax_mode: &str) -> VatBreakdown {
    decompose_vat(gross_amount, TaxMode::parse(tax_mode))
}

fn reverse_supply(gross_amount: i64) -> i64 {
    let divisor = BigDecimal::from(100 + VAT_RATE_PERCENT);
    let supply = BigDecimal::from(gross_amount) * BigDecimal::from(100) / divisor;
    round_to_won(&supply, gross_amount)
}

fn vat_on(supply_amount: i64) -> i64 {
    let vat = BigDecimal::from(supply_amount) * BigDecimal::from(VAT_RATE_PERCENT)
        / BigDecimal::from(100);
    round_to_won(&vat, 0)
}

// Quotients of i64 by 1.1 or 10 always fit back into i64.
fn round_to_won(value: &BigDecimal, fallback: i64) -> i64 {
    value
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .unwrap_or(fallback)
}
