// src/settlement.rs

use crate::error::{NoticeError, Result};
use crate::money::round_cents;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Business multipliers for the two negotiated amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettlementRules {
    /// Applied when the driver accepts the points on their license.
    pub disclosure_factor: Decimal,
    pub nondisclosure_factor: Decimal,
    pub nondisclosure_multiplier: Decimal,
}

impl Default for SettlementRules {
    fn default() -> Self {
        Self {
            disclosure_factor: dec!(0.6),
            nondisclosure_factor: dec!(0.8),
            nondisclosure_multiplier: dec!(3),
        }
    }
}

/// The two amounts offered to the driver, already rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementAmounts {
    pub with_disclosure: Decimal,
    pub without_disclosure: Decimal,
}

impl SettlementRules {
    /// Fails instead of panicking when the product does not fit in a `Decimal`.
    pub fn compute(&self, base_value: Decimal) -> Result<SettlementAmounts> {
        let overflow = || NoticeError::AmountOverflow { base: base_value };

        let with_disclosure = base_value
            .checked_mul(self.disclosure_factor)
            .ok_or_else(overflow)?;
        let without_disclosure = base_value
            .checked_mul(self.nondisclosure_factor)
            .and_then(|v| v.checked_mul(self.nondisclosure_multiplier))
            .ok_or_else(overflow)?;

        Ok(SettlementAmounts {
            with_disclosure: round_cents(with_disclosure),
            without_disclosure: round_cents(without_disclosure),
        })
    }
}
