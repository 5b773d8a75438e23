use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Provident fund contribution, applied to prorated basic for both sides.
pub const DEFAULT_PF_RATE: Decimal = dec!(0.12);

/// Professional tax kicks in once monthly gross reaches the threshold.
pub const DEFAULT_PROF_TAX_THRESHOLD: Decimal = dec!(15000);
pub const DEFAULT_PROF_TAX_AMOUNT: Decimal = dec!(200);

/// Minimum aggregated work hours for a day to count as present.
pub const DEFAULT_MIN_ACTIVE_HOURS: f64 = 4.0;

/// Count Mon-Fri as working days; `false` counts every calendar day.
pub const DEFAULT_BUSINESS_DAYS_ONLY: bool = true;
