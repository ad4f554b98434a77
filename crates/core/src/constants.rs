//! Numeric thresholds shared across ledger and valuation code.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Positions with less than this quantity are treated as closed and
/// filtered out of holdings.
pub const QUANTITY_EPSILON: Decimal = dec!(0.000001);

/// Loop guard for the FIFO sell drain; quantities below this are
/// considered fully consumed.
pub const SELL_EPSILON: Decimal = dec!(0.00000001);

/// Decimal places kept when deriving a unit price from a balance valuation.
pub const PRICE_SCALE: u32 = 8;
