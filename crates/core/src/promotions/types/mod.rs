//! Promotion Types

pub mod bundle;
pub mod buy_x_get_y;
pub mod free_gift;
pub mod tiered;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;

use crate::{discounts::percentage_from_points, promotions::ConfigError};

/// Read a configured percentage, in points from 0 to 100.
fn percent_points(points: Decimal) -> Result<Percentage, ConfigError> {
    if points.is_sign_negative() || points > Decimal::ONE_HUNDRED {
        return Err(ConfigError::PercentOutOfRange(points));
    }

    Ok(percentage_from_points(points))
}
