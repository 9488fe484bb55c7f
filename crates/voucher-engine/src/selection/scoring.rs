use super::domain::{DiscountRule, OrderContext, Voucher};

/// Why a single voucher produced no score. Never fatal to a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("order amount {order_amount} does not meet minimum requirement {minimum}")]
    Ineligible { order_amount: f64, minimum: f64 },
    #[error("invalid voucher discount configuration: {0}")]
    Malformed(#[from] MalformedVoucher),
}

impl EvaluationError {
    /// Malformed rows are data defects, as opposed to an expected miss.
    pub fn is_malformed(&self) -> bool {
        matches!(self, EvaluationError::Malformed(_))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedVoucher {
    #[error("neither a discount amount nor a percentage is set")]
    MissingDiscount,
    #[error("{field} must be a finite, non-negative amount (got {value})")]
    InvalidAmount { field: &'static str, value: f64 },
}

/// Discount `voucher` grants on the order, floored to a whole currency unit.
///
/// An unusable minimum makes the voucher malformed rather than eligible.
/// Flat vouchers yield their amount. Percentage vouchers yield
/// `order * percentage / 100`, clamped to `max_discount_amount` when one is
/// set. Safe to call from any number of workers at once.
pub fn calculate_discount(
    voucher: &Voucher,
    order: &OrderContext,
) -> Result<f64, EvaluationError> {
    let order_amount = order.order_amount();
    let minimum = checked_amount("min_order_amount", voucher.min_order_amount)?;
    if order_amount < minimum {
        return Err(EvaluationError::Ineligible {
            order_amount,
            minimum,
        });
    }

    let discount = match voucher
        .discount_rule()
        .ok_or(MalformedVoucher::MissingDiscount)?
    {
        DiscountRule::Flat { amount } => checked_amount("discount_amount", amount)?,
        DiscountRule::Percentage { percentage, cap } => {
            let raw = order_amount * f64::from(percentage) / 100.0;
            match cap {
                Some(cap) => raw.min(checked_amount("max_discount_amount", cap)?),
                None => raw,
            }
        }
    };

    Ok(discount.floor())
}

fn checked_amount(field: &'static str, value: f64) -> Result<f64, MalformedVoucher> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(MalformedVoucher::InvalidAmount { field, value })
    }
}
