use serde::{Deserialize, Serialize};

/// Stored voucher row. Discount fields mirror nullable columns, so a voucher
/// with neither a fixed amount nor a percentage is representable and only
/// rejected when it is scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: i64,
    pub code: String,
    pub min_order_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discount_amount: Option<f64>,
}

impl Voucher {
    pub fn flat(id: i64, code: impl Into<String>, min_order_amount: f64, amount: f64) -> Self {
        Self {
            id,
            code: code.into(),
            min_order_amount,
            discount_amount: Some(amount),
            discount_percentage: None,
            max_discount_amount: None,
        }
    }

    pub fn percentage(
        id: i64,
        code: impl Into<String>,
        min_order_amount: f64,
        percentage: u32,
        cap: Option<f64>,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            min_order_amount,
            discount_amount: None,
            discount_percentage: Some(percentage),
            max_discount_amount: cap,
        }
    }

    /// Resolved discount rule, or `None` when the row carries neither kind.
    /// A fixed amount takes precedence when both columns are populated.
    pub fn discount_rule(&self) -> Option<DiscountRule> {
        match (self.discount_amount, self.discount_percentage) {
            (Some(amount), _) => Some(DiscountRule::Flat { amount }),
            (None, Some(percentage)) => Some(DiscountRule::Percentage {
                percentage,
                cap: self.max_discount_amount,
            }),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscountRule {
    Flat { amount: f64 },
    Percentage { percentage: u32, cap: Option<f64> },
}

/// The order every voucher in a run is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderContext {
    order_amount: f64,
}

impl OrderContext {
    /// Returns `None` for negative, NaN, or infinite totals.
    pub fn new(order_amount: f64) -> Option<Self> {
        (order_amount.is_finite() && order_amount >= 0.0).then_some(Self { order_amount })
    }

    pub fn order_amount(&self) -> f64 {
        self.order_amount
    }
}

/// An eligible voucher paired with the whole-unit discount it yields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredVoucher {
    pub voucher: Voucher,
    pub discount: f64,
}

/// Winner of a selection run plus the bookkeeping gathered on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub voucher: Voucher,
    pub discount: f64,
    pub stats: RunStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub candidates: usize,
    pub eligible: usize,
    pub skipped: usize,
}
