use rust_decimal::Decimal;

/// Sizing inputs resolved from the signal, the follow row and any
/// call-time overrides.
#[derive(Debug, Clone)]
pub struct SizingInputs {
    pub signal_size: Decimal,
    pub price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub multiplier: Decimal,
    pub max_size: Option<Decimal>,
    pub risk_pct: Option<Decimal>,
    pub equity: Option<Decimal>,
}

/// Nominal copy size: the signal size scaled by the follower's multiplier.
pub fn base_amount(signal_size: Decimal, multiplier: Decimal) -> Decimal {
    signal_size * multiplier
}

/// Largest amount whose loss at the stop equals `risk_pct` of equity.
/// `None` when the signal has no stop loss or the stop sits at the price.
pub fn risk_budget_size(
    equity: Decimal,
    risk_pct: Decimal,
    price: Decimal,
    stop_loss: Option<Decimal>,
) -> Option<Decimal> {
    let stop = stop_loss?;
    let risk_per_unit = (price - stop).abs();
    if risk_per_unit.is_zero() {
        return None;
    }
    Some((equity * risk_pct / risk_per_unit).max(Decimal::ZERO))
}

/// Final copy amount: base amount, then clamped by the follow's `max_size`
/// and the per-trade risk budget.
pub fn calculate_size(inputs: &SizingInputs) -> Decimal {
    let mut size = base_amount(inputs.signal_size, inputs.multiplier);

    if let Some(max) = inputs.max_size {
        size = size.min(max);
    }

    if let (Some(risk_pct), Some(equity)) = (inputs.risk_pct, inputs.equity) {
        if let Some(budget) = risk_budget_size(equity, risk_pct, inputs.price, inputs.stop_loss) {
            size = size.min(budget);
        }
    }

    size.max(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
