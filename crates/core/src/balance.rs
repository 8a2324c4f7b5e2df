//! Reading the available balance from the order form.

/// Prefix the trading form puts in front of the spendable amount.
pub const BALANCE_PREFIX: &str = "Max:";

/// Parses text such as `Max: 1,234.5 SOL` into the numeric balance.
///
/// Returns `None` for anything that does not carry the prefix followed by a
/// finite, non-negative number.
pub fn parse_balance(text: &str) -> Option<f64> {
	let (_, rest) = text.split_once(BALANCE_PREFIX)?;
	let number = rest.split_whitespace().next()?.replace(',', "");
	let value: f64 = number.parse().ok()?;
	(value.is_finite() && value >= 0.0).then_some(value)
}

/// Amount to submit for a sale.
///
/// A missing or non-positive request means "sell everything". The result never
/// exceeds `balance`.
pub fn submit_amount(requested: Option<f64>, balance: f64) -> f64 {
	match requested.filter(|amount| amount.is_finite() && *amount > 0.0) {
		Some(amount) => amount.min(balance),
		None => balance,
	}
}
