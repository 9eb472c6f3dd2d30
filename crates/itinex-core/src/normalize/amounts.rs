//! Currency/amount token splitting.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use super::patterns::CURRENCY_AMOUNT;

/// Split a `<3-letter code><amount>` token into its currency code and
/// decimal amount.
///
/// Whitespace between code and amount is optional; commas are treated as
/// thousands separators. A token that does not look like a currency amount
/// yields `(None, None)`. A token whose code matches but whose numeric part
/// cannot be parsed yields `(Some(code), None)`; this never fails.
pub fn split_currency_amount(token: &str) -> (Option<String>, Option<Decimal>) {
    let Some(caps) = CURRENCY_AMOUNT.captures(token) else {
        return (None, None);
    };

    let code = caps[1].to_string();
    let cleaned = caps[2].replace(',', "");

    match Decimal::from_str(&cleaned) {
        Ok(amount) => (Some(code), Some(amount)),
        Err(_) => {
            debug!(token, "currency code matched but amount was malformed");
            (Some(code), None)
        }
    }
}
