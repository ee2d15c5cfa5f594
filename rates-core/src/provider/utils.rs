// provider/utils.rs
// Helpers shared by price provider clients

use super::ProviderError;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Validate a symbol before it is put on the wire.
///
/// Symbols are sent as a comma-separated list, so a comma or whitespace inside
/// one would silently split it into several.
pub fn validate_symbol(symbol: &str) -> Result<(), ProviderError> {
    if symbol.is_empty() {
        return Err(ProviderError::InvalidParameter(
            "Symbol cannot be empty".to_string(),
        ));
    }

    if symbol.chars().any(|c| c == ',' || c.is_whitespace()) {
        return Err(ProviderError::InvalidParameter(format!(
            "Symbol '{}' contains invalid characters",
            symbol
        )));
    }

    Ok(())
}

/// Validate every symbol and join them for a multi-symbol query
pub fn join_symbols(symbols: &[String]) -> Result<String, ProviderError> {
    for symbol in symbols {
        validate_symbol(symbol)?;
    }
    Ok(symbols.join(","))
}

/// Convert a JSON price to Decimal
pub fn parse_price(value: f64) -> Result<Decimal, ProviderError> {
    Decimal::from_f64(value)
        .ok_or_else(|| ProviderError::ParseError(format!("Invalid price '{}'", value)))
}
