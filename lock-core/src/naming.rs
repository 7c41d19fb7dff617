//! Receipt-asset naming
//!
//! Pure helpers deriving a unique human-readable name/symbol per position
//! from the position count and the locked asset's own name/symbol.

/// Canonical decimal representation of `n`: no leading zeros, `"0"` for
/// zero, no sign character. Total over all of `u128`.
pub fn decimal_string(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = [0u8; 39]; // u128::MAX has 39 decimal digits
    let mut len = 0;
    while n > 0 {
        digits[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
    }
    digits[..len].reverse();

    // Digits are ASCII by construction
    String::from_utf8_lossy(&digits[..len]).into_owned()
}

/// Receipt-asset name for position `index` locking `asset_name`
pub fn receipt_name(template: &str, asset_name: &str, index: u64) -> String {
    format!("{} {} {}", asset_name, template, decimal_string(index as u128))
}

/// Receipt-asset symbol for position `index` locking `asset_symbol`
pub fn receipt_symbol(prefix: &str, asset_symbol: &str, index: u64) -> String {
    format!("{}-{}{}", asset_symbol, prefix, decimal_string(index as u128))
}
