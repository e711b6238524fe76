use anyhow::{anyhow, Result};

// Offer price after applying the advertised margin (in percent) to the market price
pub fn price_with_margin(market_price: f64, margin_percent: f64) -> f64 {
    market_price * (1.0 + margin_percent / 100.0)
}

// Crypto received for a fiat amount at a given trade price
pub fn crypto_for_fiat(amount_fiat: f64, trade_price: f64) -> Result<f64> {
    if trade_price <= 0.0 {
        return Err(anyhow!("Trade price must be greater than zero"));
    }
    if amount_fiat < 0.0 {
        return Err(anyhow!("Amount must not be negative"));
    }
    Ok(amount_fiat / trade_price)
}

// Format crypto amount with appropriate precision
pub fn format_crypto(amount: f64, symbol: &str) -> String {
    match symbol.to_uppercase().as_str() {
        "BTC" => format!("{:.8} BTC", amount),
        "ETH" => format!("{:.6} ETH", amount),
        "USDT" | "USDC" => format!("{:.2} {}", amount, symbol.to_uppercase()),
        _ => format!("{:.6} {}", amount, symbol.to_uppercase()),
    }
}

pub fn format_fiat(amount: f64, currency: &str) -> String {
    format!("{:.2} {}", amount, currency.to_uppercase())
}

pub fn format_margin(margin_percent: f64) -> String {
    format!("{:+.2}%", margin_percent)
}
