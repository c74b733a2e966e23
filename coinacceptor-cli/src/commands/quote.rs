//! Fiat price quotes

use anyhow::Result;
use coinacceptor_lib::ports::PriceFeed;
use coinacceptor_lib::pricing::windowed_amounts;

use super::{price_samples, Context};
use crate::ui;

pub async fn run(
    ctx: &Context,
    cents: u64,
    currency: &str,
    price: Option<f64>,
    previous_price: Option<f64>,
) -> Result<()> {
    let currency = ctx.currency(currency)?;
    let samples = match price_samples(price, previous_price)? {
        Some(samples) => samples,
        None => {
            let spinner = ui::spinner(&format!("Fetching {} price...", currency));
            let fetched = ctx.price_feed()?.price_samples(currency).await;
            spinner.finish_and_clear();
            fetched?
        }
    };

    let window = windowed_amounts(cents, samples, currency)?;
    let targets = window.targets();

    if ctx.json {
        return ui::json(&serde_json::json!({
            "currency": currency,
            "cents": cents,
            "prices": samples,
            "window": window,
            "targets": targets,
        }));
    }

    ui::header(&format!("Quote: {}.{:02} {}", cents / 100, cents % 100, ctx.backends.fiat.to_uppercase()));
    ui::key_value("Currency", currency.as_str());
    ui::key_value("Current price", &samples.current.to_string());
    ui::key_value("Previous price", &samples.previous.to_string());
    ui::key_value("At current price", &currency.format_amount(window.first));
    ui::key_value("At previous price", &currency.format_amount(window.second));
    ui::separator();
    for target in &targets {
        ui::key_value("Accepts", &format!("{} ({} atomic)", currency.format_amount(*target), target));
    }
    if window.floored {
        ui::warning(&format!(
            "Raised to the network minimum; the payer is charged {}.{:02}",
            window.final_fiat_cents / 100,
            window.final_fiat_cents % 100
        ));
    }
    Ok(())
}
