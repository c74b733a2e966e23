//! Payment URI decoding

use anyhow::Result;
use coinacceptor_lib::parse_payment_uri;

use super::Context;
use crate::ui;

pub fn run(ctx: &Context, uri: &str, qr: bool) -> Result<()> {
    let parsed = parse_payment_uri(uri)?;

    if ctx.json {
        return ui::json(&parsed);
    }

    ui::header("Payment URI");
    ui::key_value("Currency", parsed.currency.as_str());
    ui::key_value("Address", &parsed.address);
    match parsed.amount {
        Some(amount) => ui::key_value(
            "Amount",
            &format!("{} ({} atomic)", parsed.currency.format_amount(amount), amount),
        ),
        None => ui::key_value("Amount", "any"),
    }

    if qr {
        ui::qr_code(uri.trim())?;
    }
    Ok(())
}
