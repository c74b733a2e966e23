//! Payment checks

use anyhow::Result;
use coinacceptor_lib::{PaymentRequest, PaymentResult};

use super::{price_samples, Context, TargetArgs};
use crate::ui;

/// Check for fixed atomic amounts.
pub async fn atomic(ctx: &Context, target: TargetArgs, amounts: Vec<u64>) -> Result<()> {
    let currency = ctx.currency(&target.currency)?;
    let request = PaymentRequest::atomic(currency, target.identity.clone(), amounts);
    execute(ctx, &target, request, false).await
}

/// Check for a fiat-priced payment.
pub async fn fiat(
    ctx: &Context,
    target: TargetArgs,
    cents: u64,
    price: Option<f64>,
    previous_price: Option<f64>,
) -> Result<()> {
    let currency = ctx.currency(&target.currency)?;
    let mut request = PaymentRequest::fiat(currency, target.identity.clone(), cents);
    if let Some(samples) = price_samples(price, previous_price)? {
        request = request.with_prices(samples);
    }
    execute(ctx, &target, request, true).await
}

async fn execute(
    ctx: &Context,
    target: &TargetArgs,
    mut request: PaymentRequest,
    fiat: bool,
) -> Result<()> {
    if let Some(address) = &target.address {
        request = request.with_address(address.clone());
    }
    if let Some(wallet) = target.wallet.connection()? {
        request = request.with_wallet(wallet);
    }
    if let Some(confirmations) = target.confirmations(&ctx.config) {
        request = request.with_confirmations(confirmations);
    }
    request = request.with_excluded(target.excluded.iter().cloned());

    let acceptor = ctx.acceptor()?;
    // Fail on bad input before the spinner starts.
    acceptor.validate(&request)?;

    let spinner = ui::spinner(&format!("Checking {} payment...", request.currency));
    let result = if fiat {
        acceptor.pay_fiat(&request).await
    } else {
        acceptor.pay(&request).await
    };
    spinner.finish_and_clear();
    let result = result?;

    tracing::info!(
        currency = %result.currency,
        amount = result.amount,
        paid = result.is_paid(),
        "payment checked"
    );

    if ctx.json {
        return ui::json(&result);
    }
    print_result(&result, target.qr)
}

fn print_result(result: &PaymentResult, qr: bool) -> Result<()> {
    ui::header("Payment");
    ui::key_value("Currency", result.currency.as_str());
    ui::key_value("Address", &result.address);
    ui::key_value(
        "Amount",
        &format!("{} ({} atomic)", result.currency.format_amount(result.amount), result.amount),
    );
    if let Some(index) = result.subaddress_index {
        ui::key_value("Subaddress", &format!("{}/{}", index.major, index.minor));
    }
    if let Some(quote) = &result.fiat {
        ui::key_value(
            "Fiat",
            &format!("{}.{:02}", quote.final_fiat_cents / 100, quote.final_fiat_cents % 100),
        );
    }
    ui::separator();

    match &result.txid {
        Some(txid) => {
            ui::success(&format!("Paid in {}", txid));
            ui::info("Record this transaction id and pass it with --exclude on later checks");
        }
        None => {
            ui::warning("Payment not received yet");
            ui::key_value("URI", &result.uri);
            if qr {
                ui::qr_code(&result.uri)?;
            }
        }
    }
    Ok(())
}
