//! Security code derivation

use anyhow::Result;
use coinacceptor_lib::security_code;

use super::Context;
use crate::ui;

pub fn run(ctx: &Context, identity: Option<String>, epoch: i64, modulus: Option<u64>) -> Result<()> {
    let generated = identity.is_none();
    let identity = identity.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let modulus = modulus.unwrap_or(ctx.config.security_modulus);
    let code = security_code::derive(&identity, epoch, modulus)?;

    if ctx.json {
        return ui::json(&serde_json::json!({
            "identity": identity,
            "epoch": epoch,
            "modulus": modulus,
            "code": code,
        }));
    }

    ui::header("Security Code");
    ui::key_value("Identity", &identity);
    ui::key_value("Epoch", &epoch.to_string());
    ui::key_value("Modulus", &modulus.to_string());
    ui::key_value("Code", &code.to_string());
    if generated {
        ui::info("Generated a new identity; store it with the order to check payment later");
    }
    Ok(())
}
