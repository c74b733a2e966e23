//! Subaddress matching for wallet-based currencies.
//!
//! Each payment identity maps to its own wallet subaddress, so amounts need
//! no padding: an exact match on that subaddress is the payment.

use serde::Serialize;

use super::is_excluded;
use crate::ports::{IncomingTransfer, SubaddressIndex, WalletPort};
use crate::security_code::digest_mod;
use crate::{AcceptorError, Result};

/// Number of minor indices identities are spread over.
///
/// Kept below the wallet's default lookahead of 200 addresses so every
/// derived subaddress is watched without extra wallet configuration. Wallets
/// already handing out addresses from this range depend on it staying fixed.
pub const MINOR_INDEX_RANGE: u32 = 199;

/// Derive the subaddress index for a payment identity.
///
/// The account (major index) is always 0.
pub fn subaddress_index(identity: &str) -> SubaddressIndex {
    SubaddressIndex {
        major: 0,
        minor: digest_mod(identity.as_bytes(), u64::from(MINOR_INDEX_RANGE)) as u32,
    }
}

/// Outcome of a subaddress match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubaddressMatch {
    /// Address the payer should send to.
    pub address: String,
    /// Index `address` was derived at.
    pub index: SubaddressIndex,
    /// Matching transfer, or `None` when nothing has arrived yet.
    pub txid: Option<String>,
    /// Amount of the matched transfer, or the first target.
    pub amount: u64,
}

/// Pick the first confirmed, unclaimed transfer paying exactly a target.
pub fn match_transfers<'a>(
    transfers: &'a [IncomingTransfer],
    targets: &[u64],
    excluded: &[String],
    min_height: u64,
) -> Option<&'a IncomingTransfer> {
    transfers
        .iter()
        .filter(|transfer| transfer.confirmed)
        .filter(|transfer| transfer.height.map_or(true, |height| height >= min_height))
        .filter(|transfer| !is_excluded(excluded, &transfer.txid))
        .find(|transfer| targets.contains(&transfer.amount))
}

/// Look up the identity's subaddress and scan its recent incoming transfers.
///
/// Only transfers mined within the last `block_lookback` blocks are
/// considered. The wallet height is the chain length, so that window is
/// `height - block_lookback .. height`, passed on as an inclusive lower bound.
#[cfg_attr(feature = "tracing", tracing::instrument(skip(wallet, identity, excluded)))]
pub async fn find_subaddress_payment<W>(
    wallet: &W,
    identity: &str,
    targets: &[u64],
    excluded: &[String],
    block_lookback: u64,
) -> Result<SubaddressMatch>
where
    W: WalletPort + ?Sized,
{
    if targets.is_empty() {
        return Err(AcceptorError::invalid_data(
            "amounts",
            "at least one target amount is required",
        ));
    }

    let index = subaddress_index(identity);
    let address = wallet.address_at(index).await?;
    let height = wallet.height().await?;
    let min_height = height.saturating_sub(block_lookback);
    let transfers = wallet.list_incoming(index, min_height).await?;

    let matched = match_transfers(&transfers, targets, excluded, min_height);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        minor = index.minor,
        min_height,
        scanned = transfers.len(),
        matched = ?matched.map(|t| t.txid.as_str()),
        "scanned subaddress transfers"
    );

    Ok(SubaddressMatch {
        address,
        index,
        txid: matched.map(|transfer| transfer.txid.clone()),
        amount: matched.map_or(targets[0], |transfer| transfer.amount),
    })
}
