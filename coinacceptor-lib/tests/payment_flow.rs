//! End-to-end payment checks through `PaymentAcceptor` with in-memory
//! collaborators.
//!
//! ```bash
//! cargo test -p coinacceptor-lib --features test-utils --test payment_flow
//! ```

#![cfg(feature = "test-utils")]

use std::sync::Arc;

use coinacceptor_lib::matcher::subaddress_index;
use coinacceptor_lib::prelude::*;
use coinacceptor_lib::test_utils::{
    FixedPriceFeed, MockUnspentSource, MockWallet, MockWalletConnector, TestFixtures,
};

fn acceptor_with(
    unspents: Arc<MockUnspentSource>,
    wallet: MockWallet,
    prices: FixedPriceFeed,
) -> PaymentAcceptor {
    PaymentAcceptor::new(AcceptorConfig::default())
        .unwrap()
        .with_unspent_source(Currency::Btc, unspents.clone())
        .with_unspent_source(Currency::Bch, unspents)
        .with_wallet_connector(Arc::new(MockWalletConnector::new(wallet)))
        .with_price_feed(Arc::new(prices))
}

// ============================================================================
// Shared address, security code padding
// ============================================================================

#[tokio::test]
async fn test_btc_payment_lifecycle() {
    let unspents = Arc::new(MockUnspentSource::new());
    let acceptor = acceptor_with(unspents.clone(), MockWallet::new(0), FixedPriceFeed::new());
    let request = PaymentRequest::atomic(Currency::Btc, TestFixtures::IDENTITY, [10_000])
        .with_address(TestFixtures::BTC_ADDRESS);

    // Nothing sent yet: ask for the padded amount.
    let pending = acceptor.pay(&request).await.unwrap();
    assert!(!pending.is_paid());
    assert_eq!(pending.amount, 10_721);
    assert_eq!(
        pending.uri,
        "bitcoin:16jCrzcXo2PxadrQiQwUgwrmEwDGQYBwZq?amount=0.00010721"
    );

    // Someone else's payment of the unpadded amount does not count.
    unspents.add(
        TestFixtures::BTC_ADDRESS,
        CandidateTransaction::new("stranger", 10_000, 1),
    );
    assert!(!acceptor.pay(&request).await.unwrap().is_paid());

    // The padded payment arrives in the mempool.
    unspents.add(
        TestFixtures::BTC_ADDRESS,
        CandidateTransaction::new("ours", 10_721, 0),
    );
    let paid = acceptor.pay(&request).await.unwrap();
    assert_eq!(paid.txid.as_deref(), Some("ours"));
    assert_eq!(paid.amount, 10_721);

    // Once claimed, a retry with the exclusion list reports it as missing again.
    let retry = request.clone().with_excluded(["ours"]);
    assert!(!acceptor.pay(&retry).await.unwrap().is_paid());
}

#[tokio::test]
async fn test_fiat_payment_with_price_window() {
    let unspents = Arc::new(MockUnspentSource::new());
    let acceptor = acceptor_with(unspents.clone(), MockWallet::new(0), FixedPriceFeed::new());

    // $1.00 at 10000 and 10001 USD/BTC: both amounts floor to 10000 sats.
    let request = PaymentRequest::fiat(Currency::Btc, TestFixtures::IDENTITY, 100)
        .with_address(TestFixtures::BTC_ADDRESS)
        .with_prices(PriceSamples::new(10_000.0, 10_001.0));

    let result = acceptor.pay_fiat(&request).await.unwrap();
    assert_eq!(result.amount, 10_721);
    assert_eq!(result.txid, None);
    let quote = result.fiat.as_ref().unwrap();
    assert!(quote.floored);
    assert_eq!(quote.targets, vec![10_000]);

    unspents.add(
        TestFixtures::BTC_ADDRESS,
        CandidateTransaction::new("fiat-tx", 10_721, 3),
    );
    let result = acceptor.pay_fiat(&request).await.unwrap();
    assert_eq!(result.txid.as_deref(), Some("fiat-tx"));
}

#[tokio::test]
async fn test_bch_cashaddr_uri() {
    let unspents = Arc::new(MockUnspentSource::new());
    let acceptor = acceptor_with(unspents, MockWallet::new(0), FixedPriceFeed::new());
    let request = PaymentRequest::atomic(Currency::Bch, TestFixtures::IDENTITY, [50_000])
        .with_address(TestFixtures::BCH_ADDRESS);

    let result = acceptor.pay(&request).await.unwrap();
    assert_eq!(
        result.uri,
        "bitcoincash:qpm2qsznhks23z7629mms6s4cwef74vcwvy22gdx6a?amount=0.00050721"
    );
    let parsed = parse_payment_uri(&result.uri).unwrap();
    assert_eq!(parsed.currency, Currency::Bch);
    assert_eq!(parsed.amount, Some(50_721));
}

// ============================================================================
// Derived subaddress
// ============================================================================

#[tokio::test]
async fn test_xmr_fiat_payment_on_subaddress() {
    let wallet = MockWallet::new(3_000_000);
    let index = subaddress_index(TestFixtures::IDENTITY);
    assert_eq!(index, SubaddressIndex { major: 0, minor: 79 });

    // $25.00 at 250 USD/XMR is 0.1 XMR.
    let prices = FixedPriceFeed::new().with_price(Currency::Xmr, PriceSamples::single(250.0));
    let acceptor = acceptor_with(Arc::new(MockUnspentSource::new()), wallet.clone(), prices);
    let request = PaymentRequest::fiat(Currency::Xmr, TestFixtures::IDENTITY, 2_500)
        .with_wallet(TestFixtures::onion_wallet_connection());

    let pending = acceptor.pay_fiat(&request).await.unwrap();
    assert_eq!(pending.txid, None);
    assert_eq!(pending.amount, 100_000_000_000);
    assert_eq!(pending.address, MockWallet::address_for(index));
    assert_eq!(wallet.last_min_height(), Some(3_000_000 - 720));

    wallet.add_transfer(
        index,
        IncomingTransfer::confirmed("xmr-tx", 100_000_000_000, 2_999_990),
    );
    let paid = acceptor.pay_fiat(&request).await.unwrap();
    assert_eq!(paid.txid.as_deref(), Some("xmr-tx"));
    assert_eq!(paid.subaddress_index, Some(index));
}

#[tokio::test]
async fn test_xmr_ignores_pending_and_old_transfers() {
    let wallet = MockWallet::new(10_000);
    let index = subaddress_index(TestFixtures::IDENTITY);
    wallet.add_transfer(index, IncomingTransfer::pending("mempool", 1_000));
    wallet.add_transfer(index, IncomingTransfer::confirmed("ancient", 1_000, 100));

    let acceptor = acceptor_with(Arc::new(MockUnspentSource::new()), wallet, FixedPriceFeed::new());
    let request = PaymentRequest::atomic(Currency::Xmr, TestFixtures::IDENTITY, [1_000])
        .with_wallet(TestFixtures::wallet_connection());

    let result = acceptor.pay(&request).await.unwrap();
    assert!(!result.is_paid());
    assert_eq!(result.amount, 1_000);
}

// ============================================================================
// Result serialization
// ============================================================================

#[tokio::test]
async fn test_result_serializes_to_json() {
    let unspents = Arc::new(MockUnspentSource::new());
    let acceptor = acceptor_with(unspents, MockWallet::new(0), FixedPriceFeed::new());
    let request = PaymentRequest::atomic(Currency::Btc, TestFixtures::IDENTITY, [10_000])
        .with_address(TestFixtures::BTC_ADDRESS);

    let result = acceptor.pay(&request).await.unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["currency"], "btc");
    assert_eq!(json["amount"], 10_721);
    assert!(json["txid"].is_null());
}
