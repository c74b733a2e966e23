//! Shared test fixtures.

use crate::ports::WalletConnection;

/// Collection of commonly used test values.
pub struct TestFixtures;

impl TestFixtures {
    /// Reference payment identity. Its security code is 721 at modulus 1000
    /// and its subaddress minor index is 79.
    pub const IDENTITY: &'static str = "cab41de5-ad64-446d-9ab4-6dc794162bfc";

    /// Mainnet legacy address.
    pub const BTC_ADDRESS: &'static str = "16jCrzcXo2PxadrQiQwUgwrmEwDGQYBwZq";

    /// Cashaddr with its scheme prefix, as Bitcoin Cash wallets print it.
    pub const BCH_ADDRESS: &'static str =
        "bitcoincash:qpm2qsznhks23z7629mms6s4cwef74vcwvy22gdx6a";

    /// Local wallet RPC connection.
    pub fn wallet_connection() -> WalletConnection {
        WalletConnection::new("127.0.0.1", 18082, "monero", "password")
    }

    /// Wallet RPC connection reached over Tor.
    pub fn onion_wallet_connection() -> WalletConnection {
        WalletConnection::new(
            "vww6ybal4bd7szmgncyruucpgfkqahzddi37ktceo3ah7ngmcopnpyyd.onion",
            18082,
            "monero",
            "password",
        )
    }
}
