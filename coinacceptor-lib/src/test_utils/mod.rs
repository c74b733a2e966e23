//! Test utilities.
//!
//! In-memory implementations of every collaborator trait, plus shared
//! fixtures. Each mock counts its calls so tests can check that input
//! validation happens before any I/O.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coinacceptor_lib::test_utils::{MockUnspentSource, TestFixtures};
//! use coinacceptor_lib::ports::CandidateTransaction;
//!
//! let source = MockUnspentSource::new();
//! source.add(TestFixtures::BTC_ADDRESS, CandidateTransaction::new("txid", 10_721, 0));
//! ```

mod fixtures;
mod mocks;

pub use fixtures::TestFixtures;
pub use mocks::{FixedPriceFeed, MockUnspentSource, MockWallet, MockWalletConnector};
