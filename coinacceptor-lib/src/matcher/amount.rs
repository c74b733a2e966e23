//! Shared-address matching by padded amount.

use serde::Serialize;

use super::{is_excluded, ConfirmationRange};
use crate::ports::CandidateTransaction;
use crate::security_code;
use crate::{AcceptorError, Result};

/// Parameters for one amount match.
#[derive(Clone, Debug)]
pub struct AmountQuery<'a> {
    /// Payment identity the security code is derived from.
    pub identity: &'a str,
    /// Unpadded amounts to try, in priority order.
    pub targets: &'a [u64],
    /// Accepted confirmation counts.
    pub confirmations: ConfirmationRange,
    /// Transaction ids already claimed by the caller.
    pub excluded: &'a [String],
    /// Security code modulus.
    pub security_modulus: u64,
}

/// Outcome of an amount match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AmountMatch {
    /// Matching transaction, or `None` when nothing has arrived yet.
    pub txid: Option<String>,
    /// Amount of the matched output, or the amount the payer should send.
    pub amount: u64,
}

/// Pad each target with the identity's security code (epoch 0).
pub fn expected_amounts(targets: &[u64], identity: &str, modulus: u64) -> Result<Vec<u64>> {
    let code = security_code::derive(identity, 0, modulus)?;
    targets
        .iter()
        .map(|target| {
            target.checked_add(code).ok_or_else(|| {
                AcceptorError::invalid_data("amount", format!("{} overflows with padding", target))
            })
        })
        .collect()
}

/// Find the first candidate paying any padded target.
///
/// Candidates are scanned in the order given. Those outside the confirmation
/// window are skipped rather than ending the scan, so the list does not need
/// to be sorted. Targets are tried in the order given for each candidate.
///
/// When nothing matches, the result carries the first target plus the
/// security code: the amount the payer should be asked for.
pub fn find_payment(
    candidates: &[CandidateTransaction],
    query: &AmountQuery<'_>,
) -> Result<AmountMatch> {
    if query.targets.is_empty() {
        return Err(AcceptorError::invalid_data(
            "amounts",
            "at least one target amount is required",
        ));
    }
    query.confirmations.validate()?;

    let expected = expected_amounts(query.targets, query.identity, query.security_modulus)?;

    let matched = candidates
        .iter()
        .filter(|candidate| query.confirmations.contains(candidate.confirmations))
        .filter(|candidate| !is_excluded(query.excluded, &candidate.txid))
        .find(|candidate| expected.contains(&candidate.amount));

    Ok(match matched {
        Some(candidate) => AmountMatch {
            txid: Some(candidate.txid.clone()),
            amount: candidate.amount,
        },
        None => AmountMatch {
            txid: None,
            amount: expected[0],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: &str = "cab41de5-ad64-446d-9ab4-6dc794162bfc";

    fn query<'a>(targets: &'a [u64], excluded: &'a [String], max: u64) -> AmountQuery<'a> {
        AmountQuery {
            identity: IDENTITY,
            targets,
            confirmations: ConfirmationRange::new(0, max),
            excluded,
            security_modulus: 1000,
        }
    }

    #[test]
    fn test_expected_amount() {
        assert_eq!(expected_amounts(&[10_000], IDENTITY, 1000).unwrap(), vec![10_721]);
    }

    #[test]
    fn test_match_unconfirmed() {
        let candidates = vec![CandidateTransaction::new("txid", 10_721, 0)];
        let result = find_payment(&candidates, &query(&[10_000], &[], 6)).unwrap();
        assert_eq!(result.txid.as_deref(), Some("txid"));
        assert_eq!(result.amount, 10_721);
    }

    #[test]
    fn test_confirmation_boundary() {
        let at_max = vec![CandidateTransaction::new("txid", 10_721, 6)];
        let result = find_payment(&at_max, &query(&[10_000], &[], 6)).unwrap();
        assert_eq!(result.txid.as_deref(), Some("txid"));

        let above_max = vec![CandidateTransaction::new("txid", 10_721, 7)];
        let result = find_payment(&above_max, &query(&[10_000], &[], 6)).unwrap();
        assert_eq!(result.txid, None);
        assert_eq!(result.amount, 10_721);
    }

    #[test]
    fn test_below_min_confirmations_skipped() {
        let candidates = vec![CandidateTransaction::new("txid", 10_721, 0)];
        let mut q = query(&[10_000], &[], 6);
        q.confirmations = ConfirmationRange::new(1, 6);
        assert_eq!(find_payment(&candidates, &q).unwrap().txid, None);
    }

    #[test]
    fn test_unsorted_candidates_tolerated() {
        // An old output first must not end the scan.
        let candidates = vec![
            CandidateTransaction::new("old", 50_000, 120),
            CandidateTransaction::new("other", 10_000, 2),
            CandidateTransaction::new("ours", 10_721, 3),
        ];
        let result = find_payment(&candidates, &query(&[10_000], &[], 6)).unwrap();
        assert_eq!(result.txid.as_deref(), Some("ours"));
    }

    #[test]
    fn test_excluded_never_returned() {
        let candidates = vec![
            CandidateTransaction::new("claimed", 10_721, 1),
            CandidateTransaction::new("fresh", 10_721, 2),
        ];
        let excluded = vec!["claimed".to_string()];
        let result = find_payment(&candidates, &query(&[10_000], &excluded, 6)).unwrap();
        assert_eq!(result.txid.as_deref(), Some("fresh"));

        let excluded = vec!["claimed".to_string(), "fresh".to_string()];
        let result = find_payment(&candidates, &query(&[10_000], &excluded, 6)).unwrap();
        assert_eq!(result.txid, None);
    }

    #[test]
    fn test_second_target_matches() {
        let candidates = vec![CandidateTransaction::new("late", 9_721, 1)];
        let result = find_payment(&candidates, &query(&[10_000, 9_000], &[], 6)).unwrap();
        assert_eq!(result.txid.as_deref(), Some("late"));
        assert_eq!(result.amount, 9_721);
    }

    #[test]
    fn test_candidate_order_wins_over_target_order() {
        let candidates = vec![
            CandidateTransaction::new("second-target", 9_721, 1),
            CandidateTransaction::new("first-target", 10_721, 1),
        ];
        let result = find_payment(&candidates, &query(&[10_000, 9_000], &[], 6)).unwrap();
        assert_eq!(result.txid.as_deref(), Some("second-target"));
    }

    #[test]
    fn test_empty_candidates_fall_back_to_first_target() {
        let result = find_payment(&[], &query(&[10_000, 9_000], &[], 6)).unwrap();
        assert_eq!(result.txid, None);
        assert_eq!(result.amount, 10_721);
    }

    #[test]
    fn test_invalid_queries() {
        assert!(find_payment(&[], &query(&[], &[], 6)).is_err());

        let mut q = query(&[10_000], &[], 6);
        q.confirmations = ConfirmationRange::new(5, 1);
        assert!(find_payment(&[], &q).is_err());

        let mut q = query(&[10_000], &[], 6);
        q.security_modulus = 0;
        assert!(find_payment(&[], &q).is_err());

        assert!(find_payment(&[], &query(&[u64::MAX], &[], 6)).is_err());
    }
}
