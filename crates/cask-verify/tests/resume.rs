use cask_verify::{Algorithm, HashState, Hasher, VerificationError};
use proptest::prelude::*;

fn two_pass(algorithm: Algorithm, data: &[u8], split: usize) -> Vec<u8> {
    let mut head = HashState::new(algorithm);
    head.update(&data[..split]);
    let snapshot = head.snapshot();
    drop(head);

    let mut tail = HashState::restore(algorithm, &snapshot).unwrap();
    assert_eq!(tail.len(), split as u64);
    tail.update(&data[split..]);
    tail.finalize()
}

proptest! {
    #[test]
    fn sha256_resume_matches_single_pass(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        split in any::<prop::sample::Index>(),
    ) {
        let split = split.index(data.len() + 1);
        prop_assert_eq!(two_pass(Algorithm::Sha256, &data, split), Algorithm::Sha256.digest(&data));
    }

    #[test]
    fn sha512_resume_matches_single_pass(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        split in any::<prop::sample::Index>(),
    ) {
        let split = split.index(data.len() + 1);
        prop_assert_eq!(two_pass(Algorithm::Sha512, &data, split), Algorithm::Sha512.digest(&data));
    }

    #[test]
    fn snapshot_is_stable_across_restore(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut state = HashState::new(Algorithm::Sha256);
        state.update(&data);
        let snapshot = state.snapshot();
        let restored = HashState::restore(Algorithm::Sha256, &snapshot).unwrap();
        prop_assert_eq!(restored.snapshot(), snapshot);
    }
}

#[test]
fn test_every_split_of_small_input() {
    let data: Vec<u8> = (0..=255u8).cycle().take(300).collect();
    for split in 0..=data.len() {
        assert_eq!(two_pass(Algorithm::Sha256, &data, split), Algorithm::Sha256.digest(&data));
    }
}

#[test]
fn test_truncated_snapshot_is_rejected() {
    let snapshot = HashState::new(Algorithm::Sha256).snapshot();
    let result = HashState::restore(Algorithm::Sha256, &snapshot[..snapshot.len() - 1]);
    assert!(matches!(result, Err(VerificationError::InvalidState(_))));
}

#[test]
fn test_known_snapshot_of_empty_state() {
    let snapshot = HashState::new(Algorithm::Sha256).snapshot();
    assert_eq!(&snapshot[..4], b"sha\x03");
    assert_eq!(
        hex::encode(&snapshot[4..36]),
        "6a09e667bb67ae853c6ef372a54ff53a510e527f9b05688c1f83d9ab5be0cd19"
    );
    assert!(snapshot[36..].iter().all(|b| *b == 0));
}
