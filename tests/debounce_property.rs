//! Property test: any burst of qualifying events restarts exactly once,
//! one debounce period after the last event.

mod common;

use common::{EXE, FakeProcess, FakeSource, change};
use hotswap_exec::Reloader;
use hotswap_exec::core::DEBOUNCE;
use hotswap_exec::watch::ChangeKind;
use proptest::prelude::*;
use std::time::Duration;
use tokio::time::{Instant, sleep};

fn burst_fires_once(gaps_ms: Vec<u64>, kinds: Vec<bool>) -> Result<(), TestCaseError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();

    rt.block_on(async move {
        let (source, tx, rx) = FakeSource::new();
        let process = FakeProcess::new();
        let _handle = Reloader::builder()
            .log(|_| {})
            .with_source(source, rx)
            .with_process(process.clone())
            .spawn()
            .unwrap();

        let mut last = Instant::now();
        for (gap, write) in gaps_ms.iter().zip(kinds.iter().cycle()) {
            let kind = if *write { ChangeKind::Write } else { ChangeKind::Create };
            last = Instant::now();
            tx.send(change(EXE, kind)).unwrap();
            sleep(Duration::from_millis(*gap)).await;
        }
        sleep(Duration::from_secs(1)).await;

        let execs = process.execs();
        prop_assert_eq!(execs.len(), 1);
        let delay = execs[0].0 - last;
        prop_assert!(delay >= DEBOUNCE && delay < DEBOUNCE + Duration::from_millis(2), "{:?}", delay);
        Ok(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_burst_restarts_once(
        gaps_ms in prop::collection::vec(0u64..100, 1..20),
        kinds in prop::collection::vec(any::<bool>(), 1..4),
    ) {
        burst_fires_once(gaps_ms, kinds)?;
    }
}
