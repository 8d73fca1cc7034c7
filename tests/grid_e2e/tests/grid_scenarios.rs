// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! CONTEXT: Whole-grid scenarios through the launcher and the host dispatcher
//! INTENT: Log fan-in, log splitting, image updates, fatal dispatch errors
//! DEPS: grid-runtime, grid-rpc
//! READINESS: Emulated and polled backends
//! TESTS: hi on 2x2, long text reassembly, image counters, missing handler, barrier + log mix

use std::sync::Arc;

use grid_abi::layout::LOG_BUFFER_LEN;
use grid_abi::TileCoord;
use grid_e2e::{grid, printing_registry, recording_registry};
use grid_rpc::{HandlerRegistry, ImageUpdateData, RequestKind, RpcError, TileView};
use grid_runtime::{Backend, Emulated, Polled, RuntimeError, Tile};
use parking_lot::Mutex;
use proptest::prelude::*;

fn hi_on_two_by_two<B: Backend>() {
    let (registry, sink) = printing_registry();
    let report = grid::<B>(2, 2).run_fn(|tile: &mut Tile<'_, B>| tile.log("hi"), registry).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.stats.done, 4);
    assert_eq!(report.stats.handled, 4);
    assert_eq!(sink.text(), "hihihihi");
    assert_eq!(sink.bytes().len(), 8);
}

#[test]
fn hi_is_printed_once_per_tile() {
    hi_on_two_by_two::<Emulated>();
    hi_on_two_by_two::<Polled>();
}

#[test]
fn long_text_is_reassembled_per_tile() {
    let (registry, entries) = recording_registry();
    let text: String = "0123456789abcdef".repeat(LOG_BUFFER_LEN / 16 * 2 + 3);
    let expected = text.clone().into_bytes();
    let report = grid::<Emulated>(3, 1)
        .run_fn(move |tile: &mut Tile<'_, Emulated>| tile.log(&text), registry)
        .unwrap();
    assert!(report.is_clean());
    let entries = entries.lock();
    for x in 0..3 {
        let chunks: Vec<_> = entries.iter().filter(|entry| entry.coord.x == x).collect();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|entry| entry.text.len() <= LOG_BUFFER_LEN));
        let joined: Vec<u8> = chunks.iter().flat_map(|entry| entry.text.iter().copied()).collect();
        assert_eq!(joined, expected);
    }
}

#[test]
fn image_counters_arrive_in_order() {
    let seen: Arc<Mutex<Vec<(TileCoord, u32)>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let mut registry = HandlerRegistry::new();
    registry
        .on_image_update(move |tile: &TileView<'_>, data: ImageUpdateData| {
            sink.lock().push((tile.coord(), data.counter));
            data.counter * 2
        })
        .unwrap();
    let report = grid::<Polled>(2, 2)
        .run_fn(
            |tile: &mut Tile<'_, Polled>| {
                for counter in 0..5 {
                    let data = ImageUpdateData { addr: 0, counter, min_value: 1, max_value: 9 };
                    if tile.image_update(data)? != counter * 2 {
                        return Err(RuntimeError::Program("wrong image response".into()));
                    }
                }
                Ok(())
            },
            registry,
        )
        .unwrap();
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.stats.handled, 20);
    let seen = seen.lock();
    for coord in [(0, 0), (1, 0), (0, 1), (1, 1)].map(|(x, y)| TileCoord::new(x, y)) {
        let counters: Vec<u32> =
            seen.iter().filter(|(c, _)| *c == coord).map(|(_, counter)| *counter).collect();
        assert_eq!(counters, vec![0, 1, 2, 3, 4]);
    }
}

#[test]
fn missing_handler_aborts_the_run() {
    let err = grid::<Emulated>(2, 1)
        .run_fn(
            |tile: &mut Tile<'_, Emulated>| {
                tile.image_update(ImageUpdateData { addr: 0, counter: 0, min_value: 0, max_value: 0 })?;
                Ok(())
            },
            HandlerRegistry::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Rpc(RpcError::MissingHandler { kind: RequestKind::ImageUpdate, .. })
    ));
}

#[test]
fn logs_between_barriers_stay_in_rounds() {
    let (registry, entries) = recording_registry();
    let geometry = grid::<Emulated>(3, 2);
    let report = geometry
        .run_fn(
            |tile: &mut Tile<'_, Emulated>| {
                for round in 0..3 {
                    tile.log(&round.to_string())?;
                    tile.barrier()?;
                }
                Ok(())
            },
            registry,
        )
        .unwrap();
    assert!(report.is_clean());
    assert!(geometry.is_idle());
    let rounds: Vec<u8> = entries.lock().iter().map(|entry| entry.text[0]).collect();
    assert_eq!(rounds.len(), 18);
    // No tile logs round n + 1 before every tile logged round n.
    let mut sorted = rounds.clone();
    sorted.sort_unstable();
    assert_eq!(rounds, sorted);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn every_log_is_served_once(width in 1u32..4, height in 1u32..4, lines in 0usize..4) {
        let (registry, entries) = recording_registry();
        let report = grid::<Emulated>(width, height)
            .run_fn(
                move |tile: &mut Tile<'_, Emulated>| {
                    for line in 0..lines {
                        tile.log(&format!("{line}"))?;
                    }
                    Ok(())
                },
                registry,
            )
            .unwrap();
        let tiles = (width * height) as usize;
        prop_assert_eq!(report.stats.done, tiles);
        prop_assert_eq!(report.stats.handled as usize, tiles * lines);
        prop_assert_eq!(entries.lock().len(), tiles * lines);
    }
}
