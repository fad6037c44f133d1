use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use vezir::board::{Board, START_FEN};
use vezir::perft::perft;

#[derive(Clone, Copy)]
struct BenchCase {
    name: &'static str,
    fen: &'static str,
    expected_nodes: &'static [u64],
}

const CASES: &[BenchCase] = &[
    BenchCase {
        name: "startpos",
        fen: START_FEN,
        expected_nodes: &[20, 400, 8902, 197_281, 4_865_609],
    },
    BenchCase {
        name: "kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        expected_nodes: &[48, 2039, 97_862],
    },
    BenchCase {
        name: "position_4",
        fen: "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        expected_nodes: &[6, 264, 9467, 422_333],
    },
    BenchCase {
        name: "position_5",
        fen: "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        expected_nodes: &[44, 1486, 62_379, 2_103_487],
    },
];

fn perft_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.measurement_time(Duration::from_secs(10));

    for case in CASES {
        let mut board = Board::new();
        board.from_fen(case.fen).expect("benchmark FEN must parse");

        // Every benchmark case is also a correctness gate: wrong node
        // counts make the throughput numbers meaningless.
        for (i, &expected) in case.expected_nodes.iter().enumerate() {
            let depth = (i + 1) as u32;
            let nodes = perft(&mut board, depth);
            assert_eq!(nodes, expected, "{} at depth {depth}", case.name);
        }

        let depth = case.expected_nodes.len() as u32;
        let nodes = *case.expected_nodes.last().unwrap();
        group.throughput(Throughput::Elements(nodes));
        group.bench_with_input(BenchmarkId::new(case.name, depth), &depth, |b, &depth| {
            b.iter(|| perft(black_box(&mut board), black_box(depth)))
        });
    }
    group.finish();
}

criterion_group!(benches, perft_benchmark);
criterion_main!(benches);
