use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::SmallRng, SeedableRng};
use std::hint::black_box;
use tile_merge_core::{is_terminal, legal_directions, resolve, spawn, Board, Direction};

fn corpus(size: usize) -> Vec<Board> {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut boards = Vec::new();
    let mut b = Board::new(size);
    spawn(&mut b, 2, &mut rng);
    boards.push(b.clone());
    // Derive a variety of densities deterministically
    let seq = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];
    for i in 0..40 {
        let res = resolve(&b, seq[i % seq.len()]);
        if res.moved {
            b = res.board;
            spawn(&mut b, 1, &mut rng);
        }
        boards.push(b.clone());
    }
    boards
}

fn bench_resolve(c: &mut Criterion) {
    for size in [4, 8] {
        let boards = corpus(size);
        for dir in Direction::all() {
            c.bench_function(&format!("resolve/{size}x{size}/{dir:?}"), |bch| {
                bch.iter(|| {
                    let mut acc = 0usize;
                    for bd in &boards {
                        acc += resolve(black_box(bd), dir).outcomes.len();
                    }
                    black_box(acc)
                })
            });
        }
    }
}

fn bench_terminal(c: &mut Criterion) {
    let boards = corpus(4);
    c.bench_function("is_terminal", |bch| {
        bch.iter(|| boards.iter().filter(|b| is_terminal(black_box(b))).count())
    });
    c.bench_function("legal_directions", |bch| {
        bch.iter(|| {
            boards
                .iter()
                .map(|b| legal_directions(black_box(b)).iter().filter(|&&l| l).count())
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, bench_resolve, bench_terminal);
criterion_main!(benches);
