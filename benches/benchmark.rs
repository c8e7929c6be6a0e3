// Benchmarks for the rarity and completion engines
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use scapes_core::{Attribute, Catalogue, Completer, Item, SimilarityMatrix, Token, DATE_TRAIT};

const TRAITS: [(&str, usize); 6] = [
    ("Sky", 12),
    ("Ground", 9),
    ("Moon", 4),
    ("Birds", 6),
    ("Buildings", 15),
    ("Weather", 5),
];

fn generate_catalogue(size: u32) -> Catalogue {
    let mut rng = StdRng::seed_from_u64(42);
    let items = (1..=size)
        .map(|id| {
            let mut attributes = Vec::new();
            for (name, variants) in TRAITS {
                if rng.random_bool(0.7) {
                    let variant = rng.random_range(0..variants);
                    attributes.push(Attribute::new(name, format!("{} {}", name, variant)));
                }
            }
            attributes.push(Attribute::new(DATE_TRAIT, 1_630_000_000 + i64::from(id) * 600));
            Item::new(id, attributes)
        })
        .collect();
    Catalogue::from_items(items).unwrap()
}

fn generate_similarity(size: usize) -> SimilarityMatrix {
    let mut rng = StdRng::seed_from_u64(7);
    let data: Vec<u8> = (0..size * size * 3).map(|_| rng.random_range(0..=80)).collect();
    SimilarityMatrix::new(size, data).unwrap()
}

fn benchmark_rarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("rarity");

    for size in [1_000u32, 10_000].iter() {
        let catalogue = generate_catalogue(*size);
        group.bench_with_input(BenchmarkId::new("compute", size), size, |b, _| {
            b.iter(|| {
                let mut catalogue = catalogue.clone();
                black_box(catalogue.compute_rarity().unwrap());
            });
        });
    }

    group.finish();
}

fn benchmark_completion(c: &mut Criterion) {
    let mut group = c.benchmark_group("completion");
    let size = 500;
    let similarity = generate_similarity(size);
    let completer = Completer::new(&similarity);

    for wildcards in [1usize, 8, 32].iter() {
        let mut tokens = vec![Token::explicit(1)];
        tokens.extend(std::iter::repeat(Token::Wildcard).take(*wildcards));
        tokens.push(Token::explicit(2));

        group.bench_with_input(BenchmarkId::new("wildcards", wildcards), wildcards, |b, _| {
            let mut rng = StdRng::seed_from_u64(3);
            b.iter(|| {
                black_box(completer.complete_with_rng(&tokens, size, &mut rng).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_rarity, benchmark_completion);
criterion_main!(benches);
