//! Benchmarks for list normalization and filtering.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use hostsgen::blocklist::{Domain, Normalizer, Whitelist, WhitelistPolicy, aggregate};

fn generate_hosts_file(size: usize) -> String {
    let mut content = String::from("# Title: generated\n127.0.0.1 localhost\n\n");
    for i in 0..size {
        match i % 4 {
            0 => content.push_str(&format!("0.0.0.0 ads{i}.example.com\n")),
            1 => content.push_str(&format!("0.0.0.0 x.tracker{i}.example.net  # tracker\r\n")),
            2 => content.push_str(&format!("127.0.0.1 Metrics{i}.Example.ORG\n")),
            _ => content.push_str(&format!("cdn{i}.example.io\n")),
        }
    }
    content
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for size in &[100, 1000, 10000] {
        let content = generate_hosts_file(*size);
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("domains", size), &content, |b, text| {
            b.iter(|| Normalizer::new(black_box(text)).into_iter().count());
        });
    }

    group.finish();
}

fn bench_whitelist_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("whitelist_filter");

    for size in &[1000, 10000] {
        let content = generate_hosts_file(*size);
        let sources: Vec<Vec<Domain>> = vec![Normalizer::new(&content).into_iter().collect()];
        let whitelist_text = "example.net\nads0.example.com\n";

        for policy in [WhitelistPolicy::Exact, WhitelistPolicy::AncestorInclusive] {
            let whitelist = Whitelist::new(Normalizer::new(whitelist_text), policy);
            group.bench_with_input(
                BenchmarkId::new(format!("{policy:?}"), size),
                &sources,
                |b, sources| {
                    b.iter(|| {
                        let aggregated = aggregate(Vec::new(), sources.iter().cloned());
                        whitelist.filter(black_box(aggregated)).len()
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_whitelist_filter);
criterion_main!(benches);
