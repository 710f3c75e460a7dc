//! Benchmarks for frame assembly and query text building
//!
//! Run with: cargo bench

use cosmoframe::frame::{assemble_frame, FrameAssembler};
use cosmoframe::query::{build_query_text, ColumnSpec, TimeRange};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn create_test_documents(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            format!(
                r#"{{"_ts":{},"temp":"{}.5","humidity":{},"device":"dev-{}","status":"ok"}}"#,
                1_700_000_000 + i,
                i % 40,
                i % 100,
                i % 8
            )
            .into_bytes()
        })
        .collect()
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");

    for size in [100, 1000, 10000] {
        let documents = create_test_documents(size);

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("documents_{}", size), |b| {
            b.iter(|| assemble_frame(black_box(documents.iter())))
        });

        group.bench_function(format!("paged_{}", size), |b| {
            b.iter(|| {
                let mut assembler = FrameAssembler::default();
                for page in documents.chunks(100) {
                    assembler.push_documents(black_box(page.iter()));
                }
                assembler.finish()
            })
        });
    }

    group.finish();
}

fn bench_degrade(c: &mut Criterion) {
    // Numeric for most of the run, then one text value forces a re-cast
    let mut documents = create_test_documents(10000);
    documents.push(br#"{"_ts":1800000000,"temp":"n/a"}"#.to_vec());

    c.bench_function("degrade_to_text_10000", |b| {
        b.iter(|| assemble_frame(black_box(documents.iter())))
    });
}

fn bench_query_text(c: &mut Criterion) {
    let columns = ColumnSpec::parse("temp, humidity, device, status");
    let range = TimeRange::last_hours(24);

    c.bench_function("build_query_text", |b| {
        b.iter(|| build_query_text(black_box(&columns), black_box(&range)))
    });
}

criterion_group!(benches, bench_assemble, bench_degrade, bench_query_text);
criterion_main!(benches);
