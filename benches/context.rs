use criterion::{Criterion, black_box, criterion_group, criterion_main};
use logsetup::{LogContext, LogFormatter, LogLevel, LogRecord, PercentFormatter};

fn bench_rendering(c: &mut Criterion) {
    let context = LogContext::new();
    context
        .set_global([("version", "1.0"), ("service", "billing")])
        .expect("valid keys");
    context
        .set_threadlocal([("worker", "joe"), ("request", "42")])
        .expect("valid keys");

    c.bench_function("context_rendered", |b| {
        b.iter(|| black_box(context.rendered()));
    });

    let formatter = PercentFormatter::with_timezone(
        "%(asctime)s %(timezone)s %(context)s%(levelname)s - %(message)s",
        Some("UTC"),
    );
    let record = LogRecord::new("bench", LogLevel::Info, "hello").with_context(context.rendered());
    c.bench_function("percent_format", |b| {
        b.iter(|| black_box(formatter.format(black_box(&record))));
    });
}

criterion_group!(benches, bench_rendering);
criterion_main!(benches);
