//! Console benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use bridge::{LogEvent, LogMessage};
use common::{JsObject, LogType, Value};
use console_format::{format_args, render_table, serialize};
use log_buffer::LogBuffer;
use ui::{LogTypeSet, LogView};

fn nested_object(depth: usize, width: usize) -> Value {
    let root = JsObject::new();
    let mut current = root.clone();
    for level in 0..depth {
        for key in 0..width {
            current.set(format!("k{}", key), level as f64);
        }
        let next = JsObject::new();
        current.set("child", next.clone());
        current = next;
    }
    Value::Object(root)
}

/// Benchmark serialization.
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for depth in [2usize, 10, 20] {
        let value = nested_object(depth, 20);
        group.bench_with_input(BenchmarkId::new("nested", depth), &value, |b, value| {
            b.iter(|| black_box(serialize(value)))
        });
    }

    let cyclic = JsObject::new();
    cyclic.set("self", cyclic.clone());
    let cyclic = Value::Object(cyclic);
    group.bench_function("cyclic", |b| b.iter(|| black_box(serialize(&cyclic))));

    group.finish();
}

/// Benchmark format reconstruction.
fn bench_format(c: &mut Criterion) {
    let args = vec![
        Value::from("%cstyled %s and %d%%"),
        Value::from("color: red; font-weight: bold"),
        Value::from("text"),
        Value::from(42),
        nested_object(3, 5),
    ];

    c.bench_function("format_args", |b| b.iter(|| black_box(format_args(&args))));
}

/// Benchmark table rendering.
fn bench_table(c: &mut Criterion) {
    let rows = Value::array((0..100).map(|n| {
        Value::object([
            ("id", Value::from(n)),
            ("name", Value::from(format!("row-{}", n))),
            ("ok", Value::from(n % 2 == 0)),
        ])
    }));

    c.bench_function("render_table_100", |b| {
        b.iter(|| black_box(render_table(&rows).map(|t| t.to_message())))
    });
}

/// Benchmark buffer appends with eviction.
fn bench_buffer(c: &mut Criterion) {
    c.bench_function("append_with_eviction", |b| {
        let mut buffer = LogBuffer::new();
        let mut n = 0f64;
        b.iter(|| {
            n += 1.0;
            black_box(buffer.append(LogEvent::new(
                LogType::Log,
                LogMessage::Text("entry".into()),
                n,
                0,
            )))
        })
    });
}

/// Benchmark a full render of a large buffer.
fn bench_view(c: &mut Criterion) {
    let mut buffer = LogBuffer::new();
    for n in 0..5_000 {
        let log_type = if n % 10 == 0 { LogType::Error } else { LogType::Log };
        let id = buffer.append(LogEvent::new(
            log_type,
            LogMessage::Text(format!("message {}", n)),
            n as f64,
            0,
        ));
        if n % 500 == 0 {
            buffer.toggle_pin(id);
        }
    }
    let entries = buffer.snapshot();

    let mut group = c.benchmark_group("view");
    group.bench_function("render_all", |b| {
        let mut view = LogView::default();
        b.iter(|| black_box(view.render(&entries, false).rows.len()))
    });
    group.bench_function("render_filtered", |b| {
        let mut view = LogView::new(LogTypeSet::ERROR);
        view.set_text("message 4");
        b.iter(|| black_box(view.render(&entries, false).rows.len()))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_serialize,
    bench_format,
    bench_table,
    bench_buffer,
    bench_view
);
criterion_main!(benches);
