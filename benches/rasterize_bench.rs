#![deny(warnings)]

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::{fmt::Write, time::Duration};
use svgrast::*;

/// Synthetic document with a gradient background and a grid of filled
/// and stroked shapes
fn document_text(cells: usize) -> String {
    let size = cells * 24;
    let mut text = String::new();
    write!(
        text,
        r##"<svg width="{size}" height="{size}">
             <defs>
               <linearGradient id="bg">
                 <stop offset="0" stop-color="#264653"/>
                 <stop offset="1" stop-color="#2a9d8f"/>
               </linearGradient>
             </defs>
             <rect width="{size}" height="{size}" fill="url(#bg)"/>"##
    )
    .expect("write to string");
    for row in 0..cells {
        for col in 0..cells {
            let (cx, cy) = (col * 24 + 12, row * 24 + 12);
            if (row + col) % 2 == 0 {
                write!(
                    text,
                    r##"<circle cx="{cx}" cy="{cy}" r="9" fill="#e9c46a" opacity="0.8"/>"##
                )
            } else {
                write!(
                    text,
                    r##"<path d="M{x} {y} q 9 -9 18 0 t -18 9 z"
                          fill="none" stroke="#e76f51" stroke-width="2"
                          stroke-linejoin="round"/>"##,
                    x = cx - 9,
                    y = cy,
                )
            }
            .expect("write to string");
        }
    }
    text.push_str("</svg>");
    text
}

fn parse_benchmark(c: &mut Criterion) {
    let text = document_text(16);
    let shapes = Document::parse_str(&text).expect("valid document").shapes.len();
    let mut group = c.benchmark_group("parse");
    group
        .throughput(Throughput::Elements(shapes as u64))
        .bench_function("document", |b| {
            b.iter_with_large_drop(|| Document::parse_str(black_box(&text)))
        });
    group.finish();
}

fn render_benchmark(c: &mut Criterion) {
    let text = document_text(16);
    let document = Document::parse_str(&text).expect("valid document");
    let mut group = c.benchmark_group("render");
    for tenths in [5, 10, 20] {
        let scale = Scale::from_tenths(tenths).expect("valid scale");
        let pixels = (document.width * scale.factor()).ceil()
            * (document.height * scale.factor()).ceil();
        group.throughput(Throughput::Elements(pixels as u64));
        group.bench_function(format!("scale-{tenths}"), |b| {
            b.iter_with_large_drop(|| document.render(black_box(scale)))
        });
    }
    group.finish();
}

criterion_group!(
    name = rasterize;
    config = Criterion::default().sample_size(10).warm_up_time(Duration::new(1, 0));
    targets = parse_benchmark, render_benchmark
);
criterion_main!(rasterize);
