//! Content Filter Benchmarks
//!
//! Run with: cargo bench --bench content_filter

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;
use tabasamu::config::{MemoryConfigStore, OPTION_NAME};
use tabasamu::filter::{ContentFilter, ReplacementTable};
use tabasamu::packages::{EmoticonEntry, PackageDescriptor, PackageLoader};

const TOKENS: &[&str] = &[
    ":)", ":-)", ":(", ":-(", ";)", ";-)", ":D", ":-D", ":P", ":-P", ":o", "8)", ":'(", "<3",
];

fn descriptor() -> PackageDescriptor {
    PackageDescriptor {
        name: "bench".to_string(),
        display_name: "Bench".to_string(),
        version: "1.0".to_string(),
        base_url: "/smilies/bench".to_string(),
        base_path: std::env::temp_dir().join("bench"),
        entries: TOKENS
            .iter()
            .enumerate()
            .map(|(i, t)| EmoticonEntry::new(*t, format!("{}.png", i)).with_attribute("width", "15"))
            .collect(),
    }
}

fn sample_post(paragraphs: usize) -> String {
    let mut out = String::new();
    for i in 0..paragraphs {
        out.push_str(&format!(
            "<p class=\"para-{}\">Hello there :) this is <b>paragraph {}</b> ;-) \
             with <a href=\"/x?q=:)\" title=\":D\">a link</a> and some plain text.</p>\n",
            i, i
        ));
    }
    out
}

fn benchmark_replace_text(c: &mut Criterion) {
    let table = ReplacementTable::build(&descriptor());

    let mut group = c.benchmark_group("replacement_table");
    group.bench_function("text_with_tokens", |b| {
        b.iter(|| table.replace_text(black_box("well :) that was fun ;-) <3 :D")));
    });
    group.bench_function("text_without_tokens", |b| {
        b.iter(|| table.replace_text(black_box("a perfectly ordinary sentence without faces")));
    });
    group.finish();
}

fn write_package(root: &std::path::Path) {
    let dir = root.join("bench");
    std::fs::create_dir_all(&dir).unwrap();
    let mut xml = String::from("<package><info><name>Bench</name><version>1.0</version></info>");
    for (i, token) in TOKENS.iter().enumerate() {
        xml.push_str(&format!(
            "<smiley width=\"15\"><text>{}</text><image>{}.png</image></smiley>",
            token.replace('&', "&amp;").replace('<', "&lt;"),
            i
        ));
    }
    xml.push_str("</package>");
    std::fs::write(dir.join("smilies.xml"), xml).unwrap();
}

fn benchmark_apply(c: &mut Criterion) {
    let tmp = tempfile::TempDir::new().unwrap();
    write_package(tmp.path());
    let loader = Arc::new(PackageLoader::new(tmp.path(), "/smilies"));

    let active = ContentFilter::new(
        loader.clone(),
        Arc::new(MemoryConfigStore::with_option(OPTION_NAME, "bench")),
        OPTION_NAME,
    );
    let passthrough = ContentFilter::new(
        loader,
        Arc::new(MemoryConfigStore::with_option(OPTION_NAME, "missing")),
        OPTION_NAME,
    );

    let mut group = c.benchmark_group("content_filter");
    for paragraphs in [1usize, 10, 100] {
        let post = sample_post(paragraphs);
        group.throughput(Throughput::Bytes(post.len() as u64));
        group.bench_function(format!("apply_{}", paragraphs), |b| {
            b.iter(|| active.apply(black_box(&post)));
        });
        group.bench_function(format!("passthrough_{}", paragraphs), |b| {
            b.iter(|| passthrough.apply(black_box(&post)));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_replace_text, benchmark_apply);
criterion_main!(benches);
