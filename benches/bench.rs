//! Criterion benchmarks for genesearch.
//!
//! Covers the hot paths of a request:
//! - Query parsing and compilation
//! - Output filtering and flattening
//! - Memory backend queries with facets

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use genesearch::document::Document;
use genesearch::output::{QueryOutput, filter_fields, flatten};
use genesearch::query::{ElasticQueryCompiler, QueryCompiler, QueryHandler};
use genesearch::search::{GeneSearch, MemoryBackend, QueryRequest};
use serde_json::json;
use std::hint::black_box;

const BIOTYPES: [&str; 4] = ["protein_coding", "lncRNA", "miRNA", "retained_intron"];

/// Generate gene documents with a few transcripts each.
fn generate_genes(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let transcripts: Vec<_> = (0..(1 + i % 4))
                .map(|t| {
                    json!({
                        "id": format!("T{i}.{t}"),
                        "biotype": BIOTYPES[(i + t) % BIOTYPES.len()],
                        "start": i * 1000 + t * 10,
                        "translations": [{"id": format!("P{i}.{t}"), "length": 100 + t}]
                    })
                })
                .collect();
            Document::from_json(json!({
                "id": format!("G{i}"),
                "name": format!("gene{i}"),
                "biotype": BIOTYPES[i % BIOTYPES.len()],
                "seq_region": (i % 22 + 1).to_string(),
                "start": i * 1000,
                "end": i * 1000 + 900,
                "transcripts": transcripts
            }))
            .unwrap()
        })
        .collect()
}

fn bench_query_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_compilation");
    let handler = QueryHandler::new();
    let compiler = ElasticQueryCompiler::new();
    let query = r#"{
        "genome": "homo_sapiens",
        "!biotype": "lncRNA",
        "location": "1:1000-50000",
        "transcripts": {"biotype": ["protein_coding", "miRNA"], "translations.length": ">100"}
    }"#;

    group.bench_function("parse", |b| {
        b.iter(|| black_box(handler.parse_str(black_box(query)).unwrap()))
    });

    let nodes = handler.parse_str(query).unwrap();
    group.bench_function("compile_elastic", |b| {
        b.iter(|| black_box(compiler.compile(black_box(&nodes)).unwrap().to_json()))
    });

    group.finish();
}

fn bench_remodelling(c: &mut Criterion) {
    let mut group = c.benchmark_group("remodelling");
    let genes = generate_genes(100);
    let output = QueryOutput::build(r#"["id", {"transcripts": ["id", {"translations": ["id"]}]}]"#).unwrap();

    group.throughput(Throughput::Elements(genes.len() as u64));
    group.bench_function("filter_fields", |b| {
        b.iter(|| {
            for gene in &genes {
                black_box(filter_fields(gene, &output));
            }
        })
    });

    group.bench_function("flatten_two_levels", |b| {
        b.iter(|| black_box(flatten(genes.clone(), "transcripts.translations")))
    });

    group.finish();
}

fn bench_memory_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_search");
    group.sample_size(20);
    let search = GeneSearch::new(MemoryBackend::with_documents(generate_genes(10_000)));
    let nodes = QueryHandler::new()
        .parse_str(r#"{"transcripts.biotype": "miRNA", "start": ">=100000"}"#)
        .unwrap();
    let request = QueryRequest::new(nodes.clone())
        .with_output(QueryOutput::of(["id", "name"]))
        .with_facets(vec!["biotype".to_string()])
        .with_sorts(vec!["-start".to_string()])
        .with_limit(20);

    group.bench_function("query_page_with_facets", |b| {
        b.iter(|| black_box(search.query(black_box(&request)).unwrap()))
    });

    group.bench_function("fetch_all", |b| {
        b.iter(|| black_box(search.fetch(&nodes, &QueryOutput::of(["id"])).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_query_compilation,
    bench_remodelling,
    bench_memory_search
);
criterion_main!(benches);
