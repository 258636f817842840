//! End-to-end search scenarios over an in-memory gene collection.

use std::io::Write;
use std::sync::Arc;

use genesearch::document::load_documents;
use genesearch::prelude::*;
use genesearch::search::FlatteningSearch;
use serde_json::{Value, json};
use tempfile::NamedTempFile;

fn genes() -> Vec<Value> {
    vec![
        json!({
            "id": "ENSG01", "name": "BRCA2", "biotype": "protein_coding", "genome": "homo_sapiens",
            "seq_region": "13", "start": 32315086, "end": 32400268, "strand": 1,
            "transcripts": [
                {"id": "ENST01", "biotype": "protein_coding", "start": 32315086,
                 "translations": [{"id": "ENSP01", "length": 3418}]},
                {"id": "ENST02", "biotype": "retained_intron", "start": 32370000, "translations": []}
            ]
        }),
        json!({
            "id": "ENSG02", "name": "XIST", "biotype": "lncRNA", "genome": "homo_sapiens",
            "seq_region": "X", "start": 73820651, "end": 73852753, "strand": -1,
            "transcripts": [
                {"id": "ENST03", "biotype": "lncRNA", "start": 73820651, "translations": []}
            ]
        }),
        json!({
            "id": "ENSG03", "name": "Brca2", "biotype": "protein_coding", "genome": "mus_musculus",
            "seq_region": "5", "start": 150522617, "end": 150568600, "strand": 1,
            "transcripts": [
                {"id": "ENST04", "biotype": "protein_coding", "start": 150522617,
                 "translations": [{"id": "ENSP04", "length": 3329}]}
            ]
        }),
    ]
}

fn data_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for gene in genes() {
        writeln!(file, "{gene}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn search() -> GeneSearch<MemoryBackend> {
    let file = data_file();
    let documents = load_documents(file.path()).unwrap();
    GeneSearch::new(MemoryBackend::with_documents(documents))
}

fn ids(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|d| d.get_field("id").and_then(FieldValue::to_term_string))
        .collect()
}

fn fetch_ids(search: &GeneSearch<MemoryBackend>, query: &str) -> Result<Vec<String>> {
    let queries = QueryHandler::new().parse_str(query)?;
    let result = search.fetch(&queries, &QueryOutput::of(["id"]))?;
    Ok(ids(&result.results))
}

#[test]
fn test_term_queries() -> Result<()> {
    let search = search();
    assert_eq!(fetch_ids(&search, r#"{"genome": "homo_sapiens"}"#)?, ["ENSG01", "ENSG02"]);
    assert_eq!(fetch_ids(&search, r#"{"name": ["XIST", "Brca2"]}"#)?, ["ENSG02", "ENSG03"]);
    assert_eq!(
        fetch_ids(&search, r#"{"genome": "homo_sapiens", "!biotype": "lncRNA"}"#)?,
        ["ENSG01"]
    );
    Ok(())
}

#[test]
fn test_nested_queries() -> Result<()> {
    let search = search();
    assert_eq!(
        fetch_ids(&search, r#"{"transcripts.biotype": "retained_intron"}"#)?,
        ["ENSG01"]
    );
    assert_eq!(
        fetch_ids(&search, r#"{"transcripts": {"translations": {"length": ">3400"}}}"#)?,
        ["ENSG01"]
    );
    assert!(
        fetch_ids(&search, r#"{"transcripts": {"biotype": "lncRNA", "id": "ENST01"}}"#)?.is_empty()
    );
    Ok(())
}

#[test]
fn test_location_queries() -> Result<()> {
    let search = search();
    assert_eq!(fetch_ids(&search, r#"{"location": "13:32000000-33000000"}"#)?, ["ENSG01"]);
    assert_eq!(fetch_ids(&search, r#"{"location": "X:1-100000000:-1"}"#)?, ["ENSG02"]);
    assert!(fetch_ids(&search, r#"{"location": "X:1-100000000:1"}"#)?.is_empty());
    assert_eq!(
        fetch_ids(&search, r#"{"location": {"seq_region": "5", "start": "150000000"}}"#)?,
        ["ENSG03"]
    );
    Ok(())
}

#[test]
fn test_fetch_output_selection() -> Result<()> {
    let search = search();
    let output = QueryOutput::build(r#"["id", {"transcripts": ["id", {"translations": ["id"]}]}]"#)?;
    let gene = search.fetch_by_id("ENSG01", &output)?.unwrap();
    assert_eq!(
        gene.to_json(),
        json!({
            "id": "ENSG01",
            "transcripts": [
                {"id": "ENST01", "translations": [{"id": "ENSP01"}]},
                {"id": "ENST02", "translations": []}
            ]
        })
    );

    let dotted = QueryOutput::build(r#"["id", "transcripts.id", "transcripts.translations.id"]"#)?;
    assert_eq!(search.fetch_by_id("ENSG01", &dotted)?, Some(gene));
    Ok(())
}

#[test]
fn test_fetch_missing_field_fails() {
    let search = search();
    let err = search
        .fetch_by_ids(&["ENSG01", "ENSG02"], &QueryOutput::of(["id", "description"]))
        .unwrap_err();
    assert!(matches!(err, GeneSearchError::FieldNotFound(_)));
}

#[test]
fn test_paged_query_with_facets() -> Result<()> {
    let search = search().with_config(SearchConfig::default().with_default_limit(2));
    let request = QueryRequest::new(Vec::new())
        .with_output(QueryOutput::of(["id", "name"]))
        .with_facets(vec!["genome".to_string(), "transcripts.biotype".to_string()])
        .with_sorts(vec!["-start".to_string()]);
    let result = search.query(&request)?;
    assert_eq!(result.result_count, 3);
    assert_eq!(result.limit, 2);
    assert_eq!(ids(&result.results), ["ENSG03", "ENSG02"]);
    assert_eq!(result.facets["genome"]["homo_sapiens"], 2);
    assert_eq!(result.facets["transcripts.biotype"]["protein_coding"], 2);
    assert_eq!(result.facets["transcripts.biotype"]["retained_intron"], 1);

    let envelope = serde_json::to_value(&result)?;
    assert_eq!(envelope["resultCount"], json!(3));
    assert_eq!(envelope["results"][0], json!({"id": "ENSG03", "name": "Brca2"}));
    Ok(())
}

#[test]
fn test_field_info_from_catalog() -> Result<()> {
    let info = DataTypeInfo::from_json_str(
        r#"{"name": "genes", "fieldInfo": [
            {"name": "id", "type": "ID", "displayName": "Gene ID"},
            {"name": "name", "type": "TERM"},
            {"name": "transcripts.id", "type": "ID"},
            {"name": "transcripts.biotype", "type": "TERM"}
        ]}"#,
    )?;
    let search = search().with_data_type_info(Arc::new(info));
    let result = search.fetch(
        &[QueryNode::term("id", ["ENSG02"])],
        &QueryOutput::of(["name", "transcripts.*"]),
    )?;
    let names: Vec<&str> = result.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["id", "name", "transcripts.id", "transcripts.biotype"]);
    assert_eq!(result.fields[0].display_name.as_deref(), Some("Gene ID"));
    Ok(())
}

#[test]
fn test_flattening_search() -> Result<()> {
    let transcripts = FlatteningSearch::new(search(), "transcripts", "genes");

    let queries = QueryHandler::new().parse_str(r#"{"biotype": "protein_coding", "genes.genome": "homo_sapiens"}"#)?;
    let result = transcripts.fetch(&queries, &QueryOutput::of(["id", "biotype", "genes.name"]))?;
    let rows: Vec<Value> = result.results.iter().map(Document::to_json).collect();
    assert_eq!(
        rows,
        vec![
            json!({"id": "ENST01", "biotype": "protein_coding", "genes.name": "BRCA2"}),
            json!({"id": "ENST02", "biotype": "retained_intron", "genes.name": "BRCA2"}),
        ]
    );

    let request = QueryRequest::new(Vec::new())
        .with_output(QueryOutput::of(["id"]))
        .with_facets(vec!["biotype".to_string(), "genes.genome".to_string()]);
    let page = transcripts.query(&request)?;
    assert_eq!(page.result_count, 3);
    assert_eq!(page.results.len(), 4);
    assert_eq!(page.facets["biotype"]["protein_coding"], 2);
    assert_eq!(page.facets["genes.genome"]["homo_sapiens"], 2);
    Ok(())
}
