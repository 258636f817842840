//! Integration tests from JSON query text to backend queries.

use std::io::Write;
use std::sync::Arc;

use genesearch::prelude::*;
use genesearch::query::{
    ElasticQueryCompiler, MongoQueryCompiler, NumberExpression, build_aggregation, search_body,
};
use serde_json::json;
use tempfile::NamedTempFile;

const GENES: &str = r#"{
    "name": "genes",
    "fieldInfo": [
        {"name": "id", "type": "ID"},
        {"name": "name", "type": "TERM"},
        {"name": "start", "type": "NUMBER"},
        {"name": "transcripts", "type": "NESTED"},
        {"name": "transcripts.version", "type": "TERM"}
    ]
}"#;

fn catalog() -> Arc<DataTypeInfo> {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(GENES.as_bytes()).unwrap();
    file.flush().unwrap();
    Arc::new(DataTypeInfo::from_file(file.path()).unwrap())
}

#[test]
fn test_elastic_end_to_end() -> Result<()> {
    let nodes = QueryHandler::new().parse_str(
        r#"{"genome": "homo_sapiens", "!biotype": "lncRNA", "transcripts": {"start": "100-200"}}"#,
    )?;
    let query = ElasticQueryCompiler::new().compile(&nodes)?;
    assert_eq!(
        query.to_json(),
        json!({"bool": {
            "must": [
                {"constant_score": {"filter": {"term": {"genome": "homo_sapiens"}}}},
                {"nested": {
                    "path": "transcripts",
                    "query": {"range": {"transcripts.start": {"gte": 100, "lte": 200}}}
                }}
            ],
            "must_not": [
                {"constant_score": {"filter": {"term": {"biotype": "lncRNA"}}}}
            ]
        }})
    );
    Ok(())
}

#[test]
fn test_single_node_has_no_bool_wrapper() -> Result<()> {
    let compiler = ElasticQueryCompiler::new();
    let query = compiler.compile(&[QueryNode::term("id", ["G1", "G2"])])?;
    assert_eq!(
        query.to_json(),
        json!({"constant_score": {"filter": {"ids": {"values": ["G1", "G2"]}}}})
    );
    assert_eq!(compiler.compile(&[])?.to_json(), json!({"match_all": {}}));
    Ok(())
}

#[test]
fn test_mongo_end_to_end() -> Result<()> {
    let nodes = QueryHandler::new().parse_str(r#"{"id": "G1", "start": ">=5", "name": ["a", "b"]}"#)?;
    let filter = MongoQueryCompiler::new().compile(&nodes)?;
    assert_eq!(
        filter,
        json!({"_id": "G1", "name": {"$in": ["a", "b"]}, "start": {"$gte": 5}})
    );

    let negated = QueryHandler::new().parse_str(r#"{"!id": "G1"}"#)?;
    assert!(matches!(
        MongoQueryCompiler::new().compile(&negated),
        Err(GeneSearchError::Unsupported(_))
    ));
    Ok(())
}

#[test]
fn test_catalog_overrides_guessing() -> Result<()> {
    let heuristic = QueryHandler::new().parse_str(r#"{"name": "100", "transcripts.version": "2"}"#)?;
    assert_eq!(
        heuristic[0],
        QueryNode::number("name", NumberExpression::equal(100.0))
    );

    let handler = QueryHandler::with_catalog(catalog());
    let typed = handler.parse_str(r#"{"name": "100", "transcripts.version": "2", "other": "7"}"#)?;
    assert_eq!(
        typed,
        vec![
            QueryNode::term("name", ["100"]),
            QueryNode::number("other", NumberExpression::equal(7.0)),
            QueryNode::nested("transcripts", vec![QueryNode::term("version", ["2"])]),
        ]
    );
    Ok(())
}

#[test]
fn test_location_string_query() -> Result<()> {
    let nodes = QueryHandler::new().parse_str(r#"{"location": "X:100-200:-1"}"#)?;
    let query = ElasticQueryCompiler::new().compile(&nodes)?;
    let json = query.to_json();
    let must = json["bool"]["must"].as_array().unwrap();
    assert_eq!(must.len(), 4);
    assert_eq!(
        must[0],
        json!({"constant_score": {"filter": {"term": {"seq_region": "X"}}}})
    );
    Ok(())
}

#[test]
fn test_search_body_with_facets() -> Result<()> {
    let query = ElasticQueryCompiler::new().compile(&[QueryNode::term("biotype", ["lncRNA"])])?;
    let body = search_body(&query, &["id".to_string()], &["transcripts.biotype"], 10);
    assert_eq!(body["_source"], json!(["id"]));
    assert_eq!(
        body["aggs"]["transcripts.biotype"],
        build_aggregation("transcripts.biotype", 10)
    );
    assert_eq!(
        body["aggs"]["transcripts.biotype"]["aggs"]["biotype"]["terms"]["field"],
        json!("transcripts.biotype")
    );
    Ok(())
}

#[test]
fn test_numeric_looking_strings_match_exactly() -> Result<()> {
    for text in ["1.10", "007", "12345678901234567891"] {
        let backend = MemoryBackend::with_documents(vec![
            Document::from_json(json!({"id": "V1", "version": text}))?,
            Document::from_json(json!({"id": "V2", "version": "other"}))?,
        ]);
        let nodes = QueryHandler::new().parse_str(&json!({"version": text}).to_string())?;
        let query = backend.compile(&nodes)?;
        assert_eq!(
            query.to_json(),
            json!({"constant_score": {"filter": {"term": {"version": text}}}})
        );
        let page = backend.search(&query, &[], 0, 10, &[])?;
        assert_eq!(page.total, 1, "no exact match for {text}");
    }
    Ok(())
}

#[test]
fn test_numeric_id_is_id_lookup() -> Result<()> {
    let backend = MemoryBackend::with_documents(vec![
        Document::from_json(json!({"id": "12345", "name": "a"}))?,
        Document::from_json(json!({"id": "54321", "name": "b"}))?,
    ]);
    let nodes = QueryHandler::new().parse_str(r#"{"id": "12345"}"#)?;
    let query = backend.compile(&nodes)?;
    assert_eq!(
        query.to_json(),
        json!({"constant_score": {"filter": {"ids": {"values": ["12345"]}}}})
    );
    assert_eq!(backend.search(&query, &[], 0, 10, &[])?.total, 1);
    Ok(())
}
