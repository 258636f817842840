//! Command implementations for the genesearch CLI.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::SearchConfig;
use crate::document::load_documents;
use crate::error::Result;
use crate::output::{QueryOutput, flatten, flatten_with_top_level};
use crate::query::{
    CatalogResolver, ElasticQueryCompiler, FieldTypeResolver, HeuristicResolver, MongoQueryCompiler,
    QueryCompiler, QueryHandler, build_aggregations,
};
use crate::schema::DataTypeInfo;
use crate::search::{FlatteningSearch, GeneSearch, MemoryBackend, QueryRequest};

/// Execute a CLI command.
pub fn execute_command(args: GeneSearchArgs) -> Result<()> {
    match &args.command {
        Command::Parse(parse_args) => parse_query(parse_args, &args),
        Command::Compile(compile_args) => compile_query(compile_args, &args),
        Command::Query(query_args) => run_query(query_args, &args),
        Command::Fetch(fetch_args) => run_fetch(fetch_args, &args),
        Command::Flatten(flatten_args) => flatten_documents(flatten_args, &args),
    }
}

/// Print the query tree for a JSON query.
fn parse_query(args: &ParseArgs, cli_args: &GeneSearchArgs) -> Result<()> {
    let catalog = load_catalog(args.catalog.as_deref())?;
    let queries = query_handler(catalog.as_ref()).parse_str(&args.query)?;
    output_result("Parsed query", &ParseResult { queries }, cli_args)
}

/// Print the backend query for a JSON query.
fn compile_query(args: &CompileArgs, cli_args: &GeneSearchArgs) -> Result<()> {
    let catalog = load_catalog(args.catalog.as_deref())?;
    let queries = query_handler(catalog.as_ref()).parse_str(&args.query)?;

    let result = match args.dialect {
        Dialect::Elastic => CompileResult {
            dialect: args.dialect,
            query: ElasticQueryCompiler::new().compile(&queries)?.to_json(),
            aggregations: (!args.facets.is_empty())
                .then(|| build_aggregations(&args.facets, args.aggregation_size)),
        },
        Dialect::Mongo => {
            if !args.facets.is_empty() {
                warn!("Facets are ignored for the mongo dialect");
            }
            CompileResult {
                dialect: args.dialect,
                query: MongoQueryCompiler::new().compile(&queries)?,
                aggregations: None,
            }
        }
    };
    output_result("Compiled query", &result, cli_args)
}

/// Run one page of a query over a data file.
fn run_query(args: &QueryArgs, cli_args: &GeneSearchArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let catalog = load_catalog(args.catalog.as_deref())?;
    let queries = query_handler(catalog.as_ref()).parse_opt(args.query.as_deref())?;
    let output = parse_output(args.fields.as_deref())?;
    let search = build_search(&args.data, config, catalog)?;

    let mut request = QueryRequest::new(queries)
        .with_output(output)
        .with_facets(args.facets.clone())
        .with_sorts(args.sorts.clone())
        .with_offset(args.offset);
    if let Some(limit) = args.limit {
        request = request.with_limit(limit);
    }

    let start = Instant::now();
    let result = search.query(&request)?;
    info!("Query completed in {} ms", start.elapsed().as_millis());
    output_result("Query results", &result, cli_args)
}

/// Fetch all matching documents, optionally as flattened rows.
fn run_fetch(args: &FetchArgs, cli_args: &GeneSearchArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let catalog = load_catalog(args.catalog.as_deref())?;
    let queries = query_handler(catalog.as_ref()).parse_str(&args.query)?;
    let output = parse_output(args.fields.as_deref())?;
    let search = build_search(&args.data, config, catalog)?;

    let start = Instant::now();
    let result = match &args.flatten {
        Some(target) => {
            FlatteningSearch::new(search, target.clone(), args.top_level.clone()).fetch(&queries, &output)?
        }
        None => search.fetch(&queries, &output)?,
    };
    info!(
        "Fetched {} documents in {} ms",
        result.results.len(),
        start.elapsed().as_millis()
    );
    output_result("Fetch results", &result, cli_args)
}

/// Flatten every document of a data file.
fn flatten_documents(args: &FlattenArgs, cli_args: &GeneSearchArgs) -> Result<()> {
    let documents = load_documents(&args.data)?;
    let results = match &args.top_level {
        Some(top_level) => documents
            .iter()
            .flat_map(|doc| flatten_with_top_level(doc, &args.path, top_level))
            .collect(),
        None => flatten(documents, &args.path),
    };
    output_result("Flattened documents", &FlattenResult { results }, cli_args)
}

/// A query handler typing fields from `catalog` when one is given.
fn query_handler(catalog: Option<&Arc<DataTypeInfo>>) -> QueryHandler<Box<dyn FieldTypeResolver>> {
    let resolver: Box<dyn FieldTypeResolver> = match catalog {
        Some(info) => Box::new(CatalogResolver::new(Arc::clone(info)).or(HeuristicResolver::new())),
        None => Box::new(HeuristicResolver::new()),
    };
    QueryHandler::with_resolver(resolver)
}

fn load_catalog(path: Option<&Path>) -> Result<Option<Arc<DataTypeInfo>>> {
    path.map(|path| {
        info!("Loading field catalog from {}", path.display());
        DataTypeInfo::from_file(path).map(Arc::new)
    })
    .transpose()
}

fn load_config(path: Option<&Path>) -> Result<SearchConfig> {
    match path {
        Some(path) => SearchConfig::from_file(path),
        None => Ok(SearchConfig::default()),
    }
}

fn parse_output(fields: Option<&str>) -> Result<QueryOutput> {
    match fields {
        Some(fields) => QueryOutput::build(fields),
        None => Ok(QueryOutput::new()),
    }
}

/// Load a data file into a memory-backed engine.
fn build_search(
    data: &Path,
    config: SearchConfig,
    catalog: Option<Arc<DataTypeInfo>>,
) -> Result<GeneSearch<MemoryBackend>> {
    let documents = load_documents(data)?;
    info!("Loaded {} documents from {}", documents.len(), data.display());
    let backend = MemoryBackend::with_documents(documents).with_id_field(config.id_field.clone());
    let search = GeneSearch::new(backend).with_config(config);
    Ok(match catalog {
        Some(info) => search.with_data_type_info(info),
        None => search,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn data_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": "G1", "biotype": "lncRNA", "transcripts": [{{"id": "T1"}}]}}"#).unwrap();
        writeln!(file, r#"{{"id": "G2", "biotype": "miRNA", "transcripts": [{{"id": "T2"}}]}}"#).unwrap();
        file.flush().unwrap();
        file
    }

    fn run(argv: &[&str]) -> Result<()> {
        execute_command(GeneSearchArgs::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_commands_run() {
        let file = data_file();
        let data = file.path().to_str().unwrap();
        run(&["genesearch", "-q", "parse", r#"{"transcripts.biotype": "lncRNA"}"#]).unwrap();
        run(&["genesearch", "-q", "-f", "json", "compile", r#"{"id": "G1"}"#, "--facet", "biotype"]).unwrap();
        run(&["genesearch", "-q", "compile", r#"{"start": ">5"}"#, "--dialect", "mongo"]).unwrap();
        run(&["genesearch", "-q", "query", data, "--facet", "biotype", "--sort", "-id"]).unwrap();
        run(&["genesearch", "-q", "fetch", data, "--query", r#"{"id": "G2"}"#, "--fields", "id"]).unwrap();
        run(&["genesearch", "-q", "fetch", data, "--query", r#"{"genes.biotype": "miRNA"}"#, "--flatten", "transcripts"])
            .unwrap();
        run(&["genesearch", "-q", "flatten", data, "--path", "transcripts", "--top-level", "genes"]).unwrap();
    }

    #[test]
    fn test_command_errors() {
        let file = data_file();
        let data = file.path().to_str().unwrap();
        assert!(run(&["genesearch", "-q", "parse", "{"]).is_err());
        assert!(run(&["genesearch", "-q", "fetch", data, "--query", "{}"]).is_err());
        assert!(run(&["genesearch", "-q", "fetch", data, "--query", "{}", "--flatten", "transcripts"]).is_err());
        assert!(
            run(&["genesearch", "-q", "fetch", data, "--query", r#"{"id": "G1"}"#, "--fields", "nope"]).is_err()
        );
    }
}
