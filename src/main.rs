use std::time::Duration;

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{
    Cli,
    CollectionAction,
    Command,
    DownloadArgs,
    FeaturesArgs,
    FieldAction,
    LtrAction,
    RenderArgs,
};
use solr_ltr::{
    DataDir,
    Error,
    FeatureDefinition,
    FeatureQuery,
    IdFilter,
    Result,
    SearchResultsTemplate,
    SolrClient,
    SolrConfig,
    admin::AdminStatus,
    download::{self, DownloadOptions, DownloadOutcome},
    features::LTR_FEATURES_FIELD,
    render,
    text_util,
};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SOLR_LTR_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Environment first, then `--solr-url`, then the individual flags.
fn resolve_config(cli: &Cli) -> Result<SolrConfig> {
    let mut config = match cli.solr_url.as_deref() {
        Some(url) => SolrConfig::from_base_url(url)?,
        None => SolrConfig::from_env()?,
    };

    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(base_path) = &cli.base_path {
        config.base_path = base_path.trim_matches('/').to_string();
    }
    if let Some(secs) = cli.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match &cli.command {
        Command::Completions(args) => args.generate(),
        Command::Tokenize { text } => {
            for token in text_util::tokenize(text) {
                println!("{token}");
            }
        }
        Command::Render(args) => cmd_render(&cli, args)?,
        Command::Download(args) => cmd_download(&cli, args).await?,
        Command::Health => cmd_health(&connect(&cli)?).await?,
        Command::Collection { action } => {
            let client = connect(&cli)?;
            match action {
                CollectionAction::Create { name } => {
                    report(client.create_collection(name).await?);
                }
                CollectionAction::Delete { name } => {
                    report(client.delete_collection(name).await?);
                }
            }
        }
        Command::Ltr { action } => cmd_ltr(&connect(&cli)?, action).await?,
        Command::Field { action } => {
            let client = connect(&cli)?;
            match action {
                FieldAction::Text { collection, field } => {
                    report(client.upsert_text_field(collection, field).await?);
                }
                FieldAction::Int { collection, field } => {
                    report(
                        client.upsert_integer_field(collection, field).await?,
                    );
                }
            }
        }
        Command::Features(args) => {
            cmd_features(&connect(&cli)?, args).await?;
        }
    }

    Ok(())
}

fn connect(cli: &Cli) -> Result<SolrClient> {
    SolrClient::new(resolve_config(cli)?)
}

async fn cmd_ltr(client: &SolrClient, action: &LtrAction) -> Result<()> {
    match action {
        LtrAction::Enable { collection } => {
            let setup = client.enable_ltr(collection).await?;
            if !setup.success() {
                return Err(Error::Response(format!(
                    "LTR setup on '{collection}' reported a failure"
                )));
            }
            println!("LTR enabled on '{collection}'");
        }
        LtrAction::UploadStore {
            collection,
            store,
            file,
        } => {
            let content = std::fs::read_to_string(file)?;
            let features: Vec<FeatureDefinition> =
                serde_json::from_str(&content)?;
            report(
                client
                    .upload_feature_store(collection, store, &features)
                    .await?,
            );
        }
        LtrAction::DeleteStore { collection, store } => {
            report(client.delete_feature_store(collection, store).await?);
        }
    }
    Ok(())
}

fn report(status: AdminStatus) {
    if status.success {
        println!("Status: Success");
    } else {
        println!("Status: Failure; Response:[ {} ]", status.body);
    }
}

async fn cmd_health(client: &SolrClient) -> Result<()> {
    match client.health_check().await {
        Ok(_) => {
            println!("Solr is up and responding at {}", client.base_url());
            Ok(())
        }
        Err(e) => {
            eprintln!("Error! Solr at {} is not responding.", client.base_url());
            Err(e)
        }
    }
}

async fn cmd_features(client: &SolrClient, args: &FeaturesArgs) -> Result<()> {
    let mut query = FeatureQuery::new(&args.index, &args.featureset)
        .with_id_field(&args.id_field);
    if !args.ids.is_empty() {
        query.ids = IdFilter::ids(args.ids.iter().cloned());
    }
    for (key, value) in &args.efi {
        query.options.insert(key.clone(), value.clone());
    }

    let docs = client.fetch_feature_vectors(&query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&docs)?);
        return Ok(());
    }

    if docs.is_empty() {
        println!("No documents found.");
        return Ok(());
    }

    for doc in &docs {
        let id = match doc.get(&args.id_field) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "?".to_string(),
        };
        match doc.get(LTR_FEATURES_FIELD).and_then(Value::as_array) {
            Some(values) => {
                let vector: Vec<f64> =
                    values.iter().filter_map(Value::as_f64).collect();
                println!("{id}\t{}", text_util::vec2str(&vector));
            }
            None => println!("{id}\t(no features)"),
        }
    }
    println!("\n{} document(s)", docs.len());
    Ok(())
}

fn cmd_render(cli: &Cli, args: &RenderArgs) -> Result<()> {
    let template = match &args.template {
        Some(path) => SearchResultsTemplate::load(path)?,
        None => {
            let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
            SearchResultsTemplate::load_or_builtin(
                &data_dir.search_results_template(),
            )?
        }
    };

    let content = std::fs::read_to_string(&args.results)?;
    let results = match serde_json::from_str::<Value>(&content)? {
        Value::Array(docs) => docs,
        mut body => match body.pointer_mut("/response/docs").map(Value::take) {
            Some(Value::Array(docs)) => docs,
            _ => {
                return Err(Error::Response(format!(
                    "{} holds neither a document array nor a select response",
                    args.results.display()
                )));
            }
        },
    };

    if args.heading {
        println!("{}", render::search_heading(&args.query));
    }
    print!("{}", template.render(&args.query, &results));
    Ok(())
}

async fn cmd_download(cli: &Cli, args: &DownloadArgs) -> Result<()> {
    let dest = match &args.dest {
        Some(dest) => dest.clone(),
        None => DataDir::resolve(cli.data_dir.as_deref())?.downloads_dir()?,
    };
    let options = DownloadOptions {
        force: args.force,
        progress: args.progress,
    };

    let timeout = resolve_config(cli)?.timeout;
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    for uri in &args.uris {
        match download::download_one(&http, uri, &dest, options).await? {
            DownloadOutcome::Skipped(path) => {
                println!("{} already exists", path.display());
            }
            DownloadOutcome::Downloaded { path, bytes } => {
                println!("{} ({bytes} bytes)", path.display());
            }
        }
    }
    Ok(())
}
