use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tfidf_text_encoder::{
    Analyzer, Document, EncoderConfig, FitOptions, Norm, RequestParameters, TFIDFVectorizer,
    TextVectorizer, TfidfTextEncoder,
};

/// Fit, inspect and apply TF-IDF text encoders.
#[derive(Parser, Debug)]
#[command(name = "tfidf-encoder", version, about = "TF-IDF sparse text encoder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fit a vectorizer on a text file (one document per line) and save it.
    Fit {
        #[arg(short, long)]
        input: PathBuf,
        /// `.json` writes JSON, anything else CBOR
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 1)]
        min_df: u64,
        #[arg(long, default_value_t = 1.0)]
        max_df: f64,
        #[arg(long)]
        max_features: Option<usize>,
        #[arg(long)]
        sublinear_tf: bool,
        #[arg(long, default_value = "l2")]
        norm: Norm,
        #[arg(long)]
        no_lowercase: bool,
        /// largest word n-gram
        #[arg(long, default_value_t = 1)]
        ngram_max: usize,
    },
    /// Encode documents read as JSON lines and write them back with embeddings.
    Encode {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// encoder settings (TOML)
        #[arg(short, long, env = "TFIDF_ENCODER_CONFIG")]
        config: Option<PathBuf>,
        /// overrides `path_vectorizer` from the config
        #[arg(short, long)]
        model: Option<PathBuf>,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        traversal_path: Option<String>,
        /// documents handed to the encoder per request
        #[arg(long, default_value_t = 10_000)]
        request_size: usize,
    },
    /// Print a summary of a fitted vectorizer.
    Inspect {
        #[arg(short, long)]
        model: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fit {
            input,
            output,
            min_df,
            max_df,
            max_features,
            sublinear_tf,
            norm,
            no_lowercase,
            ngram_max,
        } => {
            let options = FitOptions {
                analyzer: Analyzer {
                    lowercase: !no_lowercase,
                    ngram_range: (1, ngram_max),
                    ..Analyzer::default()
                },
                min_df,
                max_df,
                max_features,
                sublinear_tf,
                norm,
                ..FitOptions::default()
            };
            fit(&input, &output, &options)
        }
        Commands::Encode {
            input,
            output,
            config,
            model,
            batch_size,
            traversal_path,
            request_size,
        } => {
            let mut encoder_config = match config {
                Some(path) => EncoderConfig::from_toml_file(&path)
                    .with_context(|| format!("reading config {}", path.display()))?,
                None => EncoderConfig::default(),
            };
            if let Some(model) = model {
                encoder_config.path_vectorizer = model;
            }
            let parameters = RequestParameters {
                traversal_path,
                batch_size,
            };
            encode(&input, &output, encoder_config, &parameters, request_size)
        }
        Commands::Inspect { model } => inspect(&model),
    }
}

fn fit(input: &Path, output: &Path, options: &FitOptions) -> Result<()> {
    let reader = BufReader::new(File::open(input).with_context(|| format!("opening {}", input.display()))?);
    let vectorizer = fit_lines(reader, options).with_context(|| format!("fitting on {}", input.display()))?;
    vectorizer.save(output)?;
    println!(
        "fitted {} documents, vocabulary {} -> {}",
        vectorizer.doc_num(),
        vectorizer.vocabulary_size(),
        output.display()
    );
    Ok(())
}

/// Fit on one document per non-blank line.
fn fit_lines<R: BufRead>(reader: R, options: &FitOptions) -> Result<TFIDFVectorizer> {
    let mut texts = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            texts.push(line);
        }
    }
    if texts.is_empty() {
        bail!("input contains no documents");
    }
    let vectorizer: TFIDFVectorizer = TFIDFVectorizer::fit(&texts, options)?;
    Ok(vectorizer)
}

fn encode(
    input: &Path,
    output: &Path,
    config: EncoderConfig,
    parameters: &RequestParameters,
    request_size: usize,
) -> Result<()> {
    let encoder = TfidfTextEncoder::new(config)?;
    let reader = BufReader::new(File::open(input).with_context(|| format!("opening {}", input.display()))?);
    let mut writer = BufWriter::new(File::create(output).with_context(|| format!("creating {}", output.display()))?);
    let (total, encoded) = encode_lines(&encoder, reader, &mut writer, parameters, request_size)
        .with_context(|| format!("encoding {}", input.display()))?;
    info!(total, encoded, output = %output.display(), "done");
    Ok(())
}

/// Stream JSON lines through the encoder, `request_size` documents at a time.
/// Malformed lines are logged and skipped. Returns (documents written, documents encoded).
fn encode_lines<V, R, W>(
    encoder: &TfidfTextEncoder<V>,
    reader: R,
    writer: &mut W,
    parameters: &RequestParameters,
    request_size: usize,
) -> Result<(usize, usize)>
where
    V: TextVectorizer,
    R: BufRead,
    W: Write,
{
    if request_size == 0 {
        bail!("--request-size must be at least 1");
    }
    let mut request: Vec<Document> = Vec::with_capacity(request_size);
    let (mut total, mut encoded) = (0usize, 0usize);
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Document>(&line) {
            Ok(doc) => request.push(doc),
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "skipping malformed document");
                continue;
            }
        }
        if request.len() == request_size {
            total += request.len();
            encoded += flush(encoder, &mut request, parameters, writer)?;
        }
    }
    total += request.len();
    encoded += flush(encoder, &mut request, parameters, writer)?;
    writer.flush()?;
    Ok((total, encoded))
}

fn flush<V: TextVectorizer, W: Write>(
    encoder: &TfidfTextEncoder<V>,
    request: &mut Vec<Document>,
    parameters: &RequestParameters,
    writer: &mut W,
) -> Result<usize> {
    let encoded = encoder.encode(Some(request.as_mut_slice()), parameters)?;
    for doc in request.drain(..) {
        serde_json::to_writer(&mut *writer, &doc)?;
        writer.write_all(b"\n")?;
    }
    Ok(encoded)
}

fn inspect(model: &Path) -> Result<()> {
    let vectorizer: TFIDFVectorizer = TFIDFVectorizer::load(model)?;
    let analyzer = vectorizer.analyzer();
    println!("model:          {}", model.display());
    println!("documents:      {}", vectorizer.doc_num());
    println!("vocabulary:     {}", vectorizer.vocabulary_size());
    println!("norm:           {:?}", vectorizer.norm());
    println!("smooth_idf:     {}", vectorizer.smooth_idf());
    println!("sublinear_tf:   {}", vectorizer.sublinear_tf());
    println!("lowercase:      {}", analyzer.lowercase);
    println!("ngram_range:    {:?}", analyzer.ngram_range);
    let preview: Vec<&str> = (0..vectorizer.vocabulary_size().min(10))
        .filter_map(|i| vectorizer.term(i))
        .collect();
    println!("first terms:    {}", preview.join(", "));
    Ok(())
}
