use anyhow::{Context, Result};
use clap::{Args, Parser};
use idg_dataset::{
    build_vocabulary, create_captions, encode_captions, load_data, mscoco_to_formatted,
    save_data, DatasetConfig, FormattedRecord, IdgDataset, Language, RandomAccessDataset,
    Tokenizer, TokenizerConfig, Vocabulary, WordCounter,
};
use log::info;
use prettytable::{cell, row, Table};
use std::{
    env,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Parser)]
/// Prepare MSCOCO caption datasets and inspect prepared ones.
enum Opts {
    /// Convert an MSCOCO caption file to formatted records.
    Convert {
        /// MSCOCO caption JSON file
        input: PathBuf,
        /// output formatted file (.pkl or .json)
        output: PathBuf,
    },
    /// Tokenize formatted records and build the vocabulary.
    Preprocess(PreprocessOpts),
    /// Print the summary of a dataset.
    Summary {
        /// dataset configuration file
        config_file: PathBuf,
    },
    /// Print the image path and caption tokens of a caption.
    Show {
        /// dataset configuration file
        config_file: PathBuf,
        /// caption index
        index: usize,
    },
}

#[derive(Debug, Clone, Args)]
struct PreprocessOpts {
    /// formatted file produced by the convert command
    input: PathBuf,
    /// output dataset file (.pkl or .json)
    output: PathBuf,
    /// reuse this vocabulary instead of building one
    #[clap(long = "in_vocab_path")]
    in_vocab_path: Option<PathBuf>,
    /// save the vocabulary to this file
    #[clap(long = "out_vocab_path")]
    out_vocab_path: Option<PathBuf>,
    /// segment sentences with the language segmenter
    #[clap(long)]
    tokenize: bool,
    /// caption language: jp, en or ch
    #[clap(long)]
    lang: Option<Language>,
    /// trim and lowercase sentences
    #[clap(long = "tolower")]
    to_lower: bool,
    /// remove punctuation marks
    #[clap(long = "remove_suffix")]
    remove_suffix: bool,
    /// replace digits with 0
    #[clap(long = "replace_digits")]
    replace_digits: bool,
    /// minimum count of a kept word
    #[clap(long, default_value = "5")]
    cutoff: usize,
    /// maximum vocabulary size, 0 for no limit
    #[clap(long = "vocab_size", default_value = "0")]
    vocab_size: usize,
}

fn main() -> Result<()> {
    let filters = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();

    match Opts::parse() {
        Opts::Convert { input, output } => convert(input, output)?,
        Opts::Preprocess(opts) => preprocess(opts)?,
        Opts::Summary { config_file } => summary(config_file)?,
        Opts::Show { config_file, index } => show(config_file, index)?,
    }

    Ok(())
}

fn convert(input: PathBuf, output: PathBuf) -> Result<()> {
    let records = mscoco_to_formatted(&input)
        .with_context(|| format!("failed to convert '{}'", input.display()))?;
    save_data(&records, &output)
        .with_context(|| format!("failed to save '{}'", output.display()))?;
    info!("saved {} records to {}", records.len(), output.display());
    Ok(())
}

fn preprocess(opts: PreprocessOpts) -> Result<()> {
    let PreprocessOpts {
        input,
        output,
        in_vocab_path,
        out_vocab_path,
        tokenize,
        lang,
        to_lower,
        remove_suffix,
        replace_digits,
        cutoff,
        vocab_size,
    } = opts;

    let records: Vec<FormattedRecord> = load_data(&input)
        .with_context(|| format!("failed to load formatted records '{}'", input.display()))?;

    let tokenizer = Tokenizer::new(TokenizerConfig {
        lang,
        tokenize,
        to_lower,
        remove_suffix,
        replace_digits,
    })?;
    let mut counter = WordCounter::new();
    let dataset = create_captions(&records, &tokenizer, &mut counter)?;
    let vocab = prepare_vocabulary(in_vocab_path.as_deref(), &counter, cutoff, vocab_size)?;

    let dataset = encode_captions(dataset, &vocab);
    save_data(&dataset, &output)
        .with_context(|| format!("failed to save dataset '{}'", output.display()))?;
    info!(
        "saved {} captions and {} images to {}",
        dataset.captions.len(),
        dataset.images.len(),
        output.display()
    );

    if let Some(path) = &out_vocab_path {
        save_data(&vocab, path)
            .with_context(|| format!("failed to save vocabulary '{}'", path.display()))?;
        info!("saved {} words to {}", vocab.len(), path.display());
    }

    Ok(())
}

/// Load the vocabulary from `in_vocab_path` if given, otherwise build it from
/// the counted tokens.
fn prepare_vocabulary(
    in_vocab_path: Option<&Path>,
    counter: &WordCounter,
    cutoff: usize,
    vocab_size: usize,
) -> Result<Vocabulary> {
    let vocab = match in_vocab_path {
        Some(path) => {
            let vocab: Vocabulary = load_data(path)
                .with_context(|| format!("failed to load vocabulary '{}'", path.display()))?;
            info!("reuse {} words from {}", vocab.len(), path.display());
            vocab
        }
        None => build_vocabulary(counter, cutoff, vocab_limit(vocab_size))?,
    };
    Ok(vocab)
}

/// A zero `--vocab_size` means no limit.
fn vocab_limit(vocab_size: usize) -> Option<usize> {
    (vocab_size > 0).then(|| vocab_size)
}

fn open_dataset(config_file: &Path) -> Result<IdgDataset> {
    let config = DatasetConfig::open(config_file)
        .with_context(|| format!("failed to open config '{}'", config_file.display()))?;
    let dataset = IdgDataset::new(&config)
        .with_context(|| format!("failed to load dataset '{}'", config.dataset_path.display()))?;
    Ok(dataset)
}

fn summary(config_file: PathBuf) -> Result<()> {
    let dataset = open_dataset(&config_file)?;
    let summary = dataset.summary();

    let mut table = Table::new();
    table.add_row(row!["vocabulary size", summary.vocabulary_size]);
    table.add_row(row!["captions", summary.caption_count]);
    table.add_row(row!["images", summary.image_count]);
    table.add_row(row!["unknown token ratio", summary.unknown_token_ratio]);
    table.add_row(row!["image source", dataset.image_source().kind()]);
    table.printstd();

    Ok(())
}

fn show(config_file: PathBuf, index: usize) -> Result<()> {
    let dataset = open_dataset(&config_file)?;
    let (image_path, tokens) = dataset
        .get_raw(index)
        .with_context(|| format!("failed to get caption {} of {}", index, dataset.len()))?;
    let img_idx = dataset.image_of(index)?;

    let mut table = Table::new();
    table.add_row(row!["caption index", index]);
    table.add_row(row!["image index", img_idx]);
    table.add_row(row!["image path", image_path.display()]);
    table.add_row(row!["caption", tokens.join(" ")]);
    table.printstd();

    Ok(())
}
