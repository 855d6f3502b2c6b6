mod debug_report;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use timexer::{Document, Tagger, Token};
use tracing_subscriber::EnvFilter;

const DEFAULT_RULES: &str = "rules";
const LOG_ENV: &str = "TIMEXER_LOG";

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let tagger = match Tagger::from_rules_dir(&config.rules) {
        Ok(tagger) => tagger,
        Err(errors) => {
            eprintln!("error: could not load rules from '{}'\n{errors}", config.rules.display());
            std::process::exit(1);
        }
    };

    let mut document = read_document(&config.input);
    if let Some(dct) = &config.dct {
        document = document.with_dct(dct.clone());
    }
    let result = tagger.annotate(document);
    debug_report::print_run(&result, config.color);
}

struct CliConfig {
    input: String,
    rules: PathBuf,
    dct: Option<String>,
    color: bool,
}

/// What one command-line word asks for.
#[derive(Debug, PartialEq)]
enum CliArg {
    Help,
    Version,
    Color(bool),
    Rules(String),
    Dct(String),
    Input(String),
    /// Everything from here on is input text.
    Text(Vec<String>),
}

fn parse_args() -> Result<CliConfig, String> {
    let mut config = CliConfig {
        input: String::new(),
        rules: PathBuf::from(DEFAULT_RULES),
        dct: None,
        color: io::stdout().is_terminal(),
    };
    let mut input = None;

    for arg in classify_args(std::env::args().skip(1))? {
        match arg {
            CliArg::Help => {
                println!("{}", help_text());
                std::process::exit(0);
            }
            CliArg::Version => {
                println!("timexer {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            CliArg::Color(color) => config.color = color,
            CliArg::Rules(dir) => config.rules = PathBuf::from(dir),
            CliArg::Dct(dct) => config.dct = Some(dct),
            CliArg::Input(text) => set_input(&mut input, text)?,
            CliArg::Text(words) if words.is_empty() => {}
            CliArg::Text(words) => set_input(&mut input, words.join(" "))?,
        }
    }

    config.input = match input {
        Some(text) => text,
        None => io::read_to_string(io::stdin()).map_err(|err| format!("error: failed to read stdin: {err}"))?,
    };
    if config.input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }
    Ok(config)
}

fn set_input(slot: &mut Option<String>, text: String) -> Result<(), String> {
    if slot.replace(text).is_some() {
        return Err("error: input provided multiple times".to_string());
    }
    Ok(())
}

/// Turn raw arguments into [`CliArg`]s. Valued options accept both
/// `--name value` and `--name=value`.
fn classify_args(args: impl IntoIterator<Item = String>) -> Result<Vec<CliArg>, String> {
    let mut args = args.into_iter();
    let mut out = Vec::new();
    while let Some(arg) = args.next() {
        let (name, inline) = match arg.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let parsed = match name.as_str() {
            "-h" | "--help" => CliArg::Help,
            "-V" | "--version" => CliArg::Version,
            "--color" => CliArg::Color(true),
            "--no-color" => CliArg::Color(false),
            "--rules" => CliArg::Rules(option_value(&name, inline, &mut args)?),
            "--dct" => CliArg::Dct(option_value(&name, inline, &mut args)?),
            "-i" | "--input" => CliArg::Input(option_value(&name, inline, &mut args)?),
            "--" => {
                out.push(CliArg::Text(args.collect()));
                break;
            }
            _ if arg.starts_with('-') => return Err(format!("error: unknown option '{arg}'")),
            _ => {
                out.push(CliArg::Text(std::iter::once(arg).chain(args).collect()));
                break;
            }
        };
        out.push(parsed);
    }
    Ok(out)
}

fn option_value(name: &str, inline: Option<String>, rest: &mut impl Iterator<Item = String>) -> Result<String, String> {
    inline.or_else(|| rest.next()).ok_or_else(|| format!("error: {name} expects a value"))
}

/// One sentence per line, tokens as `word/POS`. A token without a slash gets
/// the POS `UNK`.
fn read_document(input: &str) -> Document {
    let sentences = input.lines().filter(|line| !line.trim().is_empty()).map(|line| {
        line.split_whitespace()
            .map(|item| match item.rsplit_once('/') {
                Some((word, pos)) if !word.is_empty() && !pos.is_empty() => Token::new(word, pos),
                _ => Token::new(item, "UNK"),
            })
            .collect::<Vec<_>>()
    });
    Document::new(sentences)
}

fn help_text() -> String {
    format!(
        "timexer {version}

Rule-driven TIMEX recogniser and normaliser (debug CLI).

Usage:
  timexer [OPTIONS] [--] <word/POS ...>
  timexer [OPTIONS] --input <text>
  timexer [OPTIONS] < sentences.txt

Input is one sentence per line, each token written as word/POS:
  He/PRP left/VBD last/JJ Friday/NNP ./.

Options:
  -i, --input <text>         Input text. If omitted, reads remaining args
                             or stdin when no args are provided.
  --rules <dir>              Rule directory holding recognition/ and
                             normalisation/. Default: {default_rules}
  --dct <timestamp>          Document creation time (2010-08-04,
                             20100804, 2010-08-04T10:00).
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}                Log filter, e.g. timexer=debug. Default: warn

Exit codes:
  0  Success.
  1  Rules failed to load.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        default_rules = DEFAULT_RULES,
        log_env = LOG_ENV,
    )
}
