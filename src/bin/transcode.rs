//! Command line front end of the property value transcoder.
//!
//! ```text
//! $ echo -n Hi | transcode encode --encoding BASE64
//! SGk=
//! $ transcode decode-string --encoding BASE64 --charset latin1 <<< Y2Fm6Q==
//! café
//! ```

use std::{
    fs::File,
    io::{Read, Write, stdin, stdout},
    path::PathBuf,
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use ical_encoding::{
    EncodingProvider, MalformedPolicy, SerializationContext, Transcoder, TranscoderOptions,
};
use log::{LevelFilter, Log, Metadata, Record};

#[derive(Debug, Parser)]
#[command(
    version,
    name = "transcode",
    about = "Convert iCalendar/vCard property payloads between bytes and their 7BIT, 8BIT or BASE64 text form."
)]
struct CmdArgs {
    #[command(subcommand)]
    command: Command,
    /// replace malformed byte sequences with U+FFFD instead of failing
    #[arg(long, global = true)]
    lossy: bool,
    /// reject whitespace inside BASE64 text
    #[arg(long, global = true)]
    strict_base64: bool,
    /// print diagnostics on stderr (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// turn raw bytes into the text form of a transfer encoding
    Encode {
        /// 7BIT, 8BIT or BASE64
        #[arg(short, long)]
        encoding: String,
        /// read from this file instead of stdin
        input: Option<PathBuf>,
    },
    /// turn the text form of a transfer encoding back into raw bytes
    DecodeData {
        #[arg(short, long)]
        encoding: String,
        input: Option<PathBuf>,
    },
    /// like decode-data, then read the bytes as text in a charset
    DecodeString {
        #[arg(short, long)]
        encoding: String,
        /// charset of the decoded bytes
        #[arg(short, long, default_value = "UTF-8")]
        charset: String,
        input: Option<PathBuf>,
    },
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn read_input(input: Option<&PathBuf>) -> anyhow::Result<Vec<u8>> {
    let mut buf = vec![];
    match input {
        Some(path) => {
            File::open(path)
                .and_then(|mut file| file.read_to_end(&mut buf))
                .with_context(|| format!("failed to read {}", path.display()))?;
        }
        None => {
            stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
        }
    }
    Ok(buf)
}

/// Text input with a single trailing line break removed, as left behind by `echo` or here-strings.
fn read_text(input: Option<&PathBuf>) -> anyhow::Result<String> {
    let mut text = String::from_utf8(read_input(input)?).context("input is not UTF-8")?;
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(text)
}

fn main() -> anyhow::Result<()> {
    let args = CmdArgs::parse();
    init_logger(args.verbose);

    let policy = if args.lossy {
        MalformedPolicy::Replace
    } else {
        MalformedPolicy::Strict
    };
    let options = TranscoderOptions::default()
        .with_malformed(policy)
        .with_base64_whitespace(!args.strict_base64);
    log::debug!("{options:?}");

    let ctx = SerializationContext::new();
    let transcoder = Transcoder::with_options(ctx.encoding_stack(), options);

    let mut out = stdout().lock();
    match &args.command {
        Command::Encode { encoding, input } => {
            let encoding = encoding.as_str();
            let data = read_input(input.as_ref())?;
            let Some(text) = transcoder.encode(Some(encoding), Some(data.as_slice())) else {
                bail!("cannot encode the input as {encoding}");
            };
            writeln!(out, "{text}")?;
        }
        Command::DecodeData { encoding, input } => {
            let encoding = encoding.as_str();
            let text = read_text(input.as_ref())?;
            let Some(data) = transcoder.decode_data(Some(encoding), Some(text.as_str())) else {
                bail!("the input is not valid {encoding} text");
            };
            out.write_all(&data)?;
        }
        Command::DecodeString {
            encoding,
            charset,
            input,
        } => {
            ctx.encoding_stack()
                .borrow_mut()
                .push_by_name(charset)
                .with_context(|| format!("unsupported charset {charset}"))?;
            let (encoding, text) = (encoding.as_str(), read_text(input.as_ref())?);
            let Some(decoded) = transcoder.decode_string(Some(encoding), Some(text.as_str()))? else {
                bail!("the input is not valid {encoding} text in {charset}");
            };
            writeln!(out, "{decoded}")?;
        }
    }
    out.flush()?;
    Ok(())
}
