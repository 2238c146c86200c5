//! Convert command - flatten a Bioindex document into tables.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use bioindex::export::write_document;
use bioindex::{
    Bioindex, ConvertConfig, Converter, DelimitedSink, Delimiter, ExportSink, JsonSink, Locale,
    ResolverConfig,
};
use colored::Colorize;

use crate::cli::OutputFormat;

pub struct ConvertArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub resolve_taxonomies: bool,
    pub taxonomy_url: String,
    pub strict_resolution: bool,
    pub format: Option<OutputFormat>,
    pub locale: Locale,
    pub timeout: u64,
    pub batch_size: usize,
    pub concurrency: usize,
    pub stdout_json: bool,
    pub verbose: bool,
}

pub fn run(args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input.exists() {
        return Err(format!("Input file not found: {}", args.input.display()).into());
    }

    // Status lines go to stderr when the document itself goes to stdout
    let status = |line: String| {
        if args.stdout_json {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    };

    status(format!(
        "{} {}",
        "Converting".cyan().bold(),
        args.input.display().to_string().white()
    ));

    let bioindex = Bioindex::from_path(&args.input)?;

    let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
    let config = ConvertConfig::default()
        .with_resolve_taxonomies(args.resolve_taxonomies)
        .with_taxonomy_url(args.taxonomy_url)
        .with_strict_resolution(args.strict_resolution)
        .with_resolver(
            ResolverConfig::default()
                .with_batch_size(args.batch_size)
                .with_concurrency(args.concurrency)
                .with_timeout(timeout),
        );
    config.validate()?;

    if args.verbose {
        status(format!("  Samples: {}", bioindex.results.len()));
        if config.resolve_taxonomies {
            status(format!("  Taxonomy service: {}", config.taxonomy_url));
        }
    }

    let converter = Converter::with_config(config);
    let runtime = tokio::runtime::Runtime::new()?;
    let conversion = runtime.block_on(converter.convert(bioindex))?;

    for warning in &conversion.warnings {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }

    if let Some(ref report) = conversion.resolution {
        status(format!(
            "  Taxa resolved: {}/{}",
            report.resolved.to_string().green(),
            report.requested
        ));
    }

    if args.stdout_json {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write_document(&conversion.tables, args.locale, &mut handle)?;
        writeln!(handle)?;
        return Ok(());
    }

    let output = args
        .output
        .ok_or("OUTPUT is required unless --stdout-json is given")?;
    let format = args
        .format
        .unwrap_or_else(|| OutputFormat::from_path(&output));

    let mut sink: Box<dyn ExportSink> = match format {
        OutputFormat::Json => Box::new(JsonSink::new(&output).with_locale(args.locale)),
        OutputFormat::Tsv => {
            Box::new(DelimitedSink::new(&output, Delimiter::Tab).with_locale(args.locale))
        }
        OutputFormat::Csv => {
            Box::new(DelimitedSink::new(&output, Delimiter::Comma).with_locale(args.locale))
        }
    };
    conversion.export(sink.as_mut())?;

    let tables = &conversion.tables;
    println!();
    println!("{}", "Tables:".yellow().bold());
    println!("  by_sample:             {}", tables.by_sample.len());
    println!("  by_dimension:          {}", tables.by_dimension.len());
    println!("  by_process:            {}", tables.by_process.len());
    println!("  diversity:             {}", tables.diversity.len());
    println!(
        "  community_composition: {}",
        tables.community_composition.len()
    );
    if args.verbose {
        println!("  Digest: {}", tables.digest()?);
    }
    println!();
    println!(
        "{} {} ({})",
        "Saved to".green().bold(),
        output.display().to_string().cyan(),
        format
    );

    Ok(())
}
