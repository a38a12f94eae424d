//! layoutdoc CLI - inspect layout-analysis block lists

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use layoutdoc::{
    load_file_with_options, render, BlockType, Document, EntityType, FilterOptions, JsonFormat,
    PageSelection, ParseOptions, RenderOptions, TableFallback,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "layoutdoc")]
#[command(author = "iyulab")]
#[command(version)]
#[command(
    about = "Turn layout-analysis block lists into text, Markdown, and JSON",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads an input file.
#[derive(Args)]
struct InputArgs {
    /// Block-list JSON file (one document or an array of documents)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Skip malformed blocks and key/value pairs instead of failing
    #[arg(long, env = "LAYOUTDOC_LENIENT")]
    lenient: bool,

    /// Drop lines, words and fields below this confidence (0-100)
    #[arg(long, value_name = "SCORE", default_value = "0")]
    threshold: f64,

    /// Keep lines in relationship order instead of reading order
    #[arg(long)]
    raw_order: bool,
}

impl InputArgs {
    fn load(&self) -> Result<Vec<Document>, Box<dyn std::error::Error>> {
        let mut options = ParseOptions::new().with_confidence_threshold(self.threshold);
        if self.lenient {
            options = options.lenient();
        }
        if self.raw_order {
            options = options.relationship_order();
        }
        let docs = load_file_with_options(&self.input, options)?;
        log::debug!("Loaded {} document(s) from {}", docs.len(), self.input.display());
        Ok(docs)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print plain text
    Text {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Render Markdown
    #[command(alias = "md")]
    Markdown {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include YAML frontmatter
        #[arg(short, long)]
        frontmatter: bool,

        /// Table rendering mode for tables with spanning cells
        #[arg(long, value_enum, default_value = "markdown")]
        table_mode: TableMode,

        /// Leave out key/value fields
        #[arg(long)]
        no_forms: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Export the document model as JSON
    Json {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        #[command(flatten)]
        input: InputArgs,
    },

    /// List key/value fields, optionally only those matching a key
    Fields {
        #[command(flatten)]
        input: InputArgs,

        /// Key to search for (exact, then case-insensitive)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// List blocks matching a filter
    Filter {
        #[command(flatten)]
        input: InputArgs,

        /// Minimum confidence (0-100)
        #[arg(long, default_value = "0")]
        min_confidence: f64,

        /// Accepted block type (repeatable), e.g. LINE, key-value-set
        #[arg(long = "type", value_name = "TYPE")]
        block_types: Vec<BlockType>,

        /// Accepted entity type (repeatable), e.g. KEY, COLUMN_HEADER
        #[arg(long = "entity", value_name = "ENTITY", value_parser = parse_entity_type)]
        entity_types: Vec<EntityType>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TableMode {
    /// Markdown tables; spanned positions are left empty
    Markdown,
    /// HTML tables with rowspan/colspan
    Html,
}

impl From<TableMode> for TableFallback {
    fn from(mode: TableMode) -> Self {
        match mode {
            TableMode::Markdown => TableFallback::Markdown,
            TableMode::Html => TableFallback::Html,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Text {
            input,
            output,
            pages,
        } => cmd_text(&input, output.as_deref(), pages.as_deref()),
        Commands::Markdown {
            input,
            output,
            frontmatter,
            table_mode,
            no_forms,
            pages,
        } => cmd_markdown(
            &input,
            output.as_deref(),
            frontmatter,
            table_mode,
            no_forms,
            pages.as_deref(),
        ),
        Commands::Json {
            input,
            output,
            compact,
        } => cmd_json(&input, output.as_deref(), compact),
        Commands::Info { input } => cmd_info(&input),
        Commands::Fields { input, key } => cmd_fields(&input, key.as_deref()),
        Commands::Filter {
            input,
            min_confidence,
            block_types,
            entity_types,
        } => cmd_filter(&input, min_confidence, block_types, entity_types),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Accepts wire names in any case, with `-` for `_`.
fn parse_entity_type(s: &str) -> Result<EntityType, String> {
    let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
    if normalized.is_empty() {
        return Err("entity type cannot be empty".to_string());
    }
    Ok(EntityType::from(normalized.as_str()))
}

fn page_selection(pages: Option<&str>) -> Result<PageSelection, String> {
    match pages {
        Some(p) => PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e)),
        None => Ok(PageSelection::All),
    }
}

/// Join per-document outputs, with a separator when the input held several.
fn join_documents(parts: Vec<String>) -> String {
    if parts.len() <= 1 {
        return parts.into_iter().next().unwrap_or_default();
    }
    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| format!("<!-- document {} -->\n\n{}", i + 1, part))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn write_output(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_text(input: &InputArgs, output: Option<&Path>, pages: Option<&str>) -> CliResult {
    let render_options = RenderOptions::new().with_pages(page_selection(pages)?);

    let parts = input
        .load()?
        .iter()
        .map(|doc| render::to_text(doc, &render_options))
        .collect::<layoutdoc::Result<Vec<_>>>()?;

    write_output(output, &join_documents(parts))
}

fn cmd_markdown(
    input: &InputArgs,
    output: Option<&Path>,
    frontmatter: bool,
    table_mode: TableMode,
    no_forms: bool,
    pages: Option<&str>,
) -> CliResult {
    let render_options = RenderOptions::new()
        .with_frontmatter(frontmatter)
        .with_table_fallback(table_mode.into())
        .with_forms(!no_forms)
        .with_pages(page_selection(pages)?);

    let parts = input
        .load()?
        .iter()
        .map(|doc| render::to_markdown(doc, &render_options))
        .collect::<layoutdoc::Result<Vec<_>>>()?;

    write_output(output, &join_documents(parts))
}

fn cmd_json(input: &InputArgs, output: Option<&Path>, compact: bool) -> CliResult {
    let docs = input.load()?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = if docs.len() == 1 {
        render::to_json(&docs[0], format)?
    } else {
        let values = docs
            .iter()
            .map(render::to_json_value)
            .collect::<layoutdoc::Result<Vec<_>>>()?;
        let array = serde_json::Value::Array(values);
        match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(&array)?,
            JsonFormat::Compact => serde_json::to_string(&array)?,
        }
    };

    write_output(output, &json)
}

fn cmd_info(input: &InputArgs) -> CliResult {
    let docs = input.load()?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.input.display());
    println!("{}: {}", "Documents".bold(), docs.len());

    for (i, doc) in docs.iter().enumerate() {
        println!();
        if docs.len() > 1 {
            println!("{}", format!("Document {}", i + 1).cyan().bold());
            println!("{}", "─".repeat(40).dimmed());
        }

        println!("{}: {}", "Pages".bold(), doc.page_count());
        println!("{}: {}", "Blocks".bold(), doc.block_count());
        if let Some(version) = &doc.metadata().model_version {
            println!("{}: {}", "Model".bold(), version);
        }

        let pages = doc.pages();
        let lines: usize = pages.iter().map(|p| p.lines().len()).sum();
        let words: usize = pages.iter().map(|p| p.words().len()).sum();
        let tables: usize = pages.iter().map(|p| p.tables().len()).sum();
        let fields: usize = pages
            .iter()
            .flat_map(|p| p.forms())
            .map(|f| f.fields().len())
            .sum();
        let checkboxes: usize = pages
            .iter()
            .flat_map(|p| p.forms())
            .map(|f| f.selection_elements().len())
            .sum();

        println!("{}: {}", "Lines".bold(), lines);
        println!("{}: {}", "Words".bold(), words);
        println!("{}: {}", "Tables".bold(), tables);
        println!("{}: {}", "Fields".bold(), fields);
        println!("{}: {}", "Checkboxes".bold(), checkboxes);
        println!("{}: {}", "Queries".bold(), doc.queries().len());
    }

    Ok(())
}

fn cmd_fields(input: &InputArgs, key: Option<&str>) -> CliResult {
    let docs = input.load()?;
    let mut count = 0;

    for doc in &docs {
        let fields = match key {
            Some(key) => doc.find_key_value_pairs(key),
            None => doc
                .pages()
                .into_iter()
                .flat_map(|page| page.forms())
                .flat_map(|form| form.fields())
                .collect(),
        };

        for field in fields {
            let mut value = field.value_text().to_string();
            if let Some(element) = field.selection_element() {
                let mark = if element.is_selected() { "[x]" } else { "[ ]" };
                value = format!("{} {}", mark, value).trim_end().to_string();
            }
            println!(
                "{} {}: {} {}",
                format!("p{}", field.form().page().number()).dimmed(),
                field.key_text().bold(),
                value,
                format!("({:.1})", field.confidence()).dimmed()
            );
            count += 1;
        }
    }

    if count == 0 {
        println!("{}", "No matching fields".yellow());
    }
    Ok(())
}

fn cmd_filter(
    input: &InputArgs,
    min_confidence: f64,
    block_types: Vec<BlockType>,
    entity_types: Vec<EntityType>,
) -> CliResult {
    let filter = FilterOptions {
        min_confidence,
        block_types,
        entity_types,
    };

    let mut count = 0;
    for doc in input.load()? {
        for block in doc.filter_blocks(&filter) {
            println!(
                "{}\t{}\t{:.1}\t{}",
                block.id,
                block.block_type.to_string().cyan(),
                block.confidence,
                block.text().replace('\n', " ")
            );
            count += 1;
        }
    }

    println!("\n{} {} blocks", "Matched".green().bold(), count);
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "layoutdoc".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Layout-analysis document model tool");
    println!();
    println!(
        "Repository: {}",
        "https://github.com/iyulab/layoutdoc".dimmed()
    );
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_entity_type() {
        assert_eq!(parse_entity_type("key").unwrap(), EntityType::Key);
        assert_eq!(
            parse_entity_type("column-header").unwrap(),
            EntityType::ColumnHeader
        );
        assert!(parse_entity_type(" ").is_err());
    }

    #[test]
    fn test_join_documents() {
        assert_eq!(join_documents(vec![]), "");
        assert_eq!(join_documents(vec!["a".into()]), "a");
        assert_eq!(
            join_documents(vec!["a".into(), "b".into()]),
            "<!-- document 1 -->\n\na\n\n<!-- document 2 -->\n\nb"
        );
    }

    #[test]
    fn test_load_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(
            &path,
            r#"{"Blocks": [{"Id": "p1", "BlockType": "PAGE", "Page": 1}]}"#,
        )
        .unwrap();

        let cli = Cli::parse_from([
            "layoutdoc",
            "filter",
            path.to_str().unwrap(),
            "--type",
            "page",
            "--entity",
            "key",
        ]);
        match cli.command {
            Commands::Filter {
                input,
                block_types,
                entity_types,
                ..
            } => {
                assert_eq!(block_types, vec![BlockType::Page]);
                assert_eq!(entity_types, vec![EntityType::Key]);
                assert_eq!(input.load().unwrap().len(), 1);
            }
            _ => panic!("expected filter command"),
        }
    }
}
