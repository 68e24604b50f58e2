use std::path::Path;

use clap::Parser;
use folio::{
    Chapter,
    ContentProvider,
    DataDir,
    LibraryCorpus,
    LibraryDb,
    PersistentHistory,
    QueryEngine,
    SearchQuery,
    Settings,
    TableOfContents,
    TocGenerator,
    config::KEYS,
    corpus::default_name,
    error::{self, Error},
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{
    Cli,
    Command,
    ConfigAction,
    HistoryAction,
    LibraryAction,
    SearchArgs,
    TocAction,
};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("FOLIO_LOG") {
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

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let db = LibraryDb::open(&data_dir.library_db())?;

    match cli.command {
        Command::Library { action } => match action {
            LibraryAction::Add { path, name } => {
                library_add(&db, &path, name.as_deref())?;
            }
            LibraryAction::Remove { name } => library_remove(&db, &name)?,
            LibraryAction::List { json } => library_list(&db, json)?,
        },
        Command::Toc { action } => match action {
            TocAction::Generate { document, json } => {
                toc_generate(&db, &document, json)?;
            }
            TocAction::Show { document, json } => {
                let toc = stored_toc(&db, &document)?;
                print_toc(&toc, json)?;
            }
            TocAction::Locate {
                document,
                position,
                json,
            } => toc_locate(&db, &document, position, json)?,
        },
        Command::Search(args) => cmd_search(&db, &args)?,
        Command::History { action } => history(&db, action)?,
        Command::Config { action } => config(&db, action)?,
        Command::Completions(_) => {}
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> error::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// -- Library --

fn library_add(
    db: &LibraryDb,
    path: &Path,
    name: Option<&str>,
) -> error::Result<()> {
    if !path.is_file() {
        return Err(Error::Config(format!(
            "not a readable file: {}",
            path.display()
        )));
    }

    let abs_path = path.canonicalize().map_err(|e| {
        Error::Config(format!("cannot resolve path {}: {e}", path.display()))
    })?;

    let name = match name {
        Some(name) => {
            if db.get_document(name)?.is_some() {
                return Err(Error::Config(format!(
                    "document '{name}' already exists"
                )));
            }
            name.to_string()
        }
        None => default_name(db, &abs_path)?,
    };

    db.add_document(&name, &abs_path.to_string_lossy())?;
    println!("Added document '{name}' -> {}", abs_path.display());
    Ok(())
}

fn library_remove(db: &LibraryDb, name: &str) -> error::Result<()> {
    if !db.remove_document(name)? {
        return Err(Error::NotFound {
            kind: "document",
            name: name.to_string(),
        });
    }
    println!("Removed document '{name}'");
    Ok(())
}

fn library_list(db: &LibraryDb, json: bool) -> error::Result<()> {
    #[derive(Serialize)]
    struct Entry<'a> {
        name: &'a str,
        path: &'a str,
    }

    let documents = db.list_documents()?;
    if json {
        let entries: Vec<_> = documents
            .iter()
            .map(|(name, path)| Entry { name, path })
            .collect();
        print_json(&entries)?;
    } else if documents.is_empty() {
        println!("No documents registered.");
    } else {
        for (name, path) in &documents {
            println!("{name}\t{path}");
        }
    }
    Ok(())
}

// -- Toc --

fn toc_generate(
    db: &LibraryDb,
    document: &str,
    json: bool,
) -> error::Result<()> {
    let settings = Settings::load(db)?;
    let text = LibraryCorpus::new(db).text(document)?;

    let toc = TocGenerator::new().generate(
        document,
        &text,
        &settings.generation,
    )?;
    db.store_toc(&toc)?;

    tracing::info!(
        document,
        chapters = toc.chapter_count(),
        confidence = toc.overall_confidence,
        "stored table of contents"
    );
    print_toc(&toc, json)
}

fn stored_toc(
    db: &LibraryDb,
    document: &str,
) -> error::Result<TableOfContents> {
    db.load_toc(document)?.ok_or_else(|| Error::NotFound {
        kind: "table of contents",
        name: document.to_string(),
    })
}

fn print_toc(toc: &TableOfContents, json: bool) -> error::Result<()> {
    if json {
        return print_json(toc);
    }

    println!(
        "{} ({}, {} chapters, confidence {:.2})",
        toc.document_id,
        toc.method,
        toc.chapter_count(),
        toc.overall_confidence
    );
    if toc.chapters.is_empty() {
        println!("No chapters detected.");
    }
    print_chapters(&toc.chapters, 0);
    Ok(())
}

fn print_chapters(chapters: &[Chapter], depth: usize) {
    for chapter in chapters {
        let page = chapter
            .page_number
            .map(|p| format!("p.{p}"))
            .unwrap_or_default();
        println!(
            "{:indent$}{}\t{}\t{}\t{:.2}",
            "",
            chapter.title,
            chapter.start_position,
            page,
            chapter.confidence,
            indent = depth * 2
        );
        print_chapters(&chapter.children, depth + 1);
    }
}

fn toc_locate(
    db: &LibraryDb,
    document: &str,
    position: usize,
    json: bool,
) -> error::Result<()> {
    let toc = stored_toc(db, document)?;
    let Some(nav) = toc.navigation_at(position) else {
        return Err(Error::NotFound {
            kind: "chapter at position",
            name: position.to_string(),
        });
    };

    if json {
        #[derive(Serialize)]
        struct Located<'a> {
            previous: Option<&'a Chapter>,
            current: &'a Chapter,
            next: Option<&'a Chapter>,
        }
        // Neighbours are printed without their subtrees.
        let strip = |c: &Chapter| Chapter {
            children: Vec::new(),
            ..c.clone()
        };
        let (previous, current, next) = (
            nav.previous.map(strip),
            strip(nav.current),
            nav.next.map(strip),
        );
        return print_json(&Located {
            previous: previous.as_ref(),
            current: &current,
            next: next.as_ref(),
        });
    }

    if let Some(previous) = nav.previous {
        println!("previous\t{}", previous.title);
    }
    println!("current\t{}", nav.current.title);
    if let Some(next) = nav.next {
        println!("next\t{}", next.title);
    }
    Ok(())
}

// -- Search --

fn cmd_search(db: &LibraryDb, args: &SearchArgs) -> error::Result<()> {
    let settings = Settings::load(db)?;
    let defaults = &settings.search;

    let mut query = SearchQuery::with_defaults(&args.query, defaults);
    query.use_regex |= args.regex;
    query.case_sensitive |= args.case_sensitive;
    query.whole_words |= args.whole_words;
    if args.count.is_some() {
        query.max_results = args.count;
    }
    if !args.documents.is_empty() {
        let selected = select_documents(db, &args.documents)?;
        query.target_document_ids = Some(selected);
    }

    let corpus = LibraryCorpus::new(db);
    let report = QueryEngine::from_defaults(defaults).search(&query, &corpus)?;

    if !args.no_history {
        let mut history = PersistentHistory::load(db, defaults.history_cap)?;
        history.record(&args.query, report.results.len())?;
    }

    if args.json {
        return print_json(&report);
    }

    if report.results.is_empty() {
        println!("No results.");
    }
    for hit in &report.results {
        let page = hit.page.map(|p| format!(" p.{p}")).unwrap_or_default();
        println!(
            "{}:{}{} ({:.3})\t{}",
            hit.document_id, hit.position, page, hit.relevance, hit.snippet
        );
    }
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.document_id, skipped.reason);
    }
    Ok(())
}

/// Registered document names matching any of `patterns`, in library order.
fn select_documents(
    db: &LibraryDb,
    patterns: &[String],
) -> error::Result<Vec<String>> {
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::Glob::new(pattern).map_err(|e| {
            Error::Config(format!("invalid glob pattern: {e}"))
        })?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| Error::Config(format!("invalid glob pattern: {e}")))?;

    let selected: Vec<String> = db
        .list_documents()?
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| set.is_match(name))
        .collect();

    if selected.is_empty() {
        tracing::warn!(?patterns, "no documents match the selection");
    }
    Ok(selected)
}

// -- History --

fn history(db: &LibraryDb, action: HistoryAction) -> error::Result<()> {
    let cap = Settings::load(db)?.search.history_cap;
    let mut history = PersistentHistory::load(db, cap)?;

    match action {
        HistoryAction::List { json } => {
            let entries = history.history().entries();
            if json {
                print_json(entries)?;
            } else if entries.is_empty() {
                println!("No searches recorded.");
            } else {
                for entry in entries {
                    println!(
                        "{}\t{}\t{}",
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        entry.result_count,
                        entry.query
                    );
                }
            }
        }
        HistoryAction::Suggest { prefix } => {
            for suggestion in history.history().suggestions(&prefix) {
                println!("{suggestion}");
            }
        }
        HistoryAction::Remove { query } => {
            if !history.remove(&query)? {
                return Err(Error::NotFound {
                    kind: "history entry",
                    name: query,
                });
            }
            println!("Removed '{query}' from history");
        }
        HistoryAction::Clear => {
            history.clear()?;
            println!("Cleared search history");
        }
    }
    Ok(())
}

// -- Config --

fn config(db: &LibraryDb, action: ConfigAction) -> error::Result<()> {
    match action {
        ConfigAction::Show { json } => {
            let settings = Settings::load(db)?;
            if json {
                return print_json(&settings);
            }
            let stored = db.list_settings()?;
            for key in KEYS {
                let value = stored
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("(default)");
                println!("{key}\t{value}");
            }
            println!(
                "patterns\t{} rules",
                settings.generation.patterns.len()
            );
        }
        ConfigAction::Set { key, value } => {
            Settings::set(db, &key, &value)?;
            println!("Set {key} = {value}");
        }
        ConfigAction::Unset { key } => {
            if !db.remove_setting(&key)? {
                return Err(Error::NotFound {
                    kind: "setting",
                    name: key,
                });
            }
            println!("Reset {key} to its default");
        }
    }
    Ok(())
}
