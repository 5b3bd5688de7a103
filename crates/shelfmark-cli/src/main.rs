use anyhow::{Context, Result, bail};
use shelfmark_config::Config;
use shelfmark_engine::{
    BannerPolicy, BookmarkCoordinator, BookmarkId, BookmarkListAdapter, BookmarkStore,
    MemoryBookmarkStore, MemoryOfflineStore, OfflinePageStore, RenderSink, RowKind,
    StorageSpacePolicy, TaskRunner, io,
};
use std::{env, path::PathBuf, process, rc::Rc};

#[derive(Debug, Clone, PartialEq, Eq)]
enum View {
    All,
    Folder(String),
    Offline,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    seed_path: Option<PathBuf>,
    view: View,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut rest = args;
    let mut seed_path = None;
    if let Some(first) = rest.first()
        && !matches!(first.as_str(), "all" | "folder" | "offline")
    {
        seed_path = Some(PathBuf::from(first));
        rest = &rest[1..];
    }

    let view = match rest {
        [] => View::All,
        [view] if view == "all" => View::All,
        [view] if view == "offline" => View::Offline,
        [view, title] if view == "folder" => View::Folder(title.clone()),
        _ => bail!("unrecognised arguments: {}", rest.join(" ")),
    };
    Ok(Args { seed_path, view })
}

/// Logs render signals; rows are printed once the queue drains
struct LoggingSink;

impl RenderSink for LoggingSink {
    fn full_reset(&self) {
        log::debug!("list reset");
    }

    fn item_changed_at(&self, position: usize) {
        log::debug!("row {position} changed");
    }

    fn item_removed_at(&self, position: usize) {
        log::debug!("row {position} removed");
    }
}

/// Depth-first search for a folder by title, starting at the root
fn find_folder(store: &MemoryBookmarkStore, title: &str) -> Option<BookmarkId> {
    let mut pending = vec![store.root_folder_id()];
    while let Some(folder) = pending.pop() {
        let children = store.child_ids(folder, true, false);
        if let Some(found) = children.iter().copied().find(|child| {
            store
                .get_bookmark_by_id(*child)
                .is_some_and(|item| item.title == title)
        }) {
            return Some(found);
        }
        pending.extend(children.into_iter().rev());
    }
    None
}

fn print_rows(adapter: &BookmarkListAdapter, store: &dyn BookmarkStore) {
    for position in 0..adapter.total_count() {
        let kind = adapter.row_kind_at(position);
        let item = adapter
            .bookmark_at(position)
            .and_then(|id| store.get_bookmark_by_id(id));
        match (kind, item) {
            (RowKind::Folder, Some(item)) => println!("{position:>3}  [folder]  {}", item.title),
            (RowKind::Bookmark, Some(item)) => {
                println!("{position:>3}  {}  <{}>", item.title, item.url)
            }
            (RowKind::PromoBanner, _) => println!("{position:>3}  == sign in to sync your bookmarks =="),
            (RowKind::StorageBanner, _) => println!("{position:>3}  == offline pages are using a lot of space =="),
            (RowKind::Divider, _) => println!("{position:>3}  ----"),
            (kind, None) => println!("{position:>3}  {kind:?} (missing)"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("shelfmark-cli");
    let usage = format!("Usage: {program} [seed-file] [all | folder <title> | offline]");

    let cli = match parse_args(args.get(1..).unwrap_or_default()) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{usage}");
            process::exit(1);
        }
    };

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(Some(config)) => {
            log::info!("Loaded config from {}", config_path.display());
            config
        }
        Ok(None) => {
            log::info!("No config file at {}, using defaults", config_path.display());
            Config::default()
        }
        Err(e) => {
            log::error!("Config::load() failed with error: {e}");
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let Some(seed_path) = cli.seed_path.or(config.seed_path.clone()) else {
        eprintln!("Error: No seed file provided and none configured");
        eprintln!("{usage}");
        eprintln!("Or set seed_path in {}", config_path.display());
        process::exit(1);
    };

    let seed = io::load_seed(&seed_path)
        .with_context(|| format!("loading seed file {}", seed_path.display()))?;
    let runner = TaskRunner::new();
    let store = Rc::new(MemoryBookmarkStore::new());
    let offline = Rc::new(MemoryOfflineStore::new(runner.clone()));
    seed.populate(&store, &offline)
        .with_context(|| format!("populating from {}", seed_path.display()))?;

    let offline_store: Option<Rc<dyn OfflinePageStore>> = if config.offline_pages_enabled {
        Some(offline.clone())
    } else {
        log::info!("Offline pages disabled by config");
        None
    };
    let coordinator = Rc::new(BookmarkCoordinator::new(
        store.clone(),
        offline_store,
        runner.clone(),
    ));
    let policy: Rc<dyn BannerPolicy> = Rc::new(StorageSpacePolicy::new(
        offline.clone(),
        config.storage_warning_bytes,
        config.show_promo,
    ));
    let adapter = BookmarkListAdapter::new(coordinator.clone(), policy, Rc::new(LoggingSink));

    match &cli.view {
        View::All => adapter.show_all_bookmarks(),
        View::Folder(title) => {
            let folder = find_folder(&store, title)
                .with_context(|| format!("no folder titled {title:?}"))?;
            adapter.show_folder(folder);
        }
        View::Offline => {
            if !coordinator.is_offline_enabled() {
                bail!("offline pages are disabled in {}", config_path.display());
            }
            adapter.show_offline_filter();
        }
    }

    let tasks = runner.run_until_idle();
    log::debug!("ran {tasks} queued tasks");

    print_rows(&adapter, &*store);
    Ok(())
}
