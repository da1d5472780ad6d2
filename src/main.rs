mod aggregate;
mod cache;
mod config;
mod dashboard;
mod error;
mod github;
mod join;
mod logging;
mod output;
mod pagination;
#[cfg(test)]
mod testutil;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::aggregate::IssueRef;
use crate::cache::{
  Clock, FetchOptions, KvStore, MemoryStore, NoopStore, SqliteStore, SystemClock, TtlCache,
};
use crate::config::Config;
use crate::dashboard::{Dashboard, ViewCallback};
use crate::github::types::IssueType;
use crate::github::GraphQlClient;
use crate::join::JoinedView;

#[derive(Parser, Debug)]
#[command(name = "orgdash")]
#[command(about = "Cached issue dashboard for GitHub organizations")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/orgdash/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// GitHub organization to show
  #[arg(short, long)]
  org: Option<String>,

  /// Print cached data immediately and reprint once GitHub answers
  #[arg(long)]
  swr: bool,

  /// Bypass the cache entirely
  #[arg(long)]
  no_cache: bool,

  /// Cache in memory for this run only
  #[arg(long, conflicts_with = "no_cache")]
  no_persist: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Issues across the organization with their board status
  Issues,
  /// Project boards and the issues on them
  Boards,
  /// The organization's issue types
  Types,
  /// One issue with its timeline, as owner/repo#number
  Issue { issue: IssueRef },
  /// The joined view last computed for the organization, without fetching
  Snapshot,
  /// Drop one cache key, or every key of the organization
  Invalidate { key: Option<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _guard = logging::init_logging(&config.log)?;

  let store = open_store(&config, &args);
  let clock: Arc<dyn Clock> = Arc::new(SystemClock);
  let cache = TtlCache::new(store, clock);

  // Offline commands still build a client, they just never call it.
  let offline = matches!(args.command, Command::Snapshot | Command::Invalidate { .. });
  let token = if offline {
    Config::get_api_token().unwrap_or_default()
  } else {
    Config::get_api_token()?
  };
  let client = GraphQlClient::new(config.github.endpoint()?, token)?;
  let dashboard = Dashboard::new(Arc::new(client), cache, &config);

  let org = || {
    args
      .org
      .clone()
      .or_else(|| config.default_org.clone())
      .ok_or_else(|| eyre!("No organization given. Pass --org or set default_org in the config file."))
  };

  match args.command {
    Command::Issues => {
      let org = org()?;
      let (tx, rx) = mpsc::unbounded_channel();
      let on_view: Option<ViewCallback> = args.swr.then(|| {
        let callback: ViewCallback = Arc::new(move |view: JoinedView| {
          let _ = tx.send(view);
        });
        callback
      });

      let loaded = dashboard.load(&org, args.swr, on_view).await?;
      if loaded.sources.any_stale() {
        println!("(showing cached data, refreshing)\n");
      }
      print!("{}", output::render_view(&loaded.view));
      println!(
        "{} boards, {} issue types",
        loaded.boards.boards.len(),
        loaded.issue_types.len()
      );
      print_updates(rx, output::render_view).await;
      loaded.snapshot.finished().await;
    }
    Command::Boards => {
      let org = org()?;
      let (options, rx) = update_options(args.swr);
      let result = dashboard.boards().fetch(&org, options).await?;
      println!("{}\n", output::source_line(result.source, result.cached_at));
      print!("{}", output::render_boards(&result.data));
      print_updates(rx, output::render_boards).await;
    }
    Command::Types => {
      let org = org()?;
      let (options, rx) = update_options(args.swr);
      let result = dashboard.issue_types().fetch(&org, options).await?;
      println!("{}\n", output::source_line(result.source, result.cached_at));
      print!("{}", output::render_issue_types(&result.data));
      print_updates(rx, |types: &Vec<IssueType>| output::render_issue_types(types)).await;
    }
    Command::Issue { issue } => {
      let (options, rx) = update_options(args.swr);
      let result = dashboard.issue(&issue, options).await?;
      println!("{}\n", output::source_line(result.source, result.cached_at));
      print!("{}", output::render_issue(&result.data));
      print_updates(rx, output::render_issue).await;
    }
    Command::Snapshot => {
      let org = org()?;
      match dashboard.last_snapshot(&org).await {
        Some(entry) => {
          println!(
            "snapshot stored at {}\n",
            entry.stored_at.format("%Y-%m-%d %H:%M UTC")
          );
          print!("{}", output::render_view(&entry.value));
        }
        None => println!("No snapshot cached for {}", org),
      }
    }
    Command::Invalidate { key: Some(key) } => {
      dashboard.invalidate(&key).await;
      println!("Invalidated {}", key);
    }
    Command::Invalidate { key: None } => {
      let org = org()?;
      dashboard.invalidate_org(&org).await;
      println!("Invalidated cached data for {}", org);
    }
  }

  Ok(())
}

fn open_store(config: &Config, args: &Args) -> Arc<dyn KvStore> {
  if args.no_cache || !config.cache.enabled {
    info!("cache disabled");
    return Arc::new(NoopStore);
  }
  if args.no_persist {
    return Arc::new(MemoryStore::new());
  }

  match SqliteStore::open(config.cache.path.as_deref()) {
    Ok(store) => Arc::new(store),
    Err(e) => {
      warn!(error = %e, "cache database unavailable, continuing without cache");
      Arc::new(NoopStore)
    }
  }
}

/// SWR options wired to a channel, or plain read-through.
fn update_options<T: Send + 'static>(
  swr: bool,
) -> (FetchOptions<T>, mpsc::UnboundedReceiver<T>) {
  let (tx, rx) = mpsc::unbounded_channel();
  let options = if swr {
    FetchOptions::swr().on_update(move |value: T| {
      let _ = tx.send(value);
    })
  } else {
    FetchOptions::read_through()
  };
  (options, rx)
}

/// Reprint every refreshed value until no refresh can still report.
async fn print_updates<T>(mut rx: mpsc::UnboundedReceiver<T>, render: impl Fn(&T) -> String) {
  while let Some(value) = rx.recv().await {
    println!("\n(refreshed)\n");
    print!("{}", render(&value));
  }
}
