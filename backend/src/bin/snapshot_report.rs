//! Print dashboard figures for exported `users`/`transactions` snapshots.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::{self, Write};
use std::path::PathBuf;

use broker_admin::domain::{DEFAULT_RECENT_LIMIT, KindFilter, SearchQuery};
use broker_admin::snapshot_report::{SnapshotSource, build_report};
use clap::Parser;

/// `snapshot-report` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "snapshot-report",
    about = "Normalize exported broker snapshots and print dashboard figures",
    version
)]
struct CliArgs {
    /// Database root export holding both collections.
    #[arg(long = "tree", value_name = "path", conflicts_with_all = ["users", "transactions"])]
    tree: Option<PathBuf>,
    /// Export of the `users` collection.
    #[arg(long = "users", value_name = "path", required_unless_present = "tree")]
    users: Option<PathBuf>,
    /// Export of the `transactions` collection.
    #[arg(long = "transactions", value_name = "path")]
    transactions: Option<PathBuf>,
    /// Case-insensitive search term applied to users and transactions.
    #[arg(long = "search", value_name = "term", default_value = "")]
    search: String,
    /// Transaction kind to keep: all, deposit, withdrawal, profit or investment.
    #[arg(long = "type", value_name = "kind", default_value = "all")]
    kinds: KindFilter,
    /// Number of entries in each recent list.
    #[arg(long = "limit", value_name = "n", default_value_t = DEFAULT_RECENT_LIMIT)]
    limit: usize,
}

impl CliArgs {
    fn source(&self) -> io::Result<SnapshotSource> {
        match (&self.tree, &self.users) {
            (Some(tree), _) => Ok(SnapshotSource::Tree(tree.clone())),
            (None, Some(users)) => Ok(SnapshotSource::Collections {
                users: users.clone(),
                transactions: self.transactions.clone(),
            }),
            (None, None) => Err(io::Error::other("either --tree or --users is required")),
        }
    }
}

fn main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let raw = args.source()?.load().map_err(io::Error::other)?;
    let report = build_report(&raw, &SearchQuery::new(&args.search), args.kinds, args.limit);

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|error| io::Error::other(format!("encode report: {error}")))?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}")
}
