//! httpsify CLI
//!
//! CLI tool for building rule collections, exporting flattened host lists
//! and rewriting URLs.

mod hosts;
mod sources;

use std::io::{self, BufRead};
use std::path::Path;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};

use hs_compiler::{LoadOptions, Precedence, DEFAULT_PRELOAD_URL};
use hs_core::RuleCollection;

#[derive(Parser)]
#[command(name = "hs-cli")]
#[command(about = "httpsify rule loader and URL rewriter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// HTTPS Everywhere rulesets: a directory of *.xml / *.json files or one file
    #[arg(long)]
    rulesets: Option<String>,

    /// HSTS preload list: a local file or an http(s) URL. Without a value,
    /// Chromium's published list is fetched
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_PRELOAD_URL)]
    preload: Option<String>,

    /// Also load rulesets marked default_off
    #[arg(long)]
    include_disabled: bool,

    /// Let rulesets override preload entries for the same host
    #[arg(long)]
    rulesets_win: bool,
}

impl SourceArgs {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            include_disabled: self.include_disabled,
            precedence: if self.rulesets_win {
                Precedence::RulesetsWin
            } else {
                Precedence::PreloadWins
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write the flattened simple host lists
    Generate {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output file for exact-match hosts
        #[arg(long)]
        domains_out: String,

        /// Output file for hosts covering all subdomains
        #[arg(long)]
        subdomains_out: String,
    },

    /// Rewrite URLs (from arguments, or stdin lines when none are given)
    Rewrite {
        #[command(flatten)]
        sources: SourceArgs,

        /// Also print whether a rule fired
        #[arg(short, long)]
        verbose: bool,

        /// URLs to rewrite
        urls: Vec<String>,
    },

    /// Dump collection info
    Info {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            sources,
            domains_out,
            subdomains_out,
        } => cmd_generate(&sources, &domains_out, &subdomains_out),
        Commands::Rewrite {
            sources,
            verbose,
            urls,
        } => cmd_rewrite(&sources, &urls, verbose),
        Commands::Info { sources } => cmd_info(&sources),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load(sources: &SourceArgs) -> Result<RuleCollection, String> {
    let start = Instant::now();
    let collection = sources::build_collection(
        sources.rulesets.as_deref(),
        sources.preload.as_deref(),
        &sources.load_options(),
    )?;
    log::info!("Built collection in {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    Ok(collection)
}

fn cmd_generate(sources: &SourceArgs, domains_out: &str, subdomains_out: &str) -> Result<(), String> {
    let collection = load(sources)?;

    let subdomain_hosts = collection.simple_subdomain_hosts();
    let hosts = collection.simple_hosts();
    hosts::write_hosts_file(Path::new(subdomains_out), &subdomain_hosts)?;
    hosts::write_hosts_file(Path::new(domains_out), &hosts)?;

    println!("Generated host lists");
    println!("  Hosts:       {} -> '{}'", hosts.len(), domains_out);
    println!("  Subdomains:  {} -> '{}'", subdomain_hosts.len(), subdomains_out);

    Ok(())
}

fn cmd_rewrite(sources: &SourceArgs, urls: &[String], verbose: bool) -> Result<(), String> {
    let collection = load(sources)?;

    let emit = |url: &str| {
        let result = collection.rewrite(url);
        if verbose {
            let state = if result.matched { "matched" } else { "unmatched" };
            println!("{}\t{}\t{}", url, result.url, state);
        } else {
            println!("{}", result.url);
        }
    };

    if !urls.is_empty() {
        for url in urls {
            emit(url.as_str());
        }
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| format!("Failed to read stdin: {}", e))?;
        let url = line.trim();
        if !url.is_empty() {
            emit(url);
        }
    }

    Ok(())
}

fn cmd_info(sources: &SourceArgs) -> Result<(), String> {
    let collection = load(sources)?;
    let stats = collection.stats();

    println!("Rule Collection:");
    println!("  Exact simple:        {}", stats.exact_simple);
    println!("  Subdomain simple:    {}", stats.subdomain_simple);
    println!("  Exact custom:        {}", stats.exact_custom);
    println!("  Subdomain custom:    {}", stats.subdomain_custom);
    println!("  Total:               {}", collection.len());
    println!("  Max label depth:     {}", stats.max_label_depth);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_sources(args: &[&str]) -> SourceArgs {
        let argv = ["hs-cli", "info"].iter().chain(args).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Info { sources } => sources,
            _ => panic!("expected info command"),
        }
    }

    #[test]
    fn test_bare_preload_flag_uses_published_list() {
        let sources = info_sources(&["--preload"]);
        assert_eq!(sources.preload.as_deref(), Some(DEFAULT_PRELOAD_URL));
    }

    #[test]
    fn test_preload_flag_with_path() {
        let sources = info_sources(&["--preload", "/tmp/hsts.json", "--rulesets-win"]);
        assert_eq!(sources.preload.as_deref(), Some("/tmp/hsts.json"));
        assert_eq!(sources.load_options().precedence, Precedence::RulesetsWin);
        assert!(info_sources(&[]).preload.is_none());
    }
}
