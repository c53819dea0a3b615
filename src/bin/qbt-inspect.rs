//! qbt-inspect - watch a single torrent's details from the terminal.

use std::env;
use std::sync::Arc;

use console::style;

use qbt_inspect::format::{format_progress, format_size, format_speed, format_timestamp};
use qbt_inspect::{
    InspectConfig, Priority, QbtClient, QualityTier, RefreshEvent, RefreshScheduler,
    SerializedNode, TorrentDataSource, TorrentDetails, TorrentSummary,
};

fn print_usage() {
    eprintln!("Usage: qbt-inspect [OPTIONS] <INFO_HASH>");
    eprintln!();
    eprintln!("Watches one torrent on a qBittorrent WebUI and prints its");
    eprintln!("summary, tracker list and file tree on every refresh.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --url <URL>            WebUI base URL (default from config)");
    eprintln!("  --username <NAME>      WebUI user");
    eprintln!("  --password <PASS>      WebUI password");
    eprintln!("  --quality <TIER>       Refresh cadence: low, medium or high");
    eprintln!("  --once                 Print one snapshot and exit");
    eprintln!("  --set-priority <PRIO>  One-shot: cascade a priority (skip,");
    eprintln!("                         normal, high, max) over --path and exit");
    eprintln!("  --path <PATH>          Tree path for --set-priority; empty for root");
    eprintln!("  --write-config         Save the effective settings and exit");
    eprintln!("  -h, --help             Show this help");
}

struct CliArgs {
    hash: Option<String>,
    quality: Option<QualityTier>,
    once: bool,
    write_config: bool,
    set_priority: Option<Priority>,
    target_path: String,
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut parsed = CliArgs {
        hash: None,
        quality: None,
        once: false,
        write_config: false,
        set_priority: None,
        target_path: String::new(),
        url: None,
        username: None,
        password: None,
    };

    let args: Vec<String> = env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        let take_value = |i: &mut usize| -> Result<String, String> {
            *i += 1;
            args.get(*i)
                .cloned()
                .ok_or_else(|| format!("{} requires a value", args[*i - 1]))
        };
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "--once" => parsed.once = true,
            "--write-config" => parsed.write_config = true,
            "--url" => parsed.url = Some(take_value(&mut i)?),
            "--username" => parsed.username = Some(take_value(&mut i)?),
            "--password" => parsed.password = Some(take_value(&mut i)?),
            "--quality" => parsed.quality = Some(take_value(&mut i)?.parse()?),
            "--set-priority" => parsed.set_priority = Some(take_value(&mut i)?.parse()?),
            "--path" => parsed.target_path = take_value(&mut i)?,
            flag if flag.starts_with('-') => return Err(format!("unknown option: {flag}")),
            hash => {
                if parsed.hash.replace(hash.to_string()).is_some() {
                    return Err("only one info hash may be given".to_string());
                }
            }
        }
        i += 1;
    }
    Ok(parsed)
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Skip => "skip",
        Priority::Normal => "norm",
        Priority::High => "high",
        Priority::Maximum => "max",
    }
}

fn print_node(node: &SerializedNode, depth: usize) {
    let indent = "  ".repeat(depth);
    if node.is_file() {
        println!(
            "{indent}{}  {}  {}  [{}]",
            node.name,
            style(format_size(node.size)).dim(),
            style(format_progress(node.progress)).green(),
            priority_label(node.priority),
        );
    } else {
        let name = if node.name.is_empty() { "." } else { &node.name };
        println!(
            "{indent}{}/  {}  {}",
            style(name).bold().blue(),
            style(format_size(node.size)).dim(),
            style(format_progress(node.progress)).green(),
        );
        for child in &node.children {
            print_node(child, depth + 1);
        }
    }
}

fn print_summary(summary: &TorrentSummary) {
    println!("{}", style(&summary.name).bold());
    println!(
        "  state {}  ratio {:.2}  size {}  added {}",
        summary.state,
        summary.ratio,
        format_size(summary.total_size),
        format_timestamp(summary.added_on),
    );
    println!(
        "  down {} ({})  up {} ({})",
        format_size(summary.downloaded),
        format_speed(summary.dlspeed),
        format_size(summary.uploaded),
        format_speed(summary.upspeed),
    );
    if let Some(done) = summary.completed_on() {
        println!("  completed {}", format_timestamp(done));
    }
}

fn print_snapshot(details: &TorrentDetails) {
    println!();
    if let Some(root) = details.serialized_tree().first() {
        print_node(root, 0);
    }
    if !details.trackers().is_empty() {
        let working = details.trackers().iter().filter(|t| t.is_working()).count();
        println!(
            "  trackers: {}/{} working",
            working,
            details.trackers().len()
        );
    }
}

fn find_node<'a>(node: &'a SerializedNode, path: &str) -> Option<&'a SerializedNode> {
    if node.path == path {
        return Some(node);
    }
    node.children.iter().find_map(|c| find_node(c, path))
}

#[tokio::main]
async fn main() -> qbt_inspect::Result<()> {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("Error: {message}");
            print_usage();
            std::process::exit(2);
        }
    };

    let config_path = InspectConfig::default_path();
    let mut config = if config_path.exists() {
        InspectConfig::load(&config_path)?
    } else {
        InspectConfig::default()
    };
    if let Some(url) = args.url {
        config.webui.url = url;
    }
    if let Some(username) = args.username {
        config.webui.username = username;
    }
    if let Some(password) = args.password {
        config.webui.password = password;
    }
    if let Some(quality) = args.quality {
        config.refresh.quality = quality;
    }

    if args.write_config {
        config.save(&config_path)?;
        println!("Saved config to {}", config_path.display());
        return Ok(());
    }

    let Some(hash) = args.hash else {
        eprintln!("Error: an info hash is required");
        print_usage();
        std::process::exit(2);
    };

    let client = Arc::new(
        QbtClient::connect(
            &config.webui.url,
            &config.webui.username,
            &config.webui.password,
        )
        .await?,
    );

    let summary = client.summary(&hash).await?;
    print_summary(&summary);

    let mut details = TorrentDetails::new(hash);

    // One-shot priority update, no watch loop.
    if let Some(priority) = args.set_priority {
        let initial_content = RefreshEvent::Content {
            tick: 1,
            entries: client.content_entries(details.hash()).await?,
            torrent_progress: summary.progress,
        };
        details.apply(initial_content);

        let root = &details.serialized_tree()[0];
        let Some(node) = find_node(root, &args.target_path) else {
            eprintln!("Error: no node at path '{}'", args.target_path);
            std::process::exit(1);
        };
        let node = node.clone();
        let updated = details.change_priority(&*client, &node, priority).await?;
        println!(
            "Set {} file(s) under '{}' to {}",
            updated,
            if node.path.is_empty() { "." } else { node.path.as_str() },
            priority_label(priority),
        );
        return Ok(());
    }

    let mut scheduler = RefreshScheduler::start(
        client.clone(),
        details.hash().to_string(),
        config.refresh.quality.refresh_interval(),
    );

    let mut got_trackers = false;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                scheduler.stop();
                break;
            }
            event = scheduler.recv() => {
                let Some(event) = event else { break };
                let redraw = matches!(event, RefreshEvent::Content { .. });
                got_trackers |= matches!(event, RefreshEvent::Trackers { .. });
                details.apply(event);
                if redraw && details.has_loaded() {
                    print_snapshot(&details);
                }
                if args.once && details.has_loaded() && got_trackers {
                    scheduler.stop();
                    break;
                }
            }
        }
    }

    Ok(())
}
