//! Campaign data browser.
//!
//! Loads a campaign data directory and prints summaries, the location tree,
//! linked prose and label lookups.
//!
//! ```bash
//! cargo run -p campaign -- --data Data tree
//! cargo run -p campaign -- linkify "Old Tom casts Fire Bolt"
//! ```

use campaign_core::config::CONFIG_FILE;
use campaign_core::knowledge_base::KbContent;
use campaign_core::{
    CampaignConfig, CasterType, KnowledgeBase, LocationId, Repository, SpellSlots, StatBlock,
};
use std::path::PathBuf;

/// Parsed command line.
#[derive(Debug, Default)]
struct CliArgs {
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    media_dir: Option<PathBuf>,
    command: Vec<String>,
}

fn parse_args(args: &[String]) -> CliArgs {
    let mut parsed = CliArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if let Some(path) = args.get(i + 1) {
                    parsed.config_path = Some(PathBuf::from(path));
                    i += 1;
                }
            }
            "--data" => {
                if let Some(dir) = args.get(i + 1) {
                    parsed.data_dir = Some(PathBuf::from(dir));
                    i += 1;
                }
            }
            "--media" => {
                if let Some(dir) = args.get(i + 1) {
                    parsed.media_dir = Some(PathBuf::from(dir));
                    i += 1;
                }
            }
            other => parsed.command.push(other.to_string()),
        }
        i += 1;
    }

    parsed
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") || args.len() < 2 {
        print_help();
        return Ok(());
    }
    let cli = parse_args(&args);

    let config_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let mut config = CampaignConfig::load(&config_path).await?.apply_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.media_dir {
        config.media_dir = dir;
    }
    tracing::debug!(?config, "resolved campaign configuration");

    let repo = Repository::load(&config).await?;

    let Some((command, rest)) = cli.command.split_first() else {
        print_help();
        return Ok(());
    };
    match command.as_str() {
        "summary" => print_summary(&repo),
        "tree" => print_tree(&repo),
        "linkify" => {
            let kb = KnowledgeBase::from_repository(&repo);
            println!("{}", kb.linkify(&rest.join(" ")));
        }
        "resolve" => {
            let kb = KnowledgeBase::from_repository(&repo);
            let label = rest.join(" ");
            match kb.resolve(&label) {
                Some(entry) => {
                    println!("{} ({})", entry.name, entry.content.kind());
                    println!("{}", entry.hover_description);
                    if let KbContent::Npc(npc) = &entry.content {
                        if let Some(block) = &npc.stat_block {
                            print_stat_block(block);
                        }
                    }
                }
                None => {
                    eprintln!("Nothing named '{label}'");
                    std::process::exit(1);
                }
            }
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_summary(repo: &Repository) {
    println!("Campaign data: {}", repo.data_dir().display());
    println!("  Spells:        {}", repo.spells().len());
    println!("  Items:         {}", repo.items().len());
    println!("  Class actions: {}", repo.class_actions().len());
    println!("  Conditions:    {}", repo.conditions().len());
    println!("  NPCs:          {}", repo.npcs().len());
    println!("  Locations:     {}", repo.locations().len());

    if !repo.skips().is_empty() {
        println!();
        println!("Skipped records:");
        for skip in repo.skips() {
            println!("  {skip}");
        }
    }
}

fn print_tree(repo: &Repository) {
    let tree = repo.locations();
    for root in tree.top_level() {
        print_location(repo, root, 0);
    }
}

fn print_location(repo: &Repository, id: LocationId, depth: usize) {
    let tree = repo.locations();
    let Some(location) = tree.get(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let summary = location.summary();
    if summary.region.is_empty() {
        println!("{indent}{}", summary.name);
    } else {
        println!("{indent}{} [{}]", summary.name, summary.region);
    }
    let npcs = repo.npc_names(location.npcs());
    if !npcs.is_empty() {
        println!("{indent}  NPCs: {}", npcs.join(", "));
    }
    for child in tree.children(id) {
        print_location(repo, child, depth + 1);
    }
}

fn print_stat_block(block: &StatBlock) {
    println!();
    println!("{}", block.display_name());
    match block {
        StatBlock::MonsterManual(reference) => {
            println!("  See {}", reference.stat_block_image.display());
        }
        StatBlock::PlayerClass(pc) => {
            println!(
                "  HP {}  AC {}  Speed {} ft  Proficiency +{}",
                pc.hit_points(),
                pc.armor_class(),
                pc.move_speed(),
                pc.proficiency_bonus()
            );
            if pc.caster_type() != CasterType::None {
                println!(
                    "  {} caster  Save DC {}  Spell attack {:+}",
                    pc.caster_type(),
                    pc.spell_save_dc(),
                    pc.spell_attack_modifier()
                );
                match pc.spell_slots() {
                    SpellSlots::Defined(slots) => {
                        let row: Vec<String> = slots
                            .iter()
                            .map(|s| format!("{}:{}", s.level, s.count))
                            .collect();
                        println!("  Slots {}", row.join(" "));
                    }
                    SpellSlots::Undefined { .. } => {
                        println!("  Slots not tabulated at this level")
                    }
                }
            }
            if !pc.spells().is_empty() {
                println!("  Spells: {}", pc.spells().join(", "));
            }
        }
    }
}

fn print_help() {
    println!("Campaign data browser");
    println!();
    println!("USAGE:");
    println!("  campaign [OPTIONS] <COMMAND>");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help        Show this help message");
    println!("  --config <FILE>   Configuration file (default: {CONFIG_FILE})");
    println!("  --data <DIR>      Data directory (overrides config and CAMPAIGN_DATA_DIR)");
    println!("  --media <DIR>     Media directory (overrides config and CAMPAIGN_MEDIA_DIR)");
    println!();
    println!("COMMANDS:");
    println!("  summary           Count records and list anything skipped while loading");
    println!("  tree              Print the location hierarchy with NPCs");
    println!("  linkify <TEXT>    Link every known name in TEXT");
    println!("  resolve <LABEL>   Look up a name or alias");
    println!();
    println!("Set RUST_LOG=debug to see unresolved location references.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let cli = parse_args(&args(&[
            "campaign", "--data", "camp/Data", "linkify", "Fire", "Bolt",
        ]));
        assert_eq!(cli.data_dir, Some(PathBuf::from("camp/Data")));
        assert!(cli.media_dir.is_none());
        assert_eq!(cli.command, vec!["linkify", "Fire", "Bolt"]);
    }

    #[test]
    fn test_parse_args_trailing_flag() {
        let cli = parse_args(&args(&["campaign", "tree", "--media"]));
        assert!(cli.media_dir.is_none());
        assert_eq!(cli.command, vec!["tree"]);
    }
}
