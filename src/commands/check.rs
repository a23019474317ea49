//! Check command implementation.
//!
//! Validates configuration and reads the stat file once.

use crate::config::{validate_effective_config, Config};
use crate::startup_checks::check_stat_file;
use crate::stat::{SnapshotSource, StatCollector};

/// Validates configuration and stat file ingestion.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("ipt_NETFLOW Exporter - System Check");
    println!("===================================");

    let mut all_ok = true;

    println!("\nChecking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   OK   Configuration is valid"),
        Err(e) => {
            println!("   FAIL Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    let stat_file = config.stat_file();
    println!("\nChecking stat file {}...", stat_file.display());
    match check_stat_file(stat_file) {
        Ok(_) => println!("   OK   Stat file readable"),
        Err(e) => {
            println!("   FAIL {}", e);
            all_ok = false;
        }
    }

    if all_ok {
        println!("\nParsing stat file...");
        match StatCollector::new(stat_file).collect_snapshot() {
            Ok(snapshot) => {
                println!("   OK   Parsed snapshot");
                println!("        cpu entries:    {}", snapshot.cpus.len());
                println!("        socket entries: {}", snapshot.sockets.len());
            }
            Err(e) => {
                println!("   FAIL {}", e);
                all_ok = false;
            }
        }
    }

    println!("\nSummary:");
    if all_ok {
        println!("   All checks passed - exporter is ready");
        Ok(())
    } else {
        println!("   Some checks failed - please review the output above");
        std::process::exit(1);
    }
}
