use crate::config::{Config, get_config_path, load_config};
use crate::loader::{normalize_primary, read_resource};
use crate::message::parse_message_document;
use crate::sources::{BackendClient, QuoteApis};
use crate::storage::CacheIndex;
use crate::utils::http::http_client;
use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
enum CheckResult {
    Pass(String),
    Fail(String),
    Skip(String),
}

impl CheckResult {
    fn label(&self) -> &'static str {
        match self {
            Self::Pass(_) => "PASS",
            Self::Fail(_) => "FAIL",
            Self::Skip(_) => "SKIP",
        }
    }

    fn detail(&self) -> &str {
        match self {
            Self::Pass(s) | Self::Fail(s) | Self::Skip(s) => s,
        }
    }

    fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }
}

fn print_check(name: &str, result: &CheckResult) {
    println!("  {:<6} {:<24} {}", result.label(), name, result.detail());
}

fn check_config_file(config_path: Option<&Path>) -> CheckResult {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => match get_config_path() {
            Ok(p) => p,
            Err(e) => return CheckResult::Fail(format!("cannot determine path: {}", e)),
        },
    };
    if path.exists() {
        CheckResult::Pass(path.display().to_string())
    } else {
        CheckResult::Skip(format!("{} not found, using defaults", path.display()))
    }
}

fn check_config_validates(loaded: &Result<Config>) -> CheckResult {
    match loaded {
        Ok(_) => CheckResult::Pass("all checks passed".to_string()),
        Err(e) => CheckResult::Fail(format!("{:#}", e)),
    }
}

fn check_storage_dir(config: &Config) -> CheckResult {
    let dir = match config.storage_dir() {
        Ok(d) => d,
        Err(e) => return CheckResult::Fail(e.to_string()),
    };
    if let Err(e) = std::fs::create_dir_all(&dir) {
        return CheckResult::Fail(format!("{} ({})", dir.display(), e));
    }
    let probe = dir.join(".doctor_probe");
    match std::fs::write(&probe, "probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            CheckResult::Pass(format!("{} (writable)", dir.display()))
        }
        Err(e) => CheckResult::Fail(format!("{} (not writable: {})", dir.display(), e)),
    }
}

fn check_cache_index(config: &Config) -> CheckResult {
    let Ok(dir) = config.storage_dir() else {
        return CheckResult::Skip("no storage directory".to_string());
    };
    match CacheIndex::open(dir.join("cache.db")) {
        Ok(_) => CheckResult::Pass("cache.db opens".to_string()),
        Err(e) => CheckResult::Fail(format!("{:#}", e)),
    }
}

async fn check_messages(config: &Config) -> CheckResult {
    let client = http_client(Duration::from_secs(10));
    let location = &config.sources.messages_path;
    let bytes = match read_resource(&client, location).await {
        Ok(b) => b,
        Err(e) => return CheckResult::Fail(format!("{:#} (defaults will be used)", e)),
    };
    match parse_message_document(&bytes) {
        Ok(raws) => {
            let usable = normalize_primary(&raws).len();
            if usable == 0 {
                CheckResult::Fail(format!("{}: no usable messages", location))
            } else {
                CheckResult::Pass(format!("{}: {} messages", location, usable))
            }
        }
        Err(e) => CheckResult::Fail(format!("{}: {}", location, e)),
    }
}

async fn check_backend(config: &Config) -> CheckResult {
    let backend = &config.sources.backend;
    if !backend.enabled {
        return CheckResult::Skip("disabled".to_string());
    }
    let client = BackendClient::new(backend);
    if client.health().await {
        CheckResult::Pass(format!("{} healthy", client.base_url()))
    } else {
        CheckResult::Fail(format!("{} unreachable or unhealthy", client.base_url()))
    }
}

async fn check_quote_apis(config: &Config) -> CheckResult {
    let apis = &config.sources.quote_apis;
    if !apis.enabled {
        return CheckResult::Skip("disabled".to_string());
    }
    let quotes = QuoteApis::new(apis).collect().await;
    if quotes.is_empty() {
        CheckResult::Fail("no quotes returned".to_string())
    } else {
        CheckResult::Pass(format!("{} quotes", quotes.len()))
    }
}

pub async fn doctor_command(config_path: Option<&Path>) -> Result<()> {
    println!("daily-start doctor\n");
    println!("{}", "=".repeat(60));

    let mut pass_count = 0u32;
    let mut fail_count = 0u32;
    let mut skip_count = 0u32;

    let mut record = |name: &str, result: &CheckResult| {
        print_check(name, result);
        match result {
            CheckResult::Pass(_) => pass_count += 1,
            CheckResult::Fail(_) => fail_count += 1,
            CheckResult::Skip(_) => skip_count += 1,
        }
    };

    println!("\n  Config");
    println!("  {}", "-".repeat(56));
    record("Config file", &check_config_file(config_path));
    let loaded = load_config(config_path);
    let config_result = check_config_validates(&loaded);
    record("Config validates", &config_result);
    let config = loaded.unwrap_or_default();

    println!("\n  Storage");
    println!("  {}", "-".repeat(56));
    record("Storage directory", &check_storage_dir(&config));
    record("Cache index", &check_cache_index(&config));

    println!("\n  Sources");
    println!("  {}", "-".repeat(56));
    debug!("checking message sources...");
    record("Bundled messages", &check_messages(&config).await);
    record("Backend", &check_backend(&config).await);
    record("Quote APIs", &check_quote_apis(&config).await);

    println!("\n{}", "=".repeat(60));
    println!(
        "  {} passed, {} failed, {} skipped",
        pass_count, fail_count, skip_count
    );
    if fail_count > 0 {
        println!("\n  Some checks failed. Review the output above.");
    } else {
        println!("\n  All checks passed!");
    }

    if config_result.is_fail() {
        anyhow::bail!("config is invalid");
    }
    Ok(())
}
