use std::env;
use std::fs;

/// Keys `config.rs` reads through `option_env!`
const CONFIG_KEYS: [&str; 5] = [
    "BACKEND_URL_DEVELOPMENT",
    "BACKEND_URL_PRODUCTION",
    "ENVIRONMENT",
    "ENABLE_LOGGING",
    "SEARCH_DEBOUNCE_MS",
];

/// `KEY=value` pairs of a dotenv file. Accepts `export KEY=value` and quoted values.
fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Some((key.trim().to_string(), unquoted.to_string()))
        })
        .collect()
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.env");
    for key in CONFIG_KEYS {
        println!("cargo:rerun-if-env-changed={}", key);
    }

    let Ok(contents) = fs::read_to_string(".env") else {
        return;
    };

    for (key, value) in parse_dotenv(&contents) {
        if !CONFIG_KEYS.contains(&key.as_str()) {
            println!("cargo:warning=.env: ignoring unknown key {}", key);
            continue;
        }
        // the real environment wins over .env
        if env::var_os(&key).is_none() {
            println!("cargo:rustc-env={}={}", key, value);
        }
    }
}
