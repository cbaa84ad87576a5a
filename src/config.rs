use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "visit-tracker")]
#[command(about = "Visit counter with per-IP throttling and traffic stats")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // JSON file holding the visit log
    #[arg(long, env = "IP_LOG_FILE", default_value = "ip_logs.json")]
    pub log_file: PathBuf,

    // Directory containing the dashboard index.html
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    // Max requests per burst window before an IP gets blocked
    #[arg(long, default_value_t = 5)]
    pub burst_limit: u32,

    // Burst window in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub burst_window_ms: u64,

    // How long a burst block lasts. Blocks are permanent when unset
    #[arg(long)]
    pub block_secs: Option<u64>,

    // Lifetime ceiling of /hit requests per IP
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub hit_limit: u64,

    // Divisor (seconds) for the requests-per-second figure
    #[arg(long, default_value_t = 180, value_parser = clap::value_parser!(u64).range(1..))]
    pub reset_interval: u64,

    // IPs denied from the start (comma-separated)
    #[arg(long, env = "BLACKLIST", value_delimiter = ',')]
    pub blacklist: Vec<String>,

    // Internal resources whose direct access blacklists the caller
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "/server.js,/style.css,/script.js"
    )]
    pub protected_paths: Vec<String>,

    // Geolocation service, queried as {whois_url}/{ip}
    #[arg(long, env = "WHOIS_URL", default_value = "https://ipwhois.app/json")]
    pub whois_url: String,

    // Timeout for a single geolocation lookup, in seconds
    #[arg(long, default_value_t = 5)]
    pub whois_timeout: u64,

    // Payload returned by /hit
    #[arg(long, default_value = "t.me/sharingscript")]
    pub hit_url: String,

    #[arg(long, default_value = "Dstat | visit tracker")]
    pub hit_message: String,
}

impl Args {
    pub fn burst_window(&self) -> Duration {
        Duration::from_millis(self.burst_window_ms)
    }

    pub fn block_duration(&self) -> Option<Duration> {
        self.block_secs.map(Duration::from_secs)
    }

    pub fn whois_timeout(&self) -> Duration {
        Duration::from_secs(self.whois_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_limits() {
        let args = Args::parse_from(["visit-tracker"]);
        assert_eq!(args.burst_limit, 5);
        assert_eq!(args.burst_window(), Duration::from_secs(1));
        assert_eq!(args.block_duration(), None);
        assert_eq!(args.reset_interval, 180);
        assert_eq!(args.protected_paths, ["/server.js", "/style.css", "/script.js"]);
    }

    #[test]
    fn lists_are_comma_separated() {
        let args = Args::parse_from([
            "visit-tracker",
            "--blacklist",
            "1.1.1.1,2.2.2.2",
            "--block-secs",
            "60",
        ]);
        assert_eq!(args.blacklist, ["1.1.1.1", "2.2.2.2"]);
        assert_eq!(args.block_duration(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn zero_reset_interval_is_rejected() {
        assert!(Args::try_parse_from(["visit-tracker", "--reset-interval", "0"]).is_err());
    }

    #[test]
    fn hit_limit_must_admit_at_least_one_hit() {
        assert!(Args::try_parse_from(["visit-tracker", "--hit-limit", "0"]).is_err());
        let args = Args::parse_from(["visit-tracker", "--hit-limit", "1"]);
        assert_eq!(args.hit_limit, 1);
        assert_eq!(Args::parse_from(["visit-tracker"]).hit_limit, 1000);
    }
}
