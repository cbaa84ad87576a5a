use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::Args;
use crate::country::{CountryResolver, GeoLookup};
use crate::guard::AbuseGuard;
use crate::models::{HitResponse, VisitEvent};
use crate::traffic::TrafficAggregator;

// app's shared state, built once in main and handed to every handler
pub struct AppState {
    pub client: reqwest::Client,
    pub guard: AbuseGuard,
    pub traffic: Arc<TrafficAggregator>,
    pub countries: CountryResolver,
    pub log_tx: mpsc::Sender<()>, // "log changed" signal for the writer
    pub hit_reply: HitResponse,
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(
        args: &Args,
        client: reqwest::Client,
        lookup: Arc<dyn GeoLookup>,
        events: Vec<VisitEvent>,
        log_tx: mpsc::Sender<()>,
    ) -> Self {
        Self {
            client,
            guard: AbuseGuard::from_args(args),
            traffic: Arc::new(TrafficAggregator::new(events, args.reset_interval)),
            countries: CountryResolver::new(lookup),
            log_tx,
            hit_reply: HitResponse {
                url: args.hit_url.clone(),
                message: args.hit_message.clone(),
            },
            public_dir: args.public_dir.clone(),
        }
    }
}
