// src/ingest/providers/mod.rs
pub mod hn;
pub mod rss;

use crate::config::{CuratorConfig, SourceKind};
use crate::ingest::types::DynConnector;

/// Build one HTTP connector per configured source.
pub fn from_config(cfg: &CuratorConfig) -> anyhow::Result<Vec<DynConnector>> {
    let mut out: Vec<DynConnector> = Vec::with_capacity(cfg.sources.len());
    for src in &cfg.sources {
        let cap = cfg.cap_for(src);
        let conn: DynConnector = match src.kind {
            SourceKind::Rss => Box::new(rss::RssConnector::from_url(
                &src.name,
                &src.category,
                &src.url,
                cap,
            )?),
            SourceKind::Hn => Box::new(hn::HnConnector::new(
                &src.name,
                &src.category,
                &src.url,
                cap,
            )?),
        };
        out.push(conn);
    }
    Ok(out)
}
