#![forbid(unsafe_code)]

use url::Url;
use vitrine_core::ConnectionProfile;
use vitrine_net::{Destination, Net};

use crate::scheduler::PreloadOptions;

/// Outcome of [`warm_critical`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WarmReport {
    /// The connection was constrained; nothing was fetched.
    pub skipped: bool,
    pub fetched: usize,
    pub failed: usize,
}

/// Fetch `urls` one at a time after a settling delay so they land in the HTTP cache.
///
/// Skipped entirely on constrained connections. Failures are counted and otherwise
/// ignored.
pub async fn warm_critical<N: Net + ?Sized>(
    net: &N,
    urls: &[Url],
    profile: &ConnectionProfile,
    options: &PreloadOptions,
) -> WarmReport {
    if profile.is_constrained() {
        tracing::debug!(
            effective_type = %profile.effective_type,
            save_data = profile.save_data,
            "critical warm-up skipped"
        );
        return WarmReport {
            skipped: true,
            ..WarmReport::default()
        };
    }

    let delay = if profile.is_mobile {
        options.warm_delay_mobile
    } else {
        options.warm_delay_desktop
    };
    tokio::time::sleep(delay).await;

    let mut report = WarmReport::default();
    for url in urls {
        match net.get_bytes(url.clone(), Destination::Image).await {
            Ok(_) => report.fetched += 1,
            Err(e) => {
                tracing::debug!(%url, error = %e, "warm-up fetch failed");
                report.failed += 1;
            }
        }
    }
    report
}
