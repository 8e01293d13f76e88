//! Tracing subscriber setup.
//!
//! Logs go to stderr so they never mix with command output on stdout.
//! `RUST_LOG` wins when set; otherwise `--verbose` selects `debug` and the
//! default is `warn`.

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Directives used when `RUST_LOG` is unset.
const fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "transcript_qa=debug,warn"
    } else {
        "warn"
    }
}

/// Builds the level filter.
fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// Formatting subscriber writing to `writer`.
fn subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(writer);

    tracing_subscriber::registry().with(filter).with(fmt_layer)
}

/// Installs the global subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool) {
    let _ = subscriber(filter(verbose), std::io::stderr).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(verbose: bool, emit: impl FnOnce()) -> String {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = subscriber(EnvFilter::new(default_directives(verbose)), move || {
            writer.clone()
        });
        tracing::subscriber::with_default(subscriber, emit);
        out.text()
    }

    #[test]
    fn test_verbose_shows_crate_debug() {
        let text = capture(true, || tracing::debug!("retrieved 3 chunks"));
        assert!(text.contains("retrieved 3 chunks"));
        assert!(text.contains("DEBUG"));
    }

    #[test]
    fn test_quiet_hides_debug_keeps_warn() {
        let text = capture(false, || {
            tracing::debug!("retrieved 3 chunks");
            tracing::warn!("index unavailable");
        });
        assert!(!text.contains("retrieved 3 chunks"));
        assert!(text.contains("index unavailable"));
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "warn");
        assert!(default_directives(true).contains("transcript_qa=debug"));
    }
}
